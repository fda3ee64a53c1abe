//! Pure derivations over the catalog: search filtering, category grouping and
//! selection resolution. Nothing here holds state.

use crate::catalog::Topic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("catalog is empty")]
pub struct EmptyCatalog;

/// Topics sharing one category label, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGroup<'a> {
    pub category: &'a str,
    pub topics: Vec<&'a Topic>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarRow<'a> {
    Header(&'a str),
    Topic(&'a Topic),
}

/// Topics whose title or category contains `query`, ignoring case.
pub fn filter<'a>(topics: &'a [Topic], query: &str) -> Vec<&'a Topic> {
    if query.is_empty() {
        return topics.iter().collect();
    }
    let needle = query.to_lowercase();
    topics
        .iter()
        .filter(|topic| {
            topic.title.to_lowercase().contains(&needle)
                || topic.category.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Groups topics by category in first-occurrence order.
pub fn group_by_category<'a>(topics: &[&'a Topic]) -> Vec<CategoryGroup<'a>> {
    let mut groups: Vec<CategoryGroup<'a>> = Vec::new();
    for &topic in topics {
        match groups
            .iter_mut()
            .find(|group| group.category == topic.category)
        {
            Some(group) => group.topics.push(topic),
            None => groups.push(CategoryGroup {
                category: &topic.category,
                topics: vec![topic],
            }),
        }
    }
    groups
}

pub fn flatten<'a>(groups: &[CategoryGroup<'a>]) -> Vec<&'a Topic> {
    groups
        .iter()
        .flat_map(|group| group.topics.iter().copied())
        .collect()
}

/// Resolves the selected id against the catalog.
///
/// A stale id falls back to the first topic. Only an empty catalog fails.
pub fn resolve_selected<'a>(
    topics: &'a [Topic],
    selected_id: &str,
) -> Result<&'a Topic, EmptyCatalog> {
    topics
        .iter()
        .find(|topic| topic.id == selected_id)
        .or_else(|| topics.first())
        .ok_or(EmptyCatalog)
}

pub fn sidebar_rows<'a>(groups: &[CategoryGroup<'a>]) -> Vec<SidebarRow<'a>> {
    let mut rows = Vec::new();
    for group in groups {
        rows.push(SidebarRow::Header(group.category));
        rows.extend(group.topics.iter().copied().map(SidebarRow::Topic));
    }
    rows
}

/// Moves the selection `delta` steps through the visible topics, clamped at
/// both ends. A selection outside `visible` snaps to the first visible topic.
pub fn step_selection<'a>(
    visible: &[&'a Topic],
    selected_id: &str,
    delta: isize,
) -> Option<&'a Topic> {
    let position = visible.iter().position(|topic| topic.id == selected_id);
    let Some(position) = position else {
        return visible.first().copied();
    };
    let last = visible.len().saturating_sub(1);
    let target = if delta < 0 {
        position.saturating_sub(delta.unsigned_abs())
    } else {
        position.saturating_add(delta as usize).min(last)
    };
    visible.get(target).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{topic, Catalog};

    fn sample() -> Vec<Topic> {
        vec![
            topic("a", "Variables", "Basics"),
            topic("b", "Loops", "Basics"),
            topic("c", "HashMap", "Collections"),
        ]
    }

    fn builtin_topics() -> Vec<Topic> {
        Catalog::builtin().unwrap().all().to_vec()
    }

    fn ids(topics: &[&Topic]) -> Vec<String> {
        topics.iter().map(|topic| topic.id.clone()).collect()
    }

    #[test]
    fn empty_query_keeps_everything_in_order() {
        let catalog = sample();
        assert_eq!(ids(&filter(&catalog, "")), vec!["a", "b", "c"]);
    }

    #[test]
    fn query_matches_title_case_insensitively() {
        let catalog = sample();
        assert_eq!(ids(&filter(&catalog, "map")), vec!["c"]);
        assert_eq!(ids(&filter(&catalog, "LOOP")), vec!["b"]);
    }

    #[test]
    fn query_matches_category() {
        let catalog = sample();
        assert_eq!(ids(&filter(&catalog, "basics")), vec!["a", "b"]);
        assert_eq!(ids(&filter(&catalog, "lect")), vec!["c"]);
    }

    #[test]
    fn query_is_not_tokenized_or_trimmed() {
        let catalog = sample();
        assert!(filter(&catalog, "hash loops").is_empty());
        assert!(filter(&catalog, " map").is_empty());
        assert!(filter(&catalog, "hsmp").is_empty());
    }

    #[test]
    fn filter_partitions_the_catalog() {
        let catalog = builtin_topics();
        for query in ["", "a", "Java", "coll", "(", "zzz", "e"] {
            let needle = query.to_lowercase();
            let matched = filter(&catalog, query);
            for topic in &catalog {
                let hit = topic.title.to_lowercase().contains(&needle)
                    || topic.category.to_lowercase().contains(&needle);
                let included = matched.iter().any(|candidate| candidate.id == topic.id);
                assert_eq!(hit, included, "query {query:?} topic {}", topic.id);
            }
        }
    }

    #[test]
    fn no_matches_is_an_empty_grouping() {
        let catalog = sample();
        let filtered = filter(&catalog, "nothing");
        assert!(filtered.is_empty());
        assert!(group_by_category(&filtered).is_empty());
    }

    #[test]
    fn grouping_follows_first_occurrence() {
        let catalog = sample();
        let groups = group_by_category(&filter(&catalog, ""));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].category, "Basics");
        assert_eq!(ids(&groups[0].topics), vec!["a", "b"]);
        assert_eq!(groups[1].category, "Collections");
        assert_eq!(ids(&groups[1].topics), vec!["c"]);
    }

    #[test]
    fn interleaved_categories_are_merged() {
        let catalog = vec![
            topic("a", "Variables", "Basics"),
            topic("b", "Classes", "OOP"),
            topic("c", "Methods", "Basics"),
        ];
        let groups = group_by_category(&filter(&catalog, ""));
        let names: Vec<&str> = groups.iter().map(|group| group.category).collect();
        assert_eq!(names, vec!["Basics", "OOP"]);
        assert_eq!(ids(&groups[0].topics), vec!["a", "c"]);
        // Stable regroup: order within a category never changes.
        assert_eq!(ids(&flatten(&groups)), vec!["a", "c", "b"]);
    }

    #[test]
    fn flattening_groups_of_contiguous_input_reproduces_it() {
        let catalog = sample();
        for query in ["", "a", "s"] {
            let filtered = filter(&catalog, query);
            let groups = group_by_category(&filtered);
            assert_eq!(flatten(&groups), filtered);
        }
    }

    #[test]
    fn derivation_is_repeatable() {
        let catalog = builtin_topics();
        let first = group_by_category(&filter(&catalog, "a"));
        let second = group_by_category(&filter(&catalog, "a"));
        assert_eq!(first, second);
    }

    #[test]
    fn resolve_selected_finds_by_id() {
        let catalog = sample();
        assert_eq!(resolve_selected(&catalog, "c").unwrap().id, "c");
    }

    #[test]
    fn stale_selection_falls_back_to_first() {
        let catalog = sample();
        assert_eq!(resolve_selected(&catalog, "z").unwrap().id, "a");
        assert_eq!(resolve_selected(&catalog, "").unwrap().id, "a");
    }

    #[test]
    fn empty_catalog_is_signalled() {
        assert_eq!(resolve_selected(&[], "c"), Err(EmptyCatalog));
    }

    #[test]
    fn sidebar_rows_put_headers_before_topics() {
        let catalog = sample();
        let groups = group_by_category(&filter(&catalog, ""));
        let rows = sidebar_rows(&groups);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], SidebarRow::Header("Basics"));
        assert_eq!(rows[1], SidebarRow::Topic(&catalog[0]));
        assert_eq!(rows[3], SidebarRow::Header("Collections"));
    }

    #[test]
    fn step_selection_clamps_at_edges() {
        let catalog = sample();
        let visible = filter(&catalog, "");
        assert_eq!(step_selection(&visible, "a", 1).unwrap().id, "b");
        assert_eq!(step_selection(&visible, "a", -1).unwrap().id, "a");
        assert_eq!(step_selection(&visible, "c", 1).unwrap().id, "c");
        assert_eq!(step_selection(&visible, "c", -5).unwrap().id, "a");
    }

    #[test]
    fn step_selection_snaps_hidden_selection_to_first_visible() {
        let catalog = sample();
        let visible = filter(&catalog, "basics");
        assert_eq!(step_selection(&visible, "c", 1).unwrap().id, "a");
        assert!(step_selection(&[], "a", 1).is_none());
    }
}
