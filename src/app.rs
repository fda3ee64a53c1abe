//! Browser state: the search query and the selected topic id, plus the
//! key handling that mutates them. Derived views are rebuilt from scratch
//! after every event.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;
use tui_input::backend::crossterm::EventHandler;
use tui_input::{Input, InputRequest};

use crate::catalog::{Catalog, Topic};
use crate::view::{self, CategoryGroup, EmptyCatalog, SidebarRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Search,
    Detail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// Everything the renderer needs for one frame.
pub struct Derived<'a> {
    pub groups: Vec<CategoryGroup<'a>>,
    pub rows: Vec<SidebarRow<'a>>,
    pub match_count: usize,
    pub selected: Result<&'a Topic, EmptyCatalog>,
}

impl<'a> Derived<'a> {
    pub fn new(topics: &'a [Topic], state: &BrowserState) -> Self {
        let filtered = view::filter(topics, state.query());
        let match_count = filtered.len();
        let groups = view::group_by_category(&filtered);
        let rows = view::sidebar_rows(&groups);
        let selected = view::resolve_selected(topics, &state.selected_id);
        Self {
            groups,
            rows,
            match_count,
            selected,
        }
    }

    /// Topics in sidebar display order.
    pub fn visible(&self) -> Vec<&'a Topic> {
        view::flatten(&self.groups)
    }

    /// Index into `rows` of the highlighted topic, if it passed the filter.
    pub fn selected_row(&self) -> Option<usize> {
        let selected = self.selected.ok()?;
        self.rows.iter().position(|row| match row {
            SidebarRow::Topic(topic) => topic.id == selected.id,
            SidebarRow::Header(_) => false,
        })
    }
}

pub struct BrowserState {
    pub input: Input,
    pub selected_id: String,
    pub focus: Focus,
    pub list_offset: usize,
    pub detail_scroll: usize,
    pub detail_max_scroll: usize,
    pub detail_page_step: usize,
}

impl BrowserState {
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            input: Input::default(),
            selected_id: catalog
                .first()
                .map(|topic| topic.id.clone())
                .unwrap_or_default(),
            focus: Focus::Search,
            list_offset: 0,
            detail_scroll: 0,
            detail_max_scroll: 0,
            detail_page_step: 5,
        }
    }

    pub fn query(&self) -> &str {
        self.input.value()
    }

    pub fn select(&mut self, id: &str) {
        if self.selected_id == id {
            return;
        }
        debug!(topic = id, "topic selected");
        self.selected_id = id.to_string();
        self.detail_scroll = 0;
    }

    pub fn step(&mut self, derived: &Derived, delta: isize) {
        let visible = derived.visible();
        if let Some(topic) = view::step_selection(&visible, &self.selected_id, delta) {
            let id = topic.id.clone();
            self.select(&id);
        }
    }

    pub fn scroll_detail(&mut self, delta: isize) {
        self.detail_scroll = if delta < 0 {
            self.detail_scroll.saturating_sub(delta.unsigned_abs())
        } else {
            self.detail_scroll
                .saturating_add(delta as usize)
                .min(self.detail_max_scroll)
        };
    }

    pub fn handle_key(&mut self, key: KeyEvent, derived: &Derived) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if key.code == KeyCode::Esc || (ctrl && key.code == KeyCode::Char('c')) {
            return Action::Quit;
        }
        if key.code == KeyCode::Tab {
            self.focus = match self.focus {
                Focus::Search => Focus::Detail,
                Focus::Detail => Focus::Search,
            };
            return Action::Continue;
        }

        match self.focus {
            Focus::Search => match key.code {
                KeyCode::Up => self.step(derived, -1),
                KeyCode::Down => self.step(derived, 1),
                KeyCode::Enter => self.focus = Focus::Detail,
                KeyCode::Right
                    if !key.modifiers.intersects(
                        KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER,
                    ) && input_at_end(&self.input) =>
                {
                    self.focus = Focus::Detail;
                }
                _ => self.edit_query(key),
            },
            Focus::Detail => match key.code {
                KeyCode::Left => self.focus = Focus::Search,
                KeyCode::Up => self.scroll_detail(-1),
                KeyCode::Down => self.scroll_detail(1),
                KeyCode::PageUp => self.scroll_detail(-(self.detail_page_step as isize)),
                KeyCode::PageDown => self.scroll_detail(self.detail_page_step as isize),
                KeyCode::Home => self.detail_scroll = 0,
                KeyCode::End => self.detail_scroll = self.detail_max_scroll,
                _ => {}
            },
        }
        Action::Continue
    }

    fn edit_query(&mut self, key: KeyEvent) {
        let before = self.input.value().to_string();
        if key.code == KeyCode::Char('u') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.input.handle(InputRequest::DeleteLine);
        } else {
            let _ = self.input.handle_event(&Event::Key(key));
        }
        if self.input.value() != before {
            debug!(query = self.input.value(), "search query changed");
            self.list_offset = 0;
        }
    }
}

fn input_at_end(input: &Input) -> bool {
    input.cursor() >= input.value().chars().count()
}
