use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Toml};
use figment::value::magic::RelativePathBuf;
use figment::Figment;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AppError, AppResult};

const ENV_PREFIX: &str = "JAVARECALL_";
const LANGUAGE_PLACEHOLDER: &str = "{language}";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub highlight: HighlightConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Catalog file replacing the embedded topics. Relative paths resolve
    /// against the directory of the config file that set them.
    pub path: Option<RelativePathBuf>,
    /// Overrides the language declared by the catalog.
    pub language: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub enabled: bool,
    /// Highlighter argv. The snippet is written to its stdin and ANSI output
    /// is read back from stdout. `{language}` is substituted.
    pub command: Vec<String>,
    pub line_numbers: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: vec![
                "bat".to_string(),
                "--color=always".to_string(),
                "--style=plain".to_string(),
                "--paging=never".to_string(),
                format!("--language={}", LANGUAGE_PLACEHOLDER),
            ],
            line_numbers: true,
        }
    }
}

impl HighlightConfig {
    pub fn argv(&self, language: &str) -> Vec<String> {
        self.command
            .iter()
            .map(|arg| arg.replace(LANGUAGE_PLACEHOLDER, language))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub file: Option<String>,
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: None,
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn catalog_path(&self, home: Option<&Path>) -> Option<PathBuf> {
        let path = self.catalog.path.as_ref()?;
        let raw = path.original().to_string_lossy();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match home {
            Some(home) if trimmed.starts_with("~/") || trimmed.contains("$HOME") => {
                Some(expand_home(trimmed, home))
            }
            _ => Some(path.relative()),
        }
    }

    pub fn log_file(&self, home: Option<&Path>) -> Option<PathBuf> {
        let raw = env::var(format!("{ENV_PREFIX}LOG_FILE"))
            .ok()
            .or_else(|| self.log.file.clone())?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match home {
            Some(home) => expand_home(trimmed, home),
            None => PathBuf::from(trimmed),
        })
    }
}

pub fn home_dir() -> Option<PathBuf> {
    env::var("HOME")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

pub fn load_config() -> AppResult<Config> {
    let home = home_dir();
    let mut figment = Figment::new();

    for path in config_paths(home.as_deref()) {
        if !path.is_file() {
            continue;
        }
        debug!(path = %path.display(), "merging config file");
        figment = figment.merge(Toml::file(&path));
    }

    if let Some(explicit) = explicit_config_path() {
        if !explicit.is_file() {
            return Err(AppError::Config(format!(
                "config file not found: {}",
                explicit.display()
            )));
        }
        figment = figment.merge(Toml::file(&explicit));
    }

    figment = figment.merge(
        Env::prefixed(ENV_PREFIX)
            .ignore(&["config", "log", "log_file"])
            .split("__"),
    );
    extract(figment)
}

fn extract(figment: Figment) -> AppResult<Config> {
    Ok(figment.extract()?)
}

fn explicit_config_path() -> Option<PathBuf> {
    env::var(format!("{ENV_PREFIX}CONFIG"))
        .ok()
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from)
}

/// Lowest priority first; later files override earlier ones.
fn config_paths(home: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/javarecall/config.toml")];
    let xdg = env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| home.map(|home| home.join(".config")));
    if let Some(xdg) = xdg {
        paths.push(xdg.join("javarecall/config.toml"));
    }
    if let Some(home) = home {
        paths.push(home.join(".config/javarecall/config.toml"));
        paths.push(home.join(".javarecall.toml"));
    }
    if let Ok(cwd) = env::current_dir() {
        paths.push(cwd.join(".javarecall.toml"));
    }

    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|path| seen.insert(path.to_string_lossy().to_string()))
        .collect()
}

fn expand_home(raw: &str, home: &Path) -> PathBuf {
    let mut value = raw.to_string();
    if value.starts_with("~/") {
        value = value.replacen('~', &home.to_string_lossy(), 1);
    }
    if value.contains("$HOME") {
        value = value.replace("$HOME", &home.to_string_lossy());
    }
    PathBuf::from(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Config {
        extract(Figment::from(Toml::string(toml))).unwrap()
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = extract(Figment::new()).unwrap();
        assert!(config.catalog.path.is_none());
        assert!(config.catalog.language.is_none());
        assert!(config.highlight.enabled);
        assert!(config.highlight.line_numbers);
        assert_eq!(config.highlight.command[0], "bat");
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn partial_tables_keep_remaining_defaults() {
        let config = parse(
            r#"
[highlight]
line_numbers = false

[log]
level = "debug"
"#,
        );
        assert!(config.highlight.enabled);
        assert!(!config.highlight.line_numbers);
        assert_eq!(config.log.level, "debug");
        assert!(config.log.file.is_none());
    }

    #[test]
    fn highlight_command_substitutes_language() {
        let config = parse(
            r#"
[highlight]
command = ["pygmentize", "-l", "{language}", "-f", "terminal"]
"#,
        );
        assert_eq!(
            config.highlight.argv("kotlin"),
            vec!["pygmentize", "-l", "kotlin", "-f", "terminal"]
        );
        assert_eq!(
            HighlightConfig::default().argv("java").last().unwrap(),
            "--language=java"
        );
    }

    #[test]
    fn catalog_path_expands_home() {
        let config = parse(
            r#"
[catalog]
path = "~/notes/topics.toml"
"#,
        );
        let home = Path::new("/home/learner");
        assert_eq!(
            config.catalog_path(Some(home)),
            Some(PathBuf::from("/home/learner/notes/topics.toml"))
        );
    }

    #[test]
    fn catalog_path_without_file_source_is_kept() {
        let config = parse(
            r#"
[catalog]
path = "/srv/topics.json"
language = "rust"
"#,
        );
        assert_eq!(
            config.catalog_path(None),
            Some(PathBuf::from("/srv/topics.json"))
        );
        assert_eq!(config.catalog.language.as_deref(), Some("rust"));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let result = extract(Figment::from(Toml::string("[highlight]\ncommand = 42")));
        assert!(matches!(result, Err(AppError::ConfigParse(_))));
    }

    #[test]
    fn config_paths_are_unique_and_ordered() {
        let paths = config_paths(Some(Path::new("/home/learner")));
        assert_eq!(paths[0], PathBuf::from("/etc/javarecall/config.toml"));
        assert!(paths.contains(&PathBuf::from("/home/learner/.javarecall.toml")));
        let unique: HashSet<_> = paths.iter().collect();
        assert_eq!(unique.len(), paths.len());
    }
}
