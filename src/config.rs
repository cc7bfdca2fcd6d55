use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::template::TemplateConfig;
use crate::news::SyncRules;

fn default_workspace_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("newsweek")
        .join("workspace.json")
}

fn default_week_range() -> u32 {
    12
}

fn default_navigate_delay_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct NewsWeekConfig {
    #[serde(default = "default_workspace_path")]
    pub workspace_path: PathBuf,
    /// Weeks offered before and after the current one.
    #[serde(default = "default_week_range")]
    pub week_range: u32,
    #[serde(default)]
    pub template: TemplateConfig,
    /// Master page to clone instead of the built-in template.
    #[serde(default)]
    pub template_page: Option<String>,
    #[serde(default = "default_true")]
    pub require_heading_marker: bool,
    /// Pause before opening the page, so the host can re-render it.
    #[serde(default = "default_navigate_delay_ms")]
    pub navigate_delay_ms: u64,
    #[serde(default)]
    pub debug_logging: bool,
}

impl Default for NewsWeekConfig {
    fn default() -> Self {
        Self {
            workspace_path: default_workspace_path(),
            week_range: default_week_range(),
            template: TemplateConfig::default(),
            template_page: None,
            require_heading_marker: true,
            navigate_delay_ms: default_navigate_delay_ms(),
            debug_logging: false,
        }
    }
}

impl NewsWeekConfig {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("newsweek")
            .join("config.json")
    }

    /// Read the config at `path`, falling back to defaults when it is missing or invalid.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Invalid config {}: {}, using defaults", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    pub fn sync_rules(&self) -> SyncRules {
        SyncRules {
            undated_marker: self.template.undated_marker().to_string(),
            require_heading_marker: self.require_heading_marker,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "week_range": 4, "template_page": "news-template" }"#).unwrap();

        let config = NewsWeekConfig::load(&path);
        assert_eq!(config.week_range, 4);
        assert_eq!(config.template_page.as_deref(), Some("news-template"));
        assert_eq!(config.navigate_delay_ms, 500);
        assert!(config.require_heading_marker);
        assert_eq!(config.template, TemplateConfig::default());
    }

    #[test]
    fn invalid_or_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert_eq!(NewsWeekConfig::load(&path), NewsWeekConfig::default());

        std::fs::write(&path, "not json").unwrap();
        assert_eq!(NewsWeekConfig::load(&path), NewsWeekConfig::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = NewsWeekConfig {
            week_range: 2,
            debug_logging: true,
            ..NewsWeekConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(NewsWeekConfig::load(&path), config);
        assert_eq!(config.sync_rules().undated_marker, "Good News");
    }
}
