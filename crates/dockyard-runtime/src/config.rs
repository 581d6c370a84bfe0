//! Workspace configuration.
//!
//! Loaded from TOML or JSON at startup. Every field has a default, so an empty
//! document yields [`DockyardConfig::default`].
//!
//! ```toml
//! # dockyard.toml
//! storage_dir = "/var/lib/dockyard"
//! popout_origin = "https://trade.example.com"
//! auto_fit_breakpoint = 1440
//! log_filter = "info,dockyard.engine=debug"
//!
//! [size_policy]
//! minimized_size = 28
//! ```
//!
//! ```rust,ignore
//! let config = DockyardConfig::from_toml_file("dockyard.toml")?;
//! let workspace = Workspace::from_config(&config)?;
//! ```

use std::path::{Path, PathBuf};

use dockyard_layout::SizePolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::popout::PopoutError;
use crate::storage::{ConfiguredStorage, StorageError};

/// Default origin popout URLs are built against.
pub const DEFAULT_POPOUT_ORIGIN: &str = "http://localhost:3000";

/// Viewport width below which key panels are automatically hidden.
pub const DEFAULT_AUTO_FIT_BREAKPOINT: u32 = 1280;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("popout origin error: {0}")]
    Popout(#[from] PopoutError),

    #[error("invalid log filter {directive:?}: {source}")]
    LogFilter {
        directive: String,
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("a global tracing subscriber is already installed")]
    SubscriberInstalled,

    #[error("invalid configuration: {}", .problems.join("; "))]
    Invalid { problems: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockyardConfig {
    /// Directory for file storage. In-memory storage when unset.
    pub storage_dir: Option<PathBuf>,

    /// Origin popout windows are opened under.
    pub popout_origin: String,

    /// Viewport width below which key panels auto-hide.
    pub auto_fit_breakpoint: u32,

    /// `tracing-subscriber` filter directive.
    pub log_filter: String,

    pub size_policy: SizePolicy,
}

impl Default for DockyardConfig {
    fn default() -> Self {
        Self {
            storage_dir: None,
            popout_origin: DEFAULT_POPOUT_ORIGIN.to_string(),
            auto_fit_breakpoint: DEFAULT_AUTO_FIT_BREAKPOINT,
            log_filter: "info".to_string(),
            size_policy: SizePolicy::default(),
        }
    }
}

impl DockyardConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Open the configured storage backend.
    pub fn storage(&self) -> Result<ConfiguredStorage, ConfigError> {
        Ok(ConfiguredStorage::from_dir(self.storage_dir.as_deref())?)
    }

    /// Check parameter ranges.
    ///
    /// Returns a list of problems; empty means the config is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.auto_fit_breakpoint == 0 {
            errors.push("auto_fit_breakpoint must be positive".to_string());
        }
        if self.popout_origin.trim().is_empty() {
            errors.push("popout_origin must not be empty".to_string());
        }
        let minimized = self.size_policy.minimized_size;
        for (kind, sizing) in &self.size_policy.panels {
            if sizing.min_size > sizing.default_size {
                errors.push(format!(
                    "size_policy.panels.{kind}: min_size {} exceeds default_size {}",
                    sizing.min_size, sizing.default_size
                ));
            }
            if sizing.min_size <= minimized {
                errors.push(format!(
                    "size_policy.panels.{kind}: min_size {} must exceed minimized_size {minimized}",
                    sizing.min_size
                ));
            }
        }
        errors
    }

    /// [`Self::validate`] as a `Result`.
    pub fn ensure_valid(&self) -> Result<(), ConfigError> {
        let problems = self.validate();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid { problems })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockyard_layout::{PanelKind, PanelSizing};

    #[test]
    fn defaults_match_documented_values() {
        let config = DockyardConfig::default();
        assert_eq!(config.storage_dir, None);
        assert_eq!(config.popout_origin, "http://localhost:3000");
        assert_eq!(config.auto_fit_breakpoint, 1280);
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.size_policy, SizePolicy::default());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn empty_documents_are_defaults() {
        assert_eq!(
            DockyardConfig::from_toml_str("").unwrap(),
            DockyardConfig::default()
        );
        assert_eq!(
            DockyardConfig::from_json_str("{}").unwrap(),
            DockyardConfig::default()
        );
    }

    #[test]
    fn toml_overrides_selected_fields() {
        let config = DockyardConfig::from_toml_str(
            r#"
            storage_dir = "/tmp/dockyard"
            popout_origin = "https://trade.example.com"
            auto_fit_breakpoint = 1440

            [size_policy]
            minimized_size = 24
            "#,
        )
        .unwrap();
        assert_eq!(config.storage_dir, Some(PathBuf::from("/tmp/dockyard")));
        assert_eq!(config.popout_origin, "https://trade.example.com");
        assert_eq!(config.auto_fit_breakpoint, 1440);
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.size_policy.minimized_size, 24);
        assert_eq!(config.size_policy.panels, SizePolicy::default().panels);
    }

    #[test]
    fn json_overrides_panel_sizing() {
        let config = DockyardConfig::from_json_str(
            r#"{
                "log_filter": "debug",
                "size_policy": {
                    "panels": {
                        "markets": { "axis": "width", "min_size": 200, "default_size": 260 }
                    }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.log_filter, "debug");
        assert_eq!(
            config.size_policy.sizing(PanelKind::Markets),
            Some(PanelSizing::width(200, 260))
        );
        assert_eq!(config.size_policy.sizing(PanelKind::Form), None);
    }

    #[test]
    fn malformed_documents_are_errors() {
        assert!(matches!(
            DockyardConfig::from_toml_str("auto_fit_breakpoint = \"wide\""),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            DockyardConfig::from_json_str("{"),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            DockyardConfig::from_toml_file("/definitely/not/here.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn file_loaders_read_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dockyard.json");
        std::fs::write(&path, r#"{ "auto_fit_breakpoint": 1024 }"#).unwrap();
        let config = DockyardConfig::from_json_file(&path).unwrap();
        assert_eq!(config.auto_fit_breakpoint, 1024);
    }

    #[test]
    fn validate_reports_inverted_sizes() {
        let mut config = DockyardConfig::default();
        config.auto_fit_breakpoint = 0;
        let _ = config
            .size_policy
            .panels
            .insert(PanelKind::Chat, PanelSizing::width(400, 300));
        let errors = config.validate();
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("chat")));
        assert!(matches!(
            config.ensure_valid(),
            Err(ConfigError::Invalid { problems }) if problems == errors
        ));
        assert!(DockyardConfig::default().ensure_valid().is_ok());
    }

    #[test]
    fn storage_follows_storage_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = DockyardConfig {
            storage_dir: Some(dir.path().join("layouts")),
            ..DockyardConfig::default()
        };
        assert!(matches!(config.storage(), Ok(ConfiguredStorage::File(_))));
        assert!(matches!(
            DockyardConfig::default().storage(),
            Ok(ConfiguredStorage::Memory(_))
        ));
    }
}
