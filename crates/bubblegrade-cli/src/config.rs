//! Configuration file support for bubblegrade.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/bubblegrade/config.toml` (lowest priority)
//! - Project-local: `.bubblegrade.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General options.
    pub general: GeneralConfig,
    /// Bubble detection settings.
    pub bubbles: BubblesConfig,
    /// Identifier reading settings.
    pub identifier: IdentifierConfig,
    /// Quiz identification settings.
    pub quiz: QuizConfig,
    /// Answer key store settings.
    pub keys: KeysConfig,
    /// Student directory settings.
    pub students: StudentsConfig,
    /// Notification settings.
    pub notify: NotifyConfig,
    /// Model settings.
    pub models: ModelsConfig,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// General configuration options.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Recurse into subdirectories by default.
    pub recursive: Option<bool>,
}

/// Bubble detection configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct BubblesConfig {
    /// Absolute floor for the calibrated mark threshold, in ink pixels.
    pub fill_floor: Option<u32>,
    /// Minimum bubble bounding-box side, in pixels.
    pub min_size: Option<u32>,
    /// Maximum bubble bounding-box side, in pixels.
    pub max_size: Option<u32>,
}

/// Identifier reading configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct IdentifierConfig {
    /// Enable/disable identifier reading.
    pub enabled: Option<bool>,
    /// Ink threshold level (0-255).
    pub ink_level: Option<u8>,
}

/// Quiz identification configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    /// QR decode retry budget.
    pub max_attempts: Option<usize>,
}

/// Answer key store configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// Directory of `<quiz_id>.json` answer keys.
    pub dir: Option<PathBuf>,
}

/// Student directory configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct StudentsConfig {
    /// JSON roster file.
    pub file: Option<PathBuf>,
}

/// Notification configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Outbox file score notifications are appended to.
    pub outbox: Option<PathBuf>,
}

/// Model configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Custom models directory path.
    pub dir: Option<PathBuf>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/bubblegrade/config.toml`
    /// 2. Project-local: `.bubblegrade.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are logged as warnings.
    pub fn load() -> Self {
        let mut config = Self::default();

        // Load XDG config (lowest priority)
        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        // Load project-local config (higher priority, merged)
        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        // Validate merged config
        if let Err(e) = config.validate() {
            eprintln!("warning: {e}");
        }

        config
    }

    /// Validate configuration values are within acceptable ranges.
    fn validate(&self) -> Result<(), String> {
        if let Some(floor) = self.bubbles.fill_floor {
            if floor == 0 {
                return Err("bubbles.fill_floor must be at least 1".to_string());
            }
        }
        if let (Some(min), Some(max)) = (self.bubbles.min_size, self.bubbles.max_size) {
            if min >= max {
                return Err(format!(
                    "bubbles.min_size must be below bubbles.max_size, got {min} >= {max}"
                ));
            }
        }
        if let Some(attempts) = self.quiz.max_attempts {
            if attempts == 0 {
                return Err("quiz.max_attempts must be at least 1".to_string());
            }
        }
        if let Some(ref f) = self.output.format {
            if f != "json" && f != "jsonl" {
                return Err(format!("output.format must be 'json' or 'jsonl', got '{f}'"));
            }
        }

        Ok(())
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        // General
        self.general.recursive = other.general.recursive.or(self.general.recursive);

        // Bubbles
        self.bubbles.fill_floor = other.bubbles.fill_floor.or(self.bubbles.fill_floor);
        self.bubbles.min_size = other.bubbles.min_size.or(self.bubbles.min_size);
        self.bubbles.max_size = other.bubbles.max_size.or(self.bubbles.max_size);

        // Identifier
        self.identifier.enabled = other.identifier.enabled.or(self.identifier.enabled);
        self.identifier.ink_level = other.identifier.ink_level.or(self.identifier.ink_level);

        // Quiz
        self.quiz.max_attempts = other.quiz.max_attempts.or(self.quiz.max_attempts);

        // Stores
        self.keys.dir = other.keys.dir.or_else(|| self.keys.dir.take());
        self.students.file = other.students.file.or_else(|| self.students.file.take());
        self.notify.outbox = other.notify.outbox.or_else(|| self.notify.outbox.take());

        // Models
        self.models.dir = other.models.dir.or_else(|| self.models.dir.take());

        // Output
        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("bubblegrade").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.bubblegrade.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(".bubblegrade.toml");
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.bubbles.fill_floor.is_none());
        assert!(config.identifier.ink_level.is_none());
        assert!(config.keys.dir.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml = "";
        let config: AppConfig = toml::from_str(toml).expect("parse empty config");
        assert!(config.general.recursive.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r"
[general]
recursive = true

[bubbles]
fill_floor = 150
min_size = 16
max_size = 80

[identifier]
enabled = true
ink_level = 140

[quiz]
max_attempts = 6

[keys]
dir = 'keys'

[students]
file = 'students.json'

[notify]
outbox = 'outbox.jsonl'

[output]
format = 'json'
pretty = true
";
        let config: AppConfig = toml::from_str(toml).expect("parse full config");

        assert_eq!(config.general.recursive, Some(true));
        assert_eq!(config.bubbles.fill_floor, Some(150));
        assert_eq!(config.bubbles.max_size, Some(80));
        assert_eq!(config.identifier.ink_level, Some(140));
        assert_eq!(config.quiz.max_attempts, Some(6));
        assert_eq!(config.keys.dir, Some(PathBuf::from("keys")));
        assert_eq!(config.output.format, Some("json".to_string()));
        assert_eq!(config.output.pretty, Some(true));
    }

    #[test]
    fn test_merge_configs() {
        let mut base: AppConfig = toml::from_str(
            r"
[bubbles]
fill_floor = 150

[identifier]
ink_level = 140
",
        )
        .expect("parse base");

        let override_config: AppConfig = toml::from_str(
            r"
[bubbles]
fill_floor = 220

[keys]
dir = 'local-keys'
",
        )
        .expect("parse override");

        base.merge(override_config);

        // Fill floor overridden
        assert_eq!(base.bubbles.fill_floor, Some(220));
        // Identifier preserved from base
        assert_eq!(base.identifier.ink_level, Some(140));
        // Keys added from override
        assert_eq!(base.keys.dir, Some(PathBuf::from("local-keys")));
    }

    #[test]
    fn test_merge_preserves_base_when_override_is_none() {
        let mut base: AppConfig = toml::from_str(
            r"
[bubbles]
fill_floor = 150
min_size = 16
",
        )
        .expect("parse base");

        let override_config: AppConfig = toml::from_str(
            r"
[bubbles]
fill_floor = 220
",
        )
        .expect("parse override");

        base.merge(override_config);

        assert_eq!(base.bubbles.fill_floor, Some(220));
        assert_eq!(base.bubbles.min_size, Some(16));
    }

    #[test]
    fn test_merge_empty_override_preserves_base() {
        let mut base: AppConfig = toml::from_str(
            r"
[quiz]
max_attempts = 4
",
        )
        .expect("parse base");

        base.merge(AppConfig::default());

        assert_eq!(base.quiz.max_attempts, Some(4));
    }

    #[test]
    fn test_partial_sections() {
        let toml = r"
[bubbles]
fill_floor = 180

[output]
format = 'jsonl'
";
        let config: AppConfig = toml::from_str(toml).expect("parse mixed");

        assert_eq!(config.bubbles.fill_floor, Some(180));
        assert!(config.bubbles.min_size.is_none());
        assert_eq!(config.output.format, Some("jsonl".to_string()));
        assert!(config.identifier.enabled.is_none());
        assert!(config.quiz.max_attempts.is_none());
    }

    #[test]
    fn test_invalid_toml_syntax_handled() {
        let toml = r"
[bubbles
fill_floor = 180
"; // Missing closing bracket
        let result: Result<AppConfig, _> = toml::from_str(toml);
        assert!(result.is_err(), "invalid TOML should return error");
    }

    #[test]
    fn test_invalid_field_type_handled() {
        let toml = r#"
[bubbles]
fill_floor = "lots"
"#;
        let result: Result<AppConfig, _> = toml::from_str(toml);
        assert!(result.is_err(), "type mismatch should return error");
    }

    #[test]
    fn test_validate_zero_fill_floor() {
        let mut config = AppConfig::default();
        config.bubbles.fill_floor = Some(0);

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("bubbles.fill_floor"));
    }

    #[test]
    fn test_validate_inverted_size_band() {
        let mut config = AppConfig::default();
        config.bubbles.min_size = Some(90);
        config.bubbles.max_size = Some(20);

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("bubbles.min_size"));
    }

    #[test]
    fn test_validate_zero_attempts() {
        let mut config = AppConfig::default();
        config.quiz.max_attempts = Some(0);

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_output_format_invalid() {
        let mut config = AppConfig::default();
        config.output.format = Some("xml".to_string());

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("output.format"));
    }

    #[test]
    fn test_validate_empty_config_passes() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }
}
