//! Transcript assembler configuration
//!
//! Supports a YAML config file and environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::ConfigError;

/// Assembler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblerConfig {
    /// Label of a call-group entry outside any loop
    #[serde(default = "default_step_label")]
    pub step_label: String,

    /// Looped call-group entries are labelled "{prefix} {iteration}"
    #[serde(default = "default_round_label_prefix")]
    pub round_label_prefix: String,

    /// Label of the conversational entry
    #[serde(default = "default_assistant_label")]
    pub assistant_label: String,

    /// Label of card entries
    #[serde(default = "default_card_label")]
    pub card_label: String,

    /// Label of error entries
    #[serde(default = "default_error_label")]
    pub error_label: String,

    /// Let a `running` event overwrite a call that already finished
    #[serde(default)]
    pub reopen_finished_calls: bool,

    /// Close the open conversational entry when a `result` frame arrives
    #[serde(default = "default_true")]
    pub rotate_on_result: bool,
}

fn default_step_label() -> String {
    "step".to_string()
}

fn default_round_label_prefix() -> String {
    "round".to_string()
}

fn default_assistant_label() -> String {
    "AI".to_string()
}

fn default_card_label() -> String {
    "card".to_string()
}

fn default_error_label() -> String {
    "error".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            step_label: default_step_label(),
            round_label_prefix: default_round_label_prefix(),
            assistant_label: default_assistant_label(),
            card_label: default_card_label(),
            error_label: default_error_label(),
            reopen_finished_calls: false,
            rotate_on_result: default_true(),
        }
    }
}

impl AssemblerConfig {
    /// Load from a YAML file. Missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if raw.trim().is_empty() {
            debug!(path = %path.display(), "empty config file, using defaults");
            return Ok(Self::default());
        }
        let config = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded assembler config");
        Ok(config)
    }

    /// Defaults, then the optional file, then `BOPS_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_string("BOPS_STEP_LABEL") {
            self.step_label = v;
        }
        if let Some(v) = env_string("BOPS_ROUND_LABEL_PREFIX") {
            self.round_label_prefix = v;
        }
        if let Some(v) = env_string("BOPS_ASSISTANT_LABEL") {
            self.assistant_label = v;
        }
        if let Some(v) = env_string("BOPS_CARD_LABEL") {
            self.card_label = v;
        }
        if let Some(v) = env_string("BOPS_ERROR_LABEL") {
            self.error_label = v;
        }
        if let Some(v) = env_bool("BOPS_REOPEN_FINISHED_CALLS") {
            self.reopen_finished_calls = v;
        }
        if let Some(v) = env_bool("BOPS_ROTATE_ON_RESULT") {
            self.rotate_on_result = v;
        }
        self
    }

    pub fn round_label(&self, iteration: u64) -> String {
        format!("{} {}", self.round_label_prefix, iteration)
    }
}

pub fn env_bool(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?.to_lowercase();
    match value.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Mutex, OnceLock};

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn with_env_overrides<T>(updates: &[(&str, Option<&str>)], f: impl FnOnce() -> T) -> T {
        let _guard = env_lock();
        let previous = updates
            .iter()
            .map(|(key, _)| ((*key).to_string(), std::env::var(key).ok()))
            .collect::<Vec<_>>();
        for (key, value) in updates {
            match value {
                Some(v) => unsafe { std::env::set_var(key, v) },
                None => unsafe { std::env::remove_var(key) },
            }
        }
        let result = f();
        for (key, old) in previous {
            match old {
                Some(v) => unsafe { std::env::set_var(&key, v) },
                None => unsafe { std::env::remove_var(&key) },
            }
        }
        result
    }

    #[test]
    fn test_defaults() {
        let config = AssemblerConfig::default();
        assert_eq!(config.step_label, "step");
        assert_eq!(config.round_label(3), "round 3");
        assert!(!config.reopen_finished_calls);
        assert!(config.rotate_on_result);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "step_label: 步骤\nreopen_finished_calls: true").unwrap();
        let config = AssemblerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.step_label, "步骤");
        assert!(config.reopen_finished_calls);
        assert_eq!(config.assistant_label, "AI");
        assert!(config.rotate_on_result);
    }

    #[test]
    fn test_empty_file_is_default() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = AssemblerConfig::from_file(file.path()).unwrap();
        assert_eq!(config, AssemblerConfig::default());
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rotate_on_result: [not, a, bool]").unwrap();
        let err = AssemblerConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AssemblerConfig::from_file(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let config = with_env_overrides(
            &[
                ("BOPS_CARD_LABEL", Some("卡片")),
                ("BOPS_ROTATE_ON_RESULT", Some("off")),
                ("BOPS_REOPEN_FINISHED_CALLS", Some("maybe")),
                ("BOPS_STEP_LABEL", Some("  ")),
            ],
            || AssemblerConfig::load(None).unwrap(),
        );
        assert_eq!(config.card_label, "卡片");
        assert!(!config.rotate_on_result);
        assert!(!config.reopen_finished_calls);
        assert_eq!(config.step_label, "step");
    }
}
