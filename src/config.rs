//=====================================================
// File: config.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Interpreter configuration
// Objective: Define ScriptConfig with its defaults and load it from TOML
//=====================================================

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name looked up under the user's config directory.
const CONFIG_FILE: &str = "buddyscript.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading configuration from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Settings for one interpreter instance.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScriptConfig {
    /// Root directory handed to host bindings.
    pub workdir: PathBuf,
    /// Wall-clock budget for one `execute` call, in milliseconds.
    pub timeout: u64,
    #[serde(rename = "enableAI")]
    pub enable_ai: bool,
    pub enable_bash: bool,
    pub enable_file_ops: bool,
    /// Runs `test` blocks and reports their results.
    pub verbose: bool,
    /// Forwarded to bindings; the interpreter itself ignores it.
    pub dry_run: bool,
    /// Seeded into the global scope before execution.
    pub variables: BTreeMap<String, JsonValue>,
    pub max_call_depth: usize,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            workdir: PathBuf::from("."),
            timeout: 30_000,
            enable_ai: true,
            enable_bash: true,
            enable_file_ops: true,
            verbose: false,
            dry_run: false,
            variables: BTreeMap::new(),
            max_call_depth: 256,
        }
    }
}

impl ScriptConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(data: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(data)
    }

    /// `<config dir>/buddyscript/buddyscript.toml`, when a config dir exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("buddyscript").join(CONFIG_FILE))
    }

    /// Load from [`ScriptConfig::default_path`], falling back to defaults
    /// when the file is absent.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = timeout_ms;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = workdir.into();
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: JsonValue) -> Self {
        self.variables.insert(name.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = ScriptConfig::default();
        assert_eq!(config.workdir, PathBuf::from("."));
        assert_eq!(config.timeout, 30_000);
        assert!(config.enable_ai && config.enable_bash && config.enable_file_ops);
        assert!(!config.verbose);
        assert!(!config.dry_run);
        assert_eq!(config.max_call_depth, 256);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ScriptConfig::from_toml(
            r#"
timeout = 500
verbose = true
enableAI = false

[variables]
project = "demo"
retries = 3
"#,
        )
        .unwrap();
        assert_eq!(config.timeout, 500);
        assert!(config.verbose);
        assert!(!config.enable_ai);
        assert!(config.enable_file_ops);
        assert_eq!(config.variables["project"], json!("demo"));
        assert_eq!(config.variables["retries"], json!(3));
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "timeout = \"soon\"").unwrap();
        let err = ScriptConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));

        let missing = ScriptConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));
    }
}

//=====================================================
// End of file
//=====================================================
