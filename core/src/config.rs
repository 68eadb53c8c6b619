//! Typed configuration store: defaults, YAML overlay, CLI overlay.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use crate::error::PipelineError;

/// A single configuration value. The variant is fixed the first time a key
/// is written and enforced on every later overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Int(i64),
    Bool(bool),
    Str(String),
}

impl ConfigValue {
    fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::Int(_) => "int",
            ConfigValue::Bool(_) => "bool",
            ConfigValue::Str(_) => "string",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Recognized configuration keys, mirroring the original client's constants.
pub const HOST: &str = "host";
pub const PORT: &str = "port";
pub const WS_PATH: &str = "ws_path";
pub const WS_TIMEUP: &str = "ws_timeup";
pub const EXEC_LINE_NIX: &str = "exec_line_nix";
pub const EXEC_LINE_WIN: &str = "exec_line_win";
pub const CLIENT_KEY: &str = "client_key";
pub const CLIENT_SECRET: &str = "client_secret";
pub const TIMEOUT_SECONDS: &str = "timeout_seconds";
pub const DEBUG: &str = "debug";
pub const STARTING: &str = "starting";

/// The typed configuration bag. Built with defaults, optionally overlaid by
/// a YAML file, then overlaid by CLI flags; frozen for the command's
/// duration thereafter.
#[derive(Debug, Clone)]
pub struct Config {
    values: HashMap<&'static str, ConfigValue>,
}

impl Default for Config {
    fn default() -> Self {
        let mut values = HashMap::new();
        values.insert(HOST, ConfigValue::Str("http://localhost".to_string()));
        values.insert(PORT, ConfigValue::Int(8181));
        values.insert(WS_PATH, ConfigValue::Str("ws".to_string()));
        values.insert(WS_TIMEUP, ConfigValue::Int(25));
        values.insert(EXEC_LINE_NIX, ConfigValue::Str(String::new()));
        values.insert(EXEC_LINE_WIN, ConfigValue::Str(String::new()));
        values.insert(CLIENT_KEY, ConfigValue::Str(String::new()));
        values.insert(CLIENT_SECRET, ConfigValue::Str(String::new()));
        values.insert(TIMEOUT_SECONDS, ConfigValue::Int(10));
        values.insert(DEBUG, ConfigValue::Bool(false));
        values.insert(STARTING, ConfigValue::Bool(false));
        Config { values }
    }
}

/// The subset of the YAML document we accept; unknown keys are ignored,
/// absent keys keep their default.
#[derive(Debug, Deserialize, Default)]
struct YamlOverlay {
    host: Option<String>,
    port: Option<i64>,
    ws_path: Option<String>,
    ws_timeup: Option<i64>,
    exec_line_nix: Option<String>,
    exec_line_win: Option<String>,
    client_key: Option<String>,
    client_secret: Option<String>,
    timeout_seconds: Option<i64>,
    debug: Option<bool>,
    starting: Option<bool>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay a YAML document's recognized keys onto this config.
    pub fn overlay_yaml(&mut self, data: &str) -> Result<()> {
        let overlay: YamlOverlay = serde_yaml::from_str(data)
            .map_err(|e| PipelineError::Config(format!("parsing configuration: {e}")))?;

        if let Some(v) = overlay.host {
            self.set_str(HOST, v);
        }
        if let Some(v) = overlay.port {
            self.set_int(PORT, v)?;
        }
        if let Some(v) = overlay.ws_path {
            self.set_str(WS_PATH, v);
        }
        if let Some(v) = overlay.ws_timeup {
            self.set_int(WS_TIMEUP, v)?;
        }
        if let Some(v) = overlay.exec_line_nix {
            self.set_str(EXEC_LINE_NIX, v);
        }
        if let Some(v) = overlay.exec_line_win {
            self.set_str(EXEC_LINE_WIN, v);
        }
        if let Some(v) = overlay.client_key {
            self.set_str(CLIENT_KEY, v);
        }
        if let Some(v) = overlay.client_secret {
            self.set_str(CLIENT_SECRET, v);
        }
        if let Some(v) = overlay.timeout_seconds {
            self.set_int(TIMEOUT_SECONDS, v)?;
        }
        if let Some(v) = overlay.debug {
            self.set_bool(DEBUG, v);
        }
        if let Some(v) = overlay.starting {
            self.set_bool(STARTING, v);
        }
        Ok(())
    }

    /// Load and overlay a YAML file from disk.
    pub fn overlay_yaml_file(&mut self, path: &Path) -> Result<()> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration file {}", path.display()))?;
        self.overlay_yaml(&data)
    }

    /// Set a key from a raw CLI flag string, validating it against the
    /// key's declared type. Unknown keys are rejected.
    pub fn set_from_cli(&mut self, key: &str, raw: &str) -> Result<()> {
        let existing = self
            .values
            .get(key)
            .ok_or_else(|| PipelineError::Usage(format!("unknown configuration key '{key}'")))?;

        match existing {
            ConfigValue::Int(_) => {
                let parsed: i64 = raw.parse().map_err(|_| {
                    PipelineError::Config(format!("'{key}' expects an integer, got '{raw}'"))
                })?;
                self.values
                    .insert(Self::static_key(key)?, ConfigValue::Int(parsed));
            }
            ConfigValue::Bool(_) => {
                let parsed = match raw {
                    "true" => true,
                    "false" => false,
                    _ => {
                        return Err(PipelineError::Config(format!(
                            "'{key}' expects 'true' or 'false', got '{raw}'"
                        ))
                        .into());
                    }
                };
                self.values
                    .insert(Self::static_key(key)?, ConfigValue::Bool(parsed));
            }
            ConfigValue::Str(_) => {
                self.values
                    .insert(Self::static_key(key)?, ConfigValue::Str(raw.to_string()));
            }
        }
        Ok(())
    }

    fn static_key(key: &str) -> Result<&'static str> {
        [
            HOST,
            PORT,
            WS_PATH,
            WS_TIMEUP,
            EXEC_LINE_NIX,
            EXEC_LINE_WIN,
            CLIENT_KEY,
            CLIENT_SECRET,
            TIMEOUT_SECONDS,
            DEBUG,
            STARTING,
        ]
        .into_iter()
        .find(|k| *k == key)
        .ok_or_else(|| anyhow!("unknown configuration key '{key}'"))
    }

    fn set_str(&mut self, key: &'static str, value: String) {
        self.values.insert(key, ConfigValue::Str(value));
    }

    fn set_int(&mut self, key: &'static str, value: i64) -> Result<()> {
        self.values.insert(key, ConfigValue::Int(value));
        Ok(())
    }

    fn set_bool(&mut self, key: &'static str, value: bool) {
        self.values.insert(key, ConfigValue::Bool(value));
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    pub fn host(&self) -> String {
        self.get(HOST).and_then(ConfigValue::as_str).unwrap_or("http://localhost").to_string()
    }

    pub fn port(&self) -> i64 {
        self.get(PORT).and_then(ConfigValue::as_int).unwrap_or(8181)
    }

    pub fn ws_path(&self) -> String {
        self.get(WS_PATH).and_then(ConfigValue::as_str).unwrap_or("ws").to_string()
    }

    pub fn ws_timeup(&self) -> i64 {
        self.get(WS_TIMEUP).and_then(ConfigValue::as_int).unwrap_or(25)
    }

    pub fn exec_line(&self) -> String {
        let key = if cfg!(windows) { EXEC_LINE_WIN } else { EXEC_LINE_NIX };
        self.get(key).and_then(ConfigValue::as_str).unwrap_or("").to_string()
    }

    pub fn client_key(&self) -> String {
        self.get(CLIENT_KEY).and_then(ConfigValue::as_str).unwrap_or("").to_string()
    }

    pub fn client_secret(&self) -> String {
        self.get(CLIENT_SECRET).and_then(ConfigValue::as_str).unwrap_or("").to_string()
    }

    pub fn timeout_seconds(&self) -> i64 {
        self.get(TIMEOUT_SECONDS).and_then(ConfigValue::as_int).unwrap_or(10)
    }

    pub fn debug(&self) -> bool {
        self.get(DEBUG).and_then(ConfigValue::as_bool).unwrap_or(false)
    }

    pub fn starting(&self) -> bool {
        self.get(STARTING).and_then(ConfigValue::as_bool).unwrap_or(false)
    }

    /// The base URL the service client issues requests against.
    pub fn url(&self) -> String {
        format!("{}:{}/{}/", self.host(), self.port(), self.ws_path())
    }
}

/// Enumerate the recognized keys, for registering one global CLI flag per
/// key and for documenting the declared type in `--help`.
pub fn recognized_keys() -> &'static [(&'static str, &'static str)] {
    &[
        (HOST, "string"),
        (PORT, "int"),
        (WS_PATH, "string"),
        (WS_TIMEUP, "int"),
        (EXEC_LINE_NIX, "string"),
        (EXEC_LINE_WIN, "string"),
        (CLIENT_KEY, "string"),
        (CLIENT_SECRET, "string"),
        (TIMEOUT_SECONDS, "int"),
        (DEBUG, "bool"),
        (STARTING, "bool"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_client() {
        let cfg = Config::new();
        assert_eq!(cfg.host(), "http://localhost");
        assert_eq!(cfg.port(), 8181);
        assert_eq!(cfg.ws_path(), "ws");
        assert_eq!(cfg.ws_timeup(), 25);
        assert_eq!(cfg.timeout_seconds(), 10);
        assert!(!cfg.debug());
        assert!(!cfg.starting());
    }

    #[test]
    fn url_composes_host_port_path() {
        let cfg = Config::new();
        assert_eq!(cfg.url(), "http://localhost:8181/ws/");
    }

    #[test]
    fn yaml_overlay_overrides_defaults() {
        let mut cfg = Config::new();
        cfg.overlay_yaml("port: 9191\ndebug: true\n").unwrap();
        assert_eq!(cfg.port(), 9191);
        assert!(cfg.debug());
    }

    #[test]
    fn cli_overlay_rejects_bad_int() {
        let mut cfg = Config::new();
        assert!(cfg.set_from_cli(PORT, "not-a-number").is_err());
    }

    #[test]
    fn cli_overlay_rejects_bad_bool() {
        let mut cfg = Config::new();
        assert!(cfg.set_from_cli(DEBUG, "yes").is_err());
    }

    #[test]
    fn cli_overlay_accepts_valid_values() {
        let mut cfg = Config::new();
        cfg.set_from_cli(PORT, "9000").unwrap();
        cfg.set_from_cli(DEBUG, "true").unwrap();
        assert_eq!(cfg.port(), 9000);
        assert!(cfg.debug());
    }

    #[test]
    fn cli_overlay_rejects_unknown_key() {
        let mut cfg = Config::new();
        assert!(cfg.set_from_cli("nonexistent", "x").is_err());
    }
}
