//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. An explicit `--config` path
//! 2. `$INBOUND_DROP_CONFIG` (environment variable)
//! 3. `~/.config/inbound-drop/config.toml` (Linux/macOS)
//!    `%APPDATA%\inbound-drop\config.toml` (Windows)
//! 4. Built-in defaults (no clients, so every sender is refused)
//!
//! `EMAIL_DOMAIN` and `BASE_DROP_ZONE` override the accepted domain and the
//! bucket name after the file is read.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DropError, Result};

/// Top-level configuration. Read-only once loaded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Inbound webhook settings.
    pub inbound: InboundConfig,
    /// Storage destination settings.
    pub storage: StorageConfig,
    /// Sender local-part → client configuration.
    pub clients: BTreeMap<String, ClientConfig>,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override directory for log files.
    pub log_dir: Option<PathBuf>,
}

/// Inbound webhook settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InboundConfig {
    /// The only envelope sender domain accepted.
    pub email_domain: String,
}

/// What to do when two attachments in one batch share a file name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Append `_1`, `_2`, … to the stem of later duplicates.
    #[default]
    Rename,
    /// Last write wins.
    Overwrite,
}

/// Storage destination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Bucket (drop zone) name.
    pub bucket: String,
    /// Local directory holding the bucket when using the filesystem store.
    pub root: PathBuf,
    /// Policy for same-named attachments within one batch.
    pub duplicate_names: DuplicatePolicy,
}

/// Per-client settings, keyed by the sender's local-part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Content types accepted from this client (e.g. `"text/plain"`).
    #[serde(alias = "content_types")]
    pub allowed_content_types: BTreeSet<String>,
    /// Storage sub-path under the bucket.
    #[serde(alias = "storage")]
    pub storage_prefix: String,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

impl Default for InboundConfig {
    fn default() -> Self {
        Self {
            email_domain: "parse.neustar.com".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "attachment-drop-zone".to_string(),
            root: PathBuf::from("."),
            duplicate_names: DuplicatePolicy::Rename,
        }
    }
}

impl Config {
    /// Parse a configuration from TOML text.
    pub fn from_toml(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Look up the client configured for a sender local-part.
    pub fn client(&self, local_part: &str) -> Option<&ClientConfig> {
        self.clients.get(local_part)
    }

    /// Apply `EMAIL_DOMAIN` / `BASE_DROP_ZONE` environment overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(domain) = std::env::var("EMAIL_DOMAIN") {
            if !domain.is_empty() {
                self.inbound.email_domain = domain;
            }
        }
        if let Ok(bucket) = std::env::var("BASE_DROP_ZONE") {
            if !bucket.is_empty() {
                self.storage.bucket = bucket;
            }
        }
    }
}

// ── Load ────────────────────────────────────────────────────────

/// Load configuration from `explicit` or the standard locations.
///
/// A missing file yields the defaults. A file that exists but cannot be read
/// or parsed is an error: falling back silently would swap the allow-list.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = explicit.map(Path::to_path_buf).or_else(config_file_path);

    let mut cfg = match path {
        Some(path) if path.exists() => {
            let contents = std::fs::read_to_string(&path).map_err(|e| DropError::Config {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            let cfg = Config::from_toml(&contents).map_err(|e| DropError::Config {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            tracing::info!(
                path = %path.display(),
                clients = cfg.clients.len(),
                "Loaded config"
            );
            cfg
        }
        Some(path) if explicit.is_some() => {
            return Err(DropError::Config {
                path,
                reason: "file not found".to_string(),
            });
        }
        _ => {
            tracing::warn!("No config file found, using defaults (no clients)");
            Config::default()
        }
    };

    cfg.apply_env_overrides();
    Ok(cfg)
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("INBOUND_DROP_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("inbound-drop").join("config.toml"))
}

/// Return the directory for log files.
pub fn log_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.log_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("inbound-drop")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[inbound]
email_domain = "parse.neustar.com"

[storage]
bucket = "attachment-drop-zone"
duplicate_names = "overwrite"

[clients.client1]
content_types = ["image/jpeg", "text/plain", "text/html"]
storage = "client1"

[clients.client2]
allowed_content_types = ["text/plain"]
storage_prefix = "client2/inbox"
"#;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.inbound.email_domain, "parse.neustar.com");
        assert_eq!(cfg.storage.bucket, "attachment-drop-zone");
        assert_eq!(cfg.storage.duplicate_names, DuplicatePolicy::Rename);
        assert!(cfg.clients.is_empty());
    }

    #[test]
    fn test_client_table_with_aliases() {
        let cfg = Config::from_toml(SAMPLE).expect("parse sample");
        let client1 = cfg.client("client1").expect("client1");
        assert!(client1.allowed_content_types.contains("image/jpeg"));
        assert_eq!(client1.storage_prefix, "client1");
        assert_eq!(cfg.client("client2").unwrap().storage_prefix, "client2/inbox");
        assert!(cfg.client("client3").is_none());
        assert_eq!(cfg.storage.duplicate_names, DuplicatePolicy::Overwrite);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let cfg = Config::from_toml("[general]\nlog_level = \"debug\"\n").expect("parse partial");
        assert_eq!(cfg.general.log_level, "debug");
        assert_eq!(cfg.storage.bucket, "attachment-drop-zone");
        assert!(cfg.clients.is_empty());
    }

    #[test]
    fn test_client_requires_both_fields() {
        let broken = "[clients.client1]\nstorage = \"client1\"\n";
        assert!(Config::from_toml(broken).is_err());
    }

    #[test]
    fn test_load_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = load_config(Some(&missing)).unwrap_err();
        assert!(matches!(err, DropError::Config { .. }));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.clients.len(), 2);
    }

    #[test]
    fn test_load_unparsable_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[clients.client1\n").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }
}
