//! Emulator configuration.
//!
//! Provides [`GcsConfig`]. Values are loaded from environment variables by
//! [`GcsConfig::from_env`]; anything unset keeps its default.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Storage emulator configuration.
///
/// # Examples
///
/// ```
/// use gcstack_core::config::GcsConfig;
///
/// let config = GcsConfig::default();
/// assert_eq!(config.gateway_listen, "0.0.0.0:9023");
/// assert!(!config.in_memory);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct GcsConfig {
    /// Bind address for the HTTP listener.
    #[builder(default = String::from("0.0.0.0:9023"))]
    pub gateway_listen: String,

    /// Directory that contains the storage directory.
    #[builder(default = String::from("."))]
    pub storage_base: String,

    /// Name of the storage directory under `storage_base`.
    #[builder(default = String::from(".cloudstorage"))]
    pub storage_dir: String,

    /// Keep everything in memory instead of on disk.
    #[builder(default = false)]
    pub in_memory: bool,

    /// Path prefix of the metadata API.
    #[builder(default = String::from("/storage/v1"))]
    pub api_endpoint: String,

    /// Path prefix of the upload API.
    #[builder(default = String::from("/upload/storage/v1"))]
    pub upload_endpoint: String,

    /// Path prefix of the download API.
    #[builder(default = String::from("/download/storage/v1"))]
    pub download_endpoint: String,

    /// Location assigned to buckets created without one.
    #[builder(default = String::from("US"))]
    pub default_location: String,

    /// Project number reported on bucket resources.
    #[builder(default = String::from("1234"))]
    pub project_number: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for GcsConfig {
    fn default() -> Self {
        Self {
            gateway_listen: String::from("0.0.0.0:9023"),
            storage_base: String::from("."),
            storage_dir: String::from(".cloudstorage"),
            in_memory: false,
            api_endpoint: String::from("/storage/v1"),
            upload_endpoint: String::from("/upload/storage/v1"),
            download_endpoint: String::from("/download/storage/v1"),
            default_location: String::from("US"),
            project_number: String::from("1234"),
            log_level: String::from("info"),
        }
    }
}

impl GcsConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GATEWAY_LISTEN` | `0.0.0.0:9023` |
    /// | `STORAGE_BASE` | `.` |
    /// | `STORAGE_DIR` | `.cloudstorage` |
    /// | `IN_MEMORY` | `false` |
    /// | `API_ENDPOINT` | `/storage/v1` |
    /// | `UPLOAD_ENDPOINT` | `/upload/storage/v1` |
    /// | `DOWNLOAD_ENDPOINT` | `/download/storage/v1` |
    /// | `DEFAULT_LOCATION` | `US` |
    /// | `PROJECT_NUMBER` | `1234` |
    /// | `LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// [`GcsConfig::from_env`] uses the process environment; tests pass a map.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("STORAGE_BASE") {
            config.storage_base = v;
        }
        if let Some(v) = lookup("STORAGE_DIR") {
            config.storage_dir = v;
        }
        if let Some(v) = lookup("IN_MEMORY") {
            config.in_memory = parse_bool(&v);
        }
        if let Some(v) = lookup("API_ENDPOINT") {
            config.api_endpoint = v;
        }
        if let Some(v) = lookup("UPLOAD_ENDPOINT") {
            config.upload_endpoint = v;
        }
        if let Some(v) = lookup("DOWNLOAD_ENDPOINT") {
            config.download_endpoint = v;
        }
        if let Some(v) = lookup("DEFAULT_LOCATION") {
            config.default_location = v;
        }
        if let Some(v) = lookup("PROJECT_NUMBER") {
            config.project_number = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// Directory holding bucket directories and the metadata snapshot.
    #[must_use]
    pub fn storage_root(&self) -> PathBuf {
        PathBuf::from(&self.storage_base).join(&self.storage_dir)
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
