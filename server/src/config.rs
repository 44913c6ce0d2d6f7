//! Server configuration
//!
//! Configuration is loaded from environment variables. Unset or unparsable
//! values keep their defaults.

use std::env;

use crate::pipeline::RoutingConfig;

/// Main server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub host: String,
    /// Server port
    pub port: u16,

    /// Remote file source configuration
    pub remote: RemoteConfig,

    /// View paths and microscopy capability
    pub routing: RoutingConfig,

    /// Upload configuration
    pub upload: UploadConfig,
}

/// Remote listing / content hosts
#[derive(Debug, Clone, Default)]
pub struct RemoteConfig {
    /// Listing endpoint prefix; the encoded relative path is appended
    pub api_base: Option<String>,
    /// Content host prefix; `<relative path>/<file name>` is appended
    pub content_base: Option<String>,
}

/// Upload-related configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Maximum upload size in bytes
    pub max_upload_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            remote: RemoteConfig::default(),
            routing: RoutingConfig::default(),
            upload: UploadConfig::default(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_size: 1024 * 1024 * 1024, // 1 GB
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Server config
        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PORT")
            && let Ok(p) = port.parse()
        {
            config.port = p;
        }

        // Remote source config
        if let Some(url) = lookup("URL_API")
            && !url.is_empty()
        {
            config.remote.api_base = Some(url);
        }
        if let Some(url) = lookup("URL_DICOM")
            && !url.is_empty()
        {
            config.remote.content_base = Some(url);
        }

        // Routing config
        if let Some(path) = lookup("DEFAULT_MODE_PATH")
            && !path.is_empty()
        {
            config.routing.default_mode_path = path;
        }
        if let Some(path) = lookup("MICROSCOPY_MODE_PATH")
            && !path.is_empty()
        {
            config.routing.microscopy_mode_path = path;
        }
        if let Some(val) = lookup("MICROSCOPY_ENABLED") {
            config.routing.microscopy_available = val.to_lowercase() == "true" || val == "1";
        }

        // Upload config
        if let Some(val) = lookup("MAX_UPLOAD_SIZE_MB")
            && let Ok(mb) = val.parse::<usize>()
        {
            config.upload.max_upload_size = mb * 1024 * 1024;
        }

        config
    }
}
