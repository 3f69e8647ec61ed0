use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Env var that overrides `api_base_url` at startup
pub const API_BASE_URL_ENV: &str = "BARCAP_API_BASE_URL";

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Bearer token file; absent or empty means unauthenticated
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,

    /// "file" (frames from a directory) or "v4l2" (real camera)
    #[serde(default = "default_camera_source")]
    pub camera_source: String,

    #[serde(default = "default_camera_device")]
    pub camera_device: String,

    /// Frame directory for the file source
    #[serde(default = "default_frames_dir")]
    pub frames_dir: PathBuf,

    #[serde(default = "default_capture_width")]
    pub capture_width: u32,

    #[serde(default = "default_capture_height")]
    pub capture_height: u32,

    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    #[serde(default = "default_downloads_dir")]
    pub downloads_dir: PathBuf,
}

fn default_api_base_url() -> String {
    "https://api.example.com".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_token_path() -> PathBuf {
    config_dir().join("token")
}

fn default_camera_source() -> String {
    "file".to_string()
}

fn default_camera_device() -> String {
    "/dev/video0".to_string()
}

fn default_frames_dir() -> PathBuf {
    PathBuf::from("frames")
}

fn default_capture_width() -> u32 {
    1280
}

fn default_capture_height() -> u32 {
    720
}

fn default_jpeg_quality() -> u8 {
    90
}

fn default_downloads_dir() -> PathBuf {
    PathBuf::from("captures")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            timeout: default_timeout(),
            token_path: default_token_path(),
            camera_source: default_camera_source(),
            camera_device: default_camera_device(),
            frames_dir: default_frames_dir(),
            capture_width: default_capture_width(),
            capture_height: default_capture_height(),
            jpeg_quality: default_jpeg_quality(),
            downloads_dir: default_downloads_dir(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.config/barcap/config.json)
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let config: Self = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

            tracing::info!("Loaded config from {:?}", config_path);
            config
        } else {
            tracing::info!(
                "Config file not found at {:?}, creating default config",
                config_path
            );
            let config = Self::default();
            config.save()?;
            config
        };

        if let Ok(base_url) = std::env::var(API_BASE_URL_ENV) {
            tracing::info!("Using API base URL from {}", API_BASE_URL_ENV);
            config.api_base_url = base_url;
        }

        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        tracing::info!("Saved config to {:?}", config_path);
        Ok(())
    }

    fn config_path() -> PathBuf {
        config_dir().join("config.json")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.is_empty() {
            return Err(anyhow::anyhow!("api_base_url cannot be empty"));
        }

        if self.timeout == 0 {
            return Err(anyhow::anyhow!("timeout must be at least 1 second"));
        }

        if !["file", "v4l2"].contains(&self.camera_source.as_str()) {
            return Err(anyhow::anyhow!("camera_source must be one of: file, v4l2"));
        }

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(anyhow::anyhow!("jpeg_quality must be between 1 and 100"));
        }

        Ok(())
    }
}

fn config_dir() -> PathBuf {
    let base = if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(dir)
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config")
    } else {
        PathBuf::from(".config")
    };

    base.join("barcap")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.timeout, 10);
        assert_eq!((config.capture_width, config.capture_height), (1280, 720));
        assert_eq!(config.jpeg_quality, 90);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"api_base_url": "http://localhost:8000"}"#).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.timeout, 10);
        assert_eq!(config.camera_source, "file");
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = Config::default();
        config.camera_source = "gphoto".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.jpeg_quality = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api_base_url.clear();
        assert!(config.validate().is_err());
    }
}
