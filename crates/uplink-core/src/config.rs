//! Settings snapshot and TOML persistence under the XDG config dir.
//!
//! A run captures one immutable `SettingsSnapshot` when it starts; edits to
//! the config file while a run is in flight cannot affect that run.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Immutable credentials/settings for one run attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    /// Transfer host (raw; normalized by the transport before connecting).
    pub host: String,
    /// Transfer port.
    pub port: u16,
    /// Transfer username.
    pub username: String,
    /// Transfer password.
    pub password: String,
    /// Base URL of the processing API.
    pub api_base_url: String,
    /// Token sent as `X-Upload-Token` on every API request.
    pub api_token: String,
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 22,
            username: String::new(),
            password: String::new(),
            api_base_url: String::new(),
            api_token: String::new(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("uplink")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load settings from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SettingsSnapshot> {
    let path = config_path()?;
    if !path.exists() {
        let default_settings = SettingsSnapshot::default();
        let toml = toml::to_string_pretty(&default_settings)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_settings);
    }

    let data = fs::read_to_string(&path)?;
    let settings: SettingsSnapshot = toml::from_str(&data)?;
    Ok(settings)
}

/// Persist settings to the config file.
pub fn save(settings: &SettingsSnapshot) -> Result<()> {
    let path = config_path()?;
    let toml = toml::to_string_pretty(settings)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, toml)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_values() {
        let s = SettingsSnapshot::default();
        assert_eq!(s.port, 22);
        assert!(s.host.is_empty());
        assert!(s.api_token.is_empty());
    }

    #[test]
    fn settings_toml_roundtrip() {
        let s = SettingsSnapshot {
            host: "transfer.example.com".into(),
            port: 2222,
            username: "uploader".into(),
            password: "hunter2".into(),
            api_base_url: "https://api.example.com".into(),
            api_token: "tok".into(),
        };
        let toml = toml::to_string_pretty(&s).unwrap();
        let parsed: SettingsSnapshot = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.host, s.host);
        assert_eq!(parsed.port, s.port);
        assert_eq!(parsed.username, s.username);
        assert_eq!(parsed.api_base_url, s.api_base_url);
    }

    #[test]
    fn settings_toml_custom_values() {
        let toml = r#"
            host = "files.example.org"
            port = 22
            username = "video"
            password = "pw"
            api_base_url = "https://api.example.org/upload"
            api_token = "secret"
        "#;
        let s: SettingsSnapshot = toml::from_str(toml).unwrap();
        assert_eq!(s.host, "files.example.org");
        assert_eq!(s.username, "video");
        assert_eq!(s.api_base_url, "https://api.example.org/upload");
    }
}
