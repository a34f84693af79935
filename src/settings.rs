pub use crate::settings_types::*;
use crate::config_dir;
use network::protocol::MAX_CLIENT_ID;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub fn default_settings_path() -> PathBuf {
    config_dir().join("settings.toml")
}

impl Settings {
    /// Reads settings from `path`, writing a default file when none exists yet.
    /// Unreadable or unparsable files fall back to the defaults.
    pub fn load(path: &Path) -> Self {
        let settings = if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<Settings>(&content) {
                    Ok(s) => {
                        info!("Loaded settings from {:?}", path);
                        s
                    }
                    Err(e) => {
                        error!("Failed to parse {:?}: {}", path, e);
                        Settings::default()
                    }
                },
                Err(e) => {
                    error!("Failed to read {:?}: {}", path, e);
                    Settings::default()
                }
            }
        } else {
            info!("Creating default settings at {:?}", path);
            let default_settings = Settings::default();
            default_settings.save(path);
            default_settings
        };

        settings.sanitized()
    }

    pub fn save(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }

        match toml::to_string_pretty(self) {
            Ok(content) => {
                if let Err(e) = fs::write(path, content) {
                    error!("Failed to write {:?}: {}", path, e);
                } else {
                    info!("Saved settings to {:?}", path);
                }
            }
            Err(e) => error!("Failed to serialize settings: {}", e),
        }
    }

    fn sanitized(mut self) -> Self {
        for listener in &mut self.server.listeners {
            if let Some(id) = listener.client_id
                && !(1..=MAX_CLIENT_ID).contains(&id)
            {
                warn!(
                    "Ignoring client_id {} on port {}: must be 1..={}",
                    id, listener.port, MAX_CLIENT_ID
                );
                listener.client_id = None;
            }
        }

        if self.server.listeners.is_empty() {
            warn!("No listeners configured, using the default port");
            self.server.listeners = ServerSettings::default().listeners;
        }

        self
    }
}
