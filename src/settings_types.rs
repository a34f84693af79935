use std::path::PathBuf;
use std::time::Duration;

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ListenerSettings {
    pub port: u16,
    /// Pins every connection on this port to one client slot, evicting whoever held it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<u8>,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ServerSettings {
    pub bind: String,
    pub listeners: Vec<ListenerSettings>,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct StorageSettings {
    pub data_dir: PathBuf,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TimingSettings {
    pub retry_interval_ms: u64,
    pub max_retries: u32,
    pub broadcast_interval_ms: u64,
}

impl TimingSettings {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_millis(self.broadcast_interval_ms)
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub timing: TimingSettings,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            listeners: vec![ListenerSettings {
                port: 8001,
                client_id: None,
            }],
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            retry_interval_ms: 500,
            max_retries: 10,
            broadcast_interval_ms: 33,
        }
    }
}
