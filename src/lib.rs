pub mod audio;
pub mod connection;
pub mod data_files;
pub mod registry;
pub mod server;
pub mod session;
pub mod settings;
pub mod settings_types;

pub fn config_dir() -> std::path::PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    path.push("msuserver");
    let _ = std::fs::create_dir_all(&path);
    path
}
