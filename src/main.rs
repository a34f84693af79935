use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use msuserver::audio::default_audio;
use msuserver::data_files::DataDir;
use msuserver::registry::ClientRegistry;
use msuserver::server::Server;
use msuserver::session::SessionUnit;
use msuserver::settings::{ListenerSettings, Settings, default_settings_path};

#[derive(Parser)]
#[command(name = "msuserver")]
#[command(about = "Multi-session unit server for networked cabinets")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Accept game clients and answer as the session unit
    Serve {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Listen on this port only, overriding the configured listeners
        #[arg(short, long)]
        port: Option<u16>,
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },
    /// Decrypt a stored audio file
    Decrypt {
        #[arg(short, long)]
        input: PathBuf,
        /// Defaults to the input with an .mp3 extension
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve {
        config: None,
        port: None,
        data_dir: None,
    }) {
        Commands::Serve {
            config,
            port,
            data_dir,
        } => serve(config, port, data_dir),
        Commands::Decrypt { input, output } => decrypt(&input, output),
    }
}

fn serve(config: Option<PathBuf>, port: Option<u16>, data_dir: Option<PathBuf>) -> Result<()> {
    let path = config.unwrap_or_else(default_settings_path);
    let mut settings = Settings::load(&path);

    if let Some(port) = port {
        settings.server.listeners = vec![ListenerSettings {
            port,
            client_id: None,
        }];
    }
    if let Some(data_dir) = data_dir {
        settings.storage.data_dir = data_dir;
    }

    let session = SessionUnit::new(
        Arc::new(ClientRegistry::new()),
        default_audio(),
        Box::new(DataDir::new(&settings.storage.data_dir)),
    );

    async_std::task::block_on(Server::new(settings, Arc::new(session)).run())
}

fn decrypt(input: &Path, output: Option<PathBuf>) -> Result<()> {
    let filename = input
        .file_name()
        .with_context(|| format!("Invalid file name {:?}", input))?;
    let data = fs::read(input).with_context(|| format!("Failed to read {:?}", input))?;

    let output = output.unwrap_or_else(|| input.with_extension("mp3"));
    fs::write(&output, network::decrypt_audio(filename.as_encoded_bytes(), &data))
        .with_context(|| format!("Failed to write {:?}", output))?;

    tracing::info!("Decrypted {:?} to {:?}", input, output);
    Ok(())
}
