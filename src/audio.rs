use kira::sound::PlaybackState;
use kira::sound::static_sound::{StaticSoundData, StaticSoundHandle};
use kira::{AudioManager, Tween};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, warn};

/// A decoded track that the playback opcodes can start and stop.
pub trait Playable: Send {
    /// Plays from the beginning, restarting if already playing.
    fn start(&mut self) -> anyhow::Result<()>;
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
    /// Samples played so far, 0 when stopped.
    fn sample_position(&self) -> u32;
}

pub trait AudioSubsystem: Send {
    fn decode_and_open(&mut self, data: Vec<u8>) -> anyhow::Result<Box<dyn Playable>>;
}

pub struct KiraAudio {
    manager: Arc<Mutex<AudioManager>>,
}

impl KiraAudio {
    pub fn new() -> anyhow::Result<Self> {
        let manager = AudioManager::new(Default::default())
            .map_err(|e| anyhow::anyhow!("Failed to open audio output: {:?}", e))?;
        Ok(Self {
            manager: Arc::new(Mutex::new(manager)),
        })
    }
}

/// Opens the default output device, or a silent backend when there is none.
pub fn default_audio() -> Box<dyn AudioSubsystem> {
    match KiraAudio::new() {
        Ok(audio) => Box::new(audio),
        Err(e) => {
            warn!("{}, audio will be unavailable", e);
            Box::new(SilentAudio)
        }
    }
}

impl AudioSubsystem for KiraAudio {
    fn decode_and_open(&mut self, data: Vec<u8>) -> anyhow::Result<Box<dyn Playable>> {
        let data = StaticSoundData::from_cursor(Cursor::new(data))
            .map_err(|e| anyhow::anyhow!("Failed to decode audio: {}", e))?;
        Ok(Box::new(KiraTrack {
            manager: self.manager.clone(),
            data,
            handle: None,
        }))
    }
}

struct KiraTrack {
    manager: Arc<Mutex<AudioManager>>,
    data: StaticSoundData,
    handle: Option<StaticSoundHandle>,
}

impl Playable for KiraTrack {
    fn start(&mut self) -> anyhow::Result<()> {
        self.stop();
        let mut manager = self.manager.lock().unwrap_or_else(|e| e.into_inner());
        let handle = manager
            .play(self.data.clone())
            .map_err(|e| anyhow::anyhow!("Failed to play audio: {:?}", e))?;
        self.handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.stop(Tween {
                duration: Duration::ZERO,
                ..Default::default()
            });
        }
    }

    fn is_playing(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| matches!(handle.state(), PlaybackState::Playing))
    }

    fn sample_position(&self) -> u32 {
        match &self.handle {
            Some(handle) if matches!(handle.state(), PlaybackState::Playing) => {
                (handle.position() * self.data.sample_rate as f64) as u32
            }
            _ => 0,
        }
    }
}

impl Drop for KiraTrack {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Stands in when no output device is available; every load fails.
pub struct SilentAudio;

impl AudioSubsystem for SilentAudio {
    fn decode_and_open(&mut self, _data: Vec<u8>) -> anyhow::Result<Box<dyn Playable>> {
        error!("No audio output available");
        Err(anyhow::anyhow!("no audio output available"))
    }
}
