use byteorder::ReadBytesExt;

use crate::{Request, TryFromBytes};

use super::Codes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    Stop,
    Start,
    Other(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Playback {
    pub value: u8,
}

impl Playback {
    pub fn channel(&self) -> u8 {
        self.value & 3
    }

    pub fn mode(&self) -> PlaybackMode {
        match self.value >> 2 {
            0 => PlaybackMode::Stop,
            2 => PlaybackMode::Start,
            other => PlaybackMode::Other(other),
        }
    }
}

impl TryFromBytes for Playback {
    fn try_from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let value = std::io::Cursor::new(bytes).read_u8()?;
        Ok(Playback { value })
    }
}

impl Request for Playback {
    const OPCODE: u8 = Codes::Playback as _;

    fn consumed(&self) -> usize {
        1
    }
}
