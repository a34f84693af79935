use std::borrow::Cow;
use std::io::Cursor;

use crate::{Request, TryFromBytes, read_prefixed};

use super::Codes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFile {
    pub filename: Vec<u8>,
}

impl LoadFile {
    /// The name for logs. Keys and lookups use the raw bytes.
    pub fn display_name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.filename)
    }
}

impl TryFromBytes for LoadFile {
    fn try_from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let filename = read_prefixed(&mut Cursor::new(bytes))?;
        Ok(LoadFile { filename })
    }
}

impl Request for LoadFile {
    const OPCODE: u8 = Codes::LoadFile as _;

    fn consumed(&self) -> usize {
        1 + self.filename.len()
    }
}
