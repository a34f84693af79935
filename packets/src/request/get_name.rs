use byteorder::ReadBytesExt;

use crate::{Request, TryFromBytes};

use super::Codes;

pub const MAX_NAME_LEN: usize = 0x20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetName {
    pub client_id: u8,
    pub len: u8,
}

impl GetName {
    pub fn requested_len(&self) -> usize {
        (self.len as usize).min(MAX_NAME_LEN)
    }
}

impl TryFromBytes for GetName {
    fn try_from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let mut cursor = std::io::Cursor::new(bytes);
        let client_id = cursor.read_u8()?;
        let len = cursor.read_u8()?;
        Ok(GetName { client_id, len })
    }
}

impl Request for GetName {
    const OPCODE: u8 = Codes::GetName as _;

    fn consumed(&self) -> usize {
        2
    }
}
