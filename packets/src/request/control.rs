use byteorder::ReadBytesExt;

use crate::{Request, TryFromBytes};

use super::Codes;

/// A hardware control request carrying a single parameter byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Control<const OPCODE: u8> {
    pub value: u8,
}

pub type SetLevel = Control<{ Codes::SetLevel as u8 }>;
pub type Control48 = Control<{ Codes::Control48 as u8 }>;
pub type Control4A = Control<{ Codes::Control4A as u8 }>;
pub type OutputBit58 = Control<{ Codes::OutputBit58 as u8 }>;
pub type OutputBit60 = Control<{ Codes::OutputBit60 as u8 }>;
pub type OutputBit62 = Control<{ Codes::OutputBit62 as u8 }>;

impl SetLevel {
    pub fn level(&self) -> u8 {
        self.value.min(0x7f)
    }
}

impl<const OPCODE: u8> Control<OPCODE> {
    /// The low bit, which the output-bit requests write into the unit's control register.
    pub fn flag(&self) -> bool {
        self.value & 1 != 0
    }
}

impl<const OPCODE: u8> TryFromBytes for Control<OPCODE> {
    fn try_from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let mut cursor = std::io::Cursor::new(bytes);
        let value = cursor.read_u8()?;
        Ok(Control { value })
    }
}

impl<const OPCODE: u8> Request for Control<OPCODE> {
    const OPCODE: u8 = OPCODE;

    fn consumed(&self) -> usize {
        1
    }
}
