use std::io::Read;

use crate::{Request, TryFromBytes};

use super::Codes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mixer {
    pub params: [u8; 3],
}

impl Mixer {
    pub fn channel(&self) -> u8 {
        self.params[0] & 0x0f
    }

    /// The unit refuses the configuration when the mode field in the third byte is 2.
    pub fn rejected(&self) -> bool {
        (self.params[2] >> 3) & 3 == 2
    }
}

impl TryFromBytes for Mixer {
    fn try_from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let mut params = [0; 3];
        std::io::Cursor::new(bytes).read_exact(&mut params)?;
        Ok(Mixer { params })
    }
}

impl Request for Mixer {
    const OPCODE: u8 = Codes::Mixer as _;

    fn consumed(&self) -> usize {
        3
    }
}
