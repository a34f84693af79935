use crate::ToBytes;

use super::Codes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileLoaded {
    pub ok: bool,
}

impl ToBytes for FileLoaded {
    const OPCODE: u8 = Codes::FileLoaded as _;

    fn write_payload(&self, bytes: &mut Vec<u8>) {
        bytes.push(self.ok as u8);
    }
}
