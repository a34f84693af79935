use crate::ToBytes;

use super::Codes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferAssigned {
    pub buffer_id: u8,
}

impl ToBytes for BufferAssigned {
    const OPCODE: u8 = Codes::BufferAssigned as _;

    fn write_payload(&self, bytes: &mut Vec<u8>) {
        bytes.push(self.buffer_id);
    }
}
