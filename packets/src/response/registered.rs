use crate::ToBytes;

use super::Codes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registered {
    pub client_id: u8,
}

impl ToBytes for Registered {
    const OPCODE: u8 = Codes::Registered as _;

    fn write_payload(&self, bytes: &mut Vec<u8>) {
        bytes.push(self.client_id);
    }
}
