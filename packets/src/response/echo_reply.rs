use crate::ToBytes;

use super::Codes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoReply {
    pub declared_len: u8,
    pub data: Vec<u8>,
}

impl ToBytes for EchoReply {
    const OPCODE: u8 = Codes::Echo as _;

    fn write_payload(&self, bytes: &mut Vec<u8>) {
        bytes.push(self.declared_len);
        bytes.extend_from_slice(&self.data);
    }
}
