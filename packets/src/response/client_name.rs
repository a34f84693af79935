use crate::ToBytes;

use super::Codes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientName {
    pub name: Vec<u8>,
}

impl ClientName {
    /// Pads or truncates `name` to exactly `len` bytes.
    pub fn padded(name: &[u8], len: usize) -> Self {
        let mut name = name[..name.len().min(len)].to_vec();
        name.resize(len, 0);
        ClientName { name }
    }
}

impl ToBytes for ClientName {
    const OPCODE: u8 = Codes::ClientName as _;

    fn write_payload(&self, bytes: &mut Vec<u8>) {
        bytes.push(self.name.len() as u8);
        bytes.extend_from_slice(&self.name);
    }
}
