use crate::ToBytes;

use super::Codes;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KeepAliveAck;

impl ToBytes for KeepAliveAck {
    const OPCODE: u8 = Codes::KeepAlive as _;

    fn write_payload(&self, _bytes: &mut Vec<u8>) {}
}
