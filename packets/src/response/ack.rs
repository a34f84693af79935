use crate::ToBytes;

use super::Codes;

pub const SUCCESS: u8 = 0x01;

/// A one byte result for the unit's fire-and-forget control requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack<const OPCODE: u8> {
    pub result: u8,
}

pub type StartStreamAck = Ack<{ Codes::StartStream as u8 }>;
pub type SetLevelAck = Ack<{ Codes::SetLevel as u8 }>;
pub type ChainAck = Ack<{ Codes::ChainAck as u8 }>;
pub type Control48Ack = Ack<{ Codes::Control48 as u8 }>;
pub type Control4AAck = Ack<{ Codes::Control4A as u8 }>;
pub type PlaybackAck = Ack<{ Codes::Playback as u8 }>;
pub type MixerAck = Ack<{ Codes::Mixer as u8 }>;
pub type OutputBit58Ack = Ack<{ Codes::OutputBit58 as u8 }>;
pub type OutputBit60Ack = Ack<{ Codes::OutputBit60 as u8 }>;
pub type OutputBit62Ack = Ack<{ Codes::OutputBit62 as u8 }>;
pub type Query68Ack = Ack<{ Codes::Query68 as u8 }>;

impl<const OPCODE: u8> Ack<OPCODE> {
    pub fn success() -> Self {
        Ack { result: SUCCESS }
    }
}

impl<const OPCODE: u8> ToBytes for Ack<OPCODE> {
    const OPCODE: u8 = OPCODE;

    fn write_payload(&self, bytes: &mut Vec<u8>) {
        bytes.push(self.result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ack_bytes() {
        assert_eq!(PlaybackAck::success().to_bytes(), vec![0x4d, 0x01]);
        assert_eq!(ChainAck::success().to_bytes(), vec![0x47, 0x01]);
        assert_eq!(MixerAck { result: 0 }.to_bytes(), vec![0x51, 0x00]);
    }
}
