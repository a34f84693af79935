use byteorder::ReadBytesExt;
use std::io::{Cursor, Read};

use crate::{Request, TryFromBytes};

use super::Codes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainPacket {
    /// The client's write cursor into its own sub-command stream.
    pub input_index: u8,
    /// The client's read cursor into the unit's replies.
    pub output_index: u8,
    pub chunk: Vec<u8>,
}

impl TryFromBytes for ChainPacket {
    fn try_from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let input_index = cursor.read_u8()?;
        let output_index = cursor.read_u8()?;
        let mut chunk = vec![0; cursor.read_u8()? as usize];
        cursor.read_exact(&mut chunk)?;
        Ok(ChainPacket {
            input_index,
            output_index,
            chunk,
        })
    }
}

impl Request for ChainPacket {
    const OPCODE: u8 = Codes::ChainPacket as _;

    fn consumed(&self) -> usize {
        3 + self.chunk.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_packet() {
        let bytes = [0x0c, 0x30, 0x04, 0x58, 0x00, 0x60, 0x00, 0xaa];
        let packet = ChainPacket::try_from_bytes(&bytes).unwrap();
        assert_eq!(packet.input_index, 0x0c);
        assert_eq!(packet.output_index, 0x30);
        assert_eq!(packet.chunk, vec![0x58, 0x00, 0x60, 0x00]);
        assert_eq!(packet.consumed(), 7);
    }

    #[test]
    fn test_empty_chunk() {
        let packet = ChainPacket::try_from_bytes(&[0x01, 0x02, 0x00]).unwrap();
        assert!(packet.chunk.is_empty());
        assert_eq!(packet.consumed(), 3);
    }
}
