use byteorder::ReadBytesExt;
use std::io::{Cursor, Read};

use crate::{ToBytes, TryFromBytes};

use super::Codes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainResponse {
    /// Where `data` starts in the client's output buffer.
    pub output_offset: u8,
    /// The unit's view of the client's input cursor.
    pub input_index: u8,
    pub data: Vec<u8>,
}

impl ToBytes for ChainResponse {
    const OPCODE: u8 = Codes::ChainResponse as _;

    fn write_payload(&self, bytes: &mut Vec<u8>) {
        bytes.push(self.output_offset);
        bytes.push(self.input_index);
        bytes.push(self.data.len() as u8);
        bytes.extend_from_slice(&self.data);
    }
}

impl TryFromBytes for ChainResponse {
    fn try_from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let output_offset = cursor.read_u8()?;
        let input_index = cursor.read_u8()?;
        let mut data = vec![0; cursor.read_u8()? as usize];
        cursor.read_exact(&mut data)?;
        Ok(ChainResponse {
            output_offset,
            input_index,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_response_bytes() {
        let response = ChainResponse {
            output_offset: 0x10,
            input_index: 0x14,
            data: vec![0x59, 0x01, 0x61, 0x01],
        };
        assert_eq!(
            response.to_bytes(),
            vec![0xff, 0x10, 0x14, 0x04, 0x59, 0x01, 0x61, 0x01]
        );
    }
}
