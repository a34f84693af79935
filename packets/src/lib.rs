pub mod request;
pub mod response;

pub trait TryFromBytes {
    fn try_from_bytes(bytes: &[u8]) -> anyhow::Result<Self>
    where
        Self: Sized;
}

pub trait ToBytes {
    const OPCODE: u8;

    fn write_payload(&self, bytes: &mut Vec<u8>);

    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.push(Self::OPCODE);
        self.write_payload(buf);
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![];
        self.write_to(&mut buf);
        buf
    }
}

/// A request operand block that knows how many bytes it occupied after its opcode.
pub trait Request: TryFromBytes {
    const OPCODE: u8;

    fn consumed(&self) -> usize;
}

/// One reply opcode and its payload, as concatenated into response frames and chain buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub opcode: u8,
    pub payload: Vec<u8>,
}

impl Reply {
    pub fn new(opcode: u8, payload: Vec<u8>) -> Self {
        Self { opcode, payload }
    }

    pub fn from_packet<T: ToBytes>(packet: &T) -> Self {
        let mut payload = vec![];
        packet.write_payload(&mut payload);
        Self {
            opcode: T::OPCODE,
            payload,
        }
    }

    /// Size of the reply once written: opcode plus payload.
    pub fn wire_len(&self) -> usize {
        1 + self.payload.len()
    }

    pub fn write_to(&self, buf: &mut Vec<u8>) {
        buf.push(self.opcode);
        buf.extend_from_slice(&self.payload);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.wire_len());
        self.write_to(&mut buf);
        buf
    }
}

/// Reads a one-byte length prefix followed by that many bytes.
pub(crate) fn read_prefixed(cursor: &mut std::io::Cursor<&[u8]>) -> anyhow::Result<Vec<u8>> {
    use byteorder::ReadBytesExt;
    use std::io::Read;

    let mut buf = vec![0; cursor.read_u8()? as usize];
    cursor.read_exact(&mut buf)?;
    Ok(buf)
}
