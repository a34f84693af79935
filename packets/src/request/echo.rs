use byteorder::ReadBytesExt;
use std::io::{Cursor, Read};

use crate::{Request, TryFromBytes};

use super::Codes;

pub const MAX_ECHO_LEN: usize = 0x3e;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Echo {
    /// The length byte as sent, which may exceed the number of bytes actually echoed.
    pub declared_len: u8,
    pub data: Vec<u8>,
}

impl TryFromBytes for Echo {
    fn try_from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let declared_len = cursor.read_u8()?;
        let mut data = vec![0; (declared_len as usize).min(MAX_ECHO_LEN)];
        cursor.read_exact(&mut data)?;
        Ok(Echo { declared_len, data })
    }
}

impl Request for Echo {
    const OPCODE: u8 = Codes::Echo as _;

    fn consumed(&self) -> usize {
        1 + self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo() {
        let echo = Echo::try_from_bytes(&[0x03, 0xaa, 0xbb, 0xcc, 0x1e]).unwrap();
        assert_eq!(echo.declared_len, 3);
        assert_eq!(echo.data, vec![0xaa, 0xbb, 0xcc]);
        assert_eq!(echo.consumed(), 4);
    }

    #[test]
    fn test_echo_caps_length() {
        let mut bytes = vec![0x50];
        bytes.extend(std::iter::repeat_n(0x11, 0x50));
        let echo = Echo::try_from_bytes(&bytes).unwrap();
        assert_eq!(echo.declared_len, 0x50);
        assert_eq!(echo.data.len(), MAX_ECHO_LEN);
        assert_eq!(echo.consumed(), 1 + MAX_ECHO_LEN);
    }

    #[test]
    fn test_echo_truncated() {
        let err = Echo::try_from_bytes(&[0x04, 0xaa]).unwrap_err();
        let io = err.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::UnexpectedEof);
    }
}
