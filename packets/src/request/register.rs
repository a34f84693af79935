use std::io::Cursor;

use crate::{Request, TryFromBytes, read_prefixed};

use super::{Codes, MAX_NAME_LEN};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    pub name: Vec<u8>,
}

impl Register {
    /// The name as stored by the unit, which keeps at most 32 bytes.
    pub fn stored_name(&self) -> &[u8] {
        &self.name[..self.name.len().min(MAX_NAME_LEN)]
    }
}

impl TryFromBytes for Register {
    fn try_from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let name = read_prefixed(&mut Cursor::new(bytes))?;
        Ok(Register { name })
    }
}

impl Request for Register {
    const OPCODE: u8 = Codes::Register as _;

    fn consumed(&self) -> usize {
        1 + self.name.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register() {
        let bytes = [0x0a, 0x47, 0x43, 0x44, 0x34, 0x30, 0x4a, 0x41, 0x41, 0x11, 0x01];
        let request = Register::try_from_bytes(&bytes).unwrap();
        assert_eq!(request.name, b"GCD40JAA\x11\x01");
        assert_eq!(request.consumed(), 11);
    }

    #[test]
    fn test_register_long_name() {
        let mut bytes = vec![40];
        bytes.extend(std::iter::repeat_n(b'x', 40));
        let request = Register::try_from_bytes(&bytes).unwrap();
        assert_eq!(request.stored_name().len(), MAX_NAME_LEN);
        assert_eq!(request.consumed(), 41);
    }
}
