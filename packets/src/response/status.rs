use crate::ToBytes;

use super::Codes;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub value: u32,
}

impl ToBytes for Status {
    const OPCODE: u8 = Codes::Status as _;

    fn write_payload(&self, bytes: &mut Vec<u8>) {
        bytes.push(4);
        bytes.extend_from_slice(&self.value.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_bytes() {
        assert_eq!(
            Status::default().to_bytes(),
            vec![0x21, 0x04, 0x00, 0x00, 0x00, 0x00]
        );
    }
}
