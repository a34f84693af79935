use crate::Reply;

use super::Codes;

/// Sample position of the current audio, broadcast while it plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub position: u32,
}

impl Timestamp {
    /// Positions that fit in 24 bits go out as three bytes, anything larger as four.
    pub fn to_reply(&self) -> Reply {
        let bytes = self.position.to_le_bytes();
        if self.position > 0x00ff_ffff {
            Reply::new(Codes::LongTimestamp as u8, bytes.to_vec())
        } else {
            Reply::new(Codes::Timestamp as u8, bytes[..3].to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_timestamp() {
        let reply = Timestamp { position: 0x123456 }.to_reply();
        assert_eq!(reply.to_bytes(), vec![0x4e, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn test_long_timestamp() {
        let reply = Timestamp {
            position: 0x0100_0000,
        }
        .to_reply();
        assert_eq!(reply.to_bytes(), vec![0x46, 0x00, 0x00, 0x00, 0x01]);
    }
}
