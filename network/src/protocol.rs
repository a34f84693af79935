pub const FRAME_DELIM: u8 = 0xc0;
pub const ESCAPE: u8 = 0xdb;
pub const ESCAPED_DELIM: u8 = 0xdc;
pub const ESCAPED_ESCAPE: u8 = 0xdd;

/// Status and address bytes ahead of the opcode stream.
pub const HEADER_SIZE: usize = 2;
pub const CHECKSUM_SIZE: usize = 2;

/// Largest frame, delimiters included, the session unit puts on the wire.
pub const WIRE_BUDGET: usize = 0x40;

/// Escaped interiors longer than this are discarded while reassembling.
pub const MAX_FRAME_LEN: usize = 1024;

pub const STATUS_OK: u8 = 0x00;

pub const SESSION_UNIT_ID: u8 = 0;
pub const MAX_CLIENT_ID: u8 = 3;

pub fn peer_bit(id: u8) -> u8 {
    1 << id
}

/// The routing byte: destination bit flags in the low nibble, source in the high nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address(pub u8);

impl Address {
    pub fn new(source: u8, destination: u8) -> Self {
        Address((peer_bit(source) << 4) | peer_bit(destination))
    }

    /// Frames from the session unit leave the source nibble empty.
    pub fn from_session_unit(destination: u8) -> Self {
        Address(peer_bit(destination))
    }

    pub fn destination(self) -> Option<u8> {
        lowest_bit(self.0 & 0x0f)
    }

    pub fn source(self) -> Option<u8> {
        lowest_bit(self.0 >> 4)
    }
}

fn lowest_bit(nibble: u8) -> Option<u8> {
    (nibble != 0).then(|| nibble.trailing_zeros() as u8)
}
