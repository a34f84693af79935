use num_enum::TryFromPrimitive;

mod ack;
pub use ack::{
    Ack, ChainAck, Control48Ack, Control4AAck, MixerAck, OutputBit58Ack, OutputBit60Ack,
    OutputBit62Ack, PlaybackAck, Query68Ack, SetLevelAck, StartStreamAck,
};

mod buffer_assigned;
pub use buffer_assigned::BufferAssigned;

mod chain_response;
pub use chain_response::ChainResponse;

mod client_name;
pub use client_name::ClientName;

mod echo_reply;
pub use echo_reply::EchoReply;

mod file_loaded;
pub use file_loaded::FileLoaded;

mod keep_alive_ack;
pub use keep_alive_ack::KeepAliveAck;

mod registered;
pub use registered::Registered;

mod status;
pub use status::Status;

mod timestamp;
pub use timestamp::Timestamp;

/// Opcodes the session unit sends back to game clients.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, TryFromPrimitive)]
pub enum Codes {
    /// Broadcast after a registration: `(buffer counter << 4) | client id`
    BufferAssigned = 0x01,

    /// The registering client's id
    Registered = 0x03,

    ClientName = 0x05,

    Echo = 0x07,

    KeepAlive = 0x1f,

    Status = 0x21,

    FileLoaded = 0x41,

    StartStream = 0x43,

    SetLevel = 0x45,

    /// 32-bit playback sample position, used once the position no longer fits in 24 bits
    LongTimestamp = 0x46,

    /// Sent when a chain packet arrives with an empty chunk
    ChainAck = 0x47,

    Control48 = 0x49,

    Control4A = 0x4b,

    Playback = 0x4d,

    /// 24-bit playback sample position
    Timestamp = 0x4e,

    Mixer = 0x51,

    OutputBit58 = 0x59,

    OutputBit60 = 0x61,

    OutputBit62 = 0x63,

    Query68 = 0x69,

    /// Newly produced chain buffer output
    ChainResponse = 0xff,
}
