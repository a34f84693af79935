use num_enum::TryFromPrimitive;

mod bare;
pub use bare::{Bare, KeepAlive, QueryStatus, StartStream, Query68};

mod chain_packet;
pub use chain_packet::ChainPacket;

mod control;
pub use control::{Control, Control48, Control4A, OutputBit58, OutputBit60, OutputBit62, SetLevel};

mod echo;
pub use echo::{Echo, MAX_ECHO_LEN};

mod get_name;
pub use get_name::{GetName, MAX_NAME_LEN};

mod load_file;
pub use load_file::LoadFile;

mod mixer;
pub use mixer::Mixer;

mod playback;
pub use playback::{Playback, PlaybackMode};

mod register;
pub use register::Register;

/// Opcodes a game client may send to the session unit.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, TryFromPrimitive)]
pub enum Codes {
    /// Stores the client's display name and assigns it a buffer ID
    Register = 0x02,

    /// Reads back a registered client's name, zero padded to the requested length
    GetName = 0x04,

    /// Replies with the bytes it was given
    Echo = 0x06,

    KeepAlive = 0x1e,

    /// Reports a fixed status word
    QueryStatus = 0x20,

    /// Decrypts and opens a stored audio file
    LoadFile = 0x40,

    /// Starts the unit's streaming task
    StartStream = 0x42,

    /// Sets a level, capped at 0x7f
    SetLevel = 0x44,

    Control48 = 0x48,

    Control4A = 0x4a,

    /// Starts or stops the current audio
    Playback = 0x4c,

    /// Three byte mixer configuration
    Mixer = 0x50,

    OutputBit58 = 0x58,

    OutputBit60 = 0x60,

    OutputBit62 = 0x62,

    Query68 = 0x68,

    /// Carries a chunk of the client's sub-command stream with its buffer cursors
    ChainPacket = 0xff,
}
