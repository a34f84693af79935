use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),

    #[error("truncated operands for opcode {0:#04x}")]
    Truncated(u8),

    #[error("chain packet nested inside a chain pass")]
    Nested,

    #[error("opcode {opcode:#04x} failed: {source}")]
    Handler {
        opcode: u8,
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    /// Sorts a request decoding failure into running out of bytes or anything else.
    pub fn from_decode(opcode: u8, error: anyhow::Error) -> Self {
        match error.downcast_ref::<std::io::Error>() {
            Some(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Self::Truncated(opcode),
            _ => Self::Handler {
                opcode,
                source: error,
            },
        }
    }
}
