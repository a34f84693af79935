use crate::{Request, TryFromBytes};

use super::Codes;

/// A request with no operands.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Bare<const OPCODE: u8>;

pub type KeepAlive = Bare<{ Codes::KeepAlive as u8 }>;
pub type QueryStatus = Bare<{ Codes::QueryStatus as u8 }>;
pub type StartStream = Bare<{ Codes::StartStream as u8 }>;
pub type Query68 = Bare<{ Codes::Query68 as u8 }>;

impl<const OPCODE: u8> TryFromBytes for Bare<OPCODE> {
    fn try_from_bytes(_bytes: &[u8]) -> anyhow::Result<Self> {
        Ok(Bare)
    }
}

impl<const OPCODE: u8> Request for Bare<OPCODE> {
    const OPCODE: u8 = OPCODE;

    fn consumed(&self) -> usize {
        0
    }
}
