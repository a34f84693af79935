use super::protocol::{
    Address, CHECKSUM_SIZE, ESCAPE, ESCAPED_DELIM, ESCAPED_ESCAPE, FRAME_DELIM, HEADER_SIZE,
    MAX_FRAME_LEN, WIRE_BUDGET,
};
use async_std::io::{ReadExt, WriteExt};
use async_std::net::TcpStream;
use async_std::sync::Arc;
use std::collections::VecDeque;
use std::io;

pub type ChecksumFn = fn(&[u8]) -> u16;

pub fn escape(data: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(data.len() + 4);
    for &b in data {
        match b {
            FRAME_DELIM => output.extend_from_slice(&[ESCAPE, ESCAPED_DELIM]),
            ESCAPE => output.extend_from_slice(&[ESCAPE, ESCAPED_ESCAPE]),
            _ => output.push(b),
        }
    }
    output
}

/// Reverses [`escape`]. A marker followed by an unknown substitute, or left dangling at the end,
/// is dropped and the next byte is taken as-is.
pub fn unescape(data: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        if data[i] == ESCAPE {
            match data.get(i + 1) {
                Some(&ESCAPED_DELIM) => {
                    output.push(FRAME_DELIM);
                    i += 2;
                }
                Some(&ESCAPED_ESCAPE) => {
                    output.push(ESCAPE);
                    i += 2;
                }
                _ => i += 1,
            }
        } else {
            output.push(data[i]);
            i += 1;
        }
    }
    output
}

pub fn escaped_len(data: &[u8]) -> usize {
    data.len()
        + data
            .iter()
            .filter(|&&b| b == FRAME_DELIM || b == ESCAPE)
            .count()
}

/// Wraps an already checksummed payload for the wire.
pub fn delimit(payload: &[u8]) -> Vec<u8> {
    let mut packet = Vec::with_capacity(payload.len() + 8);
    packet.push(FRAME_DELIM);
    packet.extend(escape(payload));
    packet.push(FRAME_DELIM);
    packet
}

/// Splits a raw byte stream into escaped frame interiors.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    buf: Vec<u8>,
    open: bool,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, byte: u8) -> Option<Vec<u8>> {
        if !self.open {
            if byte == FRAME_DELIM {
                self.open = true;
                self.buf.clear();
            }
            return None;
        }

        if byte == FRAME_DELIM {
            // An empty interior means the closing delimiter is really the next opening one.
            if self.buf.is_empty() {
                return None;
            }
            self.open = false;
            return Some(std::mem::take(&mut self.buf));
        }

        if self.buf.len() >= MAX_FRAME_LEN {
            tracing::warn!("discarding oversized frame ({} bytes)", self.buf.len());
            self.buf.clear();
            self.open = false;
            return None;
        }

        self.buf.push(byte);
        None
    }

    pub fn extend(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        bytes.iter().filter_map(|&b| self.push(b)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub status: u8,
    pub address: Address,
    pub body: Vec<u8>,
}

/// Checksums, escapes and delimits frames.
#[derive(Clone, Copy)]
pub struct FrameCodec {
    checksum: ChecksumFn,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(crc::crc16)
    }
}

impl FrameCodec {
    pub fn new(checksum: ChecksumFn) -> Self {
        Self { checksum }
    }

    pub fn checksum(&self, data: &[u8]) -> u16 {
        (self.checksum)(data)
    }

    /// Validates an unescaped payload and splits it into header and body.
    pub fn decode(&self, payload: &[u8]) -> io::Result<Frame> {
        if payload.len() < HEADER_SIZE + CHECKSUM_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("frame too short: {} bytes", payload.len()),
            ));
        }

        let (data, trailer) = payload.split_at(payload.len() - CHECKSUM_SIZE);
        let expected = u16::from_le_bytes([trailer[0], trailer[1]]);
        let actual = self.checksum(data);
        if expected != actual {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid checksum: {:04x} vs {:04x}", actual, expected),
            ));
        }

        Ok(Frame {
            status: data[0],
            address: Address(data[1]),
            body: data[HEADER_SIZE..].to_vec(),
        })
    }

    /// Appends the checksum and returns the frame as it goes on the wire.
    pub fn encode(&self, frame: &Frame) -> Vec<u8> {
        let mut payload = Vec::with_capacity(HEADER_SIZE + frame.body.len() + CHECKSUM_SIZE);
        payload.push(frame.status);
        payload.push(frame.address.0);
        payload.extend_from_slice(&frame.body);
        let checksum = self.checksum(&payload);
        payload.extend_from_slice(&checksum.to_le_bytes());
        delimit(&payload)
    }

    /// Upper bound on the wire size of a frame carrying `body`, assuming a fully escaped checksum.
    pub fn wire_len_bound(address: Address, body: &[u8]) -> usize {
        let header = [0, address.0];
        2 + escaped_len(&header) + escaped_len(body) + 2 * CHECKSUM_SIZE
    }

    pub fn fits_budget(address: Address, body: &[u8]) -> bool {
        Self::wire_len_bound(address, body) <= WIRE_BUDGET
    }
}

pub struct PacketDecoder {
    stream: Arc<TcpStream>,
    assembler: FrameAssembler,
    pending: VecDeque<Vec<u8>>,
}

impl PacketDecoder {
    pub fn new(stream: Arc<TcpStream>) -> Self {
        Self {
            stream,
            assembler: FrameAssembler::new(),
            pending: VecDeque::new(),
        }
    }

    /// Returns the next unescaped frame payload, checksum still attached.
    pub async fn read(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = [0; 512];
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(unescape(&frame));
            }

            let n = (&*self.stream).read(&mut buf).await?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed",
                ));
            }

            self.pending.extend(self.assembler.extend(&buf[..n]));
        }
    }
}

pub struct PacketEncoder {
    stream: Arc<TcpStream>,
}

impl PacketEncoder {
    pub fn new(stream: Arc<TcpStream>) -> Self {
        Self { stream }
    }

    pub async fn write_raw(&mut self, data: &[u8]) -> io::Result<()> {
        (&*self.stream).write_all(data).await
    }

    pub async fn flush(&mut self) -> io::Result<()> {
        (&*self.stream).flush().await
    }
}
