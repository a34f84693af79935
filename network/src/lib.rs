pub mod cipher;
pub mod packet;
pub mod protocol;

use std::io;

use self::packet::{Frame, FrameCodec, PacketDecoder, PacketEncoder};

pub use self::cipher::{AudioDecrypter, decrypt_audio};
pub use self::protocol::Address;

pub struct FramedSender {
    encoder: PacketEncoder,
    codec: FrameCodec,
}

pub struct FramedReceiver {
    decoder: PacketDecoder,
    codec: FrameCodec,
}

impl FramedSender {
    pub fn new(encoder: PacketEncoder, codec: FrameCodec) -> Self {
        Self { encoder, codec }
    }

    pub async fn send(&mut self, frame: &Frame) -> io::Result<()> {
        let encoded = self.codec.encode(frame);
        self.send_raw(&encoded).await
    }

    pub async fn send_raw(&mut self, data: &[u8]) -> io::Result<()> {
        self.encoder.write_raw(data).await
    }

    pub async fn flush(&mut self) -> io::Result<()> {
        self.encoder.flush().await
    }
}

/// A frame that passed checksum validation, with its unescaped payload kept for forwarding.
#[derive(Debug, Clone)]
pub struct ReceivedFrame {
    pub frame: Frame,
    pub raw: Vec<u8>,
}

impl FramedReceiver {
    pub fn new(decoder: PacketDecoder, codec: FrameCodec) -> Self {
        Self { decoder, codec }
    }

    /// Waits for the next frame that survives checksum validation.
    /// Invalid frames are logged and skipped; only transport errors are returned.
    pub async fn recv(&mut self) -> io::Result<ReceivedFrame> {
        loop {
            let raw = self.decoder.read().await?;
            match self.codec.decode(&raw) {
                Ok(frame) => return Ok(ReceivedFrame { frame, raw }),
                Err(e) => tracing::debug!("dropping frame {:02x?}: {}", raw, e),
            }
        }
    }
}
