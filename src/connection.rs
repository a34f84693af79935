use async_std::net::TcpStream;
use async_std::sync::Arc;
use async_std::task;
use futures_lite::future;
use network::packet::{PacketDecoder, PacketEncoder};
use network::{FramedReceiver, FramedSender};
use std::io;
use tracing::{debug, info, trace, warn};

use crate::registry::GameClient;
use crate::session::SessionUnit;
use crate::settings::TimingSettings;

/// One accepted game client: a frame reader, a writer draining the client's outbox,
/// and the chain retry pump.
pub struct PeerConnection {
    session: Arc<SessionUnit>,
    client: Arc<GameClient>,
    stream: Arc<TcpStream>,
    timing: TimingSettings,
}

impl PeerConnection {
    pub fn new(
        session: Arc<SessionUnit>,
        client: Arc<GameClient>,
        stream: Arc<TcpStream>,
        timing: TimingSettings,
    ) -> Self {
        Self {
            session,
            client,
            stream,
            timing,
        }
    }

    /// Runs until the peer disconnects or is evicted, then frees its slot.
    pub async fn run(self, outbox: async_channel::Receiver<Vec<u8>>) {
        let writer = task::spawn(write_loop(
            FramedSender::new(PacketEncoder::new(self.stream.clone()), self.session.codec()),
            outbox,
            self.client.id(),
        ));

        future::or(self.read_loop(), self.retry_pump()).await;

        self.session.registry().release(&self.client);
        writer.await;
        info!("Game client {} disconnected", self.client.id());
    }

    async fn read_loop(&self) {
        let mut receiver = FramedReceiver::new(
            PacketDecoder::new(self.stream.clone()),
            self.session.codec(),
        );

        loop {
            match receiver.recv().await {
                Ok(received) => {
                    trace!(
                        "[client {}] recv {:02x?}",
                        self.client.id(),
                        received.raw
                    );
                    // Load-file reads and decodes audio synchronously.
                    let session = self.session.clone();
                    let client = self.client.clone();
                    task::spawn_blocking(move || session.process_frame(&client, &received))
                        .await;
                }
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    debug!("[client {}] connection closed", self.client.id());
                    break;
                }
                Err(e) => {
                    warn!("[client {}] read failed: {}", self.client.id(), e);
                    break;
                }
            }
        }
    }

    async fn retry_pump(&self) {
        loop {
            task::sleep(self.timing.retry_interval()).await;
            if self.client.is_closed() {
                break;
            }
            self.session.pump(&self.client, self.timing.max_retries);
        }
    }
}

async fn write_loop(
    mut sender: FramedSender,
    outbox: async_channel::Receiver<Vec<u8>>,
    client_id: u8,
) {
    while let Ok(frame) = outbox.recv().await {
        if let Err(e) = sender.send_raw(&frame).await {
            warn!("[client {}] write failed: {}", client_id, e);
            outbox.close();
            break;
        }
    }
    let _ = sender.flush().await;
}
