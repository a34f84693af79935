use anyhow::Context;
use async_std::net::{TcpListener, TcpStream};
use async_std::sync::Arc;
use async_std::task;
use std::net::Shutdown;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::connection::PeerConnection;
use crate::registry::GameClient;
use crate::session::SessionUnit;
use crate::settings::{Settings, TimingSettings};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub struct Server {
    settings: Settings,
    session: Arc<SessionUnit>,
}

impl Server {
    pub fn new(settings: Settings, session: Arc<SessionUnit>) -> Self {
        Self { settings, session }
    }

    /// Binds every configured listener, then serves until all of them stop.
    pub async fn run(self) -> anyhow::Result<()> {
        let mut accept_tasks = vec![];
        for listener in &self.settings.server.listeners {
            let addr = format!("{}:{}", self.settings.server.bind, listener.port);
            let socket = TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to listen on {}", addr))?;
            match listener.client_id {
                Some(id) => info!("Listening on {} for client {}", addr, id),
                None => info!("Listening on {}", addr),
            }

            accept_tasks.push(task::spawn(accept_loop(
                socket,
                listener.client_id,
                self.session.clone(),
                self.settings.timing.clone(),
            )));
        }

        task::spawn(broadcast_timestamps(
            self.session.clone(),
            self.settings.timing.broadcast_interval(),
        ));

        for accept in accept_tasks {
            accept.await;
        }
        Ok(())
    }
}

pub async fn accept_loop(
    listener: TcpListener,
    pinned: Option<u8>,
    session: Arc<SessionUnit>,
    timing: TimingSettings,
) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Accept failed: {}", e);
                task::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY for {}: {}", peer, e);
        }

        let stream = Arc::new(stream);
        let admitted = session
            .registry()
            .admit(pinned, |id| GameClient::connected(id, stream.clone()));
        let Some((client, outbox)) = admitted else {
            warn!("Refusing {}: no free client slot", peer);
            refuse(&stream);
            continue;
        };

        info!("Game client {} connected from {}", client.id(), peer);
        let connection = PeerConnection::new(session.clone(), client, stream, timing.clone());
        task::spawn(connection.run(outbox));
    }
}

fn refuse(stream: &TcpStream) {
    let _ = stream.shutdown(Shutdown::Both);
}

/// Polls the playback position and sends it to every client while audio plays.
pub async fn broadcast_timestamps(session: Arc<SessionUnit>, interval: Duration) {
    loop {
        session.broadcast_timestamp();
        task::sleep(interval).await;
    }
}
