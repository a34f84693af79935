use async_std::net::TcpStream;
use network::packet::delimit;
use network::protocol::{Address, MAX_CLIENT_ID, SESSION_UNIT_ID};
use std::net::Shutdown;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::session::chain::ChainBuffer;

pub const SESSION_UNIT_NAME: &[u8] = b"SESSION";

const SLOT_COUNT: usize = MAX_CLIENT_ID as usize + 1;
const BUFFER_ID_CYCLE: u8 = 16;

/// Encoded frames waiting for a client's writer task.
pub type Outbox = async_channel::Receiver<Vec<u8>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("client slot {0} is already taken")]
    SlotOccupied(u8),
    #[error("no client slot {0}")]
    InvalidSlot(u8),
}

/// A connected game client as seen by the session unit.
pub struct GameClient {
    id: u8,
    name: Mutex<Vec<u8>>,
    buffer_id: AtomicU8,
    outbox: async_channel::Sender<Vec<u8>>,
    stream: Option<Arc<TcpStream>>,
    chain: Mutex<ChainBuffer>,
}

impl GameClient {
    /// A client whose frames are collected from the returned receiver instead of a socket.
    pub fn detached(id: u8) -> (Arc<Self>, Outbox) {
        Self::build(id, None)
    }

    pub fn connected(
        id: u8,
        stream: Arc<TcpStream>,
    ) -> (Arc<Self>, Outbox) {
        Self::build(id, Some(stream))
    }

    fn build(
        id: u8,
        stream: Option<Arc<TcpStream>>,
    ) -> (Arc<Self>, Outbox) {
        let (outbox, inbox) = async_channel::unbounded();
        let client = Arc::new(Self {
            id,
            name: Mutex::new(vec![]),
            buffer_id: AtomicU8::new(0),
            outbox,
            stream,
            chain: Mutex::new(ChainBuffer::new(Address::from_session_unit(id))),
        });
        (client, inbox)
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn name(&self) -> Vec<u8> {
        self.name.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set_name(&self, name: &[u8]) {
        *self.name.lock().unwrap_or_else(|e| e.into_inner()) = name.to_vec();
    }

    pub fn buffer_id(&self) -> u8 {
        self.buffer_id.load(Ordering::Relaxed)
    }

    pub fn set_buffer_id(&self, buffer_id: u8) {
        self.buffer_id.store(buffer_id, Ordering::Relaxed);
    }

    pub fn chain(&self) -> MutexGuard<'_, ChainBuffer> {
        self.chain.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queues an encoded frame for the writer task. Frames for a closed client are dropped.
    pub fn send(&self, frame: Vec<u8>) {
        debug!("[client {}] send {:02x?}", self.id, frame);
        if self.outbox.try_send(frame).is_err() {
            warn!("[client {}] connection closed, dropping frame", self.id);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.outbox.is_closed()
    }

    pub fn close(&self) {
        if !self.outbox.close() {
            return;
        }

        info!("Closing game client {}", self.id);
        if let Some(stream) = &self.stream {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

/// Slot table of connected game clients. Slot 0 belongs to the session unit and is never filled.
pub struct ClientRegistry {
    slots: Mutex<[Option<Arc<GameClient>>; SLOT_COUNT]>,
    next_buffer_id: AtomicU8,
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Default::default()),
            next_buffer_id: AtomicU8::new(0),
        }
    }

    fn slots(&self) -> MutexGuard<'_, [Option<Arc<GameClient>>; SLOT_COUNT]> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_slot(id: u8) -> Result<usize, RegistryError> {
        if id == SESSION_UNIT_ID || id > MAX_CLIENT_ID {
            return Err(RegistryError::InvalidSlot(id));
        }
        Ok(id as usize)
    }

    /// Seats a new connection built by `connect`: in the pinned slot, after evicting its
    /// occupant, or else in the lowest free one. `None` when no slot can take it.
    pub fn admit<F>(&self, pinned: Option<u8>, connect: F) -> Option<(Arc<GameClient>, Outbox)>
    where
        F: FnOnce(u8) -> (Arc<GameClient>, Outbox),
    {
        let mut slots = self.slots();
        let id = match pinned {
            Some(id) => {
                let index = Self::check_slot(id).ok()?;
                if let Some(previous) = slots[index].take() {
                    info!("Evicting game client {} for a new connection", id);
                    previous.close();
                }
                id
            }
            None => (1..=MAX_CLIENT_ID)
                .find(|&id| slots[id as usize].as_ref().is_none_or(|c| c.is_closed()))?,
        };

        let (client, outbox) = connect(id);
        slots[id as usize] = Some(client.clone());
        Some((client, outbox))
    }

    pub fn register(&self, client: Arc<GameClient>) -> Result<(), RegistryError> {
        let index = Self::check_slot(client.id())?;
        let mut slots = self.slots();
        if slots[index].as_ref().is_some_and(|c| !c.is_closed()) {
            return Err(RegistryError::SlotOccupied(client.id()));
        }
        slots[index] = Some(client);
        Ok(())
    }

    pub fn unregister(&self, id: u8) {
        let Ok(index) = Self::check_slot(id) else {
            return;
        };
        let client = self.slots()[index].take();
        if let Some(client) = client {
            client.close();
        }
    }

    /// Closes `client` and frees its slot, unless another connection has taken the slot since.
    pub fn release(&self, client: &Arc<GameClient>) {
        if let Ok(index) = Self::check_slot(client.id()) {
            let mut slots = self.slots();
            if slots[index]
                .as_ref()
                .is_some_and(|c| Arc::ptr_eq(c, client))
            {
                slots[index] = None;
            }
        }
        client.close();
    }

    pub fn lookup(&self, id: u8) -> Option<Arc<GameClient>> {
        let index = Self::check_slot(id).ok()?;
        self.slots()[index].clone()
    }

    pub fn name_of(&self, id: u8) -> Vec<u8> {
        if id == SESSION_UNIT_ID {
            return SESSION_UNIT_NAME.to_vec();
        }
        self.lookup(id).map(|c| c.name()).unwrap_or_default()
    }

    pub fn next_buffer_id(&self) -> u8 {
        let previous = self
            .next_buffer_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| {
                Some((id + 1) % BUFFER_ID_CYCLE)
            });
        previous.unwrap_or_else(|id| id)
    }

    /// Snapshot of every registered client, in slot order.
    pub fn clients(&self) -> Vec<Arc<GameClient>> {
        self.slots().iter().flatten().cloned().collect()
    }

    /// Forwards a frame between game clients without interpreting it.
    pub fn forward(&self, destination: u8, raw: &[u8]) {
        match self.lookup(destination) {
            Some(client) => client.send(delimit(raw)),
            None => warn!("No game client {} to forward to, dropping frame", destination),
        }
    }
}
