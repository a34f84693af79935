#![allow(dead_code)]

use msuserver::audio::{AudioSubsystem, Playable};
use msuserver::data_files::FileStore;
use msuserver::registry::{ClientRegistry, GameClient};
use msuserver::session::SessionUnit;
use network::packet::{Frame, FrameAssembler, FrameCodec, unescape};
use network::protocol::Address;
use network::ReceivedFrame;
use packets::TryFromBytes;
use packets::response::ChainResponse;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Shared view of everything the fake audio backend was asked to do.
#[derive(Default)]
pub struct AudioState {
    pub playing: AtomicBool,
    pub position: AtomicU32,
    pub opened: Mutex<Vec<Vec<u8>>>,
}

struct FakeAudio {
    state: Arc<AudioState>,
}

struct FakeTrack {
    state: Arc<AudioState>,
}

impl AudioSubsystem for FakeAudio {
    fn decode_and_open(&mut self, data: Vec<u8>) -> anyhow::Result<Box<dyn Playable>> {
        self.state.opened.lock().unwrap().push(data);
        Ok(Box::new(FakeTrack {
            state: self.state.clone(),
        }))
    }
}

impl Playable for FakeTrack {
    fn start(&mut self) -> anyhow::Result<()> {
        self.state.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.state.playing.store(false, Ordering::SeqCst);
    }

    fn is_playing(&self) -> bool {
        self.state.playing.load(Ordering::SeqCst)
    }

    fn sample_position(&self) -> u32 {
        self.state.position.load(Ordering::SeqCst)
    }
}

struct MemoryFiles(HashMap<Vec<u8>, Vec<u8>>);

impl FileStore for MemoryFiles {
    fn read_file(&self, name: &[u8]) -> Option<Vec<u8>> {
        self.0.get(name).cloned()
    }
}

/// A session unit wired to in-memory clients.
pub struct TestSession {
    pub session: Arc<SessionUnit>,
    pub audio: Arc<AudioState>,
    codec: FrameCodec,
    clients: HashMap<u8, (Arc<GameClient>, async_channel::Receiver<Vec<u8>>)>,
}

impl TestSession {
    pub fn new() -> Self {
        Self::with_files(&[])
    }

    pub fn with_files(files: &[(&str, &[u8])]) -> Self {
        let audio = Arc::new(AudioState::default());
        let backend = Box::new(FakeAudio {
            state: audio.clone(),
        });
        Self::build(files, audio, backend)
    }

    /// A session decoding through `backend` instead of the recording fake.
    pub fn with_backend(files: &[(&str, &[u8])], backend: Box<dyn AudioSubsystem>) -> Self {
        Self::build(files, Arc::new(AudioState::default()), backend)
    }

    fn build(
        files: &[(&str, &[u8])],
        audio: Arc<AudioState>,
        backend: Box<dyn AudioSubsystem>,
    ) -> Self {
        let files = files
            .iter()
            .map(|(name, data)| (name.as_bytes().to_vec(), data.to_vec()))
            .collect();
        let session = SessionUnit::new(
            Arc::new(ClientRegistry::new()),
            backend,
            Box::new(MemoryFiles(files)),
        );

        Self {
            codec: session.codec(),
            session: Arc::new(session),
            audio,
            clients: HashMap::new(),
        }
    }

    pub fn connect(&mut self, id: u8) -> Arc<GameClient> {
        let (client, inbox) = GameClient::detached(id);
        self.session
            .registry()
            .register(client.clone())
            .expect("slot taken");
        self.clients.insert(id, (client.clone(), inbox));
        client
    }

    pub fn client(&self, id: u8) -> &Arc<GameClient> {
        &self.clients[&id].0
    }

    /// Sends `body` from client `id` to `address`, through the same encode and decode path
    /// a socket would take.
    pub fn send_to(&self, id: u8, address: Address, body: &[u8]) {
        let wire = self.codec.encode(&Frame {
            status: 0,
            address,
            body: body.to_vec(),
        });
        for interior in FrameAssembler::new().extend(&wire) {
            let raw = unescape(&interior);
            let frame = self.codec.decode(&raw).expect("valid frame");
            self.session
                .process_frame(self.client(id), &ReceivedFrame { frame, raw });
        }
    }

    pub fn send(&self, id: u8, body: &[u8]) {
        self.send_to(id, Address::new(id, 0), body);
    }

    /// Raw wire bytes queued for client `id`, one entry per frame.
    pub fn wire(&self, id: u8) -> Vec<Vec<u8>> {
        let inbox = &self.clients[&id].1;
        std::iter::from_fn(|| inbox.try_recv().ok()).collect()
    }

    /// Decodes one frame as it came off the wire.
    pub fn decode(&self, wire: &[u8]) -> Frame {
        let interiors = FrameAssembler::new().extend(wire);
        assert_eq!(interiors.len(), 1, "one frame per send: {:02x?}", wire);
        self.codec
            .decode(&unescape(&interiors[0]))
            .expect("session unit frames carry valid checksums")
    }

    pub fn frames(&self, id: u8) -> Vec<Frame> {
        self.wire(id).iter().map(|wire| self.decode(wire)).collect()
    }

    pub fn bodies(&self, id: u8) -> Vec<Vec<u8>> {
        self.frames(id).into_iter().map(|f| f.body).collect()
    }

    pub fn chain_responses(&self, id: u8) -> Vec<ChainResponse> {
        self.bodies(id)
            .iter()
            .map(|body| chain_response(body))
            .collect()
    }
}

pub fn chain_response(body: &[u8]) -> ChainResponse {
    assert_eq!(body.first(), Some(&0xff), "not a chain response: {:02x?}", body);
    ChainResponse::try_from_bytes(&body[1..]).expect("well-formed chain response")
}
