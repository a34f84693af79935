use network::packet::{escaped_len, Frame, FrameCodec};
use network::protocol::{Address, SESSION_UNIT_ID, STATUS_OK, WIRE_BUDGET};
use network::{decrypt_audio, ReceivedFrame};
use packets::request::{
    self, ChainPacket, Codes, Echo, GetName, LoadFile, Mixer, Playback, PlaybackMode, Register,
};
use packets::response::{
    self, BufferAssigned, ChainAck, ClientName, EchoReply, FileLoaded, KeepAliveAck, MixerAck,
    Registered, Status, Timestamp,
};
use packets::{Reply, Request, ToBytes};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::chain::Step;
use super::error::DispatchError;
use crate::audio::{AudioSubsystem, Playable};
use crate::data_files::FileStore;
use crate::registry::{ClientRegistry, GameClient};

/// The buffer assignment goes out this many times after each registration.
const BUFFER_BROADCAST_REPEATS: usize = 4;

const STATUS_WORD: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Direct,
    Chain,
}

struct Executed {
    /// Bytes used, opcode included.
    consumed: usize,
    replies: Vec<Reply>,
    /// The client re-registered and its chain buffers must start over.
    reset: bool,
}

/// The session unit: peer 0, which answers the opcodes game clients address to it.
pub struct SessionUnit {
    registry: Arc<ClientRegistry>,
    audio: Mutex<Box<dyn AudioSubsystem>>,
    /// The loaded track. Only held briefly, decoding happens outside it.
    track: Mutex<Option<Box<dyn Playable>>>,
    files: Box<dyn FileStore>,
    codec: FrameCodec,
}

fn reply<T: ToBytes>(packet: T) -> Vec<Reply> {
    vec![Reply::from_packet(&packet)]
}

fn run<T, F>(operands: &[u8], handler: F) -> Result<Executed, DispatchError>
where
    T: Request,
    F: FnOnce(&T) -> Vec<Reply>,
{
    let request =
        T::try_from_bytes(operands).map_err(|e| DispatchError::from_decode(T::OPCODE, e))?;
    Ok(Executed {
        consumed: 1 + request.consumed(),
        replies: handler(&request),
        reset: false,
    })
}

impl SessionUnit {
    pub fn new(
        registry: Arc<ClientRegistry>,
        audio: Box<dyn AudioSubsystem>,
        files: Box<dyn FileStore>,
    ) -> Self {
        Self {
            registry,
            audio: Mutex::new(audio),
            track: Mutex::new(None),
            files,
            codec: FrameCodec::default(),
        }
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    pub fn codec(&self) -> FrameCodec {
        self.codec
    }

    fn track(&self) -> MutexGuard<'_, Option<Box<dyn Playable>>> {
        self.track.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Encodes `body` as a frame from the session unit to `client`.
    pub fn prepare_response(&self, client: &GameClient, body: &[u8]) -> Vec<u8> {
        self.codec.encode(&Frame {
            status: STATUS_OK,
            address: Address::from_session_unit(client.id()),
            body: body.to_vec(),
        })
    }

    fn send_reply(&self, client: &GameClient, reply: &Reply) {
        client.send(self.prepare_response(client, &reply.to_bytes()));
    }

    pub fn broadcast(&self, reply: &Reply) {
        let body = reply.to_bytes();
        for client in self.registry.clients() {
            client.send(self.prepare_response(&client, &body));
        }
    }

    /// Routes a validated frame: to the session unit's dispatcher or on to another game client.
    pub fn process_frame(&self, source: &GameClient, received: &ReceivedFrame) {
        match received.frame.address.destination() {
            Some(SESSION_UNIT_ID) => self.process_packet(source, &received.frame.body),
            Some(destination) => {
                debug!(
                    "[client {}] forwarding frame to client {}",
                    source.id(),
                    destination
                );
                self.registry.forward(destination, &received.raw);
            }
            None => warn!(
                "[client {}] frame without destination ({:#04x}), dropping",
                source.id(),
                received.frame.address.0
            ),
        }
    }

    /// Runs every opcode in a frame body and sends the replies, split to fit the wire budget.
    pub fn process_packet(&self, client: &GameClient, body: &[u8]) {
        debug!("[session] client {} packet {:02x?}", client.id(), body);

        let mut pending = vec![];
        let mut rest = body;
        while !rest.is_empty() {
            if rest[0] == Codes::ChainPacket as u8 {
                self.flush(client, &mut pending);
            }

            match self.execute(client, rest, Pass::Direct) {
                Ok(executed) => {
                    if executed.reset {
                        client.chain().reset();
                    }
                    for reply in &executed.replies {
                        self.accumulate(client, &mut pending, reply);
                    }
                    rest = &rest[executed.consumed.min(rest.len())..];
                }
                Err(e) => {
                    warn!("[session] client {}: {}, skipping rest of packet", client.id(), e);
                    break;
                }
            }
        }

        self.flush(client, &mut pending);
    }

    fn accumulate(&self, client: &GameClient, pending: &mut Vec<u8>, reply: &Reply) {
        let bytes = reply.to_bytes();
        let address = Address::from_session_unit(client.id());
        if !pending.is_empty()
            && FrameCodec::wire_len_bound(address, pending) + escaped_len(&bytes) > WIRE_BUDGET
        {
            self.flush(client, pending);
        }
        pending.extend_from_slice(&bytes);
    }

    fn flush(&self, client: &GameClient, pending: &mut Vec<u8>) {
        if !pending.is_empty() {
            client.send(self.prepare_response(client, pending));
            pending.clear();
        }
    }

    fn execute(
        &self,
        client: &GameClient,
        input: &[u8],
        pass: Pass,
    ) -> Result<Executed, DispatchError> {
        let opcode = input[0];
        let operands = &input[1..];
        let code = Codes::try_from(opcode).map_err(|_| DispatchError::UnknownOpcode(opcode))?;

        match code {
            Codes::Register => {
                let mut executed = run(operands, |r: &Register| self.register(client, r))?;
                executed.reset = true;
                Ok(executed)
            }
            Codes::GetName => run(operands, |r: &GetName| {
                let name = self.registry.name_of(r.client_id);
                reply(ClientName::padded(&name, r.requested_len()))
            }),
            Codes::Echo => run(operands, |r: &Echo| {
                reply(EchoReply {
                    declared_len: r.declared_len,
                    data: r.data.clone(),
                })
            }),
            Codes::KeepAlive => run(operands, |_: &request::KeepAlive| reply(KeepAliveAck)),
            Codes::QueryStatus => run(operands, |_: &request::QueryStatus| {
                reply(Status { value: STATUS_WORD })
            }),
            Codes::LoadFile => run(operands, |r: &LoadFile| self.load_file(r)),
            Codes::StartStream => run(operands, |_: &request::StartStream| {
                reply(response::StartStreamAck::success())
            }),
            Codes::SetLevel => run(operands, |r: &request::SetLevel| {
                debug!("[session] client {} level {}", client.id(), r.level());
                reply(response::SetLevelAck::success())
            }),
            Codes::Control48 => run(operands, |_: &request::Control48| {
                reply(response::Control48Ack::success())
            }),
            Codes::Control4A => run(operands, |_: &request::Control4A| {
                reply(response::Control4AAck::success())
            }),
            Codes::Playback => run(operands, |r: &Playback| self.playback(r)),
            Codes::Mixer => run(operands, |r: &Mixer| {
                reply(MixerAck {
                    result: if r.rejected() { 0 } else { 1 },
                })
            }),
            Codes::OutputBit58 => run(operands, |_: &request::OutputBit58| {
                reply(response::OutputBit58Ack::success())
            }),
            Codes::OutputBit60 => run(operands, |_: &request::OutputBit60| {
                reply(response::OutputBit60Ack::success())
            }),
            Codes::OutputBit62 => run(operands, |_: &request::OutputBit62| {
                reply(response::OutputBit62Ack::success())
            }),
            Codes::Query68 => run(operands, |_: &request::Query68| {
                reply(response::Query68Ack::success())
            }),
            Codes::ChainPacket => match pass {
                Pass::Chain => Err(DispatchError::Nested),
                Pass::Direct => run(operands, |r: &ChainPacket| {
                    self.chain_packet(client, r);
                    vec![]
                }),
            },
        }
    }

    fn register(&self, client: &GameClient, request: &Register) -> Vec<Reply> {
        client.set_name(request.stored_name());

        let buffer_id = (self.registry.next_buffer_id() << 4) | client.id();
        client.set_buffer_id(buffer_id);
        info!(
            "Registered client {} as {:?} with buffer {:#04x}",
            client.id(),
            String::from_utf8_lossy(request.stored_name()),
            buffer_id
        );

        let assigned = Reply::from_packet(&BufferAssigned { buffer_id });
        for _ in 0..BUFFER_BROADCAST_REPEATS {
            self.broadcast(&assigned);
        }

        vec![
            Reply::from_packet(&Registered {
                client_id: client.id(),
            }),
            assigned,
        ]
    }

    fn load_file(&self, request: &LoadFile) -> Vec<Reply> {
        let filename = request.display_name();
        info!("Load file {:?}", filename);

        let previous = self.track().take();
        if let Some(mut track) = previous {
            track.stop();
        }

        let ok = match self.open_track(&request.filename) {
            Ok(track) => {
                let replaced = self.track().replace(track);
                if let Some(mut replaced) = replaced {
                    replaced.stop();
                }
                true
            }
            Err(e) => {
                warn!("Failed to load {:?}: {}", filename, e);
                false
            }
        };

        reply(FileLoaded { ok })
    }

    fn open_track(&self, filename: &[u8]) -> anyhow::Result<Box<dyn Playable>> {
        let data = self
            .files
            .read_file(filename)
            .ok_or_else(|| anyhow::anyhow!("file not found"))?;
        let decrypted = decrypt_audio(filename, &data);
        self.audio
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .decode_and_open(decrypted)
    }

    fn playback(&self, request: &Playback) -> Vec<Reply> {
        if let Some(track) = self.track().as_mut() {
            match request.mode() {
                PlaybackMode::Start => {
                    if let Err(e) = track.start() {
                        warn!("Failed to start audio: {}", e);
                    }
                }
                PlaybackMode::Stop => track.stop(),
                PlaybackMode::Other(_) => {}
            }
        }

        reply(response::PlaybackAck::success())
    }

    fn chain_packet(&self, client: &GameClient, packet: &ChainPacket) {
        let outcome = client
            .chain()
            .receive(packet, |input| self.chain_step(client, input));

        if outcome.empty_ack {
            self.send_reply(client, &Reply::from_packet(&ChainAck::success()));
        }

        if let Some(response) = outcome.response {
            self.send_reply(client, &Reply::from_packet(&response));
        }

        let mut pending = vec![];
        for reply in &outcome.deferred {
            self.accumulate(client, &mut pending, reply);
        }
        self.flush(client, &mut pending);
    }

    fn chain_step(&self, client: &GameClient, input: &[u8]) -> Step {
        match self.execute(client, input, Pass::Chain) {
            Ok(Executed {
                replies,
                reset: true,
                ..
            }) => Step::Reset { replies },
            Ok(Executed {
                consumed, replies, ..
            }) => Step::Executed { consumed, replies },
            Err(DispatchError::Truncated(opcode)) => {
                debug!(
                    "[session] client {} chain opcode {:#04x} waiting for operands",
                    client.id(),
                    opcode
                );
                Step::Incomplete
            }
            Err(e) => {
                warn!(
                    "[session] client {} chain: {}, abandoning buffered input",
                    client.id(),
                    e
                );
                Step::Abandon
            }
        }
    }

    /// One retry pump tick for `client`.
    pub fn pump(&self, client: &GameClient, max_retries: u32) {
        let response = client.chain().retransmission(max_retries);
        if let Some(response) = response {
            debug!("[session] resending chain data to client {}", client.id());
            self.send_reply(client, &Reply::from_packet(&response));
        }
    }

    /// Sends the current sample position to every client while audio is playing.
    pub fn broadcast_timestamp(&self) {
        let position = match self.track().as_ref() {
            Some(track) if track.is_playing() => track.sample_position(),
            _ => return,
        };

        debug!("Timestamp: {}", position);
        self.broadcast(&Timestamp { position }.to_reply());
    }
}
