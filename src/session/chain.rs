//! Per-client chain buffers.
//!
//! A client streams sub-commands through chain packets, each tagged with the client's view of
//! two cursors: how much of its input the unit has accepted and how much of the unit's output it
//! has read. Cursors only move forward. A chunk is appended only when the client's input cursor
//! matches the end of the buffered input, so duplicated or stale packets never execute twice.

use network::packet::FrameCodec;
use network::protocol::Address;
use packets::request::ChainPacket;
use packets::response::{ChainResponse, Codes as ReplyCodes};
use packets::Reply;
use tracing::{debug, trace};

/// A chain response carries its length in one byte.
const MAX_RESPONSE_DATA: usize = u8::MAX as usize;

/// What running one sub-command out of the input buffer produced.
#[derive(Debug)]
pub enum Step {
    Executed { consumed: usize, replies: Vec<Reply> },
    /// The sub-command's operands have not all arrived yet.
    Incomplete,
    /// The rest of the buffered input cannot be interpreted.
    Abandon,
    /// The client re-registered: buffers start over and the replies go out as a plain frame.
    Reset { replies: Vec<Reply> },
}

#[derive(Debug, Default)]
pub struct ChainOutcome {
    /// The chunk was empty and the client expects a `0x47` acknowledgement.
    pub empty_ack: bool,
    pub response: Option<ChainResponse>,
    pub deferred: Vec<Reply>,
}

#[derive(Debug)]
pub struct ChainBuffer {
    /// Where responses go, for sizing them to the wire budget.
    address: Address,
    input: Vec<u8>,
    output: Vec<u8>,
    input_index: usize,
    output_index: usize,
    next_expected_output: usize,
    minimum_output: usize,
    last_executed: usize,
    last_sent: Option<ChainResponse>,
    resend_count: u32,
}

/// Widens a one-byte wire cursor to the position congruent to it that lies nearest `reference`.
fn widen(byte: u8, reference: usize) -> usize {
    let candidate = (reference & !0xff) | byte as usize;
    [candidate.checked_sub(0x100), Some(candidate + 0x100)]
        .into_iter()
        .flatten()
        .fold(candidate, |best, other| {
            if other.abs_diff(reference) < best.abs_diff(reference) {
                other
            } else {
                best
            }
        })
}

/// Builds a response carrying as much of `data` as fits in one frame to `address`. The client
/// reads the rest from a later response once its output cursor moves past this one.
fn chain_response(
    address: Address,
    output_offset: usize,
    input_index: usize,
    data: &[u8],
) -> ChainResponse {
    let mut response = ChainResponse {
        output_offset: output_offset as u8,
        input_index: input_index as u8,
        data: Vec::with_capacity(data.len().min(MAX_RESPONSE_DATA)),
    };
    for &b in data.iter().take(MAX_RESPONSE_DATA) {
        response.data.push(b);
        if !FrameCodec::fits_budget(address, &Reply::from_packet(&response).to_bytes()) {
            response.data.pop();
            break;
        }
    }
    response
}

impl ChainBuffer {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            input: vec![],
            output: vec![],
            input_index: 0,
            output_index: 0,
            next_expected_output: 0,
            minimum_output: 0,
            last_executed: 0,
            last_sent: None,
            resend_count: 0,
        }
    }

    pub fn input_index(&self) -> usize {
        self.input_index
    }

    pub fn output_index(&self) -> usize {
        self.output_index
    }

    pub fn last_executed(&self) -> usize {
        self.last_executed
    }

    pub fn next_expected_output(&self) -> usize {
        self.next_expected_output
    }

    pub fn minimum_output(&self) -> usize {
        self.minimum_output
    }

    pub fn input_len(&self) -> usize {
        self.input.len()
    }

    pub fn output_len(&self) -> usize {
        self.output.len()
    }

    pub fn last_sent(&self) -> Option<&ChainResponse> {
        self.last_sent.as_ref()
    }

    pub fn resend_count(&self) -> u32 {
        self.resend_count
    }

    /// Starts the buffers over for a new registration. The last sent response stays available
    /// for retransmission.
    pub fn reset(&mut self) {
        *self = Self {
            last_sent: self.last_sent.take(),
            resend_count: self.resend_count,
            ..Self::new(self.address)
        };
    }

    /// Applies one chain packet, running any newly completed sub-commands through `execute`.
    pub fn receive<F>(&mut self, packet: &ChainPacket, mut execute: F) -> ChainOutcome
    where
        F: FnMut(&[u8]) -> Step,
    {
        let input_index = widen(packet.input_index, self.input.len());
        let output_index = widen(packet.output_index, self.output.len());
        let mut outcome = ChainOutcome::default();

        trace!(
            "chain in {} / {} (cursor {}), out {} / {} (cursor {})",
            input_index,
            self.input.len(),
            self.input_index,
            output_index,
            self.output.len(),
            self.output_index
        );

        if input_index > self.input.len() {
            debug!(
                "chain input index ahead: {} > {}",
                input_index,
                self.input.len()
            );
            self.input_index = self.input.len();
            return outcome;
        }

        if output_index > self.output.len() {
            debug!(
                "chain output index ahead: {} > {}",
                output_index,
                self.output.len()
            );
            return outcome;
        }

        self.input_index = self.input_index.max(input_index);
        self.output_index = self.output_index.max(output_index);

        if input_index == self.input.len() {
            let response_offset = self.output.len();
            self.input.extend_from_slice(&packet.chunk);
            self.input_index = self.input.len();

            let mut playback_acked = false;
            while self.last_executed < self.input.len() {
                match execute(&self.input[self.last_executed..]) {
                    Step::Executed { consumed, replies } => {
                        self.last_executed = (self.last_executed + consumed).min(self.input.len());
                        for reply in replies {
                            if reply.opcode == ReplyCodes::Playback as u8 {
                                if playback_acked {
                                    continue;
                                }
                                playback_acked = true;
                            }
                            reply.write_to(&mut self.output);
                        }
                        self.next_expected_output = self.output.len();
                    }
                    Step::Incomplete => break,
                    Step::Abandon => {
                        self.last_executed = self.input.len();
                        break;
                    }
                    Step::Reset { replies } => {
                        self.reset();
                        outcome.deferred = replies;
                        return outcome;
                    }
                }
            }

            outcome.empty_ack = packet.chunk.is_empty();

            let produced = &self.output[response_offset..];
            if !produced.is_empty() {
                let response =
                    chain_response(self.address, response_offset, self.input_index, produced);
                self.last_sent = Some(response.clone());
                self.resend_count = 0;
                outcome.response = Some(response);
            }
        } else {
            self.output_index = self.next_expected_output;
        }

        self.minimum_output = self.output_index;
        outcome
    }

    /// One tick of the retry pump: output the client has not acknowledged yet, or else the last
    /// response sent. Nothing once `max_retries` ticks passed without new output.
    pub fn retransmission(&mut self, max_retries: u32) -> Option<ChainResponse> {
        if self.resend_count >= max_retries {
            return None;
        }
        self.resend_count += 1;

        if self.output_index < self.next_expected_output {
            let tail = &self.output[self.output_index..self.next_expected_output];
            let response = chain_response(self.address, self.output_index, self.input_index, tail);
            self.last_sent = Some(response.clone());
            Some(response)
        } else {
            self.last_sent.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn buffer() -> ChainBuffer {
        ChainBuffer::new(Address::from_session_unit(1))
    }

    fn reply(opcode: u8) -> Reply {
        Reply::new(opcode, vec![0x01])
    }

    /// `58 xx` and `4c xx` take one operand, `04` produces a 33 byte reply, `02` resets,
    /// anything else is unknown.
    fn run(input: &[u8]) -> Step {
        match input[0] {
            0x04 => Step::Executed {
                consumed: 1,
                replies: vec![Reply::new(0x05, vec![0xc0; 32])],
            },
            0x58 | 0x4c if input.len() < 2 => Step::Incomplete,
            0x58 => Step::Executed {
                consumed: 2,
                replies: vec![reply(0x59)],
            },
            0x4c => Step::Executed {
                consumed: 2,
                replies: vec![reply(0x4d)],
            },
            0x02 => Step::Reset {
                replies: vec![Reply::new(0x03, vec![0x01])],
            },
            _ => Step::Abandon,
        }
    }

    fn packet(input_index: u8, output_index: u8, chunk: &[u8]) -> ChainPacket {
        ChainPacket {
            input_index,
            output_index,
            chunk: chunk.to_vec(),
        }
    }

    #[test]
    fn test_widen() {
        assert_eq!(widen(5, 0), 5);
        assert_eq!(widen(250, 100), 250);
        assert_eq!(widen(0x02, 0x1fe), 0x202);
        assert_eq!(widen(0xfe, 0x201), 0x1fe);
        assert_eq!(widen(0x10, 0x110), 0x110);
    }

    #[test]
    fn test_new_data() {
        let mut chain = buffer();
        let outcome = chain.receive(&packet(0, 0, &[0x58, 0x00, 0x58, 0x01]), run);

        assert!(!outcome.empty_ack);
        let response = outcome.response.unwrap();
        assert_eq!(response.output_offset, 0);
        assert_eq!(response.input_index, 4);
        assert_eq!(response.data, vec![0x59, 0x01, 0x59, 0x01]);

        assert_eq!(chain.input_index(), 4);
        assert_eq!(chain.last_executed(), 4);
        assert_eq!(chain.output_len(), 4);
        assert_eq!(chain.next_expected_output(), 4);
        assert_eq!(chain.output_index(), 0);
        assert_eq!(chain.minimum_output(), 0);
        assert_eq!(chain.last_sent(), Some(&response));
    }

    #[test]
    fn test_follow_up_offsets() {
        let mut chain = buffer();
        chain.receive(&packet(0, 0, &[0x58, 0x00]), run);
        let response = chain
            .receive(&packet(2, 2, &[0x58, 0x01]), run)
            .response
            .unwrap();

        assert_eq!(response.output_offset, 2);
        assert_eq!(response.input_index, 4);
        assert_eq!(response.data, vec![0x59, 0x01]);
        assert_eq!(chain.output_index(), 2);
    }

    #[test]
    fn test_duplicate_is_not_executed() {
        let mut chain = buffer();
        let calls = Cell::new(0);
        let mut counted = |input: &[u8]| {
            calls.set(calls.get() + 1);
            run(input)
        };

        let first = packet(0, 0, &[0x58, 0x00]);
        chain.receive(&first, &mut counted);
        let outcome = chain.receive(&first, &mut counted);

        assert_eq!(calls.get(), 1);
        assert!(outcome.response.is_none());
        assert!(!outcome.empty_ack);
        assert_eq!(chain.output_len(), 2);
        assert_eq!(chain.output_index(), chain.next_expected_output());
        assert_eq!(chain.minimum_output(), 2);
    }

    #[test]
    fn test_input_ahead_clamps() {
        let mut chain = buffer();
        let outcome = chain.receive(&packet(5, 0, &[0x58, 0x00]), run);
        assert!(outcome.response.is_none());
        assert_eq!(chain.input_index(), 0);
        assert_eq!(chain.input_len(), 0);

        chain.receive(&packet(0, 0, &[0x58, 0x00]), run);
        chain.receive(&packet(9, 0, &[0x58, 0x00]), run);
        assert_eq!(chain.input_index(), 2);
        assert_eq!(chain.input_len(), 2);
        assert_eq!(chain.last_executed(), 2);
    }

    #[test]
    fn test_output_ahead_ignored() {
        let mut chain = buffer();
        chain.receive(&packet(0, 0, &[0x58, 0x00]), run);

        let outcome = chain.receive(&packet(2, 3, &[0x58, 0x00]), run);
        assert!(outcome.response.is_none());
        assert_eq!(chain.input_len(), 2);
        assert_eq!(chain.input_index(), 2);
        assert_eq!(chain.output_index(), 0);
    }

    #[test]
    fn test_split_sub_command() {
        let mut chain = buffer();
        let outcome = chain.receive(&packet(0, 0, &[0x58]), run);
        assert!(outcome.response.is_none());
        assert!(!outcome.empty_ack);
        assert_eq!(chain.last_executed(), 0);
        assert_eq!(chain.input_index(), 1);

        let response = chain.receive(&packet(1, 0, &[0x00]), run).response.unwrap();
        assert_eq!(response.output_offset, 0);
        assert_eq!(response.input_index, 2);
        assert_eq!(response.data, vec![0x59, 0x01]);
        assert_eq!(chain.last_executed(), 2);
    }

    #[test]
    fn test_playback_ack_once_per_pass() {
        let mut chain = buffer();
        let response = chain
            .receive(&packet(0, 0, &[0x4c, 0x08, 0x58, 0x00, 0x4c, 0x00]), run)
            .response
            .unwrap();
        assert_eq!(response.data, vec![0x4d, 0x01, 0x59, 0x01]);

        let response = chain
            .receive(&packet(6, 4, &[0x4c, 0x08]), run)
            .response
            .unwrap();
        assert_eq!(response.data, vec![0x4d, 0x01]);
    }

    #[test]
    fn test_empty_chunk_acknowledged() {
        let mut chain = buffer();
        let outcome = chain.receive(&packet(0, 0, &[]), run);
        assert!(outcome.empty_ack);
        assert!(outcome.response.is_none());
        assert!(chain.last_sent().is_none());
    }

    #[test]
    fn test_unknown_opcode_abandons_input() {
        let mut chain = buffer();
        let outcome = chain.receive(&packet(0, 0, &[0x58, 0x00, 0x99, 0x58, 0x00]), run);
        assert_eq!(outcome.response.unwrap().data, vec![0x59, 0x01]);
        assert_eq!(chain.last_executed(), 5);

        let outcome = chain.receive(&packet(5, 2, &[0x58, 0x01]), run);
        assert_eq!(outcome.response.unwrap().data, vec![0x59, 0x01]);
    }

    #[test]
    fn test_register_resets() {
        let mut chain = buffer();
        chain.receive(&packet(0, 0, &[0x58, 0x00]), run);
        let sent = chain.last_sent().cloned();

        let outcome = chain.receive(&packet(2, 2, &[0x58, 0x00, 0x02, 0x58, 0x00]), run);
        assert!(outcome.response.is_none());
        assert_eq!(outcome.deferred, vec![Reply::new(0x03, vec![0x01])]);

        assert_eq!(chain.input_len(), 0);
        assert_eq!(chain.output_len(), 0);
        assert_eq!(chain.input_index(), 0);
        assert_eq!(chain.output_index(), 0);
        assert_eq!(chain.last_executed(), 0);
        assert_eq!(chain.last_sent().cloned(), sent);
    }

    #[test]
    fn test_cursors_never_move_backward() {
        let mut chain = buffer();
        let frames = [
            packet(0, 0, &[0x58, 0x00]),
            packet(0, 0, &[0x58, 0x00]),
            packet(2, 1, &[0x58]),
            packet(7, 0, &[0x58]),
            packet(3, 2, &[0x00, 0x4c, 0x08]),
            packet(1, 4, &[]),
            packet(6, 9, &[0x58, 0x00]),
            packet(6, 4, &[]),
            packet(2, 0, &[0x4c]),
        ];

        let mut previous = (0, 0, 0);
        for frame in &frames {
            chain.receive(frame, run);
            let current = (
                chain.input_index(),
                chain.output_index(),
                chain.last_executed(),
            );
            assert!(current.0 >= previous.0, "input index regressed on {:?}", frame);
            assert!(current.1 >= previous.1, "output index regressed on {:?}", frame);
            assert!(current.2 >= previous.2, "last executed regressed on {:?}", frame);
            assert!(chain.last_executed() <= chain.input_len());
            assert!(chain.output_index() <= chain.output_len());
            previous = current;
        }
    }

    #[test]
    fn test_retransmission() {
        let mut chain = buffer();
        assert_eq!(chain.retransmission(10), None);
        assert_eq!(chain.resend_count(), 1);

        let first = chain
            .receive(&packet(0, 0, &[0x58, 0x00, 0x58, 0x01]), run)
            .response
            .unwrap();
        assert_eq!(chain.resend_count(), 0);

        let tail = chain.retransmission(10).unwrap();
        assert_eq!(tail, first);

        let outcome = chain.receive(&packet(4, 4, &[]), run);
        assert!(outcome.empty_ack);
        assert_eq!(chain.output_index(), 4);

        for _ in 1..10 {
            assert_eq!(chain.retransmission(10), Some(first.clone()));
        }
        assert_eq!(chain.retransmission(10), None);
        assert_eq!(chain.resend_count(), 10);

        chain.receive(&packet(4, 4, &[0x58, 0x02]), run);
        assert_eq!(chain.resend_count(), 0);
        assert!(chain.retransmission(10).is_some());
    }

    #[test]
    fn test_retransmission_sends_unacknowledged_tail() {
        let mut chain = buffer();
        chain.receive(&packet(0, 0, &[0x58, 0x00]), run);
        chain.receive(&packet(2, 2, &[0x58, 0x01]), run);

        let tail = chain.retransmission(10).unwrap();
        assert_eq!(tail.output_offset, 2);
        assert_eq!(tail.input_index, 4);
        assert_eq!(tail.data, vec![0x59, 0x01]);
        assert_eq!(chain.last_sent(), Some(&tail));
    }

    fn fits(response: &ChainResponse) -> bool {
        FrameCodec::fits_budget(
            Address::from_session_unit(1),
            &Reply::from_packet(response).to_bytes(),
        )
    }

    #[test]
    fn test_response_split_to_wire_budget() {
        let mut chain = buffer();
        let first = chain
            .receive(&packet(0, 0, &[0x04, 0x04]), run)
            .response
            .unwrap();
        assert_eq!(chain.output_len(), 66);
        assert!(fits(&first));
        assert_eq!(first.output_offset, 0);
        assert!(!first.data.is_empty() && first.data.len() < 66);
        assert_eq!(first.data[..], chain.output[..first.data.len()]);

        let mut read = first.data.len();
        while read < 66 {
            chain.receive(&packet(2, read as u8, &[]), run);
            let tail = chain.retransmission(10).unwrap();
            assert!(fits(&tail));
            assert_eq!(tail.output_offset as usize, read);
            assert_eq!(tail.data[..], chain.output[read..read + tail.data.len()]);
            read += tail.data.len();
        }
        assert_eq!(read, 66);
    }
}
