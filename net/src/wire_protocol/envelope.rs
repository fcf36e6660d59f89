use sha2::digest::FixedOutput;
use sha2::{Digest, Sha256};

use crate::bytes::ParseContext;
use crate::error::{EnvelopeError, PeerError, PeerResult};
use crate::params::NetworkParams;
use crate::wire_protocol::addr_message::AddrMessage;
use crate::wire_protocol::command::{format_command_bytes, Command};
use crate::wire_protocol::message::Message;
use crate::wire_protocol::messages::{PingMessage, PongMessage, ProtocolMessage, VerackMessage, VersionMessage};

const HEADER_LEN: usize = 4 + 12 + 4 + 4;

/// Payloads above this size are refused before the rest of a header is even
/// trusted, mirroring Bitcoin Core's `MAX_SIZE` guard against a peer
/// announcing a multi-gigabyte message it never intends to send.
pub const MAX_PAYLOAD_LEN: u32 = 4 * 1024 * 1024;

/// What [`next`] found at the front of a receive buffer.
#[derive(Debug)]
pub enum EnvelopeOutcome {
    /// A complete, checksum-valid envelope naming a command this node
    /// understands.
    Message { message: ProtocolMessage, consumed: usize },
    /// The buffer holds the start of an envelope, but not all of it yet.
    NeedMore,
    /// A complete, checksum-valid envelope whose command this node doesn't
    /// recognize. The bytes are still well-formed enough to skip past.
    Invalid { command: String, consumed: usize },
}

/// Wraps `payload` in a full wire envelope: magic, 12-byte command, length,
/// checksum.
///
/// size | field    | type     | description
/// ---  | -----    | ----     | ------------
/// 4    | magic    | u32      | network magic value
/// 12   | command  | [u8; 12] | ASCII command name, NUL-padded
/// 4    | length   | u32      | payload length in bytes
/// 4    | checksum | u32      | first 4 bytes of sha256(sha256(payload))
/// ?    | payload  | Vec<u8>  | the message body
pub fn frame(params: &NetworkParams, command: Command, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&params.magic().to_le_bytes());
    out.extend_from_slice(command.as_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&double_sha256(payload)[..4]);
    out.extend_from_slice(payload);
    out
}

/// Looks for one complete envelope at the front of `buf` and, if found,
/// parses its body into a [`ProtocolMessage`].
///
/// A magic mismatch, an oversized payload length, or a checksum failure are
/// all reported as an `Err`: they indicate either a misconfigured peer (wrong
/// network) or a corrupted stream, and a caller should treat the connection
/// as unrecoverable. An envelope naming a command outside [`Command`] is
/// still well-formed, so it comes back as `Ok(EnvelopeOutcome::Invalid)` —
/// the caller logs it and keeps reading.
pub fn next(params: &'static NetworkParams, protocol_version: u32, buf: &[u8]) -> PeerResult<EnvelopeOutcome> {
    let mut ctx = ParseContext::new(buf, 0);
    if ctx.remaining() < HEADER_LEN {
        return Ok(EnvelopeOutcome::NeedMore);
    }

    let magic = ctx.read_uint32_le()?;
    if magic != params.magic() {
        return Err(PeerError::Envelope(EnvelopeError::MagicMismatch {
            expected: params.magic(),
            got: magic,
        }));
    }

    let command_bytes = ctx.read_bytes(12)?;
    let payload_len = ctx.read_uint32_le()?;
    if payload_len > MAX_PAYLOAD_LEN {
        return Err(PeerError::Envelope(EnvelopeError::PayloadTooLarge {
            len: payload_len,
            max: MAX_PAYLOAD_LEN,
        }));
    }
    let checksum: [u8; 4] = ctx
        .read_bytes(4)?
        .try_into()
        .expect("read_bytes(4) guarantees exactly 4 bytes");

    if ctx.remaining() < payload_len as usize {
        return Ok(EnvelopeOutcome::NeedMore);
    }

    let payload = ctx.read_bytes(payload_len as usize)?;
    verify_checksum(payload, &checksum)?;

    match Command::try_from(command_bytes) {
        Ok(command) => {
            let message = parse_body(params, protocol_version, command, payload)?;
            Ok(EnvelopeOutcome::Message { message, consumed: ctx.position() })
        }
        Err(_) => Ok(EnvelopeOutcome::Invalid {
            command: format_command_bytes(command_bytes),
            consumed: ctx.position(),
        }),
    }
}

fn parse_body(
    params: &'static NetworkParams,
    protocol_version: u32,
    command: Command,
    payload: &[u8],
) -> PeerResult<ProtocolMessage> {
    match command {
        Command::Version => Ok(ProtocolMessage::Version(VersionMessage::parse(
            params,
            payload,
            0,
            protocol_version,
        )?)),
        Command::Verack => Ok(ProtocolMessage::Verack(VerackMessage::new(params, protocol_version))),
        Command::Ping => Ok(ProtocolMessage::Ping(PingMessage::parse(params, payload, 0, protocol_version)?)),
        Command::Pong => Ok(ProtocolMessage::Pong(PongMessage::parse(params, payload, 0, protocol_version)?)),
        Command::Addr => Ok(ProtocolMessage::Addr(AddrMessage::parse(params, payload, 0, protocol_version)?)),
    }
}

fn verify_checksum(payload: &[u8], checksum: &[u8; 4]) -> PeerResult<()> {
    if double_sha256(payload)[..4] == *checksum {
        Ok(())
    } else {
        Err(PeerError::Envelope(EnvelopeError::ChecksumMismatch))
    }
}

fn double_sha256(input: &[u8]) -> [u8; 32] {
    sha256(&sha256(input))
}

fn sha256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::default();
    hasher.update(input);
    hasher.finalize_fixed().into()
}

/// Convenience for sending a already-built message: frames its serialized
/// body under its own command.
pub fn frame_message(message: &dyn Message) -> PeerResult<Vec<u8>> {
    let params = message.header().params;
    let payload = message.bitcoin_serialize()?;
    Ok(frame(params, message.command(), &payload))
}

#[cfg(test)]
mod test {
    use hex_literal::hex;
    use rstest::rstest;

    use super::*;
    use crate::bytes::write_varint;
    use crate::params::NetworkParams;

    #[rstest]
    #[case(b"hello world", &hex!("bc62d4b80d9e36da29c16c5d4d9f11731f36052c72401a76c23c0fb5a9b74423")[..])]
    fn double_sha256_matches_known_vector(#[case] input: &[u8], #[case] expected: &[u8]) {
        assert_eq!(&double_sha256(input)[..], expected);
    }

    #[test]
    fn verack_round_trips_through_frame_and_next() {
        let params = NetworkParams::mainnet();
        let verack = VerackMessage::new(params, params.protocol_version(crate::params::ProtocolMilestone::Current));
        let framed = frame_message(&verack).unwrap();

        match next(params, verack.protocol_version(), &framed).unwrap() {
            EnvelopeOutcome::Message { message, consumed } => {
                assert_eq!(consumed, framed.len());
                assert!(matches!(message, ProtocolMessage::Verack(_)));
            }
            _ => panic!("expected a complete message"),
        }
    }

    #[test]
    fn addr_envelope_round_trips_payload_bytes_and_consumed_length() {
        let params = NetworkParams::mainnet();
        let mut payload = Vec::new();
        write_varint(0, &mut payload); // an empty addr vector is still a well-formed payload
        let framed = frame(params, Command::Addr, &payload);

        match next(params, 70016, &framed).unwrap() {
            EnvelopeOutcome::Message { message, consumed } => {
                assert_eq!(consumed, framed.len());
                match message {
                    ProtocolMessage::Addr(addr) => assert_eq!(addr.bitcoin_serialize().unwrap(), payload),
                    _ => panic!("expected an addr message"),
                }
            }
            _ => panic!("expected a complete message"),
        }
    }

    #[test]
    fn short_buffer_asks_for_more() {
        let params = NetworkParams::mainnet();
        let framed = frame(params, Command::Verack, &[]);
        let outcome = next(params, 0, &framed[..framed.len() - 1]).unwrap();
        assert!(matches!(outcome, EnvelopeOutcome::NeedMore));
    }

    #[test]
    fn wrong_magic_is_an_envelope_error() {
        let mainnet = NetworkParams::mainnet();
        let testnet = NetworkParams::testnet();
        let framed = frame(testnet, Command::Verack, &[]);
        let err = next(mainnet, 0, &framed).unwrap_err();
        assert!(matches!(err, PeerError::Envelope(EnvelopeError::MagicMismatch { .. })));
    }

    #[test]
    fn flipped_checksum_byte_is_an_envelope_error() {
        let params = NetworkParams::mainnet();
        let mut framed = frame(params, Command::Verack, &[]);
        let checksum_offset = 4 + 12 + 4;
        framed[checksum_offset] ^= 0xFF;
        let err = next(params, 0, &framed).unwrap_err();
        assert!(matches!(err, PeerError::Envelope(EnvelopeError::ChecksumMismatch)));
    }

    #[test]
    fn unknown_command_is_reported_as_invalid_not_an_error() {
        let params = NetworkParams::mainnet();
        let mut framed = frame(params, Command::Verack, &[]);
        framed[4..16].copy_from_slice(b"notacommand\0");
        let checksum = double_sha256(&[]);
        framed[20..24].copy_from_slice(&checksum[..4]);

        match next(params, 0, &framed).unwrap() {
            EnvelopeOutcome::Invalid { command, consumed } => {
                assert_eq!(command, "notacommand\\x00");
                assert_eq!(consumed, framed.len());
            }
            _ => panic!("expected an invalid-command outcome"),
        }
    }

    #[test]
    fn oversized_payload_length_is_rejected_before_buffering() {
        let params = NetworkParams::mainnet();
        let mut header = Vec::new();
        header.extend_from_slice(&params.magic().to_le_bytes());
        header.extend_from_slice(Command::Verack.as_bytes());
        header.extend_from_slice(&(MAX_PAYLOAD_LEN + 1).to_le_bytes());
        header.extend_from_slice(&[0u8; 4]);

        let err = next(params, 0, &header).unwrap_err();
        assert!(matches!(err, PeerError::Envelope(EnvelopeError::PayloadTooLarge { .. })));
    }
}
