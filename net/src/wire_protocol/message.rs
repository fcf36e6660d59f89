use crate::error::PeerResult;
use crate::params::NetworkParams;
use crate::wire_protocol::command::Command;

/// The bookkeeping every concrete message carries, in place of the
/// inheritance-based `Message` base record: the network it was built for,
/// where it started in its source payload, how many bytes it consumed, and
/// the protocol version it was parsed under (or will be sent under).
///
/// A message constructed in memory (not parsed from a payload) sets `offset`
/// to `0` and `length` to its known on-the-wire size.
#[derive(Copy, Clone, Debug)]
pub struct MessageHeader {
    pub params: &'static NetworkParams,
    pub offset: usize,
    pub length: usize,
    pub protocol_version: u32,
}

impl MessageHeader {
    pub fn in_memory(params: &'static NetworkParams, protocol_version: u32, length: usize) -> Self {
        MessageHeader {
            params,
            offset: 0,
            length,
            protocol_version,
        }
    }
}

/// Shared contract implemented by every concrete wire message. Rather than a
/// class hierarchy with virtual `parse`/`serializeToStream`, each message
/// kind is a plain struct implementing this trait; [`super::envelope::next`]
/// dispatches to the right constructor by [`Command`] and wraps the result in
/// [`super::messages::ProtocolMessage`].
pub trait Message: std::fmt::Debug {
    fn command(&self) -> Command;

    fn header(&self) -> &MessageHeader;

    /// Writes this message's body bytes. Does not write the envelope.
    fn serialize_body(&self, out: &mut Vec<u8>) -> PeerResult<()>;

    /// Convenience wrapper around [`Self::serialize_body`].
    fn bitcoin_serialize(&self) -> PeerResult<Vec<u8>> {
        let mut out = Vec::new();
        self.serialize_body(&mut out)?;
        Ok(out)
    }

    fn protocol_version(&self) -> u32 {
        self.header().protocol_version
    }

    /// Number of bytes this message occupied in its source payload (for a
    /// parsed message) or its known on-the-wire size (for one built in
    /// memory).
    fn wire_length(&self) -> usize {
        self.header().length
    }
}
