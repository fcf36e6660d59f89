use crate::bytes::{write_varint, ParseContext};
use crate::error::{PeerError, PeerResult};
use crate::params::NetworkParams;
use crate::wire_protocol::command::Command;
use crate::wire_protocol::message::{Message, MessageHeader};
use crate::wire_protocol::peer_address::{PeerAddress, MESSAGE_SIZE as PEER_ADDRESS_SIZE};

/// The real `addr` message never carries more than 1000 entries; a node
/// announcing more than that is either broken or malicious, so we refuse to
/// allocate for it rather than trust a 4-byte length prefix.
pub const MAX_ADDR_COUNT: u64 = 1000;

/// A batch of [`PeerAddress`] records a peer is announcing.
#[derive(Clone, Debug)]
pub struct AddrMessage {
    header: MessageHeader,
    pub addresses: Vec<PeerAddress>,
}

impl AddrMessage {
    pub fn new(params: &'static NetworkParams, protocol_version: u32, addresses: Vec<PeerAddress>) -> Self {
        let length = varint_len(addresses.len() as u64) + addresses.len() * PEER_ADDRESS_SIZE;
        AddrMessage { header: MessageHeader::in_memory(params, protocol_version, length), addresses }
    }

    pub fn parse(
        params: &'static NetworkParams,
        payload: &[u8],
        offset: usize,
        protocol_version: u32,
    ) -> PeerResult<Self> {
        let mut ctx = ParseContext::new(payload, offset);
        let count = ctx.read_varint()?;
        if count > MAX_ADDR_COUNT {
            return Err(PeerError::protocol(format!(
                "addr message announces {count} addresses, exceeding the cap of {MAX_ADDR_COUNT}"
            )));
        }

        let mut addresses = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let entry = PeerAddress::parse(params, payload, ctx.position(), protocol_version)?;
            ctx.skip(entry.wire_length())?;
            addresses.push(entry);
        }

        let length = ctx.position() - offset;
        Ok(AddrMessage { header: MessageHeader { params, offset, length, protocol_version }, addresses })
    }
}

impl Message for AddrMessage {
    fn command(&self) -> Command {
        Command::Addr
    }

    fn header(&self) -> &MessageHeader {
        &self.header
    }

    fn serialize_body(&self, out: &mut Vec<u8>) -> PeerResult<()> {
        write_varint(self.addresses.len() as u64, out);
        for address in &self.addresses {
            address.serialize_body(out)?;
        }
        Ok(())
    }
}

fn varint_len(n: u64) -> usize {
    let mut out = Vec::new();
    write_varint(n, &mut out);
    out.len()
}

#[cfg(test)]
mod test {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn empty_addr_message_serializes_to_a_single_zero_byte() {
        let params = NetworkParams::mainnet();
        let msg = AddrMessage::new(params, 70016, vec![]);
        assert_eq!(msg.bitcoin_serialize().unwrap(), vec![0]);
    }

    #[test]
    fn addr_message_round_trips_several_entries() {
        let params = NetworkParams::mainnet();
        let entries = vec![
            PeerAddress::from_ip_port(params, IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4)), 8333),
            PeerAddress::from_ip_port(params, IpAddr::V4(Ipv4Addr::new(5, 6, 7, 8)), 18333),
        ];
        let msg = AddrMessage::new(params, 70016, entries.clone());
        let bytes = msg.bitcoin_serialize().unwrap();

        let parsed = AddrMessage::parse(params, &bytes, 0, 70016).unwrap();
        assert_eq!(parsed.addresses.len(), 2);
        assert_eq!(parsed.addresses[0].port, entries[0].port);
        assert_eq!(parsed.addresses[1].port, entries[1].port);
    }

    #[test]
    fn declared_count_above_the_cap_is_rejected_without_allocating() {
        let params = NetworkParams::mainnet();
        let mut payload = Vec::new();
        write_varint(MAX_ADDR_COUNT + 1, &mut payload);
        let err = AddrMessage::parse(params, &payload, 0, 70016).unwrap_err();
        assert!(matches!(err, PeerError::Protocol(_)));
    }
}
