use std::net::{IpAddr, Ipv6Addr, SocketAddr};

use rand::{Rng, RngCore};

use crate::bytes::{
    current_time_seconds, write_int32_le, write_int64_le, write_uint64_le, write_varint, ParseContext,
};
use crate::error::PeerResult;
use crate::params::NetworkParams;
use crate::wire_protocol::addr_message::AddrMessage;
use crate::wire_protocol::command::Command;
use crate::wire_protocol::message::{Message, MessageHeader};
use crate::wire_protocol::net_addr::{read_net_addr_notime, write_net_addr_notime};
use crate::wire_protocol::node::{NodeDesc, NodeServiceSet};

/// Any concrete wire message this node can send or receive, tagged by its
/// kind in place of a class hierarchy rooted at `Message`.
#[derive(Debug)]
pub enum ProtocolMessage {
    Version(VersionMessage),
    Verack(VerackMessage),
    Ping(PingMessage),
    Pong(PongMessage),
    Addr(AddrMessage),
}

impl ProtocolMessage {
    pub fn as_message(&self) -> &dyn Message {
        match self {
            ProtocolMessage::Version(m) => m,
            ProtocolMessage::Verack(m) => m,
            ProtocolMessage::Ping(m) => m,
            ProtocolMessage::Pong(m) => m,
            ProtocolMessage::Addr(m) => m,
        }
    }
}

/// <https://en.bitcoin.it/wiki/Protocol_documentation#version>
///
/// size | field        | type     | description
/// ---  | -----        | ----     | ------------
/// 4    | version      | i32      | protocol version used by the sender
/// 8    | services     | u64      | bitfield of features enabled for this connection
/// 8    | timestamp    | i64      | standard UNIX timestamp in seconds
/// 26   | addr_recv    | net_addr | network address of the node receiving this message
/// 26   | addr_from    | net_addr | network address of the sending node
/// 8    | nonce        | u64      | random nonce, used to detect self-connections
/// ?    | user_agent   | var_str  | user agent string
/// 4    | start_height | i32      | last block held by the sending node
/// 1    | relay        | bool     | whether the peer should announce relayed transactions
#[derive(Clone, Debug)]
pub struct VersionMessage {
    header: MessageHeader,
    pub version: i32,
    pub services: NodeServiceSet,
    pub timestamp: i64,
    pub addr_recv: SocketAddr,
    pub addr_from: SocketAddr,
    pub nonce: u64,
    pub user_agent: String,
    pub start_height: i32,
    pub relay: bool,
}

impl VersionMessage {
    pub fn new(params: &'static NetworkParams, addr_recv: SocketAddr, me: &NodeDesc) -> Self {
        let mut rng = rand::thread_rng();
        VersionMessage {
            header: MessageHeader::in_memory(params, me.protocol_version, 0),
            version: me.protocol_version as i32,
            services: me.services.clone(),
            timestamp: current_time_seconds() as i64,
            addr_recv,
            addr_from: me.addr_from,
            nonce: rng.gen(),
            user_agent: me.user_agent.clone(),
            start_height: me.start_height,
            relay: true,
        }
    }

    pub fn parse(
        params: &'static NetworkParams,
        payload: &[u8],
        offset: usize,
        protocol_version: u32,
    ) -> PeerResult<Self> {
        let mut ctx = ParseContext::new(payload, offset);

        let version = ctx.read_int32_le()?;
        let services_mask = ctx.read_uint64_le()?;
        let services = NodeServiceSet::from_bitmask(services_mask);
        let timestamp = ctx.read_int64_le()?;
        let (_, recv_addr, recv_port) = read_net_addr_notime(&mut ctx)?;
        let (_, from_addr, from_port) = read_net_addr_notime(&mut ctx)?;
        let nonce = ctx.read_uint64_le()?;
        let user_agent_len = ctx.read_varint()? as usize;
        let user_agent = String::from_utf8_lossy(ctx.read_bytes(user_agent_len)?).into_owned();
        let start_height = ctx.read_int32_le()?;
        let relay = if ctx.remaining() > 0 { ctx.read_bytes(1)?[0] != 0 } else { true };
        let length = ctx.position() - offset;

        Ok(VersionMessage {
            header: MessageHeader { params, offset, length, protocol_version },
            version,
            services,
            timestamp,
            addr_recv: SocketAddr::new(IpAddr::V6(recv_addr), recv_port),
            addr_from: SocketAddr::new(IpAddr::V6(from_addr), from_port),
            nonce,
            user_agent,
            start_height,
            relay,
        })
    }
}

impl Message for VersionMessage {
    fn command(&self) -> Command {
        Command::Version
    }

    fn header(&self) -> &MessageHeader {
        &self.header
    }

    fn serialize_body(&self, out: &mut Vec<u8>) -> PeerResult<()> {
        write_int32_le(self.version, out);
        write_uint64_le(self.services.as_bitmask(), out);
        write_int64_le(self.timestamp, out);
        write_net_addr_notime(self.services.as_bitmask(), to_ipv6(self.addr_recv.ip()), self.addr_recv.port(), out);
        write_net_addr_notime(self.services.as_bitmask(), to_ipv6(self.addr_from.ip()), self.addr_from.port(), out);
        write_uint64_le(self.nonce, out);
        write_varint(self.user_agent.len() as u64, out);
        out.extend_from_slice(self.user_agent.as_bytes());
        write_int32_le(self.start_height, out);
        out.push(self.relay as u8);
        Ok(())
    }
}

fn to_ipv6(ip: IpAddr) -> Ipv6Addr {
    match ip {
        IpAddr::V4(v4) => v4.to_ipv6_mapped(),
        IpAddr::V6(v6) => v6,
    }
}

/// Sent in reply to a `version` once both sides have exchanged one.
#[derive(Clone, Debug)]
pub struct VerackMessage {
    header: MessageHeader,
}

impl VerackMessage {
    pub fn new(params: &'static NetworkParams, protocol_version: u32) -> Self {
        VerackMessage { header: MessageHeader::in_memory(params, protocol_version, 0) }
    }
}

impl Message for VerackMessage {
    fn command(&self) -> Command {
        Command::Verack
    }

    fn header(&self) -> &MessageHeader {
        &self.header
    }

    fn serialize_body(&self, _out: &mut Vec<u8>) -> PeerResult<()> {
        Ok(())
    }
}

/// Carries a nonce the peer is expected to echo back in a `pong`, used to
/// measure round-trip latency and detect a stalled connection.
#[derive(Clone, Debug)]
pub struct PingMessage {
    header: MessageHeader,
    pub nonce: u64,
}

impl PingMessage {
    pub fn new(params: &'static NetworkParams, protocol_version: u32) -> Self {
        PingMessage {
            header: MessageHeader::in_memory(params, protocol_version, 8),
            nonce: rand::thread_rng().next_u64(),
        }
    }

    pub fn parse(
        params: &'static NetworkParams,
        payload: &[u8],
        offset: usize,
        protocol_version: u32,
    ) -> PeerResult<Self> {
        let mut ctx = ParseContext::new(payload, offset);
        let nonce = ctx.read_uint64_le()?;
        let length = ctx.position() - offset;
        Ok(PingMessage { header: MessageHeader { params, offset, length, protocol_version }, nonce })
    }
}

impl Message for PingMessage {
    fn command(&self) -> Command {
        Command::Ping
    }

    fn header(&self) -> &MessageHeader {
        &self.header
    }

    fn serialize_body(&self, out: &mut Vec<u8>) -> PeerResult<()> {
        write_uint64_le(self.nonce, out);
        Ok(())
    }
}

/// Reply to a `ping`, echoing its nonce.
#[derive(Clone, Debug)]
pub struct PongMessage {
    header: MessageHeader,
    pub nonce: u64,
}

impl PongMessage {
    pub fn reply_to(ping: &PingMessage) -> Self {
        PongMessage {
            header: MessageHeader::in_memory(ping.header.params, ping.header.protocol_version, 8),
            nonce: ping.nonce,
        }
    }

    pub fn parse(
        params: &'static NetworkParams,
        payload: &[u8],
        offset: usize,
        protocol_version: u32,
    ) -> PeerResult<Self> {
        let mut ctx = ParseContext::new(payload, offset);
        let nonce = ctx.read_uint64_le()?;
        let length = ctx.position() - offset;
        Ok(PongMessage { header: MessageHeader { params, offset, length, protocol_version }, nonce })
    }
}

impl Message for PongMessage {
    fn command(&self) -> Command {
        Command::Pong
    }

    fn header(&self) -> &MessageHeader {
        &self.header
    }

    fn serialize_body(&self, out: &mut Vec<u8>) -> PeerResult<()> {
        write_uint64_le(self.nonce, out);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::net::Ipv4Addr;

    use super::*;

    fn node_desc(params: &'static NetworkParams) -> NodeDesc {
        NodeDesc {
            protocol_version: params.protocol_version(crate::params::ProtocolMilestone::Current),
            services: NodeServiceSet(vec![]),
            user_agent: "/inchain:0.1.0/".to_string(),
            start_height: 0,
            addr_from: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), params.default_port()),
        }
    }

    #[test]
    fn version_message_round_trips_through_its_own_wire_format() {
        let params = NetworkParams::mainnet();
        let me = node_desc(params);
        let addr_recv = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 5)), 8333);
        let version = VersionMessage::new(params, addr_recv, &me);

        let bytes = version.bitcoin_serialize().unwrap();
        let parsed = VersionMessage::parse(params, &bytes, 0, version.protocol_version()).unwrap();

        assert_eq!(parsed.version, version.version);
        assert_eq!(parsed.nonce, version.nonce);
        assert_eq!(parsed.user_agent, version.user_agent);
        assert_eq!(parsed.start_height, version.start_height);
        assert_eq!(parsed.addr_recv.port(), addr_recv.port());
    }

    #[test]
    fn verack_has_an_empty_body() {
        let params = NetworkParams::mainnet();
        let verack = VerackMessage::new(params, params.protocol_version(crate::params::ProtocolMilestone::Current));
        assert!(verack.bitcoin_serialize().unwrap().is_empty());
    }

    #[test]
    fn pong_echoes_the_pings_nonce() {
        let params = NetworkParams::mainnet();
        let ping = PingMessage::new(params, params.protocol_version(crate::params::ProtocolMilestone::Current));
        let pong = PongMessage::reply_to(&ping);
        assert_eq!(pong.nonce, ping.nonce);
    }

    #[test]
    fn ping_pong_bodies_round_trip() {
        let params = NetworkParams::mainnet();
        let ping = PingMessage::new(params, 70016);
        let bytes = ping.bitcoin_serialize().unwrap();
        let parsed = PingMessage::parse(params, &bytes, 0, 70016).unwrap();
        assert_eq!(parsed.nonce, ping.nonce);
    }
}
