use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use sha2::{Digest, Sha256};

use crate::bytes::{current_time_seconds, write_uint16_be, write_uint32_le, write_uint64_le, ParseContext};
use crate::error::{PeerError, PeerResult};
use crate::params::{NetworkParams, ProtocolMilestone};
use crate::wire_protocol::command::Command;
use crate::wire_protocol::message::{Message, MessageHeader};

/// Size of a `PeerAddress` on the wire, in bytes.
pub const MESSAGE_SIZE: usize = 30;

/// OnionCat's IPv6 prefix (`fd87:d87e:eb43::/48`), reused here only as a
/// deterministic, non-routable placeholder for onion peers that have no real
/// IP address — see [`PeerAddress::wire_address`].
const ONIONCAT_PREFIX: [u8; 6] = [0xFD, 0x87, 0xD8, 0x7E, 0xEB, 0x43];

/// The address record exchanged in `addr`/`version` traffic.
///
/// Wire layout, exactly 30 bytes:
/// ```text
///  0..4    uint32 LE  time
///  4..12   uint64 LE  services
/// 12..28   16 bytes   ipv6-form address (IPv4-mapped)
/// 28..30   uint16 BE  port
/// ```
/// Every integer here is little-endian except `port`, which is network byte
/// order. `time` is also special: it is refreshed from the wall clock on
/// every send, never written from the stored field — see
/// [`PeerAddress::serialize_body_at`].
#[derive(Clone, Debug)]
pub struct PeerAddress {
    header: MessageHeader,
    pub time: u32,
    pub services: u64,
    pub addr: Option<Ipv6Addr>,
    pub hostname: Option<String>,
    pub port: u16,
}

impl PeerAddress {
    pub fn from_ip_port_version(
        params: &'static NetworkParams,
        addr: IpAddr,
        port: u16,
        protocol_version: u32,
    ) -> Self {
        PeerAddress {
            header: MessageHeader::in_memory(params, protocol_version, MESSAGE_SIZE),
            time: 0,
            services: 1,
            addr: Some(to_wire_ipv6(addr)),
            hostname: None,
            port,
        }
    }

    pub fn from_ip_port(params: &'static NetworkParams, addr: IpAddr, port: u16) -> Self {
        Self::from_ip_port_version(
            params,
            addr,
            port,
            params.protocol_version(ProtocolMilestone::Current),
        )
    }

    /// Constructs a `PeerAddress` from an IP alone. Per the historical
    /// `CAddress` convention this carries, the port defaults to *mainnet's*
    /// default port regardless of which network `params` describes.
    pub fn from_ip(params: &'static NetworkParams, addr: IpAddr) -> Self {
        Self::from_ip_port(params, addr, NetworkParams::mainnet().default_port())
    }

    pub fn from_socket_addr(params: &'static NetworkParams, socket: SocketAddr) -> Self {
        Self::from_ip_port(params, socket.ip(), socket.port())
    }

    /// Constructs a `PeerAddress` for a Tor `.onion` peer. `addr` is absent
    /// and `services` defaults to `0`, matching the convention that a
    /// gossiped onion address carries no verified service bits until a
    /// handshake has happened.
    pub fn from_hostname(params: &'static NetworkParams, hostname: impl Into<String>, port: u16) -> Self {
        PeerAddress {
            header: MessageHeader::in_memory(
                params,
                params.protocol_version(ProtocolMilestone::Current),
                MESSAGE_SIZE,
            ),
            time: 0,
            services: 0,
            addr: None,
            hostname: Some(hostname.into()),
            port,
        }
    }

    pub fn localhost(params: &'static NetworkParams) -> Self {
        Self::from_ip_port(
            params,
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            params.default_port(),
        )
    }

    pub fn parse(
        params: &'static NetworkParams,
        payload: &[u8],
        offset: usize,
        protocol_version: u32,
    ) -> PeerResult<Self> {
        let mut ctx = ParseContext::new(payload, offset);

        let time = ctx.read_uint32_le()?;
        let services = ctx.read_uint64_le()?;
        let addr_bytes: [u8; 16] = ctx
            .read_bytes(16)?
            .try_into()
            .expect("read_bytes(16) guarantees exactly 16 bytes");
        let addr = Ipv6Addr::from(addr_bytes);
        let port = ctx.read_uint16_be()?;
        let length = ctx.position() - offset;

        Ok(PeerAddress {
            header: MessageHeader {
                params,
                offset,
                length,
                protocol_version,
            },
            time,
            services,
            addr: Some(addr),
            hostname: None,
            port,
        })
    }

    pub fn set_time(&mut self, time: u32) {
        self.time = time;
    }

    pub fn set_services(&mut self, services: u64) {
        self.services = services;
    }

    pub fn set_addr(&mut self, addr: IpAddr) {
        self.addr = Some(to_wire_ipv6(addr));
        self.hostname = None;
    }

    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    /// Resolves the 16 bytes this address writes on the wire: the stored
    /// `addr` if present, otherwise a synthetic OnionCat-shaped placeholder
    /// derived from `hostname`. The placeholder is deterministic but not a
    /// real routable address — see the module docs' open-question note.
    fn wire_address(&self) -> PeerResult<Ipv6Addr> {
        if let Some(addr) = self.addr {
            return Ok(addr);
        }
        if let Some(host) = &self.hostname {
            return Ok(synthesize_onion_address(host));
        }
        Err(PeerError::protocol(
            "PeerAddress has neither an IP address nor a hostname to serialize",
        ))
    }

    /// Serializes with an explicitly supplied "now" instead of reading the
    /// wall clock, so tests can pin the refresh-on-send `time` field.
    pub fn serialize_body_at(&self, now_seconds: u32, out: &mut Vec<u8>) -> PeerResult<()> {
        write_uint32_le(now_seconds, out);
        write_uint64_le(self.services, out);
        out.extend_from_slice(&self.wire_address()?.octets());
        write_uint16_be(self.port, out);
        Ok(())
    }
}

fn to_wire_ipv6(addr: IpAddr) -> Ipv6Addr {
    match addr {
        IpAddr::V4(v4) => v4.to_ipv6_mapped(),
        IpAddr::V6(v6) => v6,
    }
}

fn synthesize_onion_address(hostname: &str) -> Ipv6Addr {
    let digest = Sha256::digest(hostname.as_bytes());
    let mut octets = [0u8; 16];
    octets[..6].copy_from_slice(&ONIONCAT_PREFIX);
    octets[6..].copy_from_slice(&digest[..10]);
    Ipv6Addr::from(octets)
}

impl Message for PeerAddress {
    fn command(&self) -> Command {
        Command::Addr
    }

    fn header(&self) -> &MessageHeader {
        &self.header
    }

    fn serialize_body(&self, out: &mut Vec<u8>) -> PeerResult<()> {
        self.serialize_body_at(current_time_seconds(), out)
    }
}

/// Structural equality on `(addr, port, time, services)`, matching the
/// original Bitcoin-family behavior: `hostname` does not participate, and
/// because `time`/`services` are part of the key, the same peer can appear
/// more than once in a set as its advertisement refreshes.
impl PartialEq for PeerAddress {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
            && self.port == other.port
            && self.time == other.time
            && self.services == other.services
    }
}

impl Eq for PeerAddress {}

impl Hash for PeerAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr.hash(state);
        self.port.hash(state);
        self.time.hash(state);
        self.services.hash(state);
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(host) = &self.hostname {
            write!(f, "[{}]:{}", host, self.port)
        } else if let Some(addr) = self.addr {
            match addr.to_ipv4_mapped() {
                Some(v4) => write!(f, "{}:{}", v4, self.port),
                None => write!(f, "[{}]:{}", addr, self.port),
            }
        } else {
            write!(f, "[unknown]:{}", self.port)
        }
    }
}
