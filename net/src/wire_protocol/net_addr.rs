use std::net::Ipv6Addr;

use crate::bytes::{write_uint16_be, write_uint64_le, ParseContext};
use crate::error::PeerResult;

/// Reads the 26-byte `net_addr` shape used inside `version` messages:
/// services(8) + ipv6-mapped address(16) + port(2, big-endian) — the same
/// layout as [`crate::wire_protocol::peer_address::PeerAddress`] minus its
/// leading 4-byte `time` field.
pub fn read_net_addr_notime(ctx: &mut ParseContext) -> PeerResult<(u64, Ipv6Addr, u16)> {
    let services = ctx.read_uint64_le()?;
    let addr_bytes: [u8; 16] = ctx
        .read_bytes(16)?
        .try_into()
        .expect("read_bytes(16) guarantees exactly 16 bytes");
    let addr = Ipv6Addr::from(addr_bytes);
    let port = ctx.read_uint16_be()?;
    Ok((services, addr, port))
}

pub fn write_net_addr_notime(services: u64, addr: Ipv6Addr, port: u16, out: &mut Vec<u8>) {
    write_uint64_le(services, out);
    out.extend_from_slice(&addr.octets());
    write_uint16_be(port, out);
}
