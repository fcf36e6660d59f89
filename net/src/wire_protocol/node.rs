use std::net::SocketAddr;
use std::ops::BitOr;

use strum::{EnumIter, IntoEnumIterator};

use crate::params::NetworkParams;

/// This node's own identity, sent to a peer in a `version` message.
#[derive(Clone, Debug)]
pub struct NodeDesc {
    pub protocol_version: u32,
    pub services: NodeServiceSet,
    pub user_agent: String,
    pub start_height: i32,
    /// The address this node believes a peer would use to reach it back.
    pub addr_from: SocketAddr,
}

impl NodeDesc {
    pub fn new(params: &'static NetworkParams, user_agent: impl Into<String>, addr_from: SocketAddr) -> Self {
        NodeDesc {
            protocol_version: params.protocol_version(crate::params::ProtocolMilestone::Current),
            services: NodeServiceSet(vec![NodeService::Network]),
            user_agent: user_agent.into(),
            start_height: 0,
            addr_from,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeServiceSet(pub Vec<NodeService>);

impl NodeServiceSet {
    pub fn as_bitmask(&self) -> u64 {
        self.0.iter().fold(0_u64, |acc, bit| acc.bitor(bit.as_u64()))
    }

    pub fn from_bitmask(mask: u64) -> Self {
        let services = NodeService::iter().filter(|bit| mask & bit.as_u64() != 0).collect();
        NodeServiceSet(services)
    }

    pub fn has(&self, service: NodeService) -> bool {
        self.0.contains(&service)
    }
}

/// <https://en.bitcoin.it/wiki/Protocol_documentation#version>'s `services` bitfield.
#[derive(Copy, Clone, Debug, PartialEq, EnumIter)]
#[repr(u64)]
pub enum NodeService {
    Network = 0x1,
    GetUtxo = 0x2,
    Bloom = 0x4,
    Witness = 0x8,
    NetworkLimited = 0x400,
}

impl NodeService {
    pub fn as_u64(self) -> u64 {
        self as u64
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bitmask_round_trips_through_a_service_set() {
        let set = NodeServiceSet(vec![NodeService::Network, NodeService::Witness]);
        let mask = set.as_bitmask();
        assert_eq!(mask, 0x1 | 0x8);
        assert_eq!(NodeServiceSet::from_bitmask(mask), set);
    }

    #[test]
    fn empty_service_set_has_a_zero_bitmask() {
        assert_eq!(NodeServiceSet(vec![]).as_bitmask(), 0);
    }
}
