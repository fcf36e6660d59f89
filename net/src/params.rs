/// A symbolic milestone in the protocol-version history, used to look up
/// the numeric protocol version a feature requires.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ProtocolMilestone {
    /// The version this node speaks by default.
    Current,
    /// The oldest version this node still accepts from a peer.
    Minimum,
    /// The version from which `filterload`/`filteradd`/`filterclear` are valid (BIP 37).
    BloomFilter,
    /// The version from which segregated witness transaction relay is valid.
    Witness,
}

#[derive(Copy, Clone, Debug)]
struct ProtocolVersions {
    current: u32,
    minimum: u32,
    bloom_filter: u32,
    witness: u32,
}

impl ProtocolVersions {
    const fn get(&self, milestone: ProtocolMilestone) -> u32 {
        match milestone {
            ProtocolMilestone::Current => self.current,
            ProtocolMilestone::Minimum => self.minimum,
            ProtocolMilestone::BloomFilter => self.bloom_filter,
            ProtocolMilestone::Witness => self.witness,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Network {
    Main,
    Test,
}

/// Immutable, per-process description of a network: its magic bytes, default
/// port, and protocol version table. Two canonical instances exist,
/// [`NetworkParams::mainnet`] and [`NetworkParams::testnet`]; a process picks
/// one at startup and never changes it.
#[derive(Copy, Clone, Debug)]
pub struct NetworkParams {
    network: Network,
    magic: u32,
    default_port: u16,
    versions: ProtocolVersions,
}

const MAINNET: NetworkParams = NetworkParams {
    network: Network::Main,
    magic: 0xD9B4_BEF9,
    default_port: 8333,
    versions: ProtocolVersions {
        current: 70016,
        minimum: 31800,
        bloom_filter: 70001,
        witness: 70012,
    },
};

const TESTNET: NetworkParams = NetworkParams {
    network: Network::Test,
    magic: 0x0709_110B,
    default_port: 18333,
    versions: ProtocolVersions {
        current: 70016,
        minimum: 31800,
        bloom_filter: 70001,
        witness: 70012,
    },
};

impl NetworkParams {
    pub const fn mainnet() -> &'static NetworkParams {
        &MAINNET
    }

    pub const fn testnet() -> &'static NetworkParams {
        &TESTNET
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn magic(&self) -> u32 {
        self.magic
    }

    pub fn default_port(&self) -> u16 {
        self.default_port
    }

    pub fn protocol_version(&self, milestone: ProtocolMilestone) -> u32 {
        self.versions.get(milestone)
    }

    pub fn for_magic(magic: u32) -> Option<&'static NetworkParams> {
        [Self::mainnet(), Self::testnet()]
            .into_iter()
            .find(|p| p.magic == magic)
    }
}
