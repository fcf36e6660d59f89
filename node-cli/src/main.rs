use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use tokio::time::{timeout, Duration};

use inchain_net::params::NetworkParams;
use inchain_net::wire_protocol::node::NodeDesc;

use crate::node::Node;

mod node;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum NetworkArg {
    Mainnet,
    Testnet,
}

impl NetworkArg {
    fn params(self) -> &'static NetworkParams {
        match self {
            NetworkArg::Mainnet => NetworkParams::mainnet(),
            NetworkArg::Testnet => NetworkParams::testnet(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Remote peer socket address, e.g. 127.0.0.1:18445 for a local regtest node
    #[arg(short, long)]
    remote: SocketAddr,

    /// Which network's magic value and protocol version table to speak
    #[arg(short, long, value_enum, default_value_t = NetworkArg::Mainnet)]
    network: NetworkArg,
}

fn init_logging() {
    SimpleLogger::new()
        .with_colors(true)
        .with_level(LevelFilter::Debug)
        .with_local_timestamps()
        .init()
        .unwrap();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();
    let params = args.network.params();

    // We don't know our own externally-visible address; bitcoin peers tolerate
    // an unroutable addr_from in a version message, it's informational only.
    let unknown_self_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0);
    let me = NodeDesc::new(params, concat!("/inchain:", env!("CARGO_PKG_VERSION"), "/"), unknown_self_addr);
    let mut node = Node::new(params, me);

    let handshake_timeout = Duration::from_secs(5);
    match timeout(handshake_timeout, node.connect_with(args.remote)).await {
        Ok(Ok(node_desc)) => {
            log::info!("connection + handshake to node @ {} successfully established", args.remote);
            log::debug!("remote node details: {:?}", node_desc);
            node.close_connection(args.remote);
            ExitCode::SUCCESS
        }
        Ok(Err(err)) => {
            log::warn!("error while communicating with {}: {}", args.remote, err);
            ExitCode::FAILURE
        }
        Err(_) => {
            log::warn!("handshake timeout");
            ExitCode::FAILURE
        }
    }
}
