use std::collections::HashMap;
use std::net::SocketAddr;

use inchain_net::error::PeerResult;
use inchain_net::params::NetworkParams;
use inchain_net::wire_protocol::connection::NodeConnection;
use inchain_net::wire_protocol::handshake::HandshakeInitConversationTopic;
use inchain_net::wire_protocol::node::NodeDesc;

pub struct Node {
    params: &'static NetworkParams,
    node_desc: NodeDesc,
    remote_nodes: HashMap<SocketAddr, NodeConnection>,
}

impl Node {
    pub fn new(params: &'static NetworkParams, node_desc: NodeDesc) -> Self {
        Node { params, node_desc, remote_nodes: HashMap::new() }
    }

    pub async fn connect_with(&mut self, remote_addr: SocketAddr) -> PeerResult<NodeDesc> {
        let mut connection = NodeConnection::connect(self.params, self.node_desc.protocol_version, remote_addr).await?;

        let result = connection
            .proceed_conversation(HandshakeInitConversationTopic::new(self.params, &self.node_desc, remote_addr))
            .await?;

        self.remote_nodes.insert(remote_addr, connection);

        Ok(result)
    }

    pub fn close_connection(&mut self, remote: SocketAddr) {
        // connection is closed by tokio when socket is dropped
        self.remote_nodes.remove(&remote);
    }
}
