use std::net::SocketAddr;

use crate::conversation::{ConversationAction, ConversationTopicHandler};
use crate::error::{PeerError, PeerResult};
use crate::params::NetworkParams;
use crate::wire_protocol::messages::{PongMessage, ProtocolMessage, VerackMessage, VersionMessage};
use crate::wire_protocol::node::NodeDesc;

/// Handshake:
///
/// NodeA <---> NodeB
///    __version__ message, replied by __verack__ message (both)
///
/// - create TCP connection
/// - send __version__ message
/// - expect __verack__ message
/// - expect __version__ message
/// - respond with __verack__ message
/// => connected
///
/// After the handshake is complete, this handler keeps answering `ping` with
/// `pong` for the rest of the connection's lifetime rather than finishing —
/// callers that only care about completing the handshake should stop reading
/// once [`ConversationAction::topic_finished`] is `true`.
pub struct HandshakeInitConversationTopic {
    params: &'static NetworkParams,
    me: NodeDesc,
    remote_addr: SocketAddr,
    version_msg_sent: bool,
    version_ack_msg_received: bool,
    version_msg_received: Option<VersionMessage>,
}

impl HandshakeInitConversationTopic {
    pub fn new(params: &'static NetworkParams, me: &NodeDesc, remote_addr: SocketAddr) -> Self {
        HandshakeInitConversationTopic {
            params,
            me: me.clone(),
            remote_addr,
            version_msg_sent: false,
            version_ack_msg_received: false,
            version_msg_received: None,
        }
    }

    fn handshake_complete(&self) -> bool {
        self.version_msg_sent && self.version_ack_msg_received && self.version_msg_received.is_some()
    }
}

impl ConversationTopicHandler for HandshakeInitConversationTopic {
    type Outcome = NodeDesc;

    fn initial_action(&mut self) -> ConversationAction {
        let message = ProtocolMessage::Version(VersionMessage::new(self.params, self.remote_addr, &self.me));
        self.version_msg_sent = true;
        ConversationAction { message: Some(message), topic_finished: false }
    }

    fn on_message(&mut self, message: ProtocolMessage) -> PeerResult<ConversationAction> {
        match message {
            ProtocolMessage::Version(m) => {
                self.version_msg_received = Some(m);
                let reply = ProtocolMessage::Verack(VerackMessage::new(self.params, self.me.protocol_version));
                Ok(ConversationAction { message: Some(reply), topic_finished: self.handshake_complete() })
            }
            ProtocolMessage::Verack(_) => {
                self.version_ack_msg_received = true;
                if !self.version_msg_sent {
                    Err(PeerError::protocol("received a 'verack', but no 'version' was sent yet"))
                } else {
                    Ok(ConversationAction { message: None, topic_finished: self.handshake_complete() })
                }
            }
            ProtocolMessage::Ping(ping) => {
                Ok(ConversationAction { message: Some(ProtocolMessage::Pong(PongMessage::reply_to(&ping))), topic_finished: false })
            }
            ProtocolMessage::Pong(_) => Ok(ConversationAction::nop()),
            ProtocolMessage::Addr(_) => Ok(ConversationAction::nop()),
        }
    }

    fn outcome(self) -> PeerResult<NodeDesc> {
        match self.version_msg_received {
            None => Err(PeerError::protocol("should have a version message from the remote node")),
            Some(msg) => Ok(NodeDesc {
                protocol_version: msg.version as u32,
                services: msg.services.clone(),
                user_agent: msg.user_agent.clone(),
                start_height: msg.start_height,
                addr_from: self.me.addr_from,
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    fn node_desc(params: &'static NetworkParams) -> NodeDesc {
        NodeDesc::new(params, "/inchain:0.1.0/", SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), params.default_port()))
    }

    #[test]
    fn handshake_completes_after_version_and_verack_are_both_seen() {
        let params = NetworkParams::mainnet();
        let me = node_desc(params);
        let remote = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9)), params.default_port());
        let mut topic = HandshakeInitConversationTopic::new(params, &me, remote);

        let initial = topic.initial_action();
        assert!(matches!(initial.message, Some(ProtocolMessage::Version(_))));
        assert!(!initial.topic_finished);

        let their_version = VersionMessage::new(params, remote, &me);
        let after_version = topic.on_message(ProtocolMessage::Version(their_version)).unwrap();
        assert!(matches!(after_version.message, Some(ProtocolMessage::Verack(_))));
        assert!(!after_version.topic_finished);

        let after_verack =
            topic.on_message(ProtocolMessage::Verack(VerackMessage::new(params, me.protocol_version))).unwrap();
        assert!(after_verack.topic_finished);

        assert!(topic.outcome().is_ok());
    }

    #[test]
    fn early_verack_without_a_sent_version_is_a_protocol_error() {
        let params = NetworkParams::mainnet();
        let me = node_desc(params);
        let remote = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9)), params.default_port());
        let mut topic = HandshakeInitConversationTopic::new(params, &me, remote);
        topic.version_msg_sent = false;

        let err = topic
            .on_message(ProtocolMessage::Verack(VerackMessage::new(params, me.protocol_version)))
            .unwrap_err();
        assert!(matches!(err, PeerError::Protocol(_)));
    }
}
