use std::net::SocketAddr;

use tokio::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::conversation::ConversationTopicHandler;
use crate::error::{PeerError, PeerResult};
use crate::params::NetworkParams;
use crate::wire_protocol::envelope::{self, EnvelopeOutcome};
use crate::wire_protocol::io_buffer::RecvBuffer;

pub struct NodeConnection {
    params: &'static NetworkParams,
    protocol_version: u32,
    socket: TcpStream,
}

impl NodeConnection {
    pub async fn connect(params: &'static NetworkParams, protocol_version: u32, addr: SocketAddr) -> io::Result<Self> {
        let socket = TcpStream::connect(addr).await?;
        Ok(NodeConnection { params, protocol_version, socket })
    }

    pub async fn proceed_conversation<H: ConversationTopicHandler>(&mut self, handler: H) -> PeerResult<H::Outcome> {
        let mut handler = handler;
        let initial_action = handler.initial_action();
        if let Some(message) = initial_action.message {
            log::debug!("sending {:?}", message);
            self.socket.write_all(&envelope::frame_message(message.as_message())?).await?;
        }
        if initial_action.topic_finished {
            return handler.outcome();
        }

        let mut buffer = RecvBuffer::default();

        'outer: loop {
            match self.socket.read(buffer.writable_part()).await? {
                0 => return Err(PeerError::internal("remote node hung up")),
                n => {
                    buffer.register_added_content(n);
                    log::trace!("received {n} bytes, buffer holds {}", buffer.content().len());

                    loop {
                        match envelope::next(self.params, self.protocol_version, buffer.content()) {
                            Ok(EnvelopeOutcome::Message { message, consumed }) => {
                                log::debug!("received {:?}", message);
                                buffer.discard(consumed);

                                let response = handler.on_message(message)?;
                                if let Some(reply) = response.message {
                                    log::debug!("sending {:?}", reply);
                                    self.socket.write_all(&envelope::frame_message(reply.as_message())?).await?;
                                }
                                if response.topic_finished {
                                    break 'outer;
                                }
                            }
                            Ok(EnvelopeOutcome::Invalid { command, consumed }) => {
                                log::warn!("skipping message with unknown command '{command}'");
                                buffer.discard(consumed);
                            }
                            Ok(EnvelopeOutcome::NeedMore) => break,
                            Err(err) => return Err(err),
                        }
                    }
                }
            }
        }

        handler.outcome()
    }
}
