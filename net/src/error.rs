use thiserror::Error;

pub type PeerResult<T> = Result<T, PeerError>;

/// Error taxonomy for the wire protocol layer.
///
/// Callers match on the variant to decide what to do with a failure:
/// `Protocol`/`Envelope` errors are grounds to drop the offending message (or
/// disconnect the peer); `Internal` is not expected to be recoverable.
#[derive(Debug, Error)]
pub enum PeerError {
    /// A well-formed byte stream violates the message format: short read,
    /// bad field value, unsupported protocol version.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Envelope framing failed: magic mismatch, length over the configured
    /// cap, or checksum mismatch. Carries the offending command name when
    /// one was already parsed off the wire.
    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    /// The byte source/sink failed independently of message content.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A host invariant was violated. Not expected to be recoverable.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PeerError {
    pub fn protocol(msg: impl Into<String>) -> Self {
        PeerError::Protocol(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        PeerError::Internal(msg.into())
    }
}

impl From<String> for PeerError {
    fn from(msg: String) -> Self {
        PeerError::Protocol(msg)
    }
}

impl From<&str> for PeerError {
    fn from(msg: &str) -> Self {
        PeerError::Protocol(msg.to_string())
    }
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("magic mismatch: expected {expected:#010x}, got {got:#010x}")]
    MagicMismatch { expected: u32, got: u32 },

    #[error("payload length {len} exceeds cap of {max} bytes")]
    PayloadTooLarge { len: u32, max: u32 },

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("'{0}' does not name a known command")]
    UnknownCommand(String),
}
