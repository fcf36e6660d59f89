use std::ascii;

use strum::{EnumIter, IntoEnumIterator};

use crate::error::{EnvelopeError, PeerError, PeerResult};

/// The 12-byte, NUL-padded ASCII command name that identifies a message's
/// body within an envelope.
#[derive(Copy, Clone, Debug, Eq, PartialEq, EnumIter)]
pub enum Command {
    Version,
    Verack,
    Ping,
    Pong,
    Addr,
}

impl Command {
    pub fn as_bytes(&self) -> &'static [u8; 12] {
        match self {
            Command::Version => b"version\0\0\0\0\0",
            Command::Verack => b"verack\0\0\0\0\0\0",
            Command::Ping => b"ping\0\0\0\0\0\0\0\0",
            Command::Pong => b"pong\0\0\0\0\0\0\0\0",
            Command::Addr => b"addr\0\0\0\0\0\0\0\0",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Version => "version",
            Command::Verack => "verack",
            Command::Ping => "ping",
            Command::Pong => "pong",
            Command::Addr => "addr",
        }
    }
}

impl TryFrom<&[u8]> for Command {
    type Error = PeerError;

    fn try_from(value: &[u8]) -> PeerResult<Self> {
        for command in Command::iter() {
            if command.as_bytes().as_slice() == value {
                return Ok(command);
            }
        }
        Err(PeerError::Envelope(EnvelopeError::UnknownCommand(
            format_command_bytes(value),
        )))
    }
}

/// Escapes raw command bytes for display/logging when they don't match any
/// known [`Command`] (e.g. in an [`super::envelope::EnvelopeOutcome::Invalid`]).
pub(crate) fn format_command_bytes(bytes: &[u8]) -> String {
    let mut result = String::new();
    for &c in bytes {
        result.push_str(
            std::str::from_utf8(&ascii::escape_default(c).collect::<Vec<u8>>()).unwrap(),
        );
    }
    result
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn every_command_round_trips_through_its_bytes() {
        for command in Command::iter() {
            assert_eq!(Command::try_from(command.as_bytes().as_slice()).unwrap(), command);
        }
    }

    #[test]
    fn unknown_command_is_an_envelope_error() {
        let err = Command::try_from(b"bogus\0\0\0\0\0\0\0".as_slice()).unwrap_err();
        assert!(matches!(
            err,
            PeerError::Envelope(EnvelopeError::UnknownCommand(_))
        ));
    }
}
