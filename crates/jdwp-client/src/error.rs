use crate::codec::DecodeJdwpDataError;
use jdwp_types::ErrorConstant;
use std::fmt::{self, Display, Formatter};
use std::io;
use thiserror::Error;

/// Anything that can go wrong between issuing a command and having its reply in hand.
///
/// Only the transport variants are fatal to the session; [JdwpError::Protocol] is the VM
/// declining one command and is routinely matched on and swallowed by callers.
#[derive(Debug, Error)]
pub enum JdwpError {
    /// The socket failed underneath us
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The peer did not answer the 14-byte handshake literal
    #[error("peer did not complete the JDWP handshake")]
    HandshakeMismatch,
    /// The connection was torn down while a reply was still outstanding
    #[error("connection closed with replies outstanding")]
    Disconnected,
    /// The reply body did not decode
    #[error(transparent)]
    Decode(#[from] DecodeJdwpDataError),
    /// The VM answered the command with a non-zero error code
    #[error("{command} failed: {error}")]
    Protocol {
        command: &'static str,
        error: ProtocolError,
    },
}

impl JdwpError {
    /// The symbolic error constant, if this is a protocol error with a known code
    pub fn protocol_error(&self) -> Option<ErrorConstant> {
        match self {
            JdwpError::Protocol { error, .. } => error.constant(),
            _ => None,
        }
    }

    /// Whether this is a protocol error carrying exactly `constant`
    pub fn is_protocol(&self, constant: ErrorConstant) -> bool {
        self.protocol_error() == Some(constant)
    }
}

/// A non-zero JDWP error code from a reply header
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProtocolError(u16);

impl ProtocolError {
    pub fn new(code: u16) -> Self {
        ProtocolError(code)
    }

    /// The raw code
    pub fn code(&self) -> u16 {
        self.0
    }

    /// The symbolic constant, when the code is a known one
    pub fn constant(&self) -> Option<ErrorConstant> {
        ErrorConstant::try_from(self.0).ok()
    }
}

impl Display for ProtocolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.constant() {
            Some(constant) => write!(f, "{}", constant.name()),
            None => write!(f, "error code {}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_names() {
        assert_eq!(ProtocolError::new(34).to_string(), "TypeMismatch");
        assert_eq!(ProtocolError::new(35).to_string(), "InvalidSlot");
        assert_eq!(ProtocolError::new(9999).to_string(), "error code 9999");
    }
}
