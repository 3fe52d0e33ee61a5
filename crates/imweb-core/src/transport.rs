//! Outbound transport seam.
//!
//! The frame loop sends commands through a [`CommandSink`]. The server crate
//! implements it over an axum websocket; tests implement it in memory.
//! Send failures are classified into disconnects, which end the session,
//! and everything else, which the frame loop logs and survives.

use std::error::Error as StdError;
use std::future::Future;
use std::io;

use imweb_types::Command;

/// Message fragments that identify a closed peer when no I/O error kind is
/// available in the source chain.
const DISCONNECT_MARKERS: &[&str] = &["broken pipe", "connection closed", "closed connection"];

/// Errors raised while sending a command.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer is gone. Fatal to the session.
    #[error("peer disconnected: {0}")]
    Disconnected(String),

    /// The command could not be serialized.
    #[error("failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),

    /// Any other send failure.
    #[error("send failed: {0}")]
    Send(String),
}

impl TransportError {
    /// Whether this error ends the session.
    pub const fn is_disconnect(&self) -> bool {
        matches!(self, Self::Disconnected(_))
    }

    /// Classify a transport-level send error by walking its source chain.
    ///
    /// Broken-pipe style I/O errors and closed-connection messages are
    /// disconnects; anything else is a [`TransportError::Send`].
    pub fn classify(err: &(dyn StdError + 'static)) -> Self {
        let message = err.to_string();
        let mut current: Option<&(dyn StdError + 'static)> = Some(err);
        while let Some(e) = current {
            if let Some(io_err) = e.downcast_ref::<io::Error>() {
                if is_disconnect_kind(io_err.kind()) {
                    return Self::Disconnected(message);
                }
            }
            let text = e.to_string().to_lowercase();
            if DISCONNECT_MARKERS.iter().any(|marker| text.contains(marker)) {
                return Self::Disconnected(message);
            }
            current = e.source();
        }
        Self::Send(message)
    }
}

const fn is_disconnect_kind(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
    )
}

/// Outbound half of a session's connection.
pub trait CommandSink: Send {
    /// Encode and send one command.
    fn send(
        &mut self,
        command: &Command,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("websocket write failed")]
    struct Wrapped(#[source] io::Error);

    #[test]
    fn broken_pipe_is_a_disconnect() {
        let err = io::Error::new(io::ErrorKind::BrokenPipe, "os error 32");
        assert!(TransportError::classify(&err).is_disconnect());
    }

    #[test]
    fn disconnect_is_found_in_source_chain() {
        let err = Wrapped(io::Error::from(io::ErrorKind::ConnectionReset));
        let classified = TransportError::classify(&err);
        assert!(classified.is_disconnect());
        assert!(classified.to_string().contains("websocket write failed"));
    }

    #[test]
    fn closed_connection_message_is_a_disconnect() {
        let err = io::Error::other("Trying to work with closed connection");
        assert!(TransportError::classify(&err).is_disconnect());
    }

    #[test]
    fn other_errors_are_soft() {
        let err = io::Error::new(io::ErrorKind::InvalidData, "frame too large");
        let classified = TransportError::classify(&err);
        assert!(!classified.is_disconnect());
        assert!(matches!(classified, TransportError::Send(_)));
    }
}
