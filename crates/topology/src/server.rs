//! Channel-backed implementation of the connection server boundary.

use crate::traits::ConnectionServer;
use rotor_types::PeerId;
use tokio::sync::mpsc;
use tracing::warn;

/// Commands that drive the transport's connection set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionCommand {
    /// Establish and maintain a connection to the peer.
    Request(PeerId),
    /// Drop the connection to the peer.
    Release(PeerId),
}

impl ConnectionCommand {
    /// The peer the command refers to.
    pub fn peer(&self) -> &PeerId {
        match self {
            Self::Request(peer) | Self::Release(peer) => peer,
        }
    }
}

/// Handle that forwards connection intent to the transport task.
///
/// Sends never block. A closed receiver is logged and otherwise ignored so
/// topology bookkeeping stays consistent while the transport restarts.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    sender: mpsc::UnboundedSender<ConnectionCommand>,
}

impl ConnectionHandle {
    /// Create a handle over the transport task's command channel.
    pub fn new(sender: mpsc::UnboundedSender<ConnectionCommand>) -> Self {
        Self { sender }
    }

    fn send(&self, command: ConnectionCommand) {
        if let Err(e) = self.sender.send(command) {
            warn!(target: "topology::server", ?e, "transport task unreachable");
        }
    }
}

impl ConnectionServer for ConnectionHandle {
    fn request_connection(&self, peer: &PeerId) {
        self.send(ConnectionCommand::Request(peer.clone()));
    }

    fn release_connection(&self, peer: &PeerId) {
        self.send(ConnectionCommand::Release(peer.clone()));
    }
}

// support IT tests
#[cfg(any(test, feature = "test-utils"))]
impl ConnectionHandle {
    /// Handle with a fresh channel. Returns the receiving end for assertions.
    pub fn new_for_test() -> (Self, mpsc::UnboundedReceiver<ConnectionCommand>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}
