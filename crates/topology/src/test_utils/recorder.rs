//! A connection server double that records every instruction.

use crate::{ConnectionCommand, ConnectionServer};
use parking_lot::Mutex;
use rotor_types::PeerId;
use std::{collections::BTreeSet, sync::Arc};

/// Records connection instructions for assertions. Clones share the log.
#[derive(Clone, Debug, Default)]
pub struct ConnectionRecorder {
    log: Arc<Mutex<Vec<ConnectionCommand>>>,
}

impl ConnectionRecorder {
    /// Every instruction received, in order.
    pub fn commands(&self) -> Vec<ConnectionCommand> {
        self.log.lock().clone()
    }

    /// Peers left connected after replaying every instruction.
    pub fn connected(&self) -> BTreeSet<PeerId> {
        let mut connected = BTreeSet::new();
        for command in self.log.lock().iter() {
            match command {
                ConnectionCommand::Request(peer) => {
                    connected.insert(peer.clone());
                }
                ConnectionCommand::Release(peer) => {
                    connected.remove(peer);
                }
            }
        }
        connected
    }

    /// Every peer a request was ever issued for.
    pub fn requested(&self) -> BTreeSet<PeerId> {
        self.log
            .lock()
            .iter()
            .filter_map(|command| match command {
                ConnectionCommand::Request(peer) => Some(peer.clone()),
                ConnectionCommand::Release(_) => None,
            })
            .collect()
    }

    /// Every peer a release was ever issued for.
    pub fn released(&self) -> BTreeSet<PeerId> {
        self.log
            .lock()
            .iter()
            .filter_map(|command| match command {
                ConnectionCommand::Release(peer) => Some(peer.clone()),
                ConnectionCommand::Request(_) => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }

    /// Forget every recorded instruction.
    pub fn clear(&self) {
        self.log.lock().clear();
    }
}

impl ConnectionServer for ConnectionRecorder {
    fn request_connection(&self, peer: &PeerId) {
        self.log.lock().push(ConnectionCommand::Request(peer.clone()));
    }

    fn release_connection(&self, peer: &PeerId) {
        self.log.lock().push(ConnectionCommand::Release(peer.clone()));
    }
}
