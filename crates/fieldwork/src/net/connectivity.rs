//! Device connectivity signal.

use std::sync::Arc;

use tokio::sync::watch;

/// Shared online/offline flag.
///
/// Cloning is cheap; every clone observes the same state. Subscribers see
/// each transition through a `watch` receiver.
#[derive(Clone)]
pub struct Connectivity {
    tx: Arc<watch::Sender<bool>>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Updates the flag. Subscribers are only woken on an actual change.
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });
        if changed {
            if online {
                log::info!("Connectivity restored");
            } else {
                log::info!("Connectivity lost");
            }
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}
