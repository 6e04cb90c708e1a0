use futures_channel::mpsc::UnboundedSender;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tungstenite::protocol::Message;

pub type Tx = UnboundedSender<Message>;

/// The outbound half of the connection session, as seen by the round driver.
pub trait PeerLink {
    /// Fire-and-forget: success only means the payload was queued for the peer.
    fn send(&self, payload: Vec<u8>) -> Result<(), SendError>;
    fn connected_peer_count(&self) -> usize;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum SendError {
    #[error("no peer is connected")]
    NotConnected,
    #[error("the connection writer has gone away")]
    ChannelClosed,
}

/// Holds the writer of the one connected peer, if any. Clones share the same slot.
#[derive(Clone, Default)]
pub struct PeerSlot {
    tx: Arc<Mutex<Option<Tx>>>,
}

impl PeerSlot {
    pub fn new() -> Self {
        PeerSlot::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Tx>> {
        self.tx.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns false if another peer already occupies the slot.
    pub fn attach(&self, tx: Tx) -> bool {
        let mut slot = self.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(tx);
        true
    }

    /// Empties the slot, but only if it still holds `tx`.
    pub fn detach(&self, tx: &Tx) {
        let mut slot = self.lock();
        if slot.as_ref().map_or(false, |current| current.same_receiver(tx)) {
            *slot = None;
        }
    }
}

impl PeerLink for PeerSlot {
    fn send(&self, payload: Vec<u8>) -> Result<(), SendError> {
        match &*self.lock() {
            Some(tx) => tx
                .unbounded_send(Message::Binary(payload))
                .map_err(|_| SendError::ChannelClosed),
            None => Err(SendError::NotConnected),
        }
    }

    fn connected_peer_count(&self) -> usize {
        usize::from(self.lock().is_some())
    }
}
