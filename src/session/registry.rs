use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc;

use super::Notification;

/// Opaque session identifier handed to the client in `connection_ack`.
pub type SessionId = String;

/// Channel sender half for pushing notifications to one session.
pub type SessionSender = mpsc::UnboundedSender<Notification>;

/// Maps session ids to live notification channels.
///
/// Internally synchronized; share it as `Arc<SessionRegistry>`. Each session has a
/// single FIFO channel, so notifications sent to one session arrive in the order
/// they were sent.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, SessionSender>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session and queue its `connection_ack`.
    ///
    /// Returns the id and the receiver the connection task drains.
    pub fn register(&self) -> (SessionId, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        loop {
            let id = uuid::Uuid::new_v4().to_string();
            if let Entry::Vacant(slot) = self.sessions.entry(id.clone()) {
                let _ = tx.send(Notification::ConnectionAck { session_id: id.clone() });
                // release the shard lock before len() walks the shards
                drop(slot.insert(tx));
                log::debug!("Session {} registered ({} active)", id, self.sessions.len());
                return (id, rx);
            }
        }
    }

    /// Push a notification. Unknown ids and closed channels are ignored.
    pub fn send(&self, session_id: &str, notification: Notification) {
        let Some(sender) = self.sessions.get(session_id) else {
            log::trace!("Dropping notification for unknown session {}", session_id);
            return;
        };
        if sender.send(notification).is_err() {
            log::debug!("Session {} channel closed", session_id);
        }
    }

    pub fn unregister(&self, session_id: &str) {
        if self.sessions.remove(session_id).is_some() {
            log::debug!("Session {} unregistered", session_id);
        }
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
