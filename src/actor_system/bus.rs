//! Event bus shared by all actors of a system.

use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::actor_system::system::SystemEvent;

pub type EventReceiver<E> = broadcast::Receiver<E>;

/// Broadcast bus for system events. Every subscriber sees every event
/// published after it subscribed.
#[derive(Debug, Clone)]
pub struct EventBus<E: SystemEvent> {
    sender: broadcast::Sender<E>,
}

impl<E: SystemEvent> EventBus<E> {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        EventBus { sender }
    }

    /// Publish an event, returning the number of subscribers that received it.
    pub fn send(&self, event: E) -> Result<usize, broadcast::error::SendError<E>> {
        self.sender.send(event)
    }

    pub fn subscribe(&self) -> EventReceiver<E> {
        self.sender.subscribe()
    }

    /// Subscribe as a stream. Lagged receivers yield an error item instead of
    /// silently skipping events.
    pub fn stream(&self) -> BroadcastStream<E> {
        BroadcastStream::new(self.sender.subscribe())
    }
}
