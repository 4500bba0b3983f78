//! In-memory stand-ins for the channel and timer service.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::actor_system::{ActorError, Recipient, TimerHandle, TimerProbe, TimerService};

/// Records every message told to it. Once closed, refuses messages the way a
/// stopped actor's mailbox does.
pub struct RecordingRecipient<M> {
    name: &'static str,
    messages: Mutex<Vec<M>>,
    closed: AtomicBool,
}

impl<M: Clone> RecordingRecipient<M> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            messages: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn messages(&self) -> Vec<M> {
        self.messages.lock().unwrap().clone()
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

impl<M: Send + 'static> Recipient<M> for RecordingRecipient<M> {
    fn tell(&self, msg: M) -> Result<(), ActorError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ActorError::SendError(format!("{} is closed", self.name)));
        }
        self.messages.lock().unwrap().push(msg);
        Ok(())
    }

    fn address(&self) -> String {
        self.name.to_string()
    }
}

pub struct Armed<M> {
    pub delay: Duration,
    pub signal: M,
}

struct Entry<M> {
    target: Arc<dyn Recipient<M>>,
    delay: Duration,
    signal: M,
    probe: TimerProbe,
}

/// Timer service that fires only when told to.
pub struct ManualTimer<M> {
    entries: Mutex<Vec<Entry<M>>>,
}

impl<M: Clone + Send + 'static> ManualTimer<M> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn armed(&self) -> Vec<Armed<M>> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|entry| Armed {
                delay: entry.delay,
                signal: entry.signal.clone(),
            })
            .collect()
    }

    pub fn probe(&self, index: usize) -> TimerProbe {
        self.entries.lock().unwrap()[index].probe.clone()
    }

    /// Fire the `index`-th armed timer. Returns `false` if it was disarmed.
    pub fn fire(&self, index: usize) -> bool {
        let entries = self.entries.lock().unwrap();
        let entry = &entries[index];
        if !entry.probe.try_fire() {
            return false;
        }
        entry.target.tell(entry.signal.clone()).is_ok()
    }
}

impl<M: Clone + Send + 'static> TimerService<M> for ManualTimer<M> {
    fn arm(&self, target: Arc<dyn Recipient<M>>, delay: Duration, signal: M) -> TimerHandle {
        let (handle, probe) = TimerHandle::pair();
        self.entries.lock().unwrap().push(Entry {
            target,
            delay,
            signal,
            probe,
        });
        handle
    }
}
