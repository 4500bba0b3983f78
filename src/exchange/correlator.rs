//! Request correlator: the single source of truth for which requests are
//! still outstanding.
//!
//! Each outstanding request owns its timer handle through a
//! [`PendingRequest`]. Removal is the linearization point of the exchange: the
//! first caller of [`Correlator::resolve_and_take`] for an id gets the entry
//! and with it the right to finalize the outcome; every later caller gets an
//! error describing why nothing was there.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;
use tokio::time::Instant;

use crate::actor_system::TimerHandle;
use crate::types::RequestId;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationError {
    /// Registering an id that is still outstanding. A usage bug.
    #[error("request {0} is already registered")]
    DuplicateRegistration(RequestId),

    /// A reply or timeout for an id that was never registered.
    #[error("request {0} was never registered")]
    UnknownCorrelationId(RequestId),

    /// A reply or timeout for an id that was already resolved.
    #[error("request {0} is already resolved")]
    StaleResolution(RequestId),
}

/// An outstanding request and the timer counting down its deadline.
#[derive(Debug)]
pub struct PendingRequest {
    timer: TimerHandle,
    registered_at: Instant,
}

impl PendingRequest {
    pub fn registered_at(&self) -> Instant {
        self.registered_at
    }

    pub fn into_timer(self) -> TimerHandle {
        self.timer
    }
}

#[derive(Debug, Default)]
pub struct Correlator {
    pending: HashMap<RequestId, PendingRequest>,
    registered: IdRanges,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `id`. The correlator owns `timer` until the id is
    /// resolved.
    ///
    /// On error the handle is dropped, which disarms the timer.
    pub fn register(&mut self, id: RequestId, timer: TimerHandle) -> Result<(), CorrelationError> {
        if self.pending.contains_key(&id) {
            return Err(CorrelationError::DuplicateRegistration(id));
        }

        self.pending.insert(
            id,
            PendingRequest {
                timer,
                registered_at: Instant::now(),
            },
        );
        self.registered.insert(id.value());
        Ok(())
    }

    /// Remove and return the entry for `id`.
    ///
    /// An absent id that was registered at some point is stale; one that never
    /// was is unknown.
    pub fn resolve_and_take(&mut self, id: RequestId) -> Result<PendingRequest, CorrelationError> {
        match self.pending.remove(&id) {
            Some(pending) => Ok(pending),
            None if self.registered.contains(id.value()) => {
                Err(CorrelationError::StaleResolution(id))
            }
            None => Err(CorrelationError::UnknownCorrelationId(id)),
        }
    }

    pub fn is_outstanding(&self, id: RequestId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Every id ever registered, kept as disjoint inclusive ranges keyed by their
/// start. Sequentially minted ids collapse into a single range.
#[derive(Debug, Default)]
struct IdRanges(BTreeMap<u64, u64>);

impl IdRanges {
    fn contains(&self, id: u64) -> bool {
        self.0
            .range(..=id)
            .next_back()
            .is_some_and(|(_, end)| id <= *end)
    }

    fn insert(&mut self, id: u64) {
        if self.contains(id) {
            return;
        }

        let mut start = id;
        let mut end = id;
        if let Some((&before, &before_end)) = self.0.range(..id).next_back() {
            if before_end.checked_add(1) == Some(id) {
                start = before;
            }
        }
        if let Some(after_end) = id.checked_add(1).and_then(|after| self.0.remove(&after)) {
            end = after_end;
        }
        self.0.insert(start, end);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.0.len()
    }
}
