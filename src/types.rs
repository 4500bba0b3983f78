use crate::actor_system::{Message, SystemEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Correlation token linking a request to its reply or timeout.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mints request ids from a monotonic counter, starting at 1.
#[derive(Debug, Default)]
pub struct RequestIdGenerator {
    last: u64,
}

impl RequestIdGenerator {
    pub fn next_id(&mut self) -> RequestId {
        self.last += 1;
        RequestId(self.last)
    }

    /// Highest id minted so far, if any.
    pub fn last_issued(&self) -> Option<RequestId> {
        (self.last > 0).then_some(RequestId(self.last))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ping {
    pub sent_at: DateTime<Utc>,
}

impl Ping {
    pub fn now() -> Self {
        Self {
            sent_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pong {
    pub ping_sent_at: DateTime<Utc>,
    pub replied_at: DateTime<Utc>,
}

impl Pong {
    pub fn answering(ping: &Ping) -> Self {
        Self {
            ping_sent_at: ping.sent_at,
            replied_at: Utc::now(),
        }
    }
}

/// Terminal result of a request. Computed at most once per id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "payload", rename_all = "snake_case")]
pub enum Outcome {
    Success(Pong),
    Timeout,
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Success(_) => OutcomeKind::Success,
            Outcome::Timeout => OutcomeKind::Timeout,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    Timeout,
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeKind::Success => write!(f, "success"),
            OutcomeKind::Timeout => write!(f, "timeout"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RequestEnvelope {
    pub request_id: RequestId,
    pub payload: Ping,
}

impl Message for RequestEnvelope {
    type Response = ();
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReplyEnvelope {
    pub request_id: RequestId,
    pub outcome: Outcome,
}

impl ReplyEnvelope {
    pub fn success(request_id: RequestId, payload: Pong) -> Self {
        Self {
            request_id,
            outcome: Outcome::Success(payload),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeoutSignal {
    pub request_id: RequestId,
}

/// Everything the requester's mailbox accepts.
#[derive(Clone, Debug, PartialEq)]
pub enum PingerMsg {
    Reply(ReplyEnvelope),
    Timeout(TimeoutSignal),
}

impl Message for PingerMsg {
    type Response = ();
}

impl From<ReplyEnvelope> for PingerMsg {
    fn from(reply: ReplyEnvelope) -> Self {
        PingerMsg::Reply(reply)
    }
}

impl From<TimeoutSignal> for PingerMsg {
    fn from(signal: TimeoutSignal) -> Self {
        PingerMsg::Timeout(signal)
    }
}

/// A request's outcome as handed to whoever awaits the exchange.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    pub request_id: RequestId,
    pub outcome: Outcome,
    pub elapsed: Duration,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DiscardReason {
    /// The request was already resolved.
    Stale,
    /// No request with this id was ever registered.
    Unknown,
}

#[derive(Clone, Debug)]
pub enum ExchangeEvent {
    RequestSent {
        request_id: RequestId,
        responder: String,
    },
    ReplySent {
        request_id: RequestId,
    },
    ReplyWithheld {
        request_id: RequestId,
    },
    Resolved {
        request_id: RequestId,
        outcome: OutcomeKind,
        elapsed: Duration,
    },
    SignalDiscarded {
        request_id: RequestId,
        reason: DiscardReason,
    },
}

impl SystemEvent for ExchangeEvent {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic_from_one() {
        let mut ids = RequestIdGenerator::default();
        assert_eq!(ids.last_issued(), None);
        assert_eq!(ids.next_id(), RequestId::new(1));
        assert_eq!(ids.next_id(), RequestId::new(2));
        assert_eq!(ids.last_issued(), Some(RequestId::new(2)));
    }

    #[test]
    fn test_outcome_serializes_with_tag() {
        let json = serde_json::to_value(Outcome::Timeout).unwrap();
        assert_eq!(json, serde_json::json!({ "outcome": "timeout" }));
        assert_eq!(Outcome::Timeout.kind().to_string(), "timeout");
    }
}
