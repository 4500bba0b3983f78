//! Reply decisions for the responder.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::types::RequestEnvelope;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReplyDecision {
    Reply,
    Silence,
}

/// Decides, per request, whether the responder answers at all.
pub trait ReplyPolicy: Send + Sync + 'static {
    fn decide(&mut self, request: &RequestEnvelope) -> ReplyDecision;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysReply;

impl ReplyPolicy for AlwaysReply {
    fn decide(&mut self, _request: &RequestEnvelope) -> ReplyDecision {
        ReplyDecision::Reply
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NeverReply;

impl ReplyPolicy for NeverReply {
    fn decide(&mut self, _request: &RequestEnvelope) -> ReplyDecision {
        ReplyDecision::Silence
    }
}

/// Replies when a uniform roll in `[0, 1)` lands above `threshold`.
#[derive(Debug)]
pub struct CoinFlip {
    threshold: f64,
    rng: StdRng,
}

impl CoinFlip {
    pub fn new(threshold: f64) -> Self {
        Self::with_rng(threshold, StdRng::from_os_rng())
    }

    pub fn with_rng(threshold: f64, rng: StdRng) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            rng,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl ReplyPolicy for CoinFlip {
    fn decide(&mut self, request: &RequestEnvelope) -> ReplyDecision {
        let roll: f64 = self.rng.random();
        log::debug!(
            "Roll for request {}: {:.3} (threshold {:.3})",
            request.request_id,
            roll,
            self.threshold
        );
        if roll > self.threshold {
            ReplyDecision::Reply
        } else {
            ReplyDecision::Silence
        }
    }
}
