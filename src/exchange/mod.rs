//! Correlated request/response exchange with timeout-driven resolution.
//!
//! A [`Pinger`] sends one request to a [`Ponger`] and arms a deadline. The
//! reply and the deadline race; the [`Correlator`] makes sure exactly one of
//! them resolves the request.

pub mod coop;
mod correlator;
mod pinger;
mod policy;
mod ponger;
mod requester;

#[cfg(test)]
pub(crate) mod fakes;

use thiserror::Error;
use uuid::Uuid;

use crate::actor_system::ActorError;

pub use coop::{ExchangeReport, Tally, run_exchange};
pub use correlator::{CorrelationError, Correlator, PendingRequest};
pub use pinger::Pinger;
pub use policy::{AlwaysReply, CoinFlip, NeverReply, ReplyDecision, ReplyPolicy};
pub use ponger::Ponger;
pub use requester::Requester;

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Failed to launch exchange actors: {0}")]
    Launch(#[from] ActorError),

    #[error("Exchange {0} ended without an outcome")]
    Abandoned(Uuid),
}
