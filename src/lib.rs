//! Ping-pong over a tiny tokio actor system.
//!
//! A requester sends a correlated request to a responder that may or may not
//! answer. Every request resolves exactly once, to either the reply or a
//! timeout, no matter how the reply and the deadline race.

pub mod actor_system;
pub mod config;
pub mod exchange;
pub mod types;
