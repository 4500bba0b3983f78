//! Tiny tokio actor runtime.
//!
//! Actors with sequential mailboxes, a common event bus, addressable
//! recipients and cancellable timers. Provides request/response patterns via
//! `tell` (fire-and-forget) and `ask` (with response).

mod actor;
mod bus;
mod recipient;
mod system;
mod timer;

pub use actor::{
    Actor, ActorContext, ActorError, ActorPath, ActorRef, Handler, Message,
    supervision::{
        ExponentialBackoffStrategy, FixedIntervalStrategy, NoIntervalStrategy, RetryStrategy,
        SupervisionStrategy,
    },
};

pub use bus::{EventBus, EventReceiver};
pub use recipient::{Recipient, adapt};
pub use system::{ActorSlot, ActorSystem, SystemEvent};
pub use timer::{TimerHandle, TimerId, TimerProbe, TimerService, TokioTimer};

pub use async_trait::async_trait;
