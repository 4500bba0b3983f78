//! Type-erased, message-specific addresses.
//!
//! A [`Recipient`] only knows which message it accepts, not which actor sits
//! behind it. Components that merely send to a peer depend on this seam
//! instead of on a concrete `ActorRef`, so tests can hand them in-memory fakes.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::actor_system::actor::{ActorError, ActorRef, Handler, Message};
use crate::actor_system::system::SystemEvent;

/// Fire-and-forget address for messages of type `M`.
pub trait Recipient<M>: Send + Sync + 'static {
    /// Deliver `msg` without waiting for it to be handled. An error means
    /// the message was dropped.
    fn tell(&self, msg: M) -> Result<(), ActorError>;

    /// Human readable address, for logging.
    fn address(&self) -> String;
}

impl<E, A, M> Recipient<M> for ActorRef<E, A>
where
    E: SystemEvent,
    A: Handler<E, M>,
    M: Message,
{
    fn tell(&self, msg: M) -> Result<(), ActorError> {
        ActorRef::tell(self, msg)
    }

    fn address(&self) -> String {
        self.path().to_string()
    }
}

struct Adapted<M, N> {
    inner: Arc<dyn Recipient<N>>,
    _accepts: PhantomData<fn(M)>,
}

impl<M, N> Recipient<M> for Adapted<M, N>
where
    M: Into<N> + 'static,
    N: 'static,
{
    fn tell(&self, msg: M) -> Result<(), ActorError> {
        self.inner.tell(msg.into())
    }

    fn address(&self) -> String {
        self.inner.address()
    }
}

/// View a recipient of `N` as a recipient of any `M` convertible into `N`.
pub fn adapt<M, N>(inner: Arc<dyn Recipient<N>>) -> Arc<dyn Recipient<M>>
where
    M: Into<N> + 'static,
    N: 'static,
{
    Arc::new(Adapted {
        inner,
        _accepts: PhantomData,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Collect(Mutex<Vec<u64>>);

    impl Recipient<u64> for Collect {
        fn tell(&self, msg: u64) -> Result<(), ActorError> {
            self.0.lock().unwrap().push(msg);
            Ok(())
        }

        fn address(&self) -> String {
            "collect".to_string()
        }
    }

    #[test]
    fn test_adapt_converts_messages() {
        let collect = Arc::new(Collect(Mutex::new(Vec::new())));
        let narrow: Arc<dyn Recipient<u32>> = adapt::<u32, u64>(collect.clone());

        narrow.tell(7).unwrap();
        narrow.tell(9).unwrap();

        assert_eq!(*collect.0.lock().unwrap(), vec![7, 9]);
        assert_eq!(narrow.address(), "collect");
    }
}
