//! Mailbox plumbing: type-erased letters that carry one message each and know
//! which `Handler` impl to invoke on delivery.

use std::marker::PhantomData;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::actor_system::{
    actor::{ActorContext, Handler, Message},
    system::SystemEvent,
};

use super::Actor;

/// A queued message, erased down to the actor it is addressed to.
#[async_trait]
pub trait Delivery<E: SystemEvent, A: Actor<E>>: Send {
    async fn deliver(&mut self, actor: &mut A, ctx: &mut ActorContext<E>);
}

pub type Letter<E, A> = Box<dyn Delivery<E, A>>;
pub type MailboxSender<E, A> = mpsc::UnboundedSender<Letter<E, A>>;
pub type MailboxReceiver<E, A> = mpsc::UnboundedReceiver<Letter<E, A>>;

pub(crate) fn mailbox<E: SystemEvent, A: Actor<E>>() -> (MailboxSender<E, A>, MailboxReceiver<E, A>) {
    mpsc::unbounded_channel()
}

pub(crate) struct Envelope<M, E, A>
where
    M: Message,
    E: SystemEvent,
    A: Handler<E, M>,
{
    // taken on delivery, so the payload is moved into the handler
    message: Option<M>,
    reply_to: Option<oneshot::Sender<M::Response>>,
    _addressee: PhantomData<fn(E, A)>,
}

impl<M, E, A> Envelope<M, E, A>
where
    M: Message,
    E: SystemEvent,
    A: Handler<E, M>,
{
    /// A message whose response is discarded.
    pub fn tell(message: M) -> Self {
        Envelope {
            message: Some(message),
            reply_to: None,
            _addressee: PhantomData,
        }
    }

    /// A message whose response is sent back on the returned receiver.
    pub fn ask(message: M) -> (Self, oneshot::Receiver<M::Response>) {
        let (reply_to, response) = oneshot::channel();
        let envelope = Envelope {
            message: Some(message),
            reply_to: Some(reply_to),
            _addressee: PhantomData,
        };
        (envelope, response)
    }
}

#[async_trait]
impl<M, E, A> Delivery<E, A> for Envelope<M, E, A>
where
    M: Message,
    E: SystemEvent,
    A: Handler<E, M>,
{
    async fn deliver(&mut self, actor: &mut A, ctx: &mut ActorContext<E>) {
        let Some(message) = self.message.take() else {
            log::error!("Letter for '{}' was delivered twice!", ctx.path);
            return;
        };

        let response = actor.handle(message, ctx).await;

        if let Some(reply_to) = self.reply_to.take() {
            if reply_to.send(response).is_err() {
                log::debug!("Asker of '{}' went away before the response", ctx.path);
            }
        }
    }
}
