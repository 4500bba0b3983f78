//! Actor module - core actor types and traits.

pub(crate) mod handler;
pub(crate) mod runner;
pub mod supervision;

use async_trait::async_trait;
use thiserror::Error;

use tokio::sync::mpsc;
use tokio::time::Duration;

mod path;
pub use path::ActorPath;

use supervision::SupervisionStrategy;

use crate::actor_system::system::{ActorSystem, SystemEvent};

/// The actor context gives a running actor access to its path and the system.
#[derive(Debug)]
pub struct ActorContext<E: SystemEvent> {
    pub path: ActorPath,
    pub system: ActorSystem<E>,
}

impl<E: SystemEvent> ActorContext<E> {
    /// Stops every actor sharing this actor's parent, this actor included.
    pub async fn stop_group(&self) {
        let group = self.path.parent();
        if group.is_empty() {
            self.system.stop_actor(&self.path).await;
        } else {
            self.system.stop_actor(&group).await;
        }
    }

    pub(crate) async fn restart<A>(
        &mut self,
        actor: &mut A,
        error: Option<&ActorError>,
    ) -> Result<(), ActorError>
    where
        A: Actor<E>,
    {
        actor.pre_restart(self, error).await
    }
}

/// Defines what an actor will receive as its message, and with what it should respond.
pub trait Message: Send + 'static {
    /// Response an actor should give when it receives this message.
    type Response: Send + 'static;
}

/// Basic trait for actors.
#[async_trait]
pub trait Actor<E: SystemEvent>: Send + Sync + 'static {
    /// Stop the actor after this long without a message.
    fn timeout() -> Option<Duration> {
        None
    }

    /// Defines the supervision strategy to use for this actor.
    fn supervision_strategy() -> SupervisionStrategy {
        SupervisionStrategy::Stop
    }

    /// Override this function to perform initialization of the actor.
    async fn pre_start(&mut self, _ctx: &mut ActorContext<E>) -> Result<(), ActorError> {
        Ok(())
    }

    /// Override this function to define what should happen on restart.
    async fn pre_restart(
        &mut self,
        ctx: &mut ActorContext<E>,
        _error: Option<&ActorError>,
    ) -> Result<(), ActorError> {
        self.pre_start(ctx).await
    }

    /// Override this function to perform work when the actor is stopped.
    async fn post_stop(&mut self, _ctx: &mut ActorContext<E>) {}
}

/// Defines what the actor does with a message.
#[async_trait]
pub trait Handler<E: SystemEvent, M: Message>: Actor<E> {
    async fn handle(&mut self, msg: M, ctx: &mut ActorContext<E>) -> M::Response;
}

/// A clonable actor reference.
pub struct ActorRef<E: SystemEvent, A: Actor<E>> {
    path: ActorPath,
    sender: mpsc::UnboundedSender<handler::Letter<E, A>>,
}

impl<E: SystemEvent, A: Actor<E>> Clone for ActorRef<E, A> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            sender: self.sender.clone(),
        }
    }
}

impl<E: SystemEvent, A: Actor<E>> ActorRef<E, A> {
    /// Get the path of this actor.
    pub fn path(&self) -> &ActorPath {
        &self.path
    }

    /// Fire and forget sending of messages to this actor.
    pub fn tell<M>(&self, msg: M) -> Result<(), ActorError>
    where
        M: Message,
        A: Handler<E, M>,
    {
        let envelope = handler::Envelope::<M, E, A>::tell(msg);
        if let Err(error) = self.sender.send(Box::new(envelope)) {
            log::warn!("Failed to tell message to '{}': {}", self.path, error);
            Err(ActorError::SendError(error.to_string()))
        } else {
            Ok(())
        }
    }

    /// Send a message to an actor, expecting a response.
    pub async fn ask<M>(&self, msg: M) -> Result<M::Response, ActorError>
    where
        M: Message,
        A: Handler<E, M>,
    {
        let (envelope, response_receiver) = handler::Envelope::<M, E, A>::ask(msg);
        if let Err(error) = self.sender.send(Box::new(envelope)) {
            log::warn!("Failed to ask message of '{}': {}", self.path, error);
            Err(ActorError::SendError(error.to_string()))
        } else {
            response_receiver
                .await
                .map_err(|error| ActorError::SendError(error.to_string()))
        }
    }

    /// Checks if the actor mailbox is still open.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub(crate) fn new(path: ActorPath, sender: handler::MailboxSender<E, A>) -> Self {
        ActorRef { path, sender }
    }
}

impl<E: SystemEvent, A: Actor<E>> std::fmt::Debug for ActorRef<E, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)
    }
}

#[derive(Error, Debug)]
pub enum ActorError {
    #[error("Actor exists: {0}")]
    Exists(ActorPath),

    #[error("Actor creation failed: {0}")]
    CreateError(String),

    #[error("Sending message failed: {0}")]
    SendError(String),

    #[error("Actor runtime error: {0}")]
    RuntimeError(anyhow::Error),
}

impl ActorError {
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::RuntimeError(anyhow::Error::new(error))
    }
}
