//! Actor system - registry of running actors and the shared event bus.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, oneshot};
use tokio_stream::wrappers::BroadcastStream;

use crate::actor_system::actor::{
    Actor, ActorError, ActorPath, ActorRef,
    handler::{MailboxReceiver, mailbox},
    runner::{ActorRunner, StopReceiver},
};
use crate::actor_system::bus::{EventBus, EventReceiver};

/// Events that this actor system will send.
pub trait SystemEvent: Clone + Send + Sync + std::fmt::Debug + 'static {}

struct ActorEntry {
    actor_ref: Box<dyn Any + Send + Sync + 'static>,
    // Dropping the sender stops the runner.
    _stop: oneshot::Sender<()>,
}

/// Registry of running actors, addressed by path, plus the system event bus.
#[derive(Clone)]
pub struct ActorSystem<E: SystemEvent> {
    name: String,
    actors: Arc<RwLock<HashMap<ActorPath, ActorEntry>>>,
    bus: EventBus<E>,
}

impl<E: SystemEvent> ActorSystem<E> {
    pub fn new(name: &str, bus: EventBus<E>) -> Self {
        let name = name.to_string();
        let actors = Arc::new(RwLock::new(HashMap::new()));
        ActorSystem { name, actors, bus }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Publish an event on the system bus.
    pub fn publish(&self, event: E) {
        self.bus.send(event).unwrap_or_else(|error| {
            log::debug!("No listeners active on event bus. Dropped event: {:?}", error.0);
            0
        });
    }

    /// Subscribe to the system bus.
    pub fn events(&self) -> EventReceiver<E> {
        self.bus.subscribe()
    }

    /// Subscribe to the system bus as a stream.
    pub fn event_stream(&self) -> BroadcastStream<E> {
        self.bus.stream()
    }

    /// Retrieve an actor running under the given path.
    pub async fn get_actor<A: Actor<E>>(&self, path: &ActorPath) -> Option<ActorRef<E, A>> {
        let actors = self.actors.read().await;
        actors
            .get(path)
            .and_then(|entry| entry.actor_ref.downcast_ref::<ActorRef<E, A>>().cloned())
    }

    /// Reserve a path and a mailbox without starting an actor yet. The returned
    /// slot's reference accepts messages immediately; they are handled once the
    /// actor is started with [`ActorSlot::start`].
    pub async fn reserve_actor_path<A: Actor<E>>(
        &self,
        path: ActorPath,
    ) -> Result<ActorSlot<E, A>, ActorError> {
        log::debug!("Reserving actor '{}' on system '{}'...", &path, &self.name);

        if path.is_empty() {
            return Err(ActorError::CreateError("empty actor path".to_string()));
        }

        let mut actors = self.actors.write().await;
        if actors.contains_key(&path) {
            return Err(ActorError::Exists(path));
        }

        let (sender, receiver) = mailbox::<E, A>();
        let (stop_sender, stop_receiver) = oneshot::channel();
        let actor_ref = ActorRef::new(path.clone(), sender);

        actors.insert(
            path,
            ActorEntry {
                actor_ref: Box::new(actor_ref.clone()),
                _stop: stop_sender,
            },
        );

        Ok(ActorSlot {
            actor_ref,
            receiver,
            stop: stop_receiver,
            system: self.clone(),
        })
    }

    /// Launch a new actor on this system under the given path.
    pub async fn create_actor_path<A: Actor<E>>(
        &self,
        path: ActorPath,
        actor: A,
    ) -> Result<ActorRef<E, A>, ActorError> {
        let slot = self.reserve_actor_path(path).await?;
        Ok(slot.start(actor))
    }

    /// Launch a new top level actor on this system at `/user/{name}`.
    pub async fn create_actor<A: Actor<E>>(
        &self,
        name: &str,
        actor: A,
    ) -> Result<ActorRef<E, A>, ActorError> {
        let path = ActorPath::from("/user") / name;
        self.create_actor_path(path, actor).await
    }

    /// Stops the actor at `path` and every actor below it. Messages still
    /// queued in their mailboxes are discarded.
    pub async fn stop_actor(&self, path: &ActorPath) {
        let mut actors = self.actors.write().await;
        let paths: Vec<ActorPath> = actors
            .keys()
            .filter(|running| *running == path || running.is_descendant_of(path))
            .cloned()
            .collect();

        for stopped in &paths {
            log::debug!("Stopping actor '{}' on system '{}'...", stopped, &self.name);
            actors.remove(stopped);
        }
    }

    /// Number of registered actors.
    pub async fn len(&self) -> usize {
        self.actors.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.actors.read().await.is_empty()
    }
}

impl<E: SystemEvent> std::fmt::Debug for ActorSystem<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorSystem")
            .field("name", &self.name)
            .finish()
    }
}

/// A registered but not yet running actor.
pub struct ActorSlot<E: SystemEvent, A: Actor<E>> {
    actor_ref: ActorRef<E, A>,
    receiver: MailboxReceiver<E, A>,
    stop: StopReceiver,
    system: ActorSystem<E>,
}

impl<E: SystemEvent, A: Actor<E>> ActorSlot<E, A> {
    pub fn actor_ref(&self) -> ActorRef<E, A> {
        self.actor_ref.clone()
    }

    /// Spawn the actor on the tokio runtime.
    pub fn start(self, actor: A) -> ActorRef<E, A> {
        let ActorSlot {
            actor_ref,
            receiver,
            stop,
            system,
        } = self;

        let mut runner = ActorRunner::new(actor_ref.path().clone(), actor, receiver, stop);
        tokio::spawn(async move {
            runner.start(system).await;
        });

        actor_ref
    }
}
