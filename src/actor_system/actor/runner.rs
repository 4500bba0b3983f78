//! Actor runner - manages actor lifecycle.

use tokio::sync::oneshot;

use crate::actor_system::system::{ActorSystem, SystemEvent};

use super::{
    Actor, ActorContext, ActorPath, SupervisionStrategy,
    handler::{Letter, MailboxReceiver},
};

/// Receiving side of the stop channel. The system holds the sender; dropping
/// it stops the actor after the message currently being handled.
pub(crate) type StopReceiver = oneshot::Receiver<()>;

pub(crate) struct ActorRunner<E: SystemEvent, A: Actor<E>> {
    path: ActorPath,
    actor: A,
    receiver: MailboxReceiver<E, A>,
    stop: StopReceiver,
}

impl<E: SystemEvent, A: Actor<E>> ActorRunner<E, A> {
    pub fn new(
        path: ActorPath,
        actor: A,
        receiver: MailboxReceiver<E, A>,
        stop: StopReceiver,
    ) -> Self {
        ActorRunner {
            path,
            actor,
            receiver,
            stop,
        }
    }

    pub async fn start(&mut self, system: ActorSystem<E>) {
        log::debug!("Starting actor '{}'...", &self.path);

        let mut ctx = ActorContext {
            path: self.path.clone(),
            system: system.clone(),
        };

        // Start the actor
        let mut start_error = self.actor.pre_start(&mut ctx).await.err();

        // Handle supervision strategy if startup failed
        if let Some(error) = &start_error {
            log::warn!("Actor '{}' failed to start: {}", &self.path, error);
        }
        if start_error.is_some() {
            let mut retries = 0;
            match A::supervision_strategy() {
                SupervisionStrategy::Stop => {
                    log::error!("Actor '{}' failed to start!", &self.path);
                }
                SupervisionStrategy::Retry(mut retry_strategy) => {
                    log::debug!(
                        "Restarting actor with retry strategy: {:?}",
                        &retry_strategy
                    );
                    while retries < retry_strategy.max_retries() && start_error.is_some() {
                        log::debug!("retries: {}", &retries);
                        if let Some(duration) = retry_strategy.next_backoff() {
                            log::debug!("Backoff for {:?}", &duration);
                            tokio::time::sleep(duration).await;
                        }
                        retries += 1;
                        start_error = ctx
                            .restart(&mut self.actor, start_error.as_ref())
                            .await
                            .err();
                    }
                    if start_error.is_some() {
                        log::error!(
                            "Actor '{}' failed to start after {} retries!",
                            &self.path,
                            retries
                        );
                    }
                }
            }
        }

        // Run the actor if startup succeeded
        if start_error.is_none() {
            log::debug!("Actor '{}' has started successfully.", &self.path);

            if let Some(timeout) = A::timeout() {
                log::debug!("Timeout of {:?} set for actor {}", timeout, &self.path);
            }

            while let Some(mut letter) = self.next_message().await {
                letter.deliver(&mut self.actor, &mut ctx).await;
            }

            self.actor.post_stop(&mut ctx).await;
            log::debug!("Actor '{}' stopped.", &self.path);
        }

        self.receiver.close();
        system.stop_actor(&self.path).await;
    }

    /// Next message from the mailbox, or `None` once the actor was stopped,
    /// its mailbox closed or it sat idle for longer than its timeout.
    async fn next_message(&mut self) -> Option<Letter<E, A>> {
        let path = &self.path;
        let receiver = &mut self.receiver;
        let receive = async move {
            match A::timeout() {
                Some(timeout) => match tokio::time::timeout(timeout, receiver.recv()).await {
                    Ok(msg) => msg,
                    Err(_) => {
                        log::debug!(
                            "Actor '{}' timed out after {:?} of inactivity.",
                            path,
                            timeout
                        );
                        None
                    }
                },
                None => receiver.recv().await,
            }
        };

        tokio::select! {
            biased;
            _ = &mut self.stop => None,
            msg = receive => msg,
        }
    }
}
