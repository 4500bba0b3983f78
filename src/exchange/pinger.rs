use tokio::sync::oneshot;

use crate::actor_system::{Actor, ActorContext, ActorError, Handler, async_trait};
use crate::exchange::correlator::CorrelationError;
use crate::exchange::requester::Requester;
use crate::types::{DiscardReason, ExchangeEvent, Ping, PingerMsg, Resolution};

/// Requester actor. Issues one request when it starts, announces its outcome
/// exactly once, then stops its whole group.
pub struct Pinger {
    requester: Requester,
    outcome: Option<oneshot::Sender<Resolution>>,
}

impl Pinger {
    pub fn new(requester: Requester, outcome: oneshot::Sender<Resolution>) -> Self {
        Self {
            requester,
            outcome: Some(outcome),
        }
    }

    async fn finalize(&mut self, resolution: Resolution, ctx: &mut ActorContext<ExchangeEvent>) {
        log::info!(
            "Request {} resolved: {} after {:?}",
            resolution.request_id,
            resolution.outcome.kind(),
            resolution.elapsed
        );

        ctx.system.publish(ExchangeEvent::Resolved {
            request_id: resolution.request_id,
            outcome: resolution.outcome.kind(),
            elapsed: resolution.elapsed,
        });

        match self.outcome.take() {
            Some(outcome) => {
                if outcome.send(resolution).is_err() {
                    log::warn!("Nobody is waiting for the outcome of '{}'", ctx.path);
                }
            }
            None => log::error!("Outcome of '{}' was already announced!", ctx.path),
        }

        ctx.stop_group().await;
    }

    fn discard(&self, error: CorrelationError, ctx: &ActorContext<ExchangeEvent>) {
        match error {
            CorrelationError::StaleResolution(request_id) => {
                log::debug!("Discarding stale signal for {}", request_id);
                ctx.system.publish(ExchangeEvent::SignalDiscarded {
                    request_id,
                    reason: DiscardReason::Stale,
                });
            }
            CorrelationError::UnknownCorrelationId(request_id) => {
                log::warn!("Dropping signal for unknown request {}", request_id);
                ctx.system.publish(ExchangeEvent::SignalDiscarded {
                    request_id,
                    reason: DiscardReason::Unknown,
                });
            }
            CorrelationError::DuplicateRegistration(request_id) => {
                log::error!("Request {} registered twice", request_id);
            }
        }
    }
}

#[async_trait]
impl Actor<ExchangeEvent> for Pinger {
    async fn pre_start(&mut self, ctx: &mut ActorContext<ExchangeEvent>) -> Result<(), ActorError> {
        let request_id = self.requester.start(Ping::now()).map_err(ActorError::new)?;

        ctx.system.publish(ExchangeEvent::RequestSent {
            request_id,
            responder: self.requester.responder_address(),
        });
        Ok(())
    }

    async fn post_stop(&mut self, ctx: &mut ActorContext<ExchangeEvent>) {
        let outstanding = self.requester.correlator().outstanding();
        if outstanding > 0 {
            log::warn!(
                "Pinger '{}' stopped with {} outstanding request(s)",
                ctx.path,
                outstanding
            );
        } else {
            log::debug!("Pinger '{}' stopped", ctx.path);
        }
    }
}

#[async_trait]
impl Handler<ExchangeEvent, PingerMsg> for Pinger {
    async fn handle(&mut self, msg: PingerMsg, ctx: &mut ActorContext<ExchangeEvent>) {
        let resolved = match msg {
            PingerMsg::Reply(reply) => self.requester.on_reply(reply),
            PingerMsg::Timeout(signal) => self.requester.on_timeout(signal),
        };

        match resolved {
            Ok(resolution) => self.finalize(resolution, ctx).await,
            Err(error) => self.discard(error, ctx),
        }
    }
}
