use std::sync::Arc;
use std::time::Duration;

use crate::actor_system::{
    Actor, ActorContext, Handler, Recipient, TimerService, async_trait,
};
use crate::exchange::policy::{ReplyDecision, ReplyPolicy};
use crate::types::{ExchangeEvent, Pong, ReplyEnvelope, RequestEnvelope};

/// Responder: answers requests when its policy says so, and otherwise stays
/// silent. Keeps no per-request state.
pub struct Ponger {
    policy: Box<dyn ReplyPolicy>,
    requester: Arc<dyn Recipient<ReplyEnvelope>>,
    timer: Arc<dyn TimerService<ReplyEnvelope>>,
    reply_delay: Option<Duration>,
}

impl Ponger {
    pub fn new(
        policy: Box<dyn ReplyPolicy>,
        requester: Arc<dyn Recipient<ReplyEnvelope>>,
        timer: Arc<dyn TimerService<ReplyEnvelope>>,
    ) -> Self {
        Self {
            policy,
            requester,
            timer,
            reply_delay: None,
        }
    }

    /// Hold every reply back for `delay` before sending it.
    pub fn with_reply_delay(mut self, delay: Option<Duration>) -> Self {
        self.reply_delay = delay.filter(|delay| !delay.is_zero());
        self
    }

    fn reply(&self, reply: ReplyEnvelope) {
        let request_id = reply.request_id;
        match self.reply_delay {
            Some(delay) => {
                log::debug!("Replying to {} in {:?}", request_id, delay);
                self.timer
                    .arm(self.requester.clone(), delay, reply)
                    .detach();
            }
            None => {
                if let Err(error) = self.requester.tell(reply) {
                    log::warn!(
                        "Reply {} to '{}' was dropped: {}",
                        request_id,
                        self.requester.address(),
                        error
                    );
                }
            }
        }
    }
}

#[async_trait]
impl Actor<ExchangeEvent> for Ponger {
    async fn post_stop(&mut self, ctx: &mut ActorContext<ExchangeEvent>) {
        log::debug!("Ponger '{}' stopped", ctx.path);
    }
}

#[async_trait]
impl Handler<ExchangeEvent, RequestEnvelope> for Ponger {
    async fn handle(&mut self, msg: RequestEnvelope, ctx: &mut ActorContext<ExchangeEvent>) {
        let request_id = msg.request_id;
        match self.policy.decide(&msg) {
            ReplyDecision::Reply => {
                log::debug!("Ponger '{}' answers {}", ctx.path, request_id);
                self.reply(ReplyEnvelope::success(request_id, Pong::answering(&msg.payload)));
                ctx.system.publish(ExchangeEvent::ReplySent { request_id });
            }
            ReplyDecision::Silence => {
                log::debug!("Ponger '{}' ignores {}", ctx.path, request_id);
                ctx.system.publish(ExchangeEvent::ReplyWithheld { request_id });
            }
        }
    }
}
