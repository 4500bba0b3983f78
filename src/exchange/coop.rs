//! Lifecycle host: builds one cooperating requester/responder pair, wires
//! their addresses before either starts, and waits for the outcome.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::actor_system::{ActorPath, ActorSystem, Recipient, TokioTimer, adapt};
use crate::config::ExchangeConfig;
use crate::exchange::ExchangeError;
use crate::exchange::pinger::Pinger;
use crate::exchange::policy::ReplyPolicy;
use crate::exchange::ponger::Ponger;
use crate::exchange::requester::Requester;
use crate::types::{ExchangeEvent, OutcomeKind, PingerMsg, RequestId, Resolution};

#[derive(Clone, Debug, Serialize)]
pub struct ExchangeReport {
    pub exchange_id: Uuid,
    pub request_id: RequestId,
    pub outcome: OutcomeKind,
    pub elapsed_ms: u64,
    pub resolved_at: DateTime<Utc>,
}

/// Running count of outcomes across exchanges.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Tally {
    pub successes: usize,
    pub timeouts: usize,
}

impl Tally {
    pub fn record(&mut self, report: &ExchangeReport) {
        match report.outcome {
            OutcomeKind::Success => self.successes += 1,
            OutcomeKind::Timeout => self.timeouts += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.successes + self.timeouts
    }
}

/// Path of the group an exchange's actors live under.
pub fn group_path(exchange_id: Uuid) -> ActorPath {
    ActorPath::from(format!("/exchange-{exchange_id}"))
}

/// Run a single request/response exchange in a fresh actor group and return
/// its outcome. The group is stopped when this returns.
pub async fn run_exchange(
    system: &ActorSystem<ExchangeEvent>,
    config: &ExchangeConfig,
    policy: Box<dyn ReplyPolicy>,
) -> Result<ExchangeReport, ExchangeError> {
    let exchange_id = Uuid::new_v4();
    let group = group_path(exchange_id);

    let result = launch(system, config, policy, &group).await;
    if result.is_err() {
        system.stop_actor(&group).await;
    }
    let receiver = result?;

    settle(system, exchange_id, &group, receiver).await
}

/// Wait for the pinger's outcome. A pinger that goes away without announcing
/// one, for instance because it failed to start, abandons the exchange and
/// its whole group is stopped.
async fn settle(
    system: &ActorSystem<ExchangeEvent>,
    exchange_id: Uuid,
    group: &ActorPath,
    receiver: oneshot::Receiver<Resolution>,
) -> Result<ExchangeReport, ExchangeError> {
    let Ok(resolution) = receiver.await else {
        log::warn!("Exchange group '{}' stopped without an outcome", group);
        system.stop_actor(group).await;
        return Err(ExchangeError::Abandoned(exchange_id));
    };

    Ok(ExchangeReport {
        exchange_id,
        request_id: resolution.request_id,
        outcome: resolution.outcome.kind(),
        elapsed_ms: u64::try_from(resolution.elapsed.as_millis()).unwrap_or(u64::MAX),
        resolved_at: Utc::now(),
    })
}

async fn launch(
    system: &ActorSystem<ExchangeEvent>,
    config: &ExchangeConfig,
    policy: Box<dyn ReplyPolicy>,
    group: &ActorPath,
) -> Result<oneshot::Receiver<Resolution>, ExchangeError> {
    let pinger_slot = system
        .reserve_actor_path::<Pinger>(group.clone() / "pinger")
        .await?;
    let ponger_slot = system
        .reserve_actor_path::<Ponger>(group.clone() / "ponger")
        .await?;

    let timer = Arc::new(TokioTimer);
    let pinger_inbox: Arc<dyn Recipient<PingerMsg>> = Arc::new(pinger_slot.actor_ref());

    let ponger = Ponger::new(policy, adapt(pinger_inbox.clone()), timer.clone())
        .with_reply_delay(config.reply_delay);

    let requester = Requester::new(
        config.timeout,
        Arc::new(ponger_slot.actor_ref()),
        adapt(pinger_inbox),
        timer,
    );
    let (sender, receiver) = oneshot::channel();

    log::debug!("Starting exchange group '{}'", group);
    ponger_slot.start(ponger);
    pinger_slot.start(Pinger::new(requester, sender));

    Ok(receiver)
}
