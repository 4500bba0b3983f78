//! Requester state machine: sends requests, arms their deadlines and resolves
//! each one exactly once, whichever of reply and timeout is processed first.
//!
//! The requester holds no runtime of its own. Its peer, its own address and
//! the timer service come in through the constructor, and every handler runs
//! to completion under `&mut self`, so an actor can drive it one message at a
//! time.

use std::sync::Arc;
use std::time::Duration;

use crate::actor_system::{Recipient, TimerService};
use crate::exchange::correlator::{CorrelationError, Correlator};
use crate::types::{
    Outcome, Ping, ReplyEnvelope, RequestEnvelope, RequestId, RequestIdGenerator, Resolution,
    TimeoutSignal,
};

pub struct Requester {
    ids: RequestIdGenerator,
    correlator: Correlator,
    timeout: Duration,
    responder: Arc<dyn Recipient<RequestEnvelope>>,
    inbox: Arc<dyn Recipient<TimeoutSignal>>,
    timer: Arc<dyn TimerService<TimeoutSignal>>,
}

impl Requester {
    /// `inbox` is where timeout signals are delivered: the requester's own
    /// address.
    pub fn new(
        timeout: Duration,
        responder: Arc<dyn Recipient<RequestEnvelope>>,
        inbox: Arc<dyn Recipient<TimeoutSignal>>,
        timer: Arc<dyn TimerService<TimeoutSignal>>,
    ) -> Self {
        Self {
            ids: RequestIdGenerator::default(),
            correlator: Correlator::new(),
            timeout,
            responder,
            inbox,
            timer,
        }
    }

    pub fn responder_address(&self) -> String {
        self.responder.address()
    }

    pub fn correlator(&self) -> &Correlator {
        &self.correlator
    }

    #[cfg(test)]
    pub(crate) fn correlator_mut(&mut self) -> &mut Correlator {
        &mut self.correlator
    }

    /// Send a new request and arm its deadline.
    ///
    /// A request the channel refuses is not an error here: the channel is
    /// at-most-once, and the armed deadline resolves the request as a timeout.
    pub fn start(&mut self, payload: Ping) -> Result<RequestId, CorrelationError> {
        let request_id = self.ids.next_id();

        if let Err(error) = self.responder.tell(RequestEnvelope {
            request_id,
            payload,
        }) {
            log::warn!(
                "Request {} to '{}' was dropped: {}",
                request_id,
                self.responder.address(),
                error
            );
        }

        let timer = self.timer.arm(
            self.inbox.clone(),
            self.timeout,
            TimeoutSignal { request_id },
        );
        self.correlator.register(request_id, timer)?;

        log::debug!(
            "Request {} outstanding, deadline in {:?}",
            request_id,
            self.timeout
        );
        Ok(request_id)
    }

    /// Resolve a request from a correlated reply.
    pub fn on_reply(&mut self, reply: ReplyEnvelope) -> Result<Resolution, CorrelationError> {
        let pending = self.correlator.resolve_and_take(reply.request_id)?;
        let elapsed = pending.registered_at().elapsed();

        if !pending.into_timer().cancel() {
            log::debug!(
                "Deadline of {} already fired, its signal will be discarded",
                reply.request_id
            );
        }

        Ok(Resolution {
            request_id: reply.request_id,
            outcome: reply.outcome,
            elapsed,
        })
    }

    /// Resolve a request whose deadline fired.
    pub fn on_timeout(&mut self, signal: TimeoutSignal) -> Result<Resolution, CorrelationError> {
        let pending = self.correlator.resolve_and_take(signal.request_id)?;
        let elapsed = pending.registered_at().elapsed();
        pending.into_timer().release();

        Ok(Resolution {
            request_id: signal.request_id,
            outcome: Outcome::Timeout,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::fakes::{ManualTimer, RecordingRecipient};
    use crate::types::Pong;

    struct Fixture {
        requester: Requester,
        responder: Arc<RecordingRecipient<RequestEnvelope>>,
        inbox: Arc<RecordingRecipient<TimeoutSignal>>,
        timer: Arc<ManualTimer<TimeoutSignal>>,
    }

    fn fixture() -> Fixture {
        let responder = Arc::new(RecordingRecipient::<RequestEnvelope>::new("ponger"));
        let inbox = Arc::new(RecordingRecipient::<TimeoutSignal>::new("pinger"));
        let timer = Arc::new(ManualTimer::<TimeoutSignal>::new());
        let requester = Requester::new(
            Duration::from_millis(200),
            responder.clone(),
            inbox.clone(),
            timer.clone(),
        );
        Fixture {
            requester,
            responder,
            inbox,
            timer,
        }
    }

    fn pong_for(envelope: &RequestEnvelope) -> ReplyEnvelope {
        ReplyEnvelope::success(envelope.request_id, Pong::answering(&envelope.payload))
    }

    #[test]
    fn test_start_sends_arms_and_registers() {
        let mut f = fixture();
        let id = f.requester.start(Ping::now()).unwrap();

        assert_eq!(id, RequestId::new(1));
        assert_eq!(f.responder.messages()[0].request_id, id);
        assert!(f.requester.correlator().is_outstanding(id));

        let armed = f.timer.armed();
        assert_eq!(armed.len(), 1);
        assert_eq!(armed[0].delay, Duration::from_millis(200));
        assert_eq!(armed[0].signal, TimeoutSignal { request_id: id });
    }

    #[test]
    fn test_reply_resolves_success_and_cancels_timer() {
        let mut f = fixture();
        let id = f.requester.start(Ping::now()).unwrap();
        let reply = pong_for(&f.responder.messages()[0]);

        let resolution = f.requester.on_reply(reply.clone()).unwrap();

        assert_eq!(resolution.request_id, id);
        assert_eq!(resolution.outcome, reply.outcome);
        assert!(f.requester.correlator().is_empty());
        let probe = f.timer.probe(0);
        assert!(probe.is_cancelled());
        assert_eq!(probe.disarm_count(), 1);
        assert!(!f.timer.fire(0));
        assert!(f.inbox.messages().is_empty());
    }

    #[test]
    fn test_silence_resolves_timeout() {
        let mut f = fixture();
        let id = f.requester.start(Ping::now()).unwrap();

        assert!(f.timer.fire(0));
        let signal = f.inbox.messages()[0];
        let resolution = f.requester.on_timeout(signal).unwrap();

        assert_eq!(resolution.request_id, id);
        assert_eq!(resolution.outcome, Outcome::Timeout);
        assert!(f.requester.correlator().is_empty());
        assert_eq!(f.timer.probe(0).disarm_count(), 1);
    }

    #[test]
    fn test_reply_then_queued_timeout_resolves_once() {
        let mut f = fixture();
        let id = f.requester.start(Ping::now()).unwrap();
        // the deadline fires while the reply is already queued
        assert!(f.timer.fire(0));
        let reply = pong_for(&f.responder.messages()[0]);

        assert!(f.requester.on_reply(reply).unwrap().outcome.is_success());
        assert_eq!(
            f.requester.on_timeout(f.inbox.messages()[0]).unwrap_err(),
            CorrelationError::StaleResolution(id)
        );
        assert_eq!(f.timer.probe(0).disarm_count(), 1);
    }

    #[test]
    fn test_timeout_then_late_reply_resolves_once() {
        let mut f = fixture();
        let id = f.requester.start(Ping::now()).unwrap();
        let reply = pong_for(&f.responder.messages()[0]);
        assert!(f.timer.fire(0));

        let resolution = f.requester.on_timeout(f.inbox.messages()[0]).unwrap();
        assert_eq!(resolution.outcome, Outcome::Timeout);
        assert_eq!(
            f.requester.on_reply(reply.clone()).unwrap_err(),
            CorrelationError::StaleResolution(id)
        );
        assert_eq!(
            f.requester.on_reply(reply).unwrap_err(),
            CorrelationError::StaleResolution(id)
        );
        assert_eq!(f.timer.probe(0).disarm_count(), 1);
    }

    #[test]
    fn test_unknown_id_leaves_pending_request_alone() {
        let mut f = fixture();
        let id = f.requester.start(Ping::now()).unwrap();
        let stray = RequestId::new(99);

        assert_eq!(
            f.requester
                .on_timeout(TimeoutSignal { request_id: stray })
                .unwrap_err(),
            CorrelationError::UnknownCorrelationId(stray)
        );
        assert_eq!(
            f.requester
                .on_reply(ReplyEnvelope {
                    request_id: stray,
                    outcome: Outcome::Timeout,
                })
                .unwrap_err(),
            CorrelationError::UnknownCorrelationId(stray)
        );
        assert!(f.requester.correlator().is_outstanding(id));
        assert!(!f.timer.probe(0).is_cancelled());
    }

    #[test]
    fn test_dropped_request_still_times_out() {
        let mut f = fixture();
        f.responder.close();

        let id = f.requester.start(Ping::now()).unwrap();
        assert!(f.requester.correlator().is_outstanding(id));

        assert!(f.timer.fire(0));
        let resolution = f.requester.on_timeout(f.inbox.messages()[0]).unwrap();
        assert_eq!(resolution.outcome, Outcome::Timeout);
    }

    #[test]
    fn test_many_outstanding_requests_resolve_independently() {
        let mut f = fixture();
        let ids: Vec<RequestId> = (0..100)
            .map(|_| f.requester.start(Ping::now()).unwrap())
            .collect();
        assert_eq!(f.requester.correlator().outstanding(), 100);

        let requests = f.responder.messages();
        let mut successes = 0;
        let mut timeouts = 0;
        for (index, request) in requests.iter().enumerate() {
            if index % 2 == 0 {
                f.requester.on_reply(pong_for(request)).unwrap();
                successes += 1;
            } else {
                assert!(f.timer.fire(index));
            }
        }
        for signal in f.inbox.messages() {
            f.requester.on_timeout(signal).unwrap();
            timeouts += 1;
        }
        // replay everything: nothing resolves twice
        for request in &requests {
            assert!(f.requester.on_reply(pong_for(request)).is_err());
        }
        for signal in f.inbox.messages() {
            assert!(f.requester.on_timeout(signal).is_err());
        }

        assert_eq!((successes, timeouts), (50, 50));
        assert!(f.requester.correlator().is_empty());
        assert!(ids.iter().enumerate().all(|(index, _)| f.timer.probe(index).disarm_count() == 1));
    }
}
