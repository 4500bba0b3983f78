//! Delayed and periodic message delivery.
//!
//! Arming a timer returns a move-only [`TimerHandle`]. Consuming the handle
//! (`cancel`, `release`) or dropping it disarms the timer; `detach` lets it run
//! unowned. Cancellation is best-effort: a signal that was already handed to
//! the target's mailbox is still delivered.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::task::AbortHandle;

use crate::actor_system::recipient::Recipient;

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct TimerId(u64);

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

#[derive(Debug, Default)]
struct TimerState {
    cancelled: AtomicBool,
    fired: AtomicUsize,
    disarmed: AtomicUsize,
}

/// Owning handle of an armed timer.
#[derive(Debug)]
pub struct TimerHandle {
    id: TimerId,
    state: Arc<TimerState>,
    task: Option<AbortHandle>,
    settled: bool,
}

impl TimerHandle {
    /// A handle with no task behind it, plus the probe through which whoever
    /// drives the timer fires it. Used by [`TimerService`] implementations.
    pub fn pair() -> (TimerHandle, TimerProbe) {
        let id = TimerId(NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed));
        let state = Arc::new(TimerState::default());
        let probe = TimerProbe {
            id,
            state: state.clone(),
        };
        let handle = TimerHandle {
            id,
            state,
            task: None,
            settled: false,
        };
        (handle, probe)
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn probe(&self) -> TimerProbe {
        TimerProbe {
            id: self.id,
            state: self.state.clone(),
        }
    }

    pub fn has_fired(&self) -> bool {
        self.state.fired.load(Ordering::Acquire) > 0
    }

    /// Disarm a timer that may not have fired yet. Returns `true` if it had
    /// not fired at the time of cancellation.
    pub fn cancel(mut self) -> bool {
        let pending = !self.has_fired();
        self.disarm();
        pending
    }

    /// Give back the handle of a timer that already fired.
    pub fn release(mut self) {
        self.disarm();
    }

    /// Let the timer run to completion without an owner.
    pub fn detach(mut self) {
        self.settled = true;
        self.task.take();
    }

    fn disarm(&mut self) {
        if self.settled {
            return;
        }
        self.settled = true;
        self.state.cancelled.store(true, Ordering::Release);
        self.state.disarmed.fetch_add(1, Ordering::AcqRel);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.disarm();
    }
}

/// Shared view of a timer's state, held by the firing side and by tests.
#[derive(Clone, Debug)]
pub struct TimerProbe {
    id: TimerId,
    state: Arc<TimerState>,
}

impl TimerProbe {
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Record a firing unless the timer was disarmed. Returns whether the
    /// signal should be delivered.
    pub fn try_fire(&self) -> bool {
        if self.state.cancelled.load(Ordering::Acquire) {
            return false;
        }
        self.state.fired.fetch_add(1, Ordering::AcqRel);
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    pub fn fire_count(&self) -> usize {
        self.state.fired.load(Ordering::Acquire)
    }

    /// How many times the owning handle was cancelled or released.
    pub fn disarm_count(&self) -> usize {
        self.state.disarmed.load(Ordering::Acquire)
    }
}

/// Schedules `signal` for delivery to `target` after `delay`.
pub trait TimerService<M>: Send + Sync {
    fn arm(&self, target: Arc<dyn Recipient<M>>, delay: Duration, signal: M) -> TimerHandle;
}

/// Timer service backed by tokio tasks. Must be used from within a tokio
/// runtime.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioTimer;

impl TokioTimer {
    /// Deliver `signal` after `delay`, then every `period`. A zero period
    /// makes this a one-shot timer.
    pub fn arm_periodic<M>(
        &self,
        target: Arc<dyn Recipient<M>>,
        delay: Duration,
        period: Duration,
        signal: M,
    ) -> TimerHandle
    where
        M: Clone + Send + 'static,
    {
        let (mut handle, probe) = TimerHandle::pair();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            loop {
                if !probe.try_fire() {
                    break;
                }
                if let Err(error) = target.tell(signal.clone()) {
                    log::debug!("{} target '{}' is gone: {}", probe.id(), target.address(), error);
                    break;
                }
                if period.is_zero() {
                    break;
                }
                tokio::time::sleep(period).await;
            }
        });
        handle.task = Some(task.abort_handle());
        handle
    }
}

impl<M: Clone + Send + 'static> TimerService<M> for TokioTimer {
    fn arm(&self, target: Arc<dyn Recipient<M>>, delay: Duration, signal: M) -> TimerHandle {
        self.arm_periodic(target, delay, Duration::ZERO, signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_system::ActorError;
    use tokio::sync::mpsc;

    struct Forward(mpsc::UnboundedSender<&'static str>);

    impl Recipient<&'static str> for Forward {
        fn tell(&self, msg: &'static str) -> Result<(), ActorError> {
            self.0
                .send(msg)
                .map_err(|error| ActorError::SendError(error.to_string()))
        }

        fn address(&self) -> String {
            "forward".to_string()
        }
    }

    fn target() -> (Arc<dyn Recipient<&'static str>>, mpsc::UnboundedReceiver<&'static str>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Arc::new(Forward(sender)), receiver)
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_fires_after_delay() {
        let (target, mut receiver) = target();
        let start = tokio::time::Instant::now();

        let handle = TokioTimer.arm(target, Duration::from_millis(200), "timeout");

        assert_eq!(receiver.recv().await, Some("timeout"));
        assert!(start.elapsed() >= Duration::from_millis(200));
        assert!(handle.has_fired());

        let probe = handle.probe();
        handle.release();
        assert_eq!(probe.fire_count(), 1);
        assert_eq!(probe.disarm_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_delivery() {
        let (target, mut receiver) = target();
        let handle = TokioTimer.arm(target, Duration::from_millis(200), "timeout");
        let probe = handle.probe();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.cancel());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(receiver.try_recv().is_err());
        assert!(probe.is_cancelled());
        assert_eq!(probe.fire_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_disarms() {
        let (target, mut receiver) = target();
        let probe = TokioTimer
            .arm(target, Duration::from_millis(50), "timeout")
            .probe();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(receiver.try_recv().is_err());
        assert_eq!(probe.disarm_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detached_timer_still_fires() {
        let (target, mut receiver) = target();
        let handle = TokioTimer.arm(target, Duration::from_millis(50), "late");
        let probe = handle.probe();
        handle.detach();

        assert_eq!(receiver.recv().await, Some("late"));
        assert_eq!(probe.disarm_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_fires_until_cancelled() {
        let (target, mut receiver) = target();
        let handle = TokioTimer.arm_periodic(
            target,
            Duration::from_millis(10),
            Duration::from_millis(10),
            "tick",
        );

        for _ in 0..3 {
            assert_eq!(receiver.recv().await, Some("tick"));
        }
        let probe = handle.probe();
        assert!(!handle.cancel());

        tokio::time::sleep(Duration::from_millis(100)).await;
        let fired = probe.fire_count();
        assert!(fired >= 3);
        while receiver.try_recv().is_ok() {}
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(receiver.try_recv().is_err());
        assert_eq!(probe.fire_count(), fired);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_is_one_shot() {
        let (target, mut receiver) = target();
        let _handle =
            TokioTimer.arm_periodic(target, Duration::from_millis(10), Duration::ZERO, "once");

        assert_eq!(receiver.recv().await, Some("once"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(receiver.try_recv().is_err());
    }
}
