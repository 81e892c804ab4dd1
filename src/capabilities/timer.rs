use crux_core::capability::{Capability, CapabilityContext, Operation};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one scheduled timer. Ids are minted by the core and never
/// reused, so a callback carrying a stale id can be detected and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(pub u32);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerOperation {
    /// Fire once after `delay_ms`.
    Oneshot { id: TimerId, delay_ms: u64 },
    /// Fire every `period_ms` until cancelled.
    Interval { id: TimerId, period_ms: u64 },
    /// Stop a timer. No response expected; cancelling an already-finished
    /// timer is harmless.
    Cancel { id: TimerId },
}

impl Operation for TimerOperation {
    type Output = TimerId;
}

pub struct Timer<Ev> {
    context: CapabilityContext<TimerOperation, Ev>,
}

impl<Ev> Capability<Ev> for Timer<Ev> {
    type Operation = TimerOperation;
    type MappedSelf<MappedEv> = Timer<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Timer::new(self.context.map_event(f))
    }
}

impl<Ev> Timer<Ev>
where
    Ev: Send + 'static,
{
    pub fn new(context: CapabilityContext<TimerOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn oneshot<F>(&self, id: TimerId, delay_ms: u64, make_event: F)
    where
        F: FnOnce(TimerId) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let fired = context
                .request_from_shell(TimerOperation::Oneshot { id, delay_ms })
                .await;
            context.update_app(make_event(fired));
        });
    }

    /// Start a repeating timer. `make_event` runs once per tick until the
    /// shell stops the stream in response to [`Timer::cancel`].
    pub fn interval<F>(&self, id: TimerId, period_ms: u64, make_event: F)
    where
        F: Fn(TimerId) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let mut ticks =
                context.stream_from_shell(TimerOperation::Interval { id, period_ms });
            while let Some(fired) = ticks.next().await {
                context.update_app(make_event(fired));
            }
        });
    }

    pub fn cancel(&self, id: TimerId) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context.notify_shell(TimerOperation::Cancel { id }).await;
        });
    }
}
