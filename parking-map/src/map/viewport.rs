use std::time::Duration;

use shared_types::ViewportCenter;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::map::engine::EngineEvent;

/// Trailing debounce over move-end signals.
///
/// Every move restarts the quiet period; only the newest center is ever
/// reported. The pending timer is aborted on [`cancel`](Self::cancel) and on drop.
pub struct ViewportTracker {
    current: Option<ViewportCenter>,
    quiet_period: Duration,
    generation: u64,
    pending: Option<JoinHandle<()>>,
    events: UnboundedSender<EngineEvent>,
}

impl ViewportTracker {
    pub fn new(quiet_period: Duration, events: UnboundedSender<EngineEvent>) -> Self {
        Self {
            current: None,
            quiet_period,
            generation: 0,
            pending: None,
            events,
        }
    }

    pub fn current(&self) -> Option<ViewportCenter> {
        self.current
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn on_move_end(&mut self, center: ViewportCenter) {
        self.schedule(center, self.quiet_period);
    }

    /// Makes `center` current and (re)starts the timer with an explicit delay.
    pub fn schedule(&mut self, center: ViewportCenter, delay: Duration) {
        self.current = Some(center);
        self.cancel();
        self.generation += 1;

        let generation = self.generation;
        let events = self.events.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(EngineEvent::Settled { generation });
        }));
        tracing::trace!(generation, ?delay, "viewport timer restarted");
    }

    /// Claims a settle signal. Returns the center to fetch if `generation` is
    /// the live timer; a signal from a superseded or cancelled timer yields `None`.
    pub fn take_settled(&mut self, generation: u64) -> Option<ViewportCenter> {
        if generation != self.generation || self.pending.is_none() {
            tracing::debug!(generation, live = self.generation, "dropping superseded settle");
            return None;
        }
        self.pending = None;
        self.current
    }

    pub fn cancel(&mut self) {
        if let Some(timer) = self.pending.take() {
            timer.abort();
        }
    }
}

impl Drop for ViewportTracker {
    fn drop(&mut self) {
        self.cancel();
    }
}
