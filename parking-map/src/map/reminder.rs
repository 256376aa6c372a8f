use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

use crate::error::ReminderError;
use crate::services::notify::{Notifier, Permission};

pub const REMINDER_TITLE: &str = "Parking Reminder";
pub const REMINDER_BODY: &str = "Time is up. Please move your car.";
pub const REMINDER_ALERT: &str = "Parking time is up!";

/// `m:ss`, clamped at zero.
pub fn format_countdown(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// One running countdown. Aborted when dropped.
pub struct ReminderSession {
    deadline: Instant,
    ends_at: DateTime<Local>,
    countdown: watch::Receiver<Option<Duration>>,
    task: JoinHandle<()>,
}

impl ReminderSession {
    /// `None` if the deadline cannot be represented on either clock.
    fn start(duration: Duration, tick: Duration, notifier: Arc<dyn Notifier>) -> Option<Self> {
        let deadline = Instant::now().checked_add(duration)?;
        let ends_at = chrono::Duration::from_std(duration)
            .ok()
            .and_then(|d| Local::now().checked_add_signed(d))?;
        let (tx, countdown) = watch::channel(Some(duration));

        let task = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + tick, tick);
            loop {
                ticks.tick().await;
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    let _ = tx.send(None);
                    deliver_expiry(notifier.as_ref());
                    break;
                }
                let _ = tx.send(Some(remaining));
            }
        });

        Some(Self {
            deadline,
            ends_at,
            countdown,
            task,
        })
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn remaining_ms(&self) -> u128 {
        self.remaining().as_millis()
    }

    /// Wall-clock time the reminder fires.
    pub fn ends_at(&self) -> DateTime<Local> {
        self.ends_at
    }

    /// Remaining time as published by the last tick; `None` once expired.
    pub fn countdown(&self) -> watch::Receiver<Option<Duration>> {
        self.countdown.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ReminderSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl fmt::Debug for ReminderSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReminderSession")
            .field("ends_at", &self.ends_at)
            .field("remaining", &self.remaining())
            .finish()
    }
}

fn deliver_expiry(notifier: &dyn Notifier) {
    if notifier.permission() == Permission::Granted {
        notifier.notify(REMINDER_TITLE, REMINDER_BODY);
    } else {
        notifier.alert(REMINDER_ALERT);
    }
}

/// The "set reminder" control attached to a segment popup.
///
/// At most one session is active; starting again replaces it.
pub struct ReminderControl {
    minutes: Option<i64>,
    tick: Duration,
    notifier: Arc<dyn Notifier>,
    session: Option<ReminderSession>,
}

impl ReminderControl {
    /// Asks for notification permission up front, since the control is now on screen.
    pub fn new(minutes: Option<i64>, notifier: Arc<dyn Notifier>, tick: Duration) -> Self {
        if notifier.permission() != Permission::Granted {
            let permission = notifier.request_permission();
            tracing::debug!(?permission, "notification permission requested");
        }
        Self {
            minutes,
            tick,
            notifier,
            session: None,
        }
    }

    pub fn minutes(&self) -> Option<i64> {
        self.minutes
    }

    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<&ReminderSession, ReminderError> {
        let Some(minutes) = self.minutes.filter(|m| *m > 0) else {
            return Err(self.fail(ReminderError::NoDuration));
        };

        let session = u64::try_from(minutes)
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
            .and_then(|duration| {
                ReminderSession::start(duration, self.tick, Arc::clone(&self.notifier))
            });
        let Some(session) = session else {
            return Err(self.fail(ReminderError::TooLong(minutes)));
        };
        tracing::info!(minutes, ends_at = %session.ends_at(), "reminder started");
        Ok(self.session.insert(session))
    }

    fn fail(&self, err: ReminderError) -> ReminderError {
        self.notifier.alert(&err.to_string());
        err
    }

    pub fn cancel(&mut self) {
        if self.session.take().is_some() {
            tracing::debug!("reminder cancelled");
        }
    }

    pub fn session(&self) -> Option<&ReminderSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.is_finished())
    }
}

impl fmt::Debug for ReminderControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReminderControl")
            .field("minutes", &self.minutes)
            .field("session", &self.session)
            .finish()
    }
}
