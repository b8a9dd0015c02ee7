//! Reminder scheduler: periodic deadline scan with write-once receipts.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use hackbot_core::error::Result;
use hackbot_core::traits::Store;

use crate::dispatch::NotificationDispatcher;
use crate::milestone::Milestone;

/// What a single tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Another tick was still running, so this one did nothing.
    pub skipped: bool,
    pub stages_scanned: usize,
    pub reminders_recorded: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Whole calendar days between `now` and `deadline`, both taken as local
/// dates in `tz`. Negative once the deadline day has passed.
pub fn days_left(deadline: DateTime<Utc>, now: DateTime<Utc>, tz: Tz) -> i64 {
    let deadline_day = deadline.with_timezone(&tz).date_naive();
    let today = now.with_timezone(&tz).date_naive();
    (deadline_day - today).num_days()
}

pub struct ReminderScheduler {
    store: Arc<dyn Store>,
    dispatcher: NotificationDispatcher,
    tz: Tz,
    running: AtomicBool,
}

/// Clears the running flag when a tick finishes, even on early return.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ReminderScheduler {
    pub fn new(store: Arc<dyn Store>, dispatcher: NotificationDispatcher, tz: Tz) -> Self {
        Self {
            store,
            dispatcher,
            tz,
            running: AtomicBool::new(false),
        }
    }

    /// Scan active stages and send due reminders.
    ///
    /// Each (stage, participant, milestone) receipt is recorded before the
    /// send, so a failed delivery is not retried on later ticks. Overlapping
    /// ticks are skipped rather than queued.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<TickReport> {
        if self
            .running
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            tracing::debug!("⏰ Previous reminder tick still running, skipping");
            return Ok(TickReport {
                skipped: true,
                ..TickReport::default()
            });
        }
        let _guard = RunGuard(&self.running);

        let mut report = TickReport::default();
        for stage in self.store.get_active_stages().await? {
            report.stages_scanned += 1;
            let Some(deadline) = stage.deadline else {
                continue;
            };
            let days = days_left(deadline, now, self.tz);
            let Some(milestone) = Milestone::from_days_left(days) else {
                continue;
            };
            let Some(hackathon) = self.store.get_hackathon(stage.hackathon_id).await? else {
                continue;
            };

            let mut due = Vec::new();
            let mut failure = None;
            for participant in self.store.get_hackathon_participants(hackathon.id).await? {
                match self
                    .store
                    .record_reminder_receipt_if_absent(stage.id, participant, milestone.days_left())
                    .await
                {
                    Ok(true) => due.push(participant),
                    Ok(false) => {}
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }

            // Receipts already written must be delivered now: no later tick
            // will pick them up again.
            if !due.is_empty() {
                report.reminders_recorded += due.len();
                let text = milestone.message(&hackathon, &stage);
                let sent = self.dispatcher.send_many(&due, &text).await;
                report.sent += sent.sent;
                report.failed += sent.failed;
                tracing::info!(
                    "🔔 Stage {} ({}): {days} day(s) left, reminded {}/{} participants",
                    stage.id,
                    stage.name,
                    sent.sent,
                    due.len()
                );
            }
            if let Some(e) = failure {
                return Err(e);
            }
        }
        Ok(report)
    }
}

/// Run `tick` every `check_interval_secs` until the task is dropped.
/// Ticks run as separate tasks so a slow fan-out never delays the clock;
/// the running flag makes any overlap a no-op.
pub async fn spawn_reminder_loop(scheduler: Arc<ReminderScheduler>, check_interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(check_interval_secs.max(1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    tracing::info!("⏰ Reminder scheduler started (check every {check_interval_secs}s)");

    loop {
        interval.tick().await;
        let scheduler = scheduler.clone();
        tokio::spawn(async move {
            match scheduler.tick(Utc::now()).await {
                Ok(report) if report.reminders_recorded > 0 => {
                    tracing::info!(
                        "⏰ Reminder tick: {} sent, {} failed",
                        report.sent,
                        report.failed
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::error!("⏰ Reminder tick failed: {e}"),
            }
        });
    }
}
