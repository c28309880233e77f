//! The scheduler (C6): drives one-shot or cron-scheduled runs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing::warn;
use watchkeep_config::Schedule;

use crate::clock::Clock;
use crate::clock::SystemClock;
use crate::coordinator::Coordinator;

/// The polling grain at which the scheduler re-evaluates whether the cron
/// schedule has come due.
pub const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(30);

/// The window, from process start or from the last run, within which an
/// upcoming fire is treated as due rather than deferred to the next cycle.
const FIRE_WINDOW: chrono::Duration = chrono::Duration::seconds(60);

/// Something the scheduler can fire on each due tick.
///
/// [`Coordinator`] is the production implementation; tests use lighter
/// fakes to observe how many times, and when, the scheduler fired.
#[async_trait]
pub trait Runnable: Send + Sync {
    /// Performs one run.
    async fn run_once(&self) -> anyhow::Result<()>;
}

#[async_trait]
impl Runnable for Coordinator {
    async fn run_once(&self) -> anyhow::Result<()> {
        Coordinator::run_once(self).await.map(|_report| ())
    }
}

/// Decides whether a tick is due, given the schedule, the last time it
/// fired (if any), and the current time.
///
/// Mirrors SPEC_FULL.md §4.6: with no prior run, a fire within the next 60
/// seconds counts as due (so the scheduler doesn't sit idle until the
/// *next* cron occurrence just because it started a few seconds late).
/// Once a run has happened, the next occurrence strictly after `last_run`
/// must have already arrived.
fn should_fire(schedule: &cron::Schedule, last_run: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_run {
        None => match schedule.after(&now).next() {
            Some(next_fire) => next_fire - now <= FIRE_WINDOW,
            None => false,
        },
        Some(last) => match schedule.after(&last).next() {
            Some(next_fire) => now >= next_fire,
            None => false,
        },
    }
}

/// Drives a [`Runnable`] either once (one-shot mode, used when the
/// configured cron expression is absent or invalid) or repeatedly on a cron
/// schedule until cancelled.
pub struct Scheduler<R: Runnable> {
    /// The configured cron schedule.
    schedule: Schedule,
    /// The thing fired on each due tick.
    runnable: R,
    /// The time source used to evaluate cron arithmetic.
    clock: Box<dyn Clock>,
}

impl<R: Runnable> Scheduler<R> {
    /// Creates a scheduler using the system clock.
    pub fn new(schedule: Schedule, runnable: R) -> Self {
        Self::with_clock(schedule, runnable, Box::new(SystemClock))
    }

    /// Creates a scheduler with an injected clock, for deterministic tests.
    pub fn with_clock(schedule: Schedule, runnable: R, clock: Box<dyn Clock>) -> Self {
        Self {
            schedule,
            runnable,
            clock,
        }
    }

    /// Runs until `cancellation` is triggered.
    ///
    /// With an invalid or missing cron expression, falls back to a single
    /// one-shot run and returns immediately, per SPEC_FULL.md §4.6 — an
    /// unparsable schedule must never crash the process.
    pub async fn run(&self, cancellation: CancellationToken) -> anyhow::Result<()> {
        let Some(parsed) = self.schedule.parsed() else {
            warn!(
                "cron expression `{}` is not viable; running once and exiting",
                self.schedule.expression()
            );
            return self.runnable.run_once().await;
        };

        info!("scheduler starting with cron `{}`", self.schedule.expression());

        let mut last_run: Option<DateTime<Utc>> = None;

        loop {
            if cancellation.is_cancelled() {
                break;
            }

            let now = self.clock.now();
            if should_fire(&parsed, last_run, now) {
                if let Err(err) = self.runnable.run_once().await {
                    error!("scheduled run failed: {err}");
                }
                last_run = Some(self.clock.now());
            }

            tokio::select! {
                () = cancellation.cancelled() => break,
                () = tokio::time::sleep(POLL_INTERVAL) => {}
            }
        }

        info!("scheduler stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use crate::clock::FakeClock;

    #[derive(Clone, Default)]
    struct CountingRunnable {
        count: Arc<AtomicUsize>,
    }

    impl CountingRunnable {
        fn count(&self) -> usize {
            self.count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Runnable for CountingRunnable {
        async fn run_once(&self) -> anyhow::Result<()> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn base_time() -> DateTime<Utc> {
        "2026-01-01T10:00:00Z".parse().unwrap()
    }

    #[test]
    fn fires_immediately_when_first_occurrence_is_within_the_window() {
        let schedule = cron::Schedule::try_from("0 5 10 * * *").unwrap();
        let now = base_time();
        assert!(should_fire(&schedule, None, now));
    }

    #[test]
    fn does_not_fire_when_first_occurrence_is_far_away() {
        let schedule = cron::Schedule::try_from("0 0 0 * * *").unwrap();
        let now = base_time();
        assert!(!should_fire(&schedule, None, now));
    }

    #[test]
    fn fires_once_past_crossing_the_next_occurrence() {
        let schedule = cron::Schedule::try_from("*/5 * * * * *").unwrap();
        let last = base_time();
        assert!(!should_fire(&schedule, Some(last), last + chrono::Duration::seconds(2)));
        assert!(should_fire(&schedule, Some(last), last + chrono::Duration::seconds(5)));
    }

    #[tokio::test]
    async fn invalid_cron_falls_back_to_one_shot() {
        let schedule = Schedule::new("not a cron expression");
        let runnable = CountingRunnable::default();
        let scheduler = Scheduler::new(schedule, runnable.clone());

        scheduler.run(CancellationToken::new()).await.unwrap();

        assert_eq!(runnable.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_mode_fires_on_each_due_poll_and_stops_on_cancellation() {
        let clock = FakeClock::new(base_time());
        // Fires every second, so it is always "due" on the very next poll.
        let schedule = Schedule::new("*/1 * * * * *");
        let runnable = CountingRunnable::default();
        let scheduler = Arc::new(Scheduler::with_clock(schedule, runnable.clone(), Box::new(clock.clone())));

        let cancellation = CancellationToken::new();
        let handle = {
            let scheduler = scheduler.clone();
            let cancellation = cancellation.clone();
            tokio::spawn(async move { scheduler.run(cancellation).await })
        };

        // Let the scheduler observe its first tick before it starts sleeping.
        tokio::task::yield_now().await;
        assert_eq!(runnable.count(), 1);

        clock.advance(chrono::Duration::seconds(30));
        tokio::time::advance(POLL_INTERVAL).await;
        tokio::task::yield_now().await;
        assert_eq!(runnable.count(), 2);

        cancellation.cancel();
        handle.await.unwrap().unwrap();
    }
}
