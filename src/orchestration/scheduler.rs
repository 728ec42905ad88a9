//! Weekly background cycle that keeps exactly one round open.
//!
//! The next firing is always derived from the wall clock, never stored, so a
//! process that slept through a deadline heals on its first cycle after start.

use crate::clock::Clock;
use crate::db::Repository;
use crate::domain::{Round, RoundId};
use crate::engine::{lifecycle, WeeklySchedule};
use backoff::backoff::Constant;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// What one cycle changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Rounds closed because their deadline passed.
    pub closed: Vec<RoundId>,
    /// Extra open rounds closed to restore the single-open invariant.
    pub repaired: Vec<RoundId>,
    pub opened: Option<RoundId>,
}

pub struct RoundScheduler {
    repo: Arc<Repository>,
    clock: Arc<dyn Clock>,
    schedule: WeeklySchedule,
    retry_delay: Duration,
}

impl RoundScheduler {
    pub fn new(
        repo: Arc<Repository>,
        clock: Arc<dyn Clock>,
        schedule: WeeklySchedule,
        retry_delay: Duration,
    ) -> Self {
        Self {
            repo,
            clock,
            schedule,
            retry_delay,
        }
    }

    /// One weekly cycle, applied in a single write transaction.
    ///
    /// Closes every open round whose deadline has been reached, then closes all
    /// but the newest remaining open round, then opens a round for the next
    /// deadline if none is left open.
    pub async fn run_cycle(&self) -> Result<CycleReport, sqlx::Error> {
        let now = self.clock.now();
        let mut report = CycleReport::default();
        let mut tx = self.repo.begin_write().await?;

        let mut still_open: Vec<Round> = Vec::new();
        for round in tx.open_rounds().await? {
            if lifecycle::deadline_reached(&round, now) {
                if tx.close_round(round.id, now).await? {
                    report.closed.push(round.id);
                }
            } else {
                still_open.push(round);
            }
        }

        // Newest first, so everything after the head is surplus.
        for extra in still_open.iter().skip(1) {
            if tx.close_round(extra.id, now).await? {
                report.repaired.push(extra.id);
            }
        }

        if still_open.is_empty() {
            let deadline = self.schedule.next_deadline_after(now);
            let round = Round::new_open(self.schedule.week_start_for(deadline), deadline, now);
            tx.insert_round(&round).await?;
            report.opened = Some(round.id);
        }

        tx.commit().await?;

        for round_id in &report.closed {
            info!(round_id = %round_id, "Round closed at deadline");
        }
        for round_id in &report.repaired {
            warn!(round_id = %round_id, "Closed surplus open round");
        }
        if let Some(round_id) = report.opened {
            info!(round_id = %round_id, "Opened round for next deadline");
        }
        Ok(report)
    }

    /// Run cycles until `shutdown` flips to true or its sender is dropped.
    ///
    /// The first cycle runs immediately. A failing cycle is retried after the
    /// fixed retry delay; both the retry wait and the weekly sleep are cut
    /// short by shutdown.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            weekday = %self.schedule.weekday,
            time = %self.schedule.time,
            timezone = %self.schedule.tz,
            "Round scheduler started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                report = self.cycle_with_retry() => {
                    if let Ok(report) = report {
                        info!(
                            closed = report.closed.len(),
                            repaired = report.repaired.len(),
                            opened = report.opened.is_some(),
                            "Scheduler cycle complete"
                        );
                    }
                }
                _ = shutdown.changed() => break,
            }

            let wait = self.sleep_duration().await;
            info!(sleep_secs = wait.as_secs(), "Scheduler sleeping until next deadline");
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = shutdown.changed() => break,
            }
        }

        info!("Round scheduler stopped");
    }

    /// Time until the next cycle is due.
    ///
    /// An open round whose deadline is off the weekly schedule (opened by hand,
    /// or left over from a schedule change) pulls the wake-up forward.
    async fn sleep_duration(&self) -> Duration {
        let now = self.clock.now();
        match self.repo.open_rounds().await {
            Ok(open) => self.wait_for(&open, now),
            Err(err) => {
                warn!(error = %err, "Could not read open rounds, waking after retry delay");
                self.retry_delay.min(self.schedule.time_until_next(now))
            }
        }
    }

    fn wait_for(&self, open: &[Round], now: DateTime<Utc>) -> Duration {
        open.iter()
            .map(|round| {
                (round.draw_deadline - now)
                    .to_std()
                    .unwrap_or(Duration::ZERO)
            })
            .fold(self.schedule.time_until_next(now), Duration::min)
    }

    async fn cycle_with_retry(&self) -> Result<CycleReport, sqlx::Error> {
        let this = self;
        backoff::future::retry_notify(
            Constant::new(self.retry_delay),
            move || async move { this.run_cycle().await.map_err(backoff::Error::transient) },
            |err: sqlx::Error, wait: Duration| {
                error!(error = %err, retry_in_secs = wait.as_secs(), "Scheduler cycle failed");
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::db::repo::test_support::setup_repo;
    use crate::domain::RoundStatus;
    use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, TimeZone, Utc, Weekday};

    fn schedule() -> WeeklySchedule {
        WeeklySchedule::new(
            Weekday::Sat,
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            chrono_tz::Europe::Copenhagen,
        )
    }

    // Monday 2 March 2026, 10:00 UTC.
    fn monday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap()
    }

    fn scheduler(repo: Arc<Repository>, clock: &ManualClock) -> RoundScheduler {
        scheduler_with_retry(repo, clock, Duration::from_millis(10))
    }

    fn scheduler_with_retry(
        repo: Arc<Repository>,
        clock: &ManualClock,
        retry_delay: Duration,
    ) -> RoundScheduler {
        RoundScheduler::new(repo, Arc::new(clock.clone()), schedule(), retry_delay)
    }

    async fn set_rounds_table(repo: &Repository, from: &str, to: &str) {
        sqlx::query(&format!("ALTER TABLE {} RENAME TO {}", from, to))
            .execute(repo.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_first_cycle_opens_round_for_next_deadline() {
        let (repo, _temp) = setup_repo().await;
        let clock = ManualClock::new(monday());
        let report = scheduler(repo.clone(), &clock).run_cycle().await.unwrap();

        let opened = report.opened.unwrap();
        let round = repo.get_round(opened).await.unwrap().unwrap();
        // 17:00 CET on Saturday 7 March is 16:00 UTC.
        assert_eq!(
            round.draw_deadline,
            Utc.with_ymd_and_hms(2026, 3, 7, 16, 0, 0).unwrap()
        );
        assert_eq!(
            round.week_start,
            chrono::NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
        );
    }

    #[tokio::test]
    async fn test_cycle_is_idempotent_before_deadline() {
        let (repo, _temp) = setup_repo().await;
        let clock = ManualClock::new(monday());
        let sched = scheduler(repo.clone(), &clock);
        sched.run_cycle().await.unwrap();

        clock.advance(ChronoDuration::hours(1));
        let report = sched.run_cycle().await.unwrap();
        assert_eq!(report, CycleReport::default());
        assert_eq!(repo.open_rounds().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deadline_closes_and_reopens() {
        let (repo, _temp) = setup_repo().await;
        let clock = ManualClock::new(monday());
        let sched = scheduler(repo.clone(), &clock);
        let first = sched.run_cycle().await.unwrap().opened.unwrap();

        clock.set(Utc.with_ymd_and_hms(2026, 3, 7, 16, 0, 0).unwrap());
        let report = sched.run_cycle().await.unwrap();
        assert_eq!(report.closed, vec![first]);

        let open = repo.open_rounds().await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(Some(open[0].id), report.opened);
        assert_eq!(
            open[0].draw_deadline,
            Utc.with_ymd_and_hms(2026, 3, 14, 16, 0, 0).unwrap()
        );
        assert_eq!(
            repo.get_round(first).await.unwrap().unwrap().status,
            RoundStatus::Closed
        );
    }

    #[tokio::test]
    async fn test_surplus_open_rounds_are_repaired() {
        let (repo, _temp) = setup_repo().await;
        let clock = ManualClock::new(monday());
        let deadline = Utc.with_ymd_and_hms(2026, 3, 7, 16, 0, 0).unwrap();

        let older = Round::new_open(deadline.date_naive(), deadline, monday());
        let newer = Round::new_open(
            deadline.date_naive(),
            deadline,
            monday() + ChronoDuration::minutes(5),
        );
        let mut tx = repo.begin_write().await.unwrap();
        tx.insert_round(&older).await.unwrap();
        tx.insert_round(&newer).await.unwrap();
        tx.commit().await.unwrap();

        clock.set(monday() + ChronoDuration::hours(1));
        let report = scheduler(repo.clone(), &clock).run_cycle().await.unwrap();
        assert_eq!(report.repaired, vec![older.id]);
        assert_eq!(report.opened, None);

        let open = repo.open_rounds().await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, newer.id);
    }

    #[tokio::test]
    async fn test_missed_deadline_heals_on_first_cycle() {
        let (repo, _temp) = setup_repo().await;
        let clock = ManualClock::new(monday());
        let first = scheduler(repo.clone(), &clock)
            .run_cycle()
            .await
            .unwrap()
            .opened
            .unwrap();

        // Down for three weeks.
        clock.set(monday() + ChronoDuration::days(21));
        let report = scheduler(repo.clone(), &clock).run_cycle().await.unwrap();
        assert_eq!(report.closed, vec![first]);

        let open = repo.open_rounds().await.unwrap();
        assert_eq!(open.len(), 1);
        assert!(open[0].draw_deadline > clock.now());
        assert!(open[0].draw_deadline - clock.now() <= ChronoDuration::days(7));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (repo, _temp) = setup_repo().await;
        let clock = ManualClock::new(monday());
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler(repo.clone(), &clock).run(rx));

        for _ in 0..100 {
            if !repo.open_rounds().await.unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(repo.open_rounds().await.unwrap().len(), 1);

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_sleep_wakes_for_off_schedule_deadline() {
        let (repo, _temp) = setup_repo().await;
        let clock = ManualClock::new(monday());
        let sched = scheduler(repo.clone(), &clock);

        // Nothing open: sleep until Saturday 16:00 UTC.
        assert_eq!(
            sched.sleep_duration().await,
            Duration::from_secs(5 * 24 * 3600 + 6 * 3600)
        );

        // Wednesday 4 March 16:00 UTC, off the Saturday schedule.
        let wednesday = Utc.with_ymd_and_hms(2026, 3, 4, 16, 0, 0).unwrap();
        let round = Round::new_open(wednesday.date_naive(), wednesday, monday());
        let mut tx = repo.begin_write().await.unwrap();
        tx.insert_round(&round).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(sched.run_cycle().await.unwrap(), CycleReport::default());
        assert_eq!(sched.sleep_duration().await, Duration::from_secs(54 * 3600));

        clock.set(wednesday);
        let report = sched.run_cycle().await.unwrap();
        assert_eq!(report.closed, vec![round.id]);
        assert!(report.opened.is_some());
        assert_eq!(
            repo.get_round(round.id).await.unwrap().unwrap().status,
            RoundStatus::Closed
        );
    }

    #[tokio::test]
    async fn test_failed_cycle_is_retried_until_store_recovers() {
        let (repo, _temp) = setup_repo().await;
        let clock = ManualClock::new(monday());
        set_rounds_table(&repo, "rounds", "rounds_offline").await;
        assert!(scheduler(repo.clone(), &clock).run_cycle().await.is_err());

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler(repo.clone(), &clock).run(rx));

        // Let a few attempts fail before the table comes back.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!handle.is_finished());
        set_rounds_table(&repo, "rounds_offline", "rounds").await;

        let mut open = Vec::new();
        for _ in 0..500 {
            open = repo.open_rounds().await.unwrap();
            if !open.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(open.len(), 1);
        assert_eq!(
            open[0].draw_deadline,
            Utc.with_ymd_and_hms(2026, 3, 7, 16, 0, 0).unwrap()
        );

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_retry_wait() {
        let (repo, _temp) = setup_repo().await;
        let clock = ManualClock::new(monday());
        set_rounds_table(&repo, "rounds", "rounds_offline").await;

        let (tx, rx) = watch::channel(false);
        let sched = scheduler_with_retry(repo.clone(), &clock, Duration::from_secs(3600));
        let handle = tokio::spawn(sched.run(rx));

        // The first attempt fails and the loop parks in its hour-long retry wait.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!handle.is_finished());

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler did not stop during retry wait")
            .unwrap();
    }
}
