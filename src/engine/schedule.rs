//! Weekly draw deadline calculation.
//!
//! Deadlines are always derived from the wall clock: nothing about the next
//! firing is stored, so a process that was down through a deadline computes
//! the right answer as soon as it starts again.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

/// A fixed weekday and local time in a configured time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklySchedule {
    pub weekday: Weekday,
    pub time: NaiveTime,
    pub tz: Tz,
}

impl WeeklySchedule {
    pub fn new(weekday: Weekday, time: NaiveTime, tz: Tz) -> Self {
        Self { weekday, time, tz }
    }

    /// First deadline strictly after `now`.
    pub fn next_deadline_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.with_timezone(&self.tz).date_naive();
        let days_ahead = (7 + i64::from(self.weekday.num_days_from_monday())
            - i64::from(today.weekday().num_days_from_monday()))
            % 7;

        let mut date = today + Duration::days(days_ahead);
        loop {
            let candidate = self.deadline_on(date);
            if candidate > now {
                return candidate;
            }
            date += Duration::days(7);
        }
    }

    /// How long to sleep until the next deadline.
    pub fn time_until_next(&self, now: DateTime<Utc>) -> std::time::Duration {
        (self.next_deadline_after(now) - now)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO)
    }

    /// Local calendar date a round with this deadline starts on (one week earlier).
    pub fn week_start_for(&self, deadline: DateTime<Utc>) -> NaiveDate {
        deadline.with_timezone(&self.tz).date_naive() - Duration::days(7)
    }

    /// The deadline instant on a given local date.
    ///
    /// Ambiguous local times take the earlier instant; times inside a DST gap
    /// move to the first minute that exists after the gap.
    pub fn deadline_on(&self, date: NaiveDate) -> DateTime<Utc> {
        let naive = date.and_time(self.time);
        match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(at) | LocalResult::Ambiguous(at, _) => at.with_timezone(&Utc),
            LocalResult::None => {
                let mut probe = naive;
                for _ in 0..(24 * 60) {
                    probe += Duration::minutes(1);
                    if let Some(at) = self.tz.from_local_datetime(&probe).earliest() {
                        return at.with_timezone(&Utc);
                    }
                }
                Utc.from_utc_datetime(&naive)
            }
        }
    }
}
