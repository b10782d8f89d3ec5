//! Daily summaries: one write-once row per teacher and elapsed date.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use tracing::{error, info, warn};

use super::clock::Clock;
use super::schedule::{Resolution, ScheduleResolver};
use crate::model::summary::{CheckCounters, DailySummary};
use crate::store::{AttendanceStore, StoreResult};

/// What happened to one person-date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Inserted(DailySummary),
    AlreadySummarized,
    Ungoverned,
    /// Data for this person-date is inconsistent; logged and left alone.
    Skipped,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub inserted: usize,
    pub already_summarized: usize,
    pub ungoverned: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunReport {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Inserted(_) => self.inserted += 1,
            Outcome::AlreadySummarized => self.already_summarized += 1,
            Outcome::Ungoverned => self.ungoverned += 1,
            Outcome::Skipped => self.skipped += 1,
        }
    }

    fn merge(&mut self, other: RunReport) {
        self.inserted += other.inserted;
        self.already_summarized += other.already_summarized;
        self.ungoverned += other.ungoverned;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

pub struct Aggregator {
    store: Arc<dyn AttendanceStore>,
    resolver: ScheduleResolver,
    clock: Arc<dyn Clock>,
}

impl Aggregator {
    pub fn new(store: Arc<dyn AttendanceStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            resolver: ScheduleResolver::new(store.clone()),
            store,
            clock,
        }
    }

    /// Computes and inserts the summary for one person-date unless one exists.
    pub async fn summarize(&self, teacher_id: u64, date: NaiveDate) -> StoreResult<Outcome> {
        if self.store.summary_exists(teacher_id, date).await? {
            return Ok(Outcome::AlreadySummarized);
        }

        let resolution = self.resolver.resolve(teacher_id, date).await?;
        let Some(membership) = resolution.membership() else {
            return Ok(Outcome::Ungoverned);
        };
        let records = self.store.check_ins_on(membership.id, date).await?;

        let total_checks = match resolution.schedule() {
            Some(schedule) => schedule.required_checks(),
            None if !records.is_empty() && !matches!(resolution, Resolution::Exempt { .. }) => {
                warn!(
                    teacher_id,
                    %date,
                    checks = records.len(),
                    "check-ins recorded on a day without a schedule; not summarized"
                );
                return Ok(Outcome::Skipped);
            }
            None => 0,
        };

        let counters = CheckCounters::tally(&records);
        let summary = DailySummary {
            teacher_id,
            date,
            total_checks,
            checks: counters.checks,
            late_attendances: counters.late_attendances,
            early_leaves: counters.early_leaves,
            outside_checks: counters.outside_checks,
            holidays: u32::from(resolution.is_suspended()),
        };

        if self.store.insert_summary(summary.clone()).await? {
            Ok(Outcome::Inserted(summary))
        } else {
            Ok(Outcome::AlreadySummarized)
        }
    }

    /// Summarizes every teacher for an elapsed `date`.
    pub async fn summarize_date(&self, date: NaiveDate) -> RunReport {
        let mut report = RunReport::default();
        if date >= self.clock.today() {
            warn!(%date, "refusing to summarize a date that has not elapsed");
            return report;
        }

        let teacher_ids = match self.store.teacher_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                error!("could not list teachers for {date}: {e}");
                report.failed += 1;
                return report;
            }
        };

        for teacher_id in teacher_ids {
            self.summarize_logged(teacher_id, date, &mut report).await;
        }
        info!(%date, ?report, "daily summaries written");
        report
    }

    /// Fills every missing person-date from each teacher's first membership
    /// up to yesterday.
    pub async fn backfill(&self) -> RunReport {
        let mut report = RunReport::default();
        let Some(yesterday) = self.clock.today().checked_sub_days(Days::new(1)) else {
            return report;
        };

        let teacher_ids = match self.store.teacher_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                error!("could not list teachers for backfill: {e}");
                report.failed += 1;
                return report;
            }
        };

        for teacher_id in teacher_ids {
            report.merge(self.backfill_teacher(teacher_id, yesterday).await);
        }
        info!(?report, "summary backfill complete");
        report
    }

    async fn backfill_teacher(&self, teacher_id: u64, until: NaiveDate) -> RunReport {
        let mut report = RunReport::default();
        let first = match self.store.first_membership(teacher_id).await {
            Ok(Some(membership)) => membership.joined_on.date(),
            Ok(None) => return report,
            Err(e) => {
                error!(teacher_id, "could not load first membership: {e}");
                report.failed += 1;
                return report;
            }
        };

        for date in first.iter_days().take_while(|d| *d <= until) {
            self.summarize_logged(teacher_id, date, &mut report).await;
        }
        report
    }

    async fn summarize_logged(&self, teacher_id: u64, date: NaiveDate, report: &mut RunReport) {
        match self.summarize(teacher_id, date).await {
            Ok(outcome) => report.record(&outcome),
            Err(e) => {
                error!(teacher_id, %date, "summary failed: {e}");
                report.failed += 1;
            }
        }
    }

    /// Runs forever at `report_hour` local time. Each run backfills, so a
    /// date that failed earlier is retried along with yesterday.
    pub async fn run_daily(self: Arc<Self>, report_hour: u32) {
        loop {
            let wait = until_next_run(self.clock.now(), report_hour);
            info!("next summary run in {} minutes", wait.as_secs() / 60);
            tokio::time::sleep(wait).await;

            self.backfill().await;
        }
    }
}

/// Time from `now` until the next occurrence of `hour:00`.
pub fn until_next_run(now: NaiveDateTime, hour: u32) -> Duration {
    let at = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    let mut next = now.date().and_time(at);
    if next <= now {
        next += chrono::Duration::days(1);
    }
    (next - now).to_std().unwrap_or_default()
}
