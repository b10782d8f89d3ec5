use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::check_in::CheckInRecord;

/// Per teacher, per day attendance counters. Written once by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct DailySummary {
    pub teacher_id: u64,
    #[schema(example = "2026-03-02", value_type = String, format = "date")]
    pub date: NaiveDate,
    pub total_checks: u32,
    pub checks: u32,
    pub late_attendances: u32,
    pub early_leaves: u32,
    pub outside_checks: u32,
    pub holidays: u32,
}

/// Counters derived from the day's check-in records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckCounters {
    pub checks: u32,
    pub late_attendances: u32,
    pub early_leaves: u32,
    pub outside_checks: u32,
}

impl CheckCounters {
    pub fn tally(records: &[CheckInRecord]) -> Self {
        records.iter().fold(Self::default(), |mut acc, record| {
            acc.checks += 1;
            if record.is_bad_attendance {
                if record.is_open_attend {
                    acc.late_attendances += 1;
                } else {
                    acc.early_leaves += 1;
                }
            }
            if !record.is_right_place {
                acc.outside_checks += 1;
            }
            acc
        })
    }
}
