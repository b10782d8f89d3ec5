//! Persistence port for the attendance entities.
//!
//! Handlers and the regulation core only talk to `AttendanceStore`; the MySQL
//! adapter is the production implementation.

#[cfg(test)]
pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::biometric::Descriptor;
use crate::model::{
    check_in::{CheckInRecord, NewCheckIn},
    membership::{Membership, MembershipKind},
    place::{NewPlace, Place},
    rule::{AttendanceEvent, NewEvent, NewRule, Rule},
    schedule::{DaySchedule, NewDaySchedule},
    summary::DailySummary,
};

pub use mysql::MySqlStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => StoreError::NotFound("row".into()),
            // MySQL reports both duplicate keys and FK violations as SQLSTATE 23000
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000") => {
                StoreError::Conflict(db_err.message().to_string())
            }
            _ => StoreError::Backend(e.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    // --- People and memberships ---
    async fn teacher_ids(&self) -> StoreResult<Vec<u64>>;

    /// Membership of `kind` with the greatest `joined_on` on or before `date`.
    async fn latest_membership(
        &self,
        teacher_id: u64,
        kind: MembershipKind,
        date: NaiveDate,
    ) -> StoreResult<Option<Membership>>;

    async fn first_membership(&self, teacher_id: u64) -> StoreResult<Option<Membership>>;

    async fn add_membership(
        &self,
        teacher_id: u64,
        rule_id: u64,
        kind: MembershipKind,
        joined_on: NaiveDateTime,
    ) -> StoreResult<Membership>;

    // --- Configuration ---
    async fn create_place(&self, place: NewPlace) -> StoreResult<Place>;

    async fn place(&self, place_id: u64) -> StoreResult<Place>;

    async fn list_places(&self) -> StoreResult<Vec<Place>>;

    async fn create_day_schedule(&self, schedule: NewDaySchedule) -> StoreResult<DaySchedule>;

    async fn day_schedule(&self, schedule_id: u64) -> StoreResult<DaySchedule>;

    async fn list_day_schedules(&self) -> StoreResult<Vec<DaySchedule>>;

    /// Creates the rule with its override days, memberships and events.
    async fn create_rule(&self, rule: NewRule, joined_on: NaiveDateTime) -> StoreResult<Rule>;

    async fn rule(&self, rule_id: u64) -> StoreResult<Rule>;

    async fn add_event(&self, rule_id: u64, event: NewEvent) -> StoreResult<AttendanceEvent>;

    async fn events_covering(
        &self,
        rule_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Vec<AttendanceEvent>>;

    async fn rule_events(&self, rule_id: u64) -> StoreResult<Vec<AttendanceEvent>>;

    // --- Biometrics ---
    async fn face_descriptors(&self, teacher_id: u64) -> StoreResult<Vec<Descriptor>>;

    async fn all_face_descriptors(&self) -> StoreResult<Vec<(u64, Descriptor)>>;

    // --- Check-ins ---
    async fn insert_check_in(&self, record: NewCheckIn) -> StoreResult<CheckInRecord>;

    /// Appends to the record's comment; the record must belong to `teacher_id`.
    async fn append_comment(
        &self,
        record_id: u64,
        teacher_id: u64,
        comment: &str,
    ) -> StoreResult<CheckInRecord>;

    async fn check_ins_on(
        &self,
        membership_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Vec<CheckInRecord>>;

    async fn check_ins_between(
        &self,
        teacher_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<CheckInRecord>>;

    // --- Daily summaries ---
    async fn summary_exists(&self, teacher_id: u64, date: NaiveDate) -> StoreResult<bool>;

    /// Returns false when a row for the same teacher and date already existed.
    async fn insert_summary(&self, summary: DailySummary) -> StoreResult<bool>;

    async fn summaries_between(
        &self,
        teacher_id: Option<u64>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<DailySummary>>;
}

/// Appends `addition` to an existing comment on a new line.
pub(crate) fn merge_comment(existing: Option<&str>, addition: &str) -> String {
    match existing {
        Some(current) if !current.is_empty() => format!("{current}\n{addition}"),
        _ => addition.to_string(),
    }
}
