use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::schedule::WeekTemplate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Rule {
    pub id: u64,
    pub name: String,
    /// Geofence for check-ins; `None` means unrestricted.
    pub place_id: Option<u64>,
    #[schema(value_type = Vec<Option<u64>>, example = json!([1, 1, 1, 1, 1, null, null]))]
    pub week: WeekTemplate,
    #[schema(value_type = Vec<String>)]
    pub must_attendance_days: Vec<NaiveDate>,
    #[schema(value_type = Vec<String>)]
    pub never_attendance_days: Vec<NaiveDate>,
}

impl Rule {
    pub fn must_attend_on(&self, date: NaiveDate) -> bool {
        self.must_attendance_days.contains(&date)
    }

    pub fn never_attend_on(&self, date: NaiveDate) -> bool {
        self.never_attendance_days.contains(&date)
    }
}

/// A date range marked as an exception to the weekly template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceEvent {
    pub id: u64,
    pub rule_id: u64,
    #[schema(example = "2026-10-01", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-10-07", value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub is_attendance_day: bool,
    pub description: String,
}

impl AttendanceEvent {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewEvent {
    #[schema(example = "2026-10-01", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-10-07", value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub is_attendance_day: bool,
    #[schema(example = "National holiday")]
    #[serde(default)]
    pub description: String,
}

impl NewEvent {
    pub fn validate(&self) -> Result<(), String> {
        if self.start_date > self.end_date {
            return Err("start_date cannot be after end_date".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewRule {
    #[schema(example = "Teaching staff")]
    pub name: String,
    pub place_id: Option<u64>,
    #[schema(value_type = Vec<Option<u64>>, example = json!([1, 1, 1, 1, 1, null, null]))]
    pub week: WeekTemplate,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub must_attendance_days: Vec<NaiveDate>,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub never_attendance_days: Vec<NaiveDate>,
    #[serde(default)]
    pub attendees: Vec<u64>,
    #[serde(default)]
    pub nonattendees: Vec<u64>,
    #[serde(default)]
    pub events: Vec<NewEvent>,
}

impl NewRule {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }
        if let Some(teacher_id) = self
            .attendees
            .iter()
            .find(|id| self.nonattendees.contains(id))
        {
            return Err(format!(
                "teacher {teacher_id} cannot be both attendee and non-attendee"
            ));
        }
        self.events.iter().try_for_each(NewEvent::validate)
    }
}

#[cfg(test)]
mod rule_tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn event_coverage_is_inclusive() {
        let event = AttendanceEvent {
            id: 1,
            rule_id: 1,
            start_date: day(2024, 10, 1),
            end_date: day(2024, 10, 3),
            is_attendance_day: false,
            description: "holiday".into(),
        };
        assert!(!event.covers(day(2024, 9, 30)));
        assert!(event.covers(day(2024, 10, 1)));
        assert!(event.covers(day(2024, 10, 3)));
        assert!(!event.covers(day(2024, 10, 4)));
    }

    #[test]
    fn new_rule_rejects_overlapping_people() {
        let rule = NewRule {
            name: "Staff".into(),
            place_id: None,
            week: WeekTemplate::default(),
            must_attendance_days: vec![],
            never_attendance_days: vec![],
            attendees: vec![1, 2],
            nonattendees: vec![2],
            events: vec![],
        };
        assert!(rule.validate().unwrap_err().contains("teacher 2"));
    }

    #[test]
    fn new_event_rejects_reversed_range() {
        let event = NewEvent {
            start_date: day(2024, 5, 2),
            end_date: day(2024, 5, 1),
            is_attendance_day: false,
            description: String::new(),
        };
        assert!(event.validate().is_err());
    }
}
