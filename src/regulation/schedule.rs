//! Resolves which rule and day schedule govern a teacher on a date.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::model::{
    membership::{Membership, MembershipKind},
    rule::{AttendanceEvent, Rule},
    schedule::DaySchedule,
};
use crate::store::{AttendanceStore, StoreResult};

/// What the rule says about one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPlan {
    /// Attendance is expected against this day schedule. `forced` is set when
    /// an override (must-day or attendance event) turned the day on.
    Attend { schedule_id: u64, forced: bool },
    /// The weekday template has nothing for this day.
    Off,
    /// A never-day or a non-attendance event covers the date.
    Suspended,
}

/// Applies the override precedence for `date`:
/// suspension, then forcing, then the weekday template.
pub fn plan_day(rule: &Rule, events: &[AttendanceEvent], date: NaiveDate) -> DayPlan {
    let covering: Vec<&AttendanceEvent> = events.iter().filter(|e| e.covers(date)).collect();

    if rule.never_attend_on(date) || covering.iter().any(|e| !e.is_attendance_day) {
        return DayPlan::Suspended;
    }

    let forced = rule.must_attend_on(date) || covering.iter().any(|e| e.is_attendance_day);
    match rule.week.for_date(date) {
        Some(schedule_id) => DayPlan::Attend {
            schedule_id,
            forced,
        },
        None if forced => match rule.week.first_configured() {
            Some(schedule_id) => DayPlan::Attend {
                schedule_id,
                forced,
            },
            None => DayPlan::Off,
        },
        None => DayPlan::Off,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// No attendee membership is effective on the date.
    Ungoverned,
    /// The teacher is listed as a non-attendee of their rule.
    Exempt { membership: Membership, rule: Rule },
    Governed {
        membership: Membership,
        rule: Rule,
        plan: DayPlan,
        schedule: Option<DaySchedule>,
    },
}

impl Resolution {
    pub fn schedule(&self) -> Option<&DaySchedule> {
        match self {
            Resolution::Governed { schedule, .. } => schedule.as_ref(),
            _ => None,
        }
    }

    pub fn membership(&self) -> Option<&Membership> {
        match self {
            Resolution::Ungoverned => None,
            Resolution::Exempt { membership, .. } | Resolution::Governed { membership, .. } => {
                Some(membership)
            }
        }
    }

    pub fn is_suspended(&self) -> bool {
        matches!(
            self,
            Resolution::Governed {
                plan: DayPlan::Suspended,
                ..
            }
        )
    }
}

#[derive(Clone)]
pub struct ScheduleResolver {
    store: Arc<dyn AttendanceStore>,
}

impl ScheduleResolver {
    pub fn new(store: Arc<dyn AttendanceStore>) -> Self {
        Self { store }
    }

    /// Depends only on memberships effective on `date` and the rule's data,
    /// never on the current time.
    pub async fn resolve(&self, teacher_id: u64, date: NaiveDate) -> StoreResult<Resolution> {
        let Some(membership) = self
            .store
            .latest_membership(teacher_id, MembershipKind::Attendee, date)
            .await?
        else {
            return Ok(Resolution::Ungoverned);
        };
        let rule = self.store.rule(membership.rule_id).await?;

        let exemption = self
            .store
            .latest_membership(teacher_id, MembershipKind::NonAttendee, date)
            .await?;
        // A later attendee membership on the same rule lifts the exemption
        if exemption.is_some_and(|m| {
            m.rule_id == rule.id && (m.joined_on, m.id) >= (membership.joined_on, membership.id)
        }) {
            return Ok(Resolution::Exempt { membership, rule });
        }

        let events = self.store.events_covering(rule.id, date).await?;
        let plan = plan_day(&rule, &events, date);
        let schedule = match plan {
            DayPlan::Attend { schedule_id, .. } => {
                Some(self.store.day_schedule(schedule_id).await?)
            }
            DayPlan::Off | DayPlan::Suspended => None,
        };

        Ok(Resolution::Governed {
            membership,
            rule,
            plan,
            schedule,
        })
    }
}
