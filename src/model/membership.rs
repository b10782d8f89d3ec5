use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Which list of a rule the membership belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MembershipKind {
    Attendee,
    NonAttendee,
}

impl MembershipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipKind::Attendee => "attendee",
            MembershipKind::NonAttendee => "nonattendee",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "attendee" => Some(MembershipKind::Attendee),
            "nonattendee" => Some(MembershipKind::NonAttendee),
            _ => None,
        }
    }
}

/// Time-stamped assignment of a teacher to a rule. Never deleted, so past
/// dates keep resolving to the rule that governed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Membership {
    pub id: u64,
    pub teacher_id: u64,
    pub rule_id: u64,
    pub kind: MembershipKind,
    #[schema(example = "2026-01-01T08:00:00", value_type = String, format = "date-time")]
    pub joined_on: NaiveDateTime,
}

impl Membership {
    /// A membership counts for a date from the calendar day it was created on.
    pub fn effective_on(&self, date: NaiveDate) -> bool {
        self.joined_on.date() <= date
    }
}

/// Picks the membership with the greatest `joined_on` whose day is not after `date`.
pub fn latest_effective<'a, I>(memberships: I, date: NaiveDate) -> Option<&'a Membership>
where
    I: IntoIterator<Item = &'a Membership>,
{
    memberships
        .into_iter()
        .filter(|m| m.effective_on(date))
        .max_by_key(|m| (m.joined_on, m.id))
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewMembership {
    #[schema(example = 1001)]
    pub teacher_id: u64,
    pub kind: MembershipKind,
    /// Defaults to the server's current time.
    #[schema(example = "2026-01-01T08:00:00", value_type = Option<String>, format = "date-time")]
    pub joined_on: Option<NaiveDateTime>,
}

#[cfg(test)]
mod membership_tests {
    use super::*;

    fn joined(id: u64, rule_id: u64, y: i32, m: u32, d: u32) -> Membership {
        Membership {
            id,
            teacher_id: 1,
            rule_id,
            kind: MembershipKind::Attendee,
            joined_on: NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn latest_membership_before_date_wins() {
        let history = vec![joined(1, 10, 2024, 1, 1), joined(2, 20, 2024, 6, 1)];

        let march = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let july = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        assert_eq!(latest_effective(&history, march).map(|m| m.rule_id), Some(10));
        assert_eq!(latest_effective(&history, july).map(|m| m.rule_id), Some(20));
    }

    #[test]
    fn membership_counts_on_its_join_day() {
        let history = vec![joined(1, 10, 2024, 6, 1)];
        let join_day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let day_before = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();

        assert!(latest_effective(&history, join_day).is_some());
        assert!(latest_effective(&history, day_before).is_none());
    }

    #[test]
    fn kind_round_trips_through_db_text() {
        for kind in [MembershipKind::Attendee, MembershipKind::NonAttendee] {
            assert_eq!(MembershipKind::from_db(kind.as_str()), Some(kind));
        }
        assert_eq!(MembershipKind::from_db("other"), None);
    }
}
