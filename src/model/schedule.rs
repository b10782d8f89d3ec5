use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::time_slot::{SlotTimes, TimeSlot};

/// The set of slots attended on one weekday ("attendance time").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DaySchedule {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub slots: Vec<TimeSlot>,
}

impl DaySchedule {
    pub fn slot(&self, slot_id: u64) -> Option<&TimeSlot> {
        self.slots.iter().find(|slot| slot.id == slot_id)
    }

    /// Every slot is opened once and closed once.
    pub fn required_checks(&self) -> u32 {
        self.slots.len() as u32 * 2
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewDaySchedule {
    #[schema(example = "Weekday teaching")]
    pub name: String,
    pub description: Option<String>,
    pub slots: Vec<SlotTimes>,
}

/// Weekly template: one optional day schedule id per weekday, Monday first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekTemplate(pub [Option<u64>; 7]);

impl WeekTemplate {
    pub fn get(&self, weekday: Weekday) -> Option<u64> {
        self.0[weekday.num_days_from_monday() as usize]
    }

    pub fn for_date(&self, date: NaiveDate) -> Option<u64> {
        self.get(date.weekday())
    }

    /// First configured schedule scanning Monday to Sunday.
    pub fn first_configured(&self) -> Option<u64> {
        self.0.iter().flatten().copied().next()
    }
}

#[cfg(test)]
mod schedule_tests {
    use super::*;

    #[test]
    fn weekday_lookup_is_monday_indexed() {
        let week = WeekTemplate([Some(1), Some(2), None, None, None, None, Some(7)]);
        assert_eq!(week.get(Weekday::Mon), Some(1));
        assert_eq!(week.get(Weekday::Tue), Some(2));
        assert_eq!(week.get(Weekday::Wed), None);
        assert_eq!(week.get(Weekday::Sun), Some(7));

        // 2024-03-03 is a Sunday
        let sunday = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
        assert_eq!(week.for_date(sunday), Some(7));
    }

    #[test]
    fn first_configured_skips_empty_days() {
        let week = WeekTemplate([None, None, Some(5), None, Some(9), None, None]);
        assert_eq!(week.first_configured(), Some(5));
        assert_eq!(WeekTemplate::default().first_configured(), None);
    }
}
