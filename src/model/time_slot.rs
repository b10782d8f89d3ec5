use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{earlier} ({earlier_at}) must not be after {later} ({later_at})")]
pub struct SlotError {
    pub earlier: &'static str,
    pub earlier_at: NaiveTime,
    pub later: &'static str,
    pub later_at: NaiveTime,
}

/// The six boundaries of one attendance window, before it has an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SlotTimes {
    #[schema(example = "08:00:00", value_type = String, format = "time")]
    pub start_open_time: NaiveTime,
    #[schema(example = "08:30:00", value_type = String, format = "time")]
    pub open_time: NaiveTime,
    #[schema(example = "09:00:00", value_type = String, format = "time")]
    pub finish_open_time: NaiveTime,
    #[schema(example = "16:30:00", value_type = String, format = "time")]
    pub start_close_time: NaiveTime,
    #[schema(example = "17:00:00", value_type = String, format = "time")]
    pub close_time: NaiveTime,
    #[schema(example = "18:00:00", value_type = String, format = "time")]
    pub finish_close_time: NaiveTime,
}

impl SlotTimes {
    /// Checks `start_open <= open <= finish_open <= start_close <= close <= finish_close`.
    pub fn validate(&self) -> Result<(), SlotError> {
        let ordered = [
            ("start_open_time", self.start_open_time),
            ("open_time", self.open_time),
            ("finish_open_time", self.finish_open_time),
            ("start_close_time", self.start_close_time),
            ("close_time", self.close_time),
            ("finish_close_time", self.finish_close_time),
        ];

        for pair in ordered.windows(2) {
            let (earlier, earlier_at) = pair[0];
            let (later, later_at) = pair[1];
            if earlier_at > later_at {
                return Err(SlotError {
                    earlier,
                    earlier_at,
                    later,
                    later_at,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TimeSlot {
    pub id: u64,
    #[serde(flatten)]
    pub times: SlotTimes,
}

impl TimeSlot {
    pub fn new(id: u64, times: SlotTimes) -> Result<Self, SlotError> {
        times.validate()?;
        Ok(Self { id, times })
    }

    /// Acceptable check range for the given direction, inclusive on both ends.
    pub fn window(&self, direction: Direction) -> (NaiveTime, NaiveTime) {
        match direction {
            Direction::Open => (self.times.start_open_time, self.times.finish_open_time),
            Direction::Close => (self.times.start_close_time, self.times.finish_close_time),
        }
    }

    /// The instant a check in this direction is expected at.
    pub fn expected(&self, direction: Direction) -> NaiveTime {
        match direction {
            Direction::Open => self.times.open_time,
            Direction::Close => self.times.close_time,
        }
    }
}

/// Whether a check opens or closes a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Open,
    Close,
}

impl Direction {
    pub fn from_open_flag(is_open_attend: bool) -> Self {
        if is_open_attend {
            Direction::Open
        } else {
            Direction::Close
        }
    }

    pub fn is_open(self) -> bool {
        self == Direction::Open
    }
}

#[cfg(test)]
pub(crate) fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}
