use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One accepted check-in ("attendance history" row). Append-only; only the
/// comment may change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct CheckInRecord {
    pub id: u64,
    pub membership_id: u64,
    pub teacher_id: u64,
    pub time_slot_id: u64,
    pub is_open_attend: bool,
    #[schema(example = "2026-03-02T08:45:00", value_type = String, format = "date-time")]
    pub identified_on: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub is_right_place: bool,
    pub is_bad_attendance: bool,
    pub image: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCheckIn {
    pub membership_id: u64,
    pub teacher_id: u64,
    pub time_slot_id: u64,
    pub is_open_attend: bool,
    pub identified_on: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub is_right_place: bool,
    pub is_bad_attendance: bool,
    pub image: Option<String>,
    pub comment: Option<String>,
}

impl NewCheckIn {
    pub fn with_id(self, id: u64) -> CheckInRecord {
        CheckInRecord {
            id,
            membership_id: self.membership_id,
            teacher_id: self.teacher_id,
            time_slot_id: self.time_slot_id,
            is_open_attend: self.is_open_attend,
            identified_on: self.identified_on,
            latitude: self.latitude,
            longitude: self.longitude,
            is_right_place: self.is_right_place,
            is_bad_attendance: self.is_bad_attendance,
            image: self.image,
            comment: self.comment,
        }
    }
}
