use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumIter};

use crate::biometric::BiometricError;
use crate::store::StoreError;

/// User-visible reason a check-in attempt was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    NoAttendanceDay,
    #[strum(serialize = "TIMESLOT_MISSING")]
    #[serde(rename = "TIMESLOT_MISSING")]
    TimeSlotMissing,
    OutOfAttendanceTime,
    NoEnrollmentData,
    IdentityMismatch,
    NoFaceDetected,
}

impl RejectReason {
    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::NoAttendanceDay => "No attendance is expected today",
            RejectReason::TimeSlotMissing => "This time slot is not scheduled today",
            RejectReason::OutOfAttendanceTime => "Outside the check-in window for this slot",
            RejectReason::NoEnrollmentData => "No face data enrolled; please register your face first",
            RejectReason::IdentityMismatch => "Face does not match the enrolled profile",
            RejectReason::NoFaceDetected => "No face detected in the submitted image",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CheckInError {
    #[error("check-in rejected: {0}")]
    Rejected(RejectReason),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Biometric(#[from] BiometricError),
    #[error("face matching task failed: {0}")]
    Matcher(String),
    #[error("could not archive proof image: {0}")]
    Proof(#[from] std::io::Error),
}

impl From<RejectReason> for CheckInError {
    fn from(reason: RejectReason) -> Self {
        CheckInError::Rejected(reason)
    }
}

impl CheckInError {
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            CheckInError::Rejected(reason) => Some(*reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn reason_codes_are_stable() {
        let codes: Vec<String> = RejectReason::iter().map(|r| r.to_string()).collect();
        assert_eq!(
            codes,
            vec![
                "NO_ATTENDANCE_DAY",
                "TIMESLOT_MISSING",
                "OUT_OF_ATTENDANCE_TIME",
                "NO_ENROLLMENT_DATA",
                "IDENTITY_MISMATCH",
                "NO_FACE_DETECTED",
            ]
        );
    }

    #[test]
    fn serde_matches_display() {
        for reason in RejectReason::iter() {
            let json = serde_json::to_value(reason).unwrap();
            assert_eq!(json, serde_json::Value::String(reason.as_ref().to_string()));
        }
    }

    #[test]
    fn enrollment_and_mismatch_read_differently() {
        assert_ne!(
            RejectReason::NoEnrollmentData.message(),
            RejectReason::IdentityMismatch.message()
        );
    }
}
