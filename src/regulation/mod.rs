//! Attendance regulation: which days and slots a teacher must attend, how a
//! check-in attempt is judged, and how days are summarized.

pub mod aggregator;
pub mod clock;
pub mod error;
pub mod evaluator;
pub mod geofence;
pub mod identity;
pub mod schedule;

pub use aggregator::Aggregator;
pub use clock::{Clock, SystemClock};
pub use error::{CheckInError, RejectReason};
pub use evaluator::{CheckInEvaluator, CheckInRequest};
pub use identity::IdentityValidator;
pub use schedule::{DayPlan, Resolution, ScheduleResolver};
