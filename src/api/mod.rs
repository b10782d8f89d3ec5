pub mod attendance;
pub mod attendance_time;
pub mod enrollment;
pub mod error;
pub mod place;
pub mod rule;
pub mod summary;
