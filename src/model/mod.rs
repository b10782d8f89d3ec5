pub mod check_in;
pub mod membership;
pub mod place;
pub mod role;
pub mod rule;
pub mod schedule;
pub mod summary;
pub mod time_slot;
