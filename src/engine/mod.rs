//! Pure leave arithmetic: schedule windows, approval chains, return dates,
//! template rendering and request durations. Nothing in here performs I/O.

pub mod approval_chain;
pub mod duration;
pub mod next_working_day;
pub mod placeholders;
pub mod schedule_window;
