pub mod ai;
pub mod billing;
pub mod note;
pub mod schedule;
