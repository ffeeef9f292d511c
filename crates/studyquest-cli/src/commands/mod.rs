pub mod badge;
pub mod config;
pub mod holiday;
pub mod stats;
pub mod streak;
pub mod task;
pub mod timer;
