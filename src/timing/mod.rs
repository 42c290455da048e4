//! Timer scheduling shared by every animated component
//!
//! - `Scheduler`: virtual-clock timer queue owned by one component
//! - `Timeline`: declarative list of timed cues played onto a scheduler

mod scheduler;
mod timeline;

pub use scheduler::{Scheduler, TimerId};
pub use timeline::Timeline;
