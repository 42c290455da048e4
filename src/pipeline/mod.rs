//! Pipeline module for stage progression
//!
//! Tracks the demo through a fixed sequence of stages:
//! - Upload: modality detected from the uploaded file name
//! - Model selection: derived from the modality, never chosen directly
//! - Task selection: one task from a fixed catalog
//! - Processing: driven by the progress animator
//! - Results: canned record for the selected task

mod catalog;
mod controller;
mod results;

pub use catalog::{Modality, Model, Task};
pub use controller::{PipelineController, PipelineSnapshot, ProcessingRun};
pub use results::{ResultRecord, ResultsReveal, COUNT_UP_DURATION};

#[cfg(test)]
pub use controller::Stage;
