//! Sequencer module for timed step animations
//!
//! Provides the two timer-driven animators:
//! - `SceneSequencer`: auto-playing stepper with manual navigation
//! - `ProcessingAnimator`: sequential progress bars for the processing stage

mod progress;
mod scenes;

pub use progress::{Completion, ProcessingAnimator, ProgressEffect, ProgressPlan, ProgressStep};
pub use scenes::{SceneSequencer, SequencerConfig, SequencerEffect};

#[cfg(test)]
pub use scenes::SequencerState;

/// Errors building a sequence
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    #[error("sequence has no steps")]
    Empty,
}
