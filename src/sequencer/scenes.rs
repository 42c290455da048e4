//! Scene sequencer: auto-playing stepper over a fixed list of scenes
//!
//! Handles transitions between Idle, AutoPlaying, ManualPaused and Finished
//! based on navigation requests and its own auto-advance timer.

use std::time::Duration;

use tracing::{debug, info};

use crate::timing::{Scheduler, TimerId};

use super::SequenceError;

/// Where the sequencer is and whether it is advancing on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    /// Not advancing; auto-play has not been turned on yet
    Idle(usize),
    /// Advancing one step every auto-advance delay
    AutoPlaying(usize),
    /// Stopped by navigation or by toggling auto-play off
    ManualPaused(usize),
    /// Auto-play reached the last step
    Finished,
}

impl std::fmt::Display for SequencerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SequencerState::Idle(c) => write!(f, "Idle({c})"),
            SequencerState::AutoPlaying(c) => write!(f, "AutoPlaying({c})"),
            SequencerState::ManualPaused(c) => write!(f, "ManualPaused({c})"),
            SequencerState::Finished => write!(f, "Finished"),
        }
    }
}

/// Timing for a `SceneSequencer`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerConfig {
    /// Time spent on each step while auto-playing
    pub advance_delay: Duration,
    /// Time between finishing and the hand-off event
    pub handoff_delay: Duration,
    /// Start in `AutoPlaying` rather than `Idle`
    pub autoplay: bool,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            advance_delay: Duration::from_millis(6000),
            handoff_delay: Duration::from_millis(6000),
            autoplay: true,
        }
    }
}

/// Side effects the owner must carry out, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequencerEffect<S> {
    /// Show step `index`; re-applying a step must render the same state
    Apply { index: usize, step: S },
    /// Auto-play reached the last step (once per run)
    Complete,
    /// One-shot hand-off after finishing
    Handoff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SequencerTimer {
    Advance,
    Handoff,
}

/// Stepper over a non-empty list of steps
#[derive(Debug)]
pub struct SceneSequencer<S> {
    steps: Vec<S>,
    state: SequencerState,
    config: SequencerConfig,
    timers: Scheduler<SequencerTimer>,
    /// The single outstanding auto-advance timer, if armed
    advance_timer: Option<TimerId>,
    /// Completion already reported for this run
    completed: bool,
}

impl<S: Clone> SceneSequencer<S> {
    /// Create a sequencer over `steps`
    ///
    /// Nothing is applied and no timer is armed until `start`.
    pub fn new(steps: Vec<S>, config: SequencerConfig) -> Result<Self, SequenceError> {
        if steps.is_empty() {
            return Err(SequenceError::Empty);
        }
        Ok(Self {
            steps,
            state: Self::initial_state(&config),
            config,
            timers: Scheduler::new(),
            advance_timer: None,
            completed: false,
        })
    }

    fn initial_state(config: &SequencerConfig) -> SequencerState {
        if config.autoplay {
            SequencerState::AutoPlaying(0)
        } else {
            SequencerState::Idle(0)
        }
    }

    /// Get the current state
    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Current step index
    pub fn cursor(&self) -> usize {
        match self.state {
            SequencerState::Idle(c)
            | SequencerState::AutoPlaying(c)
            | SequencerState::ManualPaused(c) => c,
            SequencerState::Finished => self.last(),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_auto_playing(&self) -> bool {
        matches!(self.state, SequencerState::AutoPlaying(_))
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.state == SequencerState::Finished
    }

    /// Timers still waiting to fire
    #[cfg(test)]
    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }

    /// Time until the next timer fires, if any is pending
    pub fn time_until_next(&self) -> Option<Duration> {
        self.timers.time_until_next()
    }

    fn last(&self) -> usize {
        self.steps.len() - 1
    }

    /// Apply the first step and arm auto-play if enabled
    pub fn start(&mut self) -> Vec<SequencerEffect<S>> {
        let effects = vec![self.apply(0)];
        if self.is_auto_playing() {
            self.arm_or_settle();
        }
        info!(state = %self.state, steps = self.len(), "scene sequence started");
        effects
    }

    /// Cancel every timer and return to the initial state at step 0
    pub fn reset(&mut self) -> Vec<SequencerEffect<S>> {
        let cancelled = self.cancel_timers();
        debug!(cancelled, "scene sequence reset");
        self.state = Self::initial_state(&self.config);
        self.completed = false;
        self.start()
    }

    /// Cancel every timer and discard the sequencer
    ///
    /// Returns the number of timers that had not fired.
    pub fn teardown(mut self) -> usize {
        let cancelled = self.cancel_timers();
        debug!(cancelled, cursor = self.cursor(), "scene sequence torn down");
        cancelled
    }

    /// Jump to step `n`, clamped into range, and stop auto-play
    pub fn go_to(&mut self, n: isize) -> Vec<SequencerEffect<S>> {
        let target = n.clamp(0, self.last() as isize) as usize;
        let from = self.cursor();

        self.cancel_timers();
        self.transition_to(SequencerState::ManualPaused(target));

        if target != from {
            vec![self.apply(target)]
        } else {
            Vec::new()
        }
    }

    /// Step forward, stopping auto-play
    pub fn next(&mut self) -> Vec<SequencerEffect<S>> {
        self.go_to(self.cursor() as isize + 1)
    }

    /// Step back, stopping auto-play
    pub fn prev(&mut self) -> Vec<SequencerEffect<S>> {
        self.go_to(self.cursor() as isize - 1)
    }

    /// Flip between auto-play and manual control at the current step
    pub fn toggle_auto_play(&mut self) {
        match self.state {
            SequencerState::AutoPlaying(c) => {
                if let Some(id) = self.advance_timer.take() {
                    self.timers.cancel(id);
                }
                self.transition_to(SequencerState::ManualPaused(c));
            }
            SequencerState::Idle(c) | SequencerState::ManualPaused(c) => {
                self.transition_to(SequencerState::AutoPlaying(c));
                self.arm_or_settle();
            }
            SequencerState::Finished => {
                self.cancel_timers();
                self.transition_to(SequencerState::AutoPlaying(self.last()));
                self.arm_or_settle();
            }
        }
    }

    /// Move time forward by `by`, firing due timers in order
    pub fn advance(&mut self, by: Duration) -> Vec<SequencerEffect<S>> {
        let target = self.timers.now() + by;
        let mut effects = Vec::new();

        while let Some(timer) = self.timers.pop_due(target) {
            match timer {
                SequencerTimer::Advance => self.on_advance(&mut effects),
                SequencerTimer::Handoff => {
                    debug!("scene hand-off");
                    effects.push(SequencerEffect::Handoff);
                }
            }
        }
        self.timers.settle(target);
        effects
    }

    fn on_advance(&mut self, effects: &mut Vec<SequencerEffect<S>>) {
        self.advance_timer = None;

        let cursor = match self.state {
            SequencerState::AutoPlaying(c) if c < self.last() => c,
            _ => return,
        };
        let next = cursor + 1;

        effects.push(self.apply(next));

        if next == self.last() {
            self.transition_to(SequencerState::Finished);
            if !self.completed {
                self.completed = true;
                effects.push(SequencerEffect::Complete);
            }
            self.timers
                .schedule(self.config.handoff_delay, SequencerTimer::Handoff);
        } else {
            self.transition_to(SequencerState::AutoPlaying(next));
            self.arm_or_settle();
        }
    }

    /// Arm the auto-advance timer, or drop out of auto-play on the last step
    fn arm_or_settle(&mut self) {
        let cursor = self.cursor();
        if cursor < self.last() {
            if let Some(id) = self.advance_timer.take() {
                self.timers.cancel(id);
            }
            self.advance_timer = Some(
                self.timers
                    .schedule(self.config.advance_delay, SequencerTimer::Advance),
            );
        } else {
            self.transition_to(SequencerState::ManualPaused(cursor));
        }
    }

    fn cancel_timers(&mut self) -> usize {
        self.advance_timer = None;
        self.timers.cancel_all()
    }

    fn apply(&self, index: usize) -> SequencerEffect<S> {
        SequencerEffect::Apply {
            index,
            step: self.steps[index].clone(),
        }
    }

    fn transition_to(&mut self, new_state: SequencerState) {
        if new_state != self.state {
            debug!(from = %self.state, to = %new_state, "sequencer transition");
            self.state = new_state;
        }
    }
}
