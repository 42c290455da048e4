//! Headline typewriter
//!
//! Types a phrase one character at a time, holds it, deletes it, then moves
//! on to the next phrase, wrapping around forever.

use std::time::Duration;

use tracing::debug;

use crate::sequencer::SequenceError;
use crate::timing::Scheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypewriterConfig {
    /// Delay per typed character
    pub typing: Duration,
    /// Delay per deleted character
    pub deleting: Duration,
    /// Hold time once a phrase is fully typed
    pub pause: Duration,
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self {
            typing: Duration::from_millis(80),
            deleting: Duration::from_millis(40),
            pause: Duration::from_millis(2000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Typing,
    Holding,
    Deleting,
}

pub struct Typewriter {
    phrases: Vec<Vec<char>>,
    index: usize,
    shown: usize,
    phase: Phase,
    config: TypewriterConfig,
    timers: Scheduler<()>,
}

impl Typewriter {
    pub fn new<I, S>(phrases: I, config: TypewriterConfig) -> Result<Self, SequenceError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases: Vec<Vec<char>> = phrases
            .into_iter()
            .map(|p| p.as_ref().chars().collect())
            .collect();
        if phrases.is_empty() {
            return Err(SequenceError::Empty);
        }

        Ok(Self {
            phrases,
            index: 0,
            shown: 0,
            phase: Phase::Typing,
            config,
            timers: Scheduler::new(),
        })
    }

    /// Arm the first keystroke
    pub fn start(&mut self) {
        self.timers.cancel_all();
        self.timers.schedule(self.config.typing, ());
    }

    pub fn stop(&mut self) {
        self.timers.cancel_all();
    }

    /// Text currently visible
    pub fn visible(&self) -> String {
        self.phrases[self.index][..self.shown].iter().collect()
    }

    /// Index of the phrase being typed or deleted
    #[cfg(test)]
    pub fn phrase_index(&self) -> usize {
        self.index
    }

    pub fn time_until_next(&self) -> Option<Duration> {
        self.timers.time_until_next()
    }

    /// Move time forward, returning the visible text after each change
    pub fn advance(&mut self, by: Duration) -> Vec<String> {
        let target = self.timers.now() + by;
        let mut changes = Vec::new();

        while self.timers.pop_due(target).is_some() {
            if self.keystroke() {
                changes.push(self.visible());
            }
        }
        self.timers.settle(target);
        changes
    }

    /// Apply one timer firing and arm the next; true if the text changed
    fn keystroke(&mut self) -> bool {
        let len = self.phrases[self.index].len();
        match self.phase {
            Phase::Typing => {
                let changed = self.shown < len;
                if changed {
                    self.shown += 1;
                }
                if self.shown >= len {
                    self.phase = Phase::Holding;
                    self.timers.schedule(self.config.pause, ());
                } else {
                    self.timers.schedule(self.config.typing, ());
                }
                changed
            }
            Phase::Holding => {
                self.phase = Phase::Deleting;
                self.timers.schedule(self.config.deleting, ());
                false
            }
            Phase::Deleting => {
                let changed = self.shown > 0;
                if changed {
                    self.shown -= 1;
                }
                if self.shown == 0 {
                    self.index = (self.index + 1) % self.phrases.len();
                    self.phase = Phase::Typing;
                    debug!(phrase = self.index, "typewriter next phrase");
                    self.timers.schedule(self.config.typing, ());
                } else {
                    self.timers.schedule(self.config.deleting, ());
                }
                changed
            }
        }
    }
}
