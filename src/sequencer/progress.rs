//! Sequential progress animation for the processing stage
//!
//! Sub-steps fill one after another, never concurrently. When the last one
//! reaches 100 % the animator hands out the `Completion` token that lets the
//! pipeline controller finish the run.

use std::time::Duration;

use tracing::{debug, info};

use crate::pipeline::ProcessingRun;
use crate::timing::Scheduler;

/// A labelled sub-step of the processing animation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressStep {
    pub label: String,
    pub duration: Duration,
}

impl ProgressStep {
    pub fn new(label: impl Into<String>, duration: Duration) -> Self {
        Self {
            label: label.into(),
            duration,
        }
    }
}

/// Layout of sub-steps on the animation's time axis
///
/// Step `i` starts after every earlier step has finished plus one gap per
/// earlier step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressPlan {
    steps: Vec<ProgressStep>,
    gap: Duration,
}

impl ProgressPlan {
    pub fn new(steps: Vec<ProgressStep>, gap: Duration) -> Self {
        Self { steps, gap }
    }

    pub fn steps(&self) -> &[ProgressStep] {
        &self.steps
    }

    /// Start and end offsets of step `index`
    pub fn window(&self, index: usize) -> Option<(Duration, Duration)> {
        let step = self.steps.get(index)?;
        let start = self.steps[..index]
            .iter()
            .map(|s| s.duration + self.gap)
            .sum::<Duration>();
        Some((start, start + step.duration))
    }

    /// Time from start until the last step reaches 100 %
    pub fn total(&self) -> Duration {
        match self.steps.len() {
            0 => Duration::ZERO,
            n => {
                let busy = self.steps.iter().map(|s| s.duration).sum::<Duration>();
                busy + self.gap * (n as u32 - 1)
            }
        }
    }

    /// Percent complete of every step `elapsed` after start
    ///
    /// Finished steps read 100, steps not yet started read 0, and the active
    /// step is linear in its own window.
    pub fn progress_at(&self, elapsed: Duration) -> Vec<f64> {
        (0..self.steps.len())
            .filter_map(|i| self.window(i))
            .map(|(start, end)| {
                if elapsed >= end {
                    100.0
                } else if elapsed < start {
                    0.0
                } else {
                    let into = (elapsed - start).as_secs_f64();
                    into / (end - start).as_secs_f64() * 100.0
                }
            })
            .collect()
    }

    /// Step that is partway filled at `elapsed`, if any
    pub fn active_step(&self, elapsed: Duration) -> Option<usize> {
        (0..self.steps.len()).find(|&i| {
            self.window(i)
                .map(|(start, end)| elapsed >= start && elapsed < end)
                .unwrap_or(false)
        })
    }
}

/// Proof that a processing run played to the end
///
/// Only the progress animator can create one, so the controller's
/// completion transition cannot be triggered from anywhere else.
#[derive(Debug, PartialEq, Eq)]
pub struct Completion {
    run: ProcessingRun,
}

impl Completion {
    pub fn run(&self) -> ProcessingRun {
        self.run
    }
}

/// Progress readout at one tick
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub elapsed: Duration,
    pub active_step: Option<usize>,
    pub percents: Vec<f64>,
}

#[derive(Debug)]
pub enum ProgressEffect {
    /// Periodic progress readout
    Tick(ProgressSnapshot),
    /// All steps finished
    Complete(Completion),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProgressTimer {
    Tick,
    Complete,
}

/// Drives a `ProgressPlan` for one processing run
#[derive(Debug)]
pub struct ProcessingAnimator {
    run: ProcessingRun,
    plan: ProgressPlan,
    tick: Duration,
    timers: Scheduler<ProgressTimer>,
    /// Step reported as active by the latest snapshot
    active_step: Option<usize>,
    finished: bool,
}

impl ProcessingAnimator {
    /// Start animating `plan`, emitting a snapshot every `tick`
    pub fn start(run: ProcessingRun, plan: ProgressPlan, tick: Duration) -> Self {
        let mut timers = Scheduler::new();
        let total = plan.total();

        if !tick.is_zero() && tick < total {
            timers.schedule(tick, ProgressTimer::Tick);
        }
        timers.schedule(total, ProgressTimer::Complete);

        info!(
            %run,
            steps = plan.steps().len(),
            total_ms = total.as_millis() as u64,
            "processing animation started"
        );

        Self {
            run,
            plan,
            tick,
            timers,
            active_step: None,
            finished: false,
        }
    }

    pub fn run(&self) -> ProcessingRun {
        self.run
    }

    /// Current readout without waiting for a tick
    #[cfg(test)]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.snapshot_at(self.timers.now())
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Time until the next tick or completion
    pub fn time_until_next(&self) -> Option<Duration> {
        self.timers.time_until_next()
    }

    /// Cancel every pending tick and the completion
    pub fn cancel(&mut self) -> usize {
        let cancelled = self.timers.cancel_all();
        if cancelled > 0 {
            debug!(run = %self.run, cancelled, "processing animation cancelled");
        }
        cancelled
    }

    /// Move time forward by `by`, returning effects in fire order
    pub fn advance(&mut self, by: Duration) -> Vec<ProgressEffect> {
        if self.finished {
            return Vec::new();
        }
        let target = self.timers.now() + by;
        let mut effects = Vec::new();

        while let Some(timer) = self.timers.pop_due(target) {
            let now = self.timers.now();
            match timer {
                ProgressTimer::Tick => {
                    let snapshot = self.snapshot_at(now);
                    self.note_active_step(snapshot.active_step);
                    effects.push(ProgressEffect::Tick(snapshot));
                    if now + self.tick < self.plan.total() {
                        self.timers.schedule(self.tick, ProgressTimer::Tick);
                    }
                }
                ProgressTimer::Complete => {
                    self.finished = true;
                    info!(run = %self.run, "processing animation finished");
                    effects.push(ProgressEffect::Tick(self.snapshot_at(now)));
                    effects.push(ProgressEffect::Complete(Completion { run: self.run }));
                }
            }
        }
        self.timers.settle(target);
        effects
    }

    fn note_active_step(&mut self, step: Option<usize>) {
        if step == self.active_step {
            return;
        }
        self.active_step = step;
        if let Some(label) = step.and_then(|i| self.plan.steps().get(i)).map(|s| &s.label) {
            debug!(run = %self.run, step = %label, "processing step active");
        }
    }

    fn snapshot_at(&self, elapsed: Duration) -> ProgressSnapshot {
        ProgressSnapshot {
            elapsed,
            active_step: self.plan.active_step(elapsed),
            percents: self.plan.progress_at(elapsed),
        }
    }
}
