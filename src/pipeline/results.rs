//! Canned result records shown once processing completes
//!
//! Nothing here is computed from data; every value is fixed per task.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::timing::Scheduler;

use super::catalog::Task;

/// Model performance figures shown under every prediction
const METRICS: [(&str, f64); 4] = [
    ("Accuracy", 91.2),
    ("AUC", 94.7),
    ("Sensitivity", 88.5),
    ("Specificity", 93.1),
];

/// Default duration of the count-up animation on displayed figures
pub const COUNT_UP_DURATION: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub label: &'static str,
    pub value: f64,
}

/// Static prediction result for one task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub task: Task,
    pub label: &'static str,
    /// Headline probability, in percent
    pub score: f64,
    pub summary: &'static str,
    pub metrics: Vec<Metric>,
}

impl ResultRecord {
    pub fn for_task(task: Task) -> Self {
        let (score, summary) = match task {
            Task::MciAd => (
                85.0,
                "This subject shows a high probability of conversion from MCI to Alzheimer's Disease.",
            ),
            Task::MddDx => (
                78.0,
                "Functional connectivity patterns are consistent with Major Depressive Disorder.",
            ),
            Task::OcdDx => (
                72.0,
                "Cortico-striatal signatures indicate an elevated likelihood of OCD.",
            ),
            Task::Treatment => (
                81.0,
                "This subject is predicted to respond to first-line treatment.",
            ),
        };

        Self {
            task,
            label: task.label(),
            score,
            summary,
            metrics: METRICS
                .iter()
                .map(|&(label, value)| Metric { label, value })
                .collect(),
        }
    }
}

/// Value a count-up display shows `elapsed` into its animation
///
/// Eases out cubically from zero and holds at `end` once `duration` passes.
pub fn count_up(end: f64, elapsed: Duration, duration: Duration) -> f64 {
    if duration.is_zero() {
        return end;
    }
    let progress = (elapsed.as_secs_f64() / duration.as_secs_f64()).min(1.0);
    let eased = 1.0 - (1.0 - progress).powi(3);
    eased * end
}

/// Displayed figures at one instant of the count-up
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevealFrame {
    pub score: f64,
    /// Metric values, in record order
    pub metrics: Vec<f64>,
}

/// Counts every figure of a `ResultRecord` up from zero
///
/// Emits a frame every `tick` and a final frame holding the exact figures
/// once `duration` has passed.
#[derive(Debug)]
pub struct ResultsReveal {
    record: ResultRecord,
    tick: Duration,
    duration: Duration,
    timers: Scheduler<()>,
    finished: bool,
}

impl ResultsReveal {
    pub fn start(record: ResultRecord, tick: Duration, duration: Duration) -> Self {
        let mut timers = Scheduler::new();
        timers.schedule(Self::step(tick, duration), ());
        debug!(task = %record.task, "results count-up started");

        Self {
            record,
            tick,
            duration,
            timers,
            finished: false,
        }
    }

    fn step(tick: Duration, remaining: Duration) -> Duration {
        if tick.is_zero() {
            remaining
        } else {
            tick.min(remaining)
        }
    }

    pub fn record(&self) -> &ResultRecord {
        &self.record
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn time_until_next(&self) -> Option<Duration> {
        self.timers.time_until_next()
    }

    /// Drop the remaining frames
    pub fn cancel(&mut self) -> usize {
        self.timers.cancel_all()
    }

    /// Move time forward, returning the frames that fired in order
    pub fn advance(&mut self, by: Duration) -> Vec<RevealFrame> {
        let target = self.timers.now() + by;
        let mut frames = Vec::new();

        while self.timers.pop_due(target).is_some() {
            let now = self.timers.now();
            frames.push(self.frame_at(now));
            if now < self.duration {
                self.timers
                    .schedule(Self::step(self.tick, self.duration - now), ());
            } else {
                self.finished = true;
            }
        }
        self.timers.settle(target);
        frames
    }

    fn frame_at(&self, elapsed: Duration) -> RevealFrame {
        RevealFrame {
            score: count_up(self.record.score, elapsed, self.duration),
            metrics: self
                .record
                .metrics
                .iter()
                .map(|m| count_up(m.value, elapsed, self.duration))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_task_has_a_record() {
        for task in Task::ALL {
            let record = ResultRecord::for_task(task);
            assert_eq!(record.task, task);
            assert!(record.score > 0.0 && record.score <= 100.0);
            assert_eq!(record.metrics.len(), 4);
        }
    }

    #[test]
    fn test_mci_record() {
        let record = ResultRecord::for_task(Task::MciAd);
        assert_eq!(record.score, 85.0);
        assert_eq!(record.metrics[1].label, "AUC");
        assert_eq!(record.metrics[1].value, 94.7);
    }

    #[test]
    fn test_count_up_easing() {
        let d = COUNT_UP_DURATION;
        assert_eq!(count_up(90.0, Duration::ZERO, d), 0.0);
        assert_eq!(count_up(90.0, d, d), 90.0);
        assert_eq!(count_up(90.0, d * 3, d), 90.0);

        // Ease-out: halfway in time is well past halfway in value
        let half = count_up(80.0, d / 2, d);
        assert!((half - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_count_up_zero_duration() {
        assert_eq!(count_up(42.0, Duration::ZERO, Duration::ZERO), 42.0);
    }

    #[test]
    fn test_reveal_counts_up_then_settles() {
        let ms = Duration::from_millis;
        let mut reveal =
            ResultsReveal::start(ResultRecord::for_task(Task::MciAd), ms(500), ms(2000));

        let frames = reveal.advance(ms(1999));
        assert_eq!(frames.len(), 3);
        assert!(frames.windows(2).all(|w| w[0].score < w[1].score));
        assert!(!reveal.is_finished());

        let frames = reveal.advance(ms(1));
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].score, 85.0);
        assert_eq!(frames[0].metrics, vec![91.2, 94.7, 88.5, 93.1]);
        assert!(reveal.is_finished());
        assert_eq!(reveal.time_until_next(), None);
        assert_eq!(reveal.record().task, Task::MciAd);
    }

    #[test]
    fn test_reveal_uneven_tick_lands_on_duration() {
        let ms = Duration::from_millis;
        let mut reveal =
            ResultsReveal::start(ResultRecord::for_task(Task::OcdDx), ms(300), ms(1000));

        let frames = reveal.advance(ms(5000));
        // 300, 600, 900, then the final frame at 1000
        assert_eq!(frames.len(), 4);
        assert_eq!(frames.last().map(|f| f.score), Some(72.0));
        assert!(reveal.advance(ms(5000)).is_empty());
    }

    #[test]
    fn test_reveal_cancel() {
        let ms = Duration::from_millis;
        let mut reveal =
            ResultsReveal::start(ResultRecord::for_task(Task::MddDx), ms(100), ms(2000));
        reveal.advance(ms(250));

        assert_eq!(reveal.cancel(), 1);
        assert!(reveal.advance(ms(5000)).is_empty());
        assert!(!reveal.is_finished());
    }
}
