//! Configuration loading and management

use std::time::Duration;

use crate::pipeline::COUNT_UP_DURATION;
use crate::sequencer::{ProgressPlan, ProgressStep, SequencerConfig};

const DEFAULT_ACCESS_CODE: &str = "arpa2026";

/// Processing sub-steps shown while the model "runs"
const DEFAULT_PROCESSING_STEPS: [(&str, u64); 4] = [
    ("Data Preprocessing", 1200),
    ("Model Loading", 1200),
    ("Inference", 1200),
    ("Post-processing", 1200),
];

/// Errors reading configuration from the environment
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a whole number of milliseconds, got '{value}'")]
    InvalidMillis { var: &'static str, value: String },

    #[error("{var} must be true or false, got '{value}'")]
    InvalidBool { var: &'static str, value: String },
}

/// Demo configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Time each hero scene stays up while auto-playing
    pub auto_advance: Duration,

    /// Time between the hero finishing and handing off to the upload section
    pub handoff_delay: Duration,

    /// Whether the hero starts auto-playing
    pub autoplay: bool,

    /// Pause between processing sub-steps
    pub step_gap: Duration,

    /// Interval between processing progress snapshots
    pub progress_tick: Duration,

    /// Processing sub-steps and their durations
    pub processing_steps: Vec<ProgressStep>,

    /// Length of the result figures' count-up
    pub count_up: Duration,

    /// Code that unlocks the demo
    pub access_code: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_advance: Duration::from_millis(6000),
            handoff_delay: Duration::from_millis(6000),
            autoplay: true,
            step_gap: Duration::from_millis(300),
            progress_tick: Duration::from_millis(100),
            processing_steps: DEFAULT_PROCESSING_STEPS
                .iter()
                .map(|&(label, ms)| ProgressStep::new(label, Duration::from_millis(ms)))
                .collect(),
            count_up: COUNT_UP_DURATION,
            access_code: DEFAULT_ACCESS_CODE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(d) = millis(&lookup, "NEUROSCROLL_AUTO_ADVANCE_MS")? {
            config.auto_advance = d;
        }
        if let Some(d) = millis(&lookup, "NEUROSCROLL_HANDOFF_MS")? {
            config.handoff_delay = d;
        }
        if let Some(d) = millis(&lookup, "NEUROSCROLL_STEP_GAP_MS")? {
            config.step_gap = d;
        }
        if let Some(d) = millis(&lookup, "NEUROSCROLL_TICK_MS")? {
            config.progress_tick = d;
        }
        if let Some(d) = millis(&lookup, "NEUROSCROLL_COUNT_UP_MS")? {
            config.count_up = d;
        }
        if let Some(value) = lookup("NEUROSCROLL_AUTOPLAY") {
            config.autoplay = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidBool {
                        var: "NEUROSCROLL_AUTOPLAY",
                        value,
                    })
                }
            };
        }
        if let Some(code) = lookup("NEUROSCROLL_ACCESS_CODE") {
            config.access_code = code;
        }

        Ok(config)
    }

    pub fn sequencer(&self) -> SequencerConfig {
        SequencerConfig {
            advance_delay: self.auto_advance,
            handoff_delay: self.handoff_delay,
            autoplay: self.autoplay,
        }
    }

    pub fn progress_plan(&self) -> ProgressPlan {
        ProgressPlan::new(self.processing_steps.clone(), self.step_gap)
    }
}

fn millis<F>(lookup: &F, var: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|_| ConfigError::InvalidMillis { var, value }),
    }
}
