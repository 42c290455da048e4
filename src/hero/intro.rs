//! Single-screen hero intro: a fixed cue list played on one scheduler
//!
//! Restarting cancels every outstanding cue before replaying, so a stale cue
//! from an earlier run can never fire into a fresh one.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::timing::{Scheduler, Timeline};

/// Visual cues of the intro, in firing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeroCue {
    DimOverlay,
    PillarData,
    PillarCompute,
    PillarArchitecture,
    PowerMessage,
    SuckIn,
    HidePowerMessage,
    ClearOverlay,
    RawInput,
    InputArrows,
    FourDNodes,
    BackboneEntry,
    BackboneStage1,
    BackboneStage2,
    BackboneStage4,
    Normalization,
    LatentRepresentation,
    DownstreamHead,
    RevealPredictions,
    Interpretation,
    /// Last cue; the intro stops playing after it
    SequenceComplete,
}

/// Offsets in milliseconds from the start of the intro
fn intro_timeline() -> Timeline<HeroCue> {
    Timeline::new()
        .at(100, HeroCue::DimOverlay)
        .at(800, HeroCue::PillarData)
        .at(1600, HeroCue::PillarCompute)
        .at(2400, HeroCue::PillarArchitecture)
        .at(3400, HeroCue::PowerMessage)
        .at(5500, HeroCue::SuckIn)
        .at(6100, HeroCue::HidePowerMessage)
        .at(6300, HeroCue::ClearOverlay)
        .at(6800, HeroCue::RawInput)
        .at(7800, HeroCue::InputArrows)
        .at(8800, HeroCue::FourDNodes)
        .at(10000, HeroCue::BackboneEntry)
        .at(10700, HeroCue::BackboneStage1)
        .at(11400, HeroCue::BackboneStage2)
        .at(12100, HeroCue::BackboneStage4)
        .at(14100, HeroCue::Normalization)
        .at(15100, HeroCue::LatentRepresentation)
        .at(15800, HeroCue::DownstreamHead)
        .at(16600, HeroCue::RevealPredictions)
        .at(17600, HeroCue::Interpretation)
        .at(19000, HeroCue::SequenceComplete)
}

pub struct HeroIntro {
    timeline: Timeline<HeroCue>,
    timers: Scheduler<HeroCue>,
    playing: bool,
}

impl HeroIntro {
    pub fn new() -> Self {
        Self {
            timeline: intro_timeline(),
            timers: Scheduler::new(),
            playing: false,
        }
    }

    #[cfg(test)]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Length of one full play-through
    pub fn duration(&self) -> Duration {
        self.timeline.duration()
    }

    pub fn time_until_next(&self) -> Option<Duration> {
        self.timers.time_until_next()
    }

    /// Start playing; ignored while already playing
    pub fn play(&mut self) {
        if self.playing {
            return;
        }
        self.timeline.play(&mut self.timers);
        self.playing = true;
        info!(
            cues = self.timeline.len(),
            duration_ms = self.duration().as_millis() as u64,
            "hero intro playing"
        );
    }

    /// Drop all outstanding cues and play from the top
    pub fn restart(&mut self) {
        self.stop();
        self.play();
    }

    /// Drop all outstanding cues
    pub fn stop(&mut self) {
        let cancelled = self.timers.cancel_all();
        if self.playing {
            debug!(cancelled, "hero intro stopped");
        }
        self.playing = false;
    }

    /// Move time forward, returning the cues that fired in order
    pub fn advance(&mut self, by: Duration) -> Vec<HeroCue> {
        let cues = self.timers.advance(by);
        if cues.contains(&HeroCue::SequenceComplete) {
            self.playing = false;
            info!("hero intro complete");
        }
        cues
    }
}

impl Default for HeroIntro {
    fn default() -> Self {
        Self::new()
    }
}
