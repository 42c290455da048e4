//! Hero section animations
//!
//! The seven-scene walkthrough stepped by `SceneSequencer`, the single-screen
//! intro cue list, and the headline typewriter.

mod intro;
mod typewriter;

use serde::{Deserialize, Serialize};

pub use intro::{HeroCue, HeroIntro};
pub use typewriter::{Typewriter, TypewriterConfig};

/// Scenes of the hero walkthrough, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scene {
    PowerUp,
    RawInput,
    FourDRepresentation,
    Backbone,
    Downstream,
    Prediction,
    Interpretation,
}

impl Scene {
    pub const ALL: [Scene; 7] = [
        Scene::PowerUp,
        Scene::RawInput,
        Scene::FourDRepresentation,
        Scene::Backbone,
        Scene::Downstream,
        Scene::Prediction,
        Scene::Interpretation,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Scene::PowerUp => "Power-Up",
            Scene::RawInput => "Raw Input",
            Scene::FourDRepresentation => "4D Rep",
            Scene::Backbone => "Backbone",
            Scene::Downstream => "Downstream",
            Scene::Prediction => "Prediction",
            Scene::Interpretation => "Interpretation",
        }
    }
}

impl std::fmt::Display for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Phrases cycled by the headline typewriter
pub const HEADLINE_PHRASES: [&str; 3] = [
    "for Brain Imaging?",
    "for fMRI?",
    "for EEG?",
];
