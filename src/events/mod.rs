//! Events module for pipeline and animation transitions
//!
//! Every observable change in the demo is broadcast as a `DemoEvent`:
//! pipeline stage transitions, processing progress, scene changes and
//! hero intro cues.

use serde::{Deserialize, Serialize};

use crate::hero::{HeroCue, Scene};
use crate::pipeline::{Modality, Model, ProcessingRun, Task};

/// Events emitted by the demo runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DemoEvent {
    /// Upload detection produced a modality (model follows from it)
    ModalityDetected {
        modality: Modality,
        model: Option<Model>,
    },

    /// Task selection changed
    TaskSelected { task: Option<Task> },

    /// Processing run started
    ProcessingStarted {
        run: ProcessingRun,
        task: Option<Task>,
    },

    /// Progress snapshot for a processing run
    ProcessingProgress {
        run: ProcessingRun,
        /// Time since the run started
        elapsed_ms: u64,
        /// Index of the sub-step currently filling, if any
        active_step: Option<usize>,
        /// Percent complete for every sub-step, in order
        percents: Vec<f64>,
    },

    /// Processing run finished; results are now visible
    ProcessingComplete {
        run: ProcessingRun,
        task: Option<Task>,
    },

    /// Count-up frame of the displayed result figures
    ResultsCountUp {
        score: f64,
        /// Metric values, in record order
        metrics: Vec<f64>,
    },

    /// Count-up finished; the figures now show their final values
    ResultsReady { task: Task },

    /// Hero scene became the current scene
    SceneApplied { index: usize, scene: Scene },

    /// Hero auto-play reached the last scene
    SceneSequenceComplete,

    /// Hero demo hands off to the upload section
    SceneHandoff,

    /// Hero intro cue fired
    HeroCue { cue: HeroCue },

    /// Headline typewriter text changed
    HeadlineChanged { text: String },
}

impl std::fmt::Display for DemoEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DemoEvent::ModalityDetected { modality, model } => match model {
                Some(model) => write!(f, "MODALITY_DETECTED ({modality} -> {model})"),
                None => write!(f, "MODALITY_DETECTED ({modality})"),
            },
            DemoEvent::TaskSelected { task } => match task {
                Some(task) => write!(f, "TASK_SELECTED ({task})"),
                None => write!(f, "TASK_CLEARED"),
            },
            DemoEvent::ProcessingStarted { run, .. } => write!(f, "PROCESSING_STARTED ({run})"),
            DemoEvent::ProcessingProgress {
                run, active_step, ..
            } => match active_step {
                Some(step) => write!(f, "PROCESSING_PROGRESS ({run}, step {step})"),
                None => write!(f, "PROCESSING_PROGRESS ({run})"),
            },
            DemoEvent::ProcessingComplete { run, .. } => {
                write!(f, "PROCESSING_COMPLETE ({run})")
            }
            DemoEvent::ResultsCountUp { score, .. } => {
                write!(f, "RESULTS_COUNT_UP ({score:.1})")
            }
            DemoEvent::ResultsReady { task } => write!(f, "RESULTS_READY ({task})"),
            DemoEvent::SceneApplied { index, scene } => {
                write!(f, "SCENE_APPLIED ({index}: {scene})")
            }
            DemoEvent::SceneSequenceComplete => write!(f, "SCENE_SEQUENCE_COMPLETE"),
            DemoEvent::SceneHandoff => write!(f, "SCENE_HANDOFF"),
            DemoEvent::HeroCue { cue } => write!(f, "HERO_CUE ({cue:?})"),
            DemoEvent::HeadlineChanged { text } => write!(f, "HEADLINE ({text})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = DemoEvent::ModalityDetected {
            modality: Modality::Fmri,
            model: Some(Model::Swift),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("modality_detected"));
        assert!(json.contains("fmri"));
        assert!(json.contains("swift"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"scene_applied","index":3,"scene":"backbone"}"#;
        let event: DemoEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            DemoEvent::SceneApplied {
                index: 3,
                scene: Scene::Backbone
            }
        );
    }

    #[test]
    fn test_display() {
        let event = DemoEvent::TaskSelected { task: None };
        assert_eq!(event.to_string(), "TASK_CLEARED");

        let event = DemoEvent::ResultsCountUp {
            score: 42.26,
            metrics: vec![],
        };
        assert_eq!(event.to_string(), "RESULTS_COUNT_UP (42.3)");
    }
}
