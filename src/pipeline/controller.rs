//! Pipeline controller: the single owner of `PipelineState`
//!
//! Four transitions move the demo from upload through results. Stage gating
//! is never stored; it is read off the current state on every query.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::events::DemoEvent;
use crate::sequencer::Completion;

use super::catalog::{Modality, Model, Task};
use super::results::ResultRecord;

/// Identifier of one processing run
///
/// A completion signal only lands if it carries the identifier of the run
/// that is still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessingRun(u64);

impl ProcessingRun {
    #[cfg(test)]
    pub(crate) fn for_test(n: u64) -> Self {
        Self(n)
    }
}

impl std::fmt::Display for ProcessingRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

/// Stage of the narrative the user can currently act on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Waiting for a recognised upload
    Upload,
    /// Model selected, waiting for a task
    TaskSelection,
    /// Task selected, processing not started
    ReadyToProcess,
    /// Processing animation running
    Processing,
    /// Results visible
    Results,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Upload => write!(f, "Upload"),
            Stage::TaskSelection => write!(f, "TaskSelection"),
            Stage::ReadyToProcess => write!(f, "ReadyToProcess"),
            Stage::Processing => write!(f, "Processing"),
            Stage::Results => write!(f, "Results"),
        }
    }
}

/// Progress through the demo pipeline
///
/// Fields are only written by `PipelineController`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineState {
    modality: Modality,
    selected_task: Option<Task>,
    is_processing: bool,
    is_complete: bool,
}

impl PipelineState {
    pub fn modality(&self) -> Modality {
        self.modality
    }

    /// Always the lookup of the current modality
    pub fn selected_model(&self) -> Option<Model> {
        self.modality.model()
    }

    pub fn selected_task(&self) -> Option<Task> {
        self.selected_task
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    /// Task buttons are enabled once a model is selected
    pub fn can_select_task(&self) -> bool {
        self.selected_model().is_some()
    }

    /// The start button is enabled once a task is selected
    pub fn can_start_processing(&self) -> bool {
        self.selected_task.is_some()
    }

    pub fn results_visible(&self) -> bool {
        self.is_complete
    }

    pub fn active_stage(&self) -> Stage {
        if self.is_complete {
            Stage::Results
        } else if self.is_processing {
            Stage::Processing
        } else if self.selected_task.is_some() {
            Stage::ReadyToProcess
        } else if self.can_select_task() {
            Stage::TaskSelection
        } else {
            Stage::Upload
        }
    }

    /// Canned result record for the selected task, once results are visible
    pub fn results(&self) -> Option<ResultRecord> {
        if !self.results_visible() {
            return None;
        }
        self.selected_task.map(ResultRecord::for_task)
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            modality: self.modality(),
            model: self.selected_model(),
            task: self.selected_task(),
            is_processing: self.is_processing(),
            is_complete: self.is_complete(),
            stage: self.active_stage(),
        }
    }
}

/// Serializable view of `PipelineState` including derived fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    pub modality: Modality,
    pub model: Option<Model>,
    pub task: Option<Task>,
    pub is_processing: bool,
    pub is_complete: bool,
    pub stage: Stage,
}

/// Owns `PipelineState` and performs its transitions
pub struct PipelineController {
    state: PipelineState,
    /// Run that a completion signal must match
    active_run: Option<ProcessingRun>,
    next_run: u64,
    /// Channel for emitting pipeline events
    event_tx: broadcast::Sender<DemoEvent>,
}

impl PipelineController {
    /// Create a controller with every field empty
    pub fn new(event_tx: broadcast::Sender<DemoEvent>) -> Self {
        Self {
            state: PipelineState::default(),
            active_run: None,
            next_run: 1,
            event_tx,
        }
    }

    /// Get the current state
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Run a completion signal would currently be accepted for
    #[cfg(test)]
    pub fn active_run(&self) -> Option<ProcessingRun> {
        self.active_run
    }

    /// Record the detected modality
    ///
    /// The model follows from the modality; task and processing flags reset.
    pub fn set_modality(&mut self, modality: Modality) {
        let old_stage = self.state.active_stage();

        self.state = PipelineState {
            modality,
            ..PipelineState::default()
        };
        self.active_run = None;

        info!(
            %modality,
            model = ?self.state.selected_model(),
            "modality set"
        );
        self.log_stage(old_stage);
        self.emit(DemoEvent::ModalityDetected {
            modality,
            model: self.state.selected_model(),
        });
    }

    /// Select (or clear) the prediction task
    ///
    /// Not checked against the model; the caller disables task selection
    /// until `can_select_task` holds.
    pub fn set_task(&mut self, task: Option<Task>) {
        if task.is_some() && !self.state.can_select_task() {
            warn!(?task, "task selected with no model; results will have no context");
        }

        let old_stage = self.state.active_stage();
        self.state.selected_task = task;
        self.state.is_processing = false;
        self.state.is_complete = false;
        self.active_run = None;

        self.log_stage(old_stage);
        self.emit(DemoEvent::TaskSelected { task });
    }

    /// Start the processing stage
    ///
    /// Returns the new run, or `None` if a run is already in flight.
    pub fn start_processing(&mut self) -> Option<ProcessingRun> {
        if self.state.is_processing {
            debug!(run = ?self.active_run, "processing already running");
            return None;
        }
        if !self.state.can_start_processing() {
            warn!("processing started with no task selected");
        }

        let old_stage = self.state.active_stage();
        let run = ProcessingRun(self.next_run);
        self.next_run += 1;

        self.state.is_processing = true;
        self.state.is_complete = false;
        self.active_run = Some(run);

        self.log_stage(old_stage);
        self.emit(DemoEvent::ProcessingStarted {
            run,
            task: self.state.selected_task,
        });
        Some(run)
    }

    /// Finish processing with the token minted by the progress animator
    ///
    /// Returns false when the token belongs to a run that was superseded.
    pub fn complete_processing(&mut self, completion: Completion) -> bool {
        let run = completion.run();
        if self.active_run != Some(run) {
            debug!(%run, active = ?self.active_run, "ignoring completion for stale run");
            return false;
        }

        let old_stage = self.state.active_stage();
        self.state.is_processing = false;
        self.state.is_complete = true;
        self.active_run = None;

        self.log_stage(old_stage);
        self.emit(DemoEvent::ProcessingComplete {
            run,
            task: self.state.selected_task,
        });
        true
    }

    fn log_stage(&self, old_stage: Stage) {
        let new_stage = self.state.active_stage();
        if new_stage != old_stage {
            info!(from = %old_stage, to = %new_stage, "stage transition");
        }
    }

    fn emit(&self, event: DemoEvent) {
        debug!(%event, "emitting pipeline event");
        let _ = self.event_tx.send(event);
    }
}
