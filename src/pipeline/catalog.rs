//! Fixed catalogs: data modalities, foundation models and prediction tasks

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Category of uploaded subject data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    /// Nothing uploaded, or the upload was not recognised
    #[default]
    None,
    /// Functional MRI volumes
    Fmri,
    /// EEG / iEEG recordings
    Eeg,
    /// Structural images
    Visual,
}

impl Modality {
    #[cfg(test)]
    pub const ALL: [Modality; 4] = [
        Modality::None,
        Modality::Fmri,
        Modality::Eeg,
        Modality::Visual,
    ];

    /// Detect the modality of an upload from its file name alone
    ///
    /// File contents are never read.
    pub fn detect(path: &Path) -> Self {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_ascii_lowercase(),
            None => return Modality::None,
        };

        if name.ends_with(".nii") || name.ends_with(".nii.gz") {
            Modality::Fmri
        } else if [".edf", ".set", ".fif"].iter().any(|ext| name.ends_with(ext)) {
            Modality::Eeg
        } else if [".png", ".jpg", ".jpeg"].iter().any(|ext| name.ends_with(ext)) {
            Modality::Visual
        } else {
            Modality::None
        }
    }

    /// The foundation model that handles this modality
    pub fn model(self) -> Option<Model> {
        match self {
            Modality::None => None,
            Modality::Fmri => Some(Model::Swift),
            Modality::Eeg => Some(Model::Diver),
            Modality::Visual => Some(Model::Vlm),
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Modality::None => write!(f, "none"),
            Modality::Fmri => write!(f, "fMRI"),
            Modality::Eeg => write!(f, "EEG/iEEG"),
            Modality::Visual => write!(f, "visual"),
        }
    }
}

/// Foundation model, one per modality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Model {
    /// Spatiotemporal representation learning for functional imaging
    Swift,
    /// Electrophysiological signal model
    Diver,
    /// Vision-language model for structural imaging
    Vlm,
}

impl Model {
    pub fn description(self) -> &'static str {
        match self {
            Model::Swift => "Spatiotemporal representation learning for functional brain imaging",
            Model::Diver => "Foundation model for electrophysiological brain signals",
            Model::Vlm => "Vision-language model for structural brain imaging analysis",
        }
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Model::Swift => write!(f, "SWIFT"),
            Model::Diver => write!(f, "DIVER"),
            Model::Vlm => write!(f, "VLM"),
        }
    }
}

/// Clinical prediction task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Task {
    /// MCI → Alzheimer's conversion prediction
    MciAd,
    /// Major depressive disorder diagnosis
    MddDx,
    /// Obsessive-compulsive disorder diagnosis
    OcdDx,
    /// Treatment response prediction
    Treatment,
}

impl Task {
    pub const ALL: [Task; 4] = [Task::MciAd, Task::MddDx, Task::OcdDx, Task::Treatment];

    /// Stable identifier used on the command line and in events
    pub fn id(self) -> &'static str {
        match self {
            Task::MciAd => "mci-ad",
            Task::MddDx => "mdd-dx",
            Task::OcdDx => "ocd-dx",
            Task::Treatment => "treatment",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Task::MciAd => "MCI → AD Conversion Prediction",
            Task::MddDx => "MDD Diagnosis",
            Task::OcdDx => "OCD Diagnosis",
            Task::Treatment => "Treatment Response Prediction",
        }
    }
}

impl std::str::FromStr for Task {
    type Err = UnknownTask;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Task::ALL
            .into_iter()
            .find(|t| t.id() == s)
            .ok_or_else(|| UnknownTask(s.to_string()))
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// A task identifier that is not in the catalog
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task '{0}' (expected one of: mci-ad, mdd-dx, ocd-dx, treatment)")]
pub struct UnknownTask(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(Modality::detect(Path::new("sub-01_bold.nii.gz")), Modality::Fmri);
        assert_eq!(Modality::detect(Path::new("/data/scan.NII")), Modality::Fmri);
        assert_eq!(Modality::detect(Path::new("rest.edf")), Modality::Eeg);
        assert_eq!(Modality::detect(Path::new("rest.set")), Modality::Eeg);
        assert_eq!(Modality::detect(Path::new("rest_raw.fif")), Modality::Eeg);
        assert_eq!(Modality::detect(Path::new("t1.png")), Modality::Visual);
        assert_eq!(Modality::detect(Path::new("notes.txt")), Modality::None);
        assert_eq!(Modality::detect(Path::new("")), Modality::None);
    }

    #[test]
    fn test_model_lookup_is_total() {
        assert_eq!(Modality::None.model(), None);
        assert_eq!(Modality::Fmri.model(), Some(Model::Swift));
        assert_eq!(Modality::Eeg.model(), Some(Model::Diver));
        assert_eq!(Modality::Visual.model(), Some(Model::Vlm));
    }

    #[test]
    fn test_task_ids_round_trip_through_from_str() {
        for task in Task::ALL {
            assert_eq!(task.id().parse::<Task>(), Ok(task));
        }
        assert!("mri".parse::<Task>().is_err());
    }

    #[test]
    fn test_task_serializes_as_id() {
        let json = serde_json::to_string(&Task::MciAd).unwrap();
        assert_eq!(json, "\"mci-ad\"");
    }
}
