use serde::{Deserialize, Serialize};

/// Synthetic dataset flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetVariant {
    Relax,
    Focus,
}

impl DatasetVariant {
    pub fn name(&self) -> &str {
        match self {
            Self::Relax => "relax",
            Self::Focus => "focus",
        }
    }
}

/// Which backend feeds the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrainMode {
    Dataset(DatasetVariant),
    Session,
    LiveHardware,
}

impl BrainMode {
    pub fn name(&self) -> &str {
        match self {
            Self::Dataset(DatasetVariant::Relax) => "dataset_relax",
            Self::Dataset(DatasetVariant::Focus) => "dataset_focus",
            Self::Session => "session",
            Self::LiveHardware => "live_hardware",
        }
    }

    /// Parse the names used by control surfaces; bare `relax`/`focus` map to
    /// the dataset variants
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "relax" | "dataset_relax" => Some(Self::Dataset(DatasetVariant::Relax)),
            "focus" | "dataset_focus" => Some(Self::Dataset(DatasetVariant::Focus)),
            "session" => Some(Self::Session),
            "live" | "live_hardware" => Some(Self::LiveHardware),
            _ => None,
        }
    }
}

impl Default for BrainMode {
    fn default() -> Self {
        Self::Dataset(DatasetVariant::Relax)
    }
}
