use serde::{Deserialize, Serialize};

/// Worker lifecycle.
///
/// ```text
/// Parsed -> Installing -> Installed -> Activating -> Activated
///              |
///              +-> Redundant (install failed)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    #[default]
    Parsed,
    Installing,
    /// Installed and waiting to activate.
    Installed,
    Activating,
    Activated,
    Redundant,
}

impl WorkerState {
    pub fn can_install(self) -> bool {
        matches!(self, WorkerState::Parsed | WorkerState::Redundant)
    }

    pub fn can_activate(self) -> bool {
        matches!(self, WorkerState::Installed | WorkerState::Activated)
    }

    /// Only an active worker controls fetches.
    pub fn intercepts_fetches(self) -> bool {
        self == WorkerState::Activated
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(name)
    }
}
