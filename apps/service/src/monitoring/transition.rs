//! Status/incident transition rules.
//!
//! Pure mapping from (previous status, new status) to what must be written
//! and whether an alert goes out. Persistence and dispatch live in the
//! processor; nothing here touches I/O.

use super::types::CheckStatus;

/// What to do with the monitor's incident record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncidentAction {
    None,
    Open { error_message: Option<String> },
    Resolve,
}

/// Alert emitted by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Down,
    Recovery,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub previous: Option<CheckStatus>,
    pub current: CheckStatus,
    pub incident: IncidentAction,
    pub alert: Option<AlertKind>,
}

impl Transition {
    /// Compute the transition between the last persisted status and a new outcome
    pub fn between(previous: Option<CheckStatus>, current: CheckStatus, error_message: Option<&str>) -> Self {
        let (incident, alert) = match (previous, current) {
            (Some(prev), cur) if prev == cur => (IncidentAction::None, None),
            (None | Some(CheckStatus::Up), CheckStatus::Down) => (
                IncidentAction::Open { error_message: error_message.map(str::to_owned) },
                Some(AlertKind::Down),
            ),
            (Some(CheckStatus::Down), CheckStatus::Up) => (IncidentAction::Resolve, Some(AlertKind::Recovery)),
            // First-ever UP: recorded, nothing to open or close.
            (None, CheckStatus::Up) => (IncidentAction::None, None),
            (Some(_), _) => (IncidentAction::None, None),
        };

        Self { previous, current, incident, alert }
    }

    pub fn is_status_change(&self) -> bool {
        self.previous != Some(self.current)
    }
}
