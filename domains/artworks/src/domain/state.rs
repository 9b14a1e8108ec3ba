//! State machine for the artwork creation saga
//!
//! Creation states: Decomposing → Generating → Persisting → Committed,
//! with Failed reachable from the first two steps and RolledBack from
//! Persisting. Committed, RolledBack and Failed are terminal.

pub use stencil_common::StateError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreationState {
    Decomposing,
    Generating,
    Persisting,
    Committed,
    RolledBack,
    Failed,
}

impl CreationState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack | Self::Failed)
    }

    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [CreationState] {
        match self {
            Self::Decomposing => &[Self::Generating, Self::Failed],
            Self::Generating => &[Self::Persisting, Self::Failed],
            Self::Persisting => &[Self::Committed, Self::RolledBack],
            Self::Committed | Self::RolledBack | Self::Failed => &[],
        }
    }
}

impl std::fmt::Display for CreationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decomposing => write!(f, "decomposing"),
            Self::Generating => write!(f, "generating"),
            Self::Persisting => write!(f, "persisting"),
            Self::Committed => write!(f, "committed"),
            Self::RolledBack => write!(f, "rolled_back"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Events that trigger creation state transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CreationEvent {
    /// Sub-prompts were produced
    Decomposed,
    /// Every image was downloaded and stored
    Generated,
    /// The artwork record was accepted
    Persisted,
    /// The artwork record was rejected; stored images get compensated
    PersistFailed,
    /// Decomposition or generation failed
    StepFailed,
}

impl std::fmt::Display for CreationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decomposed => write!(f, "decomposed"),
            Self::Generated => write!(f, "generated"),
            Self::Persisted => write!(f, "persisted"),
            Self::PersistFailed => write!(f, "persist_failed"),
            Self::StepFailed => write!(f, "step_failed"),
        }
    }
}

/// Creation saga state machine
pub struct CreationStateMachine;

impl CreationStateMachine {
    /// Attempt a state transition
    pub fn transition(
        current: CreationState,
        event: CreationEvent,
    ) -> Result<CreationState, StateError> {
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        let next = match (current, event) {
            (CreationState::Decomposing, CreationEvent::Decomposed) => CreationState::Generating,
            (CreationState::Generating, CreationEvent::Generated) => CreationState::Persisting,
            (CreationState::Decomposing | CreationState::Generating, CreationEvent::StepFailed) => {
                CreationState::Failed
            }
            (CreationState::Persisting, CreationEvent::Persisted) => CreationState::Committed,
            (CreationState::Persisting, CreationEvent::PersistFailed) => CreationState::RolledBack,
            _ => {
                return Err(StateError::InvalidTransition {
                    from: current.to_string(),
                    event: event.to_string(),
                });
            }
        };

        Ok(next)
    }
}
