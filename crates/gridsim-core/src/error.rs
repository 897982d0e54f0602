//! Error types for the simulation engine.

use thiserror::Error;

use crate::components::{AgentId, BehaviorKind};
use crate::config::ConfigError;

/// Errors surfaced by the engine.
///
/// Configuration and domain errors abort run startup. There is no error for
/// undefined statistics: those are reported as `None` and rendered as a
/// sentinel in the metrics stream.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {}", join_config_errors(.0))]
    Configuration(Vec<ConfigError>),

    #[error("cell ({x}, {y}) is outside the {width}x{height} bounded grid")]
    OutOfDomain {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },

    #[error("agent {0:?} is not tracked by the grid")]
    UnknownAgent(AgentId),

    #[error("agent {agent:?} does not carry {expected:?} behavior")]
    WrongBehavior {
        agent: AgentId,
        expected: BehaviorKind,
    },

    #[error(transparent)]
    Component(#[from] hecs::ComponentError),

    #[error(transparent)]
    NoSuchEntity(#[from] hecs::NoSuchEntity),
}

pub type SimResult<T> = Result<T, SimError>;

fn join_config_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
