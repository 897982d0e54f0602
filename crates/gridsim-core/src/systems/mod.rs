//! Step functions, one module per behavior, plus the observer.

pub mod aggregation;
pub mod mating;
pub mod observer;

pub use aggregation::aggregation_step;
pub use mating::{mating_step, DateOutcome};
pub use observer::{observer_step, Observer, OBSERVER_ORDER};

use crate::components::{AgentId, BehaviorKind};
use crate::context::SimulationContext;
use crate::error::SimResult;

/// Signature shared by every agent step function.
pub type StepFn = fn(&mut SimulationContext, AgentId) -> SimResult<()>;

/// Dispatch table: behavior variant → step function.
pub fn step_fn(kind: BehaviorKind) -> StepFn {
    match kind {
        BehaviorKind::Aggregation => aggregation_step,
        BehaviorKind::Mating => mating_step,
    }
}
