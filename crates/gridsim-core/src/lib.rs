//! GridSim Core - discrete-time grid agent simulation engine
//!
//! A deterministic substrate for grid-based agent models, with two models
//! built on it: freezing aggregation and an assortative mating market.
//!
//! # Architecture
//!
//! Agents are entities of a `hecs` world:
//! - **Components**: `Position`, `Heading` and a tagged `Behavior` variant
//! - **Systems**: one step function per behavior, picked from a dispatch table
//! - **Context**: world, grid, scheduler, random stream and observer for one run,
//!   passed explicitly into every step
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `grid` | Sparse cell index with bounded/toroidal Moore queries |
//! | `schedule` | Ordered repeating schedule with index-based stoppers |
//! | `random` | Seeded random stream |
//! | `systems` | Aggregation, mating and observer steps |
//! | `metrics` | Per-tick metrics records and TSV rendering |
//! | `engine` | Run setup, ticking and read-only views |
//!
//! # Example
//!
//! ```rust,no_run
//! use gridsim_core::prelude::*;
//!
//! let config = RunConfig::mating(MatingConfig::default()).with_seed(42);
//! let mut engine = SimulationEngine::start(config)?;
//! engine.run(10_000)?;
//! print!("{}", engine.metrics_tsv());
//! # Ok::<(), gridsim_core::error::SimError>(())
//! ```

pub mod components;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod grid;
pub mod metrics;
pub mod random;
pub mod schedule;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::{AggregationConfig, BoundaryMode, MatingConfig, PreferenceRule, RunConfig};
    pub use crate::engine::{AgentView, Portrayal, SimulationEngine};
    pub use crate::error::{SimError, SimResult};
}
