//! Pure simulation logic for gridsim.
//!
//! This crate contains the arithmetic that is independent of the engine:
//! no ECS, no random source, no scheduler. Functions take plain data and
//! return results, making them unit-testable on their own and shared by the
//! engine and the headless harness.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`lattice`] | Bounded/toroidal coordinate normalization, Moore blocks, distances |
//! | [`preference`] | Maximizing/matching acceptance rules and the closing-time rule |
//! | [`stats`] | Running mate-pair correlation sums, aggregation snapshots |

pub mod lattice;
pub mod preference;
pub mod stats;
