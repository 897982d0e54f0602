//! Per-tick metrics records and their tab-separated rendering.
//!
//! The observer produces one [`MetricsRecord`] per tick. Rendering is
//! deterministic: the same records always produce the same bytes, which is
//! what reproducibility checks compare.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::components::BehaviorKind;

/// Rendered in place of a statistic that is undefined for the tick (e.g. a
/// correlation before any pair has formed).
pub const UNDEFINED: &str = "undefined";

const MATING_HEADER: &str = "steps\tpairs\tcorrelation\tmaleA\tfemaleA";
const AGGREGATION_HEADER: &str =
    "steps\tagents\tfrozen\tmeanDist\tmeanFrozenDist\tmeanMobileDist\tmeanNeighbors";

/// Cumulative mating-market statistics at the end of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatingMetrics {
    pub step: u64,
    pub pairs: u64,
    pub correlation: Option<f64>,
    pub mean_male: Option<f64>,
    pub mean_female: Option<f64>,
}

/// Instantaneous aggregation snapshot at the end of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregationMetrics {
    pub step: u64,
    pub agents: u64,
    pub frozen: u64,
    pub mean_distance: Option<f64>,
    pub mean_frozen_distance: Option<f64>,
    pub mean_mobile_distance: Option<f64>,
    pub mean_neighbors: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MetricsRecord {
    Mating(MatingMetrics),
    Aggregation(AggregationMetrics),
}

impl MetricsRecord {
    pub fn step(&self) -> u64 {
        match self {
            MetricsRecord::Mating(m) => m.step,
            MetricsRecord::Aggregation(a) => a.step,
        }
    }

    /// One tab-separated line, no trailing newline.
    pub fn to_tsv(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MetricsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricsRecord::Mating(m) => write!(
                f,
                "{}\t{}\t{}\t{}\t{}",
                m.step,
                m.pairs,
                Stat(m.correlation),
                Stat(m.mean_male),
                Stat(m.mean_female)
            ),
            MetricsRecord::Aggregation(a) => write!(
                f,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                a.step,
                a.agents,
                a.frozen,
                Stat(a.mean_distance),
                Stat(a.mean_frozen_distance),
                Stat(a.mean_mobile_distance),
                Stat(a.mean_neighbors)
            ),
        }
    }
}

/// Column header of a model's metrics stream.
pub fn header(kind: BehaviorKind) -> &'static str {
    match kind {
        BehaviorKind::Mating => MATING_HEADER,
        BehaviorKind::Aggregation => AGGREGATION_HEADER,
    }
}

/// Render a whole stream: header line followed by one line per record.
pub fn render_tsv(kind: BehaviorKind, records: &[MetricsRecord]) -> String {
    let mut out = String::with_capacity(64 * (records.len() + 1));
    out.push_str(header(kind));
    out.push('\n');
    for record in records {
        out.push_str(&record.to_tsv());
        out.push('\n');
    }
    out
}

struct Stat(Option<f64>);

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{:.5}", v),
            None => f.write_str(UNDEFINED),
        }
    }
}
