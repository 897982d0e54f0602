//! Statistics accumulators for the observer.
//!
//! [`MateStats`] is cumulative over a whole run: every mated pair adds to the
//! running sums and nothing is ever reset. [`AggregateSnapshot`] is the
//! opposite: it is rebuilt from scratch every tick from the live population.
//!
//! Statistics over empty sets are undefined and come back as `None`; the
//! caller decides how to render that.

use serde::{Deserialize, Serialize};

/// Running sums over mated (female, male) attractiveness pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MateStats {
    sum_f: f64,
    sum_m: f64,
    sum_fm: f64,
    sum_f_sq: f64,
    sum_m_sq: f64,
    pairs: u64,
}

impl MateStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one mated pair.
    pub fn record(&mut self, female: f64, male: f64) {
        self.sum_f += female;
        self.sum_m += male;
        self.sum_fm += female * male;
        self.sum_f_sq += female * female;
        self.sum_m_sq += male * male;
        self.pairs += 1;
    }

    /// Number of pairs recorded so far.
    pub fn pairs(&self) -> u64 {
        self.pairs
    }

    /// Pearson correlation between female and male attractiveness over all
    /// recorded pairs.
    ///
    /// `None` when no pair has been recorded, or when either side has zero
    /// variance (the coefficient is 0/0 there).
    pub fn correlation(&self) -> Option<f64> {
        if self.pairs == 0 {
            return None;
        }
        let n = self.pairs as f64;
        let num = self.sum_fm - (self.sum_f * self.sum_m) / n;
        let var_f = self.sum_f_sq - (self.sum_f * self.sum_f) / n;
        let var_m = self.sum_m_sq - (self.sum_m * self.sum_m) / n;
        let div = var_f.max(0.0).sqrt() * var_m.max(0.0).sqrt();
        let r = num / div;
        r.is_finite().then_some(r)
    }

    /// Mean attractiveness of mated females.
    pub fn mean_female(&self) -> Option<f64> {
        mean(self.sum_f, self.pairs)
    }

    /// Mean attractiveness of mated males.
    pub fn mean_male(&self) -> Option<f64> {
        mean(self.sum_m, self.pairs)
    }
}

/// Tick-local summary of an aggregation population.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    agents: u64,
    frozen: u64,
    dist_sum: f64,
    frozen_dist_sum: f64,
    mobile_dist_sum: f64,
    neighbor_sum: u64,
}

impl AggregateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one agent: whether it is frozen, its distance from the lattice
    /// centre and the occupant count of its Moore block.
    pub fn add(&mut self, frozen: bool, distance: f64, neighbors: usize) {
        self.agents += 1;
        self.dist_sum += distance;
        self.neighbor_sum += neighbors as u64;
        if frozen {
            self.frozen += 1;
            self.frozen_dist_sum += distance;
        } else {
            self.mobile_dist_sum += distance;
        }
    }

    pub fn agents(&self) -> u64 {
        self.agents
    }

    pub fn frozen(&self) -> u64 {
        self.frozen
    }

    pub fn mobile(&self) -> u64 {
        self.agents - self.frozen
    }

    pub fn mean_distance(&self) -> Option<f64> {
        mean(self.dist_sum, self.agents)
    }

    pub fn mean_frozen_distance(&self) -> Option<f64> {
        mean(self.frozen_dist_sum, self.frozen)
    }

    pub fn mean_mobile_distance(&self) -> Option<f64> {
        mean(self.mobile_dist_sum, self.mobile())
    }

    pub fn mean_neighbors(&self) -> Option<f64> {
        mean(self.neighbor_sum as f64, self.agents)
    }
}

/// Arithmetic mean of `count` values summing to `sum`, `None` for no values.
pub fn mean(sum: f64, count: u64) -> Option<f64> {
    (count > 0).then(|| sum / count as f64)
}
