//! Run configuration and validation.
//!
//! Collaborators (a rendering layer, a harness, a parameter sweep) build a
//! [`RunConfig`] before a run starts, either by editing its public fields or
//! through the `with_*` setters, then hand it to
//! [`SimulationEngine::start`](crate::engine::SimulationEngine::start).
//! Nothing can be changed once the run is going.
//!
//! ```
//! use gridsim_core::config::{BoundaryMode, MatingConfig, RunConfig};
//!
//! let config = RunConfig::mating(MatingConfig::default().with_population(200, 200))
//!     .with_grid(50, 50, BoundaryMode::Toroidal)
//!     .with_seed(7);
//! assert!(config.validate().is_empty());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::BehaviorKind;

pub use gridsim_logic::lattice::BoundaryMode;
pub use gridsim_logic::preference::PreferenceRule;

/// Grid extent and topology, fixed for a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub width: i32,
    pub height: i32,
    pub boundary: BoundaryMode,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            boundary: BoundaryMode::Toroidal,
        }
    }
}

/// Diffusion-limited aggregation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Total agents, including the frozen seed.
    pub population: u32,
    /// Cell of the frozen seed. `None` = grid centre.
    pub seed_position: Option<(i32, i32)>,
    /// Per-tick probability that a mobile agent redraws its heading.
    pub p_redirect: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            population: 500,
            seed_position: None,
            p_redirect: 0.5,
        }
    }
}

impl AggregationConfig {
    pub fn with_population(mut self, population: u32) -> Self {
        self.population = population;
        self
    }

    pub fn with_seed_position(mut self, x: i32, y: i32) -> Self {
        self.seed_position = Some((x, y));
        self
    }

    pub fn with_p_redirect(mut self, p: f64) -> Self {
        self.p_redirect = p;
        self
    }
}

/// Local clustering drift applied before random movement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Moore radius scanned for neighbours.
    pub radius: u32,
    /// Fraction of the neighbourhood's cells that must be occupied to
    /// suppress drift.
    pub chuminess: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            radius: 3,
            chuminess: 0.25,
        }
    }
}

/// Where an agent looks for a date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatingScope {
    /// The whole live population.
    #[default]
    Global,
    /// The Moore block of the given radius around the agent (toroidal or
    /// bounded per the grid).
    Local { radius: u32 },
}

/// Assortative mating market parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatingConfig {
    pub males: u32,
    pub females: u32,
    /// Attractiveness is drawn uniformly from `1..=max_attractiveness`.
    pub max_attractiveness: u32,
    /// Exponent applied to the preference criterion (0 = indifferent, 3 = Kalick-Hamilton).
    pub choosiness: f64,
    /// Closing-time date limit. 0 disables the rule.
    pub max_dates: u32,
    pub rule: PreferenceRule,
    /// Per-tick probability of redrawing the heading.
    pub p_random_move: f64,
    pub clustering: Option<ClusteringConfig>,
    pub dating: DatingScope,
}

impl Default for MatingConfig {
    fn default() -> Self {
        Self {
            males: 1000,
            females: 1000,
            max_attractiveness: 10,
            choosiness: 3.0,
            max_dates: 50,
            rule: PreferenceRule::Maximizing,
            p_random_move: 0.5,
            clustering: None,
            dating: DatingScope::Global,
        }
    }
}

impl MatingConfig {
    pub fn with_population(mut self, males: u32, females: u32) -> Self {
        self.males = males;
        self.females = females;
        self
    }

    pub fn with_choosiness(mut self, choosiness: f64) -> Self {
        self.choosiness = choosiness;
        self
    }

    pub fn with_max_dates(mut self, max_dates: u32) -> Self {
        self.max_dates = max_dates;
        self
    }

    pub fn with_rule(mut self, rule: PreferenceRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_p_random_move(mut self, p: f64) -> Self {
        self.p_random_move = p;
        self
    }

    pub fn with_clustering(mut self, radius: u32, chuminess: f64) -> Self {
        self.clustering = Some(ClusteringConfig { radius, chuminess });
        self
    }

    pub fn with_local_dating(mut self, radius: u32) -> Self {
        self.dating = DatingScope::Local { radius };
        self
    }
}

/// Which model a run simulates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ModelConfig {
    Aggregation(AggregationConfig),
    Mating(MatingConfig),
}

impl ModelConfig {
    pub fn kind(&self) -> BehaviorKind {
        match self {
            ModelConfig::Aggregation(_) => BehaviorKind::Aggregation,
            ModelConfig::Mating(_) => BehaviorKind::Mating,
        }
    }

    /// Initial number of agents.
    pub fn population(&self) -> u32 {
        match self {
            ModelConfig::Aggregation(a) => a.population,
            ModelConfig::Mating(m) => m.males.saturating_add(m.females),
        }
    }
}

/// Complete configuration of one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Seed of the run's random stream.
    pub seed: u64,
    pub grid: GridConfig,
    pub model: ModelConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::aggregation(AggregationConfig::default())
    }
}

impl RunConfig {
    pub fn aggregation(config: AggregationConfig) -> Self {
        Self {
            seed: 0,
            grid: GridConfig::default(),
            model: ModelConfig::Aggregation(config),
        }
    }

    pub fn mating(config: MatingConfig) -> Self {
        Self {
            seed: 0,
            grid: GridConfig::default(),
            model: ModelConfig::Mating(config),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_grid(mut self, width: i32, height: i32, boundary: BoundaryMode) -> Self {
        self.grid = GridConfig {
            width,
            height,
            boundary,
        };
        self
    }

    pub fn with_boundary(mut self, boundary: BoundaryMode) -> Self {
        self.grid.boundary = boundary;
        self
    }

    /// Validate the configuration, returning all errors found.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = validate_grid(&self.grid);

        match &self.model {
            ModelConfig::Aggregation(a) => {
                if a.population == 0 {
                    errors.push(ConfigError::EmptyPopulation);
                }
                if let Some((x, y)) = a.seed_position {
                    let inside = x >= 0 && x < self.grid.width && y >= 0 && y < self.grid.height;
                    if !inside {
                        errors.push(ConfigError::SeedOutOfGrid { x, y });
                    }
                }
                check_probability("p_redirect", a.p_redirect, &mut errors);
            }
            ModelConfig::Mating(m) => {
                if m.males == 0 && m.females == 0 {
                    errors.push(ConfigError::EmptyPopulation);
                }
                if m.max_attractiveness == 0 {
                    errors.push(ConfigError::InvalidMaxAttractiveness);
                }
                if m.choosiness.is_nan() || m.choosiness < 0.0 {
                    errors.push(ConfigError::NegativeChoosiness(m.choosiness));
                }
                check_probability("p_random_move", m.p_random_move, &mut errors);
                let max_radius = self.grid.width.max(self.grid.height).max(1) as u32;
                let radius_ok = |radius: u32| (1..=max_radius).contains(&radius);
                if let Some(c) = m.clustering {
                    if !radius_ok(c.radius) {
                        errors.push(ConfigError::InvalidRadius("clustering"));
                    }
                    if !(0.0..=1.0).contains(&c.chuminess) {
                        errors.push(ConfigError::DensityOutOfRange(c.chuminess));
                    }
                }
                if let DatingScope::Local { radius } = m.dating {
                    if !radius_ok(radius) {
                        errors.push(ConfigError::InvalidRadius("dating"));
                    }
                }
            }
        }

        errors
    }
}

/// Validate grid dimensions alone.
pub fn validate_grid(grid: &GridConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();
    if grid.width <= 0 || grid.height <= 0 {
        errors.push(ConfigError::InvalidGridSize {
            width: grid.width,
            height: grid.height,
        });
    }
    errors
}

fn check_probability(name: &'static str, value: f64, errors: &mut Vec<ConfigError>) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(ConfigError::ProbabilityOutOfRange { name, value });
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("grid size {width}x{height} must be positive on both axes")]
    InvalidGridSize { width: i32, height: i32 },

    #[error("population must contain at least one agent")]
    EmptyPopulation,

    #[error("aggregation seed ({x}, {y}) lies outside the grid")]
    SeedOutOfGrid { x: i32, y: i32 },

    #[error("{name} = {value} is not a probability")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },

    #[error("max attractiveness must be at least 1")]
    InvalidMaxAttractiveness,

    #[error("choosiness {0} must be non-negative")]
    NegativeChoosiness(f64),

    #[error("{0} radius must lie between 1 and the larger grid extent")]
    InvalidRadius(&'static str),

    #[error("clustering density {0} must lie in [0, 1]")]
    DensityOutOfRange(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(RunConfig::default().validate().is_empty());
        assert!(RunConfig::mating(MatingConfig::default()).validate().is_empty());
    }

    #[test]
    fn test_default_values_match_reference_models() {
        let agg = AggregationConfig::default();
        assert_eq!(agg.population, 500);
        assert_eq!(agg.p_redirect, 0.5);

        let mating = MatingConfig::default();
        assert_eq!(mating.males, 1000);
        assert_eq!(mating.females, 1000);
        assert_eq!(mating.max_attractiveness, 10);
        assert_eq!(mating.choosiness, 3.0);
        assert_eq!(mating.max_dates, 50);
        assert_eq!(mating.rule, PreferenceRule::Maximizing);
    }

    #[test]
    fn test_invalid_grid() {
        let config = RunConfig::default().with_grid(0, 10, BoundaryMode::Bounded);
        assert!(config
            .validate()
            .contains(&ConfigError::InvalidGridSize { width: 0, height: 10 }));
    }

    #[test]
    fn test_aggregation_needs_a_seed() {
        let config = RunConfig::aggregation(AggregationConfig::default().with_population(0));
        assert!(config.validate().contains(&ConfigError::EmptyPopulation));
    }

    #[test]
    fn test_seed_outside_grid() {
        let config = RunConfig::aggregation(AggregationConfig::default().with_seed_position(100, 3));
        assert!(config
            .validate()
            .contains(&ConfigError::SeedOutOfGrid { x: 100, y: 3 }));
    }

    #[test]
    fn test_probability_range() {
        let config = RunConfig::aggregation(AggregationConfig::default().with_p_redirect(1.5));
        assert!(config
            .validate()
            .iter()
            .any(|e| matches!(e, ConfigError::ProbabilityOutOfRange { .. })));
    }

    #[test]
    fn test_mating_errors_are_collected() {
        let mut mating = MatingConfig::default()
            .with_population(0, 0)
            .with_choosiness(-1.0)
            .with_local_dating(0)
            .with_clustering(0, 2.0);
        mating.max_attractiveness = 0;
        let errors = RunConfig::mating(mating).validate();
        assert!(errors.contains(&ConfigError::EmptyPopulation));
        assert!(errors.contains(&ConfigError::InvalidMaxAttractiveness));
        assert!(errors.contains(&ConfigError::NegativeChoosiness(-1.0)));
        assert!(errors.contains(&ConfigError::InvalidRadius("dating")));
        assert!(errors.contains(&ConfigError::InvalidRadius("clustering")));
        assert!(errors.contains(&ConfigError::DensityOutOfRange(2.0)));
    }

    #[test]
    fn test_radius_beyond_grid_extent() {
        let grid = |config: RunConfig| config.with_grid(10, 10, BoundaryMode::Toroidal);
        let clustering = grid(RunConfig::mating(MatingConfig::default().with_clustering(40_000, 0.5)));
        assert_eq!(clustering.validate(), vec![ConfigError::InvalidRadius("clustering")]);

        let dating = grid(RunConfig::mating(MatingConfig::default().with_local_dating(3_000_000_000)));
        assert_eq!(dating.validate(), vec![ConfigError::InvalidRadius("dating")]);

        let widest = MatingConfig::default().with_clustering(10, 0.5).with_local_dating(10);
        assert!(grid(RunConfig::mating(widest)).validate().is_empty());
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = RunConfig::mating(MatingConfig::default().with_clustering(2, 0.3))
            .with_seed(99)
            .with_boundary(BoundaryMode::Bounded);
        let json = serde_json::to_string(&config).unwrap();
        let back: RunConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
