//! Simulation engine - main entry point for running a simulation

use serde::{Deserialize, Serialize};

use gridsim_logic::stats::MateStats;

use crate::components::*;
use crate::config::{AggregationConfig, MatingConfig, ModelConfig, RunConfig};
use crate::context::{Rules, SimulationContext};
use crate::error::{SimError, SimResult};
use crate::metrics::{self, MetricsRecord};
use crate::systems::Observer;

/// How a rendering layer should portray an agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Portrayal {
    Aggregate { frozen: bool },
    Mate { gender: Gender, attractiveness: f64, dates: u32 },
}

/// Read-only view of a live agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentView {
    pub id: AgentId,
    pub x: i32,
    pub y: i32,
    pub portrayal: Portrayal,
}

/// Main simulation engine
pub struct SimulationEngine {
    ctx: SimulationContext,
    config: RunConfig,
}

impl SimulationEngine {
    /// Validate `config`, build the context and populate the grid.
    ///
    /// Invalid configurations are rejected with every problem listed; no
    /// partial run is created.
    pub fn start(config: RunConfig) -> SimResult<Self> {
        let errors = config.validate();
        if !errors.is_empty() {
            let err = SimError::Configuration(errors);
            log::warn!("rejected run configuration: {}", err);
            return Err(err);
        }

        let kind = config.model.kind();
        let rules = match config.model {
            ModelConfig::Aggregation(aggregation) => Rules {
                aggregation,
                ..Rules::default()
            },
            ModelConfig::Mating(mating) => Rules {
                mating,
                ..Rules::default()
            },
        };
        let mut ctx = SimulationContext::new(config.seed, &config.grid, rules, Observer::new(kind))?;

        match config.model {
            ModelConfig::Aggregation(a) => populate_aggregation(&mut ctx, &a)?,
            ModelConfig::Mating(m) => populate_mating(&mut ctx, &m)?,
        }
        ctx.start_observer();

        log::info!(
            "started {:?} run: {} agents on {}x{} {:?} grid, seed {}",
            kind,
            ctx.population(),
            config.grid.width,
            config.grid.height,
            config.grid.boundary,
            ctx.rng.seed()
        );
        Ok(Self { ctx, config })
    }

    /// Advance one tick.
    pub fn tick(&mut self) -> SimResult<()> {
        self.ctx.tick()
    }

    /// Tick until nothing is scheduled or `max_ticks` have run. Returns the
    /// number of ticks executed.
    pub fn run(&mut self, max_ticks: u64) -> SimResult<u64> {
        let mut ticks = 0;
        while ticks < max_ticks && !self.is_finished() {
            self.tick()?;
            ticks += 1;
        }
        Ok(ticks)
    }

    /// True once the schedule has no active entries (the mating observer
    /// stops itself when the population is exhausted).
    pub fn is_finished(&self) -> bool {
        self.ctx.schedule.is_empty()
    }

    pub fn current_step(&self) -> u64 {
        self.ctx.schedule.current_step()
    }

    pub fn population(&self) -> usize {
        self.ctx.population()
    }

    /// Every live agent with its cell and display attributes, in the grid's
    /// population order.
    pub fn agents(&self) -> SimResult<Vec<AgentView>> {
        self.ctx
            .grid
            .all_agents()
            .iter()
            .map(|&id| {
                let position = self.ctx.position(id)?;
                let portrayal = match self.ctx.behavior(id)? {
                    Behavior::Aggregation(a) => Portrayal::Aggregate { frozen: a.frozen },
                    Behavior::Mating(d) => Portrayal::Mate {
                        gender: d.gender,
                        attractiveness: d.attractiveness,
                        dates: d.dates,
                    },
                };
                Ok(AgentView {
                    id,
                    x: position.x,
                    y: position.y,
                    portrayal,
                })
            })
            .collect()
    }

    /// Number of frozen aggregators (0 for a mating run).
    pub fn frozen_count(&self) -> usize {
        self.ctx
            .world
            .query::<&Behavior>()
            .iter()
            .filter(|(_, b)| b.as_aggregator().is_some_and(|a| a.frozen))
            .count()
    }

    pub fn mate_stats(&self) -> &MateStats {
        self.ctx.observer.mate_stats()
    }

    /// Metrics records reported so far, one per tick.
    pub fn metrics(&self) -> &[MetricsRecord] {
        self.ctx.observer.records()
    }

    pub fn take_metrics(&mut self) -> Vec<MetricsRecord> {
        self.ctx.observer.take_records()
    }

    pub fn metrics_header(&self) -> &'static str {
        metrics::header(self.config.model.kind())
    }

    /// The full metrics stream so far as tab-separated text.
    pub fn metrics_tsv(&self) -> String {
        metrics::render_tsv(self.config.model.kind(), self.metrics())
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }
}

/// Frozen seed first, then `population - 1` mobile agents, each drawing its
/// cell and then its heading.
fn populate_aggregation(ctx: &mut SimulationContext, config: &AggregationConfig) -> SimResult<()> {
    let (width, height) = (ctx.grid.width(), ctx.grid.height());
    let (sx, sy) = config.seed_position.unwrap_or((width / 2, height / 2));
    ctx.spawn_aggregator(sx, sy, Heading::ZERO, true)?;

    for _ in 1..config.population {
        let x = ctx.rng.next_int(width as u32) as i32;
        let y = ctx.rng.next_int(height as u32) as i32;
        let heading = ctx.rng.next_heading();
        ctx.spawn_aggregator(x, y, heading, false)?;
    }
    Ok(())
}

/// Males first, then females. Each draws its cell, then its attractiveness
/// in `1..=max_attractiveness`.
fn populate_mating(ctx: &mut SimulationContext, config: &MatingConfig) -> SimResult<()> {
    let (width, height) = (ctx.grid.width(), ctx.grid.height());
    let cohorts = [(Gender::Male, config.males), (Gender::Female, config.females)];
    for (gender, count) in cohorts {
        for _ in 0..count {
            let x = ctx.rng.next_int(width as u32) as i32;
            let y = ctx.rng.next_int(height as u32) as i32;
            let attractiveness = (ctx.rng.next_int(config.max_attractiveness) + 1) as f64;
            ctx.spawn_dater(x, y, Dater::new(gender, attractiveness))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoundaryMode, ConfigError};

    #[test]
    fn test_start_rejects_invalid_config() {
        let config = RunConfig::aggregation(AggregationConfig::default().with_population(0))
            .with_grid(0, 10, BoundaryMode::Bounded);
        match SimulationEngine::start(config) {
            Err(SimError::Configuration(errors)) => {
                assert!(errors.contains(&ConfigError::EmptyPopulation));
                assert!(errors.contains(&ConfigError::InvalidGridSize { width: 0, height: 10 }));
            }
            other => panic!("expected configuration error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_aggregation_population_and_seed() {
        let config = RunConfig::aggregation(
            AggregationConfig::default()
                .with_population(20)
                .with_seed_position(3, 4),
        )
        .with_grid(20, 20, BoundaryMode::Bounded);
        let engine = SimulationEngine::start(config).unwrap();

        assert_eq!(engine.population(), 20);
        assert_eq!(engine.frozen_count(), 1);
        let agents = engine.agents().unwrap();
        let frozen: Vec<_> = agents
            .iter()
            .filter(|a| a.portrayal == Portrayal::Aggregate { frozen: true })
            .collect();
        assert_eq!(frozen.len(), 1);
        assert_eq!((frozen[0].x, frozen[0].y), (3, 4));
    }

    #[test]
    fn test_mating_population_split() {
        let config = RunConfig::mating(MatingConfig::default().with_population(7, 5))
            .with_grid(30, 30, BoundaryMode::Toroidal);
        let engine = SimulationEngine::start(config).unwrap();

        let agents = engine.agents().unwrap();
        let males = agents
            .iter()
            .filter(|a| matches!(a.portrayal, Portrayal::Mate { gender: Gender::Male, .. }))
            .count();
        assert_eq!(males, 7);
        assert_eq!(agents.len(), 12);
        for a in &agents {
            let Portrayal::Mate { attractiveness, dates, .. } = a.portrayal else {
                panic!("mating run produced a non-mate agent");
            };
            assert!((1.0..=10.0).contains(&attractiveness));
            assert_eq!(dates, 0);
        }
    }

    #[test]
    fn test_run_stops_at_budget() {
        let config = RunConfig::aggregation(AggregationConfig::default().with_population(10))
            .with_grid(15, 15, BoundaryMode::Toroidal);
        let mut engine = SimulationEngine::start(config).unwrap();
        assert_eq!(engine.run(25).unwrap(), 25);
        assert_eq!(engine.current_step(), 25);
        assert_eq!(engine.metrics().len(), 25);
        assert!(!engine.is_finished());
    }

    #[test]
    fn test_metrics_stream_starts_with_header() {
        let config = RunConfig::mating(MatingConfig::default().with_population(10, 10))
            .with_grid(10, 10, BoundaryMode::Toroidal);
        let mut engine = SimulationEngine::start(config).unwrap();
        engine.run(3).unwrap();

        let tsv = engine.metrics_tsv();
        let mut lines = tsv.lines();
        assert_eq!(lines.next(), Some(engine.metrics_header()));
        assert!(lines.next().is_some_and(|l| l.starts_with("0\t")));
    }
}
