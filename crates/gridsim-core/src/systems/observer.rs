//! The observer: runs after every agent each tick and reports metrics.

use gridsim_logic::stats::{AggregateSnapshot, MateStats};

use crate::components::*;
use crate::context::SimulationContext;
use crate::error::SimResult;
use crate::metrics::{AggregationMetrics, MatingMetrics, MetricsRecord};
use crate::schedule::Stopper;

/// Schedule order of the observer; strictly after [`AGENT_ORDER`](crate::schedule::AGENT_ORDER).
pub const OBSERVER_ORDER: i32 = 10;

/// Observer state for one run.
#[derive(Debug)]
pub struct Observer {
    kind: BehaviorKind,
    mate_stats: MateStats,
    stopper: Option<Stopper>,
    records: Vec<MetricsRecord>,
}

impl Observer {
    pub fn new(kind: BehaviorKind) -> Self {
        Self {
            kind,
            mate_stats: MateStats::new(),
            stopper: None,
            records: Vec::new(),
        }
    }

    pub fn kind(&self) -> BehaviorKind {
        self.kind
    }

    pub fn attach_stopper(&mut self, stopper: Stopper) {
        self.stopper = Some(stopper);
    }

    pub fn stopper(&self) -> Option<Stopper> {
        self.stopper
    }

    /// Called by a successful date with the pair's attractiveness values.
    pub fn record_mate_choice(&mut self, female: f64, male: f64) {
        self.mate_stats.record(female, male);
    }

    pub fn mate_stats(&self) -> &MateStats {
        &self.mate_stats
    }

    /// Records reported so far, oldest first.
    pub fn records(&self) -> &[MetricsRecord] {
        &self.records
    }

    /// Drain the reported records.
    pub fn take_records(&mut self) -> Vec<MetricsRecord> {
        std::mem::take(&mut self.records)
    }

    fn mating_report(&self, step: u64) -> MetricsRecord {
        MetricsRecord::Mating(MatingMetrics {
            step,
            pairs: self.mate_stats.pairs(),
            correlation: self.mate_stats.correlation(),
            mean_male: self.mate_stats.mean_male(),
            mean_female: self.mate_stats.mean_female(),
        })
    }
}

/// Observer step: report the tick, then do the model's end-of-tick upkeep.
///
/// Mating: clears every live agent's `dated_this_tick` flag and stops the
/// observer once nobody is left. Aggregation: recomputes a fresh snapshot of
/// the live population.
pub fn observer_step(ctx: &mut SimulationContext) -> SimResult<()> {
    let step = ctx.schedule.current_step();
    let record = match ctx.observer.kind {
        BehaviorKind::Mating => ctx.observer.mating_report(step),
        BehaviorKind::Aggregation => aggregation_report(ctx, step)?,
    };
    log::debug!("{}", record);
    ctx.observer.records.push(record);

    if ctx.observer.kind == BehaviorKind::Mating {
        reset_dated(ctx);
        if ctx.grid.is_empty() {
            if let Some(stopper) = ctx.observer.stopper() {
                ctx.schedule.stop(stopper);
            }
            log::info!(
                "population exhausted after {} ticks, {} pairs formed",
                step + 1,
                ctx.observer.mate_stats.pairs()
            );
        }
    }
    Ok(())
}

fn reset_dated(ctx: &mut SimulationContext) {
    for (_, behavior) in ctx.world.query_mut::<&mut Behavior>() {
        if let Some(dater) = behavior.as_dater_mut() {
            dater.dated_this_tick = false;
        }
    }
}

fn aggregation_report(ctx: &SimulationContext, step: u64) -> SimResult<MetricsRecord> {
    let lattice = ctx.grid.lattice();
    let mut snapshot = AggregateSnapshot::new();
    for &agent in ctx.grid.all_agents() {
        let position = ctx.position(agent)?;
        let frozen = ctx.aggregator(agent)?.frozen;
        let neighbors = ctx.grid.neighbors(position.x, position.y, 1, true).len();
        snapshot.add(frozen, lattice.distance_from_center(position.x, position.y), neighbors);
    }
    Ok(MetricsRecord::Aggregation(AggregationMetrics {
        step,
        agents: snapshot.agents(),
        frozen: snapshot.frozen(),
        mean_distance: snapshot.mean_distance(),
        mean_frozen_distance: snapshot.mean_frozen_distance(),
        mean_mobile_distance: snapshot.mean_mobile_distance(),
        mean_neighbors: snapshot.mean_neighbors(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoundaryMode, GridConfig};
    use crate::context::Rules;

    fn context(kind: BehaviorKind) -> SimulationContext {
        let grid = GridConfig {
            width: 10,
            height: 10,
            boundary: BoundaryMode::Toroidal,
        };
        SimulationContext::new(1, &grid, Rules::default(), Observer::new(kind)).unwrap()
    }

    #[test]
    fn test_mating_report_before_any_pair_is_undefined() {
        let mut ctx = context(BehaviorKind::Mating);
        ctx.spawn_dater(1, 1, Dater::new(Gender::Male, 3.0)).unwrap();
        observer_step(&mut ctx).unwrap();

        let MetricsRecord::Mating(m) = ctx.observer.records()[0] else {
            panic!("expected a mating record");
        };
        assert_eq!(m.step, 0);
        assert_eq!(m.pairs, 0);
        assert_eq!(m.correlation, None);
    }

    #[test]
    fn test_observer_resets_dated_flags() {
        let mut ctx = context(BehaviorKind::Mating);
        let a = ctx.spawn_dater(1, 1, Dater::new(Gender::Male, 3.0)).unwrap();
        let mut d = ctx.dater(a).unwrap();
        d.dated_this_tick = true;
        d.dates = 4;
        ctx.set_dater(a, d).unwrap();

        observer_step(&mut ctx).unwrap();
        let d = ctx.dater(a).unwrap();
        assert!(!d.dated_this_tick);
        assert_eq!(d.dates, 4);
    }

    #[test]
    fn test_observer_stops_itself_on_empty_population() {
        let mut ctx = context(BehaviorKind::Mating);
        let stopper = ctx.start_observer();
        assert_eq!(ctx.observer.stopper(), Some(stopper));
        ctx.tick().unwrap();
        assert!(!ctx.schedule.is_active(stopper));
        assert!(ctx.schedule.is_empty());
        assert_eq!(ctx.observer.records().len(), 1);
        assert_eq!(ctx.observer.records()[0].step(), 0);
    }

    #[test]
    fn test_aggregation_snapshot() {
        let mut ctx = context(BehaviorKind::Aggregation);
        ctx.spawn_aggregator(5, 5, Heading::ZERO, true).unwrap();
        ctx.spawn_aggregator(5, 6, Heading::ZERO, false).unwrap();
        observer_step(&mut ctx).unwrap();

        let MetricsRecord::Aggregation(a) = ctx.observer.records()[0] else {
            panic!("expected an aggregation record");
        };
        assert_eq!(a.agents, 2);
        assert_eq!(a.frozen, 1);
        assert_eq!(a.mean_frozen_distance, Some(0.0));
        assert_eq!(a.mean_mobile_distance, Some(1.0));
        assert_eq!(a.mean_distance, Some(0.5));
        assert_eq!(a.mean_neighbors, Some(2.0));
    }
}
