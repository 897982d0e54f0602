//! Per-run simulation state, passed by reference into every step.
//!
//! A `SimulationContext` lives for exactly one run. It owns the agent store
//! (`hecs::World`), the spatial grid, the scheduler, the random stream, the
//! observer and the behavior rules. There is no global state: every step
//! function receives the context explicitly and draws randomness from it in
//! schedule order.
//!
//! Agents are jointly owned by the grid (where they are) and the scheduler
//! (whether they still run). [`SimulationContext::retire`] is the single
//! removal path and detaches an agent from both, plus the world, at once.

use std::collections::HashSet;

use hecs::World;

use crate::components::*;
use crate::config::{validate_grid, AggregationConfig, GridConfig, MatingConfig};
use crate::error::{SimError, SimResult};
use crate::grid::SpatialGrid;
use crate::random::RandomStream;
use crate::schedule::{Scheduler, Steppable, Stopper};
use crate::systems::{observer_step, step_fn, Observer, OBSERVER_ORDER};

/// Behavior parameters consulted by the step functions. Both rule sets are
/// always present; an agent's [`Behavior`] variant selects which applies.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rules {
    pub aggregation: AggregationConfig,
    pub mating: MatingConfig,
}

/// A broken grid/schedule/world invariant found by [`SimulationContext::audit`].
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// Active on the schedule but absent from the grid
    ScheduledButNotPlaced(AgentId),
    /// On the grid but with no active schedule entry
    PlacedButNotScheduled(AgentId),
    /// More than one active schedule entry for the agent
    ScheduledTwice(AgentId),
    /// The agent's recorded cell does not list it exactly once
    CellMembership { agent: AgentId, count: usize },
    /// The agent's `Position` component disagrees with the grid
    PositionMismatch {
        agent: AgentId,
        component: Position,
        grid: Position,
    },
    /// The world and the grid track different numbers of agents
    PopulationMismatch { world: usize, grid: usize },
}

pub struct SimulationContext {
    pub world: World,
    pub grid: SpatialGrid,
    pub schedule: Scheduler,
    pub rng: RandomStream,
    pub observer: Observer,
    pub rules: Rules,
}

impl SimulationContext {
    /// Create an empty context. Fails if the grid dimensions are invalid.
    pub fn new(seed: u64, grid: &GridConfig, rules: Rules, observer: Observer) -> SimResult<Self> {
        let errors = validate_grid(grid);
        if !errors.is_empty() {
            return Err(SimError::Configuration(errors));
        }
        Ok(Self {
            world: World::new(),
            grid: SpatialGrid::new(grid.width, grid.height, grid.boundary),
            schedule: Scheduler::new(),
            rng: RandomStream::new(seed),
            observer,
            rules,
        })
    }

    // ── Agent lifecycle ────────────────────────────────────────────────

    /// Create an aggregation agent, place it and schedule it.
    pub fn spawn_aggregator(&mut self, x: i32, y: i32, heading: Heading, frozen: bool) -> SimResult<AgentId> {
        self.spawn_agent(x, y, heading, Behavior::Aggregation(Aggregator { frozen }))
    }

    /// Create a mating agent, place it and schedule it. Heading starts at zero.
    pub fn spawn_dater(&mut self, x: i32, y: i32, dater: Dater) -> SimResult<AgentId> {
        self.spawn_agent(x, y, Heading::ZERO, Behavior::Mating(dater))
    }

    fn spawn_agent(&mut self, x: i32, y: i32, heading: Heading, behavior: Behavior) -> SimResult<AgentId> {
        let agent = self.world.spawn((Position::default(), heading, behavior));
        let cell = match self.grid.place(agent, x, y) {
            Ok(cell) => cell,
            Err(e) => {
                self.world.despawn(agent)?;
                return Err(e);
            }
        };
        self.set_position(agent, cell)?;
        let stopper = self.schedule.schedule_repeating(Steppable::Agent(agent));
        self.world.insert_one(agent, Scheduled(stopper))?;
        Ok(agent)
    }

    /// Put the observer on the schedule after every agent.
    pub fn start_observer(&mut self) -> Stopper {
        let stopper = self
            .schedule
            .schedule_repeating_with(Steppable::Observer, OBSERVER_ORDER, 1);
        self.observer.attach_stopper(stopper);
        stopper
    }

    /// Permanently remove an agent from the grid, the schedule and the world.
    ///
    /// Nothing is changed if the agent is not on the grid.
    pub fn retire(&mut self, agent: AgentId) -> SimResult<()> {
        let stopper = self.world.get::<&Scheduled>(agent)?.0;
        self.grid.remove(agent)?;
        self.schedule.stop(stopper);
        self.world.despawn(agent)?;
        Ok(())
    }

    // ── Component access ───────────────────────────────────────────────
    //
    // Components are copied in and out so no borrow of the world outlives a
    // single call.

    pub fn position(&self, agent: AgentId) -> SimResult<Position> {
        Ok(*self.world.get::<&Position>(agent)?)
    }

    pub fn set_position(&mut self, agent: AgentId, position: Position) -> SimResult<()> {
        *self.world.get::<&mut Position>(agent)? = position;
        Ok(())
    }

    pub fn heading(&self, agent: AgentId) -> SimResult<Heading> {
        Ok(*self.world.get::<&Heading>(agent)?)
    }

    pub fn set_heading(&mut self, agent: AgentId, heading: Heading) -> SimResult<()> {
        *self.world.get::<&mut Heading>(agent)? = heading;
        Ok(())
    }

    pub fn behavior(&self, agent: AgentId) -> SimResult<Behavior> {
        Ok(*self.world.get::<&Behavior>(agent)?)
    }

    pub fn set_behavior(&mut self, agent: AgentId, behavior: Behavior) -> SimResult<()> {
        *self.world.get::<&mut Behavior>(agent)? = behavior;
        Ok(())
    }

    pub fn aggregator(&self, agent: AgentId) -> SimResult<Aggregator> {
        self.behavior(agent)?
            .as_aggregator()
            .copied()
            .ok_or(SimError::WrongBehavior {
                agent,
                expected: BehaviorKind::Aggregation,
            })
    }

    pub fn dater(&self, agent: AgentId) -> SimResult<Dater> {
        self.behavior(agent)?
            .as_dater()
            .copied()
            .ok_or(SimError::WrongBehavior {
                agent,
                expected: BehaviorKind::Mating,
            })
    }

    pub fn set_dater(&mut self, agent: AgentId, dater: Dater) -> SimResult<()> {
        self.set_behavior(agent, Behavior::Mating(dater))
    }

    /// Number of live agents.
    pub fn population(&self) -> usize {
        self.grid.len()
    }

    // ── Stepping ───────────────────────────────────────────────────────

    /// Run one entity's transition.
    pub fn step(&mut self, target: Steppable) -> SimResult<()> {
        match target {
            Steppable::Agent(agent) => {
                let kind = self.behavior(agent)?.kind();
                step_fn(kind)(self, agent)
            }
            Steppable::Observer => observer_step(self),
        }
    }

    /// Advance one tick: step every due, still-active entity in schedule
    /// order. An entity stopped earlier in the tick (e.g. the partner of an
    /// agent that just mated) is skipped.
    pub fn tick(&mut self) -> SimResult<()> {
        let due = self.schedule.begin_tick();
        let result = due.into_iter().try_for_each(|(stopper, target)| {
            if !self.schedule.is_active(stopper) {
                return Ok(());
            }
            self.step(target)
        });
        self.schedule.end_tick();
        result
    }

    // ── Invariants ─────────────────────────────────────────────────────

    /// Check that the schedule, the grid and the world agree on who is alive
    /// and where. Returns every violation found (empty when consistent).
    pub fn audit(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut scheduled = HashSet::new();

        for agent in self.schedule.active_agents() {
            if !scheduled.insert(agent) {
                violations.push(Violation::ScheduledTwice(agent));
                continue;
            }
            let Some(cell) = self.grid.location(agent) else {
                violations.push(Violation::ScheduledButNotPlaced(agent));
                continue;
            };
            let count = self
                .grid
                .agents_at(cell.x, cell.y)
                .iter()
                .filter(|&&a| a == agent)
                .count();
            if count != 1 {
                violations.push(Violation::CellMembership { agent, count });
            }
            match self.position(agent) {
                Ok(component) if component == cell => {}
                Ok(component) => violations.push(Violation::PositionMismatch {
                    agent,
                    component,
                    grid: cell,
                }),
                Err(_) => violations.push(Violation::ScheduledButNotPlaced(agent)),
            }
        }

        for &agent in self.grid.all_agents() {
            if !scheduled.contains(&agent) {
                violations.push(Violation::PlacedButNotScheduled(agent));
            }
        }

        let world = self.world.query::<&Behavior>().iter().count();
        if world != self.grid.len() {
            violations.push(Violation::PopulationMismatch {
                world,
                grid: self.grid.len(),
            });
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoundaryMode;

    fn context(mode: BoundaryMode) -> SimulationContext {
        let grid = GridConfig {
            width: 10,
            height: 10,
            boundary: mode,
        };
        SimulationContext::new(1, &grid, Rules::default(), Observer::new(BehaviorKind::Mating)).unwrap()
    }

    #[test]
    fn test_invalid_grid_is_rejected() {
        let grid = GridConfig {
            width: 0,
            height: 10,
            boundary: BoundaryMode::Bounded,
        };
        let result = SimulationContext::new(1, &grid, Rules::default(), Observer::new(BehaviorKind::Mating));
        assert!(matches!(result, Err(SimError::Configuration(_))));
    }

    #[test]
    fn test_spawn_registers_everywhere() {
        let mut ctx = context(BoundaryMode::Toroidal);
        let a = ctx.spawn_dater(3, 4, Dater::new(Gender::Male, 5.0)).unwrap();
        assert_eq!(ctx.position(a).unwrap(), Position::new(3, 4));
        assert_eq!(ctx.grid.location(a), Some(Position::new(3, 4)));
        assert_eq!(ctx.schedule.active_agents().collect::<Vec<_>>(), vec![a]);
        assert!(ctx.audit().is_empty());
    }

    #[test]
    fn test_spawn_outside_bounded_grid_leaves_no_trace() {
        let mut ctx = context(BoundaryMode::Bounded);
        let err = ctx.spawn_aggregator(12, 0, Heading::ZERO, false).unwrap_err();
        assert!(matches!(err, SimError::OutOfDomain { .. }));
        assert_eq!(ctx.world.len(), 0);
        assert!(ctx.grid.is_empty());
        assert!(ctx.schedule.is_empty());
    }

    #[test]
    fn test_retire_detaches_from_grid_schedule_and_world() {
        let mut ctx = context(BoundaryMode::Toroidal);
        let a = ctx.spawn_dater(1, 1, Dater::new(Gender::Male, 5.0)).unwrap();
        let b = ctx.spawn_dater(1, 1, Dater::new(Gender::Female, 5.0)).unwrap();

        ctx.retire(a).unwrap();
        assert!(!ctx.grid.contains(a));
        assert!(!ctx.world.contains(a));
        assert_eq!(ctx.schedule.active_agents().collect::<Vec<_>>(), vec![b]);
        assert_eq!(ctx.grid.agents_at(1, 1), &[b]);
        assert!(ctx.audit().is_empty());

        // A second removal of the same agent fails without side effects.
        assert!(ctx.retire(a).is_err());
        assert_eq!(ctx.population(), 1);
    }

    #[test]
    fn test_audit_reports_stale_grid_entry() {
        let mut ctx = context(BoundaryMode::Toroidal);
        let a = ctx.spawn_dater(1, 1, Dater::new(Gender::Male, 5.0)).unwrap();
        let stopper = ctx.world.get::<&Scheduled>(a).unwrap().0;
        ctx.schedule.stop(stopper);
        assert_eq!(ctx.audit(), vec![Violation::PlacedButNotScheduled(a)]);
    }

    #[test]
    fn test_wrong_behavior_is_reported() {
        let mut ctx = context(BoundaryMode::Toroidal);
        let a = ctx.spawn_aggregator(1, 1, Heading::ZERO, false).unwrap();
        assert!(matches!(
            ctx.dater(a),
            Err(SimError::WrongBehavior {
                expected: BehaviorKind::Mating,
                ..
            })
        ));
        assert!(ctx.aggregator(a).is_ok());
    }
}
