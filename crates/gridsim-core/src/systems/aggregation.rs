//! Freezing aggregation: mobile agents random-walk until they bump into the
//! frozen cluster, then freeze in place.

use gridsim_logic::lattice::{BoundaryMode, Lattice};

use crate::components::*;
use crate::context::SimulationContext;
use crate::error::SimResult;

/// One aggregation step for `agent`.
///
/// Frozen agents do nothing. A mobile agent first redraws its heading with
/// probability `p_redirect`, then computes its candidate cell. If any other
/// occupant of that cell is frozen, the agent freezes where it stands with a
/// zero heading; otherwise it moves to the candidate.
pub fn aggregation_step(ctx: &mut SimulationContext, agent: AgentId) -> SimResult<()> {
    if ctx.aggregator(agent)?.frozen {
        return Ok(());
    }

    let mut heading = ctx.heading(agent)?;
    if ctx.rng.next_boolean(ctx.rules.aggregation.p_redirect) {
        heading = ctx.rng.next_heading();
    }

    let position = ctx.position(agent)?;
    let (heading, candidate) = candidate_cell(ctx.grid.lattice(), ctx.grid.mode(), position, heading);

    if touches_frozen(ctx, agent, candidate)? {
        ctx.set_behavior(agent, Behavior::Aggregation(Aggregator { frozen: true }))?;
        ctx.set_heading(agent, Heading::ZERO)?;
        log::trace!("agent {:?} froze at ({}, {})", agent, position.x, position.y);
        return Ok(());
    }

    let cell = ctx.grid.move_agent(agent, candidate.x, candidate.y)?;
    ctx.set_position(agent, cell)?;
    ctx.set_heading(agent, heading)
}

/// Cell an aggregator heads for, and the heading it leaves with.
///
/// On a torus the step simply wraps. On a bounded grid a step landing on or
/// beyond a boundary row/column is reflected: the heading is negated and the
/// candidate recomputed from the current cell, clamped into the domain.
pub fn candidate_cell(lattice: Lattice, mode: BoundaryMode, from: Position, heading: Heading) -> (Heading, Position) {
    let (x, y) = from.stepped(heading);
    match mode {
        BoundaryMode::Toroidal => (heading, lattice.wrap(x, y).into()),
        BoundaryMode::Bounded if lattice.on_edge(x, y) => {
            let reflected = heading.reversed();
            let (rx, ry) = from.stepped(reflected);
            (reflected, lattice.clamp(rx, ry).into())
        }
        BoundaryMode::Bounded => (heading, Position::new(x, y)),
    }
}

fn touches_frozen(ctx: &SimulationContext, agent: AgentId, cell: Position) -> SimResult<bool> {
    for &other in ctx.grid.agents_at(cell.x, cell.y) {
        if other != agent && ctx.aggregator(other)?.frozen {
            return Ok(true);
        }
    }
    Ok(false)
}
