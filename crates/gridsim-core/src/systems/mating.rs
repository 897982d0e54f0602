//! Assortative mating market (Kalick-Hamilton style).
//!
//! Each tick a live agent that has not dated yet drifts toward its
//! neighbours (optional), randomizes its heading with some probability,
//! takes a step, then looks for a date. A date is a bilateral Bernoulli
//! trial; on success both partners leave the simulation for good.

use gridsim_logic::lattice::{moore_cell_count, unit_sign};
use gridsim_logic::preference::{acceptance_probability, closing_time};

use crate::components::*;
use crate::config::{ClusteringConfig, DatingScope};
use crate::context::SimulationContext;
use crate::error::SimResult;

/// Result of a resolved date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOutcome {
    /// Both accepted; both agents were retired.
    Mated,
    /// At least one declined; both were marked as dated.
    Rejected,
}

/// One mating step for `agent`.
pub fn mating_step(ctx: &mut SimulationContext, agent: AgentId) -> SimResult<()> {
    let me = ctx.dater(agent)?;
    if me.dated_this_tick {
        return Ok(());
    }

    if let Some(clustering) = ctx.rules.mating.clustering {
        cluster_drift(ctx, agent, clustering)?;
    }
    if ctx.rng.next_boolean(ctx.rules.mating.p_random_move) {
        let heading = ctx.rng.next_heading();
        ctx.set_heading(agent, heading)?;
    }
    let position = step_forward(ctx, agent)?;

    let partner = match ctx.rules.mating.dating {
        DatingScope::Global => {
            let len = ctx.grid.len();
            if len == 0 {
                None
            } else {
                let start = ctx.rng.next_int(len as u32) as usize;
                first_eligible(ctx, agent, me.gender, ctx.grid.all_agents(), start)?
            }
        }
        DatingScope::Local { radius } => {
            let pool = ctx.grid.neighbors(position.x, position.y, radius, true);
            find_date(ctx, agent, me.gender, &pool)?
        }
    };
    if let Some(partner) = partner {
        go_on_date(ctx, agent, partner)?;
    }
    Ok(())
}

/// Steer toward nearby agents when the neighbourhood is sparse.
///
/// Counts occupied cells in the radius-`r` Moore block (centre excluded).
/// Below `round(chuminess · (4r² + 4r))` the heading is set, per axis, to
/// the sign of the inverse-distance-weighted sum of directions to each
/// neighbour. Dense neighbourhoods leave the heading alone.
pub fn cluster_drift(ctx: &mut SimulationContext, agent: AgentId, clustering: ClusteringConfig) -> SimResult<()> {
    let position = ctx.position(agent)?;
    let lattice = ctx.grid.lattice();
    let mode = ctx.grid.mode();
    let threshold = (clustering.chuminess * moore_cell_count(clustering.radius) as f64).round() as usize;

    let mut occupied = 0;
    let (mut xs, mut ys) = (0.0, 0.0);
    for (cx, cy) in lattice.moore_cells(position.x, position.y, clustering.radius, mode, false) {
        let occupants = ctx.grid.agents_at(cx, cy);
        if occupants.is_empty() {
            continue;
        }
        occupied += 1;
        if occupied >= threshold {
            return Ok(());
        }
        let (dx, dy) = lattice.offset((position.x, position.y), (cx, cy), mode);
        let weight = occupants.len() as f64 / ((dx * dx + dy * dy) as f64).sqrt();
        xs += dx.signum() as f64 * weight;
        ys += dy.signum() as f64 * weight;
    }

    ctx.set_heading(agent, Heading::new(unit_sign(xs), unit_sign(ys)))
}

/// Take one step along the current heading.
///
/// A candidate cell that is occupied by someone else (or lies outside a
/// bounded grid) reverses the heading and the step is retaken from the
/// reversed heading. The reversed step is committed even if occupied; if it
/// too leaves a bounded grid the agent stays where it is.
fn step_forward(ctx: &mut SimulationContext, agent: AgentId) -> SimResult<Position> {
    let position = ctx.position(agent)?;
    let mut heading = ctx.heading(agent)?;

    let (x, y) = position.stepped(heading);
    let blocked = match ctx.grid.normalize(x, y) {
        Ok(cell) => ctx.grid.is_occupied_by_other(cell.x, cell.y, agent),
        Err(_) => true,
    };
    let target = if blocked {
        heading = heading.reversed();
        ctx.set_heading(agent, heading)?;
        let (rx, ry) = position.stepped(heading);
        ctx.grid.normalize(rx, ry).unwrap_or(position)
    } else {
        (x, y).into()
    };

    let cell = ctx.grid.move_agent(agent, target.x, target.y)?;
    ctx.set_position(agent, cell)?;
    Ok(cell)
}

/// Pick a date for `seeker` from `pool`.
///
/// Starts at a uniformly drawn index and returns the first eligible agent
/// (opposite gender, not dated this tick, not the seeker), wrapping around
/// the pool once. An empty pool yields `None` without drawing.
pub fn find_date(
    ctx: &mut SimulationContext,
    seeker: AgentId,
    gender: Gender,
    pool: &[AgentId],
) -> SimResult<Option<AgentId>> {
    if pool.is_empty() {
        return Ok(None);
    }
    let start = ctx.rng.next_int(pool.len() as u32) as usize;
    first_eligible(ctx, seeker, gender, pool, start)
}

/// Scan `pool` from `start`, wrapping once, for the first eligible date.
fn first_eligible(
    ctx: &SimulationContext,
    seeker: AgentId,
    gender: Gender,
    pool: &[AgentId],
    start: usize,
) -> SimResult<Option<AgentId>> {
    for &candidate in pool[start..].iter().chain(&pool[..start]) {
        if candidate == seeker {
            continue;
        }
        if ctx.dater(candidate)?.is_eligible_for(gender) {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// Resolve a date between `actor` and `partner`.
///
/// Each side's acceptance probability comes from the preference rule and is
/// then adjusted by that side's own closing-time state. Both Bernoulli draws
/// are always taken, actor first.
pub fn go_on_date(ctx: &mut SimulationContext, actor: AgentId, partner: AgentId) -> SimResult<DateOutcome> {
    let mut me = ctx.dater(actor)?;
    let mut other = ctx.dater(partner)?;
    let rules = ctx.rules.mating;
    let max = rules.max_attractiveness as f64;

    let p_me = closing_time(
        acceptance_probability(rules.rule, me.attractiveness, other.attractiveness, max, rules.choosiness),
        me.dates,
        rules.max_dates,
    );
    let p_other = closing_time(
        acceptance_probability(rules.rule, other.attractiveness, me.attractiveness, max, rules.choosiness),
        other.dates,
        rules.max_dates,
    );

    let me_accepts = ctx.rng.next_boolean(p_me);
    let other_accepts = ctx.rng.next_boolean(p_other);

    if me_accepts && other_accepts {
        let (female, male) = match me.gender {
            Gender::Female => (me.attractiveness, other.attractiveness),
            Gender::Male => (other.attractiveness, me.attractiveness),
        };
        ctx.observer.record_mate_choice(female, male);
        ctx.retire(actor)?;
        ctx.retire(partner)?;
        log::debug!("paired {:?} with {:?} (f={}, m={})", actor, partner, female, male);
        return Ok(DateOutcome::Mated);
    }

    me.dated_this_tick = true;
    me.dates += 1;
    other.dated_this_tick = true;
    other.dates += 1;
    ctx.set_dater(actor, me)?;
    ctx.set_dater(partner, other)?;
    Ok(DateOutcome::Rejected)
}
