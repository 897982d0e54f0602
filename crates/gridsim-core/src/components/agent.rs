//! Agent components: cell position, heading and the tagged behavior state.

use hecs::Entity;
use serde::{Deserialize, Serialize};

use crate::schedule::Stopper;

/// Agent identity. Agents are entities of the simulation's `hecs::World`.
pub type AgentId = Entity;

/// Grid cell an agent occupies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell reached by taking one step along `heading` (not normalized).
    pub fn stepped(&self, heading: Heading) -> (i32, i32) {
        (self.x + heading.dx, self.y + heading.dy)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Unit movement vector, each axis in {-1, 0, 1}
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub dx: i32,
    pub dy: i32,
}

impl Heading {
    pub const ZERO: Self = Self { dx: 0, dy: 0 };

    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    pub fn reversed(&self) -> Self {
        Self {
            dx: -self.dx,
            dy: -self.dy,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn opposite(&self) -> Self {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }
}

/// Diffusion-limited aggregation state. `frozen` only ever goes false → true.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregator {
    pub frozen: bool,
}

/// Mating-market state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dater {
    pub gender: Gender,
    /// Fixed at creation, in `[1, max_attractiveness]`
    pub attractiveness: f64,
    /// Dates gone on this run (successful or not)
    pub dates: u32,
    /// Set once the agent has been on a date this tick; cleared by the observer
    pub dated_this_tick: bool,
}

impl Dater {
    pub fn new(gender: Gender, attractiveness: f64) -> Self {
        Self {
            gender,
            attractiveness,
            dates: 0,
            dated_this_tick: false,
        }
    }

    /// Can `self` be offered as a date to an agent of `seeker` gender?
    pub fn is_eligible_for(&self, seeker: Gender) -> bool {
        !self.dated_this_tick && self.gender == seeker.opposite()
    }
}

/// Discriminant of [`Behavior`], used for dispatch and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorKind {
    Aggregation,
    Mating,
}

/// Behavior-specific agent state. Every agent carries exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    Aggregation(Aggregator),
    Mating(Dater),
}

impl Behavior {
    pub fn kind(&self) -> BehaviorKind {
        match self {
            Behavior::Aggregation(_) => BehaviorKind::Aggregation,
            Behavior::Mating(_) => BehaviorKind::Mating,
        }
    }

    pub fn as_aggregator(&self) -> Option<&Aggregator> {
        match self {
            Behavior::Aggregation(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_aggregator_mut(&mut self) -> Option<&mut Aggregator> {
        match self {
            Behavior::Aggregation(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_dater(&self) -> Option<&Dater> {
        match self {
            Behavior::Mating(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_dater_mut(&mut self) -> Option<&mut Dater> {
        match self {
            Behavior::Mating(d) => Some(d),
            _ => None,
        }
    }
}

/// Handle to the agent's schedule entry, used to take it off the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduled(pub Stopper);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_reversed() {
        let h = Heading::new(-1, 1);
        assert_eq!(h.reversed(), Heading::new(1, -1));
        assert!(Heading::ZERO.reversed().is_zero());
    }

    #[test]
    fn test_dater_eligibility() {
        let mut d = Dater::new(Gender::Female, 4.0);
        assert!(d.is_eligible_for(Gender::Male));
        assert!(!d.is_eligible_for(Gender::Female));
        d.dated_this_tick = true;
        assert!(!d.is_eligible_for(Gender::Male));
    }

    #[test]
    fn test_behavior_accessors() {
        let mut b = Behavior::Aggregation(Aggregator { frozen: false });
        assert_eq!(b.kind(), BehaviorKind::Aggregation);
        assert!(b.as_dater().is_none());
        b.as_aggregator_mut().unwrap().frozen = true;
        assert!(b.as_aggregator().unwrap().frozen);
    }
}
