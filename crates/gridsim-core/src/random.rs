//! Seeded random stream shared by every agent of a run.
//!
//! The stream is owned by the [`SimulationContext`](crate::context::SimulationContext)
//! and threaded explicitly into each step, in schedule order. Given the same
//! seed and the same sequence of call sites, it reproduces the same
//! trajectory draw for draw.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::components::Heading;

pub struct RandomStream {
    rng: StdRng,
    seed: u64,
    draws: u64,
}

impl RandomStream {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
            draws: 0,
        }
    }

    /// Seed this stream was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of draws taken so far.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Uniform integer in `[0, bound)`. A zero bound yields 0 without drawing.
    pub fn next_int(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        self.draws += 1;
        self.rng.gen_range(0..bound)
    }

    /// Uniform double in `[0, 1)`.
    pub fn next_double(&mut self) -> f64 {
        self.draws += 1;
        self.rng.gen::<f64>()
    }

    /// Bernoulli draw: `true` with probability `p`.
    ///
    /// Always consumes exactly one draw, so `p = 0` and `p = 1` keep the
    /// stream aligned with any other probability.
    pub fn next_boolean(&mut self, p: f64) -> bool {
        self.next_double() < p
    }

    /// Heading drawn uniformly from {-1, 0, 1}², the zero vector included.
    pub fn next_heading(&mut self) -> Heading {
        let dx = self.next_int(3) as i32 - 1;
        let dy = self.next_int(3) as i32 - 1;
        Heading::new(dx, dy)
    }
}
