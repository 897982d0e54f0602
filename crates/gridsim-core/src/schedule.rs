//! Discrete-time scheduler.
//!
//! The scheduler holds an arena of [`ScheduleEntry`] slots. Registering an
//! entity appends a slot and returns a [`Stopper`] (the slot index);
//! stopping marks the slot inactive. Slots are never reused, so a stopper
//! can never deactivate some other entity.
//!
//! Within a tick, due entries run by ascending `order`, then by registration
//! sequence. Agents use order 0 and the observer a higher order, so every
//! agent's transition for tick T is complete before the observer sees T.
//!
//! The scheduler does not call into entities itself: the
//! [`SimulationContext`](crate::context::SimulationContext) owns the state
//! entities mutate, so it asks for the tick's due list with
//! [`Scheduler::begin_tick`], dispatches each entry that is still active,
//! and closes the tick with [`Scheduler::end_tick`].

use crate::components::AgentId;

/// Default ordering key for agents.
pub const AGENT_ORDER: i32 = 0;

/// Something the scheduler can step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Steppable {
    Agent(AgentId),
    Observer,
}

/// Handle to a schedule slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stopper(usize);

impl Stopper {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleEntry {
    pub target: Steppable,
    pub order: i32,
    /// Ticks between successive invocations (≥ 1)
    pub interval: u64,
    /// First tick on which the entry is due
    start: u64,
    /// Registration sequence, the tie-breaker within an order
    seq: u64,
    active: bool,
}

impl ScheduleEntry {
    pub fn is_active(&self) -> bool {
        self.active
    }

    fn is_due(&self, step: u64) -> bool {
        self.active && step >= self.start && (step - self.start) % self.interval == 0
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    entries: Vec<ScheduleEntry>,
    /// Active slot indices sorted by (order, seq)
    queue: Vec<usize>,
    steps: u64,
    active: usize,
    in_tick: bool,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `target` to run every tick at [`AGENT_ORDER`].
    pub fn schedule_repeating(&mut self, target: Steppable) -> Stopper {
        self.schedule_repeating_with(target, AGENT_ORDER, 1)
    }

    /// Register `target` at `order`, running every `interval` ticks
    /// (`interval == 0` is treated as 1).
    ///
    /// The first invocation is the next tick to start: the current one if
    /// no tick is running, otherwise the following one.
    pub fn schedule_repeating_with(&mut self, target: Steppable, order: i32, interval: u64) -> Stopper {
        let index = self.entries.len();
        let seq = index as u64;
        let start = if self.in_tick { self.steps + 1 } else { self.steps };
        self.entries.push(ScheduleEntry {
            target,
            order,
            interval: interval.max(1),
            start,
            seq,
            active: true,
        });

        let entries = &self.entries;
        let pos = self
            .queue
            .partition_point(|&i| (entries[i].order, entries[i].seq) <= (order, seq));
        self.queue.insert(pos, index);
        self.active += 1;
        Stopper(index)
    }

    /// Deactivate a slot. Returns whether it was active; stopping a stopped
    /// slot is a no-op.
    pub fn stop(&mut self, stopper: Stopper) -> bool {
        match self.entries.get_mut(stopper.0) {
            Some(entry) if entry.active => {
                entry.active = false;
                self.active -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn is_active(&self, stopper: Stopper) -> bool {
        self.entries.get(stopper.0).is_some_and(|e| e.active)
    }

    pub fn entry(&self, stopper: Stopper) -> Option<&ScheduleEntry> {
        self.entries.get(stopper.0)
    }

    /// Ticks completed so far. During a tick this is that tick's index.
    pub fn current_step(&self) -> u64 {
        self.steps
    }

    /// Number of active slots.
    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    /// Agents with an active slot, in schedule order.
    pub fn active_agents(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.queue.iter().filter_map(|&i| {
            let entry = &self.entries[i];
            match entry.target {
                Steppable::Agent(agent) if entry.active => Some(agent),
                _ => None,
            }
        })
    }

    /// Open a tick and return the entries due on it, in execution order.
    ///
    /// The caller must check [`Scheduler::is_active`] before stepping each
    /// entry: an entry stopped earlier in the same tick must not run.
    pub fn begin_tick(&mut self) -> Vec<(Stopper, Steppable)> {
        self.in_tick = true;
        let step = self.steps;
        self.queue
            .iter()
            .filter(|&&i| self.entries[i].is_due(step))
            .map(|&i| (Stopper(i), self.entries[i].target))
            .collect()
    }

    /// Close the tick opened by [`Scheduler::begin_tick`], advancing time.
    pub fn end_tick(&mut self) {
        self.in_tick = false;
        self.steps += 1;
        let entries = &self.entries;
        self.queue.retain(|&i| entries[i].active);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecs::World;

    fn run_tick(s: &mut Scheduler) -> Vec<Steppable> {
        let due = s.begin_tick();
        let ran = due
            .into_iter()
            .filter(|(stopper, _)| s.is_active(*stopper))
            .map(|(_, t)| t)
            .collect();
        s.end_tick();
        ran
    }

    #[test]
    fn test_order_then_registration() {
        let mut world = World::new();
        let a = world.spawn(());
        let b = world.spawn(());
        let mut s = Scheduler::new();
        s.schedule_repeating_with(Steppable::Observer, 10, 1);
        s.schedule_repeating(Steppable::Agent(a));
        s.schedule_repeating(Steppable::Agent(b));

        assert_eq!(
            run_tick(&mut s),
            vec![Steppable::Agent(a), Steppable::Agent(b), Steppable::Observer]
        );
        assert_eq!(s.current_step(), 1);
    }

    #[test]
    fn test_interval() {
        let mut s = Scheduler::new();
        s.schedule_repeating_with(Steppable::Observer, 0, 3);
        let runs: Vec<usize> = (0..7).map(|_| run_tick(&mut s).len()).collect();
        assert_eq!(runs, vec![1, 0, 0, 1, 0, 0, 1]);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut s = Scheduler::new();
        let stopper = s.schedule_repeating(Steppable::Observer);
        assert!(s.is_active(stopper));
        assert!(s.stop(stopper));
        assert!(!s.stop(stopper));
        assert!(!s.is_active(stopper));
        assert_eq!(s.active_count(), 0);
        assert!(run_tick(&mut s).is_empty());
    }

    #[test]
    fn test_stopped_mid_tick_is_skipped() {
        let mut world = World::new();
        let a = world.spawn(());
        let b = world.spawn(());
        let mut s = Scheduler::new();
        s.schedule_repeating(Steppable::Agent(a));
        let stop_b = s.schedule_repeating(Steppable::Agent(b));

        let due = s.begin_tick();
        let mut ran = Vec::new();
        for (stopper, target) in due {
            if !s.is_active(stopper) {
                continue;
            }
            ran.push(target);
            // `a` removes `b` during its step
            s.stop(stop_b);
        }
        s.end_tick();

        assert_eq!(ran, vec![Steppable::Agent(a)]);
        assert_eq!(s.active_agents().collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn test_registered_mid_tick_waits_for_next_tick() {
        let mut s = Scheduler::new();
        let due = s.begin_tick();
        assert!(due.is_empty());
        let stopper = s.schedule_repeating_with(Steppable::Observer, 0, 2);
        s.end_tick();

        assert_eq!(s.entry(stopper).map(|e| e.interval), Some(2));
        assert_eq!(run_tick(&mut s).len(), 1);
        assert_eq!(run_tick(&mut s).len(), 0);
        assert_eq!(run_tick(&mut s).len(), 1);
    }

    #[test]
    fn test_zero_interval_means_every_tick() {
        let mut s = Scheduler::new();
        s.schedule_repeating_with(Steppable::Observer, 0, 0);
        assert_eq!(run_tick(&mut s).len(), 1);
        assert_eq!(run_tick(&mut s).len(), 1);
    }
}
