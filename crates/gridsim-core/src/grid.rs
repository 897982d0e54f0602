//! Sparse spatial grid for agent placement and neighbor queries.
//!
//! `SpatialGrid` maps cells to the agents standing on them (several agents
//! may share a cell) and keeps the reverse map from agent to cell. Both maps
//! change together on every mutation, so an agent is always listed in exactly
//! one cell and that cell is its recorded position.
//!
//! Moore queries touch only the queried cells, never the whole population.

use std::collections::HashMap;

use gridsim_logic::lattice::{BoundaryMode, Lattice};

use crate::components::{AgentId, Position};
use crate::error::{SimError, SimResult};

/// Sparse 2D index of agents by cell.
pub struct SpatialGrid {
    lattice: Lattice,
    mode: BoundaryMode,
    /// cell → occupants, in arrival order
    cells: HashMap<(i32, i32), Vec<AgentId>>,
    /// agent → cell
    locations: HashMap<AgentId, Position>,
    /// Every tracked agent, in a stable order (swap-remove on removal)
    population: Vec<AgentId>,
    /// agent → index into `population`
    slots: HashMap<AgentId, usize>,
}

impl SpatialGrid {
    /// Create an empty grid. Dimensions are assumed validated.
    pub fn new(width: i32, height: i32, mode: BoundaryMode) -> Self {
        Self {
            lattice: Lattice::new(width, height),
            mode,
            cells: HashMap::new(),
            locations: HashMap::new(),
            population: Vec::new(),
            slots: HashMap::new(),
        }
    }

    pub fn lattice(&self) -> Lattice {
        self.lattice
    }

    pub fn mode(&self) -> BoundaryMode {
        self.mode
    }

    pub fn width(&self) -> i32 {
        self.lattice.width
    }

    pub fn height(&self) -> i32 {
        self.lattice.height
    }

    /// Number of tracked agents.
    pub fn len(&self) -> usize {
        self.population.len()
    }

    pub fn is_empty(&self) -> bool {
        self.population.is_empty()
    }

    /// Number of cells holding at least one agent.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn contains(&self, agent: AgentId) -> bool {
        self.locations.contains_key(&agent)
    }

    /// Recorded cell of a tracked agent.
    pub fn location(&self, agent: AgentId) -> Option<Position> {
        self.locations.get(&agent).copied()
    }

    /// All tracked agents in population order.
    pub fn all_agents(&self) -> &[AgentId] {
        &self.population
    }

    /// Normalize a cell under the grid's boundary mode.
    pub fn normalize(&self, x: i32, y: i32) -> SimResult<Position> {
        self.lattice
            .normalize(x, y, self.mode)
            .map(Position::from)
            .ok_or(SimError::OutOfDomain {
                x,
                y,
                width: self.lattice.width,
                height: self.lattice.height,
            })
    }

    /// Put an agent on the grid. Toroidal coordinates are wrapped; bounded
    /// coordinates outside the domain are rejected. Placing an agent that is
    /// already tracked relocates it.
    pub fn place(&mut self, agent: AgentId, x: i32, y: i32) -> SimResult<Position> {
        let cell = self.normalize(x, y)?;
        if self.contains(agent) {
            return Ok(self.relocate(agent, cell));
        }

        self.cells.entry((cell.x, cell.y)).or_default().push(agent);
        self.locations.insert(agent, cell);
        self.slots.insert(agent, self.population.len());
        self.population.push(agent);
        Ok(cell)
    }

    /// Move a tracked agent to a new cell.
    pub fn move_agent(&mut self, agent: AgentId, x: i32, y: i32) -> SimResult<Position> {
        if !self.contains(agent) {
            return Err(SimError::UnknownAgent(agent));
        }
        let cell = self.normalize(x, y)?;
        Ok(self.relocate(agent, cell))
    }

    /// Take an agent off the grid, returning the cell it occupied.
    pub fn remove(&mut self, agent: AgentId) -> SimResult<Position> {
        let cell = self
            .locations
            .remove(&agent)
            .ok_or(SimError::UnknownAgent(agent))?;
        self.detach(agent, cell);

        if let Some(slot) = self.slots.remove(&agent) {
            self.population.swap_remove(slot);
            if let Some(&moved) = self.population.get(slot) {
                self.slots.insert(moved, slot);
            }
        }
        Ok(cell)
    }

    /// Occupants of a cell (empty if none, or if the cell is outside a
    /// bounded grid).
    pub fn agents_at(&self, x: i32, y: i32) -> &[AgentId] {
        self.lattice
            .normalize(x, y, self.mode)
            .and_then(|cell| self.cells.get(&cell))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Is any agent other than `except` standing on the cell?
    pub fn is_occupied_by_other(&self, x: i32, y: i32, except: AgentId) -> bool {
        self.agents_at(x, y).iter().any(|&a| a != except)
    }

    /// Occupants of the radius-`radius` Moore block around `(x, y)` under
    /// an explicit boundary mode, flattened cell by cell.
    ///
    /// The caller is responsible for skipping itself when the centre is
    /// included.
    pub fn moore_neighbors(
        &self,
        x: i32,
        y: i32,
        radius: u32,
        mode: BoundaryMode,
        include_center: bool,
    ) -> Vec<AgentId> {
        let mut found = Vec::new();
        for cell in self.lattice.moore_cells(x, y, radius, mode, include_center) {
            if let Some(occupants) = self.cells.get(&cell) {
                found.extend_from_slice(occupants);
            }
        }
        found
    }

    /// [`SpatialGrid::moore_neighbors`] under the run's boundary mode.
    pub fn neighbors(&self, x: i32, y: i32, radius: u32, include_center: bool) -> Vec<AgentId> {
        self.moore_neighbors(x, y, radius, self.mode, include_center)
    }

    fn relocate(&mut self, agent: AgentId, cell: Position) -> Position {
        if let Some(old) = self.locations.insert(agent, cell) {
            if old == cell {
                return cell;
            }
            self.detach(agent, old);
        }
        self.cells.entry((cell.x, cell.y)).or_default().push(agent);
        cell
    }

    fn detach(&mut self, agent: AgentId, cell: Position) {
        let key = (cell.x, cell.y);
        if let Some(occupants) = self.cells.get_mut(&key) {
            if let Some(i) = occupants.iter().position(|&a| a == agent) {
                occupants.remove(i);
            }
            if occupants.is_empty() {
                self.cells.remove(&key);
            }
        }
    }
}
