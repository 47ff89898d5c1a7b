//! The shared board: occupancy, the two trail overlays and the single lock
//! guarding them.
//!
//! All state lives behind one `parking_lot::Mutex`. Callers either use the
//! single-operation wrappers on [`Board`] or take a [`BoardGuard`] through
//! [`Board::lock`] when several operations must happen in one critical section
//! (spawning is find-empty-cell followed by place).

use anyhow::Result;
use log::trace;
use parking_lot::{Mutex, MutexGuard};
use rand::Rng;
use traveller_common::{Direction, Position, SimParams, Snapshot};

/// Random probes per cell before `find_empty_cell` falls back to a full scan.
const PROBES_PER_CELL: usize = 4;

/// Handle to a placed traveller. Only the board that issued it can resolve it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TravellerKey(usize);

#[derive(Debug, Clone)]
struct TravellerRecord {
    id: u32,
    position: Position,
}

#[derive(Debug)]
struct BoardState {
    rows: usize,
    cols: usize,
    cells: Vec<Option<TravellerKey>>,
    /// Indexed by `TravellerKey`; the only record of where a traveller stands.
    travellers: Vec<TravellerRecord>,
    horizontal_traces: Vec<bool>,
    vertical_traces: Vec<bool>,
    moves_since_snapshot: u64,
}

#[derive(Debug)]
pub struct Board {
    state: Mutex<BoardState>,
}

impl Board {
    /// Creates an empty `rows` x `cols` board with cleared trails.
    pub fn new(rows: usize, cols: usize) -> Self {
        let state = BoardState {
            rows,
            cols,
            cells: vec![None; rows * cols],
            travellers: Vec::new(),
            horizontal_traces: vec![false; rows * cols.saturating_sub(1)],
            vertical_traces: vec![false; rows.saturating_sub(1) * cols],
            moves_since_snapshot: 0,
        };
        Self { state: Mutex::new(state) }
    }

    pub fn from_params(params: &SimParams) -> Self {
        Self::new(params.rows, params.cols)
    }

    /// Acquires the board lock. Keep the guard only for the duration of the
    /// operations; never sleep while holding it.
    pub fn lock(&self) -> BoardGuard<'_> {
        BoardGuard { state: self.state.lock() }
    }

    /// Finds an empty cell and places traveller `id` there in one critical section.
    pub fn spawn<R: Rng + ?Sized>(&self, id: u32, rng: &mut R) -> Option<(TravellerKey, Position)> {
        let mut board = self.lock();
        let position = board.find_empty_cell(rng)?;
        let key = board.place(id, position)?;
        Some((key, position))
    }

    pub fn try_move(&self, key: TravellerKey, direction: Direction) -> bool {
        self.lock().try_move(key, direction)
    }

    pub fn position_of(&self, key: TravellerKey) -> Option<Position> {
        self.lock().position_of(key)
    }

    pub fn traveller_count(&self) -> usize {
        self.lock().traveller_count()
    }

    pub fn take_snapshot(&self, sequence: u64) -> Snapshot {
        self.lock().take_snapshot(sequence)
    }

    pub fn render_and_clear(&self) -> String {
        self.lock().render_and_clear()
    }

    pub fn check_invariants(&self) -> Result<()> {
        self.lock().check_invariants()
    }
}

/// Exclusive access to the board state for as long as the guard lives.
pub struct BoardGuard<'a> {
    state: MutexGuard<'a, BoardState>,
}

impl BoardGuard<'_> {
    /// Picks an empty cell uniformly at random.
    ///
    /// Rejection sampling first; if that keeps hitting occupied cells the
    /// remaining empty cells are enumerated and one is drawn from them.
    /// Returns `None` only when every cell is occupied.
    pub fn find_empty_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Position> {
        let st = &*self.state;
        let total = st.cells.len();
        if total == 0 {
            return None;
        }

        for _ in 0..total * PROBES_PER_CELL {
            let idx = rng.random_range(0..total);
            if st.cells[idx].is_none() {
                return Some(Position::from_index(idx, st.cols));
            }
        }

        let empty: Vec<usize> = (0..total).filter(|&idx| st.cells[idx].is_none()).collect();
        if empty.is_empty() {
            return None;
        }
        let idx = empty[rng.random_range(0..empty.len())];
        Some(Position::from_index(idx, st.cols))
    }

    /// Puts a new traveller on an empty, in-bounds cell. Leaves the board
    /// untouched and returns `None` otherwise.
    pub fn place(&mut self, id: u32, position: Position) -> Option<TravellerKey> {
        let st = &mut *self.state;
        if !position.in_bounds(st.rows, st.cols) {
            return None;
        }
        let idx = position.index(st.cols);
        if st.cells[idx].is_some() {
            return None;
        }

        let key = TravellerKey(st.travellers.len());
        st.travellers.push(TravellerRecord { id, position });
        st.cells[idx] = Some(key);
        Some(key)
    }

    /// Moves the traveller one cell in `direction` if the destination is on the
    /// board and empty, marking the crossed edge. A refused move changes nothing.
    pub fn try_move(&mut self, key: TravellerKey, direction: Direction) -> bool {
        let st = &mut *self.state;
        let Some(record) = st.travellers.get(key.0) else {
            return false;
        };
        let from = record.position;
        let Some(to) = from.step(direction, st.rows, st.cols) else {
            return false;
        };
        let to_idx = to.index(st.cols);
        if st.cells[to_idx].is_some() {
            return false;
        }

        st.cells[from.index(st.cols)] = None;
        st.cells[to_idx] = Some(key);

        // The crossed edge is keyed by its north-west endpoint.
        let anchor = Position::new(from.row.min(to.row), from.col.min(to.col));
        if direction.is_vertical() {
            st.vertical_traces[anchor.row * st.cols + anchor.col] = true;
        } else {
            st.horizontal_traces[anchor.row * (st.cols - 1) + anchor.col] = true;
        }

        st.travellers[key.0].position = to;
        st.moves_since_snapshot += 1;
        trace!("Traveller {:02} moved {:?} {} -> {}", st.travellers[key.0].id, direction, from, to);
        true
    }

    pub fn position_of(&self, key: TravellerKey) -> Option<Position> {
        self.state.travellers.get(key.0).map(|r| r.position)
    }

    /// Id of the traveller standing on `position`, if any.
    pub fn occupant(&self, position: Position) -> Option<u32> {
        let st = &*self.state;
        if !position.in_bounds(st.rows, st.cols) {
            return None;
        }
        st.cells[position.index(st.cols)].map(|key| st.travellers[key.0].id)
    }

    pub fn traveller_count(&self) -> usize {
        self.state.travellers.len()
    }

    /// Captures occupancy and trails, then clears the trails and move counter.
    pub fn take_snapshot(&mut self, sequence: u64) -> Snapshot {
        let st = &mut *self.state;
        let cells = st
            .cells
            .iter()
            .map(|cell| cell.map(|key| st.travellers[key.0].id))
            .collect();

        let snapshot = Snapshot {
            sequence,
            rows: st.rows,
            cols: st.cols,
            cells,
            horizontal_traces: st.horizontal_traces.clone(),
            vertical_traces: st.vertical_traces.clone(),
            traveller_count: st.travellers.len(),
            moves: st.moves_since_snapshot,
        };

        st.horizontal_traces.fill(false);
        st.vertical_traces.fill(false);
        st.moves_since_snapshot = 0;
        snapshot
    }

    /// Renders the grid text and clears the trails.
    pub fn render_and_clear(&mut self) -> String {
        self.take_snapshot(0).render_grid()
    }

    /// Verifies that occupancy and traveller positions form a bijection.
    pub fn check_invariants(&self) -> Result<()> {
        let st = &*self.state;
        let mut occupied = 0;
        for (idx, cell) in st.cells.iter().enumerate() {
            let Some(key) = cell else { continue };
            occupied += 1;
            let Some(record) = st.travellers.get(key.0) else {
                anyhow::bail!("Cell {} holds unknown traveller key {:?}.", idx, key);
            };
            let here = Position::from_index(idx, st.cols);
            if record.position != here {
                anyhow::bail!(
                    "Traveller {:02} is recorded at {} but occupies {}.",
                    record.id, record.position, here
                );
            }
        }
        if occupied != st.travellers.len() {
            anyhow::bail!(
                "{} occupied cells for {} travellers.",
                occupied, st.travellers.len()
            );
        }
        Ok(())
    }
}
