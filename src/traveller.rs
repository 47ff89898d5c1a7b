//! Travellers and the spawner slots that materialize them.

use log::{debug, info, trace, warn};
use rand::Rng;
use traveller_common::{Direction, SimParams};

use crate::board::{Board, TravellerKey};
use crate::shutdown::Shutdown;

/// Returns `true` with `percent` percent probability.
#[inline(always)]
pub fn roll_percent<R: Rng + ?Sized>(rng: &mut R, percent: u8) -> bool {
    rng.random_range(0..100u8) < percent
}

/// A placed traveller. Its position is owned by the board and only changes
/// through [`Board::try_move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Traveller {
    key: TravellerKey,
    id: u32,
}

impl Traveller {
    pub fn key(&self) -> TravellerKey { self.key }
    pub fn id(&self) -> u32 { self.id }

    /// One decision tick: with the configured probability, try a step in a
    /// random direction. Returns the direction if the traveller actually moved.
    pub fn tick<R: Rng + ?Sized>(&self, board: &Board, params: &SimParams, rng: &mut R) -> Option<Direction> {
        if !roll_percent(rng, params.move_probability) {
            return None;
        }
        let direction: Direction = rng.random();
        if board.try_move(self.key, direction) {
            Some(direction)
        } else {
            trace!("Traveller {:02} blocked going {:?}", self.id, direction);
            None
        }
    }

    /// Moves forever on the move interval until shutdown is requested.
    pub fn activate<R: Rng + ?Sized>(self, board: &Board, params: &SimParams, rng: &mut R, shutdown: &Shutdown) {
        debug!("Traveller {:02} activated", self.id);
        loop {
            self.tick(board, params, rng);
            if !shutdown.sleep(params.move_interval) {
                break;
            }
        }
        debug!("Traveller {:02} stopped", self.id);
    }
}

/// One spawner slot. Fires at most once; the slot index becomes the traveller id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spawner {
    slot: usize,
}

impl Spawner {
    pub fn new(slot: usize) -> Self {
        Self { slot }
    }

    pub fn slot(&self) -> usize { self.slot }

    /// One spawn check. On success the traveller is already on the board.
    pub fn try_spawn<R: Rng + ?Sized>(&self, board: &Board, params: &SimParams, rng: &mut R) -> Option<Traveller> {
        if !roll_percent(rng, params.spawn_probability) {
            return None;
        }
        let id = self.slot as u32;
        match board.spawn(id, rng) {
            Some((key, position)) => {
                info!("Traveller {:02} spawned at {}", id, position);
                Some(Traveller { key, id })
            }
            None => {
                warn!("Spawner {:02}: board is full, retrying next interval", id);
                None
            }
        }
    }

    /// Checks on the spawn interval until a traveller is placed. Returns `None`
    /// if shutdown came first.
    pub fn wait_for_spawn<R: Rng + ?Sized>(
        &self,
        board: &Board,
        params: &SimParams,
        rng: &mut R,
        shutdown: &Shutdown,
    ) -> Option<Traveller> {
        loop {
            if let Some(traveller) = self.try_spawn(board, params, rng) {
                return Some(traveller);
            }
            if !shutdown.sleep(params.spawn_interval) {
                debug!("Spawner {:02} stopped before spawning", self.slot);
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;
    use traveller_common::Position;

    fn params(spawn: u8, moves: u8) -> SimParams {
        SimParams {
            rows: 3,
            cols: 3,
            slots: 2,
            spawn_probability: spawn,
            move_probability: moves,
            spawn_interval: Duration::from_millis(1),
            move_interval: Duration::from_millis(1),
            ..SimParams::default()
        }
    }

    #[test]
    fn roll_percent_extremes() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            assert!(!roll_percent(&mut rng, 0));
            assert!(roll_percent(&mut rng, 100));
        }
    }

    #[test]
    fn spawner_with_zero_probability_never_places() {
        let board = Board::new(3, 3);
        let params = params(0, 0);
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..100 {
            assert!(Spawner::new(0).try_spawn(&board, &params, &mut rng).is_none());
        }
        assert_eq!(board.traveller_count(), 0);
    }

    #[test]
    fn spawned_traveller_takes_slot_id() {
        let board = Board::new(3, 3);
        let params = params(100, 0);
        let mut rng = StdRng::seed_from_u64(3);
        let traveller = Spawner::new(7).try_spawn(&board, &params, &mut rng).unwrap();

        assert_eq!(traveller.id(), 7);
        let pos = board.position_of(traveller.key()).unwrap();
        assert_eq!(board.lock().occupant(pos), Some(7));
    }

    #[test]
    fn spawner_on_full_board_keeps_waiting_until_shutdown() {
        let board = Board::new(1, 1);
        board.lock().place(0, Position::new(0, 0)).unwrap();
        let params = params(100, 0);
        let mut rng = StdRng::seed_from_u64(4);

        let (trigger, signal) = shutdown::channel();
        trigger.fire();
        assert!(Spawner::new(1).wait_for_spawn(&board, &params, &mut rng, &signal).is_none());
        assert_eq!(board.traveller_count(), 1);
    }

    #[test]
    fn traveller_never_moves_with_zero_probability() {
        let board = Board::new(3, 3);
        let key = board.lock().place(0, Position::new(1, 1)).unwrap();
        let traveller = Traveller { key, id: 0 };
        let params = params(0, 0);
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..100 {
            assert_eq!(traveller.tick(&board, &params, &mut rng), None);
        }
        assert_eq!(board.position_of(key), Some(Position::new(1, 1)));
    }

    #[test]
    fn traveller_tick_moves_consistently_with_board() {
        let board = Board::new(3, 3);
        let key = board.lock().place(0, Position::new(1, 1)).unwrap();
        let traveller = Traveller { key, id: 0 };
        let params = params(0, 100);
        let mut rng = StdRng::seed_from_u64(6);

        let mut moved = 0;
        for _ in 0..200 {
            let before = board.position_of(key).unwrap();
            if let Some(direction) = traveller.tick(&board, &params, &mut rng) {
                moved += 1;
                let expected = before.step(direction, 3, 3).unwrap();
                assert_eq!(board.position_of(key), Some(expected));
            } else {
                assert_eq!(board.position_of(key), Some(before));
            }
            board.check_invariants().unwrap();
        }
        assert!(moved > 0);
    }

    #[test]
    fn activate_returns_on_shutdown() {
        let board = Board::new(2, 2);
        let key = board.lock().place(0, Position::new(0, 0)).unwrap();
        let params = params(0, 100);
        let mut rng = StdRng::seed_from_u64(8);
        let (trigger, signal) = shutdown::channel();
        drop(trigger);

        Traveller { key, id: 0 }.activate(&board, &params, &mut rng, &signal);
        board.check_invariants().unwrap();
    }
}
