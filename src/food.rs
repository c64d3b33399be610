use crate::Cell;

use rand::Rng;
use rand::seq::SliceRandom;

/// Blind draws tried before falling back to picking among the free cells.
const MAX_RANDOM_ATTEMPTS: usize = 64;

pub struct Food {
    position: Cell,
    cell_count: i32,
}

impl Food {
    pub fn new<R: Rng + ?Sized>(cell_count: i32, occupied: &[Cell], rng: &mut R) -> Self {
        let mut food = Food { position: (0, 0), cell_count };
        food.place_randomly(occupied, rng);
        food
    }

    pub fn position(&self) -> Cell {
        self.position
    }

    /// Moves the food to a uniformly random cell not in `occupied`.
    ///
    /// Uses rejection sampling first, then samples the complement of `occupied`
    /// so a crowded grid still terminates. On a completely full grid the food
    /// stays where it is.
    pub fn place_randomly<R: Rng + ?Sized>(&mut self, occupied: &[Cell], rng: &mut R) {
        for _ in 0..MAX_RANDOM_ATTEMPTS {
            let cell = self.random_cell(rng);
            if !occupied.contains(&cell) {
                self.position = cell;
                return;
            }
        }

        log::debug!("food placement fell back to free-cell sampling ({} cells occupied)", occupied.len());

        let n = self.cell_count;
        let choices: Vec<Cell> = (0..n)
            .flat_map(|y| (0..n).map(move |x| (x, y)))
            .filter(|cell| !occupied.contains(cell))
            .collect();

        match choices.choose(rng) {
            Some(cell) => self.position = *cell,
            None => log::warn!("no free cell left for food, keeping it at {:?}", self.position),
        }
    }

    fn random_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Cell {
        (rng.gen_range(0..self.cell_count), rng.gen_range(0..self.cell_count))
    }

    #[cfg(test)]
    pub fn set_position(&mut self, position: Cell) {
        self.position = position;
    }
}
