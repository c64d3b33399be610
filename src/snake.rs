use crate::Cell;
use crate::config::GameConfig;
use serde::{Deserialize, Serialize};
use Direction::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right
}

impl Direction {
    /// Unit step for this direction. Rows grow downwards, so `Up` is `y - 1`.
    pub fn delta(&self) -> Cell {
        match self {
            Up => (0, -1),
            Down => (0, 1),
            Left => (-1, 0),
            Right => (1, 0),
        }
    }

    pub fn is_opposite(&self, other: Direction) -> bool {
        matches!((self, other), (Up, Down) | (Down, Up) | (Right, Left) | (Left, Right))
    }
}

pub struct Snake {
    body: Vec<Cell>,
    direction: Direction,
    grow_next_move: bool,
    initial_body: Vec<Cell>,
    initial_direction: Direction,
}

impl Snake {
    /// Builds a snake from its starting body (head first). `reset` returns to exactly this state.
    pub fn new(body: Vec<Cell>, direction: Direction) -> Self {
        assert!(!body.is_empty(), "a snake needs at least one cell");

        Snake {
            initial_body: body.clone(),
            initial_direction: direction,
            body,
            direction,
            grow_next_move: false,
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Snake::new(config.initial_body(), config.initial_direction)
    }

    pub fn body(&self) -> &[Cell] {
        &self.body
    }

    pub fn head(&self) -> Cell {
        self.body[0]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Advances one cell. No bounds checking: the new head may land one cell off the grid.
    pub fn update(&mut self) {
        let (dx, dy) = self.direction.delta();
        let (x, y) = self.head();
        self.body.insert(0, (x + dx, y + dy));

        if self.grow_next_move {
            self.grow_next_move = false;
        } else {
            self.body.pop();
        }
    }

    pub fn reset(&mut self) {
        self.body = self.initial_body.clone();
        self.direction = self.initial_direction;
        self.grow_next_move = false;
    }

    pub fn grow(&mut self) {
        self.grow_next_move = true;
    }

    #[cfg(test)]
    pub fn is_growing(&self) -> bool {
        self.grow_next_move
    }

    pub fn get_direction(&self) -> Direction {
        self.direction
    }

    /// Unconditional; reversal is filtered by `Game::steer`.
    pub fn set_direction(&mut self, new_direction: Direction) {
        self.direction = new_direction;
    }

    /// True when the head shares a cell with any other segment.
    pub fn head_hits_tail(&self) -> bool {
        let head = self.head();
        self.body[1..].contains(&head)
    }

    #[cfg(test)]
    pub fn set_body(&mut self, body: Vec<Cell>) {
        self.body = body;
    }
}
