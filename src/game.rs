use crate::Cell;
use crate::config::GameConfig;
use crate::food::Food;
use crate::snake::{Direction, Snake};

use rand::Rng;
use rand::rngs::ThreadRng;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Collision {
    Edge,
    Tail,
}

/// What happened during one tick. The frame loop turns these into sounds.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickEvents {
    pub ate: bool,
    pub collision: Option<Collision>,
}

pub struct Game<R: Rng = ThreadRng> {
    cell_count: i32,
    snake: Snake,
    food: Food,
    running: bool,
    score: u32,
    rng: R,
}

impl Game<ThreadRng> {
    pub fn new(config: &GameConfig) -> Self {
        Game::with_rng(config, rand::thread_rng())
    }
}

impl<R: Rng> Game<R> {
    pub fn with_rng(config: &GameConfig, mut rng: R) -> Self {
        let snake = Snake::from_config(config);
        let food = Food::new(config.cell_count, snake.body(), &mut rng);

        Game { cell_count: config.cell_count, snake, food, running: true, score: 0, rng }
    }

    /// Runs one tick: move, then food, edge and tail checks in that order.
    /// Does nothing while the game is stopped.
    pub fn update(&mut self) -> TickEvents {
        let mut events = TickEvents::default();
        if !self.running {
            return events;
        }

        self.snake.update();
        events.ate = self.check_collision_with_food();

        if self.check_collision_with_edges() {
            self.game_over(Collision::Edge);
            events.collision = Some(Collision::Edge);
        } else if self.snake.head_hits_tail() {
            self.game_over(Collision::Tail);
            events.collision = Some(Collision::Tail);
        }

        events
    }

    /// Applies a direction request. Returns false, and changes nothing, when the
    /// request is the exact reverse of the current direction; otherwise the
    /// direction is taken immediately and a stopped game starts running again.
    pub fn steer(&mut self, direction: Direction) -> bool {
        if self.snake.get_direction().is_opposite(direction) {
            log::debug!("ignoring {:?}: snake is heading {:?}", direction, self.snake.get_direction());
            return false;
        }

        self.snake.set_direction(direction);
        self.running = true;
        true
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn food(&self) -> Cell {
        self.food.position()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    ///////////////////////////////////////////////////////////////////////////

    fn check_collision_with_food(&mut self) -> bool {
        if self.snake.head() != self.food.position() {
            return false;
        }

        self.food.place_randomly(self.snake.body(), &mut self.rng);
        self.snake.grow();
        self.score += 1;
        log::debug!("ate food, score {}", self.score);
        true
    }

    fn check_collision_with_edges(&self) -> bool {
        let (x, y) = self.snake.head();
        x == -1 || x == self.cell_count || y == -1 || y == self.cell_count
    }

    fn game_over(&mut self, cause: Collision) {
        log::info!("game over ({:?}) with score {}, length {}", cause, self.score, self.snake.len());

        self.snake.reset();
        self.score = 0;
        self.food.place_randomly(self.snake.body(), &mut self.rng);
        self.running = false;
    }

    #[cfg(test)]
    pub fn snake_mut(&mut self) -> &mut Snake {
        &mut self.snake
    }

    #[cfg(test)]
    pub fn set_food(&mut self, position: Cell) {
        self.food.set_position(position);
    }
}
