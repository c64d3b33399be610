use std::time::Duration;

use anyhow::{Context, Result};
use rand::Rng;
use rand::rngs::ThreadRng;

use crate::config::{GameConfig, Rgb};
use crate::frontend::Frontend;
use crate::game::{Game, TickEvents};
use crate::input::KeyAction;
use crate::snake::Direction;

const STEER_PRIORITY: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

/// Fixed-interval gate deciding when the simulation advances.
pub struct Ticker {
    interval: f64,
    last_update: f64,
}

impl Ticker {
    pub fn new(interval: f64) -> Self {
        Ticker { interval, last_update: 0.0 }
    }

    /// True at most once per interval; the clock restarts from `now` when it fires.
    pub fn ready(&mut self, now: f64) -> bool {
        if now - self.last_update >= self.interval {
            self.last_update = now;
            return true;
        }
        false
    }
}

pub struct App<F: Frontend, R: Rng = ThreadRng> {
    game: Game<R>,
    ticker: Ticker,
    frame_duration: Duration,
    snake_color: Rgb,
    food_texture: F::Texture,
    eat_sound: F::Sound,
    wall_sound: F::Sound,
    frontend: F,
}

impl<F: Frontend> App<F> {
    pub fn new(frontend: F, config: &GameConfig) -> Result<Self> {
        App::with_game(frontend, config, Game::new(config))
    }
}

impl<F: Frontend, R: Rng> App<F, R> {
    pub fn with_game(mut frontend: F, config: &GameConfig, game: Game<R>) -> Result<Self> {
        let food_texture = frontend.load_texture(&config.food_texture, config.food_tint)
            .with_context(|| format!("Failed to load food texture {:?}", config.food_texture))?;
        let eat_sound = frontend.load_sound(&config.eat_sound)
            .with_context(|| format!("Failed to load eat sound {:?}", config.eat_sound))?;
        let wall_sound = frontend.load_sound(&config.wall_sound)
            .with_context(|| format!("Failed to load wall sound {:?}", config.wall_sound))?;

        Ok(App {
            game,
            ticker: Ticker::new(config.tick_interval()),
            frame_duration: config.frame_duration(),
            snake_color: config.foreground,
            food_texture,
            eat_sound,
            wall_sound,
            frontend,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        log::info!("starting game loop");
        while self.frame()? {}
        log::info!("quit requested");
        Ok(())
    }

    /// One rendered frame. Returns false once the player asked to quit.
    pub fn frame(&mut self) -> Result<bool> {
        let frame_start = self.frontend.current_time();

        if self.ticker.ready(frame_start) {
            let events = self.game.update();
            self.play_sounds(events);
        }

        let mut requested = vec![];
        for action in self.frontend.poll_input()? {
            match action {
                KeyAction::Steer(direction) => requested.push(direction),
                KeyAction::Quit => return Ok(false),
                KeyAction::None => {},
            }
        }
        self.apply_steering(&requested);

        self.draw()?;

        let elapsed = Duration::from_secs_f64((self.frontend.current_time() - frame_start).max(0.0));
        if let Some(remaining) = self.frame_duration.checked_sub(elapsed) {
            self.frontend.sleep(remaining);
        }

        Ok(true)
    }

    ///////////////////////////////////////////////////////////////////////////

    /// At most one direction change per frame: the first of Up, Down, Left,
    /// Right that was pressed and is not a reversal.
    fn apply_steering(&mut self, requested: &[Direction]) {
        let was_running = self.game.is_running();

        for direction in STEER_PRIORITY {
            if requested.contains(&direction) && self.game.steer(direction) {
                if !was_running {
                    log::info!("new round heading {:?}", direction);
                }
                return;
            }
        }
    }

    fn play_sounds(&mut self, events: TickEvents) {
        if events.ate {
            self.frontend.play_sound(&self.eat_sound);
        }
        if events.collision.is_some() {
            self.frontend.play_sound(&self.wall_sound);
        }
    }

    fn draw(&mut self) -> Result<()> {
        self.frontend.begin_frame();
        self.frontend.draw_textured_cell(self.game.food(), &self.food_texture);
        for cell in self.game.snake().body() {
            self.frontend.draw_cell(*cell, self.snake_color);
        }
        self.frontend.draw_score(self.game.score());
        self.frontend.end_frame()
    }

    #[cfg(test)]
    fn game(&self) -> &Game<R> {
        &self.game
    }

    #[cfg(test)]
    fn game_mut(&mut self) -> &mut Game<R> {
        &mut self.game
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cell;
    use crate::snake::Direction::*;
    use anyhow::bail;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::VecDeque;

    /// In-memory frontend with a virtual clock that only advances when slept.
    #[derive(Default)]
    struct FakeFrontend {
        now: f64,
        pending_keys: VecDeque<(f64, KeyAction)>,
        played: Vec<String>,
        frames: usize,
        cells: Vec<Cell>,
        textured: Vec<(Cell, String)>,
        score: Option<u32>,
    }

    impl Frontend for FakeFrontend {
        type Texture = String;
        type Sound = String;

        fn load_texture(&mut self, source: &str, _tint: Rgb) -> Result<String> {
            Ok(source.to_string())
        }

        fn load_sound(&mut self, source: &str) -> Result<String> {
            if source == "missing" {
                bail!("no such sound");
            }
            Ok(source.to_string())
        }

        fn current_time(&self) -> f64 {
            self.now
        }

        fn poll_input(&mut self) -> Result<Vec<KeyAction>> {
            let mut keys = vec![];
            while let Some((at, _)) = self.pending_keys.front() {
                if *at > self.now {
                    break;
                }
                keys.extend(self.pending_keys.pop_front().map(|(_, key)| key));
            }
            Ok(keys)
        }

        fn begin_frame(&mut self) {
            self.cells.clear();
            self.textured.clear();
            self.score = None;
        }

        fn draw_cell(&mut self, cell: Cell, _color: Rgb) {
            self.cells.push(cell);
        }

        fn draw_textured_cell(&mut self, cell: Cell, texture: &String) {
            self.textured.push((cell, texture.clone()));
        }

        fn draw_score(&mut self, score: u32) {
            self.score = Some(score);
        }

        fn end_frame(&mut self) -> Result<()> {
            self.frames += 1;
            Ok(())
        }

        fn play_sound(&mut self, sound: &String) {
            self.played.push(sound.clone());
        }

        fn sleep(&mut self, duration: Duration) {
            self.now += duration.as_secs_f64();
        }
    }

    fn config() -> GameConfig {
        GameConfig { eat_sound: "eat".to_string(), wall_sound: "wall".to_string(), ..Default::default() }
    }

    fn new_app(frontend: FakeFrontend) -> App<FakeFrontend, StdRng> {
        let config = config();
        let game = Game::with_rng(&config, StdRng::seed_from_u64(11));
        let mut app = App::with_game(frontend, &config, game).unwrap();
        app.game_mut().set_food((0, 24));
        app
    }

    fn run_frames(app: &mut App<FakeFrontend, StdRng>, n: usize) {
        for _ in 0..n {
            assert!(app.frame().unwrap());
        }
    }

    #[test]
    fn test_ticker_gates_updates() {
        let mut ticker = Ticker::new(0.15);
        assert!(!ticker.ready(0.1));
        assert!(ticker.ready(0.15));
        assert!(!ticker.ready(0.2));
        assert!(!ticker.ready(0.29));
        assert!(ticker.ready(0.31));
        assert!(ticker.ready(1.0));
    }

    #[test]
    fn test_frames_are_paced() {
        let mut app = new_app(FakeFrontend::default());
        run_frames(&mut app, 60);

        assert_eq!(app.frontend.frames, 60);
        assert!((app.frontend.now - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_snake_moves_only_on_ticks() {
        let mut app = new_app(FakeFrontend::default());

        run_frames(&mut app, 5);
        assert_eq!(app.game().snake().head(), (6, 9));

        // One second of frames fits five or six 150ms ticks, depending on
        // where the frame boundaries fall.
        run_frames(&mut app, 55);
        let (x, y) = app.game().snake().head();
        assert!((11..=12).contains(&x), "head at {}", x);
        assert_eq!(y, 9);
    }

    #[test]
    fn test_draws_snake_food_and_score() {
        let mut app = new_app(FakeFrontend::default());
        run_frames(&mut app, 1);

        assert_eq!(app.frontend.cells, vec![(6, 9), (5, 9), (4, 9)]);
        assert_eq!(app.frontend.textured, vec![((0, 24), "()".to_string())]);
        assert_eq!(app.frontend.score, Some(0));
    }

    #[test]
    fn test_eating_plays_eat_sound() {
        let mut app = new_app(FakeFrontend::default());
        app.game_mut().set_food((7, 9));

        run_frames(&mut app, 12);

        assert_eq!(app.game().score(), 1);
        assert_eq!(app.frontend.played, vec!["eat".to_string()]);
        assert_eq!(app.frontend.score, Some(1));
    }

    #[test]
    fn test_wall_hit_plays_wall_sound_and_stops() {
        let mut app = new_app(FakeFrontend::default());
        app.game_mut().snake_mut().set_body(vec![(24, 9), (23, 9), (22, 9)]);

        run_frames(&mut app, 12);

        assert!(!app.game().is_running());
        assert_eq!(app.frontend.played, vec!["wall".to_string()]);
        assert_eq!(app.game().snake().head(), (6, 9));

        // Stays put until the player steers.
        run_frames(&mut app, 30);
        assert_eq!(app.game().snake().head(), (6, 9));
    }

    #[test]
    fn test_input_steers_and_rearms() {
        let mut frontend = FakeFrontend::default();
        frontend.pending_keys.push_back((0.0, KeyAction::Steer(Down)));
        let mut app = new_app(frontend);

        run_frames(&mut app, 12);

        assert_eq!(app.game().snake().get_direction(), Down);
        assert_eq!(app.game().snake().head(), (6, 10));
    }

    #[test]
    fn test_reversal_input_is_ignored() {
        let mut frontend = FakeFrontend::default();
        frontend.pending_keys.push_back((0.0, KeyAction::Steer(Left)));
        let mut app = new_app(frontend);

        run_frames(&mut app, 12);

        assert_eq!(app.game().snake().get_direction(), Right);
        assert_eq!(app.game().snake().head(), (7, 9));
    }

    #[test]
    fn test_one_turn_per_frame() {
        let mut frontend = FakeFrontend::default();
        frontend.pending_keys.push_back((0.0, KeyAction::Steer(Left)));
        frontend.pending_keys.push_back((0.0, KeyAction::Steer(Up)));
        let mut app = new_app(frontend);

        // Up wins over Left; Left would then no longer be a reversal, but a
        // second turn in the same frame is not taken.
        run_frames(&mut app, 1);
        assert_eq!(app.game().snake().get_direction(), Up);

        run_frames(&mut app, 11);
        assert_eq!(app.game().snake().head(), (6, 8));
        assert!(app.game().is_running());
    }

    #[test]
    fn test_reversal_skipped_for_next_priority() {
        let mut frontend = FakeFrontend::default();
        frontend.pending_keys.push_back((0.0, KeyAction::Steer(Up)));
        frontend.pending_keys.push_back((0.01, KeyAction::Steer(Down)));
        frontend.pending_keys.push_back((0.01, KeyAction::Steer(Right)));
        let mut app = new_app(frontend);

        run_frames(&mut app, 2);

        assert_eq!(app.game().snake().get_direction(), Right);
    }

    #[test]
    fn test_turns_in_separate_frames_both_apply() {
        let mut frontend = FakeFrontend::default();
        frontend.pending_keys.push_back((0.0, KeyAction::Steer(Up)));
        frontend.pending_keys.push_back((0.02, KeyAction::Steer(Left)));
        let mut app = new_app(frontend);

        run_frames(&mut app, 3);

        assert_eq!(app.game().snake().get_direction(), Left);
    }

    #[test]
    fn test_quit_stops_loop() {
        let mut frontend = FakeFrontend::default();
        frontend.pending_keys.push_back((0.05, KeyAction::Quit));
        let mut app = new_app(frontend);

        app.run().unwrap();

        assert!(app.frontend.now >= 0.05);
        assert!(app.frontend.now < 0.1);
    }

    #[test]
    fn test_missing_asset_fails_construction() {
        let config = GameConfig { wall_sound: "missing".to_string(), ..config() };
        let game = Game::with_rng(&config, StdRng::seed_from_u64(11));

        assert!(App::with_game(FakeFrontend::default(), &config, game).is_err());
    }
}
