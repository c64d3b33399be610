use std::time::Duration;

use anyhow::Result;

use crate::Cell;
use crate::config::Rgb;
use crate::input::KeyAction;

/// Everything the frame loop needs from the outside world: drawing, sound,
/// input and a clock.
///
/// Textures and sounds are owned handles. Whoever holds one keeps the resource
/// alive, and dropping it releases it; there is no explicit unload call.
pub trait Frontend {
    type Texture;
    type Sound;

    fn load_texture(&mut self, source: &str, tint: Rgb) -> Result<Self::Texture>;
    fn load_sound(&mut self, source: &str) -> Result<Self::Sound>;

    /// Monotonic seconds since the frontend was created.
    fn current_time(&self) -> f64;
    /// Non-blocking; everything pressed since the previous call.
    fn poll_input(&mut self) -> Result<Vec<KeyAction>>;

    fn begin_frame(&mut self);
    fn draw_cell(&mut self, cell: Cell, color: Rgb);
    fn draw_textured_cell(&mut self, cell: Cell, texture: &Self::Texture);
    fn draw_score(&mut self, score: u32);
    fn end_frame(&mut self) -> Result<()>;

    fn play_sound(&mut self, sound: &Self::Sound);

    fn sleep(&mut self, duration: Duration);
}
