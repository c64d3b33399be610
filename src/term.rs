use crate::Cell;
use crate::config::{GameConfig, Rgb};
use crate::frontend::Frontend;
use crate::input::{self, KeyAction};
use std::{io::{self, Stdout, Write, stdout}, thread, time::{Duration, Instant}};

use anyhow::{Context, Result, bail};
use crossterm::{cursor, execute, queue, style, terminal};
use crossterm::style::Color;
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::event::{Event, read, poll};

const TITLE: &str = "Retro Snake";
const SNAKE_CHAR: char = '█';
const BELL: char = '\x07';

/// Owns the terminal for as long as it lives: raw mode and the alternate
/// screen are entered in `new` and left again on drop.
pub struct TermManager {
    width: u16,
    height: u16,
    layout: Layout,
    background: Color,
    foreground: Color,
    stdout: Stdout,
    screen: Vec<Glyph>,
    shown: Vec<Glyph>,
    started: Instant,
}

pub struct TermTexture {
    glyphs: Vec<char>,
    tint: Color,
}

pub struct TermSound {
    ring: bool,
}

#[derive(Copy, Clone, PartialEq)]
struct Glyph {
    ch: char,
    fg: Color,
    bg: Color,
}

/// Where the grid sits on screen, in terminal columns and rows.
#[derive(Copy, Clone, Debug, PartialEq)]
struct Layout {
    left: u16,
    top: u16,
    cell_size: u16,
    cell_count: u16,
}

impl Layout {
    fn new(config: &GameConfig) -> Self {
        Layout {
            left: config.offset,
            top: config.offset,
            cell_size: config.cell_size,
            // `GameConfig::validate` keeps the whole layout within u16.
            cell_count: config.cell_count as u16,
        }
    }

    fn right(&self) -> u16 {
        self.left + self.cell_count * self.cell_size
    }

    fn bottom(&self) -> u16 {
        self.top + self.cell_count
    }

    /// Smallest terminal that fits title, border, grid and score line.
    fn required_size(&self) -> (u16, u16) {
        let width = (self.right() + self.left).max(self.left - 1 + TITLE.len() as u16);
        (width, self.bottom() + 2)
    }

    /// Screen position of a grid cell, or None when it lies off the grid.
    fn cell_origin(&self, (x, y): Cell) -> Option<(u16, u16)> {
        let n = self.cell_count as i32;
        if !(0..n).contains(&x) || !(0..n).contains(&y) {
            return None;
        }
        Some((self.left + x as u16 * self.cell_size, self.top + y as u16))
    }
}

impl TermManager {
    pub fn new(config: &GameConfig) -> Result<Self> {
        config.validate()?;
        let layout = Layout::new(config);
        let (width, height) = terminal::size().context("Error reading terminal size")?;
        let (need_w, need_h) = layout.required_size();

        if width < need_w || height < need_h {
            bail!("terminal is {}x{}, but a {n}x{n} grid needs at least {}x{}",
                width, height, need_w, need_h, n = config.cell_count);
        }

        let background = to_color(config.background);
        let blank = Glyph { ch: ' ', fg: background, bg: background };
        let cells = width as usize * height as usize;

        let mut term = TermManager {
            width,
            height,
            layout,
            background,
            foreground: to_color(config.foreground),
            stdout: stdout(),
            screen: vec![blank; cells],
            // Nothing on screen matches this, so the first frame is drawn in full.
            shown: vec![Glyph { ch: '\0', ..blank }; cells],
            started: Instant::now(),
        };
        term.setup()?;

        log::debug!("terminal {}x{}, layout {:?}", width, height, layout);
        Ok(term)
    }

    ///////////////////////////////////////////////////////////////////////////

    fn setup(&mut self) -> Result<()> {
        execute!(self.stdout, EnterAlternateScreen).context("Error entering alt screen")?;
        terminal::enable_raw_mode().context("Error setting raw mode")?;
        execute!(self.stdout, cursor::Hide, cursor::DisableBlinking, terminal::Clear(ClearType::All))
            .context("Error preparing screen")?;
        Ok(())
    }

    /// Undoes `setup`. Every step runs even when an earlier one fails.
    fn restore(&mut self) {
        let steps = [
            ("disable raw mode", terminal::disable_raw_mode()),
            ("restore cursor and colors", execute!(self.stdout, style::ResetColor, cursor::Show, cursor::EnableBlinking)),
            ("leave alt screen", execute!(self.stdout, LeaveAlternateScreen)),
        ];
        log_failures(&steps);
    }

    fn print_at(&mut self, pos: (u16, u16), ch: char, fg: Color) {
        if pos.0 < self.width && pos.1 < self.height {
            let bg = self.background;
            self.screen[self.width as usize * pos.1 as usize + pos.0 as usize] = Glyph { ch, fg, bg };
        }
    }

    fn print_str_at(&mut self, pos: (u16, u16), text: &str, fg: Color) {
        for (i, ch) in text.chars().enumerate() {
            self.print_at((pos.0 + i as u16, pos.1), ch, fg);
        }
    }

    fn draw_borders(&mut self) {
        let fg = self.foreground;
        let (start_x, start_y) = (self.layout.left - 1, self.layout.top - 1);
        let (end_x, end_y) = (self.layout.right(), self.layout.bottom());

        for x in start_x..=end_x {
            let ch = if x == start_x || x == end_x {'+'} else {'-'};
            self.print_at((x, start_y), ch, fg);
            self.print_at((x, end_y), ch, fg);
        }

        for y in start_y + 1..end_y {
            self.print_at((start_x, y), '|', fg);
            self.print_at((end_x, y), '|', fg);
        }
    }

    fn fill_cell(&mut self, cell: Cell, glyphs: &[char], fg: Color) {
        if let Some((col, row)) = self.layout.cell_origin(cell) {
            for (i, ch) in glyphs.iter().take(self.layout.cell_size as usize).enumerate() {
                self.print_at((col + i as u16, row), *ch, fg);
            }
        }
    }
}

impl Frontend for TermManager {
    type Texture = TermTexture;
    type Sound = TermSound;

    fn load_texture(&mut self, source: &str, tint: Rgb) -> Result<TermTexture> {
        let glyphs: Vec<char> = source.chars().collect();
        if glyphs.len() != self.layout.cell_size as usize {
            bail!("texture {:?} must be exactly {} characters wide", source, self.layout.cell_size);
        }
        Ok(TermTexture { glyphs, tint: to_color(tint) })
    }

    fn load_sound(&mut self, source: &str) -> Result<TermSound> {
        match source {
            "bell" => Ok(TermSound { ring: true }),
            "" | "none" => Ok(TermSound { ring: false }),
            other => bail!("unsupported sound {:?}: the terminal can only play \"bell\" or \"none\"", other),
        }
    }

    fn current_time(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn poll_input(&mut self) -> Result<Vec<KeyAction>> {
        let mut actions = vec![];

        while poll(Duration::ZERO)? {
            if let Event::Key(ev) = read()? {
                match input::map_key(&ev) {
                    KeyAction::None => {},
                    action => actions.push(action),
                }
            }
        }

        Ok(actions)
    }

    fn begin_frame(&mut self) {
        let bg = self.background;
        self.screen.fill(Glyph { ch: ' ', fg: bg, bg });
        self.print_str_at((self.layout.left - 1, 0), TITLE, self.foreground);
        self.draw_borders();
    }

    fn draw_cell(&mut self, cell: Cell, color: Rgb) {
        let glyphs = vec![SNAKE_CHAR; self.layout.cell_size as usize];
        self.fill_cell(cell, &glyphs, to_color(color));
    }

    fn draw_textured_cell(&mut self, cell: Cell, texture: &TermTexture) {
        self.fill_cell(cell, &texture.glyphs, texture.tint);
    }

    fn draw_score(&mut self, score: u32) {
        let pos = (self.layout.left - 1, self.layout.bottom() + 1);
        self.print_str_at(pos, &format!("Score: {}", score), self.foreground);
    }

    fn end_frame(&mut self) -> Result<()> {
        for (i, glyph) in self.screen.iter().enumerate() {
            if self.shown[i] == *glyph {
                continue;
            }

            let (x, y) = ((i % self.width as usize) as u16, (i / self.width as usize) as u16);
            queue!(
                self.stdout,
                cursor::MoveTo(x, y),
                style::SetColors(style::Colors::new(glyph.fg, glyph.bg)),
                style::Print(glyph.ch)
            )?;
        }

        self.shown.copy_from_slice(&self.screen);
        self.stdout.flush().context("Error flushing")?;
        Ok(())
    }

    fn play_sound(&mut self, sound: &TermSound) {
        if sound.ring {
            // Flushed with the next frame.
            if let Err(err) = queue!(self.stdout, style::Print(BELL)) {
                log::warn!("failed to ring bell: {}", err);
            }
        }
    }

    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

impl Drop for TermManager {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Logs every failed step. Returns how many failed.
fn log_failures(steps: &[(&str, io::Result<()>)]) -> usize {
    let mut failed = 0;
    for (name, result) in steps {
        if let Err(err) = result {
            log::error!("failed to {}: {}", name, err);
            failed += 1;
        }
    }
    failed
}

fn to_color(Rgb(r, g, b): Rgb) -> Color {
    Color::Rgb { r, g, b }
}
