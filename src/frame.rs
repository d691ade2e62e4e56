//! The update/render cycle. Everything platform specific sits behind
//! [`RenderSurface`] and [`EventSource`], so the loop itself only moves a
//! point around and asks for it to be drawn.

use crate::config::DemoConfig;
use crate::error::Result;
use crate::input::{FrameEvent, InputSnapshot};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Top-left corner of the sprite in screen units, y grows downward.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, (dx, dy): (i32, i32)) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// Destination rectangle for a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl SpriteRect {
    pub fn square(at: Position, side: u32) -> Self {
        Self {
            x: at.x,
            y: at.y,
            width: side,
            height: side,
        }
    }
}

/// Linear RGBA color, each component in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

impl From<[f64; 4]> for Rgba {
    fn from([r, g, b, a]: [f64; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

/// Something the loop can draw on. `Texture` is whatever handle the
/// backend hands out for a loaded image.
pub trait RenderSurface {
    type Texture;

    fn load_texture(&mut self, path: &Path) -> Result<Self::Texture>;
    fn clear(&mut self, color: Rgba);
    fn draw(&mut self, texture: &Self::Texture, rect: SpriteRect);
    fn present(&mut self);

    /// Called when the window reports a new size. Nothing to do by default.
    fn resize(&mut self, _width: u32, _height: u32) {}
}

/// Non-blocking source of frame events. Each call drains everything pending.
pub trait EventSource {
    fn poll(&mut self) -> Vec<FrameEvent>;
}

/// Owns the sprite state, the surface and the texture for as long as the
/// demo runs. Can only be built from a texture that loaded successfully.
pub struct FrameLoop<S: RenderSurface> {
    // Dropped in this order: the texture goes before its surface.
    texture: S::Texture,
    surface: S,
    position: Position,
    input: InputSnapshot,
    quit: bool,
    frames: u64,
    step: i32,
    sprite_size: u32,
    clear_color: Rgba,
    frame_delay: Duration,
}

impl<S: RenderSurface> FrameLoop<S> {
    /// Loads the configured texture and sets up the loop. On failure the
    /// surface is dropped without ever having been drawn to.
    pub fn start(mut surface: S, config: &DemoConfig) -> Result<Self> {
        let texture = surface.load_texture(&config.texture_path)?;
        log::info!("loaded texture {:?}", config.texture_path);
        Ok(Self::with_texture(surface, texture, config))
    }

    pub fn with_texture(surface: S, texture: S::Texture, config: &DemoConfig) -> Self {
        Self {
            texture,
            surface,
            position: config.start,
            input: InputSnapshot::default(),
            quit: false,
            frames: 0,
            step: config.step,
            sprite_size: config.sprite_size,
            clear_color: config.clear_color(),
            frame_delay: config.frame_delay(),
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Directions seen during the last frame.
    pub fn input(&self) -> InputSnapshot {
        self.input
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// One full frame: collect input, move, clear, draw, present.
    pub fn step<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = FrameEvent>,
    {
        self.input.next_frame();
        for event in events {
            match event {
                FrameEvent::Quit => self.quit = true,
                FrameEvent::KeyDown(key) => {
                    self.input.press(key);
                }
                FrameEvent::Resized(width, height) => self.surface.resize(width, height),
            }
        }

        if !self.input.is_idle() {
            self.position = self.position.offset(self.input.delta(self.step));
            log::trace!("moved to ({}, {})", self.position.x, self.position.y);
        }

        self.surface.clear(self.clear_color);
        self.surface.draw(
            &self.texture,
            SpriteRect::square(self.position, self.sprite_size),
        );
        self.surface.present();
        self.frames += 1;
    }

    /// Runs frames until a quit event shows up, sleeping the configured delay
    /// after each one. The frame that sees the quit still finishes. Returns
    /// the number of frames rendered by this call.
    pub fn run<E: EventSource>(&mut self, events: &mut E) -> u64 {
        let first = self.frames;
        while !self.quit {
            self.step(events.poll());
            if !self.frame_delay.is_zero() {
                std::thread::sleep(self.frame_delay);
            }
        }
        log::info!(
            "quit after {} frames at ({}, {})",
            self.frames - first,
            self.position.x,
            self.position.y
        );
        self.frames - first
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DemoError;
    use winit::event::VirtualKeyCode;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Clear(Rgba),
        Draw(u32, SpriteRect),
        Present,
        Resize(u32, u32),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl RenderSurface for Recorder {
        type Texture = u32;

        fn load_texture(&mut self, _path: &Path) -> Result<u32> {
            Ok(7)
        }
        fn clear(&mut self, color: Rgba) {
            self.calls.push(Call::Clear(color));
        }
        fn draw(&mut self, texture: &u32, rect: SpriteRect) {
            self.calls.push(Call::Draw(*texture, rect));
        }
        fn present(&mut self) {
            self.calls.push(Call::Present);
        }
        fn resize(&mut self, width: u32, height: u32) {
            self.calls.push(Call::Resize(width, height));
        }
    }

    fn frame_loop() -> FrameLoop<Recorder> {
        FrameLoop::start(Recorder::default(), &DemoConfig::default()).unwrap()
    }

    fn keys(list: &[VirtualKeyCode]) -> Vec<FrameEvent> {
        list.iter().copied().map(FrameEvent::KeyDown).collect()
    }

    #[test]
    fn starts_at_configured_position() {
        let frames = frame_loop();
        assert_eq!(frames.position(), Position::new(100, 100));
        assert_eq!(frames.frames(), 0);
        assert!(frames.surface().calls.is_empty());
    }

    #[test]
    fn idle_frames_do_not_move() {
        let mut frames = frame_loop();
        for _ in 0..10 {
            frames.step(Vec::new());
        }
        assert_eq!(frames.position(), Position::new(100, 100));
        assert_eq!(frames.frames(), 10);
    }

    #[test]
    fn up_moves_up_by_one_step() {
        let mut frames = frame_loop();
        frames.step(keys(&[VirtualKeyCode::W]));
        assert_eq!(frames.position(), Position::new(100, 95));
    }

    #[test]
    fn diagonal_in_a_single_frame() {
        let mut frames = frame_loop();
        frames.step(keys(&[VirtualKeyCode::W, VirtualKeyCode::A]));
        assert_eq!(frames.position(), Position::new(95, 95));
        frames.step(keys(&[VirtualKeyCode::S, VirtualKeyCode::D]));
        assert_eq!(frames.position(), Position::new(100, 100));
    }

    #[test]
    fn repeated_key_events_count_once_per_frame() {
        let mut frames = frame_loop();
        frames.step(keys(&[VirtualKeyCode::D, VirtualKeyCode::D, VirtualKeyCode::D]));
        assert_eq!(frames.position(), Position::new(105, 100));
    }

    #[test]
    fn input_does_not_carry_over() {
        let mut frames = frame_loop();
        frames.step(keys(&[VirtualKeyCode::D]));
        assert!(frames.input().right);
        frames.step(Vec::new());
        assert!(frames.input().is_idle());
        assert_eq!(frames.position(), Position::new(105, 100));
    }

    #[test]
    fn each_frame_clears_draws_and_presents() {
        let mut frames = frame_loop();
        frames.step(keys(&[VirtualKeyCode::S]));
        assert_eq!(
            frames.surface().calls,
            vec![
                Call::Clear(Rgba::WHITE),
                Call::Draw(
                    7,
                    SpriteRect {
                        x: 100,
                        y: 105,
                        width: 64,
                        height: 64
                    }
                ),
                Call::Present,
            ]
        );
    }

    #[test]
    fn quit_sticks_and_frame_completes() {
        let mut frames = frame_loop();
        frames.step([FrameEvent::Quit, FrameEvent::KeyDown(VirtualKeyCode::W)]);
        assert!(frames.quit_requested());
        assert_eq!(frames.position(), Position::new(100, 95));
        assert_eq!(frames.surface().calls.len(), 3);

        frames.step(Vec::new());
        assert!(frames.quit_requested());
    }

    #[test]
    fn resize_reaches_the_surface() {
        let mut frames = frame_loop();
        frames.step([FrameEvent::Resized(1280, 960)]);
        assert_eq!(frames.surface().calls[0], Call::Resize(1280, 960));
        assert_eq!(frames.position(), Position::new(100, 100));
    }

    struct Scripted(std::collections::VecDeque<Vec<FrameEvent>>);

    impl EventSource for Scripted {
        fn poll(&mut self) -> Vec<FrameEvent> {
            self.0.pop_front().unwrap_or_default()
        }
    }

    #[test]
    fn run_stops_after_the_quit_frame() {
        let config = DemoConfig {
            frame_delay_ms: 0,
            ..DemoConfig::default()
        };
        let mut frames = FrameLoop::start(Recorder::default(), &config).unwrap();
        let mut events = Scripted(
            vec![
                keys(&[VirtualKeyCode::D]),
                Vec::new(),
                vec![FrameEvent::Quit],
                keys(&[VirtualKeyCode::D]),
            ]
            .into(),
        );
        assert_eq!(frames.run(&mut events), 3);
        assert_eq!(frames.position(), Position::new(105, 100));
        assert_eq!(events.0.len(), 1);

        // Already quit, so nothing else runs.
        assert_eq!(frames.run(&mut events), 0);
    }

    struct Broken;

    impl RenderSurface for Broken {
        type Texture = ();

        fn load_texture(&mut self, path: &Path) -> Result<()> {
            Err(DemoError::EmptyTexture {
                path: path.to_path_buf(),
                width: 0,
                height: 0,
            })
        }
        fn clear(&mut self, _color: Rgba) {
            panic!("cleared without a texture");
        }
        fn draw(&mut self, _texture: &(), _rect: SpriteRect) {
            panic!("drew without a texture");
        }
        fn present(&mut self) {
            panic!("presented without a texture");
        }
    }

    #[test]
    fn failed_load_never_starts() {
        let err = FrameLoop::start(Broken, &DemoConfig::default()).err().unwrap();
        assert_eq!(err.kind(), crate::error::ErrorKind::Load);
    }
}
