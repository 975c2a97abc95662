// render.rs - Presentation loop: draws zones, cells and the pulsing goal

use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::level::Snapshot;
use crate::session::SharedLevel;
use crate::zones::Zone;

/// Colour with a CSS-style alpha in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn alpha_u8(&self) -> u8 {
        (self.a.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    /// `hue` in degrees, `saturation` and `lightness` in `[0, 1]`.
    pub fn from_hsla(hue: f32, saturation: f32, lightness: f32, a: f32) -> Self {
        let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
        let h = hue.rem_euclid(360.0) / 60.0;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = lightness - c / 2.0;
        let channel = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Self::new(channel(r), channel(g), channel(b), a)
    }
}

pub const PLAYABLE_COLOR: Rgba = Rgba::new(0, 255, 0, 0.2);
pub const DEADZONE_COLOR: Rgba = Rgba::new(255, 0, 0, 0.2);
pub const ALIVE_COLOR: Rgba = Rgba::new(175, 175, 175, 1.0);
pub const ABYSS_COLOR: Rgba = Rgba::new(0, 0, 0, 0.3);

/// The goal pulse restarts once its phase reaches this value.
pub const GOAL_PHASE_WRAP: u32 = 255;

/// Goal colour for a pulse phase. Hue follows a sine of the phase.
pub fn goal_color(phase: u32) -> Rgba {
    let hue = (((phase as f32 / 10.0).sin() + 1.0) / 2.0 * 255.0).floor();
    Rgba::from_hsla(hue, 0.5, 0.5, 0.75)
}

/// A drawing surface in pixel coordinates.
pub trait Canvas {
    fn clear(&mut self, width: f32, height: f32);
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    Clear { width: f32, height: f32 },
    Fill { x: f32, y: f32, width: f32, height: f32, color: Rgba },
}

/// Recorded frame, replayable onto any [`Canvas`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    pub commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn replay(&self, canvas: &mut impl Canvas) {
        for command in &self.commands {
            match *command {
                DrawCommand::Clear { width, height } => canvas.clear(width, height),
                DrawCommand::Fill { x, y, width, height, color } => {
                    canvas.fill_rect(x, y, width, height, color)
                }
            }
        }
    }

    /// Surface size from the frame's clear command.
    pub fn dimensions(&self) -> (f32, f32) {
        self.commands
            .iter()
            .find_map(|c| match *c {
                DrawCommand::Clear { width, height } => Some((width, height)),
                _ => None,
            })
            .unwrap_or((0.0, 0.0))
    }
}

impl Canvas for DisplayList {
    fn clear(&mut self, width: f32, height: f32) {
        self.commands.push(DrawCommand::Clear { width, height });
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba) {
        self.commands.push(DrawCommand::Fill { x, y, width, height, color });
    }
}

/// Draw pass state. Only the goal pulse survives between frames.
#[derive(Debug, Default)]
pub struct Presenter {
    goal_phase: u32,
}

impl Presenter {
    pub fn goal_phase(&self) -> u32 {
        self.goal_phase
    }

    pub fn draw(&mut self, snapshot: &Snapshot, canvas: &mut impl Canvas) {
        let size = snapshot.size as f32;
        let arena = &snapshot.arena;

        canvas.clear(arena.width() as f32 * size, arena.height() as f32 * size);

        let mut fill_zone = |zone: &Zone, color: Rgba| {
            canvas.fill_rect(
                zone.x as f32 * size,
                zone.y as f32 * size,
                zone.width as f32 * size,
                zone.height as f32 * size,
                color,
            )
        };
        snapshot.zones.playables().iter().for_each(|z| fill_zone(z, PLAYABLE_COLOR));
        snapshot.zones.deadzones().iter().for_each(|z| fill_zone(z, DEADZONE_COLOR));

        for (x, y) in arena.live_cells() {
            canvas.fill_rect(x as f32 * size, y as f32 * size, size, size, ALIVE_COLOR);
        }

        let goal = snapshot.goal;
        canvas.fill_rect(
            goal.x as f32 * size,
            goal.y as f32 * size,
            size,
            size,
            goal_color(self.goal_phase),
        );
        self.goal_phase += 1;
        if self.goal_phase >= GOAL_PHASE_WRAP {
            self.goal_phase = 0;
        }
    }
}

pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Frame-driven draw task, cancelled with the session that owns it.
pub struct RenderLoop {
    frames: watch::Receiver<Arc<DisplayList>>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl RenderLoop {
    pub fn spawn(runtime: &Handle, level: SharedLevel, interval: Duration, waker: Option<Waker>) -> Self {
        let (frame_tx, frames) = watch::channel(Arc::new(DisplayList::default()));
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = runtime.spawn(render(level, frame_tx, shutdown_rx, interval, waker));
        Self { frames, shutdown, task: Some(task) }
    }

    /// Most recently drawn frame.
    pub fn latest(&self) -> Arc<DisplayList> {
        self.frames.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<DisplayList>> {
        self.frames.clone()
    }

    pub fn cancel(&self) {
        let _ = self.shutdown.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancels and waits for the task to wind down.
    pub async fn join(&mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn render(
    level: SharedLevel,
    frames: watch::Sender<Arc<DisplayList>>,
    mut shutdown: watch::Receiver<bool>,
    interval: Duration,
    waker: Option<Waker>,
) {
    let mut presenter = Presenter::default();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                let snapshot = level.lock().snapshot();
                let mut frame = DisplayList::default();
                presenter.draw(&snapshot, &mut frame);
                frames.send_replace(Arc::new(frame));
                if let Some(wake) = &waker {
                    wake();
                }
            }
        }
    }
    debug!("Render loop stopped");
}
