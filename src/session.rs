// session.rs - Drives a level: the simulation timer and the render loop

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::config::Config;
use crate::level::Level;
use crate::render::{DisplayList, RenderLoop, Waker};

/// Single writer (the simulation tick), snapshot readers (render, host).
pub type SharedLevel = Arc<Mutex<Level>>;

/// A running level instance. Dropping it stops both loops.
pub struct Session {
    level: SharedLevel,
    runtime: Handle,
    tick_interval: Duration,
    ticker: Option<JoinHandle<()>>,
    render: RenderLoop,
}

impl Session {
    pub fn new(level: Level, config: &Config, runtime: Handle) -> Self {
        Self::spawn(level, config, runtime, None)
    }

    /// Like [`Session::new`], calling `waker` after every drawn frame.
    pub fn with_waker(
        level: Level,
        config: &Config,
        runtime: Handle,
        waker: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self::spawn(level, config, runtime, Some(Arc::new(waker)))
    }

    fn spawn(level: Level, config: &Config, runtime: Handle, waker: Option<Waker>) -> Self {
        let level = Arc::new(Mutex::new(level));
        let render = RenderLoop::spawn(&runtime, Arc::clone(&level), config.frame_interval, waker);
        Self {
            level,
            runtime,
            tick_interval: config.tick_interval,
            ticker: None,
            render,
        }
    }

    pub fn level(&self) -> &SharedLevel {
        &self.level
    }

    pub fn is_playing(&self) -> bool {
        self.level.lock().is_playing()
    }

    /// Starts stepping. A second call restarts the timer, never doubles it.
    pub fn play(&mut self) {
        let run = self.level.lock().play();
        if let Some(previous) = self.ticker.take() {
            previous.abort();
        }
        self.ticker = Some(self.runtime.spawn(tick(Arc::clone(&self.level), run, self.tick_interval)));
    }

    /// No step runs after this returns.
    pub fn stop(&mut self) {
        self.level.lock().stop();
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    pub fn reset(&mut self) -> bool {
        self.stop();
        self.level.lock().reset()
    }

    pub fn frame(&self) -> Arc<DisplayList> {
        self.render.latest()
    }

    pub fn frames(&self) -> tokio::sync::watch::Receiver<Arc<DisplayList>> {
        self.render.subscribe()
    }

    pub fn render_finished(&self) -> bool {
        self.render.is_finished()
    }

    /// Stops the simulation and waits for the render loop to exit.
    pub async fn shutdown(&mut self) {
        self.stop();
        self.render.join().await;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
        self.render.cancel();
    }
}

async fn tick(level: SharedLevel, run: u64, period: Duration) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let mut guard = level.lock();
        // A stop or a newer run may land between the tick and the lock.
        if !guard.is_playing() || guard.run() != run {
            break;
        }
        guard.step();
    }
    debug!(run, "Simulation timer stopped");
}
