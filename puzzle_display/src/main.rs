// main.rs - Life puzzle window: one campaign level in an egui canvas

use eframe::egui;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use life_puzzle::{Campaign, Config, Level, LevelError, MemoryProgression, Progression, Session};

mod ui;

#[derive(Error, Debug)]
enum AppError {
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error("window error: {0}")]
    Window(#[from] eframe::Error),
    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("level number must be a positive integer, got '{0}'")]
    LevelNumber(String),
}

fn main() -> Result<(), AppError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "life_puzzle=info,puzzle_display=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let campaign = match args.next() {
        Some(path) => Campaign::from_path(path)?,
        None => Campaign::builtin()?,
    };
    let start = match args.next() {
        Some(n) => n.parse::<u32>().map_err(|_| AppError::LevelNumber(n))?,
        None => 1,
    };
    let config = match std::env::var("LIFE_PUZZLE_CONFIG") {
        Ok(path) => Config::from_path(path)?,
        Err(_) => Config::default(),
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let progression = Arc::new(MemoryProgression::new(start));
    let level = campaign.open(start, &config, progression.clone())?;
    info!(level = start, levels = campaign.len(), "Starting");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([800.0, 700.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Life Puzzle",
        options,
        Box::new(move |cc| {
            Box::new(PuzzleApp::new(cc.egui_ctx.clone(), runtime, campaign, config, progression, level))
        }),
    )?;
    Ok(())
}

/// Counters fed by the level's notification handlers.
#[derive(Default)]
struct Counters {
    generation: AtomicU64,
    played: AtomicUsize,
}

struct PuzzleApp {
    ctx: egui::Context,
    campaign: Campaign,
    config: Config,
    progression: Arc<MemoryProgression>,
    session: Session,
    counters: Arc<Counters>,
    selected_pattern: Option<String>,
    status: String,
    // Last, so sessions are dropped before their runtime.
    runtime: tokio::runtime::Runtime,
}

impl PuzzleApp {
    fn new(
        ctx: egui::Context,
        runtime: tokio::runtime::Runtime,
        campaign: Campaign,
        config: Config,
        progression: Arc<MemoryProgression>,
        level: Level,
    ) -> Self {
        let counters = Arc::new(Counters::default());
        let session = mount(&ctx, &runtime, &config, &counters, level);
        let mut app = Self {
            ctx,
            campaign,
            config,
            progression,
            session,
            counters,
            selected_pattern: None,
            status: String::new(),
            runtime,
        };
        app.refresh_played();
        app
    }

    fn refresh_played(&self) {
        self.session.level().lock().count_played();
    }

    /// Whether the level after the current one may be opened.
    fn next_level(&self) -> Option<u32> {
        let next = self.session.level().lock().id() + 1;
        (next <= self.campaign.len() && next <= self.progression.current()).then_some(next)
    }

    fn open(&mut self, id: u32) {
        match self.campaign.open(id, &self.config, self.progression.clone()) {
            Ok(level) => {
                self.counters.generation.store(0, Ordering::Relaxed);
                self.session = mount(&self.ctx, &self.runtime, &self.config, &self.counters, level);
                self.selected_pattern = None;
                self.status.clear();
                self.refresh_played();
            }
            Err(err) => self.status = err.to_string(),
        }
    }
}

fn mount(
    ctx: &egui::Context,
    runtime: &tokio::runtime::Runtime,
    config: &Config,
    counters: &Arc<Counters>,
    mut level: Level,
) -> Session {
    let generation = Arc::clone(counters);
    let played = Arc::clone(counters);
    level
        .on_generation(move |n| generation.generation.store(n, Ordering::Relaxed))
        .on_play_count(move |n| played.played.store(n, Ordering::Relaxed))
        .on_win(|event| info!(level = event.level_id, generations = event.generations, outcome = ?event.outcome, "Level beaten"));

    let waker = ctx.clone();
    Session::with_waker(level, config, runtime.handle().clone(), move || waker.request_repaint())
}
