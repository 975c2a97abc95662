// error.rs - Error types for level construction and manual editing

use thiserror::Error;

/// Configuration errors. Fatal to session construction.
#[derive(Error, Debug)]
pub enum LevelError {
    #[error("level {level}: arena must be at least 1x1, got {width}x{height}")]
    EmptyArena { level: u32, width: usize, height: usize },

    #[error("level {level}: a {width}x{height} arena is too large to allocate")]
    ArenaTooLarge { level: u32, width: usize, height: usize },

    #[error("level {level}: goal ({x}, {y}) lies outside the {width}x{height} arena")]
    GoalOutOfBounds { level: u32, x: usize, y: usize, width: usize, height: usize },

    #[error("level {level}: seed cell ({x}, {y}) lies outside the {width}x{height} arena")]
    SeedOutOfBounds { level: u32, x: usize, y: usize, width: usize, height: usize },

    #[error("level {level}: {kind} zone at ({x}, {y}) size {w}x{h} extends past the arena")]
    ZoneOutOfBounds { level: u32, kind: &'static str, x: usize, y: usize, w: usize, h: usize },

    #[error("level {level}: unknown pattern '{name}' in library")]
    UnknownPattern { level: u32, name: String },

    #[error("campaign lists level {0} more than once")]
    DuplicateLevel(u32),

    #[error("campaign level at position {position} has id {id}, ids must run 1, 2, 3 and so on")]
    LevelOutOfSequence { position: u32, id: u32 },

    #[error("campaign has no level {0}")]
    UnknownLevel(u32),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejected manual edits. Recoverable; the arena is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("cell ({x}, {y}) is outside the arena")]
    OutOfBounds { x: usize, y: usize },

    #[error("cell ({x}, {y}) is not inside a playable zone")]
    NotPlayable { x: usize, y: usize },

    #[error("the arena cannot be edited while the simulation is running")]
    Running,

    #[error("pattern '{0}' is not available in this level")]
    PatternUnavailable(String),
}

pub type Result<T, E = LevelError> = std::result::Result<T, E>;

impl LevelError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
