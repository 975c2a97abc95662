// lib.rs - Life puzzle engine
//
// Seed cells inside the playable zones, run Conway's rule, and reach the
// goal cell. Deadzones kill anything that enters them.

pub mod campaign;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod grid;
pub mod level;
pub mod patterns;
pub mod progression;
pub mod render;
pub mod session;
pub mod zones;

pub use campaign::Campaign;
pub use config::Config;
pub use descriptor::{Goal, LevelDescriptor};
pub use error::{EditError, LevelError, Result};
pub use grid::{Arena, Coord};
pub use level::{Level, Snapshot, WinEvent};
pub use progression::{MemoryProgression, Outcome, Progression};
pub use render::{Canvas, DisplayList, Presenter, Rgba};
pub use session::{Session, SharedLevel};
pub use zones::{Zone, ZoneKind, Zones};
