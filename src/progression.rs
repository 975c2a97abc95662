// progression.rs - The player's furthest unlocked level

use std::sync::atomic::{AtomicU32, Ordering};
use tracing::info;

/// What completing a level did to the unlock marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The marker moved on to this level.
    Unlocked(u32),
    /// The last level of the campaign was beaten. Nothing left to unlock.
    FinalLevel,
    /// The level was behind the marker already.
    AlreadyUnlocked,
}

/// Shared unlock counter, owned outside the engine.
pub trait Progression: Send + Sync {
    /// Furthest level the player may open.
    fn current(&self) -> u32;

    /// Records a completed level as one atomic read-modify-write.
    ///
    /// The marker only advances when `level` is the current furthest level
    /// and not the last of a campaign of `campaign_len` levels.
    fn complete(&self, level: u32, campaign_len: u32) -> Outcome;
}

/// In-memory counter. Persisting it belongs to the host.
#[derive(Debug)]
pub struct MemoryProgression {
    level: AtomicU32,
}

impl MemoryProgression {
    pub fn new(start: u32) -> Self {
        Self { level: AtomicU32::new(start) }
    }
}

impl Default for MemoryProgression {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Progression for MemoryProgression {
    fn current(&self) -> u32 {
        self.level.load(Ordering::Acquire)
    }

    fn complete(&self, level: u32, campaign_len: u32) -> Outcome {
        if level >= campaign_len {
            info!("Beat the final level");
            return Outcome::FinalLevel;
        }

        match self.level.compare_exchange(level, level + 1, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => {
                info!(next = level + 1, "Beat most recent level, unlocking next");
                Outcome::Unlocked(level + 1)
            }
            Err(_) => Outcome::AlreadyUnlocked,
        }
    }
}
