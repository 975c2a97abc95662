// zones.rs - Region gate: deadzones, playable zones and the played-piece count

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::grid::{Arena, Coord};

/// Axis-aligned rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub x: usize,
    pub y: usize,
    #[serde(alias = "w")]
    pub width: usize,
    #[serde(alias = "h")]
    pub height: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneKind {
    /// Life is suppressed unconditionally.
    Deadzone,
    /// Player may edit, cells count toward the played-piece score.
    Playable,
}

/// When a coordinate sits in zones of several kinds, the first listed wins.
pub const ZONE_PRECEDENCE: [ZoneKind; 2] = [ZoneKind::Deadzone, ZoneKind::Playable];

impl ZoneKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ZoneKind::Deadzone => "deadzone",
            ZoneKind::Playable => "playable",
        }
    }
}

impl fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Zone {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x - self.x < self.width && y >= self.y && y - self.y < self.height
    }

    /// Whether the whole rectangle lies inside a `width` x `height` arena.
    /// Edges past `usize::MAX` never fit.
    pub fn fits(&self, width: usize, height: usize) -> bool {
        self.x.checked_add(self.width).is_some_and(|right| right <= width)
            && self.y.checked_add(self.height).is_some_and(|bottom| bottom <= height)
    }

    pub fn cells(&self) -> impl Iterator<Item = Coord> + use<> {
        let Zone { x, y, width, height } = *self;
        (y..y + height).flat_map(move |row| (x..x + width).map(move |col| (col, row)))
    }
}

/// The immutable zone layout of one level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Zones {
    deadzones: Vec<Zone>,
    playables: Vec<Zone>,
}

impl Zones {
    pub fn new(deadzones: Vec<Zone>, playables: Vec<Zone>) -> Self {
        Self { deadzones, playables }
    }

    pub fn deadzones(&self) -> &[Zone] {
        &self.deadzones
    }

    pub fn playables(&self) -> &[Zone] {
        &self.playables
    }

    fn of_kind(&self, kind: ZoneKind) -> &[Zone] {
        match kind {
            ZoneKind::Deadzone => &self.deadzones,
            ZoneKind::Playable => &self.playables,
        }
    }

    /// The kind governing a coordinate, resolved through [`ZONE_PRECEDENCE`].
    pub fn classify(&self, x: usize, y: usize) -> Option<ZoneKind> {
        ZONE_PRECEDENCE
            .into_iter()
            .find(|&kind| self.of_kind(kind).iter().any(|zone| zone.contains(x, y)))
    }

    pub fn is_dead(&self, x: usize, y: usize) -> bool {
        self.classify(x, y) == Some(ZoneKind::Deadzone)
    }

    pub fn is_playable(&self, x: usize, y: usize) -> bool {
        self.classify(x, y) == Some(ZoneKind::Playable)
    }

    /// Living cells inside playable rectangles.
    ///
    /// Each rectangle is counted on its own, so a living cell shared by two
    /// overlapping playables counts twice.
    pub fn count_played(&self, arena: &Arena) -> usize {
        self.playables
            .iter()
            .flat_map(Zone::cells)
            .filter(|&(x, y)| arena.is_alive(x, y))
            .count()
    }

    /// Kills every cell inside every playable rectangle.
    pub fn clear(&self, arena: &mut Arena) {
        if self.playables.is_empty() {
            warn!("There are no playable areas to clear");
            return;
        }

        for (x, y) in self.playables.iter().flat_map(Zone::cells) {
            arena.set(x, y, false);
        }
    }
}
