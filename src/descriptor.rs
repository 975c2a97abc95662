// descriptor.rs - The level record handed over by the content collaborator

use serde::{Deserialize, Serialize};

use crate::error::{LevelError, Result};
use crate::grid::{Arena, Coord};
use crate::patterns;
use crate::zones::{Zone, ZoneKind, Zones};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub x: usize,
    pub y: usize,
}

/// Level description as stored in campaign files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    pub id: u32,
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub deadzones: Vec<Zone>,
    #[serde(default)]
    pub playables: Vec<Zone>,
    pub goal: Goal,
    /// Pattern names the player may stamp into playable zones.
    #[serde(default)]
    pub library: Vec<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Initial seed as `[x, y]` pairs.
    #[serde(default)]
    pub arena: Vec<Coord>,
}

impl LevelDescriptor {
    pub fn from_json(json: &str) -> Result<Self> {
        let descriptor: Self = serde_json::from_str(json)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Rejects descriptors that would corrupt the arena.
    pub fn validate(&self) -> Result<()> {
        let (level, width, height) = (self.id, self.width, self.height);

        if width == 0 || height == 0 {
            return Err(LevelError::EmptyArena { level, width, height });
        }
        if width.checked_mul(height).is_none_or(|cells| cells > isize::MAX as usize) {
            return Err(LevelError::ArenaTooLarge { level, width, height });
        }

        let Goal { x, y } = self.goal;
        if x >= width || y >= height {
            return Err(LevelError::GoalOutOfBounds { level, x, y, width, height });
        }

        let zones = self
            .deadzones
            .iter()
            .map(|z| (ZoneKind::Deadzone, z))
            .chain(self.playables.iter().map(|z| (ZoneKind::Playable, z)));
        for (kind, zone) in zones {
            if !zone.fits(width, height) {
                return Err(LevelError::ZoneOutOfBounds {
                    level,
                    kind: kind.as_str(),
                    x: zone.x,
                    y: zone.y,
                    w: zone.width,
                    h: zone.height,
                });
            }
        }

        if let Some(name) = self.library.iter().find(|n| patterns::find(n).is_none()) {
            return Err(LevelError::UnknownPattern { level, name: name.clone() });
        }

        self.seed_arena().map(|_| ())
    }

    /// Arena populated with the initial seed.
    pub fn seed_arena(&self) -> Result<Arena> {
        Arena::from_seed(self.width, self.height, &self.arena).map_err(|(x, y)| {
            LevelError::SeedOutOfBounds { level: self.id, x, y, width: self.width, height: self.height }
        })
    }

    pub fn zones(&self) -> Zones {
        Zones::new(self.deadzones.clone(), self.playables.clone())
    }
}
