// campaign.rs - Ordered list of levels

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::descriptor::LevelDescriptor;
use crate::error::{LevelError, Result};
use crate::level::Level;
use crate::progression::Progression;

const BUILTIN: &str = include_str!("../levels/campaign.json");

#[derive(Debug, Clone)]
pub struct Campaign {
    levels: Vec<LevelDescriptor>,
}

impl Campaign {
    /// Parses a JSON array of level descriptors and validates each one.
    ///
    /// Ids must run `1..=n` in file order, so the count doubles as the id of
    /// the final level.
    pub fn from_json(json: &str) -> Result<Self> {
        let levels: Vec<LevelDescriptor> = serde_json::from_str(json)?;

        let mut seen = HashSet::new();
        for (position, level) in (1..).zip(&levels) {
            if !seen.insert(level.id) {
                return Err(LevelError::DuplicateLevel(level.id));
            }
            if level.id != position {
                return Err(LevelError::LevelOutOfSequence { position, id: level.id });
            }
            level.validate()?;
        }

        Ok(Self { levels })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// The campaign shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN)
    }

    /// Number of levels. The last one unlocks nothing.
    pub fn len(&self) -> u32 {
        self.levels.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn levels(&self) -> &[LevelDescriptor] {
        &self.levels
    }

    pub fn get(&self, id: u32) -> Result<&LevelDescriptor> {
        self.levels
            .iter()
            .find(|l| l.id == id)
            .ok_or(LevelError::UnknownLevel(id))
    }

    /// Builds a fresh level instance wired to the player's progression.
    pub fn open(&self, id: u32, config: &Config, progression: Arc<dyn Progression>) -> Result<Level> {
        Level::new(self.get(id)?, config, progression, self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::{MemoryProgression, Outcome};
    use rstest::rstest;

    #[rstest]
    fn builtin_campaign_is_valid() {
        let campaign = Campaign::builtin().unwrap();
        assert_eq!(campaign.len(), 4);
        let ids: Vec<u32> = campaign.levels().iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[rstest]
    fn opens_levels_by_id() {
        let campaign = Campaign::builtin().unwrap();
        let level = campaign
            .open(3, &Config::default(), Arc::new(MemoryProgression::default()))
            .unwrap();
        assert_eq!(level.name(), "Spark");
        assert_eq!(level.arena().population(), 3);
    }

    #[rstest]
    fn unknown_level_is_an_error() {
        let campaign = Campaign::builtin().unwrap();
        assert!(matches!(campaign.get(99), Err(LevelError::UnknownLevel(99))));
    }

    #[rstest]
    fn duplicate_ids_are_rejected() {
        let json = r#"[
            {"id": 1, "width": 3, "height": 3, "goal": {"x": 0, "y": 0}},
            {"id": 1, "width": 4, "height": 4, "goal": {"x": 1, "y": 1}}
        ]"#;
        assert!(matches!(Campaign::from_json(json), Err(LevelError::DuplicateLevel(1))));
    }

    #[rstest]
    #[case("[2, 3, 4]", 1, 2)]
    #[case("[1, 3]", 2, 3)]
    #[case("[2, 1]", 1, 2)]
    fn ids_must_count_up_from_one(#[case] ids: &str, #[case] position: u32, #[case] id: u32) {
        let ids: Vec<u32> = serde_json::from_str(ids).unwrap();
        let levels: Vec<String> = ids
            .iter()
            .map(|id| format!(r#"{{"id": {id}, "width": 3, "height": 3, "goal": {{"x": 0, "y": 0}}}}"#))
            .collect();
        let json = format!("[{}]", levels.join(","));
        assert!(matches!(
            Campaign::from_json(&json),
            Err(LevelError::LevelOutOfSequence { position: p, id: i }) if p == position && i == id
        ));
    }

    #[rstest]
    fn beating_the_second_to_last_level_unlocks_the_last() {
        let json = r#"[
            {"id": 1, "width": 3, "height": 3, "goal": {"x": 0, "y": 0}},
            {"id": 2, "width": 3, "height": 3, "goal": {"x": 1, "y": 1}, "arena": [[1, 1]]},
            {"id": 3, "width": 3, "height": 3, "goal": {"x": 0, "y": 0}}
        ]"#;
        let campaign = Campaign::from_json(json).unwrap();
        let progression = Arc::new(MemoryProgression::new(2));
        let mut level = campaign.open(2, &Config::default(), progression.clone()).unwrap();
        assert_eq!(level.step().map(|event| event.outcome), Some(Outcome::Unlocked(3)));
        assert_eq!(progression.current(), 3);
    }

    #[rstest]
    fn invalid_level_fails_the_campaign() {
        let json = r#"[{"id": 7, "width": 3, "height": 3, "goal": {"x": 0, "y": 0}, "arena": [[3, 0]]}]"#;
        assert!(matches!(Campaign::from_json(json), Err(LevelError::SeedOutOfBounds { level: 7, .. })));
    }
}
