// level.rs - Transition engine and the per-level session state

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::descriptor::{Goal, LevelDescriptor};
use crate::error::{EditError, Result};
use crate::grid::{Arena, Coord};
use crate::patterns;
use crate::progression::{Outcome, Progression};
use crate::zones::{ZoneKind, Zones};

/// Which arena the goal cell is read from during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalTiming {
    /// The generation that was on screen when the step began.
    PreStep,
    /// The freshly computed generation.
    PostStep,
}

pub const GOAL_TIMING: GoalTiming = GoalTiming::PreStep;

pub type GenerationHandler = Box<dyn FnMut(u64) + Send>;
pub type PlayCountHandler = Box<dyn FnMut(usize) + Send>;
pub type WinHandler = Box<dyn FnMut(&WinEvent) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WinEvent {
    pub level_id: u32,
    pub generations: u64,
    pub outcome: Outcome,
}

/// Conway's rule for a cell outside any deadzone.
pub fn next_state(alive: bool, neighbours: u8) -> bool {
    match (alive, neighbours) {
        (true, 2) | (true, 3) => true,   // Survival
        (false, 3)            => true,   // Birth
        _                     => false,  // Death or stays dead
    }
}

/// Computes the generation after `arena`. Deadzones force cells dead.
pub fn evolve(arena: &Arena, zones: &Zones) -> Arena {
    let mut next = Arena::new(arena.width(), arena.height());
    for (x, y) in arena.coords() {
        let neighbours = arena.live_neighbours(x, y);
        let alive = !zones.is_dead(x, y) && next_state(arena.is_alive(x, y), neighbours);
        next.set(x, y, alive);
    }
    next
}

/// Everything the presentation loop needs for one frame.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub arena: Arc<Arena>,
    pub zones: Arc<Zones>,
    pub goal: Goal,
    pub size: u32,
}

/// One playable level: its arena, zones, goal and session state.
///
/// Handlers run synchronously inside the engine's operations and must not
/// call back into the level.
pub struct Level {
    id: u32,
    name: String,
    description: String,
    library: Vec<String>,
    campaign_len: u32,

    zones: Arc<Zones>,
    goal: Goal,
    arena: Arc<Arena>,
    initial_arena: Option<Arc<Arena>>,

    generation: u64,
    generations_until_beaten: u64,
    playing: bool,
    run: u64,

    size: u32,
    min_size: u32,
    max_size: u32,

    progression: Arc<dyn Progression>,
    generation_handler: Option<GenerationHandler>,
    play_count_handler: Option<PlayCountHandler>,
    win_handler: Option<WinHandler>,
}

impl Level {
    pub fn new(
        descriptor: &LevelDescriptor,
        config: &Config,
        progression: Arc<dyn Progression>,
        campaign_len: u32,
    ) -> Result<Self> {
        config.validate()?;
        descriptor.validate()?;

        Ok(Self {
            id: descriptor.id,
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            library: descriptor.library.clone(),
            campaign_len,
            zones: Arc::new(descriptor.zones()),
            goal: descriptor.goal,
            arena: Arc::new(descriptor.seed_arena()?),
            initial_arena: None,
            generation: 0,
            generations_until_beaten: 0,
            playing: false,
            run: 0,
            size: config.default_size,
            min_size: config.min_size,
            max_size: config.max_size,
            progression,
            generation_handler: None,
            play_count_handler: None,
            win_handler: None,
        })
    }

    pub fn on_generation(&mut self, handler: impl FnMut(u64) + Send + 'static) -> &mut Self {
        self.generation_handler = Some(Box::new(handler));
        self
    }

    pub fn on_play_count(&mut self, handler: impl FnMut(usize) + Send + 'static) -> &mut Self {
        self.play_count_handler = Some(Box::new(handler));
        self
    }

    pub fn on_win(&mut self, handler: impl FnMut(&WinEvent) + Send + 'static) -> &mut Self {
        self.win_handler = Some(Box::new(handler));
        self
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn library(&self) -> &[String] {
        &self.library
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn initial_arena(&self) -> Option<&Arena> {
        self.initial_arena.as_deref()
    }

    pub fn zones(&self) -> &Zones {
        &self.zones
    }

    pub fn goal(&self) -> Goal {
        self.goal
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Winning generation, 0 while unsolved.
    pub fn generations_until_beaten(&self) -> u64 {
        self.generations_until_beaten
    }

    pub fn is_beaten(&self) -> bool {
        self.generations_until_beaten != 0
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Epoch of the current run, bumped by every `play`.
    pub fn run(&self) -> u64 {
        self.run
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            arena: Arc::clone(&self.arena),
            zones: Arc::clone(&self.zones),
            goal: self.goal,
            size: self.size,
        }
    }

    /// Starts a run and captures the arena it starts from.
    ///
    /// Calling it again while running starts a fresh run. The returned epoch
    /// lets the driver tell its own ticks from a superseded run's.
    pub fn play(&mut self) -> u64 {
        if self.playing {
            debug!(level = self.id, "Restarting an active run");
        }
        self.playing = true;
        self.run += 1;
        self.initial_arena = Some(Arc::new(Arena::clone(&self.arena)));
        info!(level = self.id, run = self.run, "Play");
        self.run
    }

    pub fn stop(&mut self) {
        if self.playing {
            info!(level = self.id, generation = self.generation, "Stop");
        }
        self.playing = false;
    }

    /// Stops and restores the arena captured by the last `play`.
    pub fn reset(&mut self) -> bool {
        let Some(initial) = self.initial_arena.clone() else {
            warn!(level = self.id, "Nothing to reset, the level was never played");
            return false;
        };
        self.stop();
        self.arena = initial;
        self.generation = 0;
        info!(level = self.id, "Reset to the initial arena");
        true
    }

    /// Advances one generation and returns the win, if this step produced one.
    pub fn step(&mut self) -> Option<WinEvent> {
        self.generation += 1;
        if let Some(handler) = self.generation_handler.as_mut() {
            handler(self.generation);
        }

        let next = evolve(&self.arena, &self.zones);

        let goal_arena = match GOAL_TIMING {
            GoalTiming::PreStep => &*self.arena,
            GoalTiming::PostStep => &next,
        };
        let reached = goal_arena.is_alive(self.goal.x, self.goal.y);

        self.arena = Arc::new(next);
        debug!(level = self.id, generation = self.generation, "Generation");

        if reached { self.win() } else { None }
    }

    fn win(&mut self) -> Option<WinEvent> {
        if self.is_beaten() {
            return None;
        }

        info!(level = self.id, generations = self.generation, "Game won");
        self.generations_until_beaten = self.generation;

        let event = WinEvent {
            level_id: self.id,
            generations: self.generation,
            outcome: self.progression.complete(self.id, self.campaign_len),
        };
        if let Some(handler) = self.win_handler.as_mut() {
            handler(&event);
        }
        Some(event)
    }

    /// Living cells in playable zones, reported to the play-count handler.
    pub fn count_played(&mut self) -> usize {
        if self.zones.playables().is_empty() {
            debug!(level = self.id, "There are no playable areas to count");
        }
        let count = self.zones.count_played(&self.arena);
        if let Some(handler) = self.play_count_handler.as_mut() {
            handler(count);
        }
        count
    }

    /// Kills every cell in the playable zones.
    pub fn clear(&mut self) {
        if self.zones.playables().is_empty() {
            warn!(level = self.id, "There are no playable areas to clear");
            return;
        }
        self.zones.clear(Arc::make_mut(&mut self.arena));
        info!(level = self.id, "The playing field has been cleared");
    }

    fn check_editable(&self, x: usize, y: usize) -> Result<(), EditError> {
        if self.playing {
            return Err(EditError::Running);
        }
        if !self.arena.in_bounds(x, y) {
            return Err(EditError::OutOfBounds { x, y });
        }
        match self.zones.classify(x, y) {
            Some(ZoneKind::Playable) => Ok(()),
            _ => Err(EditError::NotPlayable { x, y }),
        }
    }

    /// Flips a player-editable cell and returns its new state.
    pub fn toggle_cell(&mut self, x: usize, y: usize) -> Result<bool, EditError> {
        if let Err(err) = self.check_editable(x, y) {
            warn!(level = self.id, %err, "Edit rejected");
            return Err(err);
        }
        Arc::make_mut(&mut self.arena)
            .toggle(x, y)
            .ok_or(EditError::OutOfBounds { x, y })
    }

    /// Stamps a library pattern anchored at `(x, y)`. All or nothing.
    pub fn place_pattern(&mut self, name: &str, x: usize, y: usize) -> Result<usize, EditError> {
        let pattern = self
            .library
            .iter()
            .any(|n| n.eq_ignore_ascii_case(name))
            .then(|| patterns::find(name))
            .flatten()
            .ok_or_else(|| EditError::PatternUnavailable(name.to_string()))?;

        let Some(cells) = pattern.placed_at(x, y).collect::<Option<Vec<Coord>>>() else {
            let err = EditError::OutOfBounds { x, y };
            warn!(level = self.id, pattern = pattern.name, %err, "Pattern rejected");
            return Err(err);
        };
        if let Some(err) = cells.iter().find_map(|&(cx, cy)| self.check_editable(cx, cy).err()) {
            warn!(level = self.id, pattern = pattern.name, %err, "Pattern rejected");
            return Err(err);
        }

        let arena = Arc::make_mut(&mut self.arena);
        for &(cx, cy) in &cells {
            arena.set(cx, cy, true);
        }
        Ok(cells.len())
    }

    /// Adjusts pixels per cell. Requests that would leave the bounds are ignored.
    pub fn change_size(&mut self, delta: i32) -> bool {
        let target = i64::from(self.size) + i64::from(delta);
        if target < i64::from(self.min_size) || target > i64::from(self.max_size) {
            return false;
        }
        self.size = target as u32;
        debug!(size = self.size, "Resized");
        true
    }

    /// Drawing surface size for the current cell size.
    pub fn pixel_dimensions(&self) -> (u32, u32) {
        (
            self.arena.width() as u32 * self.size,
            self.arena.height() as u32 * self.size,
        )
    }

    /// Grid cell under a pointer, given the surface's offset on the page.
    pub fn event_position(&self, pointer: (f32, f32), surface_offset: (f32, f32)) -> Option<Coord> {
        let size = self.size as f32;
        let x = ((pointer.0 - surface_offset.0) / size).floor();
        let y = ((pointer.1 - surface_offset.1) / size).floor();
        if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        self.arena.in_bounds(x, y).then_some((x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::MemoryProgression;
    use crate::zones::Zone;
    use proptest::prelude::*;
    use rstest::rstest;
    use std::sync::Mutex;

    fn descriptor(width: usize, height: usize, goal: Coord, seed: &[Coord]) -> LevelDescriptor {
        LevelDescriptor {
            id: 1,
            width,
            height,
            deadzones: vec![],
            playables: vec![],
            goal: Goal { x: goal.0, y: goal.1 },
            library: vec![],
            name: String::new(),
            description: String::new(),
            arena: seed.to_vec(),
        }
    }

    fn level(descriptor: &LevelDescriptor) -> Level {
        Level::new(descriptor, &Config::default(), Arc::new(MemoryProgression::new(1)), 5).unwrap()
    }

    fn alive(level: &Level) -> Vec<Coord> {
        level.arena().live_cells().collect()
    }

    #[rstest]
    #[case(true, 0, false)]
    #[case(true, 1, false)]
    #[case(true, 2, true)]
    #[case(true, 3, true)]
    #[case(true, 4, false)]
    #[case(true, 8, false)]
    #[case(false, 2, false)]
    #[case(false, 3, true)]
    #[case(false, 4, false)]
    fn conway_rule(#[case] alive: bool, #[case] neighbours: u8, #[case] expected: bool) {
        assert_eq!(next_state(alive, neighbours), expected);
    }

    #[rstest]
    fn blinker_in_three_by_three_turns_vertical_and_wins_on_prestep_goal() {
        let mut level = level(&descriptor(3, 3, (1, 1), &[(0, 1), (1, 1), (2, 1)]));
        let won = level.step();

        assert_eq!(alive(&level), vec![(1, 0), (1, 1), (1, 2)]);
        assert_eq!(won.map(|w| w.generations), Some(1));
        assert_eq!(level.generations_until_beaten(), 1);
    }

    #[rstest]
    fn full_block_keeps_only_corners() {
        let seed: Vec<Coord> = Arena::new(3, 3).coords().collect();
        let mut level = level(&descriptor(3, 3, (0, 0), &seed));
        level.step();
        assert_eq!(alive(&level), vec![(0, 0), (2, 0), (0, 2), (2, 2)]);
    }

    #[rstest]
    fn deadzone_kills_a_full_block() {
        let seed: Vec<Coord> = Zone::new(1, 1, 3, 3).cells().collect();
        let mut desc = descriptor(5, 5, (4, 4), &seed);
        desc.deadzones.push(Zone::new(1, 1, 3, 3));
        let mut level = level(&desc);
        level.step();
        // Only births just outside the zone remain.
        assert_eq!(alive(&level), vec![(2, 0), (0, 2), (4, 2), (2, 4)]);
    }

    #[rstest]
    fn deadzone_blocks_births_but_neighbours_still_count() {
        // Vertical blinker next to a deadzone column: (0,1) would be born.
        let mut desc = descriptor(3, 3, (2, 2), &[(1, 0), (1, 1), (1, 2)]);
        desc.deadzones.push(Zone::new(0, 0, 1, 3));
        let mut level = level(&desc);
        level.step();
        assert_eq!(alive(&level), vec![(1, 1), (2, 1)]);
    }

    #[rstest]
    fn deadzone_overrides_overlapping_playable() {
        let mut desc = descriptor(4, 4, (3, 3), &[(1, 1), (2, 1), (1, 2), (2, 2)]);
        desc.playables.push(Zone::new(0, 0, 4, 4));
        desc.deadzones.push(Zone::new(1, 1, 1, 1));
        let mut level = level(&desc);

        assert_eq!(level.toggle_cell(1, 1), Err(EditError::NotPlayable { x: 1, y: 1 }));
        level.step();
        assert!(!level.arena().is_alive(1, 1));
        assert!(level.arena().is_alive(2, 2));
    }

    #[rstest]
    fn goal_born_during_a_step_wins_one_generation_later() {
        let mut level = level(&descriptor(3, 3, (1, 0), &[(0, 1), (1, 1), (2, 1)]));
        assert_eq!(level.step(), None);
        assert!(level.arena().is_alive(1, 0));
        assert_eq!(level.step().map(|w| w.generations), Some(2));
    }

    #[rstest]
    fn win_is_recorded_once() {
        // A block is a still life, so the goal stays alive forever.
        let mut level = level(&descriptor(4, 4, (1, 1), &[(1, 1), (2, 1), (1, 2), (2, 2)]));
        let wins = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&wins);
        level.on_win(move |event| sink.lock().unwrap().push(*event));

        for _ in 0..5 {
            level.step();
        }

        assert_eq!(level.generation(), 5);
        assert_eq!(level.generations_until_beaten(), 1);
        let wins = wins.lock().unwrap();
        assert_eq!(wins.len(), 1);
        assert_eq!(wins[0].outcome, Outcome::Unlocked(2));
    }

    #[rstest]
    fn generation_handler_sees_every_step() {
        let mut level = level(&descriptor(3, 3, (0, 0), &[]));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        level.on_generation(move |generation| sink.lock().unwrap().push(generation));

        level.step();
        level.step();
        level.step();

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }

    #[rstest]
    fn play_count_is_reported_to_handler() {
        let mut desc = descriptor(4, 4, (3, 3), &[(1, 1), (3, 0)]);
        desc.playables.push(Zone::new(0, 0, 2, 2));
        let mut level = level(&desc);
        let reported = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&reported);
        level.on_play_count(move |count| *sink.lock().unwrap() = Some(count));

        assert_eq!(level.count_played(), 1);
        assert_eq!(*reported.lock().unwrap(), Some(1));
    }

    #[rstest]
    fn play_count_without_playables_still_reports_zero() {
        let mut level = level(&descriptor(4, 4, (3, 3), &[(1, 1)]));
        let reported = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&reported);
        level.on_play_count(move |count| *sink.lock().unwrap() = Some(count));

        assert_eq!(level.count_played(), 0);
        assert_eq!(*reported.lock().unwrap(), Some(0));
    }

    #[rstest]
    fn play_snapshot_is_not_affected_by_steps() {
        let mut level = level(&descriptor(3, 3, (0, 0), &[(0, 1), (1, 1), (2, 1)]));
        level.play();
        level.step();
        assert_eq!(
            level.initial_arena().unwrap().live_cells().collect::<Vec<_>>(),
            vec![(0, 1), (1, 1), (2, 1)]
        );
        assert_ne!(level.initial_arena(), Some(level.arena()));
    }

    #[rstest]
    fn replay_bumps_the_run_epoch() {
        let mut level = level(&descriptor(3, 3, (0, 0), &[]));
        let first = level.play();
        let second = level.play();
        assert!(second > first);
        assert!(level.is_playing());
        level.stop();
        assert!(!level.is_playing());
    }

    #[rstest]
    fn reset_restores_the_played_arena() {
        let mut level = level(&descriptor(3, 3, (0, 0), &[(0, 1), (1, 1), (2, 1)]));
        assert!(!level.reset());

        level.play();
        level.step();
        assert!(level.reset());
        assert!(!level.is_playing());
        assert_eq!(level.generation(), 0);
        assert_eq!(alive(&level), vec![(0, 1), (1, 1), (2, 1)]);
    }

    #[rstest]
    fn edits_are_gated_to_idle_playables() {
        let mut desc = descriptor(5, 5, (4, 4), &[]);
        desc.playables.push(Zone::new(0, 0, 2, 2));
        let mut level = level(&desc);

        assert_eq!(level.toggle_cell(1, 1), Ok(true));
        assert_eq!(level.toggle_cell(3, 3), Err(EditError::NotPlayable { x: 3, y: 3 }));
        assert_eq!(level.toggle_cell(9, 0), Err(EditError::OutOfBounds { x: 9, y: 0 }));

        level.play();
        assert_eq!(level.toggle_cell(0, 0), Err(EditError::Running));
        assert_eq!(alive(&level), vec![(1, 1)]);
    }

    #[rstest]
    fn patterns_place_whole_or_not_at_all() {
        let mut desc = descriptor(6, 6, (5, 5), &[]);
        desc.playables.push(Zone::new(0, 0, 3, 3));
        desc.library.push("glider".into());
        let mut level = level(&desc);

        assert_eq!(level.place_pattern("glider", 1, 1), Err(EditError::NotPlayable { x: 3, y: 2 }));
        assert!(alive(&level).is_empty());

        assert_eq!(
            level.place_pattern("glider", usize::MAX, 0),
            Err(EditError::OutOfBounds { x: usize::MAX, y: 0 })
        );
        assert_eq!(
            level.place_pattern("glider", 0, usize::MAX - 1),
            Err(EditError::OutOfBounds { x: 0, y: usize::MAX - 1 })
        );
        assert!(alive(&level).is_empty());

        assert_eq!(level.place_pattern("Glider", 0, 0), Ok(5));
        assert_eq!(level.count_played(), 5);

        assert_eq!(
            level.place_pattern("block", 0, 0),
            Err(EditError::PatternUnavailable("block".into()))
        );
    }

    #[rstest]
    fn clear_empties_playables_only() {
        let mut desc = descriptor(4, 4, (3, 3), &[(0, 0), (3, 3)]);
        desc.playables.push(Zone::new(0, 0, 2, 2));
        let mut level = level(&desc);
        level.clear();
        assert_eq!(alive(&level), vec![(3, 3)]);
    }

    #[rstest]
    #[case(20)]
    #[case(-20)]
    #[case(9)]
    #[case(-7)]
    fn resize_outside_bounds_is_ignored(#[case] delta: i32) {
        let mut level = level(&descriptor(3, 3, (0, 0), &[]));
        assert!(!level.change_size(delta));
        assert_eq!(level.size(), 8);
    }

    #[rstest]
    #[case(8, 16)]
    #[case(-6, 2)]
    #[case(1, 9)]
    fn resize_within_bounds_applies(#[case] delta: i32, #[case] expected: u32) {
        let mut level = level(&descriptor(10, 5, (0, 0), &[]));
        assert!(level.change_size(delta));
        assert_eq!(level.size(), expected);
        assert_eq!(level.pixel_dimensions(), (10 * expected, 5 * expected));
    }

    #[rstest]
    #[case((100.0, 50.0), Some((0, 0)))]
    #[case((117.0, 74.0), Some((2, 3)))]
    #[case((99.0, 60.0), None)]
    #[case((100.0 + 8.0 * 10.0, 50.0), None)]
    #[case((f32::NAN, 50.0), None)]
    #[case((100.0, f32::NAN), None)]
    #[case((f32::INFINITY, 50.0), None)]
    fn pointer_translates_to_cells(#[case] pointer: (f32, f32), #[case] expected: Option<Coord>) {
        let level = level(&descriptor(10, 10, (0, 0), &[]));
        assert_eq!(level.event_position(pointer, (100.0, 50.0)), expected);
    }

    fn brute_force_neighbours(arena: &Arena, x: usize, y: usize) -> u8 {
        let mut count = 0;
        for ny in y.saturating_sub(1)..=y + 1 {
            for nx in x.saturating_sub(1)..=x + 1 {
                if (nx, ny) != (x, y) && arena.is_alive(nx, ny) {
                    count += 1;
                }
            }
        }
        count
    }

    proptest! {
        #[test]
        fn evolve_follows_conway_outside_zones(
            cells in proptest::collection::vec(any::<bool>(), 36)
        ) {
            let seed: Vec<Coord> = (0..36).filter(|&i| cells[i]).map(|i| (i % 6, i / 6)).collect();
            let arena = Arena::from_seed(6, 6, &seed).unwrap();
            let next = evolve(&arena, &Zones::default());
            for (x, y) in arena.coords() {
                let expected = next_state(arena.is_alive(x, y), brute_force_neighbours(&arena, x, y));
                prop_assert_eq!(next.is_alive(x, y), expected);
            }
        }

        #[test]
        fn deadzones_are_always_dead_after_a_step(
            cells in proptest::collection::vec(any::<bool>(), 36),
            zx in 0usize..6, zy in 0usize..6, zw in 1usize..4, zh in 1usize..4,
        ) {
            let seed: Vec<Coord> = (0..36).filter(|&i| cells[i]).map(|i| (i % 6, i / 6)).collect();
            let arena = Arena::from_seed(6, 6, &seed).unwrap();
            let zone = Zone::new(zx, zy, zw, zh);
            let next = evolve(&arena, &Zones::new(vec![zone], vec![]));
            prop_assert!(zone.cells().all(|(x, y)| !next.is_alive(x, y)));
        }
    }
}
