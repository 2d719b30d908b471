//! Game controller: owns the board, the active pill and the score, and runs
//! the drop → lock → match → settle → spawn cycle.

use crate::GameConfig;
use crate::block::PillColor;
use crate::grid::Grid;
use crate::pill::Pill;
use crate::{gravity, matcher, viruses};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Start,
    Playing,
    GameOver,
}

/// Score, level and virus tally shown to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub score: u32,
    pub level: u32,
    pub virus_count: u32,
    pub phase: Phase,
    /// Score at the moment the game ended.
    pub final_score: Option<u32>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            score: 0,
            level: 1,
            virus_count: 0,
            phase: Phase::Start,
            final_score: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("pill spawn blocked at column {x}")]
pub struct SpawnBlocked {
    pub x: usize,
}

#[derive(Debug)]
pub struct Game {
    config: GameConfig,
    grid: Grid,
    pill: Option<Pill>,
    state: GameState,
    /// Time accumulated toward the next automatic drop.
    drop_elapsed: Duration,
    rng: Pcg32,
    /// Cells removed during the latest lock resolution.
    last_clear: Vec<(usize, usize)>,
    clear_generation: u64,
    chain: u32,
}

impl Game {
    pub fn new(config: &GameConfig) -> Self {
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        Self {
            config: config.clone(),
            grid: Grid::new(config.width, config.height),
            pill: None,
            state: GameState::default(),
            drop_elapsed: Duration::ZERO,
            rng: Pcg32::seed_from_u64(seed),
            last_clear: Vec::new(),
            clear_generation: 0,
            chain: 0,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn pill(&self) -> Option<&Pill> {
        self.pill.as_ref()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn last_clear(&self) -> &[(usize, usize)] {
        &self.last_clear
    }

    /// Bumped every time a lock resolution removes something.
    pub fn clear_generation(&self) -> u64 {
        self.clear_generation
    }

    /// Removal passes in the latest lock resolution.
    pub fn chain(&self) -> u32 {
        self.chain
    }

    #[inline]
    fn playing(&self) -> bool {
        self.state.phase == Phase::Playing
    }

    /// Begin a new game at level 1. Ignored while a game is running.
    pub fn start(&mut self) -> bool {
        if self.playing() {
            return false;
        }
        self.state = GameState::default();
        self.init_level();
        true
    }

    /// Fresh board for the current level: new viruses, score reset, new pill.
    fn init_level(&mut self) {
        let target = viruses::virus_target(
            self.config.initial_viruses,
            self.config.max_viruses,
            self.state.level,
        );
        self.grid = Grid::new(self.config.width, self.config.height);
        self.state.score = 0;
        self.state.virus_count = viruses::seed_viruses(&mut self.grid, target, &mut self.rng);
        self.state.phase = Phase::Playing;
        self.state.final_score = None;
        self.pill = None;
        self.drop_elapsed = Duration::ZERO;
        self.spawn_or_end();
    }

    fn spawn_pill(&mut self) -> Result<(), SpawnBlocked> {
        let x = (self.grid.width() / 2).saturating_sub(1);
        if self.grid.is_occupied(x as i32, 0) || self.grid.is_occupied(x as i32 + 1, 0) {
            return Err(SpawnBlocked { x });
        }
        let colors = [PillColor::random(&mut self.rng), PillColor::random(&mut self.rng)];
        self.pill = Some(Pill::new(x as i32, 0, colors));
        Ok(())
    }

    /// A blocked spawn is the only way a game ends.
    fn spawn_or_end(&mut self) {
        if let Err(SpawnBlocked { .. }) = self.spawn_pill() {
            self.pill = None;
            self.state.phase = Phase::GameOver;
            self.state.final_score = Some(self.state.score);
        }
    }

    pub fn move_left(&mut self) -> bool {
        if !self.playing() {
            return false;
        }
        self.pill
            .as_mut()
            .is_some_and(|pill| pill.move_left(&self.grid).is_ok())
    }

    pub fn move_right(&mut self) -> bool {
        if !self.playing() {
            return false;
        }
        self.pill
            .as_mut()
            .is_some_and(|pill| pill.move_right(&self.grid).is_ok())
    }

    pub fn rotate(&mut self) -> bool {
        if !self.playing() {
            return false;
        }
        self.pill
            .as_mut()
            .is_some_and(|pill| pill.rotate(&self.grid).is_ok())
    }

    /// One row down. A blocked soft drop does nothing; the next timed drop locks.
    pub fn soft_drop(&mut self) -> bool {
        if !self.playing() {
            return false;
        }
        self.pill
            .as_mut()
            .is_some_and(|pill| pill.move_down(&self.grid).is_ok())
    }

    /// Drop until blocked, then lock at once.
    pub fn hard_drop(&mut self) -> bool {
        if !self.playing() {
            return false;
        }
        let Some(pill) = self.pill.as_mut() else {
            return false;
        };
        while pill.move_down(&self.grid).is_ok() {}
        self.lock_pill();
        true
    }

    /// Advance the drop timer; when it passes the drop interval the pill
    /// moves down one row, or locks if it cannot.
    pub fn tick(&mut self, elapsed: Duration) {
        if !self.playing() {
            return;
        }
        self.drop_elapsed += elapsed;
        if self.drop_elapsed <= self.config.drop_interval {
            return;
        }
        self.drop_elapsed = Duration::ZERO;
        let Some(pill) = self.pill.as_mut() else {
            return;
        };
        if pill.move_down(&self.grid).is_err() {
            self.lock_pill();
        }
    }

    fn lock_pill(&mut self) {
        let Some(pill) = self.pill.take() else {
            return;
        };
        for block in pill.blocks() {
            // Spawn and every move check `fits`, so both cells are free.
            let placed = self.grid.place(block);
            debug_assert!(placed.is_ok(), "active pill overlapped the board: {placed:?}");
        }
        self.resolve();
        if self.playing() && self.pill.is_none() {
            self.spawn_or_end();
        }
    }

    /// Match → settle until a pass removes nothing. Clearing the last virus
    /// moves straight on to the next level.
    fn resolve(&mut self) {
        let mut cleared = Vec::new();
        self.chain = 0;
        loop {
            let report = matcher::clear_matches(&mut self.grid, &mut self.state);
            if report.is_empty() {
                break;
            }
            self.chain += 1;
            cleared.extend(report.cells);
            if self.state.virus_count == 0 {
                self.complete_level();
                break;
            }
            gravity::settle(&mut self.grid);
        }
        if !cleared.is_empty() {
            self.last_clear = cleared;
            self.clear_generation += 1;
        }
    }

    fn complete_level(&mut self) {
        self.state.level += 1;
        self.init_level();
    }
}
