//! Virus layout for a level.

use crate::block::{Block, PillColor};
use crate::grid::Grid;
use rand::Rng;
use rand::seq::SliceRandom;

/// Extra viruses per level.
pub const VIRUSES_PER_LEVEL: u32 = 4;
/// Depth of the virus band, counted up from the bottom row.
const BAND_DEPTH: usize = 10;
/// Viruses never go above this row.
const BAND_TOP_LIMIT: usize = 4;

/// Number of viruses for `level` (1-based), capped at `max`.
pub fn virus_target(initial: u32, max: u32, level: u32) -> u32 {
    let grown = initial.saturating_add(level.saturating_sub(1).saturating_mul(VIRUSES_PER_LEVEL));
    grown.min(max)
}

/// Inclusive row range viruses may occupy, or `None` if the board is too short.
pub fn virus_rows(height: usize) -> Option<(usize, usize)> {
    let bottom = height.checked_sub(1)?;
    let top = bottom.saturating_sub(BAND_DEPTH).max(BAND_TOP_LIMIT);
    (top <= bottom).then_some((top, bottom))
}

/// Place up to `count` viruses on free cells of the band, each with a random
/// colour. Returns how many were placed (less than `count` only when the band
/// runs out of room).
pub fn seed_viruses<R: Rng + ?Sized>(grid: &mut Grid, count: u32, rng: &mut R) -> u32 {
    let Some((top, bottom)) = virus_rows(grid.height()) else {
        return 0;
    };
    let mut free: Vec<(usize, usize)> = (top..=bottom)
        .flat_map(|y| (0..grid.width()).map(move |x| (x, y)))
        .filter(|&(x, y)| grid.get(x, y).is_none())
        .collect();

    let amount = (count as usize).min(free.len());
    let (chosen, _) = free.partial_shuffle(rng, amount);
    let mut placed = 0;
    for &mut (x, y) in chosen {
        if grid.place(Block::virus(x, y, PillColor::random(rng))).is_ok() {
            placed += 1;
        }
    }
    placed
}
