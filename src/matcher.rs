//! Match detection: same-colour runs of four or more along rows and columns.

use crate::block::PillColor;
use crate::game::GameState;
use crate::grid::Grid;
use std::collections::BTreeSet;

/// Shortest run that clears.
pub const MIN_RUN: usize = 4;
pub const VIRUS_POINTS: u32 = 100;
pub const BLOCK_POINTS: u32 = 10;

/// What one removal pass took off the board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearReport {
    pub cells: Vec<(usize, usize)>,
    pub viruses: u32,
    pub blocks: u32,
}

impl ClearReport {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn points(&self) -> u32 {
        self.viruses * VIRUS_POINTS + self.blocks * BLOCK_POINTS
    }
}

/// Mark runs along one line of cells. The run in progress is flushed whenever
/// the colour changes, an empty cell is hit, or the line ends.
fn scan_line<I>(line: I, marked: &mut BTreeSet<(usize, usize)>)
where
    I: IntoIterator<Item = ((usize, usize), Option<PillColor>)>,
{
    let mut run: Vec<(usize, usize)> = Vec::new();
    let mut run_color = None;
    let mut flush = |run: &mut Vec<(usize, usize)>| {
        if run.len() >= MIN_RUN {
            marked.extend(run.iter().copied());
        }
        run.clear();
    };

    for (pos, color) in line {
        match color {
            Some(c) if run_color == Some(c) => run.push(pos),
            Some(c) => {
                flush(&mut run);
                run.push(pos);
                run_color = Some(c);
            }
            None => {
                flush(&mut run);
                run_color = None;
            }
        }
    }
    flush(&mut run);
}

/// Cells belonging to a qualifying run, horizontal or vertical. A cell on
/// both a horizontal and a vertical run appears once.
pub fn find_matches(grid: &Grid) -> BTreeSet<(usize, usize)> {
    let (w, h) = (grid.width(), grid.height());
    let color_at = |x: usize, y: usize| grid.get(x, y).map(|b| b.color);
    let mut marked = BTreeSet::new();

    for y in 0..h {
        scan_line((0..w).map(|x| ((x, y), color_at(x, y))), &mut marked);
    }
    for x in 0..w {
        scan_line((0..h).map(|y| ((x, y), color_at(x, y))), &mut marked);
    }
    marked
}

/// Remove every marked cell, crediting the score and the virus tally.
pub fn clear_matches(grid: &mut Grid, state: &mut GameState) -> ClearReport {
    let mut report = ClearReport::default();
    for (x, y) in find_matches(grid) {
        let Some(block) = grid.remove(x, y) else {
            continue;
        };
        if block.is_virus() {
            report.viruses += 1;
            state.score += VIRUS_POINTS;
            state.virus_count = state.virus_count.saturating_sub(1);
        } else {
            report.blocks += 1;
            state.score += BLOCK_POINTS;
        }
        report.cells.push((x, y));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, Connection};
    use crate::gravity;
    use proptest::prelude::*;

    fn loose(grid: &mut Grid, x: usize, y: usize, color: PillColor) {
        grid.place(Block::pill(x, y, color, Connection::Unconnected))
            .unwrap();
    }

    #[test]
    fn test_row_of_four_clears_and_scores() {
        let mut grid = Grid::new(8, 16);
        for x in 0..4 {
            loose(&mut grid, x, 10, PillColor::Red);
        }
        let mut state = GameState::default();

        let report = clear_matches(&mut grid, &mut state);
        assert_eq!(report.cells.len(), 4);
        assert_eq!(state.score, 40);
        assert_eq!(report.points(), 40);
        assert!(grid.is_empty());

        assert_eq!(gravity::settle(&mut grid), 0);
        assert!(clear_matches(&mut grid, &mut state).is_empty());
        assert_eq!(state.score, 40);
    }

    #[test]
    fn test_run_of_three_is_left_alone() {
        let mut grid = Grid::new(8, 16);
        for y in 12..15 {
            loose(&mut grid, 5, y, PillColor::Blue);
        }
        loose(&mut grid, 5, 15, PillColor::Red);
        assert!(find_matches(&grid).is_empty());
    }

    #[test]
    fn test_run_at_line_end_is_flushed() {
        let mut grid = Grid::new(8, 16);
        for y in 11..16 {
            loose(&mut grid, 7, y, PillColor::Yellow);
        }
        assert_eq!(find_matches(&grid).len(), 5);
    }

    #[test]
    fn test_gap_breaks_run() {
        let mut grid = Grid::new(8, 16);
        for x in [0, 1, 3, 4] {
            loose(&mut grid, x, 15, PillColor::Red);
        }
        assert!(find_matches(&grid).is_empty());
    }

    #[test]
    fn test_crossing_runs_count_shared_cell_once() {
        let mut grid = Grid::new(8, 16);
        for x in 2..6 {
            loose(&mut grid, x, 12, PillColor::Blue);
        }
        for y in 9..12 {
            loose(&mut grid, 3, y, PillColor::Blue);
        }
        let mut state = GameState::default();
        let report = clear_matches(&mut grid, &mut state);
        assert_eq!(report.cells.len(), 7);
        assert_eq!(state.score, 70);
    }

    #[test]
    fn test_virus_scoring() {
        let mut grid = Grid::new(8, 16);
        grid.place(Block::virus(0, 15, PillColor::Yellow)).unwrap();
        grid.place(Block::virus(1, 15, PillColor::Yellow)).unwrap();
        loose(&mut grid, 2, 15, PillColor::Yellow);
        loose(&mut grid, 3, 15, PillColor::Yellow);
        let mut state = GameState {
            virus_count: 5,
            ..GameState::default()
        };

        let report = clear_matches(&mut grid, &mut state);
        assert_eq!((report.viruses, report.blocks), (2, 2));
        assert_eq!(state.score, 220);
        assert_eq!(state.virus_count, 3);
    }

    #[test]
    fn test_mixed_colours_do_not_match() {
        let mut grid = Grid::new(8, 16);
        for (x, c) in [
            PillColor::Red,
            PillColor::Red,
            PillColor::Yellow,
            PillColor::Red,
            PillColor::Red,
        ]
        .into_iter()
        .enumerate()
        {
            loose(&mut grid, x, 15, c);
        }
        assert!(find_matches(&grid).is_empty());
    }

    proptest! {
        #[test]
        fn run_clears_iff_at_least_four(len in 1usize..=8, start in 0usize..8) {
            let len = len.min(8 - start);
            let mut grid = Grid::new(8, 16);
            for x in start..start + len {
                loose(&mut grid, x, 7, PillColor::Red);
            }
            let marked = find_matches(&grid);
            if len >= MIN_RUN {
                prop_assert_eq!(marked.len(), len);
            } else {
                prop_assert!(marked.is_empty());
            }
        }
    }
}
