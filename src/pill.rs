//! The falling two-block capsule: translation, rotation and wall kicks.

use crate::block::{Block, Connection, PillColor, Side};
use crate::collision;
use crate::grid::Grid;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("pill move blocked")]
    InvalidMove,
    #[error("pill rotation blocked")]
    InvalidRotation,
}

/// Active pill. The first block is the pivot; the second sits beside it
/// according to the rotation phase (0..4):
/// 0 horizontal, 1 vertical, 2 horizontal flipped, 3 vertical flipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pill {
    x: i32,
    y: i32,
    rotation: u8,
    colors: [PillColor; 2],
}

impl Pill {
    /// Horizontal pill with its pivot at (x, y).
    pub fn new(x: i32, y: i32, colors: [PillColor; 2]) -> Self {
        Self::with_rotation(x, y, 0, colors)
    }

    pub fn with_rotation(x: i32, y: i32, rotation: u8, colors: [PillColor; 2]) -> Self {
        Self {
            x,
            y,
            rotation: rotation % 4,
            colors,
        }
    }

    #[inline]
    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    #[inline]
    pub fn colors(&self) -> [PillColor; 2] {
        self.colors
    }

    /// Side of the pivot on which the second block sits.
    pub fn second_side(&self) -> Side {
        match self.rotation {
            0 => Side::Right,
            1 => Side::Down,
            2 => Side::Left,
            _ => Side::Up,
        }
    }

    /// Pivot cell first, then the second block.
    pub fn cells(&self) -> [(i32, i32); 2] {
        let (dx, dy) = self.second_side().offset();
        [(self.x, self.y), (self.x + dx, self.y + dy)]
    }

    /// Both halves as blocks connected to each other. Only meaningful while
    /// the pill sits inside the grid.
    pub fn blocks(&self) -> [Block; 2] {
        let side = self.second_side();
        let [(x1, y1), (x2, y2)] = self.cells();
        [
            Block::pill(
                x1 as usize,
                y1 as usize,
                self.colors[0],
                Connection::Connected(side),
            ),
            Block::pill(
                x2 as usize,
                y2 as usize,
                self.colors[1],
                Connection::Connected(side.opposite()),
            ),
        ]
    }

    pub fn fits(&self, grid: &Grid) -> bool {
        collision::fits(grid, &self.cells())
    }

    fn shifted(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self.clone()
        }
    }

    fn rotated(&self) -> Self {
        Self {
            rotation: (self.rotation + 1) % 4,
            ..self.clone()
        }
    }

    fn translate(&mut self, grid: &Grid, dx: i32, dy: i32) -> Result<(), MoveError> {
        let moved = self.shifted(dx, dy);
        if !moved.fits(grid) {
            return Err(MoveError::InvalidMove);
        }
        *self = moved;
        Ok(())
    }

    pub fn move_left(&mut self, grid: &Grid) -> Result<(), MoveError> {
        self.translate(grid, -1, 0)
    }

    pub fn move_right(&mut self, grid: &Grid) -> Result<(), MoveError> {
        self.translate(grid, 1, 0)
    }

    /// Failure here is the lock signal.
    pub fn move_down(&mut self, grid: &Grid) -> Result<(), MoveError> {
        self.translate(grid, 0, 1)
    }

    /// Advance the rotation phase around the pivot. If the second block would
    /// leave the board through a side wall, one kick away from that wall is
    /// tried; there is no kick for the top or bottom edge.
    pub fn rotate(&mut self, grid: &Grid) -> Result<(), MoveError> {
        let rotated = self.rotated();
        if rotated.fits(grid) {
            *self = rotated;
            return Ok(());
        }

        let (x2, _) = rotated.cells()[1];
        let kick = if x2 < 0 {
            1
        } else if x2 >= grid.width() as i32 {
            -1
        } else {
            return Err(MoveError::InvalidRotation);
        };

        let shifted = self.shifted(kick, 0);
        if !shifted.fits(grid) {
            return Err(MoveError::InvalidRotation);
        }
        let kicked = shifted.rotated();
        if !kicked.fits(grid) {
            return Err(MoveError::InvalidRotation);
        }
        *self = kicked;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RY: [PillColor; 2] = [PillColor::Red, PillColor::Yellow];

    #[test]
    fn test_rotation_cycles_through_offsets() {
        let grid = Grid::new(8, 16);
        let mut pill = Pill::new(3, 5, RY);
        let expected = [(3, 6), (2, 5), (3, 4), (4, 5)];
        for (phase, second) in expected.into_iter().enumerate() {
            pill.rotate(&grid).unwrap();
            assert_eq!(pill.rotation(), ((phase + 1) % 4) as u8);
            assert_eq!(pill.cells(), [(3, 5), second]);
        }
    }

    #[test]
    fn test_blocks_are_connected_to_each_other() {
        let pill = Pill::with_rotation(2, 2, 3, RY);
        let [pivot, second] = pill.blocks();
        assert_eq!((second.x, second.y), (2, 1));
        assert_eq!(pivot.connection, Connection::Connected(Side::Up));
        assert_eq!(second.connection, Connection::Connected(Side::Down));
        assert!(!pivot.is_virus() && !second.is_virus());
    }

    #[test]
    fn test_moves_stop_at_walls_and_blocks() {
        let mut grid = Grid::new(8, 16);
        let mut pill = Pill::new(0, 0, RY);
        assert_eq!(pill.move_left(&grid), Err(MoveError::InvalidMove));
        assert_eq!(pill.cells(), [(0, 0), (1, 0)]);

        grid.place(Block::virus(3, 0, PillColor::Blue)).unwrap();
        pill.move_right(&grid).unwrap();
        assert_eq!(pill.move_right(&grid), Err(MoveError::InvalidMove));
        assert_eq!(pill.cells(), [(1, 0), (2, 0)]);
    }

    #[test]
    fn test_move_down_fails_on_floor() {
        let grid = Grid::new(8, 3);
        let mut pill = Pill::new(2, 0, RY);
        pill.move_down(&grid).unwrap();
        pill.move_down(&grid).unwrap();
        assert_eq!(pill.move_down(&grid), Err(MoveError::InvalidMove));
        assert_eq!(pill.cells(), [(2, 2), (3, 2)]);
    }

    #[test]
    fn test_move_down_fails_on_support_under_either_half() {
        let mut grid = Grid::new(8, 16);
        grid.place(Block::virus(4, 6, PillColor::Red)).unwrap();
        let mut pill = Pill::new(3, 5, RY);
        assert_eq!(pill.move_down(&grid), Err(MoveError::InvalidMove));
    }

    #[test]
    fn test_left_wall_kick() {
        let grid = Grid::new(8, 16);
        let mut pill = Pill::with_rotation(0, 4, 1, RY);
        pill.rotate(&grid).unwrap();
        assert_eq!(pill.rotation(), 2);
        assert_eq!(pill.cells(), [(1, 4), (0, 4)]);
    }

    #[test]
    fn test_right_wall_kick() {
        let grid = Grid::new(8, 16);
        let mut pill = Pill::with_rotation(7, 4, 3, RY);
        pill.rotate(&grid).unwrap();
        assert_eq!(pill.rotation(), 0);
        assert_eq!(pill.cells(), [(6, 4), (7, 4)]);
    }

    #[test]
    fn test_kick_fails_cleanly_on_narrow_board() {
        let grid = Grid::new(1, 16);
        let mut pill = Pill::with_rotation(0, 4, 1, RY);
        let before = pill.clone();
        assert_eq!(pill.rotate(&grid), Err(MoveError::InvalidRotation));
        assert_eq!(pill, before);
    }

    #[test]
    fn test_kick_fails_when_shift_is_blocked() {
        let mut grid = Grid::new(8, 16);
        grid.place(Block::virus(1, 4, PillColor::Blue)).unwrap();
        let mut pill = Pill::with_rotation(0, 4, 1, RY);
        let before = pill.clone();
        assert_eq!(pill.rotate(&grid), Err(MoveError::InvalidRotation));
        assert_eq!(pill, before);
    }

    #[test]
    fn test_blocked_rotation_inside_walls_gets_no_kick() {
        let mut grid = Grid::new(8, 16);
        let mut pill = Pill::with_rotation(1, 4, 1, RY);
        pill.rotate(&grid).unwrap();
        assert_eq!(pill.cells(), [(1, 4), (0, 4)]);

        grid.place(Block::virus(1, 3, PillColor::Red)).unwrap();
        let before = pill.clone();
        assert_eq!(pill.rotate(&grid), Err(MoveError::InvalidRotation));
        assert_eq!(pill, before);
    }

    #[test]
    fn test_no_kick_at_top_edge() {
        let grid = Grid::new(8, 16);
        let mut pill = Pill::with_rotation(3, 0, 2, RY);
        let before = pill.clone();
        assert_eq!(pill.rotate(&grid), Err(MoveError::InvalidRotation));
        assert_eq!(pill, before);
    }

    #[test]
    fn test_no_kick_at_bottom_edge() {
        let grid = Grid::new(8, 16);
        let mut pill = Pill::new(3, 15, RY);
        let before = pill.clone();
        assert_eq!(pill.rotate(&grid), Err(MoveError::InvalidRotation));
        assert_eq!(pill, before);
    }
}
