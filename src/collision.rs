//! Collision queries shared by pill movement and gravity.

use crate::grid::Grid;

/// In bounds and empty.
#[inline]
pub fn is_free(grid: &Grid, x: i32, y: i32) -> bool {
    !grid.is_occupied(x, y)
}

/// True if every cell is free.
pub fn fits(grid: &Grid, cells: &[(i32, i32)]) -> bool {
    cells.iter().all(|&(x, y)| is_free(grid, x, y))
}
