//! Settling: loose halves and connected pairs fall after a clear. Viruses never move.

use crate::block::{Axis, Connection, Side};
use crate::collision::is_free;
use crate::grid::Grid;

/// One settle pass: rows bottom-up, columns left to right, each block falls
/// at most one row. Orphaned halves are detached on every row, the floor
/// included. Returns whether anything moved.
pub fn settle_step(grid: &mut Grid) -> bool {
    let (w, h) = (grid.width(), grid.height());
    let mut moved = false;

    // The floor row never falls; the fall helpers see it as blocked.
    for y in (0..h).rev() {
        for x in 0..w {
            let Some(block) = grid.get(x, y) else {
                continue;
            };
            if block.is_virus() {
                continue;
            }

            let connection = block.connection;
            let partner = match connection {
                Connection::Unconnected => None,
                Connection::Connected(_) => {
                    let partner = grid.partner_of(x, y);
                    if partner.is_none() {
                        grid.set_connection(x, y, Connection::Unconnected);
                    }
                    partner
                }
            };

            moved |= match (connection, partner) {
                (_, Some(p)) if connection.axis() == Some(Axis::Horizontal) => {
                    fall_horizontal(grid, (x, y), p)
                }
                // The lower half is handled from the upper one.
                (Connection::Connected(Side::Down), Some(p)) => fall_vertical(grid, (x, y), p),
                (_, Some(_)) => false,
                (_, None) => fall_single(grid, x, y),
            };
        }
    }
    moved
}

fn fall_single(grid: &mut Grid, x: usize, y: usize) -> bool {
    if !is_free(grid, x as i32, y as i32 + 1) {
        return false;
    }
    grid.move_block((x, y), (x, y + 1)).is_ok()
}

/// Both halves drop together only if both cells below are free.
fn fall_horizontal(grid: &mut Grid, a: (usize, usize), b: (usize, usize)) -> bool {
    let below_free = |(x, y): (usize, usize)| is_free(grid, x as i32, y as i32 + 1);
    if !(below_free(a) && below_free(b)) {
        return false;
    }
    grid.move_block(a, (a.0, a.1 + 1)).is_ok() && grid.move_block(b, (b.0, b.1 + 1)).is_ok()
}

/// `top` sits directly above `bottom`; only the cell under `bottom` matters.
fn fall_vertical(grid: &mut Grid, top: (usize, usize), bottom: (usize, usize)) -> bool {
    if !is_free(grid, bottom.0 as i32, bottom.1 as i32 + 1) {
        return false;
    }
    grid.move_block(bottom, (bottom.0, bottom.1 + 1)).is_ok()
        && grid.move_block(top, (top.0, top.1 + 1)).is_ok()
}

/// Run settle passes until one moves nothing. Returns the number of passes
/// that moved something.
pub fn settle(grid: &mut Grid) -> u32 {
    let mut passes = 0;
    while settle_step(grid) {
        passes += 1;
    }
    passes
}
