//! Board of settled blocks: occupancy queries and structural mutations.

use crate::block::{Block, Connection};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cannot place block at ({x}, {y}): cell occupied or out of bounds")]
    InvalidPlacement { x: usize, y: usize },
    #[error("cannot move block from {from:?} to {to:?}")]
    InvalidMove {
        from: (usize, usize),
        to: (usize, usize),
    },
}

/// Fixed-size board. y=0 is the top row; `rows[y][x]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    rows: Vec<Vec<Option<Block>>>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            rows: vec![vec![None; width]; height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Out-of-bounds cells count as occupied.
    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        if !self.in_bounds(x, y) {
            return true;
        }
        self.rows[y as usize][x as usize].is_some()
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<&Block> {
        self.rows.get(y).and_then(|row| row.get(x)).and_then(Option::as_ref)
    }

    /// Write `block` at its own (x, y).
    pub fn place(&mut self, block: Block) -> Result<(), GridError> {
        let (x, y) = (block.x, block.y);
        match self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            Some(cell @ None) => {
                *cell = Some(block);
                Ok(())
            }
            _ => Err(GridError::InvalidPlacement { x, y }),
        }
    }

    pub fn remove(&mut self, x: usize, y: usize) -> Option<Block> {
        self.rows.get_mut(y).and_then(|row| row.get_mut(x)).and_then(Option::take)
    }

    /// Relocate the block at `from` to the empty, in-bounds cell `to`.
    pub fn move_block(&mut self, from: (usize, usize), to: (usize, usize)) -> Result<(), GridError> {
        let err = GridError::InvalidMove { from, to };
        if self.get(from.0, from.1).is_none() || self.is_occupied(to.0 as i32, to.1 as i32) {
            return Err(err);
        }
        let mut block = self.remove(from.0, from.1).ok_or(err)?;
        block.x = to.0;
        block.y = to.1;
        self.rows[to.1][to.0] = Some(block);
        Ok(())
    }

    pub fn set_connection(&mut self, x: usize, y: usize, connection: Connection) {
        if let Some(block) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)).and_then(Option::as_mut) {
            block.connection = connection;
        }
    }

    /// Cell of the connected partner of the block at (x, y), derived from the
    /// connection flags of both blocks. `None` if either side no longer agrees
    /// (e.g. the partner was cleared).
    pub fn partner_of(&self, x: usize, y: usize) -> Option<(usize, usize)> {
        let block = self.get(x, y)?;
        if block.is_virus() {
            return None;
        }
        let Connection::Connected(side) = block.connection else {
            return None;
        };
        let (dx, dy) = side.offset();
        let (px, py) = (x as i32 + dx, y as i32 + dy);
        if !self.in_bounds(px, py) {
            return None;
        }
        let (px, py) = (px as usize, py as usize);
        let partner = self.get(px, py)?;
        let points_back = partner.connection == Connection::Connected(side.opposite());
        (!partner.is_virus() && points_back).then_some((px, py))
    }

    /// All placed blocks, row by row from the top.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.rows.iter().flat_map(|row| row.iter().flatten())
    }

    pub fn virus_count(&self) -> u32 {
        self.blocks().filter(|b| b.is_virus()).count() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.blocks().next().is_none()
    }
}
