//! Blocks: the single-cell units that make up pills and viruses.

use rand::Rng;

/// Capsule / virus colours. The palette is fixed at three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PillColor {
    Red,
    Yellow,
    Blue,
}

impl PillColor {
    pub const ALL: [Self; 3] = [Self::Red, Self::Yellow, Self::Blue];

    /// Index into the theme palette (0..3).
    pub fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Yellow => 1,
            Self::Blue => 2,
        }
    }

    /// Uniformly random palette colour.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Where a connected block's partner sits, relative to the block itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Up,
    Down,
}

impl Side {
    /// (dx, dy) from this block to its partner. y grows downwards.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::Up => (0, -1),
            Self::Down => (0, 1),
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Self::Left | Self::Right => Axis::Horizontal,
            Self::Up | Self::Down => Axis::Vertical,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}

/// Connection state of a block. The partner itself is never stored; see
/// [`crate::grid::Grid::partner_of`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connection {
    #[default]
    Unconnected,
    Connected(Side),
}

impl Connection {
    pub fn axis(self) -> Option<Axis> {
        match self {
            Self::Unconnected => None,
            Self::Connected(side) => Some(side.axis()),
        }
    }
}

/// One occupied cell. `x`/`y` always match the block's grid cell once placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub x: usize,
    pub y: usize,
    pub color: PillColor,
    is_virus: bool,
    pub connection: Connection,
}

impl Block {
    /// Virus block. Viruses are never connected.
    pub fn virus(x: usize, y: usize, color: PillColor) -> Self {
        Self {
            x,
            y,
            color,
            is_virus: true,
            connection: Connection::Unconnected,
        }
    }

    /// Capsule half (or a loose half left over after a clear).
    pub fn pill(x: usize, y: usize, color: PillColor, connection: Connection) -> Self {
        Self {
            x,
            y,
            color,
            is_virus: false,
            connection,
        }
    }

    #[inline]
    pub fn is_virus(&self) -> bool {
        self.is_virus
    }
}
