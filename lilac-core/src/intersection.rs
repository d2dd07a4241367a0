//! Packed, append-only sequence of scanline-crossing records for the
//! in-progress path (component C).
//!
//! Packing: bit 0 = direction (1 = upward/+1, 0 = downward/-1); bits 1-15 =
//! tile X; bits 16-30 = tile Y; bit 31 is always 0. Ascending unsigned
//! integer order on the packed word already yields the sort order the tile
//! rasterizer needs (primary tileY, secondary tileX, tertiary direction) —
//! do not replace this with a tuple comparator unless the layout changes.

use lilac_macros::require;

use crate::error::LilacError;

const DIRECTION_BIT: u32 = 0;
const TILE_X_SHIFT: u32 = 1;
const TILE_Y_SHIFT: u32 = 16;

/// Starting capacity; doubles on overflow up to [`CEILING`].
const INITIAL_CAPACITY: usize = 64;

/// Hard ceiling on the number of records a single path/tile pair may
/// produce. Exceeding it is a fatal capacity-exhaustion error.
pub const CEILING: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Line or dot crossing moves upward through the scanline: +1.
    Up,
    /// Line or dot crossing moves downward through the scanline: -1.
    Down,
}

impl Direction {
    #[must_use]
    pub const fn sign(self) -> i32 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }
}

/// One unpacked scanline-crossing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intersection {
    pub tile_x: u16,
    pub tile_y: u16,
    pub direction: Direction,
}

fn pack(record: Intersection) -> u32 {
    let direction_bit = matches!(record.direction, Direction::Up) as u32;
    (u32::from(record.tile_y) << TILE_Y_SHIFT)
        | (u32::from(record.tile_x) << TILE_X_SHIFT)
        | (direction_bit << DIRECTION_BIT)
}

fn unpack(word: u32) -> Intersection {
    let direction = if (word >> DIRECTION_BIT) & 1 == 1 {
        Direction::Up
    } else {
        Direction::Down
    };
    Intersection {
        tile_x: ((word >> TILE_X_SHIFT) & 0x7FFF) as u16,
        tile_y: ((word >> TILE_Y_SHIFT) & 0x7FFF) as u16,
        direction,
    }
}

/// The growable, sort-friendly buffer described in component C.
#[derive(Default)]
pub struct IntersectionBuffer {
    words: Vec<u32>,
}

impl IntersectionBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            words: Vec::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Clears the buffer for a new path, keeping the allocation.
    pub fn reset(&mut self) {
        self.words.clear();
    }

    /// Appends a record, doubling capacity as needed. Fatal once the
    /// ceiling would be exceeded.
    ///
    /// # Errors
    ///
    /// Returns [`LilacError::CapacityExhausted`] if the buffer is already
    /// at [`CEILING`].
    pub fn push(&mut self, record: Intersection) -> Result<(), LilacError> {
        require!(
            self.words.len() < CEILING,
            LilacError::CapacityExhausted(format!(
                "intersection buffer exceeded its ceiling of {CEILING} records"
            ))
        );
        if self.words.len() == self.words.capacity() {
            let doubled = (self.words.capacity() * 2).clamp(INITIAL_CAPACITY, CEILING);
            self.words.reserve(doubled - self.words.len());
        }
        self.words.push(pack(record));
        Ok(())
    }

    /// Sorts ascending as unsigned 32-bit integers (see module docs for why
    /// this is the correct ordering primitive).
    pub fn sort(&mut self) {
        self.words.sort_unstable();
    }

    pub fn iter(&self) -> impl Iterator<Item = Intersection> + '_ {
        self.words.iter().map(|&w| unpack(w))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
