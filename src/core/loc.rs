//! Defines the Loc type, which identifies the locations (or cells) of a
//! board.

use super::Section;
use serde::Serialize;
use std::fmt;

/// Identifies one of the N² locations in an N×N board.
///
/// Boards are represented as length-N² arrays in row-major order.  `Loc(0)`
/// is the top left cell of the board, and `Loc(N²-1)` is the bottom right.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Loc<const N: usize>(u16);

impl<const N: usize> Loc<N> {
  /// How many distinct locations there are.
  pub const COUNT: usize = N * N;

  /// The number of cells along a block's edge.  Evaluating this rejects any
  /// N that is not a perfect square.
  pub const BLOCK: usize = block_edge(N);

  /// Makes a new `Loc` given its ID, which the caller must ensure is in the
  /// range 0..N².
  ///
  /// # Safety
  ///
  /// Callers must ensure the argument is in range.
  pub const unsafe fn new_unchecked(id: u16) -> Self {
    Loc(id)
  }

  /// Makes a new `Loc` given its ID, if it's in the range 0..N².
  pub const fn new(id: u16) -> Option<Self> {
    if (id as usize) < Self::COUNT {
      Some(Loc(id))
    } else {
      None
    }
  }

  /// Makes a new `Loc` given a linear index, if it's in the range 0..N².
  pub const fn from_index(i: usize) -> Option<Self> {
    if i < Self::COUNT {
      Some(Loc(i as u16))
    } else {
      None
    }
  }

  /// Converts from row/col to Loc.  Both coordinates must be in 0..N.
  pub const fn at(row: usize, col: usize) -> Self {
    assert!(row < N && col < N, "location out of range");
    Loc((row * N + col) as u16)
  }

  /// Converts from block and offset-within-block to Loc.  Blocks and their
  /// offsets both run in row-major order.
  pub const fn at_block(block: usize, offset: usize) -> Self {
    assert!(block < N && offset < N, "block location out of range");
    let b = Self::BLOCK;
    Self::at(block / b * b + offset / b, block % b * b + offset % b)
  }

  /// Returns this location's ID.
  pub const fn get(self) -> u16 {
    self.0
  }

  /// Returns this location's ID in a form suitable for use as an array
  /// index.
  pub const fn index(self) -> usize {
    self.0 as usize
  }

  /// This location's row.
  pub const fn row(self) -> usize {
    self.0 as usize / N
  }

  /// This location's column.
  pub const fn col(self) -> usize {
    self.0 as usize % N
  }

  /// This location's block, numbered in row-major order.
  pub const fn block(self) -> usize {
    let b = Self::BLOCK;
    self.row() / b * b + self.col() / b
  }

  /// This location's position within its block, in row-major order.
  pub const fn block_offset(self) -> usize {
    let b = Self::BLOCK;
    self.row() % b * b + self.col() % b
  }

  /// Iterates all distinct locations in scan order.
  pub fn all() -> impl Iterator<Item = Self> {
    (0..Self::COUNT).map(|i| unsafe {
      // Safe because i ranges over 0..N².
      Self::new_unchecked(i as u16)
    })
  }

  /// The three sections through this location: its row, its column, and its
  /// block.
  pub fn sections(self) -> [Section<N>; 3] {
    [
      Section::row(self.row()),
      Section::col(self.col()),
      Section::block(self.block()),
    ]
  }

  /// Iterates this location's peers: the other cells that share its row,
  /// column, or block.  Every peer appears exactly once, and this location
  /// itself is not included.
  pub fn peers(self) -> impl Iterator<Item = Loc<N>> {
    let row = Section::row(self.row())
      .locs()
      .filter(move |loc| loc.col() != self.col());
    let col = Section::col(self.col())
      .locs()
      .filter(move |loc| loc.row() != self.row());
    let blk = Section::block(self.block())
      .locs()
      .filter(move |loc| loc.row() != self.row() && loc.col() != self.col());
    row.chain(col).chain(blk)
  }
}

/// The integer square root of a supported board side.
const fn block_edge(n: usize) -> usize {
  let mut b = 1;
  while b * b < n {
    b += 1;
  }
  assert!(b * b == n, "board side must be a perfect square");
  b
}

impl<const N: usize> fmt::Display for Loc<N> {
  /// Prints this location as (r, c), where r and c are the ordinal numbers
  /// of the location's row and column.
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({}, {})", self.row() + 1, self.col() + 1)
  }
}

impl<const N: usize> fmt::Debug for Loc<N> {
  /// Prints this location as Lrc, where r and c are the ordinal numbers of
  /// the location's row and column.
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "L{}{}", self.row() + 1, self.col() + 1)
  }
}
