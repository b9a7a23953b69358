//! Defines the Section type: the rows, columns and blocks of a board, each
//! of which must contain every numeral exactly once in a solution.

use super::Loc;
use serde::Serialize;
use std::fmt;

/// The three flavors of section.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum SectionKind {
  Row,
  Col,
  Block,
}

/// One constraint group of N cells: a row, a column, or a block.
///
/// A section is a plain id, not a view: the elimination functions take the
/// board explicitly, so a section can never address a board it doesn't
/// belong with.
#[derive(Clone, Copy, Eq, Hash, PartialEq, Serialize)]
pub struct Section<const N: usize> {
  kind: SectionKind,
  index: u8,
}

impl<const N: usize> Section<N> {
  /// How many sections an N×N board has.
  pub const COUNT: usize = 3 * N;

  /// The row with the given index, counted from the top.
  pub const fn row(index: usize) -> Self {
    Self::new(SectionKind::Row, index)
  }

  /// The column with the given index, counted from the left.
  pub const fn col(index: usize) -> Self {
    Self::new(SectionKind::Col, index)
  }

  /// The block with the given index, in row-major order.
  pub const fn block(index: usize) -> Self {
    Self::new(SectionKind::Block, index)
  }

  const fn new(kind: SectionKind, index: usize) -> Self {
    assert!(index < N, "section index out of range");
    Section {
      kind,
      index: index as u8,
    }
  }

  /// Which flavor of section this is.
  pub const fn kind(self) -> SectionKind {
    self.kind
  }

  /// This section's index among its flavor.
  pub const fn index(self) -> usize {
    self.index as usize
  }

  /// The location at the given offset within this section.  Offsets run in
  /// scan order: left to right, then top to bottom.
  pub const fn loc(self, offset: usize) -> Loc<N> {
    assert!(offset < N, "section offset out of range");
    match self.kind {
      SectionKind::Row => Loc::at(self.index as usize, offset),
      SectionKind::Col => Loc::at(offset, self.index as usize),
      SectionKind::Block => Loc::at_block(self.index as usize, offset),
    }
  }

  /// Returns a resettable cursor over this section's locations, in scan
  /// order.
  pub fn locs(self) -> Locs<N> {
    Locs {
      section: self,
      offset: 0,
    }
  }

  /// Tells whether the given location belongs to this section.
  pub fn contains(self, loc: Loc<N>) -> bool {
    match self.kind {
      SectionKind::Row => loc.row() == self.index(),
      SectionKind::Col => loc.col() == self.index(),
      SectionKind::Block => loc.block() == self.index(),
    }
  }

  /// Iterates every section: rows first, then columns, then blocks, each in
  /// index order.
  pub fn all() -> impl Iterator<Item = Self> {
    (0..N)
      .map(Self::row)
      .chain((0..N).map(Self::col))
      .chain((0..N).map(Self::block))
  }
}

/// A cursor over a section's cells.  Cloning it resets the scan.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Locs<const N: usize> {
  section: Section<N>,
  offset: usize,
}

impl<const N: usize> Iterator for Locs<N> {
  type Item = Loc<N>;
  fn next(&mut self) -> Option<Loc<N>> {
    if self.offset < N {
      let loc = self.section.loc(self.offset);
      self.offset += 1;
      Some(loc)
    } else {
      None
    }
  }
}

impl<const N: usize> fmt::Display for Section<N> {
  /// Prints this section as Rn, Cn or Bn, where n is its ordinal number.
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let tag = match self.kind {
      SectionKind::Row => 'R',
      SectionKind::Col => 'C',
      SectionKind::Block => 'B',
    };
    write!(f, "{}{}", tag, self.index() + 1)
  }
}

impl<const N: usize> fmt::Debug for Section<N> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(self, f)
  }
}
