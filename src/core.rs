//! Defines the core board types.
//!
//! Among these are:
//!
//! - Board: the N×N grid of candidate sets
//! - CandidateSet: the per-cell record of still-possible values
//! - Value: the N numerals that go in the board's cells
//! - Loc: the N² locations of the board
//! - Section: the rows, columns and blocks that must each hold every numeral

mod board;
mod cell;
mod loc;
mod section;
mod value;

pub use board::*;
pub use cell::*;
pub use loc::*;
pub use section::*;
pub use value::*;

use derive_more::{Display, Error};
use paste::paste;

/// Marker error for a cell that has been stripped of its last candidate.
///
/// During search this is not a failure of the engine: it means the branch
/// being explored admits no solution and must be abandoned.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
#[display("a cell was left with no candidates")]
pub struct Contradiction;

/// Defines size aliases for the common board shapes.
macro_rules! define_size_aliases {
  ($($n:literal),*) => {
    paste! {
      $(
        #[doc = concat!("A ", stringify!($n), "×", stringify!($n), " board.")]
        pub type [<Board $n>] = Board<$n>;
      )*
    }
  };
}

define_size_aliases!(4, 9, 16, 25);
