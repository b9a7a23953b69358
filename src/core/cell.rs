//! Defines the CandidateSet type: a fixed-capacity bit-vector recording, for
//! one cell, which values are still possible, plus a flag marking the cell as
//! answered.

use super::Value;
use itertools::Itertools;
use serde::Serialize;
use static_assertions::const_assert;
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not};

/// The largest board side this crate supports.  Candidate bits 1..=N plus the
/// answer flag in bit 0 must fit the u32 backing.
pub const MAX_SIDE: usize = 25;
const_assert!(MAX_SIDE < u32::BITS as usize);

/// The set of values one cell might still take.
///
/// Bit 0 is the answer flag; bits 1 through N mean "value v is still
/// possible".  An answered cell holds exactly one candidate bit, its answer,
/// and the solver treats any single-candidate cell as decided.
///
/// The same type serves as the plain value-mask the elimination engine passes
/// around; the bit operators work over the value bits only and never produce
/// the answer flag.
#[derive(Clone, Copy, Eq, Hash, PartialEq, Serialize)]
pub struct CandidateSet<const N: usize>(u32);

impl<const N: usize> CandidateSet<N> {
  const ANSWER_BIT: u32 = 1;

  /// The set for a cell about which nothing is known: every value possible,
  /// not answered.
  pub const FULL: Self = {
    assert!(N >= 1 && N <= MAX_SIDE, "board side out of range");
    CandidateSet(((1u32 << N) - 1) << 1)
  };

  /// The set with no candidates at all.  Only meaningful as a mask; a cell
  /// must never be left in this state.
  pub const EMPTY: Self = CandidateSet(0);

  const fn bit(value: u8) -> u32 {
    1 << value
  }

  /// Makes a mask holding just the given value.
  pub fn singleton(value: Value<N>) -> Self {
    CandidateSet(Self::bit(value.get()))
  }

  /// Makes the set for a cell whose value is known from the start.
  pub fn answered(value: Value<N>) -> Self {
    CandidateSet(Self::bit(value.get()) | Self::ANSWER_BIT)
  }

  /// Tells whether the given value is still a candidate.
  pub fn test(self, value: Value<N>) -> bool {
    self.0 & Self::bit(value.get()) != 0
  }

  /// Adds a value to the set.  Tells whether it was previously absent.
  pub fn set(&mut self, value: Value<N>) -> bool {
    let bit = Self::bit(value.get());
    let absent = self.0 & bit == 0;
    self.0 |= bit;
    absent
  }

  /// Removes a value from the set.  Tells whether it was present.
  ///
  /// Clearing the last remaining candidate is a contract violation: callers
  /// must check `count()` first, or treat an imminent zero as a dead search
  /// branch instead of calling this.
  pub fn clear(&mut self, value: Value<N>) -> bool {
    let bit = Self::bit(value.get());
    if self.0 & bit == 0 {
      return false;
    }
    assert!(self.count() > 1, "clearing the last candidate of a cell");
    self.0 &= !bit;
    true
  }

  /// Collapses the cell to the given value and marks it answered.
  ///
  /// The value must currently be a candidate; anything else is a contract
  /// violation.
  pub fn clear_to_single(&mut self, value: Value<N>) {
    assert!(self.test(value), "collapsing a cell to a value it cannot hold");
    self.0 = Self::bit(value.get()) | Self::ANSWER_BIT;
  }

  /// The number of candidate values, the answer flag not counted.
  pub fn count(self) -> u32 {
    (self.0 & Self::FULL.0).count_ones()
  }

  /// The number of `1` bits, the answer flag included.
  pub fn count_all(self) -> u32 {
    self.0.count_ones()
  }

  /// Whether no candidates remain.
  pub fn is_empty(self) -> bool {
    self.0 & Self::FULL.0 == 0
  }

  /// Whether the cell has been marked answered.
  pub fn is_answer(self) -> bool {
    self.0 & Self::ANSWER_BIT != 0
  }

  /// The cell's answer, when it has one.
  pub fn answer(self) -> Option<Value<N>> {
    if self.is_answer() {
      self.smallest()
    } else {
      None
    }
  }

  /// Whether every value is still possible.
  pub fn all(self) -> bool {
    self.0 & Self::FULL.0 == Self::FULL.0
  }

  /// The smallest candidate value, or None when the set is empty.
  pub fn smallest(self) -> Option<Value<N>> {
    let bits = self.0 & Self::FULL.0;
    if bits == 0 {
      None
    } else {
      Value::new(bits.trailing_zeros() as u8)
    }
  }

  /// Iterates the candidate values in ascending order.
  pub fn values(self) -> Values<N> {
    Values(self.0 & Self::FULL.0)
  }
}

impl<const N: usize> Default for CandidateSet<N> {
  fn default() -> Self {
    Self::FULL
  }
}

impl<const N: usize> FromIterator<Value<N>> for CandidateSet<N> {
  fn from_iter<I: IntoIterator<Item = Value<N>>>(iter: I) -> Self {
    let mut set = Self::EMPTY;
    for value in iter {
      set.set(value);
    }
    set
  }
}

/// Iterates through the values of a CandidateSet, smallest first.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Values<const N: usize>(u32);

impl<const N: usize> Iterator for Values<N> {
  type Item = Value<N>;
  fn next(&mut self) -> Option<Value<N>> {
    if self.0 == 0 {
      return None;
    }
    let value = self.0.trailing_zeros() as u8;
    self.0 &= self.0 - 1;
    Value::new(value)
  }
}

impl<const N: usize> BitAnd for CandidateSet<N> {
  type Output = Self;
  fn bitand(self, rhs: Self) -> Self {
    CandidateSet(self.0 & rhs.0)
  }
}
impl<const N: usize> BitAndAssign for CandidateSet<N> {
  fn bitand_assign(&mut self, rhs: Self) {
    self.0 &= rhs.0
  }
}
impl<const N: usize> BitOr for CandidateSet<N> {
  type Output = Self;
  fn bitor(self, rhs: Self) -> Self {
    CandidateSet(self.0 | rhs.0)
  }
}
impl<const N: usize> BitOrAssign for CandidateSet<N> {
  fn bitor_assign(&mut self, rhs: Self) {
    self.0 |= rhs.0
  }
}
impl<const N: usize> BitXor for CandidateSet<N> {
  type Output = Self;
  fn bitxor(self, rhs: Self) -> Self {
    CandidateSet(self.0 ^ rhs.0)
  }
}
impl<const N: usize> BitXorAssign for CandidateSet<N> {
  fn bitxor_assign(&mut self, rhs: Self) {
    self.0 ^= rhs.0
  }
}
impl<const N: usize> Not for CandidateSet<N> {
  type Output = Self;
  /// Complements the value bits; the answer flag never survives `!`.
  fn not(self) -> Self {
    CandidateSet(!self.0 & Self::FULL.0)
  }
}

impl<const N: usize> fmt::Debug for CandidateSet<N> {
  /// Prints `{=v}` for an answered cell, `{v w ...}` otherwise.
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.answer() {
      Some(value) => write!(f, "{{={}}}", value),
      None => write!(f, "{{{}}}", self.values().map(|v| v.get().to_string()).join(" ")),
    }
  }
}
