//! The elimination rules: everything the engine deduces without guessing.
//!
//! Every operation reports the number of candidate bits it actually removed,
//! `Ok(0)` meaning no-op, and `Err(Contradiction)` meaning some cell was
//! driven to zero candidates, so the board admits no solution along this
//! path.
//! All operations tolerate redundant invocation: running them again over the
//! same board removes nothing and corrupts nothing.

use derive_more::{Display, Error};
use itertools::Itertools;
use log::trace;

use crate::core::*;

/// The error the direct mutation API reports.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum SetValueError {
  /// The value is not currently a candidate at the location.
  #[display("the value is not a candidate at that location")]
  NotACandidate,

  /// Following the assignment's consequences emptied some cell.
  #[display("the assignment leaves a cell with no candidates")]
  Inconsistent,
}

impl From<Contradiction> for SetValueError {
  fn from(_: Contradiction) -> Self {
    SetValueError::Inconsistent
  }
}

/// Removes `value` as a candidate at `loc`, following every consequence.
///
/// A no-op when the cell is already answered with a different value, or when
/// the value wasn't a candidate.  Removing an answered cell's own value, or
/// a lone remaining candidate, is a contradiction.
///
/// When a removal leaves a cell with exactly one candidate, that cell is
/// promoted to answered and the value is in turn removed from all of its
/// peers.  The cascade runs on an explicit worklist, and it terminates
/// because each (cell, value) bit can be cleared at most once.
pub fn remove_option<const N: usize>(
  board: &mut Board<N>,
  loc: Loc<N>,
  value: Value<N>,
) -> Result<u32, Contradiction> {
  let mut worklist = vec![(loc, value)];
  drain_removals(board, &mut worklist)
}

/// Runs removals from a worklist until none remain, enqueueing the peer
/// removals implied whenever a cell collapses to a single candidate.
fn drain_removals<const N: usize>(
  board: &mut Board<N>,
  worklist: &mut Vec<(Loc<N>, Value<N>)>,
) -> Result<u32, Contradiction> {
  let mut removed = 0;
  while let Some((loc, value)) = worklist.pop() {
    let cell = board[loc];
    if let Some(answer) = cell.answer() {
      if answer == value {
        // Some peer claimed this cell's own answer.
        return Err(Contradiction);
      }
      continue;
    }
    if !cell.test(value) {
      continue;
    }
    if cell.count() == 1 {
      return Err(Contradiction);
    }
    board[loc].clear(value);
    removed += 1;
    let cell = board[loc];
    if cell.count() == 1 {
      if let Some(answer) = cell.smallest() {
        board[loc].clear_to_single(answer);
        for peer in loc.peers() {
          worklist.push((peer, answer));
        }
      }
    }
  }
  Ok(removed)
}

/// Removes `value` from every cell of `section` except the `ignore`
/// locations, for when the value has just been fixed at those locations.
///
/// Contract: every ignore location holds `value` as its answer, and at
/// least one ignore location belongs to the section.
pub fn remove_option_section<const N: usize>(
  board: &mut Board<N>,
  section: Section<N>,
  ignore: &[Loc<N>],
  value: Value<N>,
) -> Result<u32, Contradiction> {
  assert!(
    ignore.iter().any(|&loc| section.contains(loc)),
    "no ignore location belongs to the section"
  );
  for &loc in ignore {
    assert!(
      board[loc].answer() == Some(value),
      "ignore location does not hold the value as its answer"
    );
  }
  let mut removed = 0;
  for loc in section.locs() {
    if !ignore.contains(&loc) {
      removed += remove_option(board, loc, value)?;
    }
  }
  Ok(removed)
}

/// Removes `value` from the cells of a line section that fall outside the
/// block containing `anchor`, for when the value is confined to the line's
/// overlap with that block.
///
/// Contract: the section is a row or column, and it intersects the anchor's
/// block.
pub fn remove_option_outside_block<const N: usize>(
  board: &mut Board<N>,
  section: Section<N>,
  anchor: Loc<N>,
  value: Value<N>,
) -> Result<u32, Contradiction> {
  let b = Loc::<N>::BLOCK;
  let intersects = match section.kind() {
    SectionKind::Row => section.index() / b == anchor.row() / b,
    SectionKind::Col => section.index() / b == anchor.col() / b,
    SectionKind::Block => panic!("outside-block elimination needs a row or column section"),
  };
  assert!(intersects, "the section does not intersect the anchor's block");
  let mut removed = 0;
  for loc in section.locs() {
    if loc.block() != anchor.block() {
      removed += remove_option(board, loc, value)?;
    }
  }
  Ok(removed)
}

/// The locked-candidates rule.  For each value of `candidate_mask` that
/// occupies exactly `rep_count` cells of `section`:
///
/// - when the section is a row or column and those cells share one block,
///   the value is removed from the rest of that block;
/// - when the section is a block and those cells share one row or column,
///   the value is removed from the rest of that line.
///
/// Values that don't match either shape are skipped, so feeding a whole
/// appearance layer here is fine.
///
/// Contract: `rep_count` is in `2..=N-1`.
pub fn set_section_locals<const N: usize>(
  board: &mut Board<N>,
  section: Section<N>,
  rep_count: usize,
  candidate_mask: CandidateSet<N>,
) -> Result<u32, Contradiction> {
  assert!(
    rep_count >= 2 && rep_count <= N - 1,
    "repetition count out of range"
  );
  let mut removed = 0;
  for value in candidate_mask.values() {
    let cells = section
      .locs()
      .filter(|&loc| board[loc].test(value))
      .collect_vec();
    if cells.len() != rep_count {
      continue;
    }
    match section.kind() {
      SectionKind::Row | SectionKind::Col => {
        let block = cells[0].block();
        if cells.iter().all(|loc| loc.block() == block) {
          for loc in Section::block(block).locs() {
            if !section.contains(loc) {
              removed += remove_option(board, loc, value)?;
            }
          }
        }
      }
      SectionKind::Block => {
        let row = cells[0].row();
        if cells.iter().all(|loc| loc.row() == row) {
          removed += remove_option_outside_block(board, Section::row(row), cells[0], value)?;
        }
        let col = cells[0].col();
        if cells.iter().all(|loc| loc.col() == col) {
          removed += remove_option_outside_block(board, Section::col(col), cells[0], value)?;
        }
      }
    }
  }
  Ok(removed)
}

/// The values that have exactly one possible cell in `section`.
pub fn appearance_once<const N: usize>(board: &Board<N>, section: Section<N>) -> CandidateSet<N> {
  let mut once = CandidateSet::EMPTY;
  let mut more = CandidateSet::EMPTY;
  for loc in section.locs() {
    let cands = board[loc] & CandidateSet::FULL;
    more |= once & cands;
    once |= cands;
  }
  once & !more
}

/// Layered appearance masks: element `k - 1` holds the values that have
/// exactly `k` possible cells in `section`, for `k` in `1..=max_reps`.
///
/// The first layer feeds `set_uniques`; the deeper layers feed
/// `set_section_locals`.
pub fn appearance_sets<const N: usize>(
  board: &Board<N>,
  section: Section<N>,
  max_reps: usize,
) -> Vec<CandidateSet<N>> {
  assert!(max_reps >= 1 && max_reps <= N, "layer count out of range");
  // mins[k] accumulates the values seen in more than k cells so far.
  let mut mins = vec![CandidateSet::<N>::EMPTY; max_reps + 1];
  for loc in section.locs() {
    let cands = board[loc] & CandidateSet::FULL;
    for k in (1..=max_reps).rev() {
      let carried = mins[k - 1] & cands;
      mins[k] |= carried;
    }
    mins[0] |= cands;
  }
  (1..=max_reps).map(|k| mins[k - 1] & !mins[k]).collect()
}

/// Answers each value of `candidate_mask` at its unique possible cell in
/// `section` and follows the consequences.  Meant to be fed the first
/// appearance layer; a masked value with no cell left is a contradiction.
pub fn set_uniques<const N: usize>(
  board: &mut Board<N>,
  section: Section<N>,
  candidate_mask: CandidateSet<N>,
) -> Result<u32, Contradiction> {
  let mut removed = 0;
  for value in candidate_mask.values() {
    let Some(loc) = section.locs().find(|&loc| board[loc].test(value)) else {
      return Err(Contradiction);
    };
    removed += assign(board, loc, value)?;
  }
  Ok(removed)
}

/// Direct mutation: answers `loc` with `value` and follows the
/// consequences.
///
/// Unlike the search path, problems here are reported to the caller: a
/// value that isn't currently a candidate (including a second, different
/// answer for an answered cell) is `NotACandidate`, and a cascade that
/// empties some cell is `Inconsistent`.
pub fn set_value<const N: usize>(
  board: &mut Board<N>,
  loc: Loc<N>,
  value: Value<N>,
) -> Result<u32, SetValueError> {
  if !board[loc].test(value) {
    return Err(SetValueError::NotACandidate);
  }
  Ok(assign(board, loc, value)?)
}

/// Answers `loc` with `value` and removes the value from every peer.
fn assign<const N: usize>(
  board: &mut Board<N>,
  loc: Loc<N>,
  value: Value<N>,
) -> Result<u32, Contradiction> {
  let cell = board[loc];
  if let Some(answer) = cell.answer() {
    return if answer == value {
      Ok(0)
    } else {
      Err(Contradiction)
    };
  }
  if !cell.test(value) {
    return Err(Contradiction);
  }
  let removed = cell.count() - 1;
  board[loc].clear_to_single(value);
  let mut worklist = loc.peers().map(|peer| (peer, value)).collect_vec();
  Ok(removed + drain_removals(board, &mut worklist)?)
}

/// Pushes every answered cell's value through its row, column and block.
/// Boards built from givens start life unpropagated; the search driver runs
/// this once before settling into the rule loop.
pub fn propagate_givens<const N: usize>(board: &mut Board<N>) -> Result<u32, Contradiction> {
  let mut removed = 0;
  for loc in Loc::all() {
    if let Some(value) = board[loc].answer() {
      for section in loc.sections() {
        removed += remove_option_section(board, section, &[loc], value)?;
      }
    }
  }
  Ok(removed)
}

/// Runs the whole rule set section by section, over and over, until a full
/// pass removes nothing, and returns the total number of candidates
/// removed.  Calling it again right away is a no-op reporting zero.
pub fn saturate<const N: usize>(board: &mut Board<N>) -> Result<u32, Contradiction> {
  let max_reps = Loc::<N>::BLOCK;
  let mut total = 0;
  loop {
    let mut pass = 0;
    for section in Section::all() {
      let layers = appearance_sets(board, section, max_reps);
      pass += set_uniques(board, section, layers[0])?;
      for (i, &mask) in layers.iter().enumerate().skip(1) {
        pass += set_section_locals(board, section, i + 1, mask)?;
      }
    }
    total += pass;
    if pass == 0 {
      trace!("fixed point after removing {total} candidates");
      return Ok(total);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::str::FromStr;

  fn v4(v: u8) -> Value<4> {
    Value::new(v).unwrap()
  }

  fn v9(v: u8) -> Value<9> {
    Value::new(v).unwrap()
  }

  // Row 1 given, (2,1) = 3, (3,1) = 2; three completions exist.
  const THREE_WAY: &str = "1234 3... 2... ....";

  #[test]
  fn remove_option_counts_and_cascades() {
    let mut board = Board::<4>::new();
    // Stripping 1, 2 and 3 from a full cell forces the 4 and ripples it
    // across the cell's peers.
    let loc = Loc::at(0, 0);
    assert_eq!(Ok(1), remove_option(&mut board, loc, v4(1)));
    assert_eq!(Ok(1), remove_option(&mut board, loc, v4(2)));
    assert_eq!(Ok(0), remove_option(&mut board, loc, v4(2)));
    let removed = remove_option(&mut board, loc, v4(3)).unwrap();
    assert!(removed >= 1 + 6);
    assert_eq!(Some(v4(4)), board[loc].answer());
    for peer in loc.peers() {
      assert!(!board[peer].test(v4(4)));
    }
  }

  #[test]
  fn remove_option_ignores_answered_cells() {
    let mut board = Board::<4>::from_values(&[4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0])
      .unwrap();
    let loc = Loc::at(0, 0);
    let before = board;
    assert_eq!(Ok(0), remove_option(&mut board, loc, v4(1)));
    assert_eq!(before, board);
  }

  #[test]
  fn removing_an_answer_is_a_contradiction() {
    let mut board = Board::<4>::from_values(&[4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0])
      .unwrap();
    assert_eq!(
      Err(Contradiction),
      remove_option(&mut board, Loc::at(0, 0), v4(4))
    );
  }

  #[test]
  fn remove_option_section_spares_the_ignored() {
    let mut board = Board::<4>::from_values(&[0, 0, 3, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0])
      .unwrap();
    let row = Section::row(0);
    let anchor = Loc::at(0, 2);
    let removed = remove_option_section(&mut board, row, &[anchor], v4(3)).unwrap();
    assert!(removed >= 3);
    assert_eq!(Some(v4(3)), board[anchor].answer());
    for loc in row.locs() {
      if loc != anchor {
        assert!(!board[loc].test(v4(3)));
      }
    }
  }

  #[test]
  #[should_panic(expected = "does not hold the value")]
  fn remove_option_section_checks_the_ignore_list() {
    let mut board = Board::<4>::new();
    let _ = remove_option_section(&mut board, Section::row(0), &[Loc::at(0, 0)], v4(1));
  }

  #[test]
  #[should_panic(expected = "no ignore location belongs")]
  fn remove_option_section_checks_membership() {
    let mut board = Board::<4>::from_values(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3])
      .unwrap();
    let _ = remove_option_section(&mut board, Section::row(0), &[Loc::at(3, 3)], v4(3));
  }

  #[test]
  fn outside_block_removal() {
    let mut board = Board::<9>::new();
    // Pretend 5 is confined to row 1's overlap with block 1.
    let removed =
      remove_option_outside_block(&mut board, Section::row(0), Loc::at(0, 1), v9(5)).unwrap();
    assert_eq!(6, removed);
    for loc in Section::<9>::row(0).locs() {
      assert_eq!(loc.block() == 0, board[loc].test(v9(5)));
    }
  }

  #[test]
  #[should_panic(expected = "does not intersect")]
  fn outside_block_requires_intersection() {
    let mut board = Board::<9>::new();
    let _ = remove_option_outside_block(&mut board, Section::row(8), Loc::at(0, 1), v9(5));
  }

  #[test]
  #[should_panic(expected = "needs a row or column")]
  fn outside_block_rejects_block_sections() {
    let mut board = Board::<9>::new();
    let _ = remove_option_outside_block(&mut board, Section::block(0), Loc::at(0, 1), v9(5));
  }

  #[test]
  fn appearance_layers() {
    let mut board = Board::<4>::from_str(THREE_WAY).unwrap();
    propagate_givens(&mut board).unwrap();

    // Column 2 is now {=2}, {=4}, {1 3}, {1 3}: the answered values appear
    // once, the open values twice.
    let col = Section::col(1);
    let once = appearance_once(&board, col);
    assert_eq!([v4(2), v4(4)].into_iter().collect::<CandidateSet<4>>(), once);

    let layers = appearance_sets(&board, col, 2);
    assert_eq!(2, layers.len());
    assert_eq!(layers[0], once);
    assert_eq!([v4(1), v4(3)].into_iter().collect::<CandidateSet<4>>(), layers[1]);
  }

  #[test]
  fn set_uniques_assigns_the_unique_cell() {
    // 5 keeps all nine cells of row 1 except one; nothing else is scarce.
    let mut board = Board::<9>::new();
    let row = Section::<9>::row(0);
    for loc in row.locs() {
      if loc.col() != 4 {
        board[loc].clear(v9(5));
      }
    }
    let once = appearance_once(&board, row);
    assert_eq!(CandidateSet::singleton(v9(5)), once);

    let removed = set_uniques(&mut board, row, once).unwrap();
    assert!(removed >= 8);
    assert_eq!(Some(v9(5)), board[Loc::at(0, 4)].answer());
    for peer in Loc::<9>::at(0, 4).peers() {
      assert!(!board[peer].test(v9(5)));
    }
  }

  #[test]
  #[should_panic(expected = "repetition count out of range")]
  fn locals_reject_rep_count_low() {
    let mut board = Board::<4>::new();
    let _ = set_section_locals(&mut board, Section::row(0), 1, CandidateSet::FULL);
  }

  #[test]
  #[should_panic(expected = "repetition count out of range")]
  fn locals_reject_rep_count_high() {
    let mut board = Board::<9>::new();
    let _ = set_section_locals(&mut board, Section::row(0), 9, CandidateSet::FULL);
  }

  #[test]
  fn locals_claim_a_block() {
    // 7 in row 1 is confined to the first block: cells (1,1) and (1,2) after
    // the third block-1 column cell takes 9 and the rest of the row loses 7.
    let mut board = Board::<9>::new();
    let row = Section::<9>::row(0);
    for loc in row.locs() {
      if loc.col() >= 2 {
        board[loc].clear(v9(7));
      }
    }
    board[Loc::at(0, 2)] = CandidateSet::answered(v9(9));
    let removed = set_section_locals(&mut board, row, 2, CandidateSet::singleton(v9(7))).unwrap();
    // Block 1 has six cells outside row 1; all lose their 7.
    assert_eq!(6, removed);
    for loc in Section::<9>::block(0).locs() {
      assert_eq!(loc.row() == 0 && loc.col() < 2, board[loc].test(v9(7)));
    }
  }

  #[test]
  fn locals_point_out_of_a_block() {
    // 2 in block 1 is confined to row 2.
    let mut board = Board::<9>::new();
    let block = Section::<9>::block(0);
    for loc in block.locs() {
      if loc.row() != 1 {
        board[loc].clear(v9(2));
      }
    }
    let removed =
      set_section_locals(&mut board, block, 3, CandidateSet::singleton(v9(2))).unwrap();
    // Row 2 has six cells outside block 1; all lose their 2.
    assert_eq!(6, removed);
    for loc in Section::<9>::row(1).locs() {
      assert_eq!(loc.block() == 0, board[loc].test(v9(2)));
    }
  }

  #[test]
  fn set_value_reports_logic_errors() {
    let mut board = Board::<4>::from_str(THREE_WAY).unwrap();
    propagate_givens(&mut board).unwrap();
    // (1,1) is answered 1; a different answer is refused.
    assert_eq!(
      Err(SetValueError::NotACandidate),
      set_value(&mut board, Loc::at(0, 0), v4(2))
    );
    // Re-asserting the same answer is a no-op.
    assert_eq!(Ok(0), set_value(&mut board, Loc::at(0, 0), v4(1)));
    // (4,1) was forced to 4 by its column; a 3 there is no longer possible.
    assert_eq!(
      Err(SetValueError::NotACandidate),
      set_value(&mut board, Loc::at(3, 0), v4(3))
    );
  }

  #[test]
  fn saturation_reaches_a_fixed_point() {
    let mut board = Board::<4>::from_str(THREE_WAY).unwrap();
    propagate_givens(&mut board).unwrap();
    saturate(&mut board).unwrap();

    // The hidden single: 4 is the only value left for (3,3).
    assert_eq!(Some(v4(4)), board[Loc::at(2, 2)].answer());
    // Column 1 finishes, the ambiguous cells don't.
    assert_eq!(Some(v4(4)), board[Loc::at(3, 0)].answer());
    assert_eq!(2, board[Loc::at(1, 2)].count());
    assert_eq!(8, board.count_options());

    // Idempotence: an immediate second run removes nothing.
    assert_eq!(Ok(0), saturate(&mut board));
    assert_eq!(8, board.count_options());
  }

  #[test]
  fn saturation_can_finish_a_puzzle() {
    // A puzzle that settles completely without branching.
    let mut board = Board::<9>::from_str(
      r"
            . . 1 | . . . | . . 8
            . . . | . 5 7 | . 3 .
            . . . | . . 4 | 9 . .
            - - - + - - - + - - -
            . . . | 5 1 9 | . . .
            . 2 . | 3 . . | . . .
            . 7 6 | 2 . . | . . .
            - - - + - - - + - - -
            . . 3 | . . . | . 4 .
            . 6 4 | . . . | 5 . 1
            8 . . | . . . | . 9 6",
    )
    .unwrap();
    propagate_givens(&mut board).unwrap();
    saturate(&mut board).unwrap();
    assert_eq!(0, board.count_options());
    assert!(board.solved().is_some());
  }

  #[test]
  fn contradictions_surface_during_propagation() {
    // 1 and 2 answered in row 1, and 3 and 4 blocked from its first cell:
    // that cell has nowhere to go.
    let mut board = Board::<4>::from_values(&[0, 0, 1, 2, 0, 0, 0, 0, 3, 0, 0, 0, 4, 0, 0, 0])
      .unwrap();
    let result = propagate_givens(&mut board).and_then(|_| saturate(&mut board));
    assert_eq!(Err(Contradiction), result);
  }
}
