//! Defines the Multipass search driver, which runs the elimination engine to
//! a fixed point and then explores whatever ambiguity remains, collecting
//! every completion of the starting board up to a cap.

use log::{debug, trace};
use rand::Rng;

use crate::core::*;

pub mod eliminate;

use eliminate::*;

/// The solutions a search collected, in discovery order.
#[derive(Clone, Debug)]
pub struct SolutionSet<const N: usize> {
  /// Every solution found, at most the search's `max_answers`.
  pub solutions: Vec<SolvedBoard<N>>,

  /// Whether the search stopped at the cap with branches still unexplored.
  /// More solutions may exist when this is set; when it's clear, the list is
  /// the complete set of completions.
  pub capped: bool,

  /// Search effort counters.
  pub stats: SearchStats,
}

/// Counters describing how much work a search did.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SearchStats {
  /// How many branch values were tried.
  pub branches: u32,

  /// The deepest the branch stack grew.
  pub max_depth: u32,
}

/// Chooses where the search branches next.
pub trait BranchPolicy<const N: usize> {
  /// Picks a location to branch on.  Only called on boards that still have
  /// at least one unanswered cell.
  fn choose_branch_loc(&mut self, board: &Board<N>) -> Loc<N>;

  /// Optionally reorders the values about to be explored.  They arrive in
  /// descending order.
  fn order_branch_values(&mut self, _values: &mut [Option<Value<N>>]) {}
}

/// The deterministic default policy: the unanswered cell with the fewest
/// remaining candidates, lowest location on ties.
pub struct DefaultPolicy;

impl<const N: usize> BranchPolicy<N> for DefaultPolicy {
  fn choose_branch_loc(&mut self, board: &Board<N>) -> Loc<N> {
    Loc::all()
      .filter(|&loc| !board[loc].is_answer())
      .min_by_key(|&loc| board[loc].count())
      // Safe because this is never called on a finished board.
      .unwrap()
  }
}

/// Branches on a cell chosen uniformly at random among the unanswered ones.
/// Enumeration order then depends on the generator; the solutions themselves
/// and the cap behavior do not.
pub struct RandomPolicy<'a, R: Rng>(pub &'a mut R);

impl<'a, R: Rng, const N: usize> BranchPolicy<N> for RandomPolicy<'a, R> {
  fn choose_branch_loc(&mut self, board: &Board<N>) -> Loc<N> {
    let open: Vec<Loc<N>> = Loc::all().filter(|&loc| !board[loc].is_answer()).collect();
    // Safe because this is never called on a finished board.
    open[self.0.random_range(0..open.len())]
  }
}

/// The search driver.
///
/// Propagates the starting board to a fixed point, then branches: picks an
/// unanswered cell, tries each of its candidates on a copied board, and
/// propagates again, backtracking on contradiction.  Fully-answered boards
/// are snapshotted into the solution list until `max_answers` of them have
/// been collected.
pub struct Multipass<const N: usize> {
  board: Board<N>,
  max_answers: usize,
}

impl<const N: usize> Multipass<N> {
  /// Makes a driver over an already-built board.
  pub fn new(board: Board<N>, max_answers: usize) -> Self {
    Multipass { board, max_answers }
  }

  /// Makes a driver from one value per cell in scan order, `0` meaning
  /// unknown.  Malformed input surfaces here, as a `BoardError`; an
  /// unsolvable board is not malformed, it just has no completions.
  pub fn from_values(values: &[u8], max_answers: usize) -> Result<Self, BoardError> {
    Ok(Self::new(Board::from_values(values)?, max_answers))
  }

  /// The starting board.
  pub fn board(&self) -> &Board<N> {
    &self.board
  }

  /// Runs the search with the default policy.
  pub fn solutions(&self) -> SolutionSet<N> {
    self.run(&mut DefaultPolicy)
  }

  /// Runs the search with the given branch policy.
  ///
  /// The search is depth-first over an explicit stack of copied boards.  At
  /// each branch the candidate values are tried largest first (unless the
  /// policy reorders them), which is what fixes the order solutions appear
  /// in.
  pub fn run(&self, policy: &mut dyn BranchPolicy<N>) -> SolutionSet<N> {
    let mut out = SolutionSet {
      solutions: Vec::new(),
      capped: false,
      stats: SearchStats::default(),
    };
    let mut board = self.board;
    if propagate_givens(&mut board)
      .and_then(|_| saturate(&mut board))
      .is_err()
    {
      return out;
    }
    if let Some(solution) = board.solved() {
      if self.max_answers > 0 {
        out.solutions.push(solution);
      } else {
        out.capped = true;
      }
      return out;
    }

    let mut stack: Vec<Frame<N>> = Vec::with_capacity(16);
    stack.push(Frame::new(board, policy));
    out.stats.max_depth = 1;
    loop {
      if out.solutions.len() >= self.max_answers {
        out.capped = !stack.is_empty();
        if out.capped {
          debug!("stopping at the cap of {} solutions", self.max_answers);
        }
        break;
      }
      let depth = stack.len() as u32;
      let Some(frame) = stack.last_mut() else {
        break;
      };
      out.stats.branches += 1;
      let loc = frame.loc;
      let (value, last) = frame.next_value();
      trace!("trying {value:?} at {loc:?}, depth {depth}");
      if last {
        // The final value gets the frame's own board; nothing will come
        // back for it.
        match apply(&mut frame.board, loc, value) {
          Err(Contradiction) => {
            stack.pop();
          }
          Ok(()) => {
            if let Some(solution) = frame.board.solved() {
              debug!("solution {} found", out.solutions.len() + 1);
              out.solutions.push(solution);
              stack.pop();
            } else {
              frame.repivot(policy);
            }
          }
        }
      } else {
        let mut board = frame.board;
        match apply(&mut board, loc, value) {
          Err(Contradiction) => {}
          Ok(()) => {
            if let Some(solution) = board.solved() {
              debug!("solution {} found", out.solutions.len() + 1);
              out.solutions.push(solution);
            } else {
              stack.push(Frame::new(board, policy));
              out.stats.max_depth = out.stats.max_depth.max(depth + 1);
            }
          }
        }
      }
    }
    out
  }
}

/// Solves the given board, collecting at most `max_answers` completions in
/// the default deterministic order.
pub fn solve<const N: usize>(board: &Board<N>, max_answers: usize) -> SolutionSet<N> {
  Multipass::new(*board, max_answers).solutions()
}

/// Assigns a branch value and settles the board.
fn apply<const N: usize>(
  board: &mut Board<N>,
  loc: Loc<N>,
  value: Value<N>,
) -> Result<(), Contradiction> {
  set_value(board, loc, value).map_err(|_| Contradiction)?;
  saturate(board)?;
  Ok(())
}

/// One branch point: a board plus the values left to try at its pivot cell.
struct Frame<const N: usize> {
  board: Board<N>,

  /// An unanswered location we'll try the remaining candidates of.
  loc: Loc<N>,

  /// The values to try at the pivot location.  `count` is the total number,
  /// and `next` indexes the next one to try.
  values: [Option<Value<N>>; N],
  count: u8,
  next: u8,
}

impl<const N: usize> Frame<N> {
  fn new(board: Board<N>, policy: &mut dyn BranchPolicy<N>) -> Self {
    let loc = policy.choose_branch_loc(&board);
    let mut frame = Frame {
      board,
      loc,
      values: [None; N],
      count: 0,
      next: 0,
    };
    frame.fill_values(policy);
    frame
  }

  /// Re-aims this frame at a fresh pivot cell, reusing its board.
  fn repivot(&mut self, policy: &mut dyn BranchPolicy<N>) {
    self.loc = policy.choose_branch_loc(&self.board);
    self.fill_values(policy);
  }

  /// Collects the candidate values at the pivot cell, largest first, and
  /// lets the policy reorder them.
  fn fill_values(&mut self, policy: &mut dyn BranchPolicy<N>) {
    self.count = 0;
    self.next = 0;
    for value in self.board[self.loc].values() {
      self.values[self.count as usize] = Some(value);
      self.count += 1;
    }
    self.values[..self.count as usize].reverse();
    policy.order_branch_values(&mut self.values[..self.count as usize]);
  }

  /// Returns the next value to try at this frame's pivot, and whether it is
  /// the last one.
  fn next_value(&mut self) -> (Value<N>, bool) {
    let value = self.values[self.next as usize].unwrap();
    self.next += 1;
    (value, self.next >= self.count)
  }
}
