use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::error::{PuzzleError, Result};
use crate::puzzle::RswPuzzle;

/// Progress reports and cancellation checks happen this many times per solve.
const PROGRESS_STEPS: u64 = 100;
const MAX_CHECK_INTERVAL: u64 = 10_000;

pub struct SequentialSolver<'a> {
    puzzle: &'a RswPuzzle,
}

impl<'a> SequentialSolver<'a> {
    pub fn new(puzzle: &'a RswPuzzle) -> Self {
        SequentialSolver { puzzle }
    }

    /// Computes `base^(2^T) mod N` by `T` sequential squarings.
    pub fn solve(&self, cancelled: &CancellationToken) -> Result<rug::Integer> {
        self.solve_with_progress(cancelled, &mut NoProgress)
    }

    /// Like [`SequentialSolver::solve`], reporting progress to `observer`.
    ///
    /// A cancelled solve returns [`PuzzleError::Cancelled`] and discards all
    /// intermediate state.
    pub fn solve_with_progress<O: ProgressObserver>(
        &self,
        cancelled: &CancellationToken,
        observer: &mut O,
    ) -> Result<rug::Integer> {
        let iterations = self.puzzle.iterations();
        tracing::debug!(
            iterations,
            modulus_bits = self.puzzle.modulus().significant_bits(),
            "starting sequential solve"
        );

        let start = Instant::now();
        let mut value = self.puzzle.base().clone();
        square_chain(
            &mut value,
            self.puzzle.modulus(),
            iterations,
            cancelled,
            observer,
        )?;

        tracing::debug!(iterations, elapsed = ?start.elapsed(), "sequential solve finished");
        Ok(value)
    }
}

/// Helper for modular squaring in place
#[inline]
fn square_mod(value: &mut rug::Integer, modulus: &rug::Integer) {
    value.square_mut();
    *value %= modulus;
}

/// Squares `value` modulo `modulus` exactly `iterations` times.
///
/// Cancellation is checked between squarings at a fixed interval, never in
/// the middle of one. On cancellation `value` holds a partial result the
/// caller must drop.
pub(crate) fn square_chain<O: ProgressObserver>(
    value: &mut rug::Integer,
    modulus: &rug::Integer,
    iterations: u64,
    cancelled: &CancellationToken,
    observer: &mut O,
) -> Result<()> {
    if cancelled.is_cancelled() {
        return Err(PuzzleError::Cancelled);
    }

    let check_interval = (iterations / PROGRESS_STEPS).clamp(1, MAX_CHECK_INTERVAL);

    for i in 1..=iterations {
        square_mod(value, modulus);

        if i % check_interval == 0 || i == iterations {
            if cancelled.is_cancelled() {
                tracing::debug!(completed = i, iterations, "solve cancelled");
                return Err(PuzzleError::Cancelled);
            }
            observer.on_progress(Progress {
                completed: i,
                total: iterations,
            });
        }
    }

    Ok(())
}

/// How far a sequential computation has advanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: u64,
    pub total: u64,
}

impl Progress {
    /// Fraction of squarings done, in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Receives progress updates from a running solve.
///
/// Observers only watch; nothing they do can change the numeric result.
pub trait ProgressObserver {
    fn on_progress(&mut self, progress: Progress);
}

impl<F: FnMut(Progress)> ProgressObserver for F {
    fn on_progress(&mut self, progress: Progress) {
        self(progress)
    }
}

/// Observer that ignores every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _progress: Progress) {}
}

/// Shared flag a controlling thread sets to abort a solve or a calibration.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signals cancellation to any listening operations
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Checks if cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
