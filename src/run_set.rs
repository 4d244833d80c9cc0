//! Bounded run collections.

use log;

/// Default maximum number of runs tracked in a single run set before it is folded.
pub const DEFAULT_FAN_OUT_LIMIT: usize = 1024;

/// Fresh and folded run sets tracked during run production.
///
/// Fresh runs come straight from sorted blocks. Once there are more than `fan_out_limit` of them
/// they are folded into a single run that moves to the folded set. The folded set is bounded
/// the same way: when it overflows, it is collapsed into one run before the next fold lands in it.
/// The total number of tracked runs therefore never grows with the input size.
///
/// The set is generic over the run handle so that folding can be driven by any merge function.
pub struct RunSets<R> {
    fan_out_limit: usize,
    fresh: Vec<R>,
    folded: Vec<R>,
    folds: usize,
}

impl<R> RunSets<R> {
    pub fn new(fan_out_limit: usize) -> Self {
        RunSets {
            fan_out_limit,
            fresh: Vec::new(),
            folded: Vec::new(),
            folds: 0,
        }
    }

    /// Adds a fresh run, folding the sets with `fold` if they overflow.
    ///
    /// # Arguments
    /// * `run` - Newly produced run
    /// * `fold` - Function merging a list of runs into a single one
    pub fn push<F, E>(&mut self, run: R, mut fold: F) -> Result<(), E>
    where
        F: FnMut(Vec<R>) -> Result<R, E>,
    {
        self.fresh.push(run);

        if self.fresh.len() > self.fan_out_limit {
            if self.folded.len() > self.fan_out_limit {
                log::debug!("collapsing {} folded runs", self.folded.len());
                let collapsed = fold(std::mem::take(&mut self.folded))?;
                self.folded.push(collapsed);
                self.folds += 1;
            }

            log::debug!("folding {} fresh runs", self.fresh.len());
            let folded = fold(std::mem::take(&mut self.fresh))?;
            self.folded.push(folded);
            self.folds += 1;
        }

        return Ok(());
    }

    /// Returns the number of fresh runs.
    pub fn fresh_len(&self) -> usize {
        self.fresh.len()
    }

    /// Returns the number of folded runs.
    pub fn folded_len(&self) -> usize {
        self.folded.len()
    }

    /// Returns the number of folds performed so far.
    pub fn folds(&self) -> usize {
        self.folds
    }

    /// Returns all tracked runs, fresh runs first.
    pub fn into_runs(self) -> Vec<R> {
        let mut runs = self.fresh;
        runs.extend(self.folded);

        return runs;
    }
}
