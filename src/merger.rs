//! Binary heap merger.

use log;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::io::{self, prelude::*};
use std::path::Path;

use crate::codec;
use crate::run::{Run, RunReader};

/// Heap entry pairing an open run reader with its current head value.
struct HeapEntry {
    head: i32,
    reader: RunReader,
}

// binary heap is max-heap by default so the ordering is reversed to turn it into a min-heap
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.head.cmp(&self.head)
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.head == other.head
    }
}

impl Eq for HeapEntry {}

/// K-way merger of sorted runs.
/// Merges multiple sorted runs into a single sorted output.
/// Time complexity is *m* \* log(*n*) in worst case where *m* is the number of values,
/// *n* is the number of runs.
///
/// Every run handed to the merger is deleted once it is exhausted. Runs still in the heap
/// are deleted when the merger is dropped, so an aborted merge leaves no files behind.
pub struct KWayMerger {
    items: BinaryHeap<HeapEntry>,
}

impl KWayMerger {
    /// Opens a reader for every run and seeds the heap with their heads.
    /// Run values should be sorted in ascending order otherwise the result is undefined.
    ///
    /// # Arguments
    /// * `runs` - Runs to be merged in a single sorted one
    /// * `buf_size` - Run file read buffer size
    pub fn new<I>(runs: I, buf_size: Option<usize>) -> io::Result<Self>
    where
        I: IntoIterator<Item = Run>,
    {
        let runs = runs.into_iter();
        let mut items = BinaryHeap::with_capacity(runs.size_hint().0);

        for run in runs {
            let reader = run.open(buf_size)?;
            match reader.peek() {
                Some(head) => items.push(HeapEntry { head, reader }),
                None => reader.close()?,
            }
        }

        return Ok(KWayMerger { items });
    }

    /// Returns the number of runs not yet exhausted.
    pub fn open_runs(&self) -> usize {
        self.items.len()
    }

    /// Writes all merged values to `writer` and returns their number.
    pub fn write_to<W: Write>(self, writer: &mut W) -> io::Result<u64> {
        let mut written = 0;
        for value in self {
            writer.write_all(&codec::encode(value?))?;
            written += 1;
        }

        return Ok(written);
    }
}

impl Iterator for KWayMerger {
    type Item = io::Result<i32>;

    /// Returns the next value from the runs in ascending order.
    fn next(&mut self) -> Option<Self::Item> {
        let HeapEntry { head, mut reader } = self.items.pop()?;

        if let Err(err) = reader.pop() {
            return Some(Err(err));
        }

        match reader.peek() {
            Some(next_head) => self.items.push(HeapEntry {
                head: next_head,
                reader,
            }),
            None => {
                if let Err(err) = reader.close() {
                    return Some(Err(err));
                }
            }
        }

        return Some(Ok(head));
    }
}

/// Merges `runs` into a single new run created in `dir`.
pub fn fold(dir: &Path, runs: Vec<Run>, buf_size: Option<usize>) -> io::Result<Run> {
    log::debug!("folding {} runs", runs.len());

    let merger = KWayMerger::new(runs, buf_size)?;
    let run = Run::build_with(dir, buf_size, |writer| merger.write_to(writer))?;

    log::debug!("folded run holds {} values", run.len());

    return Ok(run);
}
