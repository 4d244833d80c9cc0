//! Byte-limited block buffer.

use crate::codec::RECORD_SIZE;

/// Default block size in bytes (1024 records).
pub const DEFAULT_BLOCK_SIZE: u64 = 4 * 1024;

/// Maximum number of records a block reserves room for upfront.
/// Larger blocks grow on demand.
pub const MAX_PREALLOCATED_RECORDS: usize = 1024 * 1024;

/// Block builder.
#[derive(Clone, Copy, Debug)]
pub struct BlockBuilder {
    block_size: u64,
}

impl BlockBuilder {
    /// Creates a builder of blocks limited by `block_size` encoded bytes.
    pub fn new(block_size: u64) -> Self {
        BlockBuilder { block_size }
    }

    /// Creates a new empty block.
    pub fn build(&self) -> Block {
        Block::new(self.block_size)
    }
}

/// In-memory batch of values limited by its encoded size.
pub struct Block {
    limit: u64,
    inner: Vec<i32>,
}

impl Block {
    /// Creates an empty block limited by `limit` encoded bytes.
    /// At most [`MAX_PREALLOCATED_RECORDS`] records are reserved upfront.
    pub fn new(limit: u64) -> Self {
        let records = usize::try_from(limit).map_or(MAX_PREALLOCATED_RECORDS, |limit| {
            limit.div_ceil(RECORD_SIZE).min(MAX_PREALLOCATED_RECORDS)
        });

        Block {
            limit,
            inner: Vec::with_capacity(records),
        }
    }

    /// Adds a new value to the block.
    pub fn push(&mut self, value: i32) {
        self.inner.push(value);
    }

    /// Returns the number of values in the block.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the encoded size of the block in bytes.
    pub fn byte_size(&self) -> u64 {
        (self.inner.len() * RECORD_SIZE) as u64
    }

    /// Checks if the block reached the limit.
    /// An empty block is never full.
    pub fn is_full(&self) -> bool {
        !self.inner.is_empty() && self.byte_size() >= self.limit
    }

    /// Sorts the block in ascending order and returns the sorted values.
    pub fn into_sorted(mut self) -> Vec<i32> {
        self.inner.sort_unstable();
        self.inner
    }
}
