//! Buffered record reader.

use log;
use std::fs;
use std::io::{self, prelude::*};
use std::path::Path;

use crate::codec::{self, RECORD_SIZE};

/// Sequential record reader with a one-record lookahead.
///
/// The head record is read eagerly, so [`BlockReader::peek`] and [`BlockReader::is_empty`]
/// never touch the underlying stream. A trailing partial record is never returned.
pub struct BlockReader<R: Read> {
    inner: R,
    head: Option<i32>,
}

impl BlockReader<io::BufReader<fs::File>> {
    /// Opens a file for reading using the default buffer capacity.
    pub fn open(path: &Path) -> io::Result<Self> {
        Self::new(io::BufReader::new(fs::File::open(path)?))
    }
}

impl<R: Read> BlockReader<R> {
    /// Creates a reader over a stream and loads its first record.
    pub fn new(inner: R) -> io::Result<Self> {
        let mut reader = BlockReader { inner, head: None };
        reader.head = reader.read_record()?;

        return Ok(reader);
    }

    /// Returns `true` if every record has been consumed.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Returns the next record without consuming it.
    pub fn peek(&self) -> Option<i32> {
        self.head
    }

    /// Consumes and returns the next record, loading the one after it.
    pub fn pop(&mut self) -> io::Result<Option<i32>> {
        let head = match self.head {
            Some(head) => head,
            None => return Ok(None),
        };
        self.head = self.read_record()?;

        return Ok(Some(head));
    }

    fn read_record(&mut self) -> io::Result<Option<i32>> {
        let mut buf = [0u8; RECORD_SIZE];
        let mut filled = 0;

        while filled < RECORD_SIZE {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }

        if filled == 0 {
            return Ok(None);
        }
        if filled < RECORD_SIZE {
            log::warn!("ignoring trailing partial record ({} bytes)", filled);
            return Ok(None);
        }

        return Ok(Some(codec::decode(buf)));
    }
}

impl<R: Read> Iterator for BlockReader<R> {
    type Item = io::Result<i32>;

    fn next(&mut self) -> Option<Self::Item> {
        self.pop().transpose()
    }
}
