//! Sorted runs stored in temporary files.

use std::fs;
use std::io::{self, prelude::*};
use std::path::Path;

use tempfile;

use crate::codec;
use crate::reader::BlockReader;

/// A temporary file holding a non-decreasing sequence of records.
///
/// The backing file is deleted when the run (or the reader opened over it) is dropped.
pub struct Run {
    file: tempfile::NamedTempFile,
    len: u64,
}

impl Run {
    /// Persists already sorted values as a new run in `dir` using a single write.
    pub fn build(dir: &Path, values: &[i32]) -> io::Result<Self> {
        let mut file = Self::create_file(dir)?;
        file.write_all(&codec::encode_sequence(values))?;
        file.flush()?;

        return Ok(Run {
            file,
            len: values.len() as u64,
        });
    }

    /// Creates a new run in `dir` filled by `fill`, which writes encoded records
    /// and returns their number. Values must be written in ascending order.
    pub fn build_with<F>(dir: &Path, buf_size: Option<usize>, fill: F) -> io::Result<Self>
    where
        F: FnOnce(&mut io::BufWriter<&mut fs::File>) -> io::Result<u64>,
    {
        let mut file = Self::create_file(dir)?;

        let len = {
            let mut run_writer = match buf_size {
                Some(buf_size) => io::BufWriter::with_capacity(buf_size, file.as_file_mut()),
                None => io::BufWriter::new(file.as_file_mut()),
            };
            let len = fill(&mut run_writer)?;
            run_writer.flush()?;
            len
        };

        return Ok(Run { file, len });
    }

    fn create_file(dir: &Path) -> io::Result<tempfile::NamedTempFile> {
        tempfile::Builder::new().prefix("run-").suffix(".bin").tempfile_in(dir)
    }

    /// Returns the number of records in the run.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Opens the run for reading. The run is consumed: its file is now owned by the reader.
    pub fn open(self, buf_size: Option<usize>) -> io::Result<RunReader> {
        let file = self.file.reopen()?;
        let path = self.file.into_temp_path();

        let run_reader = match buf_size {
            Some(buf_size) => io::BufReader::with_capacity(buf_size, file),
            None => io::BufReader::new(file),
        };

        return Ok(RunReader {
            reader: BlockReader::new(run_reader)?,
            path,
        });
    }
}

/// Reader over a run. Releasing the reader deletes the run file.
pub struct RunReader {
    // dropped before `path` so the handle is closed when the file is removed
    reader: BlockReader<io::BufReader<fs::File>>,
    path: tempfile::TempPath,
}

impl RunReader {
    pub fn is_empty(&self) -> bool {
        self.reader.is_empty()
    }

    pub fn peek(&self) -> Option<i32> {
        self.reader.peek()
    }

    pub fn pop(&mut self) -> io::Result<Option<i32>> {
        self.reader.pop()
    }

    /// Closes the file handle and deletes the run file, reporting deletion errors
    /// that dropping the reader would swallow.
    pub fn close(self) -> io::Result<()> {
        let RunReader { reader, path } = self;
        drop(reader);

        return path.close();
    }
}
