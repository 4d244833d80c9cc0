//! External sorter.

use log;
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::fs;
use std::io::{self, prelude::*};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::buffer::{Block, BlockBuilder, DEFAULT_BLOCK_SIZE};
use crate::merger::{self, KWayMerger};
use crate::reader::BlockReader;
use crate::run::Run;
use crate::run_set::{RunSets, DEFAULT_FAN_OUT_LIMIT};

/// Sorting error.
#[derive(Debug)]
pub enum SortError {
    /// Temporary directory or file creation error.
    TempDir(io::Error),
    /// Invalid sorter configuration.
    Config(String),
    /// Common I/O error.
    IO(io::Error),
    /// Input data stream error.
    Input(io::Error),
}

impl Error for SortError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self {
            SortError::TempDir(err) => Some(err),
            SortError::Config(_) => None,
            SortError::IO(err) => Some(err),
            SortError::Input(err) => Some(err),
        }
    }
}

impl Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            SortError::TempDir(err) => write!(f, "temporary directory or file not created: {}", err),
            SortError::Config(msg) => write!(f, "invalid sorter configuration: {}", msg),
            SortError::IO(err) => write!(f, "I/O operation failed: {}", err),
            SortError::Input(err) => write!(f, "input data stream error: {}", err),
        }
    }
}

/// Summary of a finished sort.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortStats {
    /// Number of values sorted.
    pub values: u64,
    /// Number of runs written to the temporary directory, folded runs included.
    pub runs_created: usize,
    /// Number of folds performed while producing runs.
    pub folds: usize,
    /// Wall-clock time from the start of run production to the end of the final merge.
    pub elapsed: Duration,
}

/// External sorter builder. Provides methods for [`ExternalSorter`] initialization.
#[derive(Clone, Debug)]
pub struct ExternalSorterBuilder {
    /// Block size limit in encoded bytes.
    block_size: u64,
    /// Maximum number of runs in a run set before it is folded.
    fan_out_limit: usize,
    /// Directory to be used to store temporary data.
    tmp_dir: Option<Box<Path>>,
    /// Run file read/write buffer size.
    rw_buf_size: Option<usize>,
}

impl ExternalSorterBuilder {
    /// Creates an instance of a builder with default parameters.
    pub fn new() -> Self {
        ExternalSorterBuilder::default()
    }

    /// Builds an [`ExternalSorter`] instance using provided configuration.
    pub fn build(self) -> Result<ExternalSorter, SortError> {
        ExternalSorter::new(
            self.block_size,
            self.fan_out_limit,
            self.tmp_dir.as_deref(),
            self.rw_buf_size,
        )
    }

    /// Sets block size limit in bytes.
    pub fn with_block_size(mut self, block_size: u64) -> ExternalSorterBuilder {
        self.block_size = block_size;
        return self;
    }

    /// Sets maximum number of runs tracked in a run set before it is folded.
    pub fn with_fan_out_limit(mut self, fan_out_limit: usize) -> ExternalSorterBuilder {
        self.fan_out_limit = fan_out_limit;
        return self;
    }

    /// Sets directory to be used to store temporary data.
    pub fn with_tmp_dir(mut self, path: &Path) -> ExternalSorterBuilder {
        self.tmp_dir = Some(path.into());
        return self;
    }

    /// Sets run read/write buffer size.
    pub fn with_rw_buf_size(mut self, buf_size: usize) -> ExternalSorterBuilder {
        self.rw_buf_size = Some(buf_size);
        return self;
    }
}

impl Default for ExternalSorterBuilder {
    fn default() -> Self {
        ExternalSorterBuilder {
            block_size: DEFAULT_BLOCK_SIZE,
            fan_out_limit: DEFAULT_FAN_OUT_LIMIT,
            tmp_dir: None,
            rw_buf_size: None,
        }
    }
}

/// External sorter.
pub struct ExternalSorter {
    /// Directory to be used to store temporary data.
    tmp_dir: tempfile::TempDir,
    /// Block builder.
    block_builder: BlockBuilder,
    /// Maximum number of runs in a run set before it is folded.
    fan_out_limit: usize,
    /// Run file read/write buffer size.
    rw_buf_size: Option<usize>,
}

impl ExternalSorter {
    /// Creates a new external sorter instance.
    ///
    /// # Arguments
    /// * `block_size` - Block size limit in bytes. Each block is sorted in memory and saved as a run.
    /// * `fan_out_limit` - Maximum number of runs tracked in a run set before the set is folded.
    /// * `tmp_path` - Directory to be used to store temporary data. If paramater is [`None`] default OS temporary
    ///   directory will be used.
    /// * `rw_buf_size` - Run files read/write buffer size.
    pub fn new(
        block_size: u64,
        fan_out_limit: usize,
        tmp_path: Option<&Path>,
        rw_buf_size: Option<usize>,
    ) -> Result<Self, SortError> {
        if block_size == 0 {
            return Err(SortError::Config("block size must be positive".to_string()));
        }
        if fan_out_limit == 0 {
            return Err(SortError::Config("fan-out limit must be positive".to_string()));
        }
        if rw_buf_size == Some(0) {
            return Err(SortError::Config("read/write buffer size must be positive".to_string()));
        }

        return Ok(ExternalSorter {
            block_builder: BlockBuilder::new(block_size),
            fan_out_limit,
            rw_buf_size,
            tmp_dir: Self::init_tmp_directory(tmp_path)?,
        });
    }

    fn init_tmp_directory(tmp_path: Option<&Path>) -> Result<tempfile::TempDir, SortError> {
        let tmp_dir = if let Some(tmp_path) = tmp_path {
            tempfile::tempdir_in(tmp_path)
        } else {
            tempfile::tempdir()
        }
        .map_err(|err| SortError::TempDir(err))?;

        log::info!("using {} as a temporary directory", tmp_dir.path().display());

        return Ok(tmp_dir);
    }

    /// Returns the directory runs are stored in.
    pub fn tmp_dir(&self) -> &Path {
        self.tmp_dir.path()
    }

    /// Sorts the values of the `input` file and saves them to the `output` file.
    ///
    /// The input is read completely before the output is created,
    /// so both paths may refer to the same file.
    ///
    /// # Arguments
    /// * `input` - File to be sorted
    /// * `output` - File the sorted values are written to
    pub fn sort(&self, input: &Path, output: &Path) -> Result<SortStats, SortError> {
        log::info!("start sorting: {} -> {}", input.display(), output.display());

        let input_file = fs::File::open(input).map_err(|err| SortError::Input(err))?;
        let input_stream = match self.rw_buf_size {
            Some(buf_size) => io::BufReader::with_capacity(buf_size, input_file),
            None => io::BufReader::new(input_file),
        };

        self.run_sort(input_stream, || {
            fs::File::create(output).map_err(|err| SortError::IO(err))
        })
    }

    /// Sorts the values read from `input` and writes them to `output`.
    ///
    /// # Arguments
    /// * `input` - Stream the values are fetched from
    /// * `output` - Stream the sorted values are written to
    pub fn sort_stream<R, W>(&self, input: R, output: W) -> Result<SortStats, SortError>
    where
        R: Read,
        W: Write,
    {
        self.run_sort(input, || Ok(output))
    }

    fn run_sort<R, W, O>(&self, input: R, open_output: O) -> Result<SortStats, SortError>
    where
        R: Read,
        W: Write,
        O: FnOnce() -> Result<W, SortError>,
    {
        let start = Instant::now();

        let (runs, mut stats) = self.produce_runs(input)?;

        log::debug!("merging {} runs", runs.len());
        let merger = KWayMerger::new(runs, self.rw_buf_size).map_err(|err| SortError::IO(err))?;

        let output = open_output()?;
        let mut output_writer = match self.rw_buf_size {
            Some(buf_size) => io::BufWriter::with_capacity(buf_size, output),
            None => io::BufWriter::new(output),
        };
        merger
            .write_to(&mut output_writer)
            .map_err(|err| SortError::IO(err))?;
        output_writer.flush().map_err(|err| SortError::IO(err))?;

        stats.elapsed = start.elapsed();
        log::info!(
            "sorting done in {:.3}s (values: {}, runs: {}, folds: {})",
            stats.elapsed.as_secs_f64(),
            stats.values,
            stats.runs_created,
            stats.folds,
        );

        return Ok(stats);
    }

    /// Reads the input block by block, saving every sorted block as a run.
    /// Returns runs that together hold all of the input values.
    fn produce_runs<R: Read>(&self, input: R) -> Result<(Vec<Run>, SortStats), SortError> {
        let mut input = BlockReader::new(input).map_err(|err| SortError::Input(err))?;
        let mut run_sets = RunSets::new(self.fan_out_limit);
        let mut stats = SortStats {
            values: 0,
            runs_created: 0,
            folds: 0,
            elapsed: Duration::ZERO,
        };

        while !input.is_empty() {
            let mut block = self.block_builder.build();
            while !block.is_full() {
                match input.pop().map_err(|err| SortError::Input(err))? {
                    Some(value) => block.push(value),
                    None => break,
                }
            }

            stats.values += block.len() as u64;
            let run = self.create_run(block)?;
            stats.runs_created += 1;

            run_sets.push(run, |runs| -> io::Result<Run> {
                let folded = merger::fold(self.tmp_dir.path(), runs, self.rw_buf_size)?;
                stats.runs_created += 1;
                Ok(folded)
            })
            .map_err(|err| SortError::IO(err))?;
        }

        stats.folds = run_sets.folds();
        log::debug!(
            "run production done (fresh runs: {}, folded runs: {})",
            run_sets.fresh_len(),
            run_sets.folded_len(),
        );

        return Ok((run_sets.into_runs(), stats));
    }

    fn create_run(&self, block: Block) -> Result<Run, SortError> {
        log::debug!("sorting block data ({} bytes)", block.byte_size());
        let values = block.into_sorted();

        log::debug!("saving block data");
        let run = Run::build(self.tmp_dir.path(), &values).map_err(|err| SortError::IO(err))?;

        return Ok(run);
    }
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::io;
    use std::path::Path;

    use rand::seq::SliceRandom;
    use rand::Rng;
    use rstest::*;

    use super::{ExternalSorter, ExternalSorterBuilder, SortError};
    use crate::codec;

    #[fixture]
    fn tmp_dir() -> tempfile::TempDir {
        tempfile::tempdir_in("./").unwrap()
    }

    fn build_sorter(tmp_dir: &tempfile::TempDir, block_size: u64, fan_out_limit: usize) -> ExternalSorter {
        ExternalSorterBuilder::new()
            .with_block_size(block_size)
            .with_fan_out_limit(fan_out_limit)
            .with_tmp_dir(tmp_dir.path())
            .build()
            .unwrap()
    }

    fn read_values(path: &Path) -> Vec<i32> {
        let bytes = fs::read(path).unwrap();
        Vec::from_iter(
            bytes
                .chunks_exact(codec::RECORD_SIZE)
                .map(|chunk| codec::decode([chunk[0], chunk[1], chunk[2], chunk[3]])),
        )
    }

    fn tmp_dir_entries(sorter: &ExternalSorter) -> usize {
        fs::read_dir(sorter.tmp_dir()).unwrap().count()
    }

    #[rstest]
    #[case(4096, 1024, 100)]
    #[case(4, 1024, 100)]
    #[case(8, 3, 100)]
    #[case(12, 2, 1000)]
    #[case(4, 1, 257)]
    fn test_external_sorter(
        tmp_dir: tempfile::TempDir,
        #[case] block_size: u64,
        #[case] fan_out_limit: usize,
        #[case] values_number: i32,
    ) {
        let input_sorted = Vec::from_iter(0..values_number);

        let mut input_shuffled = input_sorted.clone();
        input_shuffled.shuffle(&mut rand::thread_rng());

        let input = tmp_dir.path().join("input.bin");
        let output = tmp_dir.path().join("output.bin");
        fs::write(&input, codec::encode_sequence(&input_shuffled)).unwrap();

        let sorter = build_sorter(&tmp_dir, block_size, fan_out_limit);
        let stats = sorter.sort(&input, &output).unwrap();

        assert_eq!(stats.values, values_number as u64);
        assert_eq!(read_values(&output), input_sorted);
        assert_eq!(fs::metadata(&output).unwrap().len(), fs::metadata(&input).unwrap().len());
        assert_eq!(tmp_dir_entries(&sorter), 0);
    }

    #[rstest]
    fn test_fold_path(tmp_dir: tempfile::TempDir) {
        let mut rng = rand::thread_rng();
        let input_values = Vec::from_iter((0..5000).map(|_| rng.gen_range(-100..100)));

        let input = tmp_dir.path().join("input.bin");
        let output = tmp_dir.path().join("output.bin");
        fs::write(&input, codec::encode_sequence(&input_values)).unwrap();

        let sorter = build_sorter(&tmp_dir, 16, 4);
        let stats = sorter.sort(&input, &output).unwrap();
        assert!(stats.folds > 0);
        assert_eq!(stats.runs_created, 5000 / 4 + stats.folds);

        let actual = read_values(&output);
        assert!(actual.windows(2).all(|pair| pair[0] <= pair[1]));

        let mut expected = input_values;
        expected.sort();
        assert_eq!(actual, expected);
        assert_eq!(tmp_dir_entries(&sorter), 0);
    }

    #[rstest]
    fn test_single_block_path(tmp_dir: tempfile::TempDir) {
        let input_values = vec![9, -4, 7, 7, 0, i32::MIN, i32::MAX, -4];

        let mut output = Vec::new();
        let sorter = build_sorter(&tmp_dir, 4096, 1024);
        let stats = sorter
            .sort_stream(codec::encode_sequence(&input_values).as_slice(), &mut output)
            .unwrap();

        let mut expected = input_values;
        expected.sort();
        assert_eq!(output, codec::encode_sequence(&expected));
        assert_eq!(stats.runs_created, 1);
        assert_eq!(stats.folds, 0);
    }

    #[rstest]
    fn test_scenario_five_runs(tmp_dir: tempfile::TempDir) {
        let input = tmp_dir.path().join("input.bin");
        let output = tmp_dir.path().join("output.bin");
        fs::write(&input, codec::encode_sequence(&[5, 3, 1, 4, 2])).unwrap();

        let sorter = build_sorter(&tmp_dir, 4, 1024);
        let stats = sorter.sort(&input, &output).unwrap();

        assert_eq!(read_values(&output), vec![1, 2, 3, 4, 5]);
        assert_eq!(fs::metadata(&output).unwrap().len(), 20);
        assert_eq!(stats.runs_created, 5);
        assert_eq!(stats.folds, 0);
        assert_eq!(tmp_dir_entries(&sorter), 0);
    }

    #[rstest]
    fn test_empty_input(tmp_dir: tempfile::TempDir) {
        let input = tmp_dir.path().join("input.bin");
        let output = tmp_dir.path().join("output.bin");
        fs::write(&input, b"").unwrap();

        let sorter = build_sorter(&tmp_dir, 4096, 1024);
        let stats = sorter.sort(&input, &output).unwrap();

        assert_eq!(fs::metadata(&output).unwrap().len(), 0);
        assert_eq!(stats.values, 0);
        assert_eq!(stats.runs_created, 0);
    }

    #[rstest]
    fn test_idempotence(tmp_dir: tempfile::TempDir) {
        let input = tmp_dir.path().join("input.bin");
        let output = tmp_dir.path().join("output.bin");
        fs::write(&input, codec::encode_sequence(&Vec::from_iter(-500..500))).unwrap();

        let sorter = build_sorter(&tmp_dir, 64, 4);
        sorter.sort(&input, &output).unwrap();

        assert_eq!(fs::read(&output).unwrap(), fs::read(&input).unwrap());
    }

    #[rstest]
    fn test_sort_in_place(tmp_dir: tempfile::TempDir) {
        let path = tmp_dir.path().join("data.bin");
        fs::write(&path, codec::encode_sequence(&[3, 1, 2, 1])).unwrap();

        let sorter = build_sorter(&tmp_dir, 8, 1024);
        sorter.sort(&path, &path).unwrap();

        assert_eq!(read_values(&path), vec![1, 1, 2, 3]);
    }

    #[rstest]
    fn test_missing_input(tmp_dir: tempfile::TempDir) {
        let sorter = build_sorter(&tmp_dir, 4096, 1024);
        let result = sorter.sort(&tmp_dir.path().join("missing.bin"), &tmp_dir.path().join("output.bin"));

        assert!(matches!(result, Err(SortError::Input(_))));
        assert!(!tmp_dir.path().join("output.bin").exists());
    }

    #[rstest]
    fn test_input_error_releases_runs(tmp_dir: tempfile::TempDir) {
        let bytes = codec::encode_sequence(&[4, 3, 2, 1]);
        let failing = io::Read::chain(bytes.as_slice(), FailingReader);

        let sorter = build_sorter(&tmp_dir, 4, 1024);
        let result = sorter.sort_stream(failing, io::sink());

        assert!(matches!(result, Err(SortError::Input(_))));
        assert_eq!(tmp_dir_entries(&sorter), 0);
    }

    #[rstest]
    fn test_output_error_releases_runs(tmp_dir: tempfile::TempDir) {
        let bytes = codec::encode_sequence(&[4, 3, 2, 1, 0]);

        // small buffer so the write fails while runs are still being merged
        let sorter = ExternalSorterBuilder::new()
            .with_block_size(4)
            .with_fan_out_limit(2)
            .with_rw_buf_size(4)
            .with_tmp_dir(tmp_dir.path())
            .build()
            .unwrap();
        let result = sorter.sort_stream(bytes.as_slice(), FailingWriter);

        assert!(matches!(result, Err(SortError::IO(_))));
        assert_eq!(tmp_dir_entries(&sorter), 0);
    }

    #[rstest]
    fn test_huge_block_size(tmp_dir: tempfile::TempDir) {
        let mut output = Vec::new();
        let sorter = build_sorter(&tmp_dir, u64::MAX / 2, 1024);
        let stats = sorter
            .sort_stream(codec::encode_sequence(&[3, 1, 2]).as_slice(), &mut output)
            .unwrap();

        assert_eq!(output, codec::encode_sequence(&[1, 2, 3]));
        assert_eq!(stats.runs_created, 1);
    }

    #[rstest]
    #[case(0, 1024)]
    #[case(4096, 0)]
    fn test_invalid_config(#[case] block_size: u64, #[case] fan_out_limit: usize) {
        let result = ExternalSorterBuilder::new()
            .with_block_size(block_size)
            .with_fan_out_limit(fan_out_limit)
            .build();

        assert!(matches!(result, Err(SortError::Config(_))));
    }

    struct FailingWriter;

    impl io::Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "test error"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct FailingReader;

    impl io::Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "test error"))
        }
    }
}
