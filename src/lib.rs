//! `ext-sort-i32` is an external sort of raw binary 32-bit integer files.
//!
//! External sorting is a class of sorting algorithms that can handle massive amounts of data. External sorting
//! is required when the data being sorted do not fit into the main memory (RAM) of a computer and instead must be
//! resided in slower external memory, usually a hard disk drive. During the first pass the input is read in
//! blocks that fit in RAM, every block is sorted and saved as a temporary *run*. During the second pass the runs
//! are merged together. For more information see [External Sorting](https://en.wikipedia.org/wiki/External_sorting).
//!
//! # Overview
//!
//! * **File format:**
//!   input and output files are plain sequences of 4-byte big-endian signed integers without any header,
//!   so a file of *n* values is exactly `4 * n` bytes long.
//! * **Bounded memory:**
//!   only one block of a configurable byte size is kept in memory at a time.
//! * **Bounded number of temporary files:**
//!   whenever more runs than the fan-out limit accumulate they are folded into a single run by a K-way merge,
//!   so the number of temporary files tracked at once does not grow with the input size.
//! * **Scoped cleanup:**
//!   every temporary file is deleted as soon as it has been merged, or when its handle is dropped
//!   on an error path.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use env_logger;
//! use log;
//!
//! use ext_sort_i32::ExternalSorterBuilder;
//!
//! fn main() {
//!     env_logger::Builder::new().filter_level(log::LevelFilter::Debug).init();
//!
//!     let sorter = ExternalSorterBuilder::new()
//!         .with_tmp_dir(Path::new("./"))
//!         .with_block_size(64 * 1024 * 1024)
//!         .build()
//!         .unwrap();
//!
//!     let stats = sorter.sort(Path::new("input.bin"), Path::new("output.bin")).unwrap();
//!     println!("sorted {} values in {:?}", stats.values, stats.elapsed);
//! }
//! ```

pub mod buffer;
pub mod codec;
pub mod merger;
pub mod reader;
pub mod run;
pub mod run_set;
pub mod sort;

pub use buffer::{Block, BlockBuilder};
pub use merger::KWayMerger;
pub use reader::BlockReader;
pub use run::{Run, RunReader};
pub use run_set::RunSets;
pub use sort::{ExternalSorter, ExternalSorterBuilder, SortError, SortStats};
