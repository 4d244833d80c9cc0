use std::fs;
use std::path;

use env_logger;
use log;
use rand::Rng;

use ext_sort_i32::{codec, ExternalSorterBuilder};

fn main() {
    env_logger::Builder::new().filter_level(log::LevelFilter::Debug).init();

    let mut rng = rand::thread_rng();
    let values = Vec::from_iter((0..100_000).map(|_| rng.gen::<i32>()));
    fs::write("input.bin", codec::encode_sequence(&values)).unwrap();

    let sorter = ExternalSorterBuilder::new()
        .with_tmp_dir(path::Path::new("./"))
        .with_block_size(16 * 1024)
        .with_fan_out_limit(8)
        .build()
        .unwrap();

    let stats = sorter
        .sort(path::Path::new("input.bin"), path::Path::new("output.bin"))
        .unwrap();

    println!(
        "sorted {} values using {} runs and {} folds in {:?}",
        stats.values, stats.runs_created, stats.folds, stats.elapsed
    );
}
