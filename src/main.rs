use std::path;
use std::process;

use bytesize::ByteSize;
use env_logger;
use log;

use ext_sort_i32::ExternalSorterBuilder;

fn main() {
    let arg_parser = build_arg_parser();

    let log_level: log::LevelFilter = arg_parser.value_of_t_or_exit("log_level");
    init_logger(log_level);

    let tmp_dir: Option<&str> = arg_parser.value_of("tmp_dir");
    let block_size = arg_parser.value_of("block_size").expect("value has default");
    let fan_out: usize = arg_parser.value_of_t_or_exit("fan_out");

    let input = arg_parser.value_of("input").expect("value is required");
    let output = arg_parser.value_of("output").expect("value is required");

    let mut sorter_builder = ExternalSorterBuilder::new()
        .with_block_size(block_size.parse::<ByteSize>().expect("value is pre-validated").as_u64())
        .with_fan_out_limit(fan_out);

    if let Some(tmp_dir) = tmp_dir {
        sorter_builder = sorter_builder.with_tmp_dir(path::Path::new(tmp_dir));
    }

    let sorter = match sorter_builder.build() {
        Ok(sorter) => sorter,
        Err(err) => {
            log::error!("sorter initialization error: {}", err);
            process::exit(1);
        }
    };

    if let Err(err) = sorter.sort(path::Path::new(input), path::Path::new(output)) {
        log::error!("data sorting error: {}", err);
        process::exit(1);
    }
}

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

fn build_arg_parser() -> clap::ArgMatches {
    clap::App::new("ext-sort-i32")
        .about("external sorter of binary 32-bit integer files")
        .arg(
            clap::Arg::new("input")
                .short('i')
                .long("input")
                .help("file to be sorted")
                .required(true)
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("output")
                .short('o')
                .long("output")
                .help("result file")
                .required(true)
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("log_level")
                .short('l')
                .long("loglevel")
                .help("logging level")
                .takes_value(true)
                .default_value("info")
                .possible_values(LOG_LEVELS),
        )
        .arg(
            clap::Arg::new("tmp_dir")
                .short('d')
                .long("tmp-dir")
                .help("directory to be used to store temporary data")
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("block_size")
                .short('b')
                .long("block-size")
                .help("size of a block sorted in memory")
                .takes_value(true)
                .default_value("4KiB")
                .validator(|v| match v.parse::<ByteSize>() {
                    Ok(_) => Ok(()),
                    Err(err) => Err(format!("Block size format incorrect: {}", err)),
                }),
        )
        .arg(
            clap::Arg::new("fan_out")
                .short('f')
                .long("fan-out")
                .help("maximum number of runs kept before they are folded")
                .takes_value(true)
                .default_value("1024")
                .validator(|v| match v.parse::<usize>() {
                    Ok(0) => Err("Fan-out must be positive".to_string()),
                    Ok(_) => Ok(()),
                    Err(err) => Err(format!("Fan-out format incorrect: {}", err)),
                }),
        )
        .get_matches()
}

fn init_logger(log_level: log::LevelFilter) {
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();
}
