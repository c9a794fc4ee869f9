//! GeneBank Search Binary
//!
//! Looks up query subsequences in a tree built by `genebank-create`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{value_parser, CommandFactory, Parser};
use genebank::{sequence, BTree, Config, GeneBankError};
use tracing_subscriber::{fmt, EnvFilter};

/// GeneBank B-tree search
#[derive(Parser, Debug)]
#[command(name = "genebank-search")]
#[command(about = "Print occurrence counts for query subsequences")]
#[command(version, allow_negative_numbers = true)]
struct Args {
    /// Use the node cache (0 = no, 1 = yes)
    #[arg(value_parser = value_parser!(u8).range(0..=1))]
    cache: u8,

    /// Tree file produced by genebank-create
    btree_file: PathBuf,

    /// Query file, one subsequence per line (all the same length)
    query_file: PathBuf,

    /// Cache capacity in nodes (ignored without cache)
    cache_size: usize,

    /// Debug level: -1 quiet, 0 normal, 1 per-key tracing
    #[arg(default_value = "0", value_parser = value_parser!(i8).range(-1..=1))]
    debug: i8,
}

fn main() {
    let args = Args::parse();

    if args.cache == 1 && args.cache_size == 0 {
        Args::command()
            .error(
                ErrorKind::ValueValidation,
                "cache size must be at least 1 when the cache is enabled",
            )
            .exit();
    }

    init_tracing(args.debug);

    if let Err(e) = run(&args) {
        tracing::error!("Search failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> genebank::Result<()> {
    let config = Config::builder()
        .path(&args.btree_file)
        .read_only(true)
        .cache_size(if args.cache == 1 { args.cache_size } else { 0 })
        .debug(args.debug > 0)
        .build();

    let mut tree = BTree::open(config)?;
    let queries = BufReader::new(File::open(&args.query_file)?);

    let mut seq_len: Option<usize> = None;
    for line in queries.lines() {
        let query = line?.trim().to_lowercase();
        if query.is_empty() {
            continue;
        }

        let len = query.chars().count();
        let expected = *seq_len.get_or_insert(len);
        if len != expected {
            return Err(GeneBankError::WrongSequenceLength {
                expected,
                actual: len,
            });
        }

        let key = sequence::encode(&query)?;
        match tree.count(key)? {
            Some(count) => println!("{}: {}", query, count),
            None => tracing::debug!("{}: not found", query),
        }
    }

    tree.shutdown()
}

/// Initialize tracing with a default filter derived from the debug level
fn init_tracing(debug: i8) {
    let default = match debug {
        d if d < 0 => "warn",
        0 => "info",
        _ => "info,genebank=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt().with_env_filter(filter).with_target(true).init();
}
