//! GeneBank Create Binary
//!
//! Builds a B-tree of subsequence counts from a GenBank file.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::time::Instant;

use clap::error::ErrorKind;
use clap::{value_parser, CommandFactory, Parser};
use genebank::sequence::{self, GenBankScanner};
use genebank::storage::Metadata;
use genebank::{BTree, Config};
use tracing_subscriber::{fmt, EnvFilter};

/// GeneBank B-tree builder
#[derive(Parser, Debug)]
#[command(name = "genebank-create")]
#[command(about = "Count fixed-length DNA subsequences of a GenBank file into a B-tree")]
#[command(version, allow_negative_numbers = true)]
struct Args {
    /// Use the node cache (0 = no, 1 = yes)
    #[arg(value_parser = value_parser!(u8).range(0..=1))]
    cache: u8,

    /// B-tree degree (below 2 = largest degree whose node fits one 4096-byte block)
    degree: i64,

    /// GenBank input file
    gbk_file: PathBuf,

    /// Subsequence length in bases
    #[arg(value_parser = value_parser!(u8).range(1..=31))]
    sequence_length: u8,

    /// Cache capacity in nodes (ignored without cache)
    cache_size: usize,

    /// Debug level: -1 quiet, 0 timing, 1 per-key tracing and a `dump` file
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
        tracing::error!("Failed to build tree: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> genebank::Result<()> {
    let seq_len = usize::from(args.sequence_length);
    let degree = Config::degree_from_arg(args.degree)?;
    let shown_degree = degree.map_or_else(Metadata::auto_degree, u64::from);

    let tree_path = PathBuf::from(format!(
        "{}.btree.data.{}.{}",
        args.gbk_file.display(),
        seq_len,
        shown_degree
    ));

    let config = Config::builder()
        .path(&tree_path)
        .degree(degree)
        .cache_size(if args.cache == 1 { args.cache_size } else { 0 })
        .debug(args.debug > 0)
        .build();

    tracing::info!("GeneBank v{}", genebank::VERSION);
    tracing::info!("Input: {}", args.gbk_file.display());
    tracing::info!("Tree file: {}", tree_path.display());

    let mut tree = BTree::create(config)?;
    let scanner = GenBankScanner::new(BufReader::new(File::open(&args.gbk_file)?), seq_len)?;

    let start = Instant::now();
    let mut windows = 0u64;
    for key in scanner {
        tree.insert_or_increment(key?)?;
        windows += 1;
    }

    if args.debug > 0 {
        let height = tree.check_invariants()?;
        let mut out = BufWriter::new(File::create("dump")?);
        let lines = tree.dump_to(&mut out, |key| sequence::decode(seq_len, key))?;
        tracing::debug!(height, lines, "Wrote dump");
    }

    let stats = tree.stats();
    if args.debug >= 0 {
        tracing::info!(
            windows,
            nodes = stats.node_count,
            "Finished in {} ms",
            start.elapsed().as_millis()
        );
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
