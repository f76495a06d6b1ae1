use clap::{Arg, Command};

pub const COUNTS_CMD: &str = "counts";

/// Creates the counts CLI Command object
pub fn create_counts_cli() -> Command {
    Command::new(COUNTS_CMD)
        .about("Score every position of a genome FASTA file with its k-mer count and emit fixed-step wiggle")
        .arg(
            Arg::new("database")
                .long("database")
                .short('d')
                .help("Path to the k-mer count dump (KMER<TAB>COUNT lines, optionally gzipped)")
                .required(true),
        )
        .arg(
            Arg::new("fasta")
                .long("fasta")
                .short('f')
                .help("Path to the genome FASTA file to score")
                .required(true),
        )
        .arg(
            Arg::new("maxcounter")
                .long("max-counter")
                .short('x')
                .value_parser(clap::value_parser!(u32))
                .default_value("255")
                .help("Truncate k-mer counts occurring more than this many times"),
        )
        .arg(
            Arg::new("chrom")
                .long("chrom")
                .short('c')
                .help("Score only the named chromosome"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .default_value("-")
                .help("Output wiggle path, '-' for stdout"),
        )
}
