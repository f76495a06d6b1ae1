mod counts;
mod kmersum;

use anyhow::Result;
use clap::Command;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const BIN_NAME: &str = "kmerwig";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .author("Databio")
        .about("Annotate genome FASTA files with per-position k-mer occurrence counts from a precomputed count database.")
        .subcommand_required(true)
        .subcommand(counts::cli::create_counts_cli())
        .subcommand(kmersum::cli::create_sum_cli())
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();

    match matches.subcommand() {
        //
        // GENOME COUNTS
        //
        Some((counts::cli::COUNTS_CMD, matches)) => {
            counts::handlers::run_counts(matches)?;
        }

        //
        // KMER SUM
        //
        Some((kmersum::cli::SUM_CMD, matches)) => {
            kmersum::handlers::run_sum(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
