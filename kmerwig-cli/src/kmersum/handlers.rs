use anyhow::{Context, Result};
use clap::ArgMatches;

use kmerwig_core::kmer_sum;

pub fn run_sum(matches: &ArgMatches) -> Result<()> {
    let database = matches
        .get_one::<String>("database")
        .expect("database path is required");

    let sum = kmer_sum(database)
        .with_context(|| format!("Failed to read k-mer count database: {}", database))?;
    println!("{}", sum);

    Ok(())
}
