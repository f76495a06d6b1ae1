use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use clap::ArgMatches;

use kmerwig_core::{DumpKmerTable, FastaChunkReader, KmerCountSource, scan_genome};

/// Matches items from CLAP args before running the genome scan
pub fn run_counts(matches: &ArgMatches) -> Result<()> {
    let database = matches
        .get_one::<String>("database")
        .expect("database path is required");

    let fasta = matches
        .get_one::<String>("fasta")
        .expect("fasta path is required");

    let max_counter = *matches
        .get_one::<u32>("maxcounter")
        .expect("max-counter requires an integer value");

    let chrom = matches.get_one::<String>("chrom");

    let output = matches
        .get_one::<String>("output")
        .expect("output has a default");

    let db = DumpKmerTable::open_for_random_access(database)
        .with_context(|| format!("Failed to open k-mer count database: {}", database))?;
    eprintln!(
        "{}-mer database loaded ({} distinct k-mers)",
        db.kmer_length(),
        db.len()
    );

    let mut reader = FastaChunkReader::open(fasta)
        .with_context(|| format!("Failed to open FASTA file: {}", fasta))?;
    if let Some(chrom) = chrom {
        reader.set_filter(chrom);
    }

    let mut out: Box<dyn Write> = match output.as_str() {
        "-" => Box::new(BufWriter::new(io::stdout())),
        path => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create output file: {}", path))?,
        )),
    };

    let records = scan_genome(&db, &mut reader, max_counter, &mut out)?;
    out.flush()?;

    if records == 0 {
        match chrom {
            Some(chrom) => eprintln!("Chromosome {} not found in {}", chrom, fasta),
            None => eprintln!("No records found in {}", fasta),
        }
    }

    Ok(())
}
