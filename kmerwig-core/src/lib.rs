//! Core library for kmerwig: annotate genome FASTA files with per-position
//! k-mer occurrence counts and emit them as sparse fixed-step wiggle.
//!
//! The engine is a single-threaded pull loop over two collaborators: a
//! [`fasta::FastaChunkReader`] that decodes one record at a time into
//! fixed-size chunks, and a [`scan::ChromScan`] that owns the rotating
//! sequence buffer, masks and clamps the counts of every k-mer window, and
//! serializes the result. Counts come from any [`countdb::KmerCountSource`];
//! [`countdb::DumpKmerTable`] backs that trait with a textual k-mer count
//! dump.

pub mod countdb;
pub mod errors;
pub mod fasta;
pub mod scan;
pub mod utils;

pub use countdb::{DumpKmerTable, KmerCountSource, kmer_sum};
pub use errors::{Result, ScanError};
pub use fasta::{ChunkStatus, FastaChunkReader};
pub use scan::{ChromScan, DEFAULT_CHUNK_SIZE, scan_genome, scan_genome_with_chunk_size};
