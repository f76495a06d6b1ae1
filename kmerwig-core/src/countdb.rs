//! K-mer count database collaborators.
//!
//! The scanning engine only needs two things from a count database: the k-mer
//! length it was built with, and the counts of every k-mer window of a read.
//! `KmerCountSource` is that seam; `DumpKmerTable` is the bundled
//! implementation backed by a textual count dump.

use std::io::BufRead;
use std::path::Path;

use fxhash::FxHashMap;

use crate::errors::{Result, ScanError};
use crate::utils::{get_dynamic_reader, reverse_complement};

/// A randomly-queryable k-mer count database.
pub trait KmerCountSource {
    /// The fixed k-mer length the database was built with.
    fn kmer_length(&self) -> usize;

    /// Replaces `counts` with one count per k-mer window of `seq`, in
    /// left-to-right order. Windows the database cannot represent (any
    /// non-ACGT byte, including `N`) count 0; distinguishing those from
    /// genuinely absent k-mers is the caller's masking step, not the
    /// database's.
    fn counts_for_read(&self, seq: &[u8], counts: &mut Vec<u32>);
}

/// An in-memory k-mer count table loaded from a count dump: one
/// `KMER<TAB>COUNT` line per k-mer, optionally gzipped.
///
/// Dumps produced by canonical counting store a single orientation per
/// k-mer, so lookups fall back to the reverse complement of the queried
/// window when the forward orientation is absent.
pub struct DumpKmerTable {
    kmer_size: usize,
    counts: FxHashMap<Vec<u8>, u32>,
}

impl DumpKmerTable {
    /// Loads a count dump for random-access window queries.
    ///
    /// The k-mer length is taken from the first record; mixed-length or
    /// otherwise malformed records are rejected, as is an empty dump.
    pub fn open_for_random_access<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = get_dynamic_reader(path.as_ref())?;
        let mut counts = FxHashMap::default();
        let mut kmer_size = 0;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let (kmer, count) = parse_dump_record(&line, index + 1)?;
            if kmer_size == 0 {
                kmer_size = kmer.len();
            } else if kmer.len() != kmer_size {
                return Err(ScanError::BadDumpRecord {
                    line: index + 1,
                    reason: format!("expected a {}-mer, found {} bases", kmer_size, kmer.len()),
                });
            }
            counts.insert(kmer, count);
        }

        if kmer_size == 0 {
            return Err(ScanError::EmptyDump {
                path: path.as_ref().display().to_string(),
            });
        }

        Ok(DumpKmerTable { kmer_size, counts })
    }

    /// Number of distinct k-mers in the table.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    fn lookup(&self, window: &[u8]) -> u32 {
        if !window.iter().all(|&b| matches!(b, b'A' | b'C' | b'G' | b'T')) {
            return 0;
        }
        if let Some(&count) = self.counts.get(window) {
            return count;
        }
        self.counts
            .get(&reverse_complement(window))
            .copied()
            .unwrap_or(0)
    }
}

impl KmerCountSource for DumpKmerTable {
    fn kmer_length(&self) -> usize {
        self.kmer_size
    }

    fn counts_for_read(&self, seq: &[u8], counts: &mut Vec<u32>) {
        counts.clear();
        if seq.len() < self.kmer_size {
            return;
        }
        counts.reserve(seq.len() - self.kmer_size + 1);
        for window in seq.windows(self.kmer_size) {
            counts.push(self.lookup(window));
        }
    }
}

/// Streams a count dump and returns the sum of all counters.
pub fn kmer_sum<P: AsRef<Path>>(path: P) -> Result<u64> {
    let reader = get_dynamic_reader(path.as_ref())?;
    let mut sum: u64 = 0;
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let (_, count) = parse_dump_record(&line, index + 1)?;
        sum += u64::from(count);
    }
    Ok(sum)
}

fn parse_dump_record(line: &str, lineno: usize) -> Result<(Vec<u8>, u32)> {
    let mut fields = line.split_whitespace();
    let (Some(kmer), Some(count)) = (fields.next(), fields.next()) else {
        return Err(ScanError::BadDumpRecord {
            line: lineno,
            reason: format!("expected KMER<TAB>COUNT, found '{}'", line),
        });
    };
    let count = count.parse::<u32>().map_err(|_| ScanError::BadDumpRecord {
        line: lineno,
        reason: format!("invalid counter '{}'", count),
    })?;
    Ok((kmer.to_ascii_uppercase().into_bytes(), count))
}
