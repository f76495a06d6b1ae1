//! Chromosome scan state - fixed-memory k-mer scoring over unbounded records.
//!
//! A record is consumed in chunks through a rotating buffer: each chunk keeps
//! the last `kmer_size - 1` bytes of its predecessor (the overlap region) so
//! every window that straddles a chunk boundary is scored exactly once,
//! without re-reading the source stream.

use std::io::{self, Write};

use indicatif::ProgressBar;

use crate::countdb::KmerCountSource;
use crate::errors::Result;
use crate::fasta::FastaChunkReader;

/// Default number of new sequence bytes per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1_000_000;

/// Per-record scan state: the rotating sequence buffer and the score arrays
/// of every chunk scored so far.
pub struct ChromScan {
    kmer_size: usize,
    max_counter: u32,
    chunk_size: usize,
    pub(crate) id: String,
    /// Raw uppercased sequence bytes; capacity `chunk_size + kmer_size - 1`.
    pub(crate) buffer: Vec<u8>,
    /// Index where new data resumes; `kmer_size - 1` after a rotation.
    pub(crate) start: usize,
    /// Exclusive upper bound of valid data in the current chunk.
    pub(crate) end: usize,
    /// Total sequence length scanned so far for this record.
    pub(crate) total_size: usize,
    chunks: Vec<Vec<u32>>,
    pub(crate) last_chrom: bool,
}

impl ChromScan {
    pub fn new(kmer_size: usize, max_counter: u32) -> Self {
        Self::with_chunk_size(kmer_size, max_counter, DEFAULT_CHUNK_SIZE)
    }

    /// Like [`ChromScan::new`] with an explicit chunk size. Output never
    /// depends on the chunk size; small sizes force buffer rotations on
    /// short inputs, which is what the boundary tests need.
    pub fn with_chunk_size(kmer_size: usize, max_counter: u32, chunk_size: usize) -> Self {
        assert!(kmer_size > 0, "kmer size must be positive");
        assert!(chunk_size > 0, "chunk size must be positive");
        ChromScan {
            kmer_size,
            max_counter,
            chunk_size,
            id: String::new(),
            buffer: vec![0; chunk_size + kmer_size - 1],
            start: 0,
            end: 0,
            total_size: 0,
            chunks: Vec::new(),
            last_chrom: false,
        }
    }

    /// Record name; empty until the reader assigns it.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kmer_size(&self) -> usize {
        self.kmer_size
    }

    /// Total sequence length scanned so far for this record.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// True once the reader has signaled that no further records follow.
    pub fn last_chrom(&self) -> bool {
        self.last_chrom
    }

    /// Score arrays of every chunk scored so far, in scan order.
    pub fn chunks(&self) -> &[Vec<u32>] {
        &self.chunks
    }

    /// Appends a new, empty score array and returns its index. Must be
    /// called before each `fill_chunk`.
    pub fn begin_chunk(&mut self) -> usize {
        self.chunks.push(Vec::new());
        self.chunks.len() - 1
    }

    /// Queries `db` for the counts of every window of `buffer[0..end)` and
    /// rewrites them into the current chunk's score array with masking and
    /// clamping applied.
    ///
    /// A window overlapping any `N` reads as 0 (no coverage). A raw count of
    /// 0 on an unmasked window is floored to 1 - present in the genome but
    /// below the database's reporting threshold - and raw counts above
    /// `max_counter` are truncated to it. Both thresholds are part of the
    /// output contract.
    pub fn score_chunk<D: KmerCountSource + ?Sized>(&mut self, db: &D) {
        let k = self.kmer_size;
        let max_counter = self.max_counter;
        let window_count = (self.end + 1).saturating_sub(k);

        let buffer = &self.buffer;
        let scores = self
            .chunks
            .last_mut()
            .expect("begin_chunk must be called before score_chunk");
        db.counts_for_read(&buffer[..self.end], scores);
        scores.truncate(window_count);
        if scores.is_empty() {
            return;
        }

        // Running count of ambiguous bases in the current window; updated in
        // O(1) from the bases entering and leaving the window.
        let mut n_count = buffer[..k].iter().filter(|&&b| b == b'N').count();
        scores[0] = if n_count > 0 {
            0
        } else {
            clamp_count(scores[0], max_counter)
        };
        for i in 1..scores.len() {
            if buffer[i - 1] == b'N' {
                n_count -= 1;
            }
            if buffer[i + k - 1] == b'N' {
                n_count += 1;
            }
            scores[i] = if n_count > 0 {
                0
            } else {
                clamp_count(scores[i], max_counter)
            };
        }
    }

    /// Copies the trailing `kmer_size - 1` bytes of the just-completed full
    /// chunk to the buffer front so windows spanning the boundary survive.
    /// Only valid after a chunk filled to capacity.
    pub fn rotate_buffer(&mut self) {
        let k = self.kmer_size;
        self.buffer.copy_within(self.chunk_size..self.chunk_size + k - 1, 0);
        self.start = k - 1;
    }

    /// Serializes every scored chunk as sparse fixed-step wiggle: one header
    /// per maximal run of positive scores, one score per line. Positions are
    /// 1-based and continuous across chunk boundaries; zero scores are
    /// omitted and terminate the current run.
    pub fn write_wiggle<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let mut pos: usize = 1;
        let mut in_run = false;
        for scores in &self.chunks {
            for &score in scores {
                if score > 0 {
                    if !in_run {
                        writeln!(out, "fixedStep chrom={} start={} step=1", self.id, pos)?;
                        in_run = true;
                    }
                    writeln!(out, "{}", score)?;
                } else {
                    in_run = false;
                }
                pos += 1;
            }
        }
        Ok(())
    }
}

fn clamp_count(raw: u32, max_counter: u32) -> u32 {
    if raw == 0 { 1 } else { raw.min(max_counter) }
}

/// Scans every record the reader yields and writes its wiggle output,
/// returning the number of records emitted.
///
/// This is the single-threaded pull loop: fill a chunk, score it, rotate
/// the buffer while the record continues, serialize when it ends, and start
/// over on the next record until the stream is exhausted. Zero emitted
/// records with a filter configured means the filter never matched.
pub fn scan_genome<D: KmerCountSource + ?Sized, W: Write>(
    db: &D,
    reader: &mut FastaChunkReader,
    max_counter: u32,
    out: &mut W,
) -> Result<usize> {
    scan_genome_with_chunk_size(db, reader, max_counter, DEFAULT_CHUNK_SIZE, out)
}

/// [`scan_genome`] with an explicit chunk size.
pub fn scan_genome_with_chunk_size<D: KmerCountSource + ?Sized, W: Write>(
    db: &D,
    reader: &mut FastaChunkReader,
    max_counter: u32,
    chunk_size: usize,
    out: &mut W,
) -> Result<usize> {
    let kmer_size = db.kmer_length();
    let spinner = ProgressBar::new_spinner();
    let mut records = 0;

    loop {
        let mut chrom = ChromScan::with_chunk_size(kmer_size, max_counter, chunk_size);
        loop {
            chrom.begin_chunk();
            let status = reader.fill_chunk(&mut chrom)?;
            if chrom.id().is_empty() {
                // stream ran out before another (matching) record header
                spinner.finish_and_clear();
                return Ok(records);
            }
            spinner.set_message(format!("{}: {}", chrom.id(), chrom.total_size()));
            chrom.score_chunk(db);
            if status.record_finished() {
                break;
            }
            chrom.rotate_buffer();
        }
        eprintln!("{} ({})", chrom.id(), chrom.total_size());
        chrom.write_wiggle(out)?;
        records += 1;
        if chrom.last_chrom() {
            break;
        }
    }

    spinner.finish_and_clear();
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    /// Returns a fixed raw count per window, independent of the window's
    /// content. Lets the masking tests pin raw counts exactly.
    struct FixedCounts {
        k: usize,
        raw: Vec<u32>,
    }

    impl KmerCountSource for FixedCounts {
        fn kmer_length(&self) -> usize {
            self.k
        }

        fn counts_for_read(&self, seq: &[u8], counts: &mut Vec<u32>) {
            counts.clear();
            let windows = (seq.len() + 1).saturating_sub(self.k);
            counts.extend_from_slice(&self.raw[..windows.min(self.raw.len())]);
        }
    }

    fn load_chunk(chrom: &mut ChromScan, seq: &[u8]) {
        let start = chrom.start;
        chrom.buffer[start..start + seq.len()].copy_from_slice(seq);
        chrom.end = start + seq.len();
        chrom.total_size += seq.len();
    }

    #[test]
    fn masking_floors_and_clamps_per_window() {
        let db = FixedCounts {
            k: 3,
            raw: vec![5, 0, 11, 2, 7, 3, 9],
        };
        let mut chrom = ChromScan::with_chunk_size(3, 10, 64);
        chrom.id = "chrT".to_string();
        chrom.begin_chunk();
        load_chunk(&mut chrom, b"ACGTNACGT");
        chrom.score_chunk(&db);

        // windows 2..=4 overlap the N at position 4; window 1 has raw count
        // 0 and floors to 1; window 2 would clamp to 10 but the mask wins
        assert_eq!(chrom.chunks()[0], vec![5, 1, 0, 0, 0, 3, 9]);
    }

    #[test]
    fn clamps_to_max_counter_without_masking() {
        let db = FixedCounts {
            k: 3,
            raw: vec![11, 0, 2],
        };
        let mut chrom = ChromScan::with_chunk_size(3, 10, 64);
        chrom.id = "chrT".to_string();
        chrom.begin_chunk();
        load_chunk(&mut chrom, b"ACGTA");
        chrom.score_chunk(&db);
        assert_eq!(chrom.chunks()[0], vec![10, 1, 2]);
    }

    #[test]
    fn score_array_length_matches_window_count() {
        for len in 0..8usize {
            let db = FixedCounts {
                k: 4,
                raw: vec![1; 8],
            };
            let mut chrom = ChromScan::with_chunk_size(4, 255, 16);
            chrom.id = "chrT".to_string();
            chrom.begin_chunk();
            load_chunk(&mut chrom, &b"ACGTACGT"[..len]);
            chrom.score_chunk(&db);
            assert_eq!(chrom.chunks()[0].len(), len.saturating_sub(3));
        }
    }

    #[test]
    fn zero_window_chunks_score_nothing() {
        let db = FixedCounts { k: 3, raw: vec![] };
        let mut chrom = ChromScan::with_chunk_size(3, 255, 8);
        chrom.id = "chrT".to_string();
        chrom.begin_chunk();
        load_chunk(&mut chrom, b"AC");
        chrom.score_chunk(&db);
        assert!(chrom.chunks()[0].is_empty());
    }

    #[test]
    fn rotation_carries_trailing_overlap() {
        let mut chrom = ChromScan::with_chunk_size(4, 255, 8);
        chrom.id = "chrT".to_string();
        chrom.begin_chunk();
        load_chunk(&mut chrom, b"AACCGGTTACG");
        assert_eq!(chrom.end, 11);

        chrom.rotate_buffer();
        assert_eq!(chrom.start, 3);
        assert_eq!(&chrom.buffer[..3], b"ACG");
    }

    #[test]
    fn wiggle_runs_break_on_zero_scores() {
        let mut chrom = ChromScan::with_chunk_size(3, 255, 8);
        chrom.id = "chr1".to_string();
        chrom.chunks = vec![vec![2, 3, 0, 0, 1], vec![4, 0, 5]];

        let mut out = Vec::new();
        chrom.write_wiggle(&mut out).unwrap();
        let expected = "\
fixedStep chrom=chr1 start=1 step=1
2
3
fixedStep chrom=chr1 start=5 step=1
1
4
fixedStep chrom=chr1 start=8 step=1
5
";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn wiggle_output_is_empty_for_all_zero_scores() {
        let mut chrom = ChromScan::with_chunk_size(3, 255, 8);
        chrom.id = "chr1".to_string();
        chrom.chunks = vec![vec![0, 0, 0]];

        let mut out = Vec::new();
        chrom.write_wiggle(&mut out).unwrap();
        assert!(out.is_empty());
    }

    /// Decodes fixed-step text back into a dense per-position score array.
    fn decode_fixed_step(text: &str) -> (String, Vec<u32>) {
        let mut chrom = String::new();
        let mut scores: Vec<u32> = Vec::new();
        let mut pos = 0usize;
        for line in text.lines() {
            if let Some(rest) = line.strip_prefix("fixedStep ") {
                let mut fields = rest.split(' ');
                chrom = fields
                    .next()
                    .and_then(|f| f.strip_prefix("chrom="))
                    .unwrap()
                    .to_string();
                pos = fields
                    .next()
                    .and_then(|f| f.strip_prefix("start="))
                    .unwrap()
                    .parse()
                    .unwrap();
            } else {
                while scores.len() + 1 < pos {
                    scores.push(0);
                }
                scores.push(line.parse().unwrap());
                pos += 1;
            }
        }
        (chrom, scores)
    }

    #[test]
    fn wiggle_serialization_round_trips() {
        let mut chrom = ChromScan::with_chunk_size(3, 255, 8);
        chrom.id = "chr2".to_string();
        chrom.chunks = vec![vec![0, 7, 7, 0, 1], vec![2], vec![0, 0, 3]];

        let mut out = Vec::new();
        chrom.write_wiggle(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let (id, scores) = decode_fixed_step(&text);
        assert_eq!(id, "chr2");

        let mut reencoded = ChromScan::with_chunk_size(3, 255, 8);
        reencoded.id = id;
        reencoded.chunks = vec![scores];
        let mut out2 = Vec::new();
        reencoded.write_wiggle(&mut out2).unwrap();
        assert_eq!(String::from_utf8(out2).unwrap(), text);
    }
}
