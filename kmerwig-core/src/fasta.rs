//! Chunked FASTA record reader.
//!
//! Decodes one record at a time from a byte stream into the fixed-size
//! buffer of a [`ChromScan`], skipping line terminators and uppercasing
//! sequence bytes. The stream is consumed strictly forward; when a new `>`
//! marker ends a record mid-chunk, the marker byte is held back and re-read
//! as the start of the next record, so gzip-compressed inputs (which cannot
//! seek) work the same as plain files.

use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::errors::{Result, ScanError};
use crate::scan::ChromScan;
use crate::utils::get_dynamic_reader;

/// Outcome of a single `fill_chunk` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkStatus {
    /// The buffer reached capacity and the record continues.
    BufferFull,
    /// The record ended at a new `>` marker; more records may follow.
    RecordFinished,
    /// The record ended and no further records will be scanned.
    StreamFinished,
}

impl ChunkStatus {
    /// True when the current record has no more data.
    pub fn record_finished(&self) -> bool {
        matches!(self, ChunkStatus::RecordFinished | ChunkStatus::StreamFinished)
    }

    pub fn stream_finished(&self) -> bool {
        matches!(self, ChunkStatus::StreamFinished)
    }
}

/// Forward-only FASTA reader that fills [`ChromScan`] buffers chunk by
/// chunk, optionally restricted to a single named record.
pub struct FastaChunkReader {
    reader: BufReader<Box<dyn Read>>,
    /// One byte of pushback: a `>` seen mid-chunk is re-read as the start of
    /// the next record.
    carry: Option<u8>,
    filter: Option<String>,
    end_reached: bool,
}

impl FastaChunkReader {
    /// Opens a FASTA file (plain or gzipped) for chunked scanning.
    ///
    /// Fails with [`ScanError::NotFasta`] when the first byte of the stream
    /// is not a `>` record marker.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = get_dynamic_reader(path.as_ref())?;
        let mut first = [0u8; 1];
        let n = reader.read(&mut first)?;
        if n == 0 || first[0] != b'>' {
            return Err(ScanError::NotFasta {
                path: path.as_ref().display().to_string(),
            });
        }
        Ok(FastaChunkReader {
            reader,
            carry: Some(b'>'),
            filter: None,
            end_reached: false,
        })
    }

    /// Restricts scanning to the record whose id matches `name` exactly.
    /// An empty name clears the restriction. Must be configured before the
    /// first `fill_chunk` to take effect.
    pub fn set_filter(&mut self, name: &str) {
        self.filter = if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        };
    }

    /// True once the stream has been fully consumed.
    pub fn finished(&self) -> bool {
        self.end_reached
    }

    /// Fills the next chunk of `chrom`'s buffer.
    ///
    /// When `chrom` has no id yet, the reader first scans forward to the
    /// next record header and assigns its id, skipping records that do not
    /// match the configured filter. If the stream ends before a header is
    /// found, `StreamFinished` is returned with the id still unassigned.
    ///
    /// Sequence bytes are then copied into `chrom.buffer` from
    /// `chrom.start`, skipping line terminators and uppercasing, until the
    /// buffer is full, a new record begins, or the stream ends. With a
    /// filter configured, the end of the matching record also finishes the
    /// stream: no further records are wanted.
    pub fn fill_chunk(&mut self, chrom: &mut ChromScan) -> Result<ChunkStatus> {
        if self.end_reached {
            return Err(ScanError::StreamExhausted);
        }

        if chrom.id.is_empty() {
            loop {
                loop {
                    match self.next_byte()? {
                        None => {
                            self.end_reached = true;
                            return Ok(ChunkStatus::StreamFinished);
                        }
                        Some(b'>') => break,
                        Some(_) => {}
                    }
                }
                let mut id = String::new();
                loop {
                    match self.next_byte()? {
                        None => {
                            self.end_reached = true;
                            return Ok(ChunkStatus::StreamFinished);
                        }
                        Some(b'\n') => break,
                        Some(b'\r') => {}
                        Some(byte) => id.push(byte as char),
                    }
                }
                match &self.filter {
                    Some(want) if *want != id => continue,
                    _ => {
                        chrom.id = id;
                        break;
                    }
                }
            }
        }

        let capacity = chrom.buffer.len();
        let mut i = chrom.start;
        let status = loop {
            if i == capacity {
                chrom.end = capacity;
                break ChunkStatus::BufferFull;
            }
            match self.next_byte()? {
                None => {
                    self.end_reached = true;
                    chrom.end = i;
                    chrom.last_chrom = true;
                    break ChunkStatus::StreamFinished;
                }
                Some(b'\n') | Some(b'\r') => {}
                Some(b'>') => {
                    self.carry = Some(b'>');
                    chrom.end = i;
                    if self.filter.is_some() {
                        // only one record is ever wanted
                        chrom.last_chrom = true;
                        break ChunkStatus::StreamFinished;
                    }
                    break ChunkStatus::RecordFinished;
                }
                Some(byte) => {
                    chrom.buffer[i] = byte.to_ascii_uppercase();
                    i += 1;
                }
            }
        };
        chrom.total_size += chrom.end - chrom.start;

        Ok(status)
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(byte) = self.carry.take() {
            return Ok(Some(byte));
        }
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}
