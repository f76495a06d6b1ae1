use std::io;
use thiserror::Error;

/// Error type for kmerwig-core operations.
#[derive(Error, Debug)]
pub enum ScanError {
    /// IO error occurred during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Could not open an input file.
    #[error("Failed to open file: {path}: {source}")]
    OpenFile { path: String, source: io::Error },

    /// The sequence file's first byte is not a record marker.
    #[error("{path} doesn't appear to be a FASTA file")]
    NotFasta { path: String },

    /// `fill_chunk` was called after the stream was fully consumed.
    #[error("Tried to read past the last record in the FASTA stream")]
    StreamExhausted,

    /// A k-mer dump record could not be parsed.
    #[error("Invalid k-mer dump record at line {line}: {reason}")]
    BadDumpRecord { line: usize, reason: String },

    /// The k-mer dump holds no records.
    #[error("No k-mer records found in {path}")]
    EmptyDump { path: String },
}

/// Result type alias for kmerwig-core operations.
pub type Result<T> = std::result::Result<T, ScanError>;
