//! HMMER 3 plain-text report parser.
//!
//! Reads the default output of `hmmscan` and `hmmsearch` (HMMER 3.x) and
//! yields one [`QueryResult`](crate::model::QueryResult) per query record.
//!
//! ## Record layout
//!
//! A report starts with a `#` preamble naming the program and databases,
//! then holds one record per query, each closed by `//`:
//!
//! ```text
//! Query:       myoglobin  [L=154]
//! Scores for complete sequence (score includes all domains):
//!    --- full sequence ---   --- best 1 domain ---    -#dom-
//!     E-value  score  bias    E-value  score  bias    exp  N  Model    Description
//!     ------- ------ -----    ------- ------ -----   ---- --  -------- -----------
//!     6.4e-21   74.6   0.3    9.2e-21   74.0   0.2    1.3  1  Globin   Globin
//!
//! Domain annotation for each model (and alignments):
//! >> Globin  Globin
//!    #    score  bias  c-Evalue  i-Evalue hmmfrom  hmm to    alifrom  ali to    envfrom  env to     acc
//!  ---   ------ ----- --------- --------- ------- -------    ------- -------    ------- -------    ----
//!    1 !   74.0   0.2   6.7e-25   9.2e-21       1     107 [.       7     112 ..       7     113 .. 0.97
//!
//!   Alignments for each domain:
//!   == domain 1  score: 74.0 bits;  conditional E-value: 6.7e-25
//!     Globin   1 qkalvkaswekvkanaeeigaeilkrlfkaypdtkklFkkfgdls ... 48
//!                ...
//! //
//! ```
//!
//! Alignments are wrapped by HMMER into fixed-width blocks; the parser
//! concatenates them back into one string per track.
//!
//! With `--noali` the alignment section is absent and every HSP has no
//! alignment.

mod alignment;
mod cursor;
mod domain_table;
mod hit_table;
mod line;
pub mod reader;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use thiserror::Error;

pub use alignment::TrackFault;
pub use reader::{Reader, RecordsIntoIter, RecordsIter};

/// Errors that can occur while parsing a report.
#[derive(Error, Debug)]
pub enum HmmerError {
    #[error("Failed to read report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed record at line {line}: {reason}\n  {content}")]
    MalformedRecord {
        line: usize,
        content: String,
        reason: String,
    },

    #[error("Inconsistent alignment for domain {domain} of hit '{hit}' (query '{query}'): {reason}")]
    TrackAlignment {
        query: String,
        hit: String,
        domain: usize,
        reason: TrackFault,
    },

    #[error("Report ended at line {line} inside the record of query '{query}' (missing '//')")]
    UnexpectedEof { query: String, line: usize },
}

/// Result type for report parsing.
pub type HmmerResult<T> = std::result::Result<T, HmmerError>;

/// Parses a report from any reader, lazily, one query record at a time.
pub fn parse<R: Read>(rdr: R) -> RecordsIntoIter<R> {
    Reader::new(rdr).into_records()
}

/// Parses a report held in memory.
pub fn parse_str(content: &str) -> RecordsIntoIter<&[u8]> {
    parse(content.as_bytes())
}

/// Opens and parses a report file.
pub fn parse_file<P: AsRef<Path>>(path: P) -> HmmerResult<RecordsIntoIter<File>> {
    Ok(Reader::from_path(path)?.into_records())
}
