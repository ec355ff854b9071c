//! # hmmertext - HMMER 3 text report parser
//!
//! Reads the plain-text reports written by `hmmscan` and `hmmsearch` and
//! returns one structured record per query.
//!
//! ## Architecture
//!
//! - `model`: query results, hits, domains (HSPs) and their alignments
//! - `hmmer`: the report reader, split by report zone
//! - `options`: parser settings
//!
//! ## Example
//!
//! ```no_run
//! use hmmertext::hmmer;
//!
//! for result in hmmer::parse_file("scan.out")? {
//!     let result = result?;
//!     for hit in &result {
//!         println!("{}\t{}\t{:e}", result.id, hit.id, hit.evalue);
//!     }
//! }
//! # Ok::<(), hmmertext::hmmer::HmmerError>(())
//! ```

pub mod hmmer;
pub mod model;
pub mod options;
