//! Data model for parsed HMMER reports.
//!
//! This module contains the structures handed out by the parser:
//! - `QueryResult`: one query record, from its `Query:` line to `//`
//! - `Hit`: one row of the hit table, owning its domains
//! - `Hsp`: one domain of a hit, with statistics and the reassembled alignment
//!
//! Hits and domains keep report order. `QueryResult::get` and `Hit::get`
//! accept negative indices, counting from the end like `result[-1]`.

use std::fmt;
use std::ops::Index;
use std::slice;
use std::str::FromStr;

use thiserror::Error;

/// A two-character end marker could not be interpreted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid end type '{0}' (expected one of '..', '[.', '.]', '[]')")]
pub struct InvalidEndType(pub String);

/// A program name other than `hmmscan`/`hmmsearch`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported program '{0}' (expected hmmscan or hmmsearch)")]
pub struct UnsupportedProgram(pub String);

/// An alignment track name that is not one of the known labels.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown alignment track '{0}'")]
pub struct UnknownTrack(pub String);

/// HMMER programs whose text reports are understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Program {
    /// Sequences searched against a profile database: hits are profiles.
    Hmmscan,
    /// A profile searched against a sequence database: hits are sequences.
    Hmmsearch,
}

impl Program {
    pub fn as_str(&self) -> &'static str {
        match self {
            Program::Hmmscan => "hmmscan",
            Program::Hmmsearch => "hmmsearch",
        }
    }

    /// Returns true when the profile HMM is the query of the search.
    ///
    /// The profile always occupies the `hmmfrom/hmm to` columns and the first
    /// sequence line of an alignment block.
    pub fn profile_is_query(&self) -> bool {
        matches!(self, Program::Hmmsearch)
    }
}

impl FromStr for Program {
    type Err = UnsupportedProgram;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hmmscan" => Ok(Program::Hmmscan),
            "hmmsearch" => Ok(Program::Hmmsearch),
            other => Err(UnsupportedProgram(other.to_string())),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report preamble in force for a query record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    pub program: Program,
    /// HMMER version, e.g. `3.0`
    pub version: Option<String>,
    /// Release date printed next to the version, e.g. `March 2010`
    pub release_date: Option<String>,
    /// Query file given to the program
    pub query_file: Option<String>,
    /// Target database path
    pub target: Option<String>,
}

impl Meta {
    pub fn new(program: Program) -> Self {
        Self {
            program,
            version: None,
            release_date: None,
            query_file: None,
            target: None,
        }
    }
}

/// Whether an aligned region touches the ends of its sequence or profile.
///
/// Printed by HMMER as a two-character bracket pair after each coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndType {
    /// `..` - neither end is flush
    Internal,
    /// `[.` - starts at the first position
    StartFlush,
    /// `.]` - ends at the last position
    EndFlush,
    /// `[]` - covers the full length
    Complete,
}

impl EndType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndType::Internal => "..",
            EndType::StartFlush => "[.",
            EndType::EndFlush => ".]",
            EndType::Complete => "[]",
        }
    }

    pub fn is_start_flush(&self) -> bool {
        matches!(self, EndType::StartFlush | EndType::Complete)
    }

    pub fn is_end_flush(&self) -> bool {
        matches!(self, EndType::EndFlush | EndType::Complete)
    }
}

impl FromStr for EndType {
    type Err = InvalidEndType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ".." => Ok(EndType::Internal),
            "[." => Ok(EndType::StartFlush),
            ".]" => Ok(EndType::EndFlush),
            "[]" => Ok(EndType::Complete),
            other => Err(InvalidEndType(other.to_string())),
        }
    }
}

impl fmt::Display for EndType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A 1-based inclusive coordinate range with its end markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub from: usize,
    pub to: usize,
    pub end_type: EndType,
}

impl Span {
    pub fn new(from: usize, to: usize, end_type: EndType) -> Self {
        Self { from, to, end_type }
    }

    /// Number of positions covered.
    pub fn width(&self) -> usize {
        self.to.abs_diff(self.from) + 1
    }
}

/// Names of the tracks of a reassembled alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Track {
    ConsensusStructure,
    Reference,
    Homology,
    PosteriorProbability,
    Hit,
    Query,
}

impl Track {
    /// Label used in reports and lookups (`CS`, `RF`, `homology`, `PP`, `hit`, `query`).
    pub fn label(&self) -> &'static str {
        match self {
            Track::ConsensusStructure => "CS",
            Track::Reference => "RF",
            Track::Homology => "homology",
            Track::PosteriorProbability => "PP",
            Track::Hit => "hit",
            Track::Query => "query",
        }
    }
}

impl FromStr for Track {
    type Err = UnknownTrack;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CS" => Ok(Track::ConsensusStructure),
            "RF" => Ok(Track::Reference),
            "homology" => Ok(Track::Homology),
            "PP" => Ok(Track::PosteriorProbability),
            "hit" => Ok(Track::Hit),
            "query" => Ok(Track::Query),
            other => Err(UnknownTrack(other.to_string())),
        }
    }
}

/// Full-length alignment tracks of one domain, all of equal length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentTracks {
    /// Aligned residues of the hit (case preserved)
    pub hit_seq: String,
    /// Aligned residues of the query (case preserved)
    pub query_seq: String,
    /// Per-column match line between the two sequences
    pub homology: String,
    pub consensus_structure: Option<String>,
    pub reference: Option<String>,
    /// Posterior probabilities, `0`-`9` and `*`
    pub posterior_probability: Option<String>,
}

impl AlignmentTracks {
    /// Number of alignment columns.
    pub fn len(&self) -> usize {
        self.hit_seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hit_seq.is_empty()
    }

    /// Returns a track by name, `None` when it is absent from this alignment.
    pub fn get(&self, track: Track) -> Option<&str> {
        match track {
            Track::ConsensusStructure => self.consensus_structure.as_deref(),
            Track::Reference => self.reference.as_deref(),
            Track::Homology => Some(&self.homology),
            Track::PosteriorProbability => self.posterior_probability.as_deref(),
            Track::Hit => Some(&self.hit_seq),
            Track::Query => Some(&self.query_seq),
        }
    }
}

/// One domain of a hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Hsp {
    /// 1-based index as printed in the domain table
    pub domain_index: usize,
    pub is_included: bool,
    pub bitscore: f64,
    pub bias: f64,
    pub conditional_evalue: f64,
    pub independent_evalue: f64,
    pub hit_span: Span,
    pub query_span: Span,
    /// Envelope on the sequence side of the search
    pub env_span: Span,
    pub mean_posterior_accuracy: f64,
    /// Absent when the report carries no alignment for this domain
    pub alignment: Option<AlignmentTracks>,
}

impl Hsp {
    pub fn track(&self, track: Track) -> Option<&str> {
        self.alignment.as_ref().and_then(|aln| aln.get(track))
    }

    /// Looks up an alignment track by its label (`"CS"`, `"RF"`, `"homology"`, `"PP"`).
    pub fn annotation(&self, name: &str) -> Option<&str> {
        name.parse().ok().and_then(|track| self.track(track))
    }

    pub fn hit_seq(&self) -> Option<&str> {
        self.track(Track::Hit)
    }

    pub fn query_seq(&self) -> Option<&str> {
        self.track(Track::Query)
    }

    /// Number of alignment columns, 0 without an alignment.
    pub fn aln_len(&self) -> usize {
        self.alignment.as_ref().map_or(0, AlignmentTracks::len)
    }
}

/// Scores of the best single domain of a hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainScore {
    pub evalue: f64,
    pub bitscore: f64,
    pub bias: f64,
}

/// One matched database entry of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: String,
    /// Description from the hit table, wrapped lines joined. Possibly empty
    pub description: String,
    /// Longer description from the `>>` header, when the table cut it short
    pub full_description: Option<String>,
    /// Full-sequence E-value
    pub evalue: f64,
    /// Full-sequence bit score
    pub bitscore: f64,
    pub bias: f64,
    pub best_domain: DomainScore,
    /// `exp` column
    pub expected_domains: f64,
    /// `N` column
    pub observed_domains: usize,
    pub is_included: bool,
    /// Domains in domain-table order
    pub hsps: Vec<Hsp>,
}

impl Hit {
    /// The `>>` header description when there is one, else the table text.
    pub fn longest_description(&self) -> &str {
        self.full_description.as_deref().unwrap_or(&self.description)
    }

    pub fn len(&self) -> usize {
        self.hsps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hsps.is_empty()
    }

    /// Gets a domain by position; negative indices count from the end.
    pub fn get(&self, index: isize) -> Option<&Hsp> {
        resolve_index(self.hsps.len(), index).map(|i| &self.hsps[i])
    }

    pub fn iter(&self) -> slice::Iter<'_, Hsp> {
        self.hsps.iter()
    }
}

impl Index<usize> for Hit {
    type Output = Hsp;

    fn index(&self, index: usize) -> &Hsp {
        &self.hsps[index]
    }
}

impl<'a> IntoIterator for &'a Hit {
    type Item = &'a Hsp;
    type IntoIter = slice::Iter<'a, Hsp>;

    fn into_iter(self) -> Self::IntoIter {
        self.hsps.iter()
    }
}

/// Search space sizes from the pipeline statistics summary.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PipelineStats {
    /// `Initial search space (Z)`
    pub search_space: Option<f64>,
    /// `Domain search space (domZ)`
    pub domain_search_space: Option<f64>,
}

/// All results for one query of a report.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub id: String,
    pub accession: Option<String>,
    pub description: Option<String>,
    /// Residues (`L=`) or profile match states (`M=`)
    pub seq_len: usize,
    pub meta: Meta,
    pub stats: PipelineStats,
    /// Hits in report order
    pub hits: Vec<Hit>,
}

impl QueryResult {
    pub fn program(&self) -> Program {
        self.meta.program
    }

    pub fn version(&self) -> Option<&str> {
        self.meta.version.as_deref()
    }

    pub fn target(&self) -> Option<&str> {
        self.meta.target.as_deref()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Gets a hit by position; negative indices count from the end.
    pub fn get(&self, index: isize) -> Option<&Hit> {
        resolve_index(self.hits.len(), index).map(|i| &self.hits[i])
    }

    /// Finds a hit by identifier.
    pub fn hit(&self, id: &str) -> Option<&Hit> {
        self.hits.iter().find(|hit| hit.id == id)
    }

    pub fn iter(&self) -> slice::Iter<'_, Hit> {
        self.hits.iter()
    }

    /// Iterates over every domain of every hit.
    pub fn hsps(&self) -> impl Iterator<Item = &Hsp> {
        self.hits.iter().flat_map(|hit| hit.hsps.iter())
    }
}

impl Index<usize> for QueryResult {
    type Output = Hit;

    fn index(&self, index: usize) -> &Hit {
        &self.hits[index]
    }
}

impl<'a> IntoIterator for &'a QueryResult {
    type Item = &'a Hit;
    type IntoIter = slice::Iter<'a, Hit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}

/// Maps a possibly negative index onto `0..len`.
fn resolve_index(len: usize, index: isize) -> Option<usize> {
    if index < 0 {
        len.checked_sub(index.unsigned_abs())
    } else {
        let index = index as usize;
        (index < len).then_some(index)
    }
}
