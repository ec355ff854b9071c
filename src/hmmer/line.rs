//! Line classification.
//!
//! Every line of a report is tagged by its leading text alone. Zone headers,
//! sentinels and separators get their own kind; table rows, alignment tracks
//! and statistics are all `Data` and are interpreted by the zone currently
//! being read.

use std::str::FromStr;

use super::{HmmerError, HmmerResult};

/// Kind of a single report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineKind {
    Blank,
    /// `//`
    Terminator,
    /// `# ...` preamble (also `# CPU time` lines of the statistics)
    Preamble,
    /// `Query:       id  [L=n]`
    Query,
    Accession,
    Description,
    /// `Scores for complete sequence...` and the column header lines below it
    HitTableHeader,
    /// `[No hits detected ...]`, `[No targets detected ...]`, `[No individual domains ...]`
    NoHits,
    /// `------ inclusion threshold ------`
    InclusionThreshold,
    /// `Domain annotation for each model (and alignments):`
    DomainSection,
    /// `>> id  description`
    HitHeader,
    /// `   #    score  bias  c-Evalue ...`
    DomainTableHeader,
    /// Dash-only rule under a column header
    TableRule,
    /// `Alignments for each domain:`
    AlignmentsTitle,
    /// `== domain 1  score: ...`
    DomainAlignment,
    /// `Internal pipeline statistics summary:`
    StatsTitle,
    /// `[ok]` trailer written after the last record
    Done,
    Data,
}

/// Classifies one line (without its line terminator).
pub(crate) fn classify(line: &str) -> LineKind {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if line.trim_end() == "//" {
        return LineKind::Terminator;
    }
    if line.starts_with('#') {
        return LineKind::Preamble;
    }
    if line.starts_with("Query:") {
        return LineKind::Query;
    }
    if line.starts_with("Accession:") {
        return LineKind::Accession;
    }
    if line.starts_with("Description:") {
        return LineKind::Description;
    }
    if line.starts_with(">>") {
        return LineKind::HitHeader;
    }
    if trimmed.starts_with("Scores for complete sequence")
        || trimmed.starts_with("--- full sequence ---")
        || (trimmed.starts_with("E-value") && trimmed.contains("score"))
    {
        return LineKind::HitTableHeader;
    }
    if trimmed == "[ok]" {
        return LineKind::Done;
    }
    if trimmed.starts_with("[No ") {
        return LineKind::NoHits;
    }
    if trimmed.starts_with("---") && trimmed.contains("inclusion threshold") {
        return LineKind::InclusionThreshold;
    }
    if is_rule(trimmed) {
        return LineKind::TableRule;
    }
    if trimmed.starts_with("Domain annotation for each") {
        return LineKind::DomainSection;
    }
    if trimmed.starts_with('#') && trimmed.contains("score") {
        return LineKind::DomainTableHeader;
    }
    if trimmed.starts_with("Alignments for each domain") {
        return LineKind::AlignmentsTitle;
    }
    if trimmed.starts_with("== domain") {
        return LineKind::DomainAlignment;
    }
    if trimmed.starts_with("Internal pipeline statistics summary") {
        return LineKind::StatsTitle;
    }

    LineKind::Data
}

/// A rule line is made of dash-only words, e.g. ` ---   ------ -----`.
fn is_rule(trimmed: &str) -> bool {
    trimmed
        .split_whitespace()
        .all(|word| word.bytes().all(|b| b == b'-'))
}

/// A line with its 1-based position in the input, used to report errors.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SourceLine<'a> {
    pub number: usize,
    pub text: &'a str,
}

impl<'a> SourceLine<'a> {
    pub fn new(number: usize, text: &'a str) -> Self {
        Self { number, text }
    }

    pub fn malformed(&self, reason: impl Into<String>) -> HmmerError {
        HmmerError::MalformedRecord {
            line: self.number,
            content: self.text.to_string(),
            reason: reason.into(),
        }
    }

    /// Parses one field of this line, naming the field on failure.
    pub fn field<T: FromStr>(&self, token: &str, name: &str) -> HmmerResult<T> {
        token
            .parse()
            .map_err(|_| self.malformed(format!("invalid {} value '{}'", name, token)))
    }
}

/// Splits off the first `n` whitespace-separated fields.
///
/// Returns the fields and the trimmed remainder of the line, or `None` when
/// the line has fewer than `n` fields. Spacing inside the remainder is kept.
pub(crate) fn split_fields(text: &str, n: usize) -> Option<(Vec<&str>, &str)> {
    let mut fields = Vec::with_capacity(n);
    let mut rest = text.trim_start();

    while fields.len() < n {
        if rest.is_empty() {
            return None;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }

    Some((fields, rest.trim_end()))
}

/// Whitespace-separated fields with their byte offsets in `text`.
pub(crate) fn fields_with_offsets(text: &str) -> Vec<(usize, &str)> {
    let mut fields = Vec::new();
    let mut start = None;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                fields.push((s, &text[s..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        fields.push((s, &text[s..]));
    }

    fields
}

/// True for numeric table cells such as `74.6`, `-1.8`, `6e-21` or `2.4e+03`.
pub(crate) fn is_numeric(token: &str) -> bool {
    token.starts_with(|c: char| c.is_ascii_digit() || c == '.' || c == '-' || c == '+')
        && token.parse::<f64>().is_ok()
}
