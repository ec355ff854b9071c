//! Hit summary table.
//!
//! ```text
//!     E-value  score  bias    E-value  score  bias    exp  N  Sequence Description
//!     ------- ------ -----    ------- ------ -----   ---- --  -------- -----------
//!       8e-64  217.1   0.0    1.1e-63  216.7   0.0    1.0  1  sp|P1|A  Serine/threonine-protein kinase
//!   ------ inclusion threshold ------
//!      0.0039   13.5   0.0     0.0054   13.0   0.0    1.2  1  sp|P2|B  Protein B
//! ```
//!
//! Long descriptions may wrap onto continuation lines, which carry no
//! numeric columns.

use log::trace;

use super::line::{is_numeric, split_fields, SourceLine};
use super::HmmerResult;
use crate::model::{DomainScore, Hit};

/// Number of leading fields of a row: 8 numeric columns and the target id.
const ROW_FIELDS: usize = 9;

/// Accumulates the rows of one hit table.
pub(crate) struct HitTableParser {
    assume_included: bool,
    past_threshold: bool,
    hits: Vec<Hit>,
}

impl HitTableParser {
    pub fn new(assume_included: bool) -> Self {
        Self {
            assume_included,
            past_threshold: false,
            hits: Vec::new(),
        }
    }

    /// Rows after the `inclusion threshold` divider are not included.
    pub fn inclusion_threshold(&mut self) {
        self.past_threshold = true;
    }

    /// Parses a data line of the table: a hit row or a description continuation.
    ///
    /// A row has eight numeric columns and an id after its optional marker;
    /// any other line continues the description of the previous row.
    pub fn push_line(&mut self, line: SourceLine) -> HmmerResult<()> {
        let (marker, rest) = split_marker(line.text);
        if !is_row(rest) {
            return self.continue_description(line);
        }

        let default_included = !self.past_threshold && self.assume_included;
        let is_included = match marker {
            Some(m) => m == "!" || m == "+",
            None => default_included,
        };

        let hit = parse_row(line, rest, is_included)?;
        trace!("hit row '{}' at line {}", hit.id, line.number);
        self.hits.push(hit);
        Ok(())
    }

    fn continue_description(&mut self, line: SourceLine) -> HmmerResult<()> {
        let Some(hit) = self.hits.last_mut() else {
            return Err(line.malformed("description continuation without a preceding hit row"));
        };
        let text = line.text.trim();
        if hit.description.is_empty() {
            hit.description = text.to_string();
        } else {
            hit.description.push(' ');
            hit.description.push_str(text);
        }
        Ok(())
    }

    pub fn finish(self) -> Vec<Hit> {
        self.hits
    }
}

/// Splits an optional leading inclusion marker (`!`, `?`, `+`, `-`) from a row.
fn split_marker(text: &str) -> (Option<&str>, &str) {
    let trimmed = text.trim_start();
    let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
    let first = &trimmed[..end];
    if matches!(first, "!" | "?" | "+" | "-") {
        (Some(first), &trimmed[end..])
    } else {
        (None, trimmed)
    }
}

fn is_row(text: &str) -> bool {
    let fields: Vec<&str> = text.split_whitespace().take(ROW_FIELDS).collect();
    fields.len() == ROW_FIELDS && fields[..ROW_FIELDS - 1].iter().all(|f| is_numeric(f))
}

fn parse_row(line: SourceLine, text: &str, is_included: bool) -> HmmerResult<Hit> {
    let Some((fields, description)) = split_fields(text, ROW_FIELDS) else {
        return Err(line.malformed(format!(
            "hit row needs {} columns before the description",
            ROW_FIELDS
        )));
    };

    Ok(Hit {
        evalue: line.field(fields[0], "E-value")?,
        bitscore: line.field(fields[1], "score")?,
        bias: line.field(fields[2], "bias")?,
        best_domain: DomainScore {
            evalue: line.field(fields[3], "best domain E-value")?,
            bitscore: line.field(fields[4], "best domain score")?,
            bias: line.field(fields[5], "best domain bias")?,
        },
        expected_domains: line.field(fields[6], "exp")?,
        observed_domains: line.field(fields[7], "N")?,
        id: fields[8].to_string(),
        description: description.to_string(),
        full_description: None,
        is_included,
        hsps: Vec::new(),
    })
}
