//! Per-hit domain tables.
//!
//! ```text
//! >> Globin  Globin
//!    #    score  bias  c-Evalue  i-Evalue hmmfrom  hmm to    alifrom  ali to    envfrom  env to     acc
//!  ---   ------ ----- --------- --------- ------- -------    ------- -------    ------- -------    ----
//!    1 !   74.0   0.2   6.7e-25   9.2e-21       1     107 [.       7     112 ..       7     113 .. 0.97
//! ```
//!
//! The `hmmfrom`/`hmm to` columns always describe the profile, the `ali`
//! and `env` columns the sequence. Which of the two is the hit depends on
//! the program.

use super::line::{split_fields, SourceLine};
use super::HmmerResult;
use crate::model::{EndType, Hsp, Program, Span};

/// The `>> id  description` line opening the domain table of one hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HitHeader<'a> {
    pub id: &'a str,
    pub description: &'a str,
}

pub(crate) fn parse_hit_header(line: SourceLine<'_>) -> HmmerResult<HitHeader<'_>> {
    let text = line.text.strip_prefix(">>").unwrap_or(line.text);
    match split_fields(text, 1) {
        Some((fields, description)) => Ok(HitHeader {
            id: fields[0],
            description,
        }),
        None => Err(line.malformed("hit header without an id")),
    }
}

/// Parses a domain row.
///
/// Rows printed without a `!`/`?` marker take `default_included`.
pub(crate) fn parse_domain_row(
    line: SourceLine,
    program: Program,
    default_included: bool,
) -> HmmerResult<Hsp> {
    let mut tokens: Vec<&str> = line.text.split_whitespace().collect();

    let is_included = match tokens.get(1).copied() {
        Some("!") => {
            tokens.remove(1);
            true
        }
        Some("?") => {
            tokens.remove(1);
            false
        }
        _ => default_included,
    };

    if tokens.len() != 15 {
        return Err(line.malformed(format!(
            "domain row has {} columns, expected 15 besides the inclusion marker",
            tokens.len()
        )));
    }

    let profile = parse_span(line, &tokens[5..8], "hmm")?;
    let sequence = parse_span(line, &tokens[8..11], "ali")?;
    let env_span = parse_span(line, &tokens[11..14], "env")?;

    let (hit_span, query_span) = if program.profile_is_query() {
        (sequence, profile)
    } else {
        (profile, sequence)
    };

    Ok(Hsp {
        domain_index: line.field(tokens[0], "domain index")?,
        is_included,
        bitscore: line.field(tokens[1], "score")?,
        bias: line.field(tokens[2], "bias")?,
        conditional_evalue: line.field(tokens[3], "c-Evalue")?,
        independent_evalue: line.field(tokens[4], "i-Evalue")?,
        hit_span,
        query_span,
        env_span,
        mean_posterior_accuracy: line.field(tokens[14], "acc")?,
        alignment: None,
    })
}

/// Parses a `from to endtype` triple; `label` names the column group.
fn parse_span(line: SourceLine, triple: &[&str], label: &str) -> HmmerResult<Span> {
    let from = line.field(triple[0], &format!("{} from", label))?;
    let to = line.field(triple[1], &format!("{} to", label))?;
    let end_type: EndType = triple[2]
        .parse()
        .map_err(|e| line.malformed(format!("{} end type: {}", label, e)))?;
    Ok(Span::new(from, to, end_type))
}
