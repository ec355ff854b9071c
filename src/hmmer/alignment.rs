//! Reassembly of wrapped domain alignments.
//!
//! HMMER prints each domain alignment in blocks of fixed width:
//!
//! ```text
//!                  xxxHHHH CS
//!       Globin   1 qkal-vk 6
//!                  +k+l  k
//!     seq1|abc   7 ekalvrk 13
//!                  5789*** PP
//! ```
//!
//! The first sequence line is always the profile. The homology line is
//! read by column, since it may start with spaces or be blank; trailing
//! whitespace removed by an editor is restored. Fragments of every track
//! are concatenated block by block.

use std::io::BufRead;

use thiserror::Error;

use super::cursor::LineCursor;
use super::line::{classify, fields_with_offsets, is_numeric, LineKind, SourceLine};
use super::HmmerResult;
use crate::model::{AlignmentTracks, Hsp, Program, Track};

/// An alignment whose tracks do not line up.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackFault {
    #[error("block {block}: {track} line has {found} columns, expected {expected}")]
    BlockWidth {
        block: usize,
        track: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{track} track has {found} columns, expected {expected}")]
    TrackLength {
        track: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{track} track holds {residues} residues but coordinates {from}-{to} span {expected}")]
    ResidueCount {
        track: &'static str,
        residues: usize,
        from: usize,
        to: usize,
        expected: usize,
    },

    #[error("domain header is not followed by any alignment block")]
    NoBlocks,
}

/// One wrapped block of a domain alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Block {
    /// `CS` and `RF` lines printed above the profile line
    pub annotations: Vec<(Track, String)>,
    pub profile: String,
    pub homology: String,
    pub target: String,
    pub posterior: Option<String>,
}

/// Returns the track and value of a `<value> CS|RF|PP` annotation line.
pub(crate) fn annotation_line(text: &str) -> Option<(Track, &str)> {
    match text.split_whitespace().collect::<Vec<_>>()[..] {
        [value, "CS"] => Some((Track::ConsensusStructure, value)),
        [value, "RF"] => Some((Track::Reference, value)),
        [value, "PP"] => Some((Track::PosteriorProbability, value)),
        _ => None,
    }
}

/// A `name from sequence to` line, with the column where the sequence starts.
struct SeqLine {
    offset: usize,
    seq: String,
}

fn parse_seq_line(line: SourceLine) -> HmmerResult<SeqLine> {
    let fields = fields_with_offsets(line.text);
    let coordinate = |token: &str| token == "-" || is_numeric(token);

    match fields[..] {
        [_, (_, from), (offset, seq), (_, to)] if coordinate(from) && coordinate(to) => {
            Ok(SeqLine {
                offset,
                seq: seq.to_string(),
            })
        }
        _ => Err(line.malformed("expected an alignment line 'name from sequence to'")),
    }
}

/// Takes `width` columns of `raw` starting at `offset`, padding with spaces.
fn column_slice(raw: &str, offset: usize, width: usize) -> String {
    let tail = raw.get(offset..).unwrap_or("");
    let mut column: String = tail.chars().take(width).collect();
    let missing = width.saturating_sub(column.chars().count());
    column.extend(std::iter::repeat(' ').take(missing));
    column
}

/// Reads the rest of a block whose first line is `first`.
pub(crate) fn read_block<R: BufRead>(
    cursor: &mut LineCursor<R>,
    first: String,
    query: &str,
) -> HmmerResult<Block> {
    let mut annotations = Vec::new();
    let mut line = first;

    let profile = loop {
        let source = SourceLine::new(cursor.line_number(), &line);
        match annotation_line(&line) {
            Some((Track::PosteriorProbability, _)) => {
                return Err(source.malformed("PP line before the sequence lines of a block"));
            }
            Some((track, value)) => {
                annotations.push((track, value.to_string()));
            }
            None => break parse_seq_line(source)?,
        }
        line = cursor.next_in_record(query)?;
    };

    let raw = cursor.next_in_record(query)?;
    if classify(&raw) == LineKind::Terminator {
        return Err(SourceLine::new(cursor.line_number(), &raw)
            .malformed("alignment block ends before its sequence line"));
    }
    let homology = column_slice(&raw, profile.offset, profile.seq.len());

    let text = cursor.next_in_record(query)?;
    let target = parse_seq_line(SourceLine::new(cursor.line_number(), &text))?;

    let posterior = cursor
        .peek()?
        .and_then(annotation_line)
        .filter(|(track, _)| *track == Track::PosteriorProbability)
        .map(|(_, value)| value.to_string());
    if posterior.is_some() {
        cursor.next_line()?;
    }

    Ok(Block {
        annotations,
        profile: profile.seq,
        homology,
        target: target.seq,
        posterior,
    })
}

/// Concatenates the blocks of one domain alignment.
#[derive(Debug)]
pub(crate) struct AlignmentBuilder {
    program: Program,
    blocks: usize,
    profile: String,
    target: String,
    homology: String,
    consensus_structure: Option<String>,
    reference: Option<String>,
    posterior_probability: Option<String>,
}

impl AlignmentBuilder {
    pub fn new(program: Program) -> Self {
        Self {
            program,
            blocks: 0,
            profile: String::new(),
            target: String::new(),
            homology: String::new(),
            consensus_structure: None,
            reference: None,
            posterior_probability: None,
        }
    }

    /// Track holding the sequence printed below the profile.
    fn target_track(&self) -> Track {
        if self.program.profile_is_query() {
            Track::Hit
        } else {
            Track::Query
        }
    }

    pub fn push_block(&mut self, block: Block) -> Result<(), TrackFault> {
        self.blocks += 1;
        let target_track = self.target_track();
        let expected = block.profile.len();
        let check = |track: Track, found: usize| {
            if found == expected {
                Ok(())
            } else {
                Err(TrackFault::BlockWidth {
                    block: self.blocks,
                    track: track.label(),
                    expected,
                    found,
                })
            }
        };

        check(target_track, block.target.len())?;
        check(Track::Homology, block.homology.len())?;
        for (track, value) in &block.annotations {
            check(*track, value.len())?;
        }
        if let Some(pp) = &block.posterior {
            check(Track::PosteriorProbability, pp.len())?;
        }

        self.profile.push_str(&block.profile);
        self.target.push_str(&block.target);
        self.homology.push_str(&block.homology);
        for (track, value) in block.annotations {
            let slot = match track {
                Track::Reference => &mut self.reference,
                _ => &mut self.consensus_structure,
            };
            slot.get_or_insert_with(String::new).push_str(&value);
        }
        if let Some(pp) = block.posterior {
            self.posterior_probability
                .get_or_insert_with(String::new)
                .push_str(&pp);
        }
        Ok(())
    }

    /// Checks the complete alignment against the coordinates of `hsp`.
    pub fn finish(self, hsp: &Hsp, check_coordinates: bool) -> Result<AlignmentTracks, TrackFault> {
        if self.blocks == 0 {
            return Err(TrackFault::NoBlocks);
        }

        let (hit_seq, query_seq) = if self.program.profile_is_query() {
            (self.target, self.profile)
        } else {
            (self.profile, self.target)
        };
        let tracks = AlignmentTracks {
            hit_seq,
            query_seq,
            homology: self.homology,
            consensus_structure: self.consensus_structure,
            reference: self.reference,
            posterior_probability: self.posterior_probability,
        };

        let expected = tracks.len();
        for track in [
            Track::Query,
            Track::Homology,
            Track::ConsensusStructure,
            Track::Reference,
            Track::PosteriorProbability,
        ] {
            if let Some(value) = tracks.get(track) {
                if value.len() != expected {
                    return Err(TrackFault::TrackLength {
                        track: track.label(),
                        expected,
                        found: value.len(),
                    });
                }
            }
        }

        if check_coordinates {
            for (track, span) in [(Track::Hit, hsp.hit_span), (Track::Query, hsp.query_span)] {
                let residues = tracks
                    .get(track)
                    .unwrap_or_default()
                    .chars()
                    .filter(|c| !matches!(c, '-' | '.'))
                    .count();
                if residues != span.width() {
                    return Err(TrackFault::ResidueCount {
                        track: track.label(),
                        residues,
                        from: span.from,
                        to: span.to,
                        expected: span.width(),
                    });
                }
            }
        }

        Ok(tracks)
    }
}
