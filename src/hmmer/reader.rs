//! Record reader and iterators.
//!
//! A query record is read zone by zone. Each zone consumes the lines it
//! understands and hands the line that opens the next zone back through
//! the cursor, so no zone needs more than one line of lookahead.

use std::fs::File;
use std::io;
use std::iter::FusedIterator;
use std::path::Path;

use log::{debug, trace};

use super::alignment::{self, AlignmentBuilder};
use super::cursor::LineCursor;
use super::domain_table::{parse_domain_row, parse_hit_header};
use super::hit_table::HitTableParser;
use super::line::{classify, split_fields, LineKind, SourceLine};
use super::{HmmerError, HmmerResult};
use crate::model::{Hit, Meta, PipelineStats, Program, QueryResult};
use crate::options::ParseOptions;

/// Position of the reader inside a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitRecord,
    InMetadata,
    InHitTable,
    /// Domain tables; holds the hit whose `>>` section is being read
    InDomainSection(Option<usize>),
    InAlignment(usize),
    InStats,
    RecordComplete,
}

/// Preamble fields seen so far in the current report.
#[derive(Debug, Clone, Default)]
struct Preamble {
    program: Option<Program>,
    version: Option<String>,
    release_date: Option<String>,
    query_file: Option<String>,
    target: Option<String>,
}

impl Preamble {
    /// Applies one `#` line. A program line starts a new report and clears
    /// what was learned from the previous one.
    fn apply(&mut self, line: SourceLine) -> HmmerResult<()> {
        let text = line.text.trim_start_matches('#').trim();

        if let Some((name, _)) = text.split_once(" :: ") {
            let program = name
                .trim()
                .parse::<Program>()
                .map_err(|e| line.malformed(format!("{}", e)))?;
            *self = Preamble {
                program: Some(program),
                ..Preamble::default()
            };
        } else if let Some(rest) = text.strip_prefix("HMMER ") {
            self.version = rest.split_whitespace().next().map(str::to_string);
            self.release_date = rest
                .split_once('(')
                .and_then(|(_, date)| date.split_once(')'))
                .map(|(date, _)| date.trim().to_string());
        } else if let Some((key, value)) = text.split_once(':') {
            let key = key.trim();
            let value = value.trim();
            if key.starts_with("query") && key.ends_with("file") {
                self.query_file = Some(value.to_string());
            } else if key.starts_with("target") {
                self.target = Some(value.to_string());
            }
        }
        Ok(())
    }

    fn meta(&self, program: Program) -> Meta {
        Meta {
            program,
            version: self.version.clone(),
            release_date: self.release_date.clone(),
            query_file: self.query_file.clone(),
            target: self.target.clone(),
        }
    }
}

/// A query record under construction.
struct RecordBuilder {
    result: QueryResult,
    /// Whether the `>>` section of each hit has been read
    detailed: Vec<bool>,
}

impl RecordBuilder {
    fn new(line: SourceLine, meta: Meta) -> HmmerResult<Self> {
        let text = line.text.trim_start_matches("Query:");
        let mut fields = text.split_whitespace();
        let id = fields
            .next()
            .ok_or_else(|| line.malformed("query line without an id"))?;
        let length = fields
            .next()
            .and_then(|tok| tok.strip_prefix("[L=").or_else(|| tok.strip_prefix("[M=")))
            .and_then(|tok| tok.strip_suffix(']'))
            .ok_or_else(|| line.malformed("query line without a '[L=..]' or '[M=..]' length"))?;

        Ok(Self {
            result: QueryResult {
                id: id.to_string(),
                accession: None,
                description: None,
                seq_len: line.field(length, "query length")?,
                meta,
                stats: PipelineStats::default(),
                hits: Vec::new(),
            },
            detailed: Vec::new(),
        })
    }

    fn id(&self) -> &str {
        &self.result.id
    }

    fn program(&self) -> Program {
        self.result.meta.program
    }

    fn set_hits(&mut self, hits: Vec<Hit>) {
        self.detailed = vec![false; hits.len()];
        self.result.hits = hits;
    }

    /// Finds the hit named by a `>>` header: the next undetailed hit in
    /// table order when it matches, otherwise any undetailed hit with that id.
    fn locate_hit(&self, id: &str) -> Option<usize> {
        let next = self.detailed.iter().position(|done| !done)?;
        if self.result.hits[next].id == id {
            return Some(next);
        }
        self.result
            .hits
            .iter()
            .zip(&self.detailed)
            .position(|(hit, done)| !done && hit.id == id)
    }

    /// Checks the domain counts and hands out the record.
    fn finish(self, terminator: SourceLine) -> HmmerResult<QueryResult> {
        for (hit, detailed) in self.result.hits.iter().zip(&self.detailed) {
            let found = if *detailed { hit.hsps.len() } else { 0 };
            if found != hit.observed_domains {
                return Err(terminator.malformed(format!(
                    "hit '{}' of query '{}' reports {} domains but {} were listed",
                    hit.id, self.result.id, hit.observed_domains, found
                )));
            }
        }
        Ok(self.result)
    }
}

/// Reads query records from a HMMER 3 text report.
pub struct Reader<R> {
    cursor: LineCursor<io::BufReader<R>>,
    options: ParseOptions,
    preamble: Preamble,
    done: bool,
}

impl Reader<File> {
    pub fn from_path<P: AsRef<Path>>(path: P) -> HmmerResult<Reader<File>> {
        Ok(Reader::new(File::open(path)?))
    }
}

impl<R: io::Read> Reader<R> {
    pub fn new(rdr: R) -> Reader<R> {
        Reader::with_options(rdr, ParseOptions::default())
    }

    pub fn with_options(rdr: R, options: ParseOptions) -> Reader<R> {
        Reader {
            cursor: LineCursor::new(io::BufReader::new(rdr)),
            options,
            preamble: Preamble::default(),
            done: false,
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Number of the last line consumed.
    pub fn line_number(&self) -> usize {
        self.cursor.line_number()
    }

    /// A borrowed iterator over the query records of a report.
    pub fn records(&mut self) -> RecordsIter<R> {
        RecordsIter::new(self)
    }

    /// An owned iterator over the query records of a report.
    pub fn into_records(self) -> RecordsIntoIter<R> {
        RecordsIntoIter::new(self)
    }

    /// Reads the next query record, `None` at the end of the report.
    ///
    /// After an error, or once the end is reached, always returns `Ok(None)`.
    /// The partial record of a failed read is discarded.
    pub fn read_record(&mut self) -> HmmerResult<Option<QueryResult>> {
        if self.done {
            return Ok(None);
        }
        let result = self.read_next();
        if !matches!(result, Ok(Some(_))) {
            self.done = true;
        }
        result
    }

    fn read_next(&mut self) -> HmmerResult<Option<QueryResult>> {
        let Some(mut record) = self.await_record()? else {
            return Ok(None);
        };

        let mut state = State::InMetadata;
        loop {
            trace!("query '{}': {:?} at line {}", record.id(), state, self.line_number());
            state = match state {
                State::InMetadata => self.read_metadata(&mut record)?,
                State::InHitTable => self.read_hit_table(&mut record)?,
                State::InDomainSection(hit) => self.read_domain_section(&mut record, hit)?,
                State::InAlignment(hit) => self.read_alignments(&mut record, hit)?,
                State::InStats => self.read_stats(&mut record)?,
                State::AwaitRecord | State::RecordComplete => break,
            };
        }

        let terminator = SourceLine::new(self.line_number(), "//");
        let result = record.finish(terminator)?;
        debug!(
            "parsed query '{}' ({}): {} hits, {} domains",
            result.id,
            result.program(),
            result.len(),
            result.hsps().count()
        );
        Ok(Some(result))
    }

    /// Next line of the open record.
    fn next_line(&mut self, record: &RecordBuilder) -> HmmerResult<String> {
        self.cursor.next_in_record(record.id())
    }

    /// Skips the preamble and any `[ok]` trailers up to the next `Query:` line.
    fn await_record(&mut self) -> HmmerResult<Option<RecordBuilder>> {
        while let Some(text) = self.cursor.next_line()? {
            let line = SourceLine::new(self.line_number(), &text);
            match classify(&text) {
                LineKind::Blank | LineKind::Done => {}
                LineKind::Preamble => self.preamble.apply(line)?,
                LineKind::Query => {
                    let program = self
                        .preamble
                        .program
                        .ok_or_else(|| line.malformed("query record before the program preamble"))?;
                    let record = RecordBuilder::new(line, self.preamble.meta(program))?;
                    debug!("query '{}' at line {}", record.id(), line.number);
                    return Ok(Some(record));
                }
                _ => return Err(line.malformed("expected a preamble or 'Query:' line")),
            }
        }
        Ok(None)
    }

    fn read_metadata(&mut self, record: &mut RecordBuilder) -> HmmerResult<State> {
        loop {
            let text = self.next_line(record)?;
            let line = SourceLine::new(self.line_number(), &text);
            match classify(&text) {
                LineKind::Blank => {}
                LineKind::Accession => {
                    let value = text.trim_start_matches("Accession:").trim();
                    record.result.accession = Some(value.to_string());
                }
                LineKind::Description => {
                    let value = text.trim_start_matches("Description:").trim();
                    record.result.description = Some(value.to_string());
                }
                LineKind::HitTableHeader => return Ok(State::InHitTable),
                LineKind::Terminator => return Ok(State::RecordComplete),
                LineKind::Query => return Err(line.malformed("'Query:' line inside a record")),
                _ => return Err(line.malformed("unexpected line in query header")),
            }
        }
    }

    fn read_hit_table(&mut self, record: &mut RecordBuilder) -> HmmerResult<State> {
        let mut table = HitTableParser::new(self.options.assume_included);
        let next = loop {
            let text = self.next_line(record)?;
            let line = SourceLine::new(self.line_number(), &text);
            match classify(&text) {
                LineKind::Blank
                | LineKind::HitTableHeader
                | LineKind::TableRule
                | LineKind::NoHits => {}
                LineKind::InclusionThreshold => table.inclusion_threshold(),
                LineKind::Data => table.push_line(line)?,
                LineKind::DomainSection => break State::InDomainSection(None),
                LineKind::StatsTitle => break State::InStats,
                LineKind::Terminator => break State::RecordComplete,
                LineKind::Query => return Err(line.malformed("'Query:' line inside a record")),
                _ => return Err(line.malformed("unexpected line in hit table")),
            }
        };
        record.set_hits(table.finish());
        Ok(next)
    }

    fn read_domain_section(
        &mut self,
        record: &mut RecordBuilder,
        mut current: Option<usize>,
    ) -> HmmerResult<State> {
        loop {
            let text = self.next_line(record)?;
            let line = SourceLine::new(self.line_number(), &text);
            match classify(&text) {
                LineKind::Blank
                | LineKind::NoHits
                | LineKind::DomainTableHeader
                | LineKind::TableRule => {}
                LineKind::HitHeader => {
                    let header = parse_hit_header(line)?;
                    let index = record.locate_hit(header.id).ok_or_else(|| {
                        line.malformed(format!(
                            "'>> {}' does not name a pending hit of the table",
                            header.id
                        ))
                    })?;
                    record.detailed[index] = true;

                    let hit = &mut record.result.hits[index];
                    if header.description.len() > hit.description.len()
                        && header.description.starts_with(hit.description.as_str())
                    {
                        debug!(
                            "hit '{}': '>>' header extends truncated description '{}'",
                            hit.id, hit.description
                        );
                        hit.full_description = Some(header.description.to_string());
                    }
                    current = Some(index);
                }
                LineKind::Data => {
                    let index =
                        current.ok_or_else(|| line.malformed("domain row before any '>>' header"))?;
                    let program = record.program();
                    let hit = &mut record.result.hits[index];
                    let hsp = parse_domain_row(line, program, hit.is_included)?;
                    if hsp.domain_index != hit.hsps.len() + 1 {
                        return Err(line.malformed(format!(
                            "domain {} of hit '{}' listed in position {}",
                            hsp.domain_index,
                            hit.id,
                            hit.hsps.len() + 1
                        )));
                    }
                    hit.hsps.push(hsp);
                }
                LineKind::AlignmentsTitle => {
                    let index = current
                        .ok_or_else(|| line.malformed("alignments before any '>>' header"))?;
                    return Ok(State::InAlignment(index));
                }
                LineKind::StatsTitle => return Ok(State::InStats),
                LineKind::Terminator => return Ok(State::RecordComplete),
                LineKind::Query => return Err(line.malformed("'Query:' line inside a record")),
                _ => return Err(line.malformed("unexpected line in domain table")),
            }
        }
    }

    fn read_alignments(&mut self, record: &mut RecordBuilder, hit: usize) -> HmmerResult<State> {
        let mut pending: Option<(usize, AlignmentBuilder)> = None;

        let next = loop {
            let text = self.next_line(record)?;
            let line = SourceLine::new(self.line_number(), &text);
            match classify(&text) {
                LineKind::Blank => {}
                LineKind::DomainAlignment => {
                    self.flush_alignment(record, hit, pending.take())?;
                    let domain = parse_domain_number(line)?;
                    let hsps = &record.result.hits[hit].hsps;
                    match hsps.get(domain.wrapping_sub(1)) {
                        Some(hsp) if hsp.alignment.is_none() => {}
                        Some(_) => {
                            return Err(line.malformed(format!(
                                "second alignment for domain {}",
                                domain
                            )))
                        }
                        None => {
                            return Err(line.malformed(format!(
                                "domain {} is not in the domain table ({} domains)",
                                domain,
                                hsps.len()
                            )))
                        }
                    }
                    pending = Some((domain, AlignmentBuilder::new(record.program())));
                }
                LineKind::Data => {
                    let Some((domain, builder)) = pending.as_mut() else {
                        return Err(line.malformed("alignment line before any '== domain' header"));
                    };
                    let block = alignment::read_block(&mut self.cursor, text, &record.result.id)?;
                    builder
                        .push_block(block)
                        .map_err(|reason| track_error(record, hit, *domain, reason))?;
                }
                LineKind::HitHeader => {
                    self.cursor.push_back(text);
                    break State::InDomainSection(None);
                }
                LineKind::StatsTitle => break State::InStats,
                LineKind::Terminator => break State::RecordComplete,
                LineKind::Query => return Err(line.malformed("'Query:' line inside a record")),
                _ => return Err(line.malformed("unexpected line in alignment section")),
            }
        };

        self.flush_alignment(record, hit, pending)?;
        Ok(next)
    }

    /// Checks a completed domain alignment and attaches it to its HSP.
    fn flush_alignment(
        &self,
        record: &mut RecordBuilder,
        hit: usize,
        pending: Option<(usize, AlignmentBuilder)>,
    ) -> HmmerResult<()> {
        let Some((domain, builder)) = pending else {
            return Ok(());
        };
        let hsp = &record.result.hits[hit].hsps[domain - 1];
        let tracks = match builder.finish(hsp, self.options.check_coordinates) {
            Ok(tracks) => tracks,
            Err(reason) => return Err(track_error(record, hit, domain, reason)),
        };
        record.result.hits[hit].hsps[domain - 1].alignment = Some(tracks);
        Ok(())
    }

    fn read_stats(&mut self, record: &mut RecordBuilder) -> HmmerResult<State> {
        loop {
            let text = self.next_line(record)?;
            let line = SourceLine::new(self.line_number(), &text);
            match classify(&text) {
                LineKind::Terminator => return Ok(State::RecordComplete),
                LineKind::Query => return Err(line.malformed("'Query:' line inside a record")),
                LineKind::Data => parse_stat(line, &mut record.result.stats)?,
                // `# CPU time` and `# Mc/sec` lines
                LineKind::Blank | LineKind::Preamble | LineKind::TableRule => {}
                _ => return Err(line.malformed("unexpected line in pipeline statistics")),
            }
        }
    }
}

fn track_error(
    record: &RecordBuilder,
    hit: usize,
    domain: usize,
    reason: alignment::TrackFault,
) -> HmmerError {
    HmmerError::TrackAlignment {
        query: record.result.id.clone(),
        hit: record.result.hits[hit].id.clone(),
        domain,
        reason,
    }
}

/// Domain number of a `== domain N  score: ...` line.
fn parse_domain_number(line: SourceLine) -> HmmerResult<usize> {
    match split_fields(line.text, 3) {
        Some((fields, _)) => line.field(fields[2], "domain number"),
        None => Err(line.malformed("domain alignment header without a number")),
    }
}

/// Reads the search space sizes from the pipeline statistics.
///
/// ```text
/// Initial search space (Z):              11927  [actual number of targets]
/// Domain search space  (domZ):               1  [number of targets reported over threshold]
/// ```
fn parse_stat(line: SourceLine, stats: &mut PipelineStats) -> HmmerResult<()> {
    let text = line.text.trim_start();
    let slot = if text.starts_with("Initial search space") {
        &mut stats.search_space
    } else if text.starts_with("Domain search space") {
        &mut stats.domain_search_space
    } else {
        return Ok(());
    };

    let value = text
        .split_once(':')
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .ok_or_else(|| line.malformed("search space without a value"))?;
    *slot = Some(line.field(value, "search space")?);
    Ok(())
}

/// A borrowed iterator over the query records of a report.
pub struct RecordsIter<'r, R: 'r> {
    rdr: &'r mut Reader<R>,
}

impl<'r, R: io::Read> RecordsIter<'r, R> {
    fn new(rdr: &'r mut Reader<R>) -> RecordsIter<'r, R> {
        RecordsIter { rdr }
    }

    pub fn reader(&self) -> &Reader<R> {
        self.rdr
    }

    pub fn reader_mut(&mut self) -> &mut Reader<R> {
        self.rdr
    }
}

impl<'r, R: io::Read> Iterator for RecordsIter<'r, R> {
    type Item = HmmerResult<QueryResult>;

    fn next(&mut self) -> Option<HmmerResult<QueryResult>> {
        self.rdr.read_record().transpose()
    }
}

impl<'r, R: io::Read> FusedIterator for RecordsIter<'r, R> {}

/// An owned iterator over the query records of a report.
pub struct RecordsIntoIter<R> {
    rdr: Reader<R>,
}

impl<R: io::Read> RecordsIntoIter<R> {
    fn new(rdr: Reader<R>) -> RecordsIntoIter<R> {
        RecordsIntoIter { rdr }
    }

    pub fn reader(&self) -> &Reader<R> {
        &self.rdr
    }

    pub fn reader_mut(&mut self) -> &mut Reader<R> {
        &mut self.rdr
    }

    /// Drop this iterator and return the underlying reader.
    pub fn into_reader(self) -> Reader<R> {
        self.rdr
    }
}

impl<R: io::Read> Iterator for RecordsIntoIter<R> {
    type Item = HmmerResult<QueryResult>;

    fn next(&mut self) -> Option<HmmerResult<QueryResult>> {
        self.rdr.read_record().transpose()
    }
}

impl<R: io::Read> FusedIterator for RecordsIntoIter<R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EndType, Span};

    const PREAMBLE: &str = "\
# hmmscan :: search sequence(s) against a profile database
# HMMER 3.0 (March 2010); http://hmmer.org/
# Copyright (C) 2010 Howard Hughes Medical Institute.
# Freely distributed under the GNU General Public License (GPLv3).
# - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -
# query sequence file:             seqs.fasta
# target HMM database:             Pfam-A.hmm
# - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -
";

    const HIT_TABLE: &str = "\
Query:       seq1  [L=16]
Description: test sequence

Scores for complete sequence (score includes all domains):
   --- full sequence ---   --- best 1 domain ---    -#dom-
    E-value  score  bias    E-value  score  bias    exp  N  Model    Description
    ------- ------ -----    ------- ------ -----   ---- --  -------- -----------
      1e-05   20.1   0.1      1e-05   20.0   0.1    1.0  1  Globin   Globin
  ------ inclusion threshold ------
        1.2    4.0   0.0        1.5    3.8   0.0    1.1  0  Other    Other family


";

    const DOMAINS: &str = "\
Domain annotation for each model (and alignments):
>> Globin  Globin
   #    score  bias  c-Evalue  i-Evalue hmmfrom  hmm to    alifrom  ali to    envfrom  env to     acc
 ---   ------ ----- --------- --------- ------- -------    ------- -------    ------- -------    ----
   1 !   20.0   0.1   1.1e-09     1e-05       1       6 [.       7      13 ..       6      14 .. 0.91

";

    const ALIGNMENT: &str = "
  Alignments for each domain:
  == domain 1    score: 20.0 bits;  conditional E-value: 1.1e-09
                 xxxHHHH CS
      Globin   1 qkal-vk 6
                 +k+l  k
        seq1   7 ekalvrk 13
                 5789*** PP

";

    const STATS: &str = "\

Internal pipeline statistics summary:
-------------------------------------
Query sequence(s):                         1  (16 residues)
Target model(s):                       11927  (2122968 nodes)
Initial search space (Z):              11927  [actual number of targets]
Domain search space  (domZ):               1  [number of targets reported over threshold]
# CPU time: 0.04u 0.00s 00:00:00.04 Elapsed: 00:00:00.03
# Mc/sec: 1002.24
//
";

    fn report() -> String {
        [PREAMBLE, HIT_TABLE, DOMAINS, ALIGNMENT, STATS].concat()
    }

    fn read_all(text: &str) -> Vec<HmmerResult<QueryResult>> {
        Reader::new(text.as_bytes()).into_records().collect()
    }

    fn single(text: &str) -> QueryResult {
        let mut results = read_all(text);
        assert_eq!(results.len(), 1);
        results.remove(0).unwrap()
    }

    #[test]
    fn test_full_record() {
        let result = single(&report());

        assert_eq!(result.id, "seq1");
        assert_eq!(result.description.as_deref(), Some("test sequence"));
        assert!(result.accession.is_none());
        assert_eq!(result.seq_len, 16);
        assert_eq!(result.program(), Program::Hmmscan);
        assert_eq!(result.version(), Some("3.0"));
        assert_eq!(result.meta.release_date.as_deref(), Some("March 2010"));
        assert_eq!(result.meta.query_file.as_deref(), Some("seqs.fasta"));
        assert_eq!(result.target(), Some("Pfam-A.hmm"));
        assert_eq!(result.stats.search_space, Some(11927.0));
        assert_eq!(result.stats.domain_search_space, Some(1.0));

        assert_eq!(result.len(), 2);
        let globin = &result[0];
        assert!(globin.is_included);
        assert_eq!(globin.len(), 1);
        let other = &result[1];
        assert!(!other.is_included);
        assert!(other.is_empty());
        assert_eq!(other.description, "Other family");

        let hsp = &globin[0];
        assert_eq!(hsp.hit_span, Span::new(1, 6, EndType::StartFlush));
        assert_eq!(hsp.query_span, Span::new(7, 13, EndType::Internal));
        assert_eq!(hsp.hit_seq(), Some("qkal-vk"));
        assert_eq!(hsp.query_seq(), Some("ekalvrk"));
        assert_eq!(hsp.annotation("homology"), Some("+k+l  k"));
        assert_eq!(hsp.annotation("CS"), Some("xxxHHHH"));
        assert_eq!(hsp.annotation("PP"), Some("5789***"));
        assert_eq!(hsp.annotation("RF"), None);
    }

    #[test]
    fn test_noali_record() {
        let text = [PREAMBLE, HIT_TABLE, DOMAINS, STATS].concat();
        let result = single(&text);
        assert_eq!(result[0].len(), 1);
        assert!(result[0][0].alignment.is_none());
        assert_eq!(result[0][0].aln_len(), 0);
    }

    #[test]
    fn test_zero_hits() {
        let text = format!(
            "{}{}",
            PREAMBLE,
            "\
Query:       random_s00  [L=32]

Scores for complete sequence (score includes all domains):
   --- full sequence ---   --- best 1 domain ---    -#dom-
    E-value  score  bias    E-value  score  bias    exp  N  Model    Description
    ------- ------ -----    ------- ------ -----   ---- --  -------- -----------

   [No hits detected that satisfy reporting thresholds]


Domain annotation for each model (and alignments):

   [No targets detected that satisfy reporting thresholds]


Internal pipeline statistics summary:
-------------------------------------
Initial search space (Z):              13672  [actual number of targets]
//
[ok]
"
        );
        let result = single(&text);
        assert_eq!(result.id, "random_s00");
        assert_eq!(result.seq_len, 32);
        assert!(result.is_empty());
        assert_eq!(result.stats.search_space, Some(13672.0));
        assert_eq!(result.stats.domain_search_space, None);
    }

    #[test]
    fn test_zone_header_in_stats() {
        for header in [
            ">> Globin  Globin",
            "Scores for complete sequence (score includes all domains):",
            "  == domain 1    score: 20.0 bits;  conditional E-value: 1.1e-09",
            "  Alignments for each domain:",
            "Domain annotation for each model (and alignments):",
        ] {
            let text = report().replace(
                "# CPU time:",
                &format!("{}\n# CPU time:", header),
            );
            match &read_all(&text)[0] {
                Err(HmmerError::MalformedRecord { content, reason, .. }) => {
                    assert_eq!(content, header);
                    assert!(reason.contains("statistics"));
                }
                other => panic!("unexpected result for '{}': {:?}", header, other),
            }
        }
    }

    #[test]
    fn test_truncated_table_description() {
        let text = report()
            .replace(
                "1.0  1  Globin   Globin",
                "1.0  1  Globin   Globin family alpha-2 OS",
            )
            .replace(
                ">> Globin  Globin",
                ">> Globin  Globin family alpha-2 OS=Mus musculus GN=Hba PE=2 SV=1",
            );
        let result = single(&text);
        let hit = &result[0];
        assert_eq!(hit.description, "Globin family alpha-2 OS");
        assert_eq!(
            hit.full_description.as_deref(),
            Some("Globin family alpha-2 OS=Mus musculus GN=Hba PE=2 SV=1")
        );
        assert_eq!(
            hit.longest_description(),
            "Globin family alpha-2 OS=Mus musculus GN=Hba PE=2 SV=1"
        );

        // an identical header description adds nothing
        let result = single(&report());
        assert_eq!(result[0].description, "Globin");
        assert!(result[0].full_description.is_none());
    }

    #[test]
    fn test_iterator_fused_after_end() {
        let text = report();
        let mut reader = Reader::new(text.as_bytes());
        let mut records = reader.records();
        assert!(records.next().unwrap().is_ok());
        assert!(records.next().is_none());
        assert!(records.next().is_none());
    }

    #[test]
    fn test_missing_terminator() {
        let text = report();
        let truncated = text.trim_end().trim_end_matches("//");
        let results = read_all(truncated);
        assert_eq!(results.len(), 1);
        match &results[0] {
            Err(HmmerError::UnexpectedEof { query, .. }) => assert_eq!(query, "seq1"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_query_inside_record() {
        let text = [PREAMBLE, "Query:       a  [L=5]\nQuery:       b  [L=5]\n//\n"].concat();
        let results = read_all(&text);
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            Err(HmmerError::MalformedRecord { line: 10, .. })
        ));
    }

    #[test]
    fn test_query_without_preamble() {
        let results = read_all("Query:       a  [L=5]\n//\n");
        assert!(matches!(
            results[0],
            Err(HmmerError::MalformedRecord { line: 1, .. })
        ));
    }

    #[test]
    fn test_unsupported_program() {
        let results = read_all("# phmmer :: search a protein sequence against a protein database\n");
        match &results[0] {
            Err(HmmerError::MalformedRecord { reason, .. }) => assert!(reason.contains("phmmer")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_domain_count_mismatch() {
        let text = report().replace("1.0  1  Globin", "1.0  2  Globin");
        let results = read_all(&text);
        match &results[0] {
            Err(HmmerError::MalformedRecord { reason, .. }) => {
                assert!(reason.contains("Globin"));
                assert!(reason.contains("2 domains"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_undetailed_hit_with_domains() {
        let text = report().replace("1.1  0  Other", "1.1  1  Other");
        assert!(matches!(
            read_all(&text)[0],
            Err(HmmerError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_unknown_hit_header() {
        let text = report().replace(">> Globin  Globin", ">> Missing  Missing");
        assert!(matches!(
            read_all(&text)[0],
            Err(HmmerError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_alignment_for_missing_domain() {
        let text = report().replace("== domain 1 ", "== domain 3 ");
        match &read_all(&text)[0] {
            Err(HmmerError::MalformedRecord { reason, .. }) => assert!(reason.contains("domain 3")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_track_alignment_error() {
        let text = report().replace("seq1   7 ekalvrk 13", "seq1   7 ekalvrk 14");
        let text = text.replace("7      13 ..", "7      14 ..");
        match &read_all(&text)[0] {
            Err(HmmerError::TrackAlignment {
                query, hit, domain, ..
            }) => {
                assert_eq!(query, "seq1");
                assert_eq!(hit, "Globin");
                assert_eq!(*domain, 1);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let lenient = ParseOptions::new().check_coordinates(false);
        let mut reader = Reader::with_options(text.as_bytes(), lenient);
        assert!(reader.read_record().unwrap().is_some());
    }

    #[test]
    fn test_error_fuses_iterator() {
        let text = [
            report().replace("1.0  1  Globin", "1.0  2  Globin"),
            report(),
        ]
        .concat();
        let results = read_all(&text);
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }

    #[test]
    fn test_preamble_carries_over() {
        let second = [HIT_TABLE, DOMAINS, ALIGNMENT, STATS].concat();
        let text = [report(), second].concat();
        let results: Vec<QueryResult> = read_all(&text).into_iter().map(Result::unwrap).collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].target(), Some("Pfam-A.hmm"));
        assert_eq!(results[1].version(), Some("3.0"));
    }

    #[test]
    fn test_assume_included_option() {
        let text = report();
        let strict = ParseOptions::new().assume_included(false);
        let mut reader = Reader::with_options(text.as_bytes(), strict);
        let result = reader.read_record().unwrap().unwrap();
        assert!(!result[0].is_included);
        // domain rows keep their own marker
        assert!(result[0][0].is_included);
    }

    #[test]
    fn test_preamble_apply() {
        let mut preamble = Preamble::default();
        preamble
            .apply(SourceLine::new(1, "# hmmsearch :: search profile(s) against a sequence database"))
            .unwrap();
        preamble
            .apply(SourceLine::new(2, "# HMMER 3.1b2 (February 2015); http://hmmer.org/"))
            .unwrap();
        preamble
            .apply(SourceLine::new(3, "# query HMM file:                  Pkinase.hmm"))
            .unwrap();
        preamble
            .apply(SourceLine::new(4, "# target sequence database:        uniprot_sprot.fasta"))
            .unwrap();
        preamble
            .apply(SourceLine::new(5, "# per-seq hits tabular output:     out.tbl"))
            .unwrap();

        let meta = preamble.meta(Program::Hmmsearch);
        assert_eq!(meta.version.as_deref(), Some("3.1b2"));
        assert_eq!(meta.release_date.as_deref(), Some("February 2015"));
        assert_eq!(meta.query_file.as_deref(), Some("Pkinase.hmm"));
        assert_eq!(meta.target.as_deref(), Some("uniprot_sprot.fasta"));

        // a new program line resets the rest
        preamble
            .apply(SourceLine::new(6, "# hmmscan :: search sequence(s) against a profile database"))
            .unwrap();
        assert_eq!(preamble.program, Some(Program::Hmmscan));
        assert!(preamble.target.is_none());
    }
}
