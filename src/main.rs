//! hmmertext - HMMER 3 report extractor
//!
//! Reads a `hmmscan` or `hmmsearch` text report and writes its content as
//! tab-separated tables or aligned FASTA.
//!
//! ## Usage
//!
//! ```bash
//! hmmertext scan.out                    # one line per hit
//! hmmertext -m domains scan.out         # one line per domain
//! hmmertext -m alignments -o pairs.fa scan.out
//! hmmscan db.hmm seqs.fa | hmmertext -
//! ```

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use log::{info, warn, LevelFilter};

use hmmertext::hmmer::Reader;
use hmmertext::model::QueryResult;
use hmmertext::options::ParseOptions;

/// What to extract from the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// One tab-separated line per hit
    Hits,
    /// One tab-separated line per domain
    Domains,
    /// Query/hit pairs of aligned sequences, as FASTA
    Alignments,
}

/// hmmertext - extract hits, domains and alignments from HMMER 3 text reports
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// hmmscan or hmmsearch text report ("-" for stdin)
    report: PathBuf,

    /// Content to write
    #[arg(short = 'm', long = "mode", value_enum, default_value = "hits")]
    mode: Mode,

    /// Output file. Use "-" for stdout.
    #[arg(short = 'o', long = "output", default_value = "-")]
    output: String,

    /// Treat hits printed without an inclusion marker as not included
    #[arg(long = "no-assume-included")]
    no_assume_included: bool,

    /// Do not check aligned residues against the domain coordinates
    #[arg(long = "skip-coordinate-check")]
    skip_coordinate_check: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn open_report(path: &Path) -> Result<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(io::stdin()));
    }
    let file = File::open(path)
        .with_context(|| format!("Failed to open report {}", path.display()))?;
    Ok(Box::new(file))
}

fn open_output(output: &str) -> Result<Box<dyn Write>> {
    if output == "-" {
        return Ok(Box::new(BufWriter::new(io::stdout().lock())));
    }
    let file = File::create(output).with_context(|| format!("Failed to create {}", output))?;
    Ok(Box::new(BufWriter::new(file)))
}

fn write_header<W: Write>(out: &mut W, mode: Mode) -> io::Result<()> {
    match mode {
        Mode::Hits => writeln!(
            out,
            "query\thit\tevalue\tbitscore\tbias\texp\tN\tincluded\tdescription"
        ),
        Mode::Domains => writeln!(
            out,
            "query\thit\tdomain\tincluded\tbitscore\tbias\tc_evalue\ti_evalue\t\
             hit_from\thit_to\tquery_from\tquery_to\tenv_from\tenv_to\tacc"
        ),
        Mode::Alignments => Ok(()),
    }
}

fn write_hits<W: Write>(out: &mut W, result: &QueryResult) -> io::Result<()> {
    for hit in result {
        writeln!(
            out,
            "{}\t{}\t{:e}\t{}\t{}\t{}\t{}\t{}\t{}",
            result.id,
            hit.id,
            hit.evalue,
            hit.bitscore,
            hit.bias,
            hit.expected_domains,
            hit.observed_domains,
            hit.is_included,
            hit.longest_description()
        )?;
    }
    Ok(())
}

fn write_domains<W: Write>(out: &mut W, result: &QueryResult) -> io::Result<()> {
    for hit in result {
        for hsp in hit {
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{}\t{:e}\t{:e}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                result.id,
                hit.id,
                hsp.domain_index,
                hsp.is_included,
                hsp.bitscore,
                hsp.bias,
                hsp.conditional_evalue,
                hsp.independent_evalue,
                hsp.hit_span.from,
                hsp.hit_span.to,
                hsp.query_span.from,
                hsp.query_span.to,
                hsp.env_span.from,
                hsp.env_span.to,
                hsp.mean_posterior_accuracy
            )?;
        }
    }
    Ok(())
}

/// Writes each aligned domain as a query/hit FASTA pair; returns the pair count.
fn write_alignments<W: Write>(out: &mut W, result: &QueryResult) -> io::Result<usize> {
    let mut written = 0;
    for hit in result {
        for hsp in hit {
            let Some(aln) = &hsp.alignment else {
                continue;
            };
            writeln!(
                out,
                ">{}/{}-{} {} domain {}",
                result.id, hsp.query_span.from, hsp.query_span.to, hit.id, hsp.domain_index
            )?;
            writeln!(out, "{}", aln.query_seq)?;
            writeln!(
                out,
                ">{}/{}-{} {} domain {}",
                hit.id, hsp.hit_span.from, hsp.hit_span.to, result.id, hsp.domain_index
            )?;
            writeln!(out, "{}", aln.hit_seq)?;
            written += 1;
        }
    }
    Ok(written)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let options = ParseOptions::new()
        .assume_included(!args.no_assume_included)
        .check_coordinates(!args.skip_coordinate_check);

    let input = open_report(&args.report)?;
    let mut reader = Reader::with_options(input, options);
    let mut out = open_output(&args.output)?;

    write_header(&mut out, args.mode)?;

    let mut queries = 0;
    let mut alignments = 0;
    for result in reader.records() {
        let result =
            result.with_context(|| format!("Failed to parse {}", args.report.display()))?;
        match args.mode {
            Mode::Hits => write_hits(&mut out, &result)?,
            Mode::Domains => write_domains(&mut out, &result)?,
            Mode::Alignments => alignments += write_alignments(&mut out, &result)?,
        }
        queries += 1;
    }
    out.flush()?;

    if args.mode == Mode::Alignments && alignments == 0 && queries > 0 {
        warn!("No alignments in the report (was it written with --noali?)");
    }
    info!("Processed {} queries from {}", queries, args.report.display());

    Ok(())
}
