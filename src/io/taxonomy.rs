//! Taxonomy assignment readers. Each dialect produces a `TaxonomyTable`
//! with hits ordered best first and the source line kept per hit.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::error::{ConfigError, InputError};
use crate::table::{Assignment, TaxonomyTable, NOT_ASSIGNED};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxonomyDialect {
    Blast,
    Bold,
    Sintax,
    Idtaxa,
}

impl TaxonomyDialect {
    /// Command-line flag that selects this dialect, without the dashes.
    pub fn input_flag(self) -> &'static str {
        match self {
            TaxonomyDialect::Blast => "blast-input",
            TaxonomyDialect::Bold => "bold-input",
            TaxonomyDialect::Sintax => "sintax-input",
            TaxonomyDialect::Idtaxa => "idtaxa-input",
        }
    }

    /// BOLD and IDTAXA are recognised on the command line but not parsed.
    pub fn ensure_supported(self) -> Result<(), ConfigError> {
        match self {
            TaxonomyDialect::Blast | TaxonomyDialect::Sintax => Ok(()),
            TaxonomyDialect::Bold => Err(ConfigError::UnsupportedDialect("BOLD")),
            TaxonomyDialect::Idtaxa => Err(ConfigError::UnsupportedDialect("IDTAXA")),
        }
    }
}

impl fmt::Display for TaxonomyDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaxonomyDialect::Blast => "BLAST",
            TaxonomyDialect::Bold => "BOLD",
            TaxonomyDialect::Sintax => "SINTAX",
            TaxonomyDialect::Idtaxa => "IDTAXA",
        })
    }
}

/// 0-based column indexes of a tabular BLAST report (outfmt 6 defaults
/// with a taxonomy id in the subject column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlastColumns {
    pub seqname: usize,
    pub taxid: usize,
    pub pident: usize,
    pub qcov: usize,
    pub evalue: Option<usize>,
}

impl Default for BlastColumns {
    fn default() -> Self {
        Self { seqname: 0, taxid: 1, pident: 3, qcov: 5, evalue: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomySource {
    pub dialect: TaxonomyDialect,
    pub path: PathBuf,
}

pub fn read_taxonomy(source: &TaxonomySource, columns: BlastColumns) -> Result<TaxonomyTable> {
    source.dialect.ensure_supported()?;
    let table = match source.dialect {
        TaxonomyDialect::Sintax => read_sintax(&source.path)?,
        _ => read_blast(&source.path, columns)?,
    };
    info!("{}: {} taxonomy records for {} taxa", source.path.display(), source.dialect, table.len());
    Ok(table)
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let fh = File::open(path).with_context(|| format!("cannot open taxonomy file '{}'", path.display()))?;
    Ok(BufReader::new(fh))
}

pub fn read_blast(path: &Path, columns: BlastColumns) -> Result<TaxonomyTable> {
    parse_blast(open(path)?, path, columns)
}

/// Hits per query keep file order unless an e-value column is configured,
/// in which case they are ordered by ascending e-value (stable).
pub fn parse_blast<R: BufRead>(reader: R, path: &Path, columns: BlastColumns) -> Result<TaxonomyTable> {
    struct Hit {
        query: String,
        assignment: Assignment,
        evalue: f64,
        raw: String,
    }

    let mut hits: Vec<Hit> = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed reading '{}'", path.display()))?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let lineno = i + 1;
        let query = column(&fields, columns.seqname, "seqname", path, lineno)?.to_string();
        let label = column(&fields, columns.taxid, "taxid", path, lineno)?.to_string();
        let identity = number(&fields, columns.pident, "pident", path, lineno)?;
        let coverage = number(&fields, columns.qcov, "qcov", path, lineno)?;
        let evalue = match columns.evalue {
            Some(idx) => number(&fields, idx, "evalue", path, lineno)?,
            None => 0.0,
        };
        hits.push(Hit { query, assignment: Assignment::new(label, identity, coverage), evalue, raw: line.to_string() });
    }

    if columns.evalue.is_some() {
        hits.sort_by(|a, b| a.evalue.total_cmp(&b.evalue));
    }
    let mut table = TaxonomyTable::new();
    for h in hits {
        table.push(&h.query, h.assignment, h.raw);
    }
    Ok(table)
}

fn column<'a>(fields: &[&'a str], idx: usize, name: &str, path: &Path, line: usize) -> Result<&'a str, InputError> {
    fields.get(idx).copied().map(str::trim).ok_or_else(|| InputError::Malformed {
        path: path.to_path_buf(),
        line,
        reason: format!("no {} column at index {} ({} columns)", name, idx, fields.len()),
    })
}

fn number(fields: &[&str], idx: usize, name: &str, path: &Path, line: usize) -> Result<f64, InputError> {
    let raw = column(fields, idx, name, path, line)?;
    raw.parse::<f64>().map_err(|_| InputError::Malformed {
        path: path.to_path_buf(),
        line,
        reason: format!("{} '{}' is not a number", name, raw),
    })
}

pub fn read_sintax(path: &Path) -> Result<TaxonomyTable> {
    parse_sintax(open(path)?, path)
}

/// `query \t rank:name(conf),... \t strand \t rank:name,...`
///
/// The label is the deepest rank that passed the cutoff (fourth column),
/// falling back to the deepest predicted rank. Its confidence, as a
/// percentage, fills both quality dimensions.
pub fn parse_sintax<R: BufRead>(reader: R, path: &Path) -> Result<TaxonomyTable> {
    let mut table = TaxonomyTable::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed reading '{}'", path.display()))?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let query = fields.next().unwrap_or("").trim();
        if query.is_empty() {
            return Err(InputError::Malformed {
                path: path.to_path_buf(),
                line: i + 1,
                reason: "empty query column".to_string(),
            }
            .into());
        }
        let predicted = parse_predictions(fields.next().unwrap_or(""), path, i + 1)?;
        let passed = fields.nth(1).unwrap_or("").trim();

        let label = passed
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .last()
            .or_else(|| predicted.last().map(|(name, _)| *name));
        let assignment = match label {
            Some(label) => {
                let confidence = predicted.iter().find(|(name, _)| *name == label).map_or(0.0, |(_, c)| c * 100.0);
                Assignment::new(label, confidence, confidence)
            }
            None => Assignment::new(NOT_ASSIGNED, 0.0, 0.0),
        };
        table.push(query, assignment, line);
    }
    Ok(table)
}

fn parse_predictions<'a>(field: &'a str, path: &Path, line: usize) -> Result<Vec<(&'a str, f64)>, InputError> {
    field
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(|rank| {
            let (name, conf) = match rank.rfind('(') {
                Some(open) if rank.ends_with(')') => (&rank[..open], &rank[open + 1..rank.len() - 1]),
                _ => (rank, "1"),
            };
            conf.parse::<f64>().map(|c| (name, c)).map_err(|_| InputError::Malformed {
                path: path.to_path_buf(),
                line,
                reason: format!("bad confidence in '{}'", rank),
            })
        })
        .collect()
}

/// Re-emit the source lines of the given taxa, in the given order.
pub fn write_taxonomy_records<'a, W, I>(mut w: W, table: &TaxonomyTable, ids: I) -> std::io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a str>,
{
    for id in ids {
        for raw in table.records(id) {
            writeln!(w, "{}", raw)?;
        }
    }
    w.flush()
}
