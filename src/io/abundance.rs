//! Tab-separated frequency tables.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::error::InputError;
use crate::table::{AbundanceMatrix, AbundanceRow, RankBy};

/// Orientation of the table on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// one row per taxon, one column per sample
    #[default]
    TaxaAsRows,
    /// one row per sample, one column per taxon
    TaxaAsColumns,
}

/// Read a frequency table and rank it. The first non-empty line is the
/// header; a leading `#` on it is ignored, as is its first cell.
pub fn read_frequency_table(path: &Path, layout: Layout, rank_by: RankBy) -> Result<AbundanceMatrix> {
    let fh = File::open(path).with_context(|| format!("cannot open frequency table '{}'", path.display()))?;
    parse_frequency_table(BufReader::new(fh), path, layout, rank_by)
}

pub fn parse_frequency_table<R: BufRead>(reader: R, path: &Path, layout: Layout, rank_by: RankBy) -> Result<AbundanceMatrix> {
    let malformed = |line: usize, reason: String| InputError::Malformed { path: path.to_path_buf(), line, reason };

    let mut header: Option<Vec<String>> = None;
    let mut rows: Vec<AbundanceRow> = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed reading '{}'", path.display()))?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let lineno = i + 1;
        if header.is_none() {
            let names = line.trim_start_matches('#').split('\t').skip(1).map(str::to_string).collect();
            header = Some(names);
            continue;
        }
        let width = header.as_ref().map_or(0, Vec::len);

        let mut fields = line.split('\t');
        let id = fields.next().unwrap_or("").trim().to_string();
        if id.is_empty() {
            return Err(malformed(lineno, "empty first column".to_string()).into());
        }
        let counts = fields
            .map(|f| {
                f.trim()
                    .parse::<u64>()
                    .map_err(|_| malformed(lineno, format!("'{}' is not a non-negative integer count", f.trim())))
            })
            .collect::<Result<Vec<u64>, InputError>>()?;
        if counts.len() != width {
            return Err(malformed(lineno, format!("{} counts for {} header columns", counts.len(), width)).into());
        }
        rows.push(AbundanceRow::new(id, counts));
    }

    let header = header.ok_or_else(|| InputError::MissingHeader(path.to_path_buf()))?;
    let (samples, rows) = match layout {
        Layout::TaxaAsRows => (header, rows),
        Layout::TaxaAsColumns => transpose(header, rows),
    };
    if rows.is_empty() {
        return Err(InputError::EmptyTable(path.to_path_buf()).into());
    }

    let matrix = AbundanceMatrix::new(samples, rows, rank_by)?;
    info!(
        "{}: {} taxa x {} samples, {} reads, ranked by {}",
        path.display(),
        matrix.len(),
        matrix.samples().len(),
        matrix.grand_total(),
        rank_by
    );
    Ok(matrix)
}

/// Samples-as-rows to taxa-as-rows: header cells become taxon ids, row ids become samples.
fn transpose(taxa: Vec<String>, sample_rows: Vec<AbundanceRow>) -> (Vec<String>, Vec<AbundanceRow>) {
    let samples: Vec<String> = sample_rows.iter().map(|r| r.id.clone()).collect();
    let rows = taxa
        .into_iter()
        .enumerate()
        .map(|(t, id)| AbundanceRow::new(id, sample_rows.iter().map(|r| r.counts[t]).collect()))
        .collect();
    (samples, rows)
}

/// Always written with taxa as rows, `ID` in the corner cell.
pub fn write_frequency_table<W: Write>(mut w: W, samples: &[String], rows: &[AbundanceRow]) -> std::io::Result<()> {
    writeln!(w, "ID\t{}", samples.join("\t"))?;
    for row in rows {
        write!(w, "{}", row.id)?;
        for c in &row.counts {
            write!(w, "\t{}", c)?;
        }
        writeln!(w)?;
    }
    w.flush()
}
