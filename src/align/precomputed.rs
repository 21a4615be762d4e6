//! Externally supplied multiple alignment, consumed column-wise.

use std::collections::HashMap;

use rayon::prelude::*;

use super::PairAlignment;
use crate::error::AlignmentIssue;
use crate::table::SequenceStore;
use crate::util::dna;

/// Aligned rows keyed by taxon id. Rows are stored uppercased, with every
/// gap character written as `-`.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedAlignment {
    rows: HashMap<String, Vec<u8>>,
}

impl PrecomputedAlignment {
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        Self {
            rows: rows.into_iter().map(|(id, row)| (id, normalize_row(&row))).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The two full-length rows for a pair, or `None` when either is not covered.
    pub fn pair(&self, a: &str, b: &str) -> Option<PairAlignment> {
        let first = self.rows.get(a)?;
        let second = self.rows.get(b)?;
        if first.len() != second.len() {
            return None;
        }
        Some(PairAlignment { first: first.clone(), second: second.clone() })
    }

    /// Check coverage of every sequence id, uniform row length and that each
    /// row reproduces its raw sequence once gaps are stripped.
    pub fn verify(&self, sequences: &SequenceStore) -> Vec<AlignmentIssue> {
        let mut issues = Vec::new();
        if self.rows.is_empty() {
            issues.push(AlignmentIssue::Empty);
            return issues;
        }

        let mut missing: Vec<String> = sequences
            .ids()
            .filter(|id| !self.rows.contains_key(*id))
            .map(str::to_string)
            .collect();
        missing.sort();
        if !missing.is_empty() {
            issues.push(AlignmentIssue::MissingIds(missing));
        }

        // 以出现次数最多的行长作为期望长度
        let mut lengths: HashMap<usize, usize> = HashMap::new();
        for row in self.rows.values() {
            *lengths.entry(row.len()).or_default() += 1;
        }
        let expected = lengths
            .iter()
            .max_by_key(|&(len, count)| (*count, std::cmp::Reverse(*len)))
            .map(|(len, _)| *len)
            .unwrap_or(0);

        let mut per_row: Vec<AlignmentIssue> = self
            .rows
            .par_iter()
            .flat_map_iter(|(id, row)| {
                let mut found = Vec::new();
                if row.len() != expected {
                    found.push(AlignmentIssue::UnevenLength { id: id.clone(), len: row.len(), expected });
                }
                if let Some(raw) = sequences.get(id) {
                    if !dna::same_residues(row, raw) {
                        found.push(AlignmentIssue::SequenceMismatch { id: id.clone() });
                    }
                }
                found
            })
            .collect();
        per_row.sort_by(|a, b| issue_key(a).cmp(issue_key(b)));
        issues.extend(per_row);
        issues
    }
}

fn normalize_row(row: &[u8]) -> Vec<u8> {
    let mut out = dna::normalize_seq(row);
    for b in out.iter_mut().filter(|b| dna::is_gap(**b)) {
        *b = dna::GAP;
    }
    out
}

fn issue_key(issue: &AlignmentIssue) -> &str {
    match issue {
        AlignmentIssue::UnevenLength { id, .. } | AlignmentIssue::SequenceMismatch { id } => id,
        _ => "",
    }
}
