use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, InputError};

/// Key the abundance table is ranked by before the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankBy {
    #[default]
    Total,
    Mean,
    Detections,
}

impl FromStr for RankBy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "total" => Ok(RankBy::Total),
            "mean" => Ok(RankBy::Mean),
            "detections" => Ok(RankBy::Detections),
            other => Err(ConfigError::UnknownValue {
                param: "sort",
                value: other.to_string(),
                expected: "'total', 'mean' or 'detections'",
            }),
        }
    }
}

impl fmt::Display for RankBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RankBy::Total => "total",
            RankBy::Mean => "mean",
            RankBy::Detections => "detections",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbundanceRow {
    pub id: String,
    pub counts: Vec<u64>,
}

impl AbundanceRow {
    pub fn new(id: impl Into<String>, counts: Vec<u64>) -> Self {
        Self { id: id.into(), counts }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn detections(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }
}

/// Per-taxon, per-sample count matrix kept in rank order.
#[derive(Debug, Clone)]
pub struct AbundanceMatrix {
    samples: Vec<String>,
    rows: Vec<AbundanceRow>,
    rank_by: RankBy,
}

impl AbundanceMatrix {
    /// Build a matrix and rank it. Rows must match the sample count and ids must be unique.
    pub fn new(samples: Vec<String>, rows: Vec<AbundanceRow>, rank_by: RankBy) -> Result<Self, InputError> {
        let mut seen = std::collections::HashSet::with_capacity(rows.len());
        for row in &rows {
            if row.counts.len() != samples.len() {
                return Err(InputError::WidthMismatch {
                    id: row.id.clone(),
                    found: row.counts.len(),
                    expected: samples.len(),
                });
            }
            if !seen.insert(row.id.as_str()) {
                return Err(InputError::DuplicateTaxon(row.id.clone()));
            }
        }
        let mut m = Self { samples, rows, rank_by };
        m.rank(rank_by);
        Ok(m)
    }

    /// Stable descending sort; ties keep their current order.
    pub fn rank(&mut self, by: RankBy) {
        let n = self.samples.len().max(1) as f64;
        let key = |r: &AbundanceRow| -> f64 {
            match by {
                RankBy::Total => r.total() as f64,
                RankBy::Mean => r.total() as f64 / n,
                RankBy::Detections => r.detections() as f64,
            }
        };
        self.rows.sort_by(|a, b| key(b).total_cmp(&key(a)));
        self.rank_by = by;
    }

    pub fn rank_key(&self, row: &AbundanceRow) -> f64 {
        match self.rank_by {
            RankBy::Total => row.total() as f64,
            RankBy::Mean => row.total() as f64 / self.samples.len().max(1) as f64,
            RankBy::Detections => row.detections() as f64,
        }
    }

    /// Confirm rows are non-increasing in the ranking key.
    pub fn check_ranked(&self) -> Result<(), InputError> {
        for (rank, pair) in self.rows.windows(2).enumerate() {
            if self.rank_key(&pair[1]) > self.rank_key(&pair[0]) {
                return Err(InputError::Unranked { id: pair[1].id.clone(), rank: rank + 1 });
            }
        }
        Ok(())
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn rows(&self) -> &[AbundanceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of every count in the table.
    pub fn grand_total(&self) -> u64 {
        self.rows.iter().map(AbundanceRow::total).sum()
    }
}

/// One sample exclusion pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamplePattern {
    Exact(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
}

impl SamplePattern {
    /// `*x*` substring, `*x` suffix, `x*` prefix, anything else exact.
    pub fn parse(pattern: &str) -> Self {
        let leading = pattern.starts_with('*');
        let trailing = pattern.len() > 1 && pattern.ends_with('*');
        let core = pattern.trim_start_matches('*').trim_end_matches('*').to_string();
        match (leading, trailing) {
            (true, true) => SamplePattern::Contains(core),
            (true, false) if pattern.len() == 1 => SamplePattern::Contains(core),
            (true, false) => SamplePattern::Suffix(core),
            (false, true) => SamplePattern::Prefix(core),
            (false, false) => SamplePattern::Exact(pattern.to_string()),
        }
    }

    pub fn matches(&self, sample: &str) -> bool {
        match self {
            SamplePattern::Exact(s) => sample == s,
            SamplePattern::Prefix(s) => sample.starts_with(s.as_str()),
            SamplePattern::Suffix(s) => sample.ends_with(s.as_str()),
            SamplePattern::Contains(s) => sample.contains(s.as_str()),
        }
    }
}

/// Which samples take part in the co-occurrence comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleMask {
    keep: Vec<bool>,
}

impl SampleMask {
    pub fn all(n: usize) -> Self {
        Self { keep: vec![true; n] }
    }

    pub fn new(samples: &[String], patterns: &[String]) -> Self {
        let parsed: Vec<SamplePattern> = patterns
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(SamplePattern::parse)
            .collect();
        let keep = samples.iter().map(|s| !parsed.iter().any(|p| p.matches(s))).collect();
        Self { keep }
    }

    #[inline]
    pub fn keeps(&self, sample: usize) -> bool {
        self.keep[sample]
    }

    pub fn retained(&self) -> usize {
        self.keep.iter().filter(|&&k| k).count()
    }

    pub fn excluded<'a>(&self, samples: &'a [String]) -> Vec<&'a str> {
        samples
            .iter()
            .zip(&self.keep)
            .filter(|(_, &k)| !k)
            .map(|(s, _)| s.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn ranks_by_total_with_stable_ties() {
        let rows = vec![
            AbundanceRow::new("low", vec![1, 0]),
            AbundanceRow::new("tie1", vec![5, 0]),
            AbundanceRow::new("high", vec![10, 10]),
            AbundanceRow::new("tie2", vec![0, 5]),
        ];
        let m = AbundanceMatrix::new(names(&["s1", "s2"]), rows, RankBy::Total).unwrap();
        let order: Vec<&str> = m.rows().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(order, ["high", "tie1", "tie2", "low"]);
        assert!(m.check_ranked().is_ok());
        assert_eq!(m.grand_total(), 31);
    }

    #[test]
    fn ranks_by_detections() {
        let rows = vec![AbundanceRow::new("big", vec![100, 0, 0]), AbundanceRow::new("wide", vec![1, 1, 1])];
        let m = AbundanceMatrix::new(names(&["a", "b", "c"]), rows, RankBy::Detections).unwrap();
        assert_eq!(m.rows()[0].id, "wide");
    }

    #[test]
    fn rejects_bad_rows() {
        let dup = vec![AbundanceRow::new("x", vec![1]), AbundanceRow::new("x", vec![2])];
        assert!(matches!(
            AbundanceMatrix::new(names(&["s"]), dup, RankBy::Total),
            Err(InputError::DuplicateTaxon(_))
        ));
        let wide = vec![AbundanceRow::new("x", vec![1, 2])];
        assert!(matches!(
            AbundanceMatrix::new(names(&["s"]), wide, RankBy::Total),
            Err(InputError::WidthMismatch { .. })
        ));
    }

    #[test]
    fn pattern_kinds() {
        assert_eq!(SamplePattern::parse("neg"), SamplePattern::Exact("neg".into()));
        assert_eq!(SamplePattern::parse("neg*"), SamplePattern::Prefix("neg".into()));
        assert_eq!(SamplePattern::parse("*neg"), SamplePattern::Suffix("neg".into()));
        assert_eq!(SamplePattern::parse("*neg*"), SamplePattern::Contains("neg".into()));
        assert!(SamplePattern::parse("*").matches("anything"));
    }

    #[test]
    fn mask_excludes_matching_samples() {
        let samples = names(&["neg_1", "site_A", "site_B_blank", "x_ctrl_y", "neg"]);
        let mask = SampleMask::new(&samples, &names(&["neg*", "*blank", "*ctrl*"]));
        assert_eq!(mask.excluded(&samples), ["neg_1", "site_B_blank", "x_ctrl_y", "neg"]);
        assert_eq!(mask.retained(), 1);
        assert!(mask.keeps(1));
    }
}
