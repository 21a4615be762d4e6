//! 双序列比对：全局 Needleman–Wunsch 与局部 Smith–Waterman。
//!
//! 两种算法都返回等长的比对串（含 `-` 间隙），调用方通过逐列比较计算
//! percent identity，而不是使用原始比对得分。

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

pub mod global;
pub mod precomputed;
pub mod sw;

pub use global::{needleman_wunsch, needleman_wunsch_with_buf};
pub use precomputed::PrecomputedAlignment;
pub use sw::{smith_waterman, smith_waterman_with_buf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignMode {
    #[default]
    Global,
    Local,
}

impl AlignMode {
    pub fn default_scoring(self) -> Scoring {
        match self {
            AlignMode::Global => Scoring::global_default(),
            AlignMode::Local => Scoring::local_default(),
        }
    }
}

impl FromStr for AlignMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" | "needleman-wunsch" => Ok(AlignMode::Global),
            "local" | "smith-waterman" => Ok(AlignMode::Local),
            other => Err(ConfigError::UnknownValue {
                param: "alignment",
                value: other.to_string(),
                expected: "'global' or 'local'",
            }),
        }
    }
}

impl fmt::Display for AlignMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlignMode::Global => "global",
            AlignMode::Local => "local",
        })
    }
}

/// 线性间隙打分。罚分以正数保存，计算时取负。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scoring {
    pub match_score: i32,
    pub mismatch_penalty: i32,
    pub gap_penalty: i32,
}

impl Scoring {
    /// +2 / -1 / -1
    pub const fn global_default() -> Self {
        Self { match_score: 2, mismatch_penalty: 1, gap_penalty: 1 }
    }

    /// +2 / -5 / -5
    pub const fn local_default() -> Self {
        Self { match_score: 2, mismatch_penalty: 5, gap_penalty: 5 }
    }

    #[inline]
    pub fn substitution(&self, a: u8, b: u8) -> i32 {
        if a == b {
            self.match_score
        } else {
            -self.mismatch_penalty
        }
    }

    #[inline]
    pub fn gap(&self) -> i32 {
        -self.gap_penalty
    }
}

/// 比对结果：两条等长比对串
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PairAlignment {
    pub first: Vec<u8>,
    pub second: Vec<u8>,
}

impl PairAlignment {
    pub fn len(&self) -> usize {
        self.first.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }

    /// 逐列不相等的列数（包括间隙列）
    pub fn mismatches(&self) -> usize {
        self.first.iter().zip(&self.second).filter(|(a, b)| a != b).count()
    }
}

/// `100 * (1 - mismatches / max(len_a, len_b))`. An empty alignment scores 0,
/// which covers two empty sequences, a missing sequence and a local
/// alignment that found nothing worth keeping.
pub fn percent_identity(aln: &PairAlignment, len_a: usize, len_b: usize) -> f64 {
    let longest = len_a.max(len_b);
    if longest == 0 || aln.is_empty() {
        return 0.0;
    }
    100.0 * (1.0 - aln.mismatches() as f64 / longest as f64)
}

/// DP 工作缓冲区，可跨调用复用
#[derive(Debug, Default)]
pub struct DpBuffer {
    h: Vec<i32>,
}

impl DpBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self, size: usize) -> &mut [i32] {
        self.h.clear();
        self.h.resize(size, 0);
        &mut self.h
    }
}

/// 按配置选择全局或局部算法，并复用同一个 DP 缓冲区
#[derive(Debug)]
pub struct Aligner {
    pub mode: AlignMode,
    pub scoring: Scoring,
    buf: DpBuffer,
}

impl Aligner {
    pub fn new(mode: AlignMode, scoring: Scoring) -> Self {
        Self { mode, scoring, buf: DpBuffer::new() }
    }

    pub fn align(&mut self, a: &[u8], b: &[u8]) -> PairAlignment {
        match self.mode {
            AlignMode::Global => needleman_wunsch_with_buf(a, b, self.scoring, &mut self.buf),
            AlignMode::Local => smith_waterman_with_buf(a, b, self.scoring, &mut self.buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_counts_gap_columns() {
        let aln = PairAlignment { first: b"ACGT".to_vec(), second: b"AC-T".to_vec() };
        assert_eq!(aln.mismatches(), 1);
        assert!((percent_identity(&aln, 4, 3) - 75.0).abs() < 1e-9);
    }

    #[test]
    fn identity_of_empty_pair_is_zero() {
        assert_eq!(percent_identity(&PairAlignment::default(), 0, 0), 0.0);
    }

    #[test]
    fn empty_local_alignment_is_zero_identity() {
        let mut l = Aligner::new(AlignMode::Local, Scoring::local_default());
        let aln = l.align(b"AAAAAAAAAA", b"TTTTTTTTTT");
        assert!(aln.is_empty());
        assert_eq!(percent_identity(&aln, 10, 10), 0.0);
        assert_eq!(percent_identity(&l.align(b"ACGT", b""), 4, 0), 0.0);
    }

    #[test]
    fn aligner_dispatches_on_mode() {
        let mut g = Aligner::new(AlignMode::Global, Scoring::global_default());
        let aln = g.align(b"TTACGTTT", b"ACGT");
        assert_eq!(aln.len(), 8);

        let mut l = Aligner::new(AlignMode::Local, Scoring::local_default());
        let aln = l.align(b"TTACGTTT", b"ACGT");
        assert_eq!(aln.first, b"ACGT");
        assert_eq!(aln.second, b"ACGT");
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("local".parse::<AlignMode>().unwrap(), AlignMode::Local);
        assert_eq!(AlignMode::Local.default_scoring(), Scoring::local_default());
        assert!("banded".parse::<AlignMode>().is_err());
    }
}
