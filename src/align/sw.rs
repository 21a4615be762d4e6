use super::{DpBuffer, PairAlignment, Scoring};
use crate::util::dna::GAP;

/// 局部 Smith–Waterman 比对（线性间隙，全矩阵）
/// 返回局部比对片段；得分全为 0 时返回空比对
pub fn smith_waterman(a: &[u8], b: &[u8], p: Scoring) -> PairAlignment {
    smith_waterman_with_buf(a, b, p, &mut DpBuffer::new())
}

pub fn smith_waterman_with_buf(a: &[u8], b: &[u8], p: Scoring, buf: &mut DpBuffer) -> PairAlignment {
    let m = a.len();
    let n = b.len();

    if m == 0 || n == 0 {
        return PairAlignment::default();
    }

    let cols = n + 1;
    let h = buf.reset((m + 1) * cols);
    let gap = p.gap();

    let mut best_score = 0i32;
    let mut best_i = 0usize;
    let mut best_j = 0usize;

    for i in 1..=m {
        for j in 1..=n {
            let diag = h[(i - 1) * cols + (j - 1)] + p.substitution(a[i - 1], b[j - 1]);
            let up = h[(i - 1) * cols + j] + gap;
            let left = h[i * cols + (j - 1)] + gap;
            let val = diag.max(up).max(left).max(0);
            h[i * cols + j] = val;

            // 严格大于：并列时保留行优先顺序中的第一个
            if val > best_score {
                best_score = val;
                best_i = i;
                best_j = j;
            }
        }
    }

    if best_score <= 0 {
        return PairAlignment::default();
    }

    // backtrack from best cell until a zero cell
    let mut first = Vec::new();
    let mut second = Vec::new();
    let mut i = best_i;
    let mut j = best_j;

    while i > 0 && j > 0 {
        let here = h[i * cols + j];
        if here == 0 {
            break;
        }

        if here == h[(i - 1) * cols + (j - 1)] + p.substitution(a[i - 1], b[j - 1]) {
            first.push(a[i - 1]);
            second.push(b[j - 1]);
            i -= 1;
            j -= 1;
        } else if here == h[(i - 1) * cols + j] + gap {
            first.push(a[i - 1]);
            second.push(GAP);
            i -= 1;
        } else if here == h[i * cols + (j - 1)] + gap {
            first.push(GAP);
            second.push(b[j - 1]);
            j -= 1;
        } else {
            break;
        }
    }

    first.reverse();
    second.reverse();
    PairAlignment { first, second }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_params() -> Scoring {
        Scoring::local_default()
    }

    #[test]
    fn sw_perfect_match() {
        let res = smith_waterman(b"ACGT", b"ACGT", default_params());
        assert_eq!(res.first, b"ACGT");
        assert_eq!(res.second, b"ACGT");
        assert_eq!(res.mismatches(), 0);
    }

    #[test]
    fn sw_extracts_shared_core() {
        let res = smith_waterman(b"GGGGACGTACGTCCCC", b"TTACGTACGTAA", default_params());
        assert_eq!(res.first, b"ACGTACGT");
        assert_eq!(res.second, b"ACGTACGT");
    }

    #[test]
    fn sw_mismatch_inside_long_match() {
        // 8 match each side of the mismatch outweigh the -5 penalty
        let res = smith_waterman(b"ACGTACGTTACGTACGT", b"ACGTACGTAACGTACGT", default_params());
        assert_eq!(res.len(), 17);
        assert_eq!(res.mismatches(), 1);
    }

    #[test]
    fn sw_tie_keeps_first_in_row_major_order() {
        // "AC" occurs twice in b; the first occurrence (lower column) wins
        let res = smith_waterman(b"AC", b"ACTTAC", default_params());
        assert_eq!(res.first, b"AC");
        assert_eq!(res.second, b"AC");
    }

    #[test]
    fn sw_empty_inputs() {
        let p = default_params();
        assert!(smith_waterman(b"", b"ACGT", p).is_empty());
        assert!(smith_waterman(b"ACGT", b"", p).is_empty());
        assert!(smith_waterman(b"AAAA", b"TTTT", p).is_empty());
    }

    #[test]
    fn sw_buffer_reuse() {
        let p = default_params();
        let mut buf = DpBuffer::new();
        let r1 = smith_waterman_with_buf(b"ACGT", b"ACGT", p, &mut buf);
        assert_eq!(r1.len(), 4);
        let r2 = smith_waterman_with_buf(b"TTTTACGTTTTT", b"ACGT", p, &mut buf);
        assert_eq!(r2.first, b"ACGT");
    }
}
