use super::{DpBuffer, PairAlignment, Scoring};
use crate::util::dna::GAP;

/// 全局 Needleman–Wunsch 比对（线性间隙）
pub fn needleman_wunsch(a: &[u8], b: &[u8], p: Scoring) -> PairAlignment {
    needleman_wunsch_with_buf(a, b, p, &mut DpBuffer::new())
}

pub fn needleman_wunsch_with_buf(a: &[u8], b: &[u8], p: Scoring, buf: &mut DpBuffer) -> PairAlignment {
    let m = a.len();
    let n = b.len();
    let cols = n + 1;
    let h = buf.reset((m + 1) * cols);
    let gap = p.gap();

    // 边界：累计间隙罚分
    for i in 1..=m {
        h[i * cols] = i as i32 * gap;
    }
    for j in 1..=n {
        h[j] = j as i32 * gap;
    }

    for i in 1..=m {
        for j in 1..=n {
            let diag = h[(i - 1) * cols + (j - 1)] + p.substitution(a[i - 1], b[j - 1]);
            let up = h[(i - 1) * cols + j] + gap;
            let left = h[i * cols + (j - 1)] + gap;
            h[i * cols + j] = diag.max(up).max(left);
        }
    }

    // 从右下角回溯到 (0,0)，优先对角线，其次纵向，最后横向
    let mut first = Vec::with_capacity(m + n);
    let mut second = Vec::with_capacity(m + n);
    let mut i = m;
    let mut j = n;
    while i > 0 || j > 0 {
        let here = h[i * cols + j];
        if i > 0 && j > 0 && here == h[(i - 1) * cols + (j - 1)] + p.substitution(a[i - 1], b[j - 1]) {
            first.push(a[i - 1]);
            second.push(b[j - 1]);
            i -= 1;
            j -= 1;
        } else if i > 0 && here == h[(i - 1) * cols + j] + gap {
            first.push(a[i - 1]);
            second.push(GAP);
            i -= 1;
        } else {
            first.push(GAP);
            second.push(b[j - 1]);
            j -= 1;
        }
    }

    first.reverse();
    second.reverse();
    PairAlignment { first, second }
}
