/// Gap characters accepted in aligned sequences.
pub const GAP: u8 = b'-';

#[inline]
pub fn is_gap(b: u8) -> bool {
    b == b'-' || b == b'.'
}

/// Uppercase, map RNA `U` to `T`. Gap characters and ambiguity codes pass through.
pub fn normalize_seq(seq: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(seq.len());
    for &b in seq {
        let up = b.to_ascii_uppercase();
        out.push(if up == b'U' { b'T' } else { up });
    }
    out
}

/// Drop gap characters from an aligned row.
pub fn strip_gaps(aligned: &[u8]) -> Vec<u8> {
    aligned.iter().copied().filter(|&b| !is_gap(b)).collect()
}

/// Ungapped comparison of an aligned row against a raw sequence, case-insensitive.
pub fn same_residues(aligned: &[u8], raw: &[u8]) -> bool {
    strip_gaps(aligned).eq_ignore_ascii_case(raw)
}
