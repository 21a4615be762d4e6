use std::collections::HashMap;

/// Label carried by taxa with no taxonomy record.
pub const NOT_ASSIGNED: &str = "not assigned";

/// One taxonomic hit. `identity` and `coverage` are the two quality
/// dimensions compared by the quality gate (percent identity and query
/// coverage for BLAST; classifier confidence fills both for SINTAX).
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub label: String,
    pub identity: f64,
    pub coverage: f64,
}

impl Assignment {
    pub fn new(label: impl Into<String>, identity: f64, coverage: f64) -> Self {
        Self { label: label.into(), identity, coverage }
    }

    pub fn unassigned() -> Self {
        Self::new(NOT_ASSIGNED, 0.0, 0.0)
    }
}

#[derive(Debug, Clone, Default)]
struct TaxonEntry {
    hits: Vec<Assignment>,
    raw: Vec<String>,
}

/// Taxon id -> ordered assignments (best first) plus the source records they came from.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyTable {
    entries: HashMap<String, TaxonEntry>,
}

impl TaxonomyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hit; hits for one taxon keep insertion order.
    pub fn push(&mut self, id: &str, hit: Assignment, raw: impl Into<String>) {
        let entry = self.entries.entry(id.to_string()).or_default();
        entry.hits.push(hit);
        entry.raw.push(raw.into());
    }

    pub fn assignments(&self, id: &str) -> Option<&[Assignment]> {
        self.entries.get(id).map(|e| e.hits.as_slice()).filter(|h| !h.is_empty())
    }

    /// Source records for a taxon, empty when it has none.
    pub fn records(&self, id: &str) -> &[String] {
        self.entries.get(id).map(|e| e.raw.as_slice()).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
