use std::collections::HashMap;

use crate::util::dna;

/// Taxon id -> nucleotide sequence (uppercased, `U` read as `T`).
#[derive(Debug, Clone, Default)]
pub struct SequenceStore {
    seqs: HashMap<String, Vec<u8>>,
}

impl SequenceStore {
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        Self {
            seqs: records.into_iter().map(|(id, seq)| (id, dna::normalize_seq(&seq))).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&[u8]> {
        self.seqs.get(id).map(Vec::as_slice)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.seqs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }
}
