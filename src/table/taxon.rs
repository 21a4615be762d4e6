use log::{info, warn};

use super::{AbundanceMatrix, Assignment, SequenceStore, TaxonomyTable};
use crate::error::InputError;

/// A sequence variant with everything the pairwise scan looks up.
#[derive(Debug, Clone)]
pub struct Taxon {
    pub id: String,
    pub sequence: Vec<u8>,
    pub counts: Vec<u64>,
    /// best first; never empty
    pub assignments: Vec<Assignment>,
    pub total: u64,
}

impl Taxon {
    pub fn best(&self) -> &Assignment {
        &self.assignments[0]
    }
}

/// Taxa in rank order, materialised from the three input tables before the
/// scan so that the hot loop only does index lookups.
#[derive(Debug, Clone)]
pub struct TaxonSet {
    pub samples: Vec<String>,
    pub taxa: Vec<Taxon>,
}

impl TaxonSet {
    /// Join the tables on taxon id. Missing sequences become empty, missing
    /// taxonomy becomes the `not assigned` sentinel.
    pub fn assemble(
        matrix: &AbundanceMatrix,
        sequences: Option<&SequenceStore>,
        taxonomy: Option<&TaxonomyTable>,
    ) -> Result<Self, InputError> {
        matrix.check_ranked()?;

        let mut no_seq = Vec::new();
        let mut no_tax = Vec::new();
        let taxa: Vec<Taxon> = matrix
            .rows()
            .iter()
            .map(|row| {
                let sequence = match sequences.map(|s| s.get(&row.id)) {
                    Some(Some(seq)) => seq.to_vec(),
                    Some(None) => {
                        no_seq.push(row.id.as_str());
                        Vec::new()
                    }
                    None => Vec::new(),
                };
                let assignments = match taxonomy.map(|t| t.assignments(&row.id)) {
                    Some(Some(hits)) => hits.to_vec(),
                    Some(None) => {
                        no_tax.push(row.id.as_str());
                        vec![Assignment::unassigned()]
                    }
                    None => vec![Assignment::unassigned()],
                };
                Taxon {
                    id: row.id.clone(),
                    sequence,
                    counts: row.counts.clone(),
                    assignments,
                    total: row.total(),
                }
            })
            .collect();

        if !no_seq.is_empty() {
            warn!("{} taxa have no sequence, using an empty sequence: {}", no_seq.len(), preview(&no_seq));
        }
        if !no_tax.is_empty() {
            warn!("{} taxa have no taxonomy record, marked as not assigned: {}", no_tax.len(), preview(&no_tax));
        }
        info!("assembled {} taxa over {} samples", taxa.len(), matrix.samples().len());

        Ok(Self { samples: matrix.samples().to_vec(), taxa })
    }

    pub fn len(&self) -> usize {
        self.taxa.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taxa.is_empty()
    }
}

fn preview(ids: &[&str]) -> String {
    const SHOWN: usize = 5;
    if ids.len() <= SHOWN {
        ids.join(", ")
    } else {
        format!("{}, ...", ids[..SHOWN].join(", "))
    }
}
