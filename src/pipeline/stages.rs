//! The cheap per-pair checks. Each returns an `Outcome` that records the
//! evidence whether it passed or not.

use crate::audit::{Outcome, QualityPair};
use crate::config::{OccurrenceMode, RatioPolicy};
use crate::table::{SampleMask, Taxon};

/// Pass when parent and child share at least one assignment label. The
/// shared label reported is the first one in the parent's ranking.
pub fn taxonomy_overlap(parent: &Taxon, child: &Taxon) -> Outcome {
    let shared = parent
        .assignments
        .iter()
        .map(|a| a.label.as_str())
        .find(|label| child.assignments.iter().any(|c| c.label == *label));
    match shared {
        Some(label) => Outcome::TaxonomyMatch { shared: label.to_string() },
        None => Outcome::TaxonomyMismatch {
            child: child.best().label.clone(),
            parent: parent.best().label.clone(),
        },
    }
}

/// Fails only when the child's best hit scores higher than the parent's on
/// both identity and coverage. Regressing on a single dimension still passes.
pub fn quality_gate(parent: &Taxon, child: &Taxon) -> Outcome {
    let (p, c) = (parent.best(), child.best());
    let q = QualityPair {
        child_identity: c.identity,
        parent_identity: p.identity,
        child_coverage: c.coverage,
        parent_coverage: p.coverage,
    };
    if c.identity > p.identity && c.coverage > p.coverage {
        Outcome::QualityNotMet(q)
    } else {
        Outcome::QualityMet(q)
    }
}

/// Sample tallies from the co-occurrence comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoOccurrence {
    /// samples where the child is not explained by the parent
    pub missing: usize,
    /// parent-positive samples plus the missing ones
    pub considered: usize,
    /// samples left after exclusions
    pub retained: usize,
}

impl CoOccurrence {
    /// `1 - missing / considered`; 1.0 when nothing was considered.
    pub fn local_ratio(&self) -> f64 {
        ratio(self.missing, self.considered)
    }

    /// `1 - missing / retained`; 1.0 when no sample was retained.
    pub fn global_ratio(&self) -> f64 {
        ratio(self.missing, self.retained)
    }

    pub fn passes(&self, policy: RatioPolicy, cutoff: f64) -> bool {
        match policy {
            RatioPolicy::Count => self.missing as f64 <= cutoff,
            RatioPolicy::Global => self.global_ratio() >= cutoff,
            RatioPolicy::Local => self.local_ratio() >= cutoff,
        }
    }
}

fn ratio(missing: usize, over: usize) -> f64 {
    if over == 0 {
        1.0
    } else {
        1.0 - missing as f64 / over as f64
    }
}

/// Tally how well the parent's occurrence pattern explains the child's over
/// the retained samples.
///
/// - presence-absence: missing = child >= threshold while parent < threshold.
/// - abundance: values under the threshold count as 0; missing = child > parent.
pub fn co_occurrence(
    parent: &[u64],
    child: &[u64],
    mask: &SampleMask,
    mode: OccurrenceMode,
    threshold: u64,
) -> CoOccurrence {
    let floor = |v: u64| if v < threshold { 0 } else { v };
    let mut stats = CoOccurrence::default();
    for (s, (&pv, &cv)) in parent.iter().zip(child).enumerate() {
        if !mask.keeps(s) {
            continue;
        }
        stats.retained += 1;
        match mode {
            OccurrenceMode::PresenceAbsence => {
                let parent_hit = pv >= threshold;
                let child_hit = cv >= threshold;
                if parent_hit {
                    stats.considered += 1;
                } else if child_hit {
                    stats.missing += 1;
                    stats.considered += 1;
                }
            }
            OccurrenceMode::Abundance => {
                let (pv, cv) = (floor(pv), floor(cv));
                if pv < cv {
                    stats.missing += 1;
                }
                if pv > 0 || cv > 0 {
                    stats.considered += 1;
                }
            }
        }
    }
    stats
}

pub fn co_occurrence_outcome(stats: CoOccurrence, policy: RatioPolicy, cutoff: f64) -> Outcome {
    if stats.passes(policy, cutoff) {
        Outcome::CoOccurrenceMet { stats, policy, cutoff }
    } else {
        Outcome::CoOccurrenceNotMet { stats, policy, cutoff }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Assignment;

    fn taxon(id: &str, hits: Vec<Assignment>) -> Taxon {
        Taxon { id: id.into(), sequence: Vec::new(), counts: Vec::new(), assignments: hits, total: 0 }
    }

    #[test]
    fn overlap_reports_first_shared_parent_label() {
        let p = taxon("p", vec![Assignment::new("X", 99.0, 100.0), Assignment::new("Y", 98.0, 100.0)]);
        let c = taxon("c", vec![Assignment::new("Y", 97.0, 100.0), Assignment::new("X", 96.0, 100.0)]);
        assert_eq!(taxonomy_overlap(&p, &c), Outcome::TaxonomyMatch { shared: "X".into() });

        let other = taxon("o", vec![Assignment::new("Z", 99.0, 100.0)]);
        assert_eq!(
            taxonomy_overlap(&p, &other),
            Outcome::TaxonomyMismatch { child: "Z".into(), parent: "X".into() }
        );
    }

    #[test]
    fn quality_gate_needs_both_dimensions_to_fail() {
        let p = taxon("p", vec![Assignment::new("X", 98.0, 95.0)]);
        let better_both = taxon("c", vec![Assignment::new("X", 99.0, 96.0)]);
        let better_identity_only = taxon("c", vec![Assignment::new("X", 99.0, 90.0)]);
        let better_coverage_only = taxon("c", vec![Assignment::new("X", 90.0, 100.0)]);
        let equal = taxon("c", vec![Assignment::new("X", 98.0, 95.0)]);

        assert!(!quality_gate(&p, &better_both).passed());
        // asymmetric on purpose: a single better dimension does not abort
        assert!(quality_gate(&p, &better_identity_only).passed());
        assert!(quality_gate(&p, &better_coverage_only).passed());
        assert!(quality_gate(&p, &equal).passed());
    }

    #[test]
    fn presence_absence_counts_unexplained_detections() {
        let mask = SampleMask::all(5);
        let parent = [10, 10, 0, 0, 3];
        let child = [1, 0, 2, 0, 0];
        let s = co_occurrence(&parent, &child, &mask, OccurrenceMode::PresenceAbsence, 1);
        assert_eq!(s, CoOccurrence { missing: 1, considered: 4, retained: 5 });
        assert!((s.local_ratio() - 0.75).abs() < 1e-12);
        assert!((s.global_ratio() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn detection_threshold_applies_to_both() {
        let mask = SampleMask::all(3);
        // parent 2 is below a threshold of 3, child 4 is above
        let s = co_occurrence(&[2, 5, 0], &[4, 1, 0], &mask, OccurrenceMode::PresenceAbsence, 3);
        assert_eq!(s.missing, 1);
        assert_eq!(s.considered, 2);
    }

    #[test]
    fn abundance_mode_compares_floored_values() {
        let mask = SampleMask::all(4);
        let parent = [10, 2, 0, 5];
        let child = [20, 1, 0, 5];
        // s0: 10 < 20 missing; s1: parent floored to 0, child floored to 0; s3 equal
        let s = co_occurrence(&parent, &child, &mask, OccurrenceMode::Abundance, 3);
        assert_eq!(s, CoOccurrence { missing: 1, considered: 2, retained: 4 });
    }

    #[test]
    fn excluded_samples_are_ignored() {
        let samples: Vec<String> = ["s1", "neg1"].iter().map(|s| s.to_string()).collect();
        let mask = SampleMask::new(&samples, &["neg*".to_string()]);
        let s = co_occurrence(&[5, 0], &[1, 9], &mask, OccurrenceMode::PresenceAbsence, 1);
        assert_eq!(s, CoOccurrence { missing: 0, considered: 1, retained: 1 });
    }

    #[test]
    fn policies() {
        let s = CoOccurrence { missing: 1, considered: 4, retained: 10 };
        assert!(s.passes(RatioPolicy::Count, 1.0));
        assert!(!s.passes(RatioPolicy::Count, 0.0));
        assert!(s.passes(RatioPolicy::Global, 0.9));
        assert!(!s.passes(RatioPolicy::Local, 0.9));
        assert!(s.passes(RatioPolicy::Local, 0.75));
        assert_eq!(CoOccurrence::default().local_ratio(), 1.0);
    }
}
