//! Structured record of every stage outcome, rendered as a detailed log
//! (every outcome, per child and parent) and a condensed log (passed
//! milestones only, per child).

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};

use chrono::{DateTime, Local};

use crate::config::{OccurrenceMode, Params, RatioPolicy};
use crate::pipeline::stages::CoOccurrence;
use crate::table::Taxon;

/// Quality metrics of the best assignment for child and parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityPair {
    pub child_identity: f64,
    pub parent_identity: f64,
    pub child_coverage: f64,
    pub parent_coverage: f64,
}

/// Result of one pipeline stage, with the evidence it was decided on.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    TaxonomyMatch { shared: String },
    TaxonomyMismatch { child: String, parent: String },
    QualityMet(QualityPair),
    QualityNotMet(QualityPair),
    CoOccurrenceMet { stats: CoOccurrence, policy: RatioPolicy, cutoff: f64 },
    CoOccurrenceNotMet { stats: CoOccurrence, policy: RatioPolicy, cutoff: f64 },
    SimilarityMet { identity: f64 },
    SimilarityNotMet { identity: f64 },
    ParentIdentified,
    /// child attached to the root of its parent's group
    GrandparentIdentified { root: usize },
}

impl Outcome {
    /// Name of the milestone for the condensed view; `None` for failures.
    pub fn milestone(&self) -> Option<&'static str> {
        match self {
            Outcome::TaxonomyMatch { .. } => Some("matching tax IDs"),
            Outcome::QualityMet(_) => Some("quality threshold met"),
            Outcome::CoOccurrenceMet { .. } => Some("co-occurrence rate met"),
            Outcome::SimilarityMet { .. } => Some("sequence similarity threshold met"),
            Outcome::ParentIdentified => Some("parent identified!"),
            Outcome::GrandparentIdentified { .. } => Some("grandparent identified!"),
            _ => None,
        }
    }

    pub fn passed(&self) -> bool {
        self.milestone().is_some()
    }

    /// Evidence text for the detailed view.
    pub fn describe(&self, taxa: &[Taxon]) -> String {
        match self {
            Outcome::TaxonomyMatch { shared } => format!("matching tax IDs ({})", shared),
            Outcome::TaxonomyMismatch { child, parent } => format!("non-matching tax IDs ({}; {})", child, parent),
            Outcome::QualityMet(q) => format!("quality threshold met ({})", q),
            Outcome::QualityNotMet(q) => format!("quality threshold not met ({})", q),
            Outcome::CoOccurrenceMet { stats, policy, cutoff } => {
                format!("co-occurrence {} met ({})", policy_noun(*policy), evidence(stats, *policy, *cutoff))
            }
            Outcome::CoOccurrenceNotMet { stats, policy, cutoff } => {
                format!("co-occurrence {} not met ({})", policy_noun(*policy), evidence(stats, *policy, *cutoff))
            }
            Outcome::SimilarityMet { identity } => format!("sequence similarity threshold met ({:.2}%)", identity),
            Outcome::SimilarityNotMet { identity } => format!("sequence similarity threshold not met ({:.2}%)", identity),
            Outcome::ParentIdentified => "parent identified!".to_string(),
            Outcome::GrandparentIdentified { root } => format!("grandparent identified ({})!", taxa[*root].id),
        }
    }
}

impl fmt::Display for QualityPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}; {}, {}",
            self.child_identity, self.parent_identity, self.child_coverage, self.parent_coverage
        )
    }
}

fn policy_noun(policy: RatioPolicy) -> &'static str {
    match policy {
        RatioPolicy::Count => "count",
        RatioPolicy::Global | RatioPolicy::Local => "ratio",
    }
}

fn evidence(stats: &CoOccurrence, policy: RatioPolicy, cutoff: f64) -> String {
    match policy {
        RatioPolicy::Count => format!("{} missing, COUNT <= {}", stats.missing, cutoff),
        RatioPolicy::Global => format!("{:.2}, GLOBAL >= {}", stats.global_ratio(), cutoff),
        RatioPolicy::Local => format!("{:.2}, LOCAL >= {}", stats.local_ratio(), cutoff),
    }
}

/// All outcomes for one evaluated (parent, child) pair, by rank index.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionRecord {
    pub child: usize,
    pub parent: usize,
    pub outcomes: Vec<Outcome>,
}

impl DecisionRecord {
    pub fn new(parent: usize, child: usize) -> Self {
        Self { child, parent, outcomes: Vec::new() }
    }
}

/// Collected decision records. A disabled log drops everything it is given,
/// so runs without log files keep no per-pair state.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    enabled: bool,
    records: Vec<DecisionRecord>,
}

impl AuditLog {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, records: Vec::new() }
    }

    pub fn push(&mut self, record: DecisionRecord) {
        if self.enabled {
            self.records.push(record);
        }
    }

    pub fn records(&self) -> &[DecisionRecord] {
        &self.records
    }

    /// child -> parent -> outcomes, children in rank order, parents in scan order.
    pub fn detailed(&self) -> BTreeMap<usize, Vec<&DecisionRecord>> {
        let mut by_child: BTreeMap<usize, Vec<&DecisionRecord>> = BTreeMap::new();
        for r in &self.records {
            by_child.entry(r.child).or_default().push(r);
        }
        by_child
    }

    /// child -> (milestone, responsible taxa) in first-seen order. A
    /// grandparent milestone credits the root, every other one the parent.
    pub fn condensed(&self) -> BTreeMap<usize, Vec<(&'static str, Vec<usize>)>> {
        let mut by_child: BTreeMap<usize, Vec<(&'static str, Vec<usize>)>> = BTreeMap::new();
        for r in &self.records {
            for outcome in &r.outcomes {
                let Some(name) = outcome.milestone() else { continue };
                let who = match outcome {
                    Outcome::GrandparentIdentified { root } => *root,
                    _ => r.parent,
                };
                let milestones = by_child.entry(r.child).or_default();
                match milestones.iter_mut().find(|(m, _)| *m == name) {
                    Some((_, list)) => list.push(who),
                    None => milestones.push((name, vec![who])),
                }
            }
        }
        by_child
    }

    pub fn write_detailed<W: Write>(&self, mut w: W, header: &RunHeader, summary: &Summary, taxa: &[Taxon]) -> io::Result<()> {
        header.write(&mut w, summary)?;
        writeln!(w, "###########################\n#### DETAILED ANALYSIS ####\n###########################\n")?;
        for (child, records) in self.detailed() {
            writeln!(w, "### analysing: {} ###", taxa[child].id)?;
            for r in records {
                let line: Vec<String> = r.outcomes.iter().map(|o| o.describe(taxa)).collect();
                writeln!(w, "{}:\t{}", taxa[r.parent].id, line.join("\t"))?;
            }
            writeln!(w)?;
        }
        w.flush()
    }

    pub fn write_condensed<W: Write>(&self, mut w: W, header: &RunHeader, summary: &Summary, taxa: &[Taxon]) -> io::Result<()> {
        header.write(&mut w, summary)?;
        writeln!(w, "############################\n#### CONDENSED ANALYSIS ####\n############################\n")?;
        for (child, milestones) in self.condensed() {
            writeln!(w, "### analysing: {} ###", taxa[child].id)?;
            for (name, who) in milestones {
                let ids: Vec<&str> = who.iter().map(|&i| taxa[i].id.as_str()).collect();
                writeln!(w, "{}:\t{}", name, ids.join(", "))?;
            }
            writeln!(w)?;
        }
        w.flush()
    }
}

/// Final tally: how many taxa were merged away and into which roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub total_taxa: usize,
    pub merged: usize,
    /// root id -> child ids, roots in rank order, children in merge order
    pub groups: Vec<(String, Vec<String>)>,
}

impl Summary {
    pub fn percent(&self) -> f64 {
        if self.total_taxa == 0 {
            0.0
        } else {
            self.merged as f64 / self.total_taxa as f64 * 100.0
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "|  Summary Statistics |")?;
        writeln!(f, "|     Total # of ASVs | {}", self.total_taxa)?;
        writeln!(f, "|Total # of Artefacts | {} ({:.2}%)", self.merged, self.percent())?;
        writeln!(f, "|   Parent-Child List |")?;
        for (root, children) in &self.groups {
            let label = if children.len() == 1 { "child:   " } else { "children:" };
            writeln!(f, "|    parent: {:>8} | {}  {}", root, label, children.join(", "))?;
        }
        Ok(())
    }
}

/// Summary block shared by both log files.
#[derive(Debug, Clone)]
pub struct RunHeader {
    pub started: DateTime<Local>,
    pub method: String,
    pub occurrence: OccurrenceMode,
    pub detection_threshold: u64,
    pub similarity: f64,
    pub ratio_policy: RatioPolicy,
    pub ratio_cutoff: f64,
    pub excluded_samples: Vec<String>,
    pub command: String,
}

impl RunHeader {
    pub fn new(params: &Params, excluded_samples: Vec<String>, command: String) -> Self {
        Self {
            started: Local::now(),
            method: params.method.to_string(),
            occurrence: params.occurrence,
            detection_threshold: params.detection_threshold,
            similarity: params.similarity,
            ratio_policy: params.ratio_policy,
            ratio_cutoff: params.ratio_cutoff,
            excluded_samples,
            command,
        }
    }

    fn write<W: Write>(&self, w: &mut W, summary: &Summary) -> io::Result<()> {
        writeln!(w, "#################\n#### SUMMARY ####\n#################\n")?;
        writeln!(w, "date-time: {}\n", self.started.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(w, "parameters:")?;
        writeln!(w, "--method: {}", self.method)?;
        writeln!(w, "--occurrence type: {}", self.occurrence)?;
        writeln!(w, "--detection threshold: {}", self.detection_threshold)?;
        writeln!(w, "--similarity threshold: {}", self.similarity)?;
        writeln!(w, "--co-occurrence ratio: {} ({})", self.ratio_cutoff, self.ratio_policy)?;
        writeln!(w, "--sample exclusion list: {}\n", self.excluded_samples.join(", "))?;
        writeln!(w, "results:")?;
        writeln!(w, "--total seqs: {}", summary.total_taxa)?;
        writeln!(w, "--total artefacts: {} ({:.2}%)", summary.merged, summary.percent())?;
        for (root, children) in &summary.groups {
            writeln!(w, "--parent {}: {}", root, children.join(", "))?;
        }
        writeln!(w, "\ncode: {}\n\n", self.command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Assignment;

    fn taxa(ids: &[&str]) -> Vec<Taxon> {
        ids.iter()
            .map(|id| Taxon {
                id: id.to_string(),
                sequence: Vec::new(),
                counts: vec![1],
                assignments: vec![Assignment::unassigned()],
                total: 1,
            })
            .collect()
    }

    fn sample_log() -> AuditLog {
        let mut log = AuditLog::new(true);
        log.push(DecisionRecord {
            parent: 0,
            child: 1,
            outcomes: vec![Outcome::TaxonomyMatch { shared: "X".into() }, Outcome::ParentIdentified],
        });
        log.push(DecisionRecord {
            parent: 0,
            child: 2,
            outcomes: vec![Outcome::TaxonomyMismatch { child: "Y".into(), parent: "X".into() }],
        });
        log.push(DecisionRecord {
            parent: 1,
            child: 2,
            outcomes: vec![Outcome::TaxonomyMatch { shared: "X".into() }, Outcome::GrandparentIdentified { root: 0 }],
        });
        log
    }

    #[test]
    fn disabled_log_keeps_nothing() {
        let mut log = AuditLog::new(false);
        log.push(DecisionRecord::new(0, 1));
        assert!(log.records().is_empty());
    }

    #[test]
    fn condensed_keeps_only_milestones() {
        let c = sample_log().condensed();
        assert_eq!(c[&1], vec![("matching tax IDs", vec![0]), ("parent identified!", vec![0])]);
        // the mismatch against parent 0 leaves no milestone; the grandparent credits root 0
        assert_eq!(c[&2], vec![("matching tax IDs", vec![1]), ("grandparent identified!", vec![0])]);
    }

    #[test]
    fn detailed_text_has_every_outcome() {
        let t = taxa(&["A", "B", "C"]);
        let summary = Summary { total_taxa: 3, merged: 2, groups: vec![("A".into(), vec!["B".into(), "C".into()])] };
        let header = RunHeader::new(&Params::default(), vec!["neg".into()], "merge".into());
        let mut out = Vec::new();
        sample_log().write_detailed(&mut out, &header, &summary, &t).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("--total artefacts: 2 (66.67%)"));
        assert!(text.contains("--parent A: B, C"));
        assert!(text.contains("--sample exclusion list: neg"));
        assert!(text.contains("### analysing: C ###\nA:\tnon-matching tax IDs (Y; X)\nB:\tmatching tax IDs (X)\tgrandparent identified (A)!\n"));
    }

    #[test]
    fn summary_console_table() {
        let summary = Summary { total_taxa: 4, merged: 1, groups: vec![("Zotu1".into(), vec!["Zotu3".into()])] };
        let text = summary.to_string();
        assert!(text.contains("|Total # of Artefacts | 1 (25.00%)"));
        assert!(text.contains("|    parent:    Zotu1 | child:     Zotu3"));
    }
}
