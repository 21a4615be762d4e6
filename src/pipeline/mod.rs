//! 成对判定流水线：按丰度降序扫描所有 (parent, child) 对，
//! 依次执行启用的阶段，遇到第一个失败即短路。
//!
//! 扫描顺序保证 child 只会与排名在其之前的 parent 比较；
//! 已被认领的 child 不再参与后续比较。

use log::{debug, info};

use crate::align::{percent_identity, Aligner, PrecomputedAlignment};
use crate::audit::{AuditLog, DecisionRecord, Outcome, Summary};
use crate::config::{Params, Stage};
use crate::table::{AbundanceRow, SampleMask, TaxonSet};

pub mod merge;
pub mod report;
pub mod stages;

pub use merge::{Attachment, MergeGroup, MergeResolver};
pub use report::{MergeEvent, Reporter, SilentReporter};

/// Everything the scan produced.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub resolver: MergeResolver,
    pub audit: AuditLog,
    pub pairs_evaluated: u64,
}

impl MergeOutcome {
    pub fn summary(&self, set: &TaxonSet) -> Summary {
        let groups = self
            .resolver
            .groups()
            .map(|g| {
                let children = g.members.iter().map(|&m| set.taxa[m].id.clone()).collect();
                (set.taxa[g.root].id.clone(), children)
            })
            .collect();
        Summary { total_taxa: set.len(), merged: self.resolver.merged_count(), groups }
    }

    /// Surviving roots in rank order with their summed counts.
    pub fn surviving_rows(&self, set: &TaxonSet) -> Vec<AbundanceRow> {
        self.resolver
            .survivors(&set.taxa)
            .map(|(i, counts)| AbundanceRow::new(set.taxa[i].id.clone(), counts.to_vec()))
            .collect()
    }
}

pub struct DecisionPipeline<'a> {
    set: &'a TaxonSet,
    params: &'a Params,
    mask: SampleMask,
    aligner: Aligner,
    alignment: Option<&'a PrecomputedAlignment>,
    record: bool,
}

impl<'a> DecisionPipeline<'a> {
    pub fn new(set: &'a TaxonSet, params: &'a Params) -> Self {
        Self {
            set,
            params,
            mask: SampleMask::new(&set.samples, &params.exclude),
            aligner: Aligner::new(params.align_mode, params.scoring),
            alignment: None,
            record: false,
        }
    }

    /// Use a precomputed alignment for pairs it covers, unless realignment is forced.
    pub fn with_alignment(mut self, alignment: &'a PrecomputedAlignment) -> Self {
        if !self.params.force_realign {
            self.alignment = Some(alignment);
        }
        self
    }

    /// Keep every decision record for the log files.
    pub fn recording(mut self, on: bool) -> Self {
        self.record = on;
        self
    }

    pub fn excluded_samples(&self) -> Vec<String> {
        self.mask.excluded(&self.set.samples).into_iter().map(str::to_string).collect()
    }

    pub fn run(&mut self, reporter: &mut dyn Reporter) -> MergeOutcome {
        let set = self.set;
        let n = set.len();
        let mut resolver = MergeResolver::new(n);
        let mut audit = AuditLog::new(self.record);
        let mut pairs_evaluated = 0u64;

        let total_pairs = (n as u64) * (n.saturating_sub(1) as u64) / 2;
        reporter.start(total_pairs);
        info!(
            "scanning {} taxa ({} pairs), stages {:?}, {} of {} samples retained",
            n,
            total_pairs,
            self.params.method.stages(),
            self.mask.retained(),
            set.samples.len()
        );

        for parent in 0..n {
            for child in (parent + 1)..n {
                if resolver.is_claimed(child) {
                    continue;
                }
                pairs_evaluated += 1;
                let mut record = DecisionRecord::new(parent, child);
                if self.evaluate(parent, child, &mut record.outcomes) {
                    let attachment = resolver.merge(&set.taxa, parent, child);
                    let root = attachment.root();
                    record.outcomes.push(match attachment {
                        Attachment::Parent(_) => Outcome::ParentIdentified,
                        Attachment::Grandparent(root) => Outcome::GrandparentIdentified { root },
                    });
                    debug!("{} merged into {} (via {})", set.taxa[child].id, set.taxa[root].id, set.taxa[parent].id);
                    reporter.merged(&MergeEvent {
                        parent: &set.taxa[parent].id,
                        child: &set.taxa[child].id,
                        root: &set.taxa[root].id,
                    });
                }
                audit.push(record);
            }
            reporter.advance((n - parent - 1) as u64);
        }
        reporter.finish();

        info!("{} pairs evaluated, {} taxa merged", pairs_evaluated, resolver.merged_count());
        MergeOutcome { resolver, audit, pairs_evaluated }
    }

    /// Run the enabled stages in order, stop at the first failure.
    fn evaluate(&mut self, parent: usize, child: usize, outcomes: &mut Vec<Outcome>) -> bool {
        let set = self.set;
        let (p, c) = (&set.taxa[parent], &set.taxa[child]);
        let params = self.params;

        for &stage in params.method.stages() {
            let outcome = match stage {
                Stage::Taxonomy => stages::taxonomy_overlap(p, c),
                Stage::Quality => stages::quality_gate(p, c),
                Stage::CoOccurrence => {
                    let stats = stages::co_occurrence(
                        &p.counts,
                        &c.counts,
                        &self.mask,
                        params.occurrence,
                        params.detection_threshold,
                    );
                    stages::co_occurrence_outcome(stats, params.ratio_policy, params.ratio_cutoff)
                }
                Stage::Similarity => {
                    let identity = self.identity(parent, child);
                    if identity > params.similarity {
                        Outcome::SimilarityMet { identity }
                    } else {
                        Outcome::SimilarityNotMet { identity }
                    }
                }
            };
            let passed = outcome.passed();
            outcomes.push(outcome);
            if !passed {
                return false;
            }
        }
        true
    }

    fn identity(&mut self, parent: usize, child: usize) -> f64 {
        let set = self.set;
        let (p, c) = (&set.taxa[parent], &set.taxa[child]);
        let aln = match self.alignment.and_then(|a| a.pair(&p.id, &c.id)) {
            Some(aln) => aln,
            None => self.aligner.align(&p.sequence, &c.sequence),
        };
        percent_identity(&aln, p.sequence.len(), c.sequence.len())
    }
}

/// Convenience wrapper: run the scan without a precomputed alignment or logs.
pub fn run(set: &TaxonSet, params: &Params) -> MergeOutcome {
    DecisionPipeline::new(set, params).run(&mut SilentReporter)
}
