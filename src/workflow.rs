//! End-to-end run: validate parameters, load the tables, scan, then write
//! every output. Nothing is written unless the scan finished.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::align::PrecomputedAlignment;
use crate::audit::{RunHeader, Summary};
use crate::config::{Method, Params};
use crate::error::{AlignmentIssue, ConfigError};
use crate::io::{self, BlastColumns, Layout, TaxonomySource};
use crate::pipeline::{DecisionPipeline, Reporter};
use crate::table::{RankBy, SequenceStore, TaxonSet};

const TAXONOMY_INPUT: &str = "{blast,bold,sintax,idtaxa}-input";

/// Every path a run may touch. Which ones are required depends on the method.
#[derive(Debug, Clone, Default)]
pub struct RunPaths {
    pub frequency_input: Option<PathBuf>,
    pub sequence_input: Option<PathBuf>,
    /// at most one entry is accepted
    pub taxonomy_inputs: Vec<TaxonomySource>,
    pub alignment_input: Option<PathBuf>,
    pub frequency_output: Option<PathBuf>,
    pub sequence_output: Option<PathBuf>,
    pub taxonomy_output: Option<PathBuf>,
    pub detailed_log: Option<PathBuf>,
    pub condensed_log: Option<PathBuf>,
}

impl RunPaths {
    /// Reject conflicting or unsupported taxonomy inputs and report every
    /// parameter the method needs but did not get, in one error. Nothing is
    /// opened here.
    pub fn check(&self, method: Method) -> Result<(), ConfigError> {
        if let [first, second, ..] = self.taxonomy_inputs.as_slice() {
            return Err(ConfigError::ConflictingParameters {
                first: first.dialect.input_flag(),
                second: second.dialect.input_flag(),
            });
        }
        if let Some(src) = self.taxonomy_inputs.first() {
            src.dialect.ensure_supported()?;
        }

        let mut missing = Vec::new();
        let mut need = |present: bool, name: &'static str| {
            if !present {
                missing.push(name);
            }
        };
        need(self.frequency_input.is_some(), "frequency-input");
        if method.needs_sequences() {
            need(self.sequence_input.is_some(), "sequence-input");
        }
        if method.needs_taxonomy() {
            need(!self.taxonomy_inputs.is_empty(), TAXONOMY_INPUT);
        }
        need(self.frequency_output.is_some(), "frequency-output");
        if method.needs_sequences() {
            need(self.sequence_output.is_some(), "sequence-output");
        }
        if method == Method::TaxonMerge {
            need(self.taxonomy_output.is_some(), "taxonomy-output");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingParameters(missing))
        }
    }

    fn taxonomy_input(&self) -> Option<&TaxonomySource> {
        self.taxonomy_inputs.first()
    }
}

/// A complete run description, as built by the command line.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    pub params: Params,
    pub paths: RunPaths,
    pub layout: Layout,
    pub rank_by: RankBy,
    pub blast_columns: BlastColumns,
    /// echoed into the log headers
    pub command: String,
}

/// What the caller gets back after a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: Summary,
    pub pairs_evaluated: u64,
    pub excluded_samples: Vec<String>,
    /// non-empty when a precomputed alignment was rejected
    pub alignment_issues: Vec<AlignmentIssue>,
}

pub fn run(config: &RunConfig, reporter: &mut dyn Reporter) -> Result<RunReport> {
    let params = &config.params;
    let paths = &config.paths;
    params.validate()?;
    paths.check(params.method)?;

    // check() guarantees the frequency input is present
    let freq_path = paths.frequency_input.as_deref().ok_or(ConfigError::MissingParameters(vec!["frequency-input"]))?;
    let matrix = io::read_frequency_table(freq_path, config.layout, config.rank_by)?;
    let sequences = paths.sequence_input.as_deref().map(io::read_sequences).transpose()?;
    let taxonomy = paths
        .taxonomy_input()
        .map(|src| io::read_taxonomy(src, config.blast_columns))
        .transpose()?;

    let (alignment, alignment_issues) = match (&paths.alignment_input, &sequences) {
        (Some(path), Some(seqs)) if params.method.needs_sequences() => load_alignment(path, seqs, params.force_realign)?,
        (Some(path), _) => {
            warn!("ignoring alignment '{}': no sequence comparison in this run", path.display());
            (None, Vec::new())
        }
        (None, _) => (None, Vec::new()),
    };

    let set = TaxonSet::assemble(&matrix, sequences.as_ref(), taxonomy.as_ref())?;
    let logging = paths.detailed_log.is_some() || paths.condensed_log.is_some();
    let mut pipeline = DecisionPipeline::new(&set, params).recording(logging);
    if let Some(aln) = alignment.as_ref() {
        pipeline = pipeline.with_alignment(aln);
    }
    let excluded_samples = pipeline.excluded_samples();
    if !params.exclude.is_empty() && excluded_samples.is_empty() {
        warn!("no sample matched the exclusion list {:?}", params.exclude);
    }
    let outcome = pipeline.run(reporter);
    let summary = outcome.summary(&set);

    // outputs
    let rows = outcome.surviving_rows(&set);
    if let Some(out) = &paths.frequency_output {
        write_to(out, |w| io::write_frequency_table(w, &set.samples, &rows))?;
    }
    let survivors: Vec<usize> = outcome.resolver.survivors(&set.taxa).map(|(i, _)| i).collect();
    match (&paths.sequence_output, &sequences) {
        (Some(out), Some(_)) => write_to(out, |w| {
            io::write_fasta(w, survivors.iter().map(|&i| (set.taxa[i].id.as_str(), set.taxa[i].sequence.as_slice())))
        })?,
        (Some(out), None) => warn!("no sequence input, '{}' not written", out.display()),
        (None, _) => {}
    }
    match (&paths.taxonomy_output, &taxonomy) {
        (Some(out), Some(table)) => write_to(out, |w| {
            io::write_taxonomy_records(w, table, survivors.iter().map(|&i| set.taxa[i].id.as_str()))
        })?,
        (Some(out), None) => warn!("no taxonomy input, '{}' not written", out.display()),
        (None, _) => {}
    }

    if logging {
        let header = RunHeader::new(params, excluded_samples.clone(), config.command.clone());
        if let Some(out) = &paths.detailed_log {
            write_to(out, |w| outcome.audit.write_detailed(w, &header, &summary, &set.taxa))?;
        }
        if let Some(out) = &paths.condensed_log {
            write_to(out, |w| outcome.audit.write_condensed(w, &header, &summary, &set.taxa))?;
        }
    }

    Ok(RunReport {
        summary,
        pairs_evaluated: outcome.pairs_evaluated,
        excluded_samples,
        alignment_issues,
    })
}

fn load_alignment(
    path: &Path,
    sequences: &SequenceStore,
    force_realign: bool,
) -> Result<(Option<PrecomputedAlignment>, Vec<AlignmentIssue>)> {
    if force_realign {
        info!("realignment forced, '{}' not read", path.display());
        return Ok((None, Vec::new()));
    }
    let aln = io::read_alignment(path)?;
    let issues = aln.verify(sequences);
    if issues.is_empty() {
        info!("{}: {} aligned rows verified", path.display(), aln.len());
        return Ok((Some(aln), issues));
    }
    for issue in &issues {
        warn!("{}: {}", path.display(), issue);
    }
    warn!("falling back to pairwise alignment for every pair");
    Ok((None, issues))
}

/// Check a precomputed alignment against its sequences without running a scan.
pub fn verify_alignment(alignment: &Path, sequences: &Path) -> Result<Vec<AlignmentIssue>> {
    let aln = io::read_alignment(alignment)?;
    let seqs = io::read_sequences(sequences)?;
    Ok(aln.verify(&seqs))
}

fn write_to<F>(path: &Path, body: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let fh = File::create(path).with_context(|| format!("cannot create '{}'", path.display()))?;
    let mut w = BufWriter::new(fh);
    body(&mut w).with_context(|| format!("failed writing '{}'", path.display()))
}
