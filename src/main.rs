use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};

use artefact_rs::align::{AlignMode, Scoring};
use artefact_rs::config::{Method, OccurrenceMode, Params, RatioPolicy};
use artefact_rs::io::{BlastColumns, Layout, TaxonomyDialect, TaxonomySource};
use artefact_rs::pipeline::{MergeEvent, Reporter};
use artefact_rs::table::RankBy;
use artefact_rs::workflow::{self, RunConfig, RunPaths};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(
    name = "artefact-rs",
    author,
    version,
    about = "Remove artefact sequences from metabarcoding abundance tables",
    arg_required_else_help = true
)]
struct Cli {
    /// Verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Identify artefacts and merge them into their parents
    Merge(MergeArgs),
    /// Check a precomputed alignment against the raw sequences
    VerifyAlignment {
        /// Aligned FASTA
        #[arg(long = "alignment-input")]
        alignment: PathBuf,
        /// Raw sequence FASTA
        #[arg(long = "sequence-input")]
        sequences: PathBuf,
    },
}

#[derive(Args, Debug)]
struct MergeArgs {
    /// taxon-dependent, taxon-independent or taxon-merge
    #[arg(long, default_value = "taxon-dependent")]
    method: Method,

    #[arg(long)]
    frequency_input: Option<PathBuf>,
    #[arg(long)]
    sequence_input: Option<PathBuf>,
    #[arg(long)]
    blast_input: Option<PathBuf>,
    #[arg(long)]
    bold_input: Option<PathBuf>,
    #[arg(long)]
    sintax_input: Option<PathBuf>,
    #[arg(long)]
    idtaxa_input: Option<PathBuf>,
    /// Precomputed alignment (aligned FASTA) of the sequence input
    #[arg(long)]
    alignment_input: Option<PathBuf>,

    #[arg(long)]
    frequency_output: Option<PathBuf>,
    #[arg(long)]
    sequence_output: Option<PathBuf>,
    #[arg(long)]
    taxonomy_output: Option<PathBuf>,
    #[arg(long)]
    detailed_log: Option<PathBuf>,
    #[arg(long)]
    condensed_log: Option<PathBuf>,

    /// presence-absence or abundance
    #[arg(long, default_value = "presence-absence")]
    occurrence_type: OccurrenceMode,
    /// Counts below this are treated as absent
    #[arg(long, default_value_t = 1)]
    detection_threshold: u64,
    /// Minimum percent identity (exclusive)
    #[arg(long, default_value_t = 90.0)]
    similarity: f64,
    /// count, global or local
    #[arg(long, default_value = "local")]
    ratio_policy: RatioPolicy,
    /// Co-occurrence cutoff: a ratio in [0, 1], or a sample count for the count policy
    #[arg(long, default_value_t = 1.0)]
    ratio: f64,
    /// Samples to ignore, '+'-separated; '*' marks a prefix, suffix or substring match
    #[arg(long)]
    negative: Option<String>,

    /// global (Needleman-Wunsch) or local (Smith-Waterman)
    #[arg(long, default_value = "global")]
    alignment: AlignMode,
    #[arg(long = "match")]
    match_score: Option<i32>,
    #[arg(long = "mismatch")]
    mismatch_penalty: Option<i32>,
    #[arg(long = "gap")]
    gap_penalty: Option<i32>,
    /// Ignore --alignment-input and align every pair
    #[arg(long)]
    force_realign: bool,

    #[arg(long, default_value_t = 0)]
    seqname_col: usize,
    #[arg(long, default_value_t = 1)]
    taxid_col: usize,
    #[arg(long, default_value_t = 3)]
    pident_col: usize,
    #[arg(long, default_value_t = 5)]
    qcov_col: usize,
    /// Order BLAST hits by this e-value column
    #[arg(long)]
    evalue_col: Option<usize>,

    /// Frequency table has samples as rows and taxa as columns
    #[arg(long)]
    taxa_are_columns: bool,
    /// total, mean or detections
    #[arg(long, default_value = "total")]
    sort: RankBy,

    #[arg(short = 't', long, default_value_t = 1)]
    threads: usize,
}

impl MergeArgs {
    fn into_config(self, command: String) -> RunConfig {
        let defaults = self.alignment.default_scoring();
        let scoring = Scoring {
            match_score: self.match_score.unwrap_or(defaults.match_score),
            mismatch_penalty: self.mismatch_penalty.unwrap_or(defaults.mismatch_penalty),
            gap_penalty: self.gap_penalty.unwrap_or(defaults.gap_penalty),
        };
        let exclude: Vec<String> = self
            .negative
            .map(|s| s.split('+').map(str::trim).filter(|p| !p.is_empty()).map(str::to_string).collect())
            .unwrap_or_default();

        let taxonomy_inputs: Vec<TaxonomySource> = [
            (TaxonomyDialect::Blast, self.blast_input),
            (TaxonomyDialect::Bold, self.bold_input),
            (TaxonomyDialect::Sintax, self.sintax_input),
            (TaxonomyDialect::Idtaxa, self.idtaxa_input),
        ]
        .into_iter()
        .filter_map(|(dialect, path)| path.map(|path| TaxonomySource { dialect, path }))
        .collect();

        RunConfig {
            params: Params {
                method: self.method,
                occurrence: self.occurrence_type,
                detection_threshold: self.detection_threshold,
                similarity: self.similarity,
                ratio_policy: self.ratio_policy,
                ratio_cutoff: self.ratio,
                exclude,
                align_mode: self.alignment,
                scoring,
                force_realign: self.force_realign,
            },
            paths: RunPaths {
                frequency_input: self.frequency_input,
                sequence_input: self.sequence_input,
                taxonomy_inputs,
                alignment_input: self.alignment_input,
                frequency_output: self.frequency_output,
                sequence_output: self.sequence_output,
                taxonomy_output: self.taxonomy_output,
                detailed_log: self.detailed_log,
                condensed_log: self.condensed_log,
            },
            layout: if self.taxa_are_columns { Layout::TaxaAsColumns } else { Layout::TaxaAsRows },
            rank_by: self.sort,
            blast_columns: BlastColumns {
                seqname: self.seqname_col,
                taxid: self.taxid_col,
                pident: self.pident_col,
                qcov: self.qcov_col,
                evalue: self.evalue_col,
            },
            command,
        }
    }
}

/// 终端进度条：按已访问的 (parent, child) 对数推进
struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    fn new() -> Result<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} pairs ({eta}) {msg}")?
                .progress_chars("#>-"),
        );
        Ok(Self { bar })
    }
}

impl Reporter for ProgressReporter {
    fn start(&mut self, total_pairs: u64) {
        self.bar.set_length(total_pairs);
    }

    fn advance(&mut self, pairs: u64) {
        self.bar.inc(pairs);
    }

    fn merged(&mut self, event: &MergeEvent<'_>) {
        self.bar.set_message(event.child.to_string());
    }

    fn finish(&mut self) {
        self.bar.finish_and_clear();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_default_env()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    match cli.command {
        Commands::Merge(args) => run_merge(args),
        Commands::VerifyAlignment { alignment, sequences } => run_verify(&alignment, &sequences),
    }
}

fn run_merge(args: MergeArgs) -> Result<()> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build_global()
        .map_err(|e| anyhow::anyhow!("cannot start thread pool: {}", e))?;
    debug!("rayon pool with {} threads", rayon::current_num_threads());

    let command = std::env::args().collect::<Vec<_>>().join(" ");
    let config = args.into_config(command);
    let mut reporter = ProgressReporter::new()?;
    let report = workflow::run(&config, &mut reporter)?;

    info!("{} pairs evaluated", report.pairs_evaluated);
    print!("{}", report.summary);
    Ok(())
}

fn run_verify(alignment: &std::path::Path, sequences: &std::path::Path) -> Result<()> {
    let issues = workflow::verify_alignment(alignment, sequences)?;
    if issues.is_empty() {
        println!("{}: consistent with {}", alignment.display(), sequences.display());
        return Ok(());
    }
    for issue in &issues {
        println!("{}", issue);
    }
    anyhow::bail!("{} issue(s) found in '{}'", issues.len(), alignment.display())
}
