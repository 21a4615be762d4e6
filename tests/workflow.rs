//! End-to-end runs over on-disk fixtures: library workflow and the binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use artefact_rs::config::{Method, Params};
use artefact_rs::error::{AlignmentIssue, ConfigError};
use artefact_rs::io::{TaxonomyDialect, TaxonomySource};
use artefact_rs::pipeline::SilentReporter;
use artefact_rs::workflow::{self, RunConfig, RunPaths};
use tempfile::TempDir;

const Z1: &str = "GATTACAGATTACACCGGTTAAGGCCTTAGCATCGATCGGCTAGCTAGGA";
// Z1 with one substitution at position 10
const Z2: &str = "GATTACAGATAACACCGGTTAAGGCCTTAGCATCGATCGGCTAGCTAGGA";
const Z3: &str = "CCCCGGGGAAAATTTTCCCCGGGGAAAATTTTCCCCGGGGAAAATTTTCC";

fn write_fixtures(dir: &Path) {
    fs::write(
        dir.join("freq.tsv"),
        "#ID\tlake1\tlake2\tneg1\n\
         zotu2\t20\t10\t0\n\
         zotu1\t40\t30\t0\n\
         zotu3\t0\t25\t2\n",
    )
    .unwrap();
    fs::write(dir.join("seqs.fasta"), format!(">zotu1\n{}\n>zotu2\n{}\n>zotu3\n{}\n", Z1, Z2, Z3)).unwrap();
    fs::write(
        dir.join("blast.tsv"),
        "zotu1\tSalmo_trutta\tx\t100.0\tx\t100\n\
         zotu2\tSalmo_trutta\tx\t98.0\tx\t100\n\
         zotu3\tPerca_fluviatilis\tx\t99.0\tx\t100\n",
    )
    .unwrap();
}

fn full_paths(dir: &Path) -> RunPaths {
    RunPaths {
        frequency_input: Some(dir.join("freq.tsv")),
        sequence_input: Some(dir.join("seqs.fasta")),
        taxonomy_inputs: vec![TaxonomySource { dialect: TaxonomyDialect::Blast, path: dir.join("blast.tsv") }],
        frequency_output: Some(dir.join("out.tsv")),
        sequence_output: Some(dir.join("out.fasta")),
        taxonomy_output: Some(dir.join("out.blast.tsv")),
        detailed_log: Some(dir.join("detailed.log")),
        condensed_log: Some(dir.join("condensed.log")),
        ..RunPaths::default()
    }
}

fn config(dir: &Path) -> RunConfig {
    RunConfig {
        params: Params { exclude: vec!["neg*".to_string()], ..Params::default() },
        paths: full_paths(dir),
        command: "artefact-rs merge (test)".to_string(),
        ..RunConfig::default()
    }
}

#[test]
fn merge_writes_every_output() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write_fixtures(dir);

    let report = workflow::run(&config(dir), &mut SilentReporter).unwrap();
    assert_eq!(report.summary.total_taxa, 3);
    assert_eq!(report.summary.merged, 1);
    assert_eq!(report.excluded_samples, vec!["neg1".to_string()]);

    let freq = fs::read_to_string(dir.join("out.tsv")).unwrap();
    assert_eq!(freq, "ID\tlake1\tlake2\tneg1\nzotu1\t60\t40\t0\nzotu3\t0\t25\t2\n");

    let fasta = fs::read_to_string(dir.join("out.fasta")).unwrap();
    assert_eq!(fasta, format!(">zotu1\n{}\n>zotu3\n{}\n", Z1, Z3));

    let tax = fs::read_to_string(dir.join("out.blast.tsv")).unwrap();
    assert_eq!(tax.lines().count(), 2);
    assert!(!tax.contains("zotu2"));

    let detailed = fs::read_to_string(dir.join("detailed.log")).unwrap();
    assert!(detailed.contains("#### SUMMARY ####"));
    assert!(detailed.contains("--sample exclusion list: neg1"));
    assert!(detailed.contains("--parent zotu1: zotu2"));
    assert!(detailed.contains("### analysing: zotu2 ###"));
    assert!(detailed.contains("non-matching tax IDs"));

    let condensed = fs::read_to_string(dir.join("condensed.log")).unwrap();
    assert!(condensed.contains("#### CONDENSED ANALYSIS ####"));
    assert!(condensed.contains("parent identified!:\tzotu1"));
}

#[test]
fn missing_parameters_abort_before_any_output() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write_fixtures(dir);

    let mut cfg = config(dir);
    cfg.paths.sequence_output = None;
    let err = workflow::run(&cfg, &mut SilentReporter).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ConfigError>(),
        Some(&ConfigError::MissingParameters(vec!["sequence-output"]))
    );
    assert!(!dir.join("out.tsv").exists());
    assert!(!dir.join("detailed.log").exists());
}

#[test]
fn malformed_input_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write_fixtures(dir);
    fs::write(dir.join("freq.tsv"), "#ID\tlake1\nzotu1\tmany\n").unwrap();

    assert!(workflow::run(&config(dir), &mut SilentReporter).is_err());
    assert!(!dir.join("out.tsv").exists());
    assert!(!dir.join("out.fasta").exists());
}

#[test]
fn logs_are_optional() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write_fixtures(dir);

    let mut cfg = config(dir);
    cfg.paths.detailed_log = None;
    cfg.paths.condensed_log = None;
    workflow::run(&cfg, &mut SilentReporter).unwrap();
    assert!(dir.join("out.tsv").exists());
    assert!(!dir.join("detailed.log").exists());
}

#[test]
fn taxon_merge_runs_without_sequences() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write_fixtures(dir);

    let mut cfg = config(dir);
    cfg.params.method = Method::TaxonMerge;
    cfg.paths.sequence_input = None;
    cfg.paths.sequence_output = None;
    let report = workflow::run(&cfg, &mut SilentReporter).unwrap();
    assert_eq!(report.summary.merged, 1);
    assert!(!dir.join("out.fasta").exists());
}

#[test]
fn inconsistent_alignment_falls_back_to_pairwise() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write_fixtures(dir);
    // zotu3 missing, zotu2 row does not match its sequence
    fs::write(dir.join("aln.fasta"), format!(">zotu1\n{}\n>zotu2\n{}\n", Z1, Z1)).unwrap();

    let mut cfg = config(dir);
    cfg.paths.alignment_input = Some(dir.join("aln.fasta"));
    let report = workflow::run(&cfg, &mut SilentReporter).unwrap();
    assert!(report.alignment_issues.contains(&AlignmentIssue::MissingIds(vec!["zotu3".to_string()])));
    assert!(report
        .alignment_issues
        .contains(&AlignmentIssue::SequenceMismatch { id: "zotu2".to_string() }));
    assert_eq!(report.summary.merged, 1);

    let issues = workflow::verify_alignment(&dir.join("aln.fasta"), &dir.join("seqs.fasta")).unwrap();
    assert_eq!(issues, report.alignment_issues);
}

#[test]
fn unsupported_dialect_is_a_config_error() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write_fixtures(dir);

    let mut cfg = config(dir);
    cfg.paths.taxonomy_inputs = vec![TaxonomySource { dialect: TaxonomyDialect::Bold, path: dir.join("blast.tsv") }];
    let err = workflow::run(&cfg, &mut SilentReporter).unwrap_err();
    assert_eq!(err.downcast_ref::<ConfigError>(), Some(&ConfigError::UnsupportedDialect("BOLD")));
    assert!(!dir.join("out.tsv").exists());
}

#[test]
fn unsupported_dialect_is_reported_before_inputs_are_opened() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();

    let mut cfg = config(dir);
    cfg.paths.frequency_input = Some(dir.join("does-not-exist.tsv"));
    cfg.paths.taxonomy_inputs = vec![TaxonomySource { dialect: TaxonomyDialect::Bold, path: dir.join("bold.tsv") }];
    let err = workflow::run(&cfg, &mut SilentReporter).unwrap_err();
    assert_eq!(err.downcast_ref::<ConfigError>(), Some(&ConfigError::UnsupportedDialect("BOLD")));
}

fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_artefact-rs"))
}

#[test]
fn cli_merge_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write_fixtures(dir);

    let output = Command::new(binary())
        .current_dir(dir)
        .args([
            "merge",
            "--frequency-input",
            "freq.tsv",
            "--sequence-input",
            "seqs.fasta",
            "--blast-input",
            "blast.tsv",
            "--frequency-output",
            "out.tsv",
            "--sequence-output",
            "out.fasta",
            "--taxonomy-output",
            "out.blast.tsv",
            "--condensed-log",
            "condensed.log",
            "--negative",
            "neg*",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Total # of Artefacts | 1 (33.33%)"));
    assert!(dir.join("out.tsv").exists());
    assert!(dir.join("condensed.log").exists());
}

#[test]
fn cli_rejects_unknown_mode_and_missing_parameters() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write_fixtures(dir);

    let bad_mode = Command::new(binary())
        .current_dir(dir)
        .args(["merge", "--frequency-input", "freq.tsv", "--occurrence-type", "presence"])
        .output()
        .unwrap();
    assert!(!bad_mode.status.success());
    assert!(String::from_utf8_lossy(&bad_mode.stderr).contains("occurrence-type"));

    let missing = Command::new(binary())
        .current_dir(dir)
        .args(["merge", "--frequency-input", "freq.tsv", "--frequency-output", "out.tsv"])
        .output()
        .unwrap();
    assert!(!missing.status.success());
    assert!(String::from_utf8_lossy(&missing.stderr).contains("--sequence-input"));
    assert!(!dir.join("out.tsv").exists());
}
