use std::path::PathBuf;

use thiserror::Error;

/// Fatal configuration problems, reported before any file is read.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{}", missing_message(.0))]
    MissingParameters(Vec<&'static str>),

    #[error("--{first} and --{second} cannot be combined")]
    ConflictingParameters {
        first: &'static str,
        second: &'static str,
    },

    #[error("'--{param}' not specified as {expected} (got '{value}')")]
    UnknownValue {
        param: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("'--{param}' {reason}")]
    InvalidValue {
        param: &'static str,
        reason: String,
    },

    #[error("{0} format currently not supported")]
    UnsupportedDialect(&'static str),
}

fn missing_message(names: &[&'static str]) -> String {
    match names {
        [one] => format!("'--{}' parameter not specified", one),
        many => {
            let flags: Vec<String> = many.iter().map(|n| format!("--{}", n)).collect();
            format!("{} parameters not specified", flags.join(" and "))
        }
    }
}

/// Fatal input problems found while loading tables.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("{}:{line}: {reason}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("{}: no header line", .0.display())]
    MissingHeader(PathBuf),

    #[error("{}: no taxa found", .0.display())]
    EmptyTable(PathBuf),

    #[error("taxon '{0}' appears more than once in the abundance table")]
    DuplicateTaxon(String),

    #[error("taxon '{id}' has {found} counts but the table has {expected} samples")]
    WidthMismatch {
        id: String,
        found: usize,
        expected: usize,
    },

    #[error("taxon '{id}' at rank {rank} outranks its predecessor; the table must be sorted by abundance")]
    Unranked { id: String, rank: usize },
}

/// Non-fatal findings when checking a precomputed alignment against the raw sequences.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AlignmentIssue {
    #[error("alignment contains no rows")]
    Empty,

    #[error("{} sequence(s) missing from alignment: {}", .0.len(), .0.join(", "))]
    MissingIds(Vec<String>),

    #[error("aligned row '{id}' has length {len}, expected {expected}")]
    UnevenLength {
        id: String,
        len: usize,
        expected: usize,
    },

    #[error("aligned row '{id}' does not reproduce its sequence once gaps are removed")]
    SequenceMismatch { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_parameter_wording() {
        let one = ConfigError::MissingParameters(vec!["frequency-input"]);
        assert_eq!(one.to_string(), "'--frequency-input' parameter not specified");

        let two = ConfigError::MissingParameters(vec!["frequency-input", "sequence-output"]);
        assert_eq!(
            two.to_string(),
            "--frequency-input and --sequence-output parameters not specified"
        );
    }

    #[test]
    fn missing_ids_lists_names() {
        let issue = AlignmentIssue::MissingIds(vec!["a".into(), "b".into()]);
        assert_eq!(issue.to_string(), "2 sequence(s) missing from alignment: a, b");
    }
}
