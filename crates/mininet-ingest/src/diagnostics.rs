//! Per-run diagnostics log.
//!
//! One entry per skipped record, plus one batch entry for profiles removed by
//! the consistency sweep. Entries are values; nothing here aborts a run.

use std::fmt;

use thiserror::Error;

use crate::record::RecordError;
use crate::rules::RuleViolation;

const SKIPPED: &str = "(current line will be skipped)";

/// Why a people record was not imported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileRejection {
    #[error("{0}!")]
    Record(#[from] RecordError),
    #[error("has invalid state!")]
    InvalidState,
    #[error("has invalid gender!")]
    InvalidGender,
    #[error("has empty name!")]
    EmptyName,
    #[error("has invalid age `{0}`!")]
    InvalidAge(String),
    #[error("duplicate name!")]
    DuplicateName,
}

impl ProfileRejection {
    fn severity(&self) -> &'static str {
        match self {
            ProfileRejection::Record(RecordError::NotCommaSeparated) => "error",
            _ => "warning",
        }
    }
}

/// Why a relations record was not imported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelationRejection {
    #[error("invalid row ({0})!")]
    Malformed(#[from] RecordError),
    #[error("no such name `{0}` in the people file!")]
    UnknownProfile(String),
    #[error("same names")]
    SameNames,
    #[error(transparent)]
    Rule(#[from] RuleViolation),
    #[error("duplicate relation")]
    Duplicate,
    #[error("store rejected the relation: {0}")]
    Store(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    ProfileRejected {
        source: String,
        line: usize,
        subject: String,
        reason: ProfileRejection,
    },
    RelationRejected {
        source: String,
        line: usize,
        subject: String,
        reason: RelationRejection,
    },
    ProfilesDeleted {
        names: Vec<String>,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ProfileRejected {
                source,
                line,
                subject,
                reason,
            } => write!(
                f,
                "{source}:{line} content {}: {subject} - {reason} {SKIPPED}",
                reason.severity()
            ),
            Diagnostic::RelationRejected {
                source,
                line,
                subject,
                reason,
            } => write!(
                f,
                "{source}:{line} content warning: {subject} - {reason} {SKIPPED}"
            ),
            Diagnostic::ProfilesDeleted { names } => {
                write!(f, "Profiles deleted due to constraints:")?;
                for name in names {
                    write!(f, "\n{name}")?;
                }
                Ok(())
            }
        }
    }
}

/// Append-only, ordered collection of diagnostics for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(diagnostic = %diagnostic, "import diagnostic");
        self.entries.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// All entries rendered one per line.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
