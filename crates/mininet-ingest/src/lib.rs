//! Validated import of MiniNet people and relations files.
//!
//! ```text
//! people.txt ──► profiles::load_profiles ──┐
//!                                          ├──► Repository ──► sweep ──► snapshot
//! relations.txt ► relations::load_relations┘         │
//!                                                     └──► Diagnostics (returned)
//! ```
//!
//! Each phase takes the repository and the diagnostics log as explicit
//! arguments. A rejected record becomes one [`Diagnostic`] and the loader moves
//! on; only a failed read stops a phase.

pub mod diagnostics;
pub mod import;
pub mod profiles;
pub mod record;
pub mod relations;
pub mod rules;
pub mod sweep;

pub use diagnostics::{Diagnostic, Diagnostics, ProfileRejection, RelationRejection};
pub use import::{
    import_sources, run_import, ImportConfig, ImportError, ImportOutcome, ImportSummary,
};
pub use profiles::{load_profiles, parse_profile};
pub use relations::{admit_relation, load_relations};
pub use rules::RuleViolation;
pub use sweep::{sweep, ParentageRule, SweepReport};

use mininet_store::StoreError;

/// Accepted and rejected record counts for one loader pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub accepted: usize,
    pub rejected: usize,
}

/// A loader failure that stops the phase (as opposed to a skipped record).
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to open {source_name}: {source}")]
    Open {
        source_name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {source_name} at line {line}: {source}")]
    Io {
        source_name: String,
        line: usize,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}
