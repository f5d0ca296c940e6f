//! Whole-run orchestration: rebuild from the input files, or reuse the snapshot.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use mininet_store::{MemoryRepository, Repository, StoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::profiles::load_profiles;
use crate::relations::load_relations;
use crate::sweep::{sweep, ParentageRule};
use crate::{LoadError, LoadStats};

// ============================================================================
// Configuration
// ============================================================================

/// Where an import run reads its inputs and keeps its snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// People file, six fields per line
    pub people_path: PathBuf,
    /// Relations file, three fields per line
    pub relations_path: PathBuf,
    /// Repository snapshot written after a rebuild and read when inputs are missing
    pub snapshot_path: PathBuf,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            people_path: PathBuf::from("people.txt"),
            relations_path: PathBuf::from("relations.txt"),
            snapshot_path: PathBuf::from("mininet.json"),
        }
    }
}

impl ImportConfig {
    /// Read a JSON config. Missing keys fall back to [`ImportConfig::default`].
    pub fn from_json_file(path: &Path) -> Result<Self, ImportError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ImportError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ImportError::ConfigFormat {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ============================================================================
// Outcome
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub profiles: LoadStats,
    pub relations: LoadStats,
    /// Profiles removed by the consistency sweep.
    pub deleted: usize,
    /// Relations removed along with them.
    pub cascaded: usize,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "profiles: {} accepted, {} rejected; relations: {} accepted, {} rejected; \
             sweep: {} profiles deleted ({} relations)",
            self.profiles.accepted,
            self.profiles.rejected,
            self.relations.accepted,
            self.relations.rejected,
            self.deleted,
            self.cascaded
        )
    }
}

#[derive(Debug)]
pub enum ImportOutcome {
    /// Inputs were present: the repository was rebuilt from them and snapshotted.
    Rebuilt {
        repository: MemoryRepository,
        diagnostics: Diagnostics,
        summary: ImportSummary,
    },
    /// Inputs were missing: the previous snapshot was loaded unchanged.
    Reused { repository: MemoryRepository },
}

impl ImportOutcome {
    pub fn repository(&self) -> &MemoryRepository {
        match self {
            ImportOutcome::Rebuilt { repository, .. } | ImportOutcome::Reused { repository } => {
                repository
            }
        }
    }

    pub fn into_repository(self) -> MemoryRepository {
        match self {
            ImportOutcome::Rebuilt { repository, .. } | ImportOutcome::Reused { repository } => {
                repository
            }
        }
    }

    /// Diagnostics of the run; always empty when the snapshot was reused.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            ImportOutcome::Rebuilt { diagnostics, .. } => diagnostics.as_slice(),
            ImportOutcome::Reused { .. } => &[],
        }
    }

    pub fn is_rebuilt(&self) -> bool {
        matches!(self, ImportOutcome::Rebuilt { .. })
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("required files and database cannot be found")]
    MissingInputs,
    #[error("'{file}' file is corrupted")]
    CorruptedInput {
        file: String,
        #[source]
        source: LoadError,
        /// Diagnostics collected before the failure.
        diagnostics: Diagnostics,
    },
    #[error("cannot access database: {0}")]
    Storage(#[from] StoreError),
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    ConfigFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// ============================================================================
// Run
// ============================================================================

/// Load both sources into `repo` and run the sweep.
///
/// `repo` is mutated in place; on error it keeps whatever was committed before
/// the failing read.
pub fn import_sources<R, P, Q>(
    repo: &mut R,
    people: P,
    people_name: &str,
    relations: Q,
    relations_name: &str,
) -> Result<(ImportSummary, Diagnostics), ImportError>
where
    R: Repository + ?Sized,
    P: BufRead,
    Q: BufRead,
{
    let mut diagnostics = Diagnostics::new();
    let mut summary = ImportSummary::default();

    summary.profiles = load_profiles(&mut *repo, people, people_name, &mut diagnostics)
        .map_err(|err| phase_error(people_name, err, &mut diagnostics))?;
    summary.relations = load_relations(&mut *repo, relations, relations_name, &mut diagnostics)
        .map_err(|err| phase_error(relations_name, err, &mut diagnostics))?;

    let report = sweep(&mut *repo, &ParentageRule::DEFAULT, &mut diagnostics)?;
    summary.deleted = report.deleted.len();
    summary.cascaded = report.cascaded;

    Ok((summary, diagnostics))
}

fn phase_error(file: &str, err: LoadError, diagnostics: &mut Diagnostics) -> ImportError {
    match err {
        LoadError::Store(err) => ImportError::Storage(err),
        err => ImportError::CorruptedInput {
            file: file.to_string(),
            source: err,
            diagnostics: std::mem::take(diagnostics),
        },
    }
}

/// Run one import.
///
/// With both input files present the repository is rebuilt from scratch and
/// the snapshot replaced. Otherwise an existing snapshot is reused as is.
pub fn run_import(config: &ImportConfig) -> Result<ImportOutcome, ImportError> {
    if config.people_path.is_file() && config.relations_path.is_file() {
        let people_name = display_name(&config.people_path);
        let relations_name = display_name(&config.relations_path);
        let people = open(&config.people_path, &people_name)?;
        let relations = open(&config.relations_path, &relations_name)?;

        let mut repository = MemoryRepository::new();
        let (summary, diagnostics) = import_sources(
            &mut repository,
            people,
            &people_name,
            relations,
            &relations_name,
        )?;
        repository.save_snapshot(&config.snapshot_path)?;

        tracing::info!(
            snapshot = %config.snapshot_path.display(),
            diagnostics = diagnostics.len(),
            %summary,
            "rebuilt repository from input files"
        );
        return Ok(ImportOutcome::Rebuilt {
            repository,
            diagnostics,
            summary,
        });
    }

    if config.snapshot_path.is_file() {
        let repository = MemoryRepository::load_snapshot(&config.snapshot_path)?;
        tracing::info!(
            snapshot = %config.snapshot_path.display(),
            "input files missing, reusing snapshot"
        );
        return Ok(ImportOutcome::Reused { repository });
    }

    Err(ImportError::MissingInputs)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn open(path: &Path, name: &str) -> Result<BufReader<File>, ImportError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| ImportError::CorruptedInput {
            file: name.to_string(),
            source: LoadError::Open {
                source_name: name.to_string(),
                source,
            },
            diagnostics: Diagnostics::new(),
        })
}
