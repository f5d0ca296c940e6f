//! JSON snapshots of a [`MemoryRepository`].
//!
//! Loading replays every record through the [`Repository`] insert paths, so a
//! hand-edited snapshot cannot smuggle in a dangling or duplicate relation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{MemoryRepository, Profile, Relation, Repository, StoreError};

pub const SNAPSHOT_VERSION: &str = "mininet_snapshot_v1";

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotV1 {
    version: String,
    profiles: Vec<Profile>,
    relations: Vec<Relation>,
}

impl MemoryRepository {
    pub fn save_snapshot(&self, path: &Path) -> Result<(), StoreError> {
        let snapshot = SnapshotV1 {
            version: SNAPSHOT_VERSION.to_string(),
            profiles: self.profiles.values().cloned().collect(),
            relations: self.relations.clone(),
        };
        let json = serde_json::to_string_pretty(&snapshot).map_err(|source| {
            StoreError::SnapshotFormat {
                path: path.to_path_buf(),
                source,
            }
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::SnapshotIo {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, json).map_err(|source| StoreError::SnapshotIo {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!(
            path = %path.display(),
            profiles = snapshot.profiles.len(),
            relations = snapshot.relations.len(),
            "saved snapshot"
        );
        Ok(())
    }

    pub fn load_snapshot(path: &Path) -> Result<Self, StoreError> {
        let contents = std::fs::read_to_string(path).map_err(|source| StoreError::SnapshotIo {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: SnapshotV1 =
            serde_json::from_str(&contents).map_err(|source| StoreError::SnapshotFormat {
                path: path.to_path_buf(),
                source,
            })?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::SnapshotVersion(snapshot.version));
        }

        let mut repo = MemoryRepository::new();
        for profile in snapshot.profiles {
            repo.insert_profile(profile)?;
        }
        for relation in snapshot.relations {
            repo.insert_relation(relation)?;
        }
        Ok(repo)
    }
}
