//! Relations file loader.

use std::io::BufRead;

use mininet_store::{Relation, RelationKind, Repository, StoreError};

use crate::diagnostics::{Diagnostic, Diagnostics, RelationRejection};
use crate::record::{self, RelationFields};
use crate::rules;
use crate::{LoadError, LoadStats};

/// Run one relations line through every admission step and insert it.
///
/// Steps short-circuit: structure, endpoint existence (first, then second),
/// semantic rules, then the insert itself.
pub fn admit_relation<R>(repo: &mut R, line: &str) -> Result<Relation, RelationRejection>
where
    R: Repository + ?Sized,
{
    let fields = RelationFields::parse(line)?;
    for name in [fields.first, fields.second] {
        if !repo.exists(name) {
            return Err(RelationRejection::UnknownProfile(name.to_string()));
        }
    }

    let kind = RelationKind::from_label(fields.kind);
    rules::validate_relation(&*repo, fields.first, fields.second, &kind)?;

    let relation = Relation::new(fields.first, fields.second, kind);
    match repo.insert_relation(relation.clone()) {
        Ok(()) => Ok(relation),
        Err(StoreError::DuplicateRelation { .. }) => Err(RelationRejection::Duplicate),
        Err(StoreError::SelfRelation(_)) => Err(RelationRejection::SameNames),
        Err(StoreError::UnknownProfile(name)) => Err(RelationRejection::UnknownProfile(name)),
        Err(other) => Err(RelationRejection::Store(other.to_string())),
    }
}

/// Load every record of a relations file into `repo`.
///
/// Profiles must already be loaded: existence and ages are looked up as each
/// line is validated, and couple exclusivity sees every earlier accepted line.
pub fn load_relations<R, B>(
    repo: &mut R,
    reader: B,
    source: &str,
    diagnostics: &mut Diagnostics,
) -> Result<LoadStats, LoadError>
where
    R: Repository + ?Sized,
    B: BufRead,
{
    let mut stats = LoadStats::default();

    for (index, line) in record::lines(reader).enumerate() {
        let line_no = index + 1;
        let raw = line.map_err(|err| LoadError::Io {
            source_name: source.to_string(),
            line: line_no,
            source: err,
        })?;
        if raw.trim().is_empty() {
            continue;
        }

        match admit_relation(&mut *repo, &raw) {
            Ok(_) => stats.accepted += 1,
            Err(reason) => {
                stats.rejected += 1;
                diagnostics.push(Diagnostic::RelationRejected {
                    source: source.to_string(),
                    line: line_no,
                    subject: raw.trim().to_string(),
                    reason,
                });
            }
        }
    }

    tracing::info!(
        source,
        accepted = stats.accepted,
        rejected = stats.rejected,
        "loaded relations"
    );
    Ok(stats)
}
