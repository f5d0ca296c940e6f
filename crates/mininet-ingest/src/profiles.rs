//! People file loader.

use std::io::BufRead;

use mininet_store::{Gender, Profile, Repository, State, StoreError};

use crate::diagnostics::{Diagnostic, Diagnostics, ProfileRejection};
use crate::record::{self, ProfileFields};
use crate::{LoadError, LoadStats};

/// Validate one cleaned people line into a [`Profile`].
///
/// Checks run in a fixed order: field count, state, gender, name, age.
pub fn parse_profile(line: &str) -> Result<Profile, ProfileRejection> {
    let fields = ProfileFields::parse(line)?;

    let state: State = fields
        .state
        .parse()
        .map_err(|_| ProfileRejection::InvalidState)?;
    let gender: Gender = fields
        .gender
        .parse()
        .map_err(|_| ProfileRejection::InvalidGender)?;
    if fields.name.is_empty() {
        return Err(ProfileRejection::EmptyName);
    }
    let age: u32 = fields
        .age
        .parse()
        .map_err(|_| ProfileRejection::InvalidAge(fields.age.to_string()))?;

    Ok(Profile {
        name: fields.name.to_string(),
        image: fields.image.to_string(),
        status: fields.status.to_string(),
        gender,
        age,
        state,
    })
}

/// Load every record of a people file into `repo`.
///
/// Rejected records are logged to `diagnostics` and skipped. Only a read
/// failure stops the loader; records inserted before it stay inserted.
pub fn load_profiles<R, B>(
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
        let cleaned = record::clean_profile_line(&raw);
        if cleaned.trim().is_empty() {
            continue;
        }

        let rejection = match parse_profile(&cleaned) {
            Ok(profile) => match repo.insert_profile(profile) {
                Ok(()) => {
                    stats.accepted += 1;
                    continue;
                }
                Err(StoreError::DuplicateProfile(_)) => ProfileRejection::DuplicateName,
                Err(err) => return Err(err.into()),
            },
            Err(rejection) => rejection,
        };

        let subject = match &rejection {
            ProfileRejection::Record(record::RecordError::NotCommaSeparated) => cleaned.trim(),
            _ => record::leading_field(&cleaned),
        };
        stats.rejected += 1;
        diagnostics.push(Diagnostic::ProfileRejected {
            source: source.to_string(),
            line: line_no,
            subject: subject.to_string(),
            reason: rejection,
        });
    }

    tracing::info!(
        source,
        accepted = stats.accepted,
        rejected = stats.rejected,
        "loaded profiles"
    );
    Ok(stats)
}
