//! Post-load consistency sweep over parentage.
//!
//! A minor must be backed by a plausible set of `parent` relations once the
//! relations file is in. Parent relations are usually written
//! `parent,child,parent`, so a child normally appears as the *second* endpoint
//! of two relations. A single relation written the other way round
//! (`child,parent,parent`) is also accepted. Every other pattern, including
//! no parent at all, removes the profile and its relations.

use mininet_store::{Endpoint, Repository, StoreError};

use crate::diagnostics::{Diagnostic, Diagnostics};

/// Which minors survive the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentageRule {
    /// Profiles strictly younger than this are checked.
    pub child_below_age: u32,
    /// Parent relations naming the child as first endpoint that make it consistent.
    pub as_first: usize,
    /// Parent relations naming the child as second endpoint that make it consistent.
    pub as_second: usize,
}

impl ParentageRule {
    pub const DEFAULT: ParentageRule = ParentageRule {
        child_below_age: 16,
        as_first: 1,
        as_second: 2,
    };

    pub fn applies_to(&self, age: u32) -> bool {
        age < self.child_below_age
    }

    pub fn is_consistent(&self, as_first: usize, as_second: usize) -> bool {
        as_second == self.as_second || as_first == self.as_first
    }
}

impl Default for ParentageRule {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Deleted profile names, in repository order.
    pub deleted: Vec<String>,
    /// Relations removed along with them.
    pub cascaded: usize,
}

/// Delete every minor whose parent relations do not satisfy `rule`.
///
/// Counts are taken for all candidates before the first delete, so removing one
/// profile never changes the verdict on another.
pub fn sweep<R>(
    repo: &mut R,
    rule: &ParentageRule,
    diagnostics: &mut Diagnostics,
) -> Result<SweepReport, StoreError>
where
    R: Repository + ?Sized,
{
    let doomed: Vec<String> = repo
        .profiles()
        .into_iter()
        .filter(|profile| rule.applies_to(profile.age))
        .filter(|profile| {
            let as_first = repo.count_parent_relations(&profile.name, Endpoint::First);
            let as_second = repo.count_parent_relations(&profile.name, Endpoint::Second);
            !rule.is_consistent(as_first, as_second)
        })
        .map(|profile| profile.name.clone())
        .collect();

    let mut report = SweepReport::default();
    for name in doomed {
        report.cascaded += repo.delete_profile(&name)?;
        report.deleted.push(name);
    }

    if !report.deleted.is_empty() {
        tracing::warn!(
            deleted = report.deleted.len(),
            cascaded = report.cascaded,
            "consistency sweep removed profiles"
        );
        diagnostics.push(Diagnostic::ProfilesDeleted {
            names: report.deleted.clone(),
        });
    }
    Ok(report)
}
