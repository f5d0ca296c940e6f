//! MiniNet profile/relation repository
//!
//! The repository is the only component with access to persisted state. It holds:
//!
//! ```text
//! ┌──────────────────────────────┐        ┌──────────────────────────────┐
//! │          Profiles            │        │          Relations           │
//! │  name (key), image, status,  │◄───────│  (first, second, kind)       │
//! │  gender, age, state          │  weak  │  unique triple, first≠second │
//! └──────────────────────────────┘  refs  └──────────────────────────────┘
//! ```
//!
//! Relations reference profiles by name. Deleting a profile cascades to every
//! relation that mentions it.
//!
//! Loaders and the consistency sweep only see the [`Repository`] trait;
//! [`MemoryRepository`] is the in-memory implementation, persisted as a JSON
//! snapshot (see [`snapshot`]).

pub mod snapshot;


use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Core Types
// ============================================================================

/// Gender as recorded in the people file. Only the exact codes `M`/`F` parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    M,
    F,
}

impl Gender {
    pub fn code(self) -> &'static str {
        match self {
            Gender::M => "M",
            Gender::F => "F",
        }
    }
}

impl FromStr for Gender {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(Gender::M),
            "F" => Ok(Gender::F),
            other => Err(ParseFieldError::new("gender", other)),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Australian state/territory codes accepted for a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum State {
    #[serde(rename = "ACT")]
    Act,
    #[serde(rename = "NSW")]
    Nsw,
    #[serde(rename = "NT")]
    Nt,
    #[serde(rename = "QLD")]
    Qld,
    #[serde(rename = "SA")]
    Sa,
    #[serde(rename = "TAS")]
    Tas,
    #[serde(rename = "VIC")]
    Vic,
    #[serde(rename = "WA")]
    Wa,
}

impl State {
    pub const ALL: [State; 8] = [
        State::Act,
        State::Nsw,
        State::Nt,
        State::Qld,
        State::Sa,
        State::Tas,
        State::Vic,
        State::Wa,
    ];

    pub fn code(self) -> &'static str {
        match self {
            State::Act => "ACT",
            State::Nsw => "NSW",
            State::Nt => "NT",
            State::Qld => "QLD",
            State::Sa => "SA",
            State::Tas => "TAS",
            State::Vic => "VIC",
            State::Wa => "WA",
        }
    }
}

impl FromStr for State {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        State::ALL
            .into_iter()
            .find(|state| state.code() == s)
            .ok_or_else(|| ParseFieldError::new("state", s))
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {field} `{value}`")]
pub struct ParseFieldError {
    pub field: &'static str,
    pub value: String,
}

impl ParseFieldError {
    fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

/// A person record keyed by unique name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub image: String,
    pub status: String,
    pub gender: Gender,
    pub age: u32,
    pub state: State,
}

/// Relation type between two profiles.
///
/// Unrecognised labels are kept verbatim in `Other`; they carry no
/// type-specific admission rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Friends,
    Parent,
    Classmates,
    Colleagues,
    Couple,
    Other(String),
}

impl RelationKind {
    pub fn from_label(label: &str) -> Self {
        match label {
            "friends" => RelationKind::Friends,
            "parent" => RelationKind::Parent,
            "classmates" => RelationKind::Classmates,
            "colleagues" => RelationKind::Colleagues,
            "couple" => RelationKind::Couple,
            other => RelationKind::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            RelationKind::Friends => "friends",
            RelationKind::Parent => "parent",
            RelationKind::Classmates => "classmates",
            RelationKind::Colleagues => "colleagues",
            RelationKind::Couple => "couple",
            RelationKind::Other(label) => label,
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A typed edge between two named profiles, stored positionally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub first: String,
    pub second: String,
    pub kind: RelationKind,
}

impl Relation {
    pub fn new(first: impl Into<String>, second: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
            kind,
        }
    }

    pub fn touches(&self, name: &str) -> bool {
        self.first == name || self.second == name
    }

    /// The other endpoint, if `name` is one of the two.
    pub fn partner_of(&self, name: &str) -> Option<&str> {
        if self.first == name {
            Some(&self.second)
        } else if self.second == name {
            Some(&self.first)
        } else {
            None
        }
    }
}

/// Which position of a relation a profile occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    First,
    Second,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("profile `{0}` already exists")]
    DuplicateProfile(String),
    #[error("no profile named `{0}`")]
    UnknownProfile(String),
    #[error("profile `{0}` cannot be related to itself")]
    SelfRelation(String),
    #[error("relation ({first}, {second}, {kind}) already exists")]
    DuplicateRelation {
        first: String,
        second: String,
        kind: RelationKind,
    },
    #[error("snapshot IO error at {path}: {source}")]
    SnapshotIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot at {path} is malformed: {source}")]
    SnapshotFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported snapshot version `{0}`")]
    SnapshotVersion(String),
}

// ============================================================================
// Repository contract
// ============================================================================

/// Persistence contract used by the loaders and the consistency sweep.
pub trait Repository {
    fn exists(&self, name: &str) -> bool;

    fn age_of(&self, name: &str) -> Result<u32, StoreError>;

    /// Fails with [`StoreError::DuplicateProfile`] if the name is taken.
    fn insert_profile(&mut self, profile: Profile) -> Result<(), StoreError>;

    /// Fails if the triple exists, an endpoint is missing, or both endpoints are the same.
    fn insert_relation(&mut self, relation: Relation) -> Result<(), StoreError>;

    /// Removes the profile and every relation mentioning it. Returns the
    /// number of relations removed by the cascade.
    fn delete_profile(&mut self, name: &str) -> Result<usize, StoreError>;

    /// True unless either name already has a couple relation with a third profile.
    fn couple_allowed(&self, name1: &str, name2: &str) -> bool;

    fn count_parent_relations(&self, name: &str, endpoint: Endpoint) -> usize;

    fn profile(&self, name: &str) -> Option<&Profile>;

    fn profiles(&self) -> Vec<&Profile>;

    fn relations(&self) -> Vec<&Relation>;

    fn relations_of(&self, name: &str) -> Vec<&Relation>;
}

// ============================================================================
// In-memory repository
// ============================================================================

/// Ordered in-memory store. Profiles iterate by name; relations keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryRepository {
    profiles: BTreeMap<String, Profile>,
    relations: Vec<Relation>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty() && self.relations.is_empty()
    }

    fn require(&self, name: &str) -> Result<(), StoreError> {
        if self.profiles.contains_key(name) {
            Ok(())
        } else {
            Err(StoreError::UnknownProfile(name.to_string()))
        }
    }
}

impl Repository for MemoryRepository {
    fn exists(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    fn age_of(&self, name: &str) -> Result<u32, StoreError> {
        self.profiles
            .get(name)
            .map(|p| p.age)
            .ok_or_else(|| StoreError::UnknownProfile(name.to_string()))
    }

    fn insert_profile(&mut self, profile: Profile) -> Result<(), StoreError> {
        if self.profiles.contains_key(&profile.name) {
            return Err(StoreError::DuplicateProfile(profile.name));
        }
        self.profiles.insert(profile.name.clone(), profile);
        Ok(())
    }

    fn insert_relation(&mut self, relation: Relation) -> Result<(), StoreError> {
        if relation.first == relation.second {
            return Err(StoreError::SelfRelation(relation.first));
        }
        self.require(&relation.first)?;
        self.require(&relation.second)?;
        if self.relations.contains(&relation) {
            return Err(StoreError::DuplicateRelation {
                first: relation.first,
                second: relation.second,
                kind: relation.kind,
            });
        }
        self.relations.push(relation);
        Ok(())
    }

    fn delete_profile(&mut self, name: &str) -> Result<usize, StoreError> {
        if self.profiles.remove(name).is_none() {
            return Err(StoreError::UnknownProfile(name.to_string()));
        }
        let before = self.relations.len();
        self.relations.retain(|r| !r.touches(name));
        let cascaded = before - self.relations.len();
        tracing::debug!(profile = name, cascaded, "deleted profile");
        Ok(cascaded)
    }

    fn couple_allowed(&self, name1: &str, name2: &str) -> bool {
        !self
            .relations
            .iter()
            .filter(|r| r.kind == RelationKind::Couple)
            .any(|r| {
                matches!(r.partner_of(name1), Some(partner) if partner != name2)
                    || matches!(r.partner_of(name2), Some(partner) if partner != name1)
            })
    }

    fn count_parent_relations(&self, name: &str, endpoint: Endpoint) -> usize {
        self.relations
            .iter()
            .filter(|r| r.kind == RelationKind::Parent)
            .filter(|r| match endpoint {
                Endpoint::First => r.first == name,
                Endpoint::Second => r.second == name,
            })
            .count()
    }

    fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    fn profiles(&self) -> Vec<&Profile> {
        self.profiles.values().collect()
    }

    fn relations(&self) -> Vec<&Relation> {
        self.relations.iter().collect()
    }

    fn relations_of(&self, name: &str) -> Vec<&Relation> {
        self.relations.iter().filter(|r| r.touches(name)).collect()
    }
}
