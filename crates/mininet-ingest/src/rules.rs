//! Relation admission rules.
//!
//! Each relation kind maps to an ordered list of [`Check`]s; the first failing
//! check rejects the relation. Most checks only look at the two endpoint ages;
//! couple exclusivity also consults the relations committed so far.
//!
//! | kind       | checks, in order                                              |
//! |------------|---------------------------------------------------------------|
//! | friends    | no child/adult pair, no young child, children ≤ 3 years apart |
//! | parent     | not both children, not both adults                            |
//! | classmates | no young child                                                |
//! | colleagues | adults only                                                   |
//! | couple     | adults only, neither already coupled with someone else        |
//! | other      | none                                                          |

use mininet_store::{RelationKind, Repository};
use thiserror::Error;

use crate::diagnostics::RelationRejection;

/// Oldest age still counted as a child.
pub const CHILD_MAX_AGE: u32 = 16;
/// Oldest age counted as a young child (no friends, no classmates).
pub const YOUNG_CHILD_MAX_AGE: u32 = 2;
/// Largest age gap allowed between two child friends.
pub const MAX_CHILD_FRIEND_GAP: u32 = 3;

pub fn is_child(age: u32) -> bool {
    age <= CHILD_MAX_AGE
}

pub fn is_young_child(age: u32) -> bool {
    age <= YOUNG_CHILD_MAX_AGE
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("invalid friendship child with adult")]
    ChildAdultFriendship,
    #[error("young child cannot have friends")]
    YoungChildFriends,
    #[error("child's age diff is over 3 years ({gap})")]
    ChildFriendAgeGap { gap: u32 },
    #[error("parents are too young")]
    ParentsTooYoung,
    #[error("child is too old")]
    ChildTooOld,
    #[error("young child cannot be classmates")]
    YoungChildClassmates,
    #[error("only adults can be colleagues")]
    ChildColleagues,
    #[error("only adults can be married")]
    ChildCouple,
    #[error("all couples are mutually exclusive to other couples")]
    CoupleTaken,
}

/// Endpoint ages of a candidate relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ages {
    pub first: u32,
    pub second: u32,
}

impl Ages {
    fn either(self, pred: fn(u32) -> bool) -> bool {
        pred(self.first) || pred(self.second)
    }

    fn both(self, pred: fn(u32) -> bool) -> bool {
        pred(self.first) && pred(self.second)
    }

    fn exactly_one(self, pred: fn(u32) -> bool) -> bool {
        pred(self.first) != pred(self.second)
    }
}

pub type AgeRule = fn(Ages) -> Result<(), RuleViolation>;

#[derive(Debug, Clone, Copy)]
pub enum Check {
    Ages(AgeRule),
    /// Neither endpoint may already be in a couple with a third profile.
    ExclusiveCouple,
}

fn reject_if(violated: bool, violation: RuleViolation) -> Result<(), RuleViolation> {
    if violated {
        Err(violation)
    } else {
        Ok(())
    }
}

fn no_child_adult_friendship(ages: Ages) -> Result<(), RuleViolation> {
    reject_if(ages.exactly_one(is_child), RuleViolation::ChildAdultFriendship)
}

fn no_young_child_friends(ages: Ages) -> Result<(), RuleViolation> {
    reject_if(ages.either(is_young_child), RuleViolation::YoungChildFriends)
}

fn child_friends_close_in_age(ages: Ages) -> Result<(), RuleViolation> {
    let gap = ages.first.abs_diff(ages.second);
    reject_if(
        ages.both(is_child) && gap > MAX_CHILD_FRIEND_GAP,
        RuleViolation::ChildFriendAgeGap { gap },
    )
}

fn parents_not_both_children(ages: Ages) -> Result<(), RuleViolation> {
    reject_if(ages.both(is_child), RuleViolation::ParentsTooYoung)
}

fn parent_edge_has_a_child(ages: Ages) -> Result<(), RuleViolation> {
    reject_if(!ages.either(is_child), RuleViolation::ChildTooOld)
}

fn no_young_child_classmates(ages: Ages) -> Result<(), RuleViolation> {
    reject_if(ages.either(is_young_child), RuleViolation::YoungChildClassmates)
}

fn colleagues_are_adults(ages: Ages) -> Result<(), RuleViolation> {
    reject_if(ages.either(is_child), RuleViolation::ChildColleagues)
}

fn couple_are_adults(ages: Ages) -> Result<(), RuleViolation> {
    reject_if(ages.either(is_child), RuleViolation::ChildCouple)
}

const FRIENDS: &[Check] = &[
    Check::Ages(no_child_adult_friendship),
    Check::Ages(no_young_child_friends),
    Check::Ages(child_friends_close_in_age),
];
const PARENT: &[Check] = &[
    Check::Ages(parents_not_both_children),
    Check::Ages(parent_edge_has_a_child),
];
const CLASSMATES: &[Check] = &[Check::Ages(no_young_child_classmates)];
const COLLEAGUES: &[Check] = &[Check::Ages(colleagues_are_adults)];
const COUPLE: &[Check] = &[Check::Ages(couple_are_adults), Check::ExclusiveCouple];

/// The ordered checks for a relation kind.
pub fn checks_for(kind: &RelationKind) -> &'static [Check] {
    match kind {
        RelationKind::Friends => FRIENDS,
        RelationKind::Parent => PARENT,
        RelationKind::Classmates => CLASSMATES,
        RelationKind::Colleagues => COLLEAGUES,
        RelationKind::Couple => COUPLE,
        RelationKind::Other(_) => &[],
    }
}

/// Semantic validation of a relation whose endpoints are known to exist.
pub fn validate_relation<R>(
    repo: &R,
    first: &str,
    second: &str,
    kind: &RelationKind,
) -> Result<(), RelationRejection>
where
    R: Repository + ?Sized,
{
    if first == second {
        return Err(RelationRejection::SameNames);
    }

    let ages = Ages {
        first: repo
            .age_of(first)
            .map_err(|_| RelationRejection::UnknownProfile(first.to_string()))?,
        second: repo
            .age_of(second)
            .map_err(|_| RelationRejection::UnknownProfile(second.to_string()))?,
    };

    for check in checks_for(kind) {
        match check {
            Check::Ages(rule) => rule(ages)?,
            Check::ExclusiveCouple => {
                if !repo.couple_allowed(first, second) {
                    return Err(RuleViolation::CoupleTaken.into());
                }
            }
        }
    }
    Ok(())
}
