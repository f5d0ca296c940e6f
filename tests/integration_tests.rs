//! Integration tests for the complete MiniNet import pipeline
//!
//! These tests drive `run_import` against real files:
//! - people file → profile loader → repository
//! - relations file → rule table → repository
//! - consistency sweep → snapshot → reuse
//!
//! Run with: cargo test --test integration_tests

use std::path::Path;

use mininet_ingest::{
    run_import, Diagnostic, ImportConfig, ImportError, ImportOutcome, ProfileRejection,
    RelationRejection, RuleViolation,
};
use mininet_ingest::record::RecordError;
use mininet_store::{Endpoint, MemoryRepository, RelationKind, Repository};
use tempfile::tempdir;

fn write_inputs(dir: &Path, people: &str, relations: &str) -> ImportConfig {
    let config = ImportConfig {
        people_path: dir.join("people.txt"),
        relations_path: dir.join("relations.txt"),
        snapshot_path: dir.join("mininet.json"),
    };
    std::fs::write(&config.people_path, people).unwrap();
    std::fs::write(&config.relations_path, relations).unwrap();
    config
}

fn rebuilt(outcome: ImportOutcome) -> (MemoryRepository, Vec<Diagnostic>) {
    match outcome {
        ImportOutcome::Rebuilt {
            repository,
            diagnostics,
            ..
        } => (repository, diagnostics.into_iter().collect()),
        ImportOutcome::Reused { .. } => panic!("expected a rebuild"),
    }
}

fn relation_reasons(diagnostics: &[Diagnostic]) -> Vec<&RelationRejection> {
    diagnostics
        .iter()
        .filter_map(|d| match d {
            Diagnostic::RelationRejected { reason, .. } => Some(reason),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_child_adult_friendship_is_rejected() {
    let dir = tempdir().unwrap();
    let config = write_inputs(
        dir.path(),
        "Anna,imgA,single,F,10,VIC\nBob,imgB,single,M,40,NSW\n",
        "Anna,Bob,friends\n",
    );

    let (repo, diagnostics) = rebuilt(run_import(&config).unwrap());

    assert!(repo.relations().is_empty());
    assert_eq!(
        relation_reasons(&diagnostics),
        vec![&RelationRejection::Rule(RuleViolation::ChildAdultFriendship)]
    );
    assert_eq!(
        diagnostics[0].to_string(),
        "relations.txt:1 content warning: Anna,Bob,friends - invalid friendship child with adult (current line will be skipped)"
    );
}

#[test]
fn test_couples_are_mutually_exclusive() {
    let dir = tempdir().unwrap();
    let config = write_inputs(
        dir.path(),
        "Carl,imgC,single,M,30,NSW\nDana,imgD,single,F,31,NSW\nEve,imgE,single,F,29,QLD\n",
        "Carl,Dana,couple\nCarl,Eve,couple\n",
    );

    let (repo, diagnostics) = rebuilt(run_import(&config).unwrap());

    let relations = repo.relations();
    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0].first, "Carl");
    assert_eq!(relations[0].second, "Dana");
    assert_eq!(relations[0].kind, RelationKind::Couple);
    assert_eq!(
        relation_reasons(&diagnostics),
        vec![&RelationRejection::Rule(RuleViolation::CoupleTaken)]
    );
}

#[test]
fn test_sweep_deletes_child_with_single_parent_edge() {
    let dir = tempdir().unwrap();
    let config = write_inputs(
        dir.path(),
        "Mia,imgM,single,F,10,VIC\nTom,imgT,married,M,42,VIC\nLiv,imgL,single,F,11,VIC\n",
        "Tom,Mia,parent\nMia,Liv,friends\n",
    );

    let (repo, diagnostics) = rebuilt(run_import(&config).unwrap());

    assert!(!repo.exists("Mia"));
    assert!(repo.relations_of("Mia").is_empty());
    assert_eq!(repo.count_parent_relations("Tom", Endpoint::First), 0);
    // Liv has no parent edges at all, so she goes too.
    assert!(!repo.exists("Liv"));
    assert!(repo.exists("Tom"));
    assert_eq!(
        diagnostics.last().map(ToString::to_string).as_deref(),
        Some("Profiles deleted due to constraints:\nLiv\nMia")
    );
}

#[test]
fn test_sweep_keeps_child_with_two_parents() {
    let dir = tempdir().unwrap();
    let config = write_inputs(
        dir.path(),
        "Mia,imgM,single,F,10,VIC\nTom,imgT,married,M,42,VIC\nUma,imgU,married,F,40,VIC\n",
        "Tom,Mia,parent\nUma,Mia,parent\nTom,Uma,couple\n",
    );

    let (repo, diagnostics) = rebuilt(run_import(&config).unwrap());

    assert!(diagnostics.is_empty());
    assert!(repo.exists("Mia"));
    assert_eq!(repo.relations().len(), 3);
}

#[test]
fn test_short_profile_line_is_skipped() {
    let dir = tempdir().unwrap();
    let config = write_inputs(
        dir.path(),
        "Carl,imgC,single,M,30\nDana,imgD,single,F,31,NSW\n",
        "",
    );

    let (repo, diagnostics) = rebuilt(run_import(&config).unwrap());

    assert!(!repo.exists("Carl"));
    assert!(repo.exists("Dana"));
    assert_eq!(diagnostics.len(), 1);
    match &diagnostics[0] {
        Diagnostic::ProfileRejected {
            subject, reason, ..
        } => {
            assert_eq!(subject, "Carl");
            assert_eq!(
                reason,
                &ProfileRejection::Record(RecordError::FieldCount {
                    expected: 6,
                    found: 5
                })
            );
        }
        other => panic!("unexpected diagnostic {other:?}"),
    }
    assert!(diagnostics[0]
        .to_string()
        .contains("has invalid number of parameters"));
}

#[test]
fn test_quoted_relation_is_never_evaluated() {
    let dir = tempdir().unwrap();
    // Same names would fail semantic validation; the quote must win first.
    let config = write_inputs(
        dir.path(),
        "Anna,imgA,single,F,10,VIC\nBob,imgB,single,M,40,NSW\n",
        "Anna,Bob,'friends'\nAnna,\"Anna\",friends\n",
    );

    let (repo, diagnostics) = rebuilt(run_import(&config).unwrap());

    assert!(repo.relations().is_empty());
    assert_eq!(
        relation_reasons(&diagnostics),
        vec![
            &RelationRejection::Malformed(RecordError::Quoted),
            &RelationRejection::Malformed(RecordError::Quoted),
        ]
    );
}

// ============================================================================
// Run lifecycle
// ============================================================================

#[test]
fn test_reuse_path_returns_snapshot_unchanged() {
    let dir = tempdir().unwrap();
    let config = write_inputs(
        dir.path(),
        "Carl,imgC,single,M,30,NSW\nDana,imgD,single,F,31,NSW\n",
        "Carl,Dana,couple\nCarl,Dana,colleagues\n",
    );
    let first = run_import(&config).unwrap().into_repository();

    std::fs::remove_file(&config.people_path).unwrap();
    std::fs::remove_file(&config.relations_path).unwrap();

    for _ in 0..2 {
        let outcome = run_import(&config).unwrap();
        assert!(!outcome.is_rebuilt());
        assert!(outcome.diagnostics().is_empty());
        assert_eq!(outcome.repository(), &first);
    }
}

#[test]
fn test_rebuild_replaces_previous_state() {
    let dir = tempdir().unwrap();
    let config = write_inputs(
        dir.path(),
        "Carl,imgC,single,M,30,NSW\n",
        "",
    );
    run_import(&config).unwrap();

    std::fs::write(&config.people_path, "Dana,imgD,single,F,31,NSW\n").unwrap();
    let repo = run_import(&config).unwrap().into_repository();

    assert!(!repo.exists("Carl"));
    assert!(repo.exists("Dana"));
    assert_eq!(MemoryRepository::load_snapshot(&config.snapshot_path).unwrap(), repo);
}

#[test]
fn test_rebuild_is_deterministic() {
    let dir = tempdir().unwrap();
    let config = write_inputs(
        dir.path(),
        "Anna,imgA,single,F,10,VIC\nBob,imgB,single,M,40,NSW\nCarl,imgC,single,M,30,NSW\n",
        "Bob,Anna,parent\nBob,Carl,colleagues\nAnna,Carl,friends\n",
    );

    let (first, first_diagnostics) = rebuilt(run_import(&config).unwrap());
    let (second, second_diagnostics) = rebuilt(run_import(&config).unwrap());

    assert_eq!(first, second);
    assert_eq!(first_diagnostics, second_diagnostics);
}

#[test]
fn test_missing_everything_is_fatal() {
    let dir = tempdir().unwrap();
    let config = ImportConfig {
        people_path: dir.path().join("people.txt"),
        relations_path: dir.path().join("relations.txt"),
        snapshot_path: dir.path().join("mininet.json"),
    };
    std::fs::write(&config.people_path, "Carl,imgC,single,M,30,NSW\n").unwrap();

    let err = run_import(&config).unwrap_err();
    assert!(matches!(err, ImportError::MissingInputs));
    assert!(!config.snapshot_path.exists());
}

#[test]
fn test_unreadable_snapshot_is_a_storage_error() {
    let dir = tempdir().unwrap();
    let config = ImportConfig {
        people_path: dir.path().join("people.txt"),
        relations_path: dir.path().join("relations.txt"),
        snapshot_path: dir.path().join("mininet.json"),
    };
    std::fs::write(&config.snapshot_path, "{ not json").unwrap();

    assert!(matches!(
        run_import(&config),
        Err(ImportError::Storage(_))
    ));
}
