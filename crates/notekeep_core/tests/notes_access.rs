mod common;

use common::{count_rows, empty_service, seeded_service};
use notekeep_core::{
    authorize_read, Decision, NewNote, NoteDraft, NoteRepository, NoteServiceError,
    NoteValidationError, Principal, RepoError, Role,
};

#[test]
fn owner_reads_own_note_and_is_denied_others() {
    let (_pool, service) = seeded_service();

    let note = service.get_note("user1", 101).unwrap();
    assert_eq!(note.title, "Test Note 1");
    assert_eq!(note.body, "This is test note 1");
    assert_eq!(note.owner, "user1");
    assert_eq!(
        note.created_on.to_rfc3339(),
        "2023-06-26T08:00:00+00:00"
    );

    let err = service.get_note("user2", 101).unwrap_err();
    assert!(matches!(err, NoteServiceError::NotFound(101)));
}

#[test]
fn not_owned_and_missing_notes_are_indistinguishable() {
    let (_pool, service) = seeded_service();

    let not_owned = service.get_note("user1", 104).unwrap_err();
    let missing = service.get_note("user1", 9_999).unwrap_err();
    assert!(matches!(not_owned, NoteServiceError::NotFound(_)));
    assert!(matches!(missing, NoteServiceError::NotFound(_)));
}

#[test]
fn ownership_isolation_holds_for_every_foreign_note() {
    let (pool, service) = seeded_service();
    let principal = Principal::new("user1", [Role::Owner]);

    for id in 104..=106 {
        let decision = authorize_read(service.repo(), &principal, id).unwrap();
        assert_eq!(decision, Decision::Deny, "note {id} must not be visible");
    }
    for id in 101..=103 {
        let decision = authorize_read(service.repo(), &principal, id).unwrap();
        assert!(decision.is_allowed(), "note {id} must be visible");
    }
    assert_eq!(count_rows(&pool), 6);
}

#[test]
fn admin_reads_every_note() {
    let (_pool, service) = seeded_service();
    let admin = Principal::new("user3", [Role::Admin]);

    for id in 101..=106 {
        let decision = authorize_read(service.repo(), &admin, id).unwrap();
        assert!(decision.is_allowed(), "admin must see note {id}");
    }
    assert_eq!(
        authorize_read(service.repo(), &admin, 500).unwrap(),
        Decision::Deny
    );
}

#[test]
fn unknown_principal_is_rejected_before_storage_access() {
    let (_pool, service) = seeded_service();
    let err = service.get_note("mallory", 101).unwrap_err();
    assert!(matches!(err, NoteServiceError::UnknownPrincipal(name) if name == "mallory"));
}

#[test]
fn create_stamps_owner_and_timestamps() {
    let (_pool, service) = empty_service();

    let created = service
        .create_note("user1", NewNote::new("Test Note 4", "This is test note 4"))
        .unwrap();
    assert!(created.id > 0);
    assert_eq!(created.owner, "user1");
    assert_eq!(created.created_on, created.modified_on);

    let fetched = service.get_note("user1", created.id).unwrap();
    assert_eq!(fetched, created);
}

#[test]
fn create_rejects_blank_fields_without_persisting() {
    let (pool, service) = empty_service();

    let err = service
        .create_note("user1", NewNote::new("", "x"))
        .unwrap_err();
    assert!(matches!(
        err,
        NoteServiceError::Validation(NoteValidationError::MissingTitle)
    ));

    let err = service
        .create_note(
            "user1",
            NewNote {
                title: Some("title".to_string()),
                body: None,
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        NoteServiceError::Validation(NoteValidationError::MissingBody)
    ));
    assert!(err.is_client_error());

    assert_eq!(count_rows(&pool), 0);
}

#[test]
fn store_assigns_distinct_ids() {
    let (_pool, service) = empty_service();
    let first = service
        .create_note("user1", NewNote::new("a", "a"))
        .unwrap();
    let second = service
        .create_note("user2", NewNote::new("b", "b"))
        .unwrap();
    assert_ne!(first.id, second.id);
}

#[test]
fn store_rejects_drafts_with_whitespace_only_fields() {
    let (pool, service) = empty_service();
    let now = chrono::Utc::now();
    let cases = [
        ("\t", "body", "user1", NoteValidationError::MissingTitle),
        ("title", "\n\r", "user1", NoteValidationError::MissingBody),
        ("title", "body", " \t", NoteValidationError::MissingOwner),
    ];

    for (title, body, owner, expected) in cases {
        let draft = NoteDraft {
            title: title.to_string(),
            body: body.to_string(),
            owner: owner.to_string(),
            created_on: now,
        };
        let err = service.repo().insert_note(&draft).unwrap_err();
        assert!(matches!(err, RepoError::Validation(actual) if actual == expected));
    }

    assert_eq!(count_rows(&pool), 0);
    assert_eq!(
        service
            .list_notes("user3", &Default::default())
            .unwrap()
            .total,
        0
    );
}
