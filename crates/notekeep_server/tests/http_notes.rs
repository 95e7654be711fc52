use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use notekeep_core::db::open_db_in_memory;
use notekeep_core::{
    InMemoryRoleStore, NewNote, Note, NoteId, NoteService, Role, SqliteNoteRepository,
};
use notekeep_server::auth::CredentialStore;
use notekeep_server::{controllers, AppState};

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .configure(controllers::health::config_routes)
                .configure(controllers::notes::config),
        )
        .await
    };
}

fn basic(name: &str) -> (header::HeaderName, String) {
    let encoded = STANDARD.encode(format!("{name}:{name}$$pwd"));
    (header::AUTHORIZATION, format!("Basic {encoded}"))
}

fn app_state() -> AppState {
    let pool = open_db_in_memory().expect("in-memory db should open");
    let repo = SqliteNoteRepository::try_new(pool).expect("repo should build");
    let roles = InMemoryRoleStore::new()
        .with_principal("user1", [Role::Owner])
        .with_principal("user2", [Role::Owner])
        .with_principal("user3", [Role::Admin])
        .with_principal("user5", Vec::<Role>::new());
    let mut credentials = CredentialStore::new();
    for name in ["user1", "user2", "user3", "user5"] {
        credentials.insert_password(name, &format!("{name}$$pwd"));
    }
    AppState::new(NoteService::new(repo, roles), credentials)
}

fn seed(state: &AppState, owner: &str, title: &str) -> NoteId {
    state
        .notes
        .create_note(owner, NewNote::new(title, format!("{title} body")))
        .expect("seed note should be created")
        .id
}

#[actix_web::test]
async fn health_reports_ok_without_credentials() {
    let state = app_state();
    let app = init_app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        serde_json::json!({
            "status": "ok",
            "version": notekeep_core::core_version()
        })
    );
}

#[actix_web::test]
async fn owner_reads_own_note_with_camel_case_fields() {
    let state = app_state();
    let id = seed(&state, "user1", "groceries");
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri(&format!("/notes/{id}"))
        .insert_header(basic("user1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["id"], id);
    assert_eq!(body["title"], "groceries");
    assert_eq!(body["owner"], "user1");
    assert!(body.get("createdOn").is_some());
    assert!(body.get("modifiedOn").is_some());
}

#[actix_web::test]
async fn foreign_and_missing_notes_are_indistinguishable_for_owners() {
    let state = app_state();
    let foreign = seed(&state, "user2", "private");
    let app = init_app!(state);

    for uri in [format!("/notes/{foreign}"), "/notes/99999".to_string()] {
        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header(basic("user1"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = test::read_body(resp).await;
        assert!(body.is_empty());
    }
}

#[actix_web::test]
async fn admin_reads_any_owner_note() {
    let state = app_state();
    let id = seed(&state, "user2", "shared");
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri(&format!("/notes/{id}"))
        .insert_header(basic("user3"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let note: Note = test::read_body_json(resp).await;
    assert_eq!(note.owner, "user2");
}

#[actix_web::test]
async fn missing_or_wrong_credentials_get_a_basic_challenge() {
    let state = app_state();
    let app = init_app!(state);

    let anonymous = test::TestRequest::get().uri("/notes").to_request();
    let wrong_password = test::TestRequest::get()
        .uri("/notes")
        .insert_header((
            header::AUTHORIZATION,
            format!("Basic {}", STANDARD.encode("user1:nope")),
        ))
        .to_request();

    for req in [anonymous, wrong_password] {
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let challenge = resp
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .and_then(|value| value.to_str().ok())
            .expect("challenge header should be present");
        assert!(challenge.starts_with("Basic"));
    }
}

#[actix_web::test]
async fn authenticated_user_without_roles_is_forbidden() {
    let state = app_state();
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri("/notes")
        .insert_header(basic("user5"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn create_returns_location_and_stamps_caller_as_owner() {
    let state = app_state();
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/notes")
        .insert_header(basic("user1"))
        .set_json(serde_json::json!({
            "title": "todo",
            "body": "write tests",
            "owner": "user2"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let location = resp
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .expect("location header should be present")
        .to_string();
    assert!(location.starts_with("/notes/"));

    let req = test::TestRequest::get()
        .uri(&location)
        .insert_header(basic("user1"))
        .to_request();
    let note: Note = test::call_and_read_body_json(&app, req).await;
    assert_eq!(note.owner, "user1");
    assert_eq!(note.title, "todo");
    assert_eq!(note.created_on, note.modified_on);
}

#[actix_web::test]
async fn create_with_blank_title_is_rejected() {
    let state = app_state();
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/notes")
        .insert_header(basic("user1"))
        .set_json(serde_json::json!({ "title": "   ", "body": "text" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());

    let listed = state
        .notes
        .list_notes("user3", &Default::default())
        .expect("admin listing should succeed");
    assert_eq!(listed.total, 0);
}

#[actix_web::test]
async fn listing_is_scoped_paged_and_sorted() {
    let state = app_state();
    let a = seed(&state, "user1", "alpha");
    let b = seed(&state, "user1", "bravo");
    let c = seed(&state, "user1", "charlie");
    let foreign = seed(&state, "user2", "delta");
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri("/notes?sort=id,asc")
        .insert_header(basic("user1"))
        .to_request();
    let notes: Vec<Note> = test::call_and_read_body_json(&app, req).await;
    let ids: Vec<NoteId> = notes.iter().map(|note| note.id).collect();
    assert_eq!(ids, vec![a, b, c]);

    let req = test::TestRequest::get()
        .uri("/notes?page=1&size=2&sort=title,desc")
        .insert_header(basic("user1"))
        .to_request();
    let notes: Vec<Note> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].id, a);

    let req = test::TestRequest::get()
        .uri("/notes?sort=owner,desc")
        .insert_header(basic("user3"))
        .to_request();
    let notes: Vec<Note> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(notes.len(), 4);
    assert_eq!(notes[0].id, foreign);
}

#[actix_web::test]
async fn listing_with_unknown_sort_field_is_bad_request() {
    let state = app_state();
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri("/notes?sort=password,asc")
        .insert_header(basic("user1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn update_changes_only_supplied_fields() {
    let state = app_state();
    let id = seed(&state, "user1", "draft");
    let before = state
        .notes
        .get_note("user1", id)
        .expect("seeded note should be readable");
    let app = init_app!(state);

    let req = test::TestRequest::put()
        .uri(&format!("/notes/{id}"))
        .insert_header(basic("user1"))
        .set_json(serde_json::json!({ "title": "final", "body": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let after = state
        .notes
        .get_note("user1", id)
        .expect("updated note should be readable");
    assert_eq!(after.title, "final");
    assert_eq!(after.body, before.body);
    assert_eq!(after.created_on, before.created_on);
    assert!(after.modified_on > before.modified_on);
}

#[actix_web::test]
async fn update_without_changes_keeps_modified_on() {
    let state = app_state();
    let id = seed(&state, "user1", "steady");
    let before = state
        .notes
        .get_note("user1", id)
        .expect("seeded note should be readable");
    let app = init_app!(state);

    let req = test::TestRequest::put()
        .uri(&format!("/notes/{id}"))
        .insert_header(basic("user1"))
        .set_json(serde_json::json!({ "title": "steady" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let after = state
        .notes
        .get_note("user1", id)
        .expect("note should still be readable");
    assert_eq!(after, before);
}

#[actix_web::test]
async fn update_of_foreign_note_is_not_found_and_leaves_it_intact() {
    let state = app_state();
    let id = seed(&state, "user2", "theirs");
    let app = init_app!(state);

    let req = test::TestRequest::put()
        .uri(&format!("/notes/{id}"))
        .insert_header(basic("user1"))
        .set_json(serde_json::json!({ "title": "mine now" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let note = state
        .notes
        .get_note("user2", id)
        .expect("owner should still read the note");
    assert_eq!(note.title, "theirs");
}
