#![allow(dead_code)]

use notekeep_core::db::{open_db_in_memory, DbPool};
use notekeep_core::{InMemoryRoleStore, NoteService, Role, SqliteNoteRepository};
use rusqlite::params;

pub type TestService = NoteService<SqliteNoteRepository, InMemoryRoleStore>;

/// Base creation time of the seeded fixture: 2023-06-26T08:00:00Z in µs.
pub const FIXTURE_BASE_MICROS: i64 = 1_687_766_400_000_000;

pub fn role_store() -> InMemoryRoleStore {
    InMemoryRoleStore::new()
        .with_principal("user1", [Role::Owner])
        .with_principal("user2", [Role::Owner])
        .with_principal("user3", [Role::Admin])
        .with_principal("user4", [Role::Owner])
}

pub fn empty_service() -> (DbPool, TestService) {
    let pool = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(pool.clone()).unwrap();
    (pool, NoteService::new(repo, role_store()))
}

/// Six notes across three owners; higher ids are created later.
pub fn seeded_service() -> (DbPool, TestService) {
    let (pool, service) = empty_service();
    let rows: [(i64, &str, &str, &str); 6] = [
        (101, "Test Note 1", "This is test note 1", "user1"),
        (102, "Test Note 2", "This is test note 2", "user1"),
        (103, "Test Note 3", "This is test note 3", "user1"),
        (104, "Test Note 1", "This is test note 1", "user2"),
        (105, "Test Note 2", "This is test note 2", "user2"),
        (106, "Test Note 1", "This is test note 1", "user4"),
    ];
    {
        let conn = pool.get().unwrap();
        for (offset, (id, title, body, owner)) in rows.iter().enumerate() {
            let created_on = FIXTURE_BASE_MICROS + (offset as i64) * 60_000_000;
            conn.execute(
                "INSERT INTO notes (id, title, body, created_on, modified_on, owner)
                 VALUES (?1, ?2, ?3, ?4, ?4, ?5);",
                params![id, title, body, created_on, owner],
            )
            .unwrap();
        }
    }
    (pool, service)
}

/// Inserts one row directly, bypassing the service clock.
pub fn insert_row(pool: &DbPool, id: i64, owner: &str, created_on_micros: i64) {
    pool.get()
        .unwrap()
        .execute(
            "INSERT INTO notes (id, title, body, created_on, modified_on, owner)
             VALUES (?1, ?2, ?3, ?4, ?4, ?5);",
            params![
                id,
                format!("Note {id}"),
                format!("Body of note {id}"),
                created_on_micros,
                owner
            ],
        )
        .unwrap();
}

pub fn count_rows(pool: &DbPool) -> i64 {
    pool.get()
        .unwrap()
        .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))
        .unwrap()
}
