//! Notes REST API.
//!
//! | Method | Path          | Success                     |
//! |--------|---------------|-----------------------------|
//! | GET    | `/notes/{id}` | 200 + note                  |
//! | GET    | `/notes`      | 200 + scoped, paged list    |
//! | POST   | `/notes`      | 201 + `Location` header     |
//! | PUT    | `/notes/{id}` | 204                         |
//!
//! Every route requires Basic authentication. Notes outside the caller's
//! scope answer exactly like missing notes.

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::AppState;
use actix_web::http::header;
use actix_web::{web, HttpResponse};
use notekeep_core::{NewNote, NoteId, NoteServiceError, PageRequest, UpdateRequest};
use serde::Deserialize;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/notes")
            .route("", web::get().to(list_notes))
            .route("", web::post().to(create_note))
            .route("/{id}", web::get().to(get_note))
            .route("/{id}", web::put().to(update_note)),
    );
}

/// Canonical location of a stored note.
pub fn note_location(id: NoteId) -> String {
    format!("/notes/{id}")
}

async fn get_note(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<NoteId>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let notes = state.notes.clone();
    let note = web::block(move || notes.get_note(user.name(), id)).await??;
    Ok(HttpResponse::Ok().json(note))
}

#[derive(Debug, Deserialize)]
struct ListNotesQuery {
    page: Option<u32>,
    size: Option<u32>,
    sort: Option<String>,
}

async fn list_notes(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<ListNotesQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let request = PageRequest::parse(query.page, query.size, query.sort.as_deref())
        .map_err(NoteServiceError::from)?;
    let notes = state.notes.clone();
    let page = web::block(move || notes.list_notes(user.name(), &request)).await??;
    Ok(HttpResponse::Ok().json(page.items))
}

async fn create_note(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<NewNote>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    let notes = state.notes.clone();
    let note = web::block(move || notes.create_note(user.name(), request)).await??;
    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, note_location(note.id)))
        .finish())
}

async fn update_note(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<NoteId>,
    body: web::Json<UpdateRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let request = body.into_inner();
    let notes = state.notes.clone();
    web::block(move || notes.update_note(user.name(), id, &request)).await??;
    Ok(HttpResponse::NoContent().finish())
}
