//! HTTP Basic authentication.
//!
//! # Responsibility
//! - Verify `Authorization: Basic` credentials against configured digests.
//! - Produce the authenticated principal consumed by note handlers.
//!
//! # Invariants
//! - Passwords are only ever held as SHA-256 digests.
//! - A caller whose role record is missing or empty is authenticated but
//!   forbidden; it never reaches the note service.

use crate::error::ApiError;
use crate::AppState;
use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, warn};
use notekeep_core::Principal;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::future::{ready, Ready};

type PasswordDigest = [u8; 32];

/// Username to password-digest table.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    digests: HashMap<String, PasswordDigest>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user from a hex-encoded SHA-256 password digest.
    pub fn insert_digest_hex(&mut self, name: impl Into<String>, digest_hex: &str) -> Result<(), String> {
        let bytes = hex::decode(digest_hex.trim())
            .map_err(|err| format!("invalid password digest: {err}"))?;
        let digest: PasswordDigest = bytes
            .try_into()
            .map_err(|_| "password digest must be 32 bytes".to_string())?;
        self.digests.insert(name.into(), digest);
        Ok(())
    }

    /// Registers a user from a plaintext password. Intended for tests and
    /// bootstrap tooling.
    pub fn insert_password(&mut self, name: impl Into<String>, password: &str) {
        self.digests.insert(name.into(), password_digest(password));
    }

    /// Returns whether `password` matches the stored digest for `name`.
    pub fn verify(&self, name: &str, password: &str) -> bool {
        self.digests
            .get(name)
            .is_some_and(|expected| *expected == password_digest(password))
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}

/// SHA-256 of a password, as stored in the users file.
pub fn password_digest(password: &str) -> PasswordDigest {
    Sha256::digest(password.as_bytes()).into()
}

/// Hex form of [`password_digest`].
pub fn password_digest_hex(password: &str) -> String {
    hex::encode(password_digest(password))
}

/// Splits a `Basic` authorization header value into user and password.
pub fn parse_basic_credentials(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    if user.is_empty() {
        return None;
    }
    Some((user.to_string(), password.to_string()))
}

/// Authenticated caller with resolved roles.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub principal: Principal,
}

impl AuthenticatedUser {
    pub fn name(&self) -> &str {
        &self.principal.name
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, ApiError> {
    let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        log::error!("event=auth module=http status=error error_code=missing_app_state");
        ApiError::Internal
    })?;

    let (name, password) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_basic_credentials)
        .ok_or(ApiError::Unauthorized)?;

    if !state.credentials.verify(&name, &password) {
        warn!("event=auth module=http status=denied reason=bad_credentials");
        return Err(ApiError::Unauthorized);
    }

    let principal = state.notes.roles().resolve(&name).map_err(|_| {
        warn!("event=auth module=http status=denied reason=no_role_record");
        ApiError::Forbidden
    })?;
    if principal.roles.is_empty() {
        warn!("event=auth module=http status=denied reason=no_roles");
        return Err(ApiError::Forbidden);
    }

    debug!(
        "event=auth module=http status=ok admin={}",
        principal.is_admin()
    );
    Ok(AuthenticatedUser { principal })
}

#[cfg(test)]
mod tests {
    use super::{parse_basic_credentials, password_digest_hex, CredentialStore};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    #[test]
    fn parses_basic_header() {
        let header = format!("Basic {}", STANDARD.encode("user1:user1$$pwd"));
        assert_eq!(
            parse_basic_credentials(&header),
            Some(("user1".to_string(), "user1$$pwd".to_string()))
        );
    }

    #[test]
    fn password_may_contain_colons() {
        let header = format!("basic {}", STANDARD.encode("user1:a:b"));
        assert_eq!(
            parse_basic_credentials(&header),
            Some(("user1".to_string(), "a:b".to_string()))
        );
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        assert_eq!(parse_basic_credentials("Bearer abc"), None);
        assert_eq!(parse_basic_credentials("Basic !!!"), None);
        let no_colon = format!("Basic {}", STANDARD.encode("user1"));
        assert_eq!(parse_basic_credentials(&no_colon), None);
        let no_user = format!("Basic {}", STANDARD.encode(":pw"));
        assert_eq!(parse_basic_credentials(&no_user), None);
    }

    #[test]
    fn verifies_against_hex_digest() {
        let mut store = CredentialStore::new();
        store
            .insert_digest_hex("user1", &password_digest_hex("secret"))
            .expect("valid digest");
        assert!(store.verify("user1", "secret"));
        assert!(!store.verify("user1", "Secret"));
        assert!(!store.verify("user2", "secret"));
    }

    #[test]
    fn rejects_malformed_digest() {
        let mut store = CredentialStore::new();
        assert!(store.insert_digest_hex("user1", "abcd").is_err());
        assert!(store.insert_digest_hex("user1", "zz").is_err());
    }
}
