//! Session middleware configuration for the back-office.
//!
//! Admin sessions are kept apart from shopper sessions, in
//! `tower_sessions.admin_session`, with SameSite=Strict and a 24 hour idle
//! expiry. `patra-cli migrate` creates the table. The cookie is signed with
//! a key derived from `ADMIN_SESSION_SECRET`.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use sqlx::PgPool;
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AdminConfig;

/// Session cookie name for the back-office.
pub const SESSION_COOKIE_NAME: &str = "patra_admin_session";

/// Table holding admin sessions.
pub const SESSION_TABLE: &str = "admin_session";

/// Idle time before an admin session expires (24 hours).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// The admin session store.
///
/// # Panics
///
/// Never; the table name is a valid constant identifier.
#[must_use]
pub fn session_store(pool: &PgPool) -> PostgresStore {
    PostgresStore::new(pool.clone())
        .with_table_name(SESSION_TABLE)
        .expect("valid table name")
}

/// SHA-512 of the secret, the 64 bytes a cookie `Key` is built from.
fn signing_key(secret: &SecretString) -> Key {
    Key::from(Sha512::digest(secret.expose_secret().as_bytes()).as_slice())
}

/// Create the session layer with `PostgreSQL` store.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &AdminConfig,
) -> SessionManagerLayer<PostgresStore, SignedCookie> {
    SessionManagerLayer::new(session_store(pool))
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.base_url.starts_with("https://"))
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(&config.session_secret))
}
