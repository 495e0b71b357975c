//! Session middleware configuration.
//!
//! Sessions are stored in `PostgreSQL` via tower-sessions. The store's table
//! is created by `patra-cli migrate`. The cookie carrying the session id is
//! signed with a key derived from `STOREFRONT_SESSION_SECRET`.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use sqlx::PgPool;
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "patra_session";

/// Idle time before a session expires (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Cookie signing key. SHA-512 stretches the secret to the 64 bytes
/// `Key` needs.
fn signing_key(secret: &SecretString) -> Key {
    Key::from(Sha512::digest(secret.expose_secret().as_bytes()).as_slice())
}

/// Create the session layer with `PostgreSQL` store.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore, SignedCookie> {
    let store = PostgresStore::new(pool.clone());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.base_url.starts_with("https://"))
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(&config.session_secret))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_key_follows_secret() {
        let secret = SecretString::from("q8Zt#4vLm!2pXr7Nc@9sWd5Ky&1bHf3J");
        let key = signing_key(&secret);

        assert!(key == signing_key(&secret.clone()));
        assert!(key != signing_key(&SecretString::from("Tn6&wQ1z!Rb8Lx#3Pc5Vm@0Hy7Kd2Gs9")));
        assert_eq!(key.signing().len(), 32);
    }
}
