//! Database migration command.
//!
//! Applies the `shop` schema from `crates/storefront/migrations/`, then the
//! tower-sessions tables for shoppers (`tower_sessions.session`) and admins
//! (`tower_sessions.admin_session`).

use tower_sessions_sqlx_store::PostgresStore;

/// Run every migration.
///
/// # Errors
///
/// Returns an error if the connection or any migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;

    tracing::info!("Running shop migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Creating session tables...");
    PostgresStore::new(pool.clone()).migrate().await?;
    patra_admin::middleware::session_store(&pool).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
