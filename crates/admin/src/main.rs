//! Patra back-office - the merchant's administration API.
//!
//! Serves on port 3001 by default, over HTTPS when `ADMIN_TLS_CERT` and
//! `ADMIN_TLS_KEY` are set.
//!
//! # Architecture
//!
//! - Axum JSON API, admin sessions in `PostgreSQL`
//! - Shares the `shop` schema with the storefront
//! - Product images in Supabase-style object storage
//! - Razorpay refunds when gateway keys are configured
//!
//! Migrations are not run on startup; use `patra-cli migrate`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::borrow::Cow;
use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::connect_info::IntoMakeServiceWithConnectInfo;
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use secrecy::ExposeSecret;
use sentry::integrations::tracing::{self as sentry_tracing, EventFilter};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use patra_admin::config::{AdminConfig, TlsConfig};
use patra_admin::state::AppState;
use patra_admin::{app, db};

/// In-flight requests get this long to finish after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

type AdminService = IntoMakeServiceWithConnectInfo<axum::Router, SocketAddr>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // rustls needs a process-wide provider before any TLS config is built.
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "failed to install rustls crypto provider")?;

    let config = AdminConfig::from_env()?;
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    let addr = config.socket_addr();
    let tls = config.tls.clone();
    tracing::info!(
        refunds = config.razorpay.is_some(),
        bucket = %config.storage.bucket,
        tls = tls.is_some(),
        "Configuration loaded"
    );

    let service: AdminService =
        app(AppState::new(config, pool)?).into_make_service_with_connect_info();

    match tls {
        Some(tls) => serve_https(addr, &tls, service).await,
        None => serve_http(addr, service).await,
    }
}

async fn serve_https(
    addr: SocketAddr,
    tls: &TlsConfig,
    service: AdminService,
) -> Result<(), Box<dyn std::error::Error>> {
    let rustls = RustlsConfig::from_pem(
        tls.cert_pem.clone().into_bytes(),
        tls.key_pem.expose_secret().as_bytes().to_vec(),
    )
    .await?;

    let handle = Handle::new();
    let drain = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        drain.graceful_shutdown(Some(DRAIN_TIMEOUT));
    });

    tracing::info!("admin listening on https://{addr}");
    axum_server::bind_rustls(addr, rustls)
        .handle(handle)
        .serve(service)
        .await?;
    Ok(())
}

async fn serve_http(addr: SocketAddr, service: AdminService) -> Result<(), Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("admin listening on http://{addr}");
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Returns the guard that flushes Sentry on drop, or `None` without a DSN.
fn init_sentry(config: &AdminConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_deref()?;
    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config.sentry_environment.clone().map(Cow::Owned),
            send_default_pii: false,
            traces_sample_rate: 0.1,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));
    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Flattened JSON lines on Fly.io, human-readable text elsewhere. Warnings
/// and errors also go to Sentry.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "patra_admin=info,tower_http=debug".into());

    let on_fly = std::env::var_os("FLY_APP_NAME").is_some();
    let json = on_fly.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text = (!on_fly).then(tracing_subscriber::fmt::layer);

    let to_sentry = sentry_tracing::layer().event_filter(|meta| match *meta.level() {
        Level::ERROR | Level::WARN => EventFilter::Event,
        Level::INFO | Level::DEBUG => EventFilter::Breadcrumb,
        _ => EventFilter::Ignore,
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .with(to_sentry)
        .init();
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutting down, draining open requests");
}
