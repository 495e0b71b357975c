//! HTTP middleware stack for the back-office.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request tracing with latency)
//! 3. Request ID
//! 4. Security headers (adds HSTS)
//! 5. Session layer (`admin_session` table, SameSite=Strict)
//!
//! Admin checks happen in the [`RequireAdmin`] extractor, not a layer, so
//! `/api/auth/login` stays reachable.

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{RequireAdmin, clear_current_admin, set_current_admin};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, session_store};
