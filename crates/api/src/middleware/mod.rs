//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Path normalization (trailing slashes, applied outside the router)
//! 2. Sentry layers (hub per request, HTTP transaction)
//! 3. `CatchPanicLayer` (panics become enveloped 500s)
//! 4. `TraceLayer` (request span with `request_id` and `user_id` fields)
//! 5. Request ID
//! 6. Security headers
//! 7. CORS
//! 8. Rate limiting (per route group)

pub mod auth;
pub mod panic;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{RequireAuth, RequireStaff};
pub use panic::handle_panic;
pub use rate_limit::{auth_rate_limiter, catalog_rate_limiter, envelope_rate_limited};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
