//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added in `main`)
//! 2. `TraceLayer` (request tracing span with `request_id` field)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with `MemoryStore`)
//! 5. Guard extractors on individual handlers

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{
    AuthRejection, OptionalUser, RequireAdmin, RequireBarista, RequireCustomer, RequireRole,
    RequireUser, SignedIn, sign_in, sign_out,
};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
