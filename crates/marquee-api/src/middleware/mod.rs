//! HTTP middleware
//!
//! Authentication lives in `crate::auth::middleware`; this module holds the
//! response-side layers.

pub mod security_headers;

pub use security_headers::security_headers_middleware;
