//! HTTP middleware components.
//!
//! Middleware run before route handlers. They can authenticate requests,
//! attach context for handlers, or short-circuit with an error.

/// Bearer token authentication middleware
pub mod auth;
