//! HTTP request handlers (route handlers).
//!
//! Each handler extracts request data, checks the caller's access, calls
//! into a service and maps the result to a JSON response.

pub mod admin;
pub mod auth;
pub mod forms;
pub mod health;
pub mod hotels;
pub mod notifications;
pub mod public;
pub mod qr_codes;
pub mod reviews;
pub mod subscriptions;
pub mod support;
pub mod translate;
