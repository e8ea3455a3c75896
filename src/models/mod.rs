//! Data models representing database entities and API payloads.
//!
//! This module contains all data structures that map to database tables.

/// Hotel (tenant) model
pub mod hotel;
/// Feedback forms and questions
pub mod form;
/// In-app notifications
pub mod notification;
/// Page/limit helpers
pub mod pagination;
/// QR code entry points
pub mod qr_code;
/// Guest reviews and answers
pub mod review;
/// Dashboard statistics
pub mod stats;
/// Subscription plans
pub mod subscription;
/// Support requests
pub mod support;
/// Translation endpoint payloads
pub mod translation;
/// Admin users
pub mod user;
