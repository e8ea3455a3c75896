//! Business logic services.
//!
//! Services contain the business rules separated from HTTP handlers.
//! They own database transactions, outgoing email and translation.

pub mod auth_service;
pub mod form_service;
pub mod hotel_service;
pub mod mail;
pub mod notification_service;
pub mod qr_service;
pub mod review_service;
pub mod stats_service;
pub mod subscription_service;
pub mod support_service;
pub mod translation_service;
