//! Hotel (tenant) data models and API request/response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{subscription::SubscriptionResponse, user::UserResponse};

/// Lifecycle status of a hotel. `Deleted` is a soft delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "hotel_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HotelStatus {
    Active,
    Suspended,
    Deleted,
}

/// Represents a hotel record from the database.
///
/// # Database Table
///
/// Maps to the `hotels` table. Every form, review, QR code, notification
/// and support request belongs to exactly one hotel.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Hotel {
    pub id: Uuid,
    pub name: String,

    /// URL-friendly unique identifier derived from the name
    pub slug: String,

    /// Contact address of the hotel (not necessarily an admin login)
    pub email: String,

    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,

    /// Language forms are authored in; guests asking for another language get translations
    pub default_language: String,

    pub status: HotelStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for `POST /api/admin/hotels`.
///
/// Creates the hotel and its first admin account in one step.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateHotelRequest {
    #[validate(length(min = 1, max = 200, message = "Hotel name must be 1-200 characters"))]
    pub name: String,

    #[validate(email(message = "Hotel email is invalid"))]
    pub email: String,

    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: Option<String>,

    pub address: Option<String>,

    #[validate(length(max = 120, message = "City must be at most 120 characters"))]
    pub city: Option<String>,

    #[validate(length(max = 120, message = "Country must be at most 120 characters"))]
    pub country: Option<String>,

    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,

    #[validate(url(message = "Logo URL must be a valid URL"))]
    pub logo_url: Option<String>,

    pub default_language: Option<String>,

    #[validate(length(min = 1, max = 200, message = "Admin name must be 1-200 characters"))]
    pub admin_name: String,

    #[validate(email(message = "Admin email is invalid"))]
    pub admin_email: String,
}

/// Request body for `PUT /api/hotels/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateHotelRequest {
    #[validate(length(min = 1, max = 200, message = "Hotel name must be 1-200 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Hotel email is invalid"))]
    pub email: Option<String>,

    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: Option<String>,

    pub address: Option<String>,

    #[validate(length(max = 120, message = "City must be at most 120 characters"))]
    pub city: Option<String>,

    #[validate(length(max = 120, message = "Country must be at most 120 characters"))]
    pub country: Option<String>,

    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,

    #[validate(url(message = "Logo URL must be a valid URL"))]
    pub logo_url: Option<String>,

    pub default_language: Option<String>,
}

/// Request body for `PATCH /api/admin/hotels/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct UpdateHotelStatusRequest {
    pub status: HotelStatus,
}

/// Query parameters for listing hotels.
#[derive(Debug, Default, Deserialize)]
pub struct HotelListQuery {
    /// Case-insensitive match on name, city or email
    pub search: Option<String>,
    pub status: Option<HotelStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Response for hotel creation: the hotel, its admin and trial subscription.
#[derive(Debug, Serialize)]
pub struct CreateHotelResponse {
    pub hotel: Hotel,
    pub admin: UserResponse,
    pub subscription: SubscriptionResponse,
}

/// Derive a URL slug from a hotel name: lowercase ASCII alphanumerics
/// separated by single hyphens.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        slug.push_str("hotel");
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Grand Hotel  & Spa"), "grand-hotel-spa");
        assert_eq!(slugify("  --Seaside--Inn-- "), "seaside-inn");
        assert_eq!(slugify("Hôtel Étoile"), "h-tel-toile");
    }

    #[test]
    fn slugify_never_empty() {
        assert_eq!(slugify("***"), "hotel");
    }
}
