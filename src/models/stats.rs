//! Dashboard statistics.

use serde::Serialize;

use crate::models::review::Review;

/// Review statistics for one hotel.
#[derive(Debug, Serialize)]
pub struct HotelStats {
    pub total_reviews: i64,
    pub reviews_last_30_days: i64,
    pub average_rating: Option<f64>,

    /// Count of rated reviews per rounded star value; index 0 is one star
    pub rating_distribution: [i64; 5],

    pub new_reviews: i64,
    pub read_reviews: i64,
    pub archived_reviews: i64,
    pub active_forms: i64,
    pub qr_scans: i64,
    pub latest_reviews: Vec<Review>,
}

/// Platform-wide statistics for super-admins.
#[derive(Debug, Default, Serialize, sqlx::FromRow)]
pub struct PlatformStats {
    pub total_hotels: i64,
    pub active_hotels: i64,
    pub suspended_hotels: i64,
    pub active_subscriptions: i64,
    pub trialing_subscriptions: i64,
    pub lapsed_subscriptions: i64,
    pub total_reviews: i64,
    pub reviews_last_30_days: i64,
    pub open_support_requests: i64,
}

/// Bucket `(rounded_star, count)` rows into a five-slot distribution.
/// Stars outside 1..=5 are ignored.
pub fn rating_distribution(rows: &[(i32, i64)]) -> [i64; 5] {
    let mut distribution = [0; 5];
    for &(star, count) in rows {
        if (1..=5).contains(&star) {
            distribution[(star - 1) as usize] += count;
        }
    }
    distribution
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribution_fills_slots() {
        let rows = [(5, 10), (3, 2), (1, 1), (0, 7), (6, 1)];
        assert_eq!(rating_distribution(&rows), [1, 0, 2, 0, 10]);
    }
}
