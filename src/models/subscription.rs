//! Subscription (billing plan) models.
//!
//! Each hotel has exactly one subscription row. Expiry is not driven by a
//! scheduler: the effective status is computed when the row is read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_plan", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    Trial,
    Basic,
    Premium,
    Enterprise,
}

impl SubscriptionPlan {
    pub fn label(self) -> &'static str {
        match self {
            SubscriptionPlan::Trial => "Trial",
            SubscriptionPlan::Basic => "Basic",
            SubscriptionPlan::Premium => "Premium",
            SubscriptionPlan::Enterprise => "Enterprise",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub fn label(self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "Active",
            SubscriptionStatus::Trialing => "Trialing",
            SubscriptionStatus::PastDue => "Past due",
            SubscriptionStatus::Cancelled => "Cancelled",
            SubscriptionStatus::Expired => "Expired",
        }
    }
}

/// Represents a subscription record from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub plan: SubscriptionPlan,
    pub status: SubscriptionStatus,
    pub starts_at: DateTime<Utc>,

    /// Open-ended when `None`
    pub ends_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Status as of `now`: active/trialing periods that ended read as expired.
    pub fn effective_status(&self, now: DateTime<Utc>) -> SubscriptionStatus {
        match self.status {
            SubscriptionStatus::Active | SubscriptionStatus::Trialing
                if self.ends_at.is_some_and(|end| end <= now) =>
            {
                SubscriptionStatus::Expired
            }
            status => status,
        }
    }

    /// Whether guests may currently submit feedback for this hotel.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        matches!(
            self.effective_status(now),
            SubscriptionStatus::Active | SubscriptionStatus::Trialing
        )
    }
}

/// Subscription as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub plan: SubscriptionPlan,
    pub status: SubscriptionStatus,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,

    /// Whole days left in the period, `None` when open-ended or already over
    pub days_remaining: Option<i64>,

    pub updated_at: DateTime<Utc>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(subscription: Subscription) -> Self {
        let now = Utc::now();
        let status = subscription.effective_status(now);
        let days_remaining = subscription
            .ends_at
            .filter(|end| *end > now)
            .map(|end| (end - now).num_days());

        Self {
            id: subscription.id,
            hotel_id: subscription.hotel_id,
            plan: subscription.plan,
            status,
            starts_at: subscription.starts_at,
            ends_at: subscription.ends_at,
            days_remaining,
            updated_at: subscription.updated_at,
        }
    }
}

/// Subscription row joined with its hotel name for the admin overview.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubscriptionWithHotel {
    #[sqlx(flatten)]
    pub subscription: Subscription,
    pub hotel_name: String,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionOverview {
    pub hotel_name: String,
    #[serde(flatten)]
    pub subscription: SubscriptionResponse,
}

impl From<SubscriptionWithHotel> for SubscriptionOverview {
    fn from(row: SubscriptionWithHotel) -> Self {
        Self {
            hotel_name: row.hotel_name,
            subscription: row.subscription.into(),
        }
    }
}

/// Request body for `PUT /api/admin/hotels/{id}/subscription`.
#[derive(Debug, Deserialize)]
pub struct UpsertSubscriptionRequest {
    pub plan: SubscriptionPlan,
    pub status: SubscriptionStatus,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

/// Query parameters for listing subscriptions.
#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionListQuery {
    pub status: Option<SubscriptionStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn subscription(status: SubscriptionStatus, ends_at: Option<DateTime<Utc>>) -> Subscription {
        let now = Utc::now();
        Subscription {
            id: Uuid::new_v4(),
            hotel_id: Uuid::new_v4(),
            plan: SubscriptionPlan::Basic,
            status,
            starts_at: now - Duration::days(30),
            ends_at,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn past_period_reads_as_expired() {
        let now = Utc::now();
        let sub = subscription(SubscriptionStatus::Active, Some(now - Duration::days(1)));
        assert_eq!(sub.effective_status(now), SubscriptionStatus::Expired);
        assert!(!sub.is_usable(now));
    }

    #[test]
    fn open_ended_trial_is_usable() {
        let now = Utc::now();
        let sub = subscription(SubscriptionStatus::Trialing, None);
        assert_eq!(sub.effective_status(now), SubscriptionStatus::Trialing);
        assert!(sub.is_usable(now));
    }

    #[test]
    fn cancelled_stays_cancelled() {
        let now = Utc::now();
        let sub = subscription(SubscriptionStatus::Cancelled, Some(now - Duration::days(1)));
        assert_eq!(sub.effective_status(now), SubscriptionStatus::Cancelled);
        assert!(!sub.is_usable(now));
    }

    #[test]
    fn response_counts_remaining_days() {
        let now = Utc::now();
        let sub = subscription(
            SubscriptionStatus::Active,
            Some(now + Duration::days(10) + Duration::hours(1)),
        );
        let response = SubscriptionResponse::from(sub);
        assert_eq!(response.days_remaining, Some(10));
        assert_eq!(response.status, SubscriptionStatus::Active);
    }
}
