//! Canned email templates.
//!
//! Bodies are askama templates under `templates/email/`, all extending
//! `base.html`; interpolated values are HTML-escaped by askama.

use askama::Template;

use crate::models::{
    notification::NotificationKind,
    subscription::{SubscriptionPlan, SubscriptionStatus},
    support::SupportStatus,
};

use super::EmailContent;

#[derive(Template)]
#[template(path = "email/welcome.html")]
struct WelcomeEmail<'a> {
    app_name: &'a str,
    admin_name: &'a str,
    hotel_name: &'a str,
    login_email: &'a str,
    temporary_password: &'a str,
    login_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/new_review.html")]
struct NewReviewEmail<'a> {
    app_name: &'a str,
    hotel_name: &'a str,
    form_title: &'a str,
    guest: &'a str,
    room_number: Option<&'a str>,
    rating: Option<String>,
    comment: Option<&'a str>,
    review_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/subscription_changed.html")]
struct SubscriptionChangedEmail<'a> {
    app_name: &'a str,
    hotel_name: &'a str,
    plan: &'static str,
    status: &'static str,
    ends_at: Option<&'a str>,
    note: &'static str,
}

#[derive(Template)]
#[template(path = "email/notification.html")]
struct NotificationEmail<'a> {
    app_name: &'a str,
    hotel_name: &'a str,
    heading: &'static str,
    accent: &'static str,
    title: &'a str,
    message: &'a str,
    dashboard_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/support_received.html")]
struct SupportReceivedEmail<'a> {
    app_name: &'a str,
    requester_name: &'a str,
    subject: &'a str,
}

#[derive(Template)]
#[template(path = "email/support_response.html")]
struct SupportResponseEmail<'a> {
    app_name: &'a str,
    requester_name: &'a str,
    subject: &'a str,
    status: &'static str,
    response: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetEmail<'a> {
    app_name: &'a str,
    name: &'a str,
    reset_url: &'a str,
    ttl_minutes: i64,
}

/// Sent to a new hotel admin with their temporary password.
pub fn welcome(
    app_name: &str,
    admin_name: &str,
    hotel_name: &str,
    login_email: &str,
    temporary_password: &str,
    login_url: &str,
) -> askama::Result<EmailContent> {
    let html = WelcomeEmail {
        app_name,
        admin_name,
        hotel_name,
        login_email,
        temporary_password,
        login_url,
    }
    .render()?;

    Ok(EmailContent {
        subject: format!("Welcome to {app_name}"),
        html,
    })
}

/// Sent to hotel admins when a guest submits a review.
#[allow(clippy::too_many_arguments)]
pub fn new_review(
    app_name: &str,
    hotel_name: &str,
    form_title: &str,
    guest_name: Option<&str>,
    room_number: Option<&str>,
    rating: Option<f64>,
    comment: Option<&str>,
    review_url: &str,
) -> askama::Result<EmailContent> {
    let html = NewReviewEmail {
        app_name,
        hotel_name,
        form_title,
        guest: guest_name.unwrap_or("An anonymous guest"),
        room_number,
        rating: rating.map(|r| format!("{r:.1}")),
        comment,
        review_url,
    }
    .render()?;

    let subject = match rating {
        Some(r) => format!("New review for {hotel_name} ({r:.1}/5)"),
        None => format!("New review for {hotel_name}"),
    };

    Ok(EmailContent { subject, html })
}

/// Sent to hotel admins when their subscription changes.
pub fn subscription_changed(
    app_name: &str,
    hotel_name: &str,
    plan: SubscriptionPlan,
    status: SubscriptionStatus,
    ends_at: Option<&str>,
) -> askama::Result<EmailContent> {
    let note = match status {
        SubscriptionStatus::Active => "Your subscription is active. Thank you!",
        SubscriptionStatus::Trialing => "You are on a free trial.",
        SubscriptionStatus::PastDue => {
            "We could not process your latest payment. Please update your billing details."
        }
        SubscriptionStatus::Cancelled => {
            "Your subscription has been cancelled. Guests can no longer submit feedback."
        }
        SubscriptionStatus::Expired => {
            "Your subscription has expired. Renew it to keep collecting feedback."
        }
    };

    let html = SubscriptionChangedEmail {
        app_name,
        hotel_name,
        plan: plan.label(),
        status: status.label(),
        ends_at,
        note,
    }
    .render()?;

    Ok(EmailContent {
        subject: format!("{hotel_name}: subscription {}", status.label().to_lowercase()),
        html,
    })
}

/// Email accompanying an in-app notification; heading and accent depend on the kind.
pub fn notification(
    app_name: &str,
    hotel_name: &str,
    kind: NotificationKind,
    title: &str,
    message: &str,
    dashboard_url: &str,
) -> askama::Result<EmailContent> {
    let (heading, subject_prefix, accent) = match kind {
        NotificationKind::Info => ("Information", "Info", "#2563eb"),
        NotificationKind::Warning => ("Important notice", "Action needed", "#d97706"),
        NotificationKind::Subscription => ("Subscription notice", "Subscription", "#7c3aed"),
        NotificationKind::Review => ("Review activity", "Reviews", "#059669"),
        NotificationKind::System => ("System announcement", "System", "#4b5563"),
    };

    let html = NotificationEmail {
        app_name,
        hotel_name,
        heading,
        accent,
        title,
        message,
        dashboard_url,
    }
    .render()?;

    Ok(EmailContent {
        subject: format!("[{subject_prefix}] {title}"),
        html,
    })
}

/// Confirmation sent to a hotel admin who opened a support request.
pub fn support_received(app_name: &str, requester_name: &str, subject: &str) -> askama::Result<EmailContent> {
    let html = SupportReceivedEmail {
        app_name,
        requester_name,
        subject,
    }
    .render()?;

    Ok(EmailContent {
        subject: format!("We received your request: {subject}"),
        html,
    })
}

/// Sent when support answers or changes the status of a request.
pub fn support_response(
    app_name: &str,
    requester_name: &str,
    subject: &str,
    status: SupportStatus,
    response: Option<&str>,
) -> askama::Result<EmailContent> {
    let html = SupportResponseEmail {
        app_name,
        requester_name,
        subject,
        status: status.label(),
        response,
    }
    .render()?;

    Ok(EmailContent {
        subject: format!("Re: {subject}"),
        html,
    })
}

/// Password reset link.
pub fn password_reset(
    app_name: &str,
    name: &str,
    reset_url: &str,
    ttl_minutes: i64,
) -> askama::Result<EmailContent> {
    let html = PasswordResetEmail {
        app_name,
        name,
        reset_url,
        ttl_minutes,
    }
    .render()?;

    Ok(EmailContent {
        subject: format!("Reset your {app_name} password"),
        html,
    })
}
