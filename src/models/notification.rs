use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of a notification, as assigned by the server.
///
/// Unrecognized values deserialize as [`Unknown`](Self::Unknown) so that new
/// server-side categories never break frame parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    /// A reservation was created.
    ReservationNew,
    /// A reservation was confirmed by the restaurant.
    ReservationConfirmed,
    /// A reservation was cancelled.
    ReservationCancelled,
    /// A reservation was completed.
    ReservationCompleted,
    /// A waitlist entry was created.
    WaitingNew,
    /// A waitlist entry was called.
    WaitingCalled,
    /// A waitlist entry was cancelled.
    WaitingCancelled,
    /// Someone started following the user.
    NewFollower,
    /// A new review was posted.
    NewReview,
    /// Any category this client version does not know about.
    #[serde(other)]
    Unknown,
}

/// A single notification record.
///
/// Created by REST hydration or a live push; `id` is `None` until the server
/// has assigned one (pushes for freshly generated notifications may arrive
/// before persistence).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Server-assigned identifier; `None` until persisted.
    pub id: Option<i64>,
    /// Notification category.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Short title.
    pub title: String,
    /// Human-readable body.
    pub message: String,
    /// Kind of entity this notification refers to (e.g. "RESERVATION").
    #[serde(default)]
    pub reference_type: Option<String>,
    /// Identifier of the referred entity.
    #[serde(default)]
    pub reference_id: Option<i64>,
    /// Deep link into the host application.
    #[serde(default)]
    pub link_url: Option<String>,
    /// Whether the user has read this notification.
    pub is_read: bool,
    /// Server-side creation time.
    pub created_at: DateTime<Utc>,
    /// Nickname of the user who triggered the notification, if any.
    #[serde(default)]
    pub sender_nickname: Option<String>,
    /// Profile image URL of the triggering user, if any.
    #[serde(default)]
    pub sender_profile_image: Option<String>,
}
