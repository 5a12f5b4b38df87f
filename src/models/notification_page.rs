use serde::{Deserialize, Serialize};

use super::notification::Notification;

/// One page of the notification listing endpoint.
///
/// The server wraps results in a standard page envelope; only the fields
/// the client consumes are modeled, everything else is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    /// Notifications in this page, newest first.
    #[serde(default)]
    pub content: Vec<Notification>,
    /// Total number of notifications across all pages.
    #[serde(default)]
    pub total_elements: u64,
    /// Total number of pages.
    #[serde(default)]
    pub total_pages: u32,
    /// Zero-based index of this page.
    #[serde(default)]
    pub number: u32,
    /// Requested page size.
    #[serde(default)]
    pub size: u32,
}
