//! In-memory notification ledger with unread accounting.
//!
//! The ledger is ordered newest-first **by insertion**, not by `created_at`:
//! a late-arriving push always lands at the head regardless of its
//! timestamp. The unread counter is kept incrementally (increment on unread
//! push, decrement floored at zero on read) and recomputed from scratch on
//! every hydration, so `unread_count == count(!is_read)` holds after every
//! `hydrate()`.
//!
//! Read/delete mutations are optimistic: the local change is applied first
//! and the remote call fired afterwards; a remote failure does **not** roll
//! the local change back (the error is returned so hosts can show a
//! transient notice). Pushes are never deduplicated against ids already
//! present from hydration.

use crate::{error::Result, models::Notification, rest::NotificationApi};
use log::{debug, warn};
use std::sync::RwLock;

/// Pure ledger state. All invariant-carrying mutations live here so they
/// can be exercised without any I/O.
#[derive(Default)]
struct Ledger {
    /// Newest-first by insertion.
    entries: Vec<Notification>,
    unread: u64,
}

impl Ledger {
    /// Replace the ledger contents and recount unread from scratch.
    fn hydrate(&mut self, entries: Vec<Notification>) {
        self.unread = entries.iter().filter(|n| !n.is_read).count() as u64;
        self.entries = entries;
    }

    /// Prepend a pushed notification. No dedup against existing ids.
    fn push(&mut self, notification: Notification) {
        if !notification.is_read {
            self.unread += 1;
        }
        self.entries.insert(0, notification);
    }

    /// Flip one entry to read. Decrements the unread counter only when the
    /// flip changed state, flooring at zero.
    fn mark_read(&mut self, id: i64) {
        for entry in &mut self.entries {
            if entry.id == Some(id) && !entry.is_read {
                entry.is_read = true;
                self.unread = self.unread.saturating_sub(1);
            }
        }
    }

    /// Flip every entry to read and zero the counter.
    fn mark_all_read(&mut self) {
        for entry in &mut self.entries {
            entry.is_read = true;
        }
        self.unread = 0;
    }

    /// Remove an entry. The unread counter is left untouched; the next
    /// hydration reconciles it.
    fn remove(&mut self, id: i64) {
        self.entries.retain(|n| n.id != Some(id));
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.unread = 0;
    }
}

/// Ordered notification ledger fed by REST hydration and live pushes.
pub struct NotificationStore {
    api: NotificationApi,
    ledger: RwLock<Ledger>,
}

impl NotificationStore {
    pub(crate) fn new(api: NotificationApi) -> Self {
        Self {
            api,
            ledger: RwLock::new(Ledger::default()),
        }
    }

    /// Replace the ledger with the latest page from the server and recompute
    /// the unread counter from scratch.
    pub async fn hydrate(&self, page_size: u32) -> Result<()> {
        let page = self.api.list(page_size).await?;
        debug!(
            "[STORE] Hydrated {} notification(s) (of {} total)",
            page.content.len(),
            page.total_elements
        );
        self.ledger
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .hydrate(page.content);
        Ok(())
    }

    /// Record a live push. Called by the dispatcher.
    pub(crate) fn receive_push(&self, notification: Notification) {
        self.ledger
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification);
    }

    /// Mark one notification as read: optimistic local flip, then the
    /// remote call. The local flip is not rolled back on remote failure.
    pub async fn mark_as_read(&self, id: i64) -> Result<()> {
        self.ledger
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .mark_read(id);

        if let Err(e) = self.api.mark_read(id).await {
            warn!("[STORE] Remote mark-read for {} failed: {}", id, e);
            return Err(e);
        }
        Ok(())
    }

    /// Mark every notification as read; same optimistic semantics.
    pub async fn mark_all_as_read(&self) -> Result<()> {
        self.ledger
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .mark_all_read();

        if let Err(e) = self.api.mark_all_read().await {
            warn!("[STORE] Remote mark-all-read failed: {}", e);
            return Err(e);
        }
        Ok(())
    }

    /// Delete a notification locally, then remotely; same optimistic
    /// semantics. The unread counter is not adjusted; the next hydration
    /// reconciles it.
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.ledger
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id);

        if let Err(e) = self.api.delete(id).await {
            warn!("[STORE] Remote delete for {} failed: {}", id, e);
            return Err(e);
        }
        Ok(())
    }

    /// Overwrite the unread counter with the server-side value.
    ///
    /// The ledger holds only one page, so the locally derived counter can
    /// undercount; this pulls the authoritative number.
    pub async fn refresh_unread_count(&self) -> Result<u64> {
        let count = self.api.unread_count().await?;
        self.ledger
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .unread = count;
        Ok(count)
    }

    /// Snapshot of the ledger, newest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.ledger
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .clone()
    }

    /// Current unread counter. Never negative by construction.
    pub fn unread_count(&self) -> u64 {
        self.ledger.read().unwrap_or_else(|e| e.into_inner()).unread
    }

    /// Drop all local state. Called on session end.
    pub(crate) fn clear(&self) {
        self.ledger
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationKind;
    use chrono::{TimeZone, Utc};

    fn notification(id: Option<i64>, is_read: bool) -> Notification {
        Notification {
            id,
            kind: NotificationKind::ReservationNew,
            title: "title".to_string(),
            message: "message".to_string(),
            reference_type: None,
            reference_id: None,
            link_url: None,
            is_read,
            created_at: Utc.with_ymd_and_hms(2025, 4, 2, 12, 0, 0).unwrap(),
            sender_nickname: None,
            sender_profile_image: None,
        }
    }

    fn invariant_holds(ledger: &Ledger) -> bool {
        ledger.unread == ledger.entries.iter().filter(|n| !n.is_read).count() as u64
    }

    #[test]
    fn test_hydrate_recounts_from_scratch() {
        let mut ledger = Ledger::default();
        ledger.unread = 99; // poisoned counter must not survive hydration
        ledger.hydrate(vec![
            notification(Some(1), false),
            notification(Some(2), true),
            notification(Some(3), false),
        ]);
        assert_eq!(ledger.unread, 2);
        assert!(invariant_holds(&ledger));
    }

    #[test]
    fn test_push_prepends_newest_first() {
        let mut ledger = Ledger::default();
        ledger.push(notification(Some(1), false)); // A
        ledger.push(notification(Some(2), false)); // B
        let ids: Vec<_> = ledger.entries.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![Some(2), Some(1)]);
        assert_eq!(ledger.unread, 2);
    }

    #[test]
    fn test_push_of_read_notification_does_not_increment() {
        let mut ledger = Ledger::default();
        ledger.push(notification(Some(1), true));
        assert_eq!(ledger.unread, 0);
    }

    #[test]
    fn test_push_without_id_is_accepted() {
        let mut ledger = Ledger::default();
        ledger.push(notification(None, false));
        assert_eq!(ledger.entries.len(), 1);
        assert_eq!(ledger.unread, 1);
    }

    #[test]
    fn test_ledger_allows_duplicate_ids() {
        // Pushes are not deduplicated against hydrated entries.
        let mut ledger = Ledger::default();
        ledger.hydrate(vec![notification(Some(7), false)]);
        ledger.push(notification(Some(7), false));
        assert_eq!(ledger.entries.len(), 2);
        assert_eq!(ledger.unread, 2);
    }

    #[test]
    fn test_mark_read_decrements_once() {
        let mut ledger = Ledger::default();
        ledger.hydrate(vec![notification(Some(1), false)]);
        ledger.mark_read(1);
        assert_eq!(ledger.unread, 0);
        assert!(ledger.entries[0].is_read);

        // A second mark of the same id must not underflow or drift.
        ledger.mark_read(1);
        assert_eq!(ledger.unread, 0);
        assert!(invariant_holds(&ledger));
    }

    #[test]
    fn test_mark_read_unknown_id_is_noop() {
        let mut ledger = Ledger::default();
        ledger.hydrate(vec![notification(Some(1), false)]);
        ledger.mark_read(999);
        assert_eq!(ledger.unread, 1);
        assert!(invariant_holds(&ledger));
    }

    #[test]
    fn test_mark_all_read_zeroes_counter() {
        let mut ledger = Ledger::default();
        ledger.hydrate(vec![
            notification(Some(1), false),
            notification(Some(2), false),
            notification(Some(3), true),
        ]);
        ledger.mark_all_read();
        assert_eq!(ledger.unread, 0);
        assert!(ledger.entries.iter().all(|n| n.is_read));
    }

    #[test]
    fn test_delete_does_not_adjust_unread_count() {
        // Deleting an unread notification leaves the counter untouched
        // until the next hydration.
        let mut ledger = Ledger::default();
        ledger.hydrate(vec![
            notification(Some(1), false),
            notification(Some(2), true),
        ]);
        ledger.remove(1);
        assert_eq!(ledger.entries.len(), 1);
        assert_eq!(ledger.unread, 1);
    }

    #[test]
    fn test_counter_never_negative_under_any_sequence() {
        let mut ledger = Ledger::default();
        ledger.mark_read(1);
        ledger.mark_all_read();
        assert_eq!(ledger.unread, 0);

        ledger.push(notification(Some(1), false));
        ledger.mark_all_read();
        ledger.mark_read(1);
        assert_eq!(ledger.unread, 0);

        ledger.push(notification(Some(2), false));
        ledger.push(notification(Some(3), true));
        ledger.mark_read(3);
        ledger.mark_read(2);
        assert_eq!(ledger.unread, 0);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut ledger = Ledger::default();
        ledger.hydrate(vec![notification(Some(1), false)]);
        ledger.clear();
        assert!(ledger.entries.is_empty());
        assert_eq!(ledger.unread, 0);
    }
}
