//! The notification aggregation feed.
//!
//! Feeds from two directions: push events applied incrementally, and a
//! periodic REST snapshot that replaces the working set wholesale. The
//! working set is version-stamped; every push mutation bumps the version,
//! and a refresh whose fetch overlapped a push mutation discards its
//! snapshot (push wins, the next periodic refresh reconciles).

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use beacon_core::config::FeedConfig;
use beacon_core::types::{NotificationItem, NotificationKind};
use beacon_core::{AppError, AppResult};
use beacon_protocol::events::{InboundEvent, PushEvent, PushEventKind};
use beacon_protocol::normalize;
use beacon_realtime::PushClient;

use crate::api::NotificationApi;
use crate::notifier::SystemNotifier;
use crate::read_state::ReadStateStore;
use crate::toast::{Toast, ToastRack};

struct WorkingSet {
    incidents: Vec<NotificationItem>,
    welfare: Vec<NotificationItem>,
    /// Bumped on every push mutation; stale-refresh guard.
    version: u64,
}

impl WorkingSet {
    fn iter(&self) -> impl Iterator<Item = &NotificationItem> + '_ {
        self.incidents.iter().chain(self.welfare.iter())
    }
}

/// De-duplicated, freshness-ranked, read/unread-aware notification feed.
pub struct NotificationFeed {
    config: FeedConfig,
    api: Arc<dyn NotificationApi>,
    store: Arc<dyn ReadStateStore>,
    notifier: Arc<dyn SystemNotifier>,
    set: Mutex<WorkingSet>,
    read: Mutex<HashSet<String>>,
    toasts: Arc<ToastRack>,
}

impl std::fmt::Debug for NotificationFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationFeed").finish()
    }
}

impl NotificationFeed {
    /// Creates a feed, loading persisted read state from the store.
    pub fn new(
        config: FeedConfig,
        api: Arc<dyn NotificationApi>,
        store: Arc<dyn ReadStateStore>,
        notifier: Arc<dyn SystemNotifier>,
    ) -> Self {
        let read = store.load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load read state; starting empty");
            HashSet::new()
        });

        Self {
            toasts: Arc::new(ToastRack::new(config.toast_ttl())),
            config,
            api,
            store,
            notifier,
            set: Mutex::new(WorkingSet {
                incidents: Vec::new(),
                welfare: Vec::new(),
                version: 0,
            }),
            read: Mutex::new(read),
        }
    }

    fn lock_set(&self) -> MutexGuard<'_, WorkingSet> {
        self.set.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_read(&self) -> MutexGuard<'_, HashSet<String>> {
        self.read.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Subscribes this feed to a push client's event stream.
    pub fn attach(self: &Arc<Self>, client: &PushClient) {
        for kind in [
            PushEventKind::NewIncident,
            PushEventKind::NewWelfareReport,
            PushEventKind::IncidentUpdated,
            PushEventKind::WelfareUpdated,
        ] {
            let feed = self.clone();
            client.on(kind, move |inbound| feed.apply_push(inbound));
        }
    }

    /// Applies one push event to the working set.
    pub fn apply_push(&self, inbound: &InboundEvent) {
        match &inbound.event {
            PushEvent::NewIncident(payload) => {
                let item = normalize::incident_from_payload(payload, inbound.received_at);
                self.apply_new(item, self.config.incident_cap, |existing| {
                    normalize::merge_incident_into(existing, payload)
                });
            }
            PushEvent::NewWelfareReport(payload) => {
                let item = normalize::welfare_from_payload(payload, inbound.received_at);
                self.apply_new(item, self.config.welfare_cap, |existing| {
                    normalize::merge_welfare_into(existing, payload)
                });
            }
            PushEvent::IncidentUpdated(payload) => {
                self.apply_update(NotificationKind::Incident, &payload.id.to_string(), |existing| {
                    normalize::merge_incident_into(existing, payload)
                });
            }
            PushEvent::WelfareUpdated(payload) => {
                self.apply_update(
                    NotificationKind::Welfare,
                    &NotificationItem::welfare_id(payload.report_id),
                    |existing| normalize::merge_welfare_into(existing, payload),
                );
            }
        }
    }

    /// Inserts a genuinely-new item at the head of its list (evicting past
    /// the cap) and announces it. A delivery whose id already exists merges
    /// in place instead: no append, no toast, no native notification.
    fn apply_new(
        &self,
        item: NotificationItem,
        cap: usize,
        merge: impl FnOnce(&mut NotificationItem),
    ) {
        let merged = {
            let mut set = self.lock_set();
            let list = match item.kind {
                NotificationKind::Incident => &mut set.incidents,
                NotificationKind::Welfare => &mut set.welfare,
            };
            let merged = if let Some(existing) = list.iter_mut().find(|e| e.id == item.id) {
                merge(existing);
                true
            } else {
                list.insert(0, item.clone());
                list.truncate(cap);
                false
            };
            set.version += 1;
            merged
        };

        if merged {
            debug!(id = %item.id, "Duplicate delivery merged into existing notification");
            return;
        }

        self.notifier.notify(&item);
        self.toasts.push(Toast::from_item(&item));
        debug!(id = %item.id, "Notification added from push");
    }

    /// Merges an update into the matching item, preserving list order.
    fn apply_update(
        &self,
        kind: NotificationKind,
        id: &str,
        merge: impl FnOnce(&mut NotificationItem),
    ) {
        let mut set = self.lock_set();
        let list = match kind {
            NotificationKind::Incident => &mut set.incidents,
            NotificationKind::Welfare => &mut set.welfare,
        };
        let found = if let Some(existing) = list.iter_mut().find(|e| e.id == id) {
            merge(existing);
            true
        } else {
            false
        };
        if found {
            set.version += 1;
        } else {
            debug!(id, "Update for a notification not in the working set; ignoring");
        }
    }

    /// Full REST resync.
    ///
    /// The unified listing is authoritative; on its failure the two legacy
    /// listings are fetched concurrently with independent failure isolation.
    /// Total failure of every path leaves the previous working set untouched.
    pub async fn refresh(&self) -> AppResult<()> {
        let version_before = self.lock_set().version;
        let fetched_at = Utc::now();

        let rows = match self.api.list_notifications(self.config.page_size).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "Unified notification listing failed; trying legacy endpoints");
                return self.refresh_legacy(version_before, fetched_at).await;
            }
        };

        let mut seen = HashSet::new();
        let mut incidents = Vec::new();
        let mut welfare = Vec::new();
        for dto in &rows {
            let Some(item) = normalize::item_from_rest(dto, fetched_at) else {
                continue;
            };
            if !seen.insert(item.id.clone()) {
                continue;
            }
            match item.kind {
                NotificationKind::Incident => incidents.push(item),
                NotificationKind::Welfare => welfare.push(item),
            }
        }

        self.install_snapshot(version_before, Some(incidents), Some(welfare));
        Ok(())
    }

    async fn refresh_legacy(
        &self,
        version_before: u64,
        fetched_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let (incidents_result, welfare_result) =
            tokio::join!(self.api.recent_incidents(), self.api.welfare_needing_help());

        if let (Err(incident_err), Err(welfare_err)) = (&incidents_result, &welfare_result) {
            return Err(AppError::api(format!(
                "All notification sources failed: {incident_err}; {welfare_err}"
            )));
        }

        let incidents: Option<Vec<NotificationItem>> = match incidents_result {
            Ok(payloads) => Some(
                payloads
                    .iter()
                    .map(|p| normalize::incident_from_payload(p, fetched_at))
                    .collect(),
            ),
            Err(e) => {
                warn!(error = %e, "Legacy incident listing failed");
                None
            }
        };
        let welfare: Option<Vec<NotificationItem>> = match welfare_result {
            Ok(payloads) => Some(
                payloads
                    .iter()
                    .map(|p| normalize::welfare_from_payload(p, fetched_at))
                    .collect(),
            ),
            Err(e) => {
                warn!(error = %e, "Legacy welfare listing failed");
                None
            }
        };

        self.install_snapshot(version_before, incidents, welfare);
        Ok(())
    }

    /// Replaces the fetched halves of the working set, unless a push event
    /// landed while the fetch was in flight. Read state is pruned only on a
    /// full (both-halves) refresh.
    fn install_snapshot(
        &self,
        version_before: u64,
        incidents: Option<Vec<NotificationItem>>,
        welfare: Option<Vec<NotificationItem>>,
    ) {
        let full = incidents.is_some() && welfare.is_some();
        let mut set = self.lock_set();
        if set.version != version_before {
            info!("Discarding refresh snapshot superseded by push events");
            return;
        }

        if let Some(mut incidents) = incidents {
            incidents.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
            incidents.truncate(self.config.incident_cap);
            set.incidents = incidents;
        }
        if let Some(mut welfare) = welfare {
            welfare.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
            welfare.truncate(self.config.welfare_cap);
            set.welfare = welfare;
        }

        if full {
            let retained: HashSet<String> = set.iter().map(|item| item.id.clone()).collect();
            let mut read = self.lock_read();
            let before = read.len();
            read.retain(|id| retained.contains(id));
            if read.len() != before {
                debug!(pruned = before - read.len(), "Pruned read state to current snapshot");
                self.persist_read(&read);
            }
        }
    }

    /// The display list: both halves concatenated, newest first. Ties keep
    /// insertion order (stable sort).
    pub fn merged(&self) -> Vec<NotificationItem> {
        let set = self.lock_set();
        let mut all: Vec<NotificationItem> = set.iter().cloned().collect();
        all.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        all
    }

    /// Whether an id has been acknowledged.
    pub fn is_read(&self, id: &str) -> bool {
        self.lock_read().contains(id)
    }

    /// Displayed items not yet acknowledged. Recomputed per call.
    pub fn unread_count(&self) -> usize {
        let set = self.lock_set();
        let read = self.lock_read();
        set.iter().filter(|item| !read.contains(&item.id)).count()
    }

    /// Displayed items demanding attention: high/critical priority, plus
    /// every welfare report regardless of its nominal priority.
    pub fn priority_count(&self) -> usize {
        let set = self.lock_set();
        set.iter().filter(|item| item.is_high_attention()).count()
    }

    /// Marks one notification read: local state immediately (and persisted),
    /// server best-effort in the background. A failed server sync keeps the
    /// local mark.
    pub fn mark_read(&self, id: &str) {
        {
            let mut read = self.lock_read();
            if !read.insert(id.to_string()) {
                return;
            }
            self.persist_read(&read);
        }

        let api = self.api.clone();
        let id = id.to_string();
        tokio::spawn(async move {
            if let Err(e) = api.mark_read(&id).await {
                warn!(id = %id, error = %e, "Failed to sync read state; keeping local mark");
            }
        });
    }

    /// Marks the entire displayed list read, with the same optimistic
    /// contract as [`NotificationFeed::mark_read`].
    pub fn mark_all_read(&self) {
        {
            let set = self.lock_set();
            let mut read = self.lock_read();
            for item in set.iter() {
                read.insert(item.id.clone());
            }
            self.persist_read(&read);
        }

        let api = self.api.clone();
        tokio::spawn(async move {
            if let Err(e) = api.mark_all_read().await {
                warn!(error = %e, "Failed to sync mark-all-read; keeping local marks");
            }
        });
    }

    fn persist_read(&self, read: &HashSet<String>) {
        if let Err(e) = self.store.save(read) {
            warn!(error = %e, "Failed to persist read state");
        }
    }

    /// Active toasts, oldest first.
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.active()
    }

    /// Dismisses a toast ahead of its timer. Absent ids are a no-op.
    pub fn dismiss_toast(&self, id: &str) {
        self.toasts.dismiss(id);
    }
}
