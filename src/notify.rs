//! Notification center - transient, auto-expiring messages
//!
//! Each posted notification owns an expiry timer: a tokio task that sleeps
//! for the notification's TTL and then removes it. The task's `AbortHandle`
//! is stored with the entry, so a manual dismiss cancels the timer. Expiry
//! and dismiss go through the same removal, which is a no-op for ids that
//! are already gone.
//!
//! Active notifications are listed oldest first (post order).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::Instant;

/// Default time-to-live for a notification
pub const DEFAULT_TTL: Duration = Duration::from_millis(5000);

// ─────────────────────────────────────────────────────────────────────────────
// Severity
// ─────────────────────────────────────────────────────────────────────────────

/// Visual weight of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Danger,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Notification
// ─────────────────────────────────────────────────────────────────────────────

/// Notification key: post time in Unix milliseconds, bumped to stay unique
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single active notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub severity: Severity,
    pub expires_after: Duration,
}

struct Entry {
    notification: Notification,
    deadline: Instant,
    /// Expiry timer; `None` when posted outside a tokio runtime
    timer: Option<AbortHandle>,
}

#[derive(Default)]
struct Inner {
    entries: Vec<Entry>,
    last_id: u64,
}

impl Inner {
    /// Next id: wall-clock millis, or one past the last id if the clock
    /// has not moved on
    fn next_id(&mut self) -> NotificationId {
        let now_ms = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let id = now_ms.max(self.last_id + 1);
        self.last_id = id;
        NotificationId(id)
    }

    fn remove(&mut self, id: NotificationId) -> Option<Entry> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.notification.id == id)?;
        Some(self.entries.remove(idx))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// NotificationCenter
// ─────────────────────────────────────────────────────────────────────────────

/// Shared handle to the active notification set
///
/// Cloning is cheap; all clones see the same notifications.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<Mutex<Inner>>,
    default_ttl: Duration,
}

impl NotificationCenter {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Post with the default TTL
    pub fn post(&self, message: impl Into<String>, severity: Severity) -> NotificationId {
        self.post_with_ttl(message, severity, self.default_ttl)
    }

    /// Post a notification that expires after `ttl`
    ///
    /// Danger notifications are also written to the diagnostic log.
    pub fn post_with_ttl(
        &self,
        message: impl Into<String>,
        severity: Severity,
        ttl: Duration,
    ) -> NotificationId {
        let message = message.into();
        if severity == Severity::Danger {
            tracing::error!("{}", message);
        }

        let mut inner = self.lock();
        let id = inner.next_id();
        let timer = self.spawn_expiry(id, ttl);

        inner.entries.push(Entry {
            notification: Notification {
                id,
                message,
                severity,
                expires_after: ttl,
            },
            deadline: Instant::now() + ttl,
            timer,
        });

        tracing::debug!("Posted {} notification {} (ttl {:?})", severity, id, ttl);
        id
    }

    /// Remove a notification and cancel its timer. Returns false if it was
    /// already gone.
    pub fn dismiss(&self, id: NotificationId) -> bool {
        let removed = self.lock().remove(id);
        match removed {
            Some(entry) => {
                if let Some(timer) = entry.timer {
                    timer.abort();
                }
                tracing::debug!("Dismissed notification {}", id);
                true
            }
            None => false,
        }
    }

    /// Dismiss the oldest active notification, if any
    pub fn dismiss_oldest(&self) -> Option<NotificationId> {
        let oldest = self.lock().entries.first().map(|e| e.notification.id)?;
        self.dismiss(oldest).then_some(oldest)
    }

    /// Remove every notification whose deadline is at or before `now`
    ///
    /// Timers normally handle expiry; this sweep covers notifications posted
    /// without a runtime.
    pub fn prune_expired(&self, now: Instant) -> usize {
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|e| {
            let keep = e.deadline > now;
            if !keep {
                if let Some(timer) = &e.timer {
                    timer.abort();
                }
            }
            keep
        });
        before - inner.entries.len()
    }

    /// Active notifications, oldest first
    pub fn active(&self) -> Vec<Notification> {
        self.lock()
            .entries
            .iter()
            .map(|e| e.notification.clone())
            .collect()
    }

    pub fn contains(&self, id: NotificationId) -> bool {
        self.lock().entries.iter().any(|e| e.notification.id == id)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Remove everything, cancelling all timers
    pub fn clear(&self) {
        let entries = std::mem::take(&mut self.lock().entries);
        for entry in entries {
            if let Some(timer) = entry.timer {
                timer.abort();
            }
        }
    }

    fn spawn_expiry(&self, id: NotificationId, ttl: Duration) -> Option<AbortHandle> {
        let handle = tokio::runtime::Handle::try_current().ok()?;
        let weak: Weak<Mutex<Inner>> = Arc::downgrade(&self.inner);

        let task = handle.spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(inner) = weak.upgrade() {
                let removed = inner
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(id);
                if removed.is_some() {
                    tracing::trace!("Notification {} expired", id);
                }
            }
        });
        Some(task.abort_handle())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationCenter")
            .field("active", &self.len())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}
