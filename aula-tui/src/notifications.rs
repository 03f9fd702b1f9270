//! Notification centre for the TUI.
//!
//! Mutations report through the [`Notifier`] seam; the footer shows the
//! latest entry.

use aula_cache::Notifier;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

const DEFAULT_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
    Success,
}

impl NotificationLevel {
    pub fn label(&self) -> &'static str {
        match self {
            NotificationLevel::Info => "INFO",
            NotificationLevel::Warning => "WARN",
            NotificationLevel::Error => "ERROR",
            NotificationLevel::Success => "OK",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            description: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// `message: description`, or just the message.
    pub fn text(&self) -> String {
        match &self.description {
            Some(description) => format!("{}: {}", self.message, description),
            None => self.message.clone(),
        }
    }
}

/// Bounded history of notifications, shared between the UI and mutations.
#[derive(Debug)]
pub struct NotificationCenter {
    entries: Mutex<VecDeque<Notification>>,
    capacity: usize,
    revision: AtomicU64,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl NotificationCenter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            revision: AtomicU64::new(0),
        }
    }

    pub fn push(&self, notification: Notification) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(notification);
        self.revision.fetch_add(1, Ordering::SeqCst);
    }

    /// Incremented on every push; the UI redraws when it moves.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        self.push(Notification::new(level, message));
    }

    pub fn latest(&self) -> Option<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .back()
            .cloned()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(&self, level: NotificationLevel, message: &str, description: Option<&str>) {
        let mut notification = Notification::new(level, message);
        notification.description = description.map(str::to_string);
        self.push(notification);
    }
}

impl Notifier for NotificationCenter {
    fn success(&self, message: &str, description: Option<&str>) {
        self.record(NotificationLevel::Success, message, description);
    }

    fn error(&self, message: &str, description: Option<&str>) {
        tracing::warn!(message, description = description.unwrap_or(""), "Error notification");
        self.record(NotificationLevel::Error, message, description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_and_capacity() {
        let center = NotificationCenter::with_capacity(2);
        center.notify(NotificationLevel::Info, "uno");
        center.notify(NotificationLevel::Info, "dos");
        center.notify(NotificationLevel::Warning, "tres");
        assert_eq!(center.len(), 2);
        assert_eq!(center.revision(), 3);
        assert_eq!(center.all()[0].message, "dos");
        assert_eq!(center.latest().map(|n| n.level), Some(NotificationLevel::Warning));
    }

    #[test]
    fn test_notifier_keeps_description() {
        let center = NotificationCenter::default();
        center.error("Error al eliminar", Some("El aula tiene estudiantes"));
        let latest = center.latest().unwrap();
        assert_eq!(latest.level, NotificationLevel::Error);
        assert_eq!(latest.text(), "Error al eliminar: El aula tiene estudiantes");
    }
}
