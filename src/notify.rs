//! Toast notifications.
//!
//! Toasts are queued with an expiry deadline; `expire` removes the ones that
//! are due. Dismissing a toast that is already gone is a no-op.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

pub const DEFAULT_TOAST_MS: u64 = 5_000;
pub const MAX_TOAST_MS: u64 = 60 * 60 * 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastKind {
    /// Unknown names fall back to info.
    pub fn from_name(name: &str) -> Self {
        match name {
            "success" => Self::Success,
            "error" => Self::Error,
            "warning" => Self::Warning,
            _ => Self::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }

    /// Terminal stand-in for the toast icon.
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Success => "[ok]",
            Self::Error => "[x]",
            Self::Warning => "[!]",
            Self::Info => "[i]",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub title: String,
    pub message: String,
    pub kind: ToastKind,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Display for Toast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.kind.glyph(), self.title, self.message)
    }
}

#[derive(Debug, Clone)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
    next_id: u64,
    lifetime: Duration,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_MS)
    }
}

impl ToastQueue {
    pub fn new(lifetime_ms: u64) -> Self {
        Self {
            toasts: Vec::new(),
            next_id: 1,
            lifetime: Duration::milliseconds(i64::try_from(lifetime_ms).unwrap_or(i64::MAX / 1_000)),
        }
    }

    pub fn push(&mut self, title: &str, message: &str, kind: ToastKind) -> u64 {
        self.push_at(title, message, kind, Utc::now())
    }

    pub fn push_at(&mut self, title: &str, message: &str, kind: ToastKind, now: DateTime<Utc>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.toasts.push(Toast {
            id,
            title: title.to_string(),
            message: message.to_string(),
            kind,
            expires_at: now
                .checked_add_signed(self.lifetime)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        });
        id
    }

    /// Returns whether a toast was removed.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != before
    }

    /// Remove and return the toasts whose deadline has passed.
    pub fn expire(&mut self, now: DateTime<Utc>) -> Vec<Toast> {
        let (expired, live): (Vec<Toast>, Vec<Toast>) =
            self.toasts.drain(..).partition(|t| t.expires_at <= now);
        self.toasts = live;
        expired
    }

    pub fn active(&self) -> &[Toast] {
        &self.toasts
    }

    /// Toasts pushed after `id`.
    pub fn newer_than(&self, id: u64) -> impl Iterator<Item = &Toast> {
        self.toasts.iter().filter(move |t| t.id > id)
    }

    /// Id of the most recently pushed toast (0 if none yet).
    pub fn last_id(&self) -> u64 {
        self.next_id - 1
    }

    pub fn last(&self) -> Option<&Toast> {
        self.toasts.last()
    }
}
