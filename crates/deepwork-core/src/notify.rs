//! Fire-and-forget toast notifications.
//!
//! Timer failures are never fatal; whatever layer invoked the failing
//! operation pushes a toast here and the user retries.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Toast {
    #[serde(rename = "type")]
    pub kind: ToastKind,
    pub content: String,
}

impl Toast {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            content: content.into(),
        }
    }
}

/// Notification sink. Implementations must not block and must not fail.
pub trait Notifier {
    fn push(&self, toast: Toast);
}

/// The CLI's sink: toasts go to stderr so stdout stays machine-readable.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn push(&self, toast: Toast) {
        match toast.kind {
            ToastKind::Success => eprintln!("{}", toast.content),
            ToastKind::Error => eprintln!("error: {}", toast.content),
        }
    }
}

/// Drops every toast. For tests and headless embedding.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn push(&self, _toast: Toast) {}
}
