//! User-facing notifications ("toasts")

use std::sync::{Arc, Mutex, PoisonError};

use crate::i18n::{Language, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

/// A rendered notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: Message,
    pub text: String,
    pub language: Language,
}

impl Toast {
    pub fn success(message: Message, language: Language) -> Self {
        Self::new(ToastKind::Success, message, language)
    }

    pub fn error(message: Message, language: Language) -> Self {
        Self::new(ToastKind::Error, message, language)
    }

    fn new(kind: ToastKind, message: Message, language: Language) -> Self {
        Self {
            kind,
            message,
            text: message.text(language).to_string(),
            language,
        }
    }
}

/// Sink for toasts. The view layer bridges this to its toast component.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

/// Writes toasts to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        match toast.kind {
            ToastKind::Success => tracing::info!(toast = ?toast.message, "{}", toast.text),
            ToastKind::Error => tracing::warn!(toast = ?toast.message, "{}", toast.text),
        }
    }
}

/// Keeps every toast in memory
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    toasts: Arc<Mutex<Vec<Toast>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<Toast> {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn errors(&self) -> Vec<Toast> {
        self.toasts()
            .into_iter()
            .filter(|t| t.kind == ToastKind::Error)
            .collect()
    }

    pub fn clear(&self) {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(toast);
    }
}
