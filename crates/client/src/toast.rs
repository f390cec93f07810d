//! Transient error notifications.
//!
//! A [`ToastQueue`] listens on the error broadcaster and keeps one toast per
//! published error until it is dismissed or its time runs out.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use tutaller_events::{Broadcaster, Subscription};

use crate::error::NormalizedError;

pub const DEFAULT_TOAST_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: Uuid,
    pub error: NormalizedError,
    pub raised_at: DateTime<Utc>,
}

impl Toast {
    pub fn new(error: NormalizedError) -> Self {
        Self {
            id: Uuid::now_v7(),
            error,
            raised_at: Utc::now(),
        }
    }

    /// `Error 422 • VALIDATION_FAILED`, `Error 500`, or `Error`.
    pub fn title(&self) -> String {
        let mut title = match self.error.status {
            Some(status) => format!("Error {status}"),
            None => "Error".to_string(),
        };
        if let Some(code) = &self.error.code {
            title.push_str(&format!(" • {code}"));
        }
        title
    }

    pub fn message(&self) -> &str {
        &self.error.message
    }
}

#[derive(Debug, Clone)]
pub struct ToastQueue {
    toasts: Arc<Mutex<Vec<Toast>>>,
    ttl: Duration,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_TTL)
    }
}

impl ToastQueue {
    pub fn new(ttl: Duration) -> Self {
        Self {
            toasts: Arc::new(Mutex::new(Vec::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Show a toast for every error published on `errors`.
    pub fn attach(&self, errors: &dyn Broadcaster<NormalizedError>) -> Subscription {
        let queue = self.clone();
        errors.subscribe(Arc::new(move |error: &NormalizedError| {
            queue.push(error.clone());
        }))
    }

    /// Queue a toast. With a tokio runtime available, it is dismissed after
    /// the queue's TTL.
    pub fn push(&self, error: NormalizedError) -> Uuid {
        let toast = Toast::new(error);
        let id = toast.id;
        tracing::debug!(%id, title = %toast.title(), "toast raised");

        self.lock().push(toast);

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let queue = self.clone();
            handle.spawn(async move {
                tokio::time::sleep(queue.ttl).await;
                queue.dismiss(id);
            });
        }

        id
    }

    /// Remove a toast; `false` when it was already gone.
    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut toasts = self.lock();
        let before = toasts.len();
        toasts.retain(|t| t.id != id);
        toasts.len() != before
    }

    /// Visible toasts, oldest first.
    pub fn toasts(&self) -> Vec<Toast> {
        self.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Toast>> {
        self.toasts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
