//! Where the user is, and how the client sends them elsewhere.

use tokio::sync::watch;

/// Location access for the HTTP core and the auth session.
///
/// Locations are path plus optional query (`/workshop/orders?page=2`).
pub trait Navigator: Send + Sync {
    fn location(&self) -> String;

    /// Perform a full navigation to `url`.
    fn navigate(&self, url: &str);
}

/// Navigator backed by a watch channel; the UI shell renders whatever the
/// channel holds and reports user-driven moves through [`WatchNavigator::set_location`].
#[derive(Debug)]
pub struct WatchNavigator {
    tx: watch::Sender<String>,
}

impl WatchNavigator {
    pub fn new(initial: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(initial.into());
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.tx.subscribe()
    }

    /// Record a navigation the user made in the UI.
    pub fn set_location(&self, location: impl Into<String>) {
        self.tx.send_replace(location.into());
    }
}

impl Navigator for WatchNavigator {
    fn location(&self) -> String {
        self.tx.borrow().clone()
    }

    fn navigate(&self, url: &str) {
        tracing::info!(to = url, "navigating");
        self.tx.send_replace(url.to_string());
    }
}
