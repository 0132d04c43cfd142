use std::sync::Mutex;

use shared::domain::{RecordId, RequestId};
use tracing::info;
use url::Url;

/// Where the user ends up after a lifecycle outcome.
pub struct Destination;

impl Destination {
    pub const UPLOADS: &'static str = "/me/uploads";

    pub fn preview(id: &RecordId) -> String {
        format!("/records/{id}?preview=1")
    }

    pub fn record(id: &RecordId) -> String {
        format!("/records/{id}")
    }

    pub fn request(id: &RequestId) -> String {
        format!("/me/requests/{id}")
    }
}

/// Page navigation capability. Calls are fire-and-forget.
pub trait Navigator: Send + Sync {
    /// Updates the visible address without adding a history entry.
    fn replace(&self, url: &str);
    /// Leaves the current page for `url`.
    fn navigate(&self, url: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Replaced(String),
    Navigated(String),
}

/// Resolves targets against the UI base URL, logs them and remembers them.
///
/// Site-relative targets such as `/me/uploads` land below the base path, so a
/// UI mounted at `https://host/deposit/` sends them to `https://host/deposit/me/uploads`.
pub struct LoggingNavigator {
    base: Url,
    history: Mutex<Vec<Location>>,
}

impl LoggingNavigator {
    pub fn new(mut base: Url) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self {
            base,
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn resolve(&self, url: &str) -> String {
        if let Ok(absolute) = Url::parse(url) {
            return absolute.into();
        }
        self.base
            .join(url.trim_start_matches('/'))
            .map(String::from)
            .unwrap_or_else(|_| url.to_string())
    }

    pub fn history(&self) -> Vec<Location> {
        self.history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<Location> {
        self.history().pop()
    }

    fn record(&self, location: Location) {
        if let Ok(mut history) = self.history.lock() {
            history.push(location);
        }
    }
}

impl Navigator for LoggingNavigator {
    fn replace(&self, url: &str) {
        let resolved = self.resolve(url);
        info!(url = %resolved, "replacing address");
        self.record(Location::Replaced(resolved));
    }

    fn navigate(&self, url: &str) {
        let resolved = self.resolve(url);
        info!(url = %resolved, "navigating");
        self.record(Location::Navigated(resolved));
    }
}

#[cfg(test)]
#[path = "tests/navigation_tests.rs"]
mod tests;
