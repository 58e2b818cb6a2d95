//! Capability interface between the flow interpreter and a browser driver.
//!
//! The engine never assumes a concrete driver: everything it needs from
//! the browser goes through the [`Session`] and [`ElementHandle`] traits,
//! implemented by an external collaborator crate.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::By;
pub use morsel_common::error::backend_error::BackendError;

/// Browser preferences applied when a session is opened.
#[derive(Debug, Clone)]
pub struct SessionPrefs {
    /// Isolated session-state directory, freshly reset for this visit.
    pub profile_dir: PathBuf,
    pub language: String,
    pub block_all_cookies: bool,
    pub block_third_party_cookies: bool,
    pub enable_do_not_track: bool,
}

/// A live element inside a session.
#[async_trait]
pub trait ElementHandle: Send + Sync {
    /// Visible text of the element.
    async fn text(&self) -> Result<String, BackendError>;

    /// Native click. A covered or animating target fails with
    /// [`BackendError::ClickIntercepted`].
    async fn click(&self) -> Result<(), BackendError>;

    async fn clear(&self) -> Result<(), BackendError>;

    async fn send_keys(&self, text: &str) -> Result<(), BackendError>;

    /// PNG screenshot of the element's bounding box.
    async fn screenshot(&self) -> Result<Vec<u8>, BackendError>;

    async fn is_displayed(&self) -> Result<bool, BackendError>;

    async fn is_enabled(&self) -> Result<bool, BackendError>;
}

/// One browser automation session scoped to a single site visit.
#[async_trait]
pub trait Session: Send {
    type Element: ElementHandle;

    async fn goto(&mut self, url: &str) -> Result<(), BackendError>;

    /// Find a single element; a missing one fails with
    /// [`BackendError::NotFound`].
    async fn find(&mut self, by: By, value: &str) -> Result<Self::Element, BackendError>;

    /// Find every matching element in document order.
    async fn find_all(&mut self, by: By, value: &str) -> Result<Vec<Self::Element>, BackendError>;

    /// Switch context into an iframe by zero-based index.
    async fn enter_frame(&mut self, index: u16) -> Result<(), BackendError>;

    /// Switch context into the iframe backing `element`.
    async fn enter_frame_element(&mut self, element: Self::Element) -> Result<(), BackendError>;

    /// Scroll the element into view and click it from script.
    async fn script_click(&mut self, element: &Self::Element) -> Result<(), BackendError>;

    /// Invoke the element's form-submit behavior.
    async fn submit(&mut self, element: &Self::Element) -> Result<(), BackendError>;

    /// Session-wide default wait applied to element lookups.
    async fn set_implicit_wait(&mut self, timeout: Duration) -> Result<(), BackendError>;

    async fn close(&mut self) -> Result<(), BackendError>;
}

/// Opens a fresh session per site visit.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    type Session: Session;

    async fn open(&self, prefs: &SessionPrefs) -> Result<Self::Session, BackendError>;
}
