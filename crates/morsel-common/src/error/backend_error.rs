use thiserror::Error;

/// Errors surfaced by a browser session implementation.
///
/// Every driver maps its native failures onto these variants so the engine
/// can react to the ones it cares about (a missing element, an intercepted
/// click) without knowing the driver.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("session is not ready")]
    NotReady,

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("element not found: {0}")]
    NotFound(String),

    /// The target was covered or animating when the native click landed.
    /// Recoverable: the executor retries through a script click.
    #[error("click intercepted: {0}")]
    ClickIntercepted(String),

    #[error("script execution failed: {0}")]
    Script(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("operation not supported: {0}")]
    NotSupported(String),
}
