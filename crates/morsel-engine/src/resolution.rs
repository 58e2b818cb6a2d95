//! Resolves a logical element descriptor to a single live element.

use thiserror::Error;
use tracing::debug;

use crate::backend::{BackendError, ElementHandle, Session};
use crate::config::ElementDescriptor;

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("element not found: {0}")]
    NotFound(String),
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Resolve a descriptor to exactly one element.
///
/// With `multiple` set, candidates are scanned in document order and the
/// first whose visible text contains the case-folded `match` text wins.
/// Waiting never happens here; `wait` is its own step.
pub async fn resolve<S: Session + ?Sized>(
    session: &mut S,
    descriptor: &ElementDescriptor,
) -> Result<S::Element, ResolutionError> {
    if !descriptor.multiple {
        return match session.find(descriptor.by, &descriptor.value).await {
            Ok(element) => Ok(element),
            Err(BackendError::NotFound(_)) => Err(ResolutionError::NotFound(describe(descriptor))),
            Err(e) => Err(e.into()),
        };
    }

    let needle = descriptor
        .match_text
        .as_deref()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    let candidates = match session.find_all(descriptor.by, &descriptor.value).await {
        Ok(candidates) => candidates,
        Err(BackendError::NotFound(_)) => Vec::new(),
        Err(e) => return Err(e.into()),
    };
    debug!("found {} candidates for {}", candidates.len(), describe(descriptor));
    for candidate in candidates {
        if candidate.text().await?.to_lowercase().contains(&needle) {
            return Ok(candidate);
        }
    }
    Err(ResolutionError::NotFound(describe(descriptor)))
}

fn describe(descriptor: &ElementDescriptor) -> String {
    format!("{:?} {}", descriptor.by, descriptor.value)
}
