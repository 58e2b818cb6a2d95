//! The flow interpreter: dispatches configured steps onto a session.
//!
//! Steps run strictly in configuration order; the only interpreter state
//! is which step comes next. The first failing step aborts the remainder
//! of the flow, to be caught by the per-site boundary in the runner.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::backend::{BackendError, ElementHandle, Session};
use crate::config::{ElementDescriptor, FlowStep, FrameTarget, WaitCondition};
use crate::resolution::{self, ResolutionError};

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("timed out after {seconds}s waiting for {target}")]
    Timeout { seconds: u64, target: String },

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Executes one site's flow against a session.
pub struct FlowExecutor {
    shots_dir: PathBuf,
}

impl FlowExecutor {
    /// `shots_dir` receives any screenshots the flow takes.
    pub fn new(shots_dir: impl Into<PathBuf>) -> Self {
        Self {
            shots_dir: shots_dir.into(),
        }
    }

    /// Navigate to `url`, then run every step in order.
    pub async fn run<S: Session + ?Sized>(
        &self,
        session: &mut S,
        url: &str,
        steps: &[FlowStep],
    ) -> Result<(), ExecutorError> {
        session.goto(url).await?;
        for step in steps {
            self.execute_step(session, step).await?;
            info!("done with step: {step:?}");
        }
        Ok(())
    }

    async fn execute_step<S: Session + ?Sized>(
        &self,
        session: &mut S,
        step: &FlowStep,
    ) -> Result<(), ExecutorError> {
        match step {
            FlowStep::NavigateFrame { frame } => match frame {
                FrameTarget::Index { index } => Ok(session.enter_frame(*index).await?),
                FrameTarget::Element(descriptor) => {
                    let element = resolution::resolve(session, descriptor).await?;
                    Ok(session.enter_frame_element(element).await?)
                }
            },
            FlowStep::Click {
                element,
                javascript,
            } => self.click(session, element, *javascript).await,
            FlowStep::TypeText { element, text } => {
                let target = resolution::resolve(session, element).await?;
                target.clear().await?;
                target.send_keys(text).await?;
                Ok(())
            }
            FlowStep::Submit { element } => {
                let target = resolution::resolve(session, element).await?;
                Ok(session.submit(&target).await?)
            }
            FlowStep::Wait {
                seconds,
                element,
                condition,
            } => match element {
                None => Ok(session
                    .set_implicit_wait(Duration::from_secs(*seconds))
                    .await?),
                Some(descriptor) => {
                    self.wait_for(session, descriptor, condition.unwrap_or_default(), *seconds)
                        .await
                }
            },
            FlowStep::Screenshot { element, filename } => {
                self.screenshot(session, element.as_ref(), filename.as_deref())
                    .await
            }
            FlowStep::Pause { seconds } => {
                tokio::time::sleep(Duration::from_secs(*seconds)).await;
                Ok(())
            }
        }
    }

    async fn click<S: Session + ?Sized>(
        &self,
        session: &mut S,
        descriptor: &ElementDescriptor,
        javascript: bool,
    ) -> Result<(), ExecutorError> {
        let element = resolution::resolve(session, descriptor).await?;
        if javascript {
            return Ok(session.script_click(&element).await?);
        }
        match element.click().await {
            Ok(()) => Ok(()),
            Err(BackendError::ClickIntercepted(reason)) => {
                debug!("native click intercepted ({reason}), retrying from script");
                Ok(session.script_click(&element).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Poll `condition` on the target until it holds or the bound elapses.
    async fn wait_for<S: Session + ?Sized>(
        &self,
        session: &mut S,
        descriptor: &ElementDescriptor,
        condition: WaitCondition,
        seconds: u64,
    ) -> Result<(), ExecutorError> {
        let deadline = Instant::now() + Duration::from_secs(seconds);
        loop {
            if self.condition_met(session, descriptor, condition).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(ExecutorError::Timeout {
                    seconds,
                    target: format!(
                        "{:?} on {:?} {}",
                        condition, descriptor.by, descriptor.value
                    ),
                });
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }

    async fn condition_met<S: Session + ?Sized>(
        &self,
        session: &mut S,
        descriptor: &ElementDescriptor,
        condition: WaitCondition,
    ) -> Result<bool, ExecutorError> {
        let element = match session.find(descriptor.by, &descriptor.value).await {
            Ok(element) => element,
            Err(BackendError::NotFound(_)) => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        let met = match condition {
            WaitCondition::Present => true,
            WaitCondition::Visible => element.is_displayed().await?,
            WaitCondition::Clickable => {
                element.is_displayed().await? && element.is_enabled().await?
            }
        };
        Ok(met)
    }

    async fn screenshot<S: Session + ?Sized>(
        &self,
        session: &mut S,
        descriptor: Option<&ElementDescriptor>,
        filename: Option<&str>,
    ) -> Result<(), ExecutorError> {
        let body = ElementDescriptor::by_tag("body");
        let descriptor = descriptor.unwrap_or(&body);
        let name = filename
            .map(str::to_string)
            .unwrap_or_else(|| descriptor.value.replace('.', "_"));
        let element = resolution::resolve(session, descriptor).await?;
        let image = element.screenshot().await?;
        let path = self.shots_dir.join(format!("banner_cookies_{name}.png"));
        tokio::fs::write(&path, image).await?;
        debug!("wrote screenshot {}", path.display());
        Ok(())
    }
}
