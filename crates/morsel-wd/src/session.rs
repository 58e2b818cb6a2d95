//! fantoccini-backed implementation of the engine session traits.
//!
//! Connects to an already-running WebDriver endpoint (e.g. chromedriver)
//! and maps the engine's capability surface onto W3C WebDriver commands.

use std::time::Duration;

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Value, json};
use tokio::time::Instant;
use tracing::{debug, info};

use morsel_engine::backend::{
    BackendError, ElementHandle, Session, SessionPrefs, SessionProvider,
};
use morsel_engine::config::By;

const FIND_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Locator with owned storage; fantoccini locators borrow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorSpec {
    Css(String),
    XPath(String),
    Id(String),
    LinkText(String),
}

impl LocatorSpec {
    /// Lower a descriptor strategy onto the WebDriver locator set; tag and
    /// class lookups ride on CSS.
    pub fn new(by: By, value: &str) -> Self {
        match by {
            By::Css | By::TagName => LocatorSpec::Css(value.to_string()),
            By::ClassName => LocatorSpec::Css(format!(".{value}")),
            By::XPath => LocatorSpec::XPath(value.to_string()),
            By::Id => LocatorSpec::Id(value.to_string()),
            By::LinkText => LocatorSpec::LinkText(value.to_string()),
        }
    }

    fn as_locator(&self) -> Locator<'_> {
        match self {
            LocatorSpec::Css(value) => Locator::Css(value),
            LocatorSpec::XPath(value) => Locator::XPath(value),
            LocatorSpec::Id(value) => Locator::Id(value),
            LocatorSpec::LinkText(value) => Locator::LinkText(value),
        }
    }
}

pub struct WdElement {
    inner: Element,
}

#[async_trait]
impl ElementHandle for WdElement {
    async fn text(&self) -> Result<String, BackendError> {
        self.inner.text().await.map_err(session_error)
    }

    async fn click(&self) -> Result<(), BackendError> {
        self.inner.click().await.map_err(|e| {
            let message = e.to_string();
            if message.contains("click intercepted") {
                BackendError::ClickIntercepted(message)
            } else {
                BackendError::Session(message)
            }
        })
    }

    async fn clear(&self) -> Result<(), BackendError> {
        self.inner.clear().await.map_err(session_error)
    }

    async fn send_keys(&self, text: &str) -> Result<(), BackendError> {
        self.inner.send_keys(text).await.map_err(session_error)
    }

    async fn screenshot(&self) -> Result<Vec<u8>, BackendError> {
        self.inner.screenshot().await.map_err(session_error)
    }

    async fn is_displayed(&self) -> Result<bool, BackendError> {
        self.inner.is_displayed().await.map_err(session_error)
    }

    async fn is_enabled(&self) -> Result<bool, BackendError> {
        self.inner.is_enabled().await.map_err(session_error)
    }
}

pub struct WebDriverSession {
    client: Option<Client>,
    implicit_wait: Duration,
}

impl WebDriverSession {
    /// Connect to a WebDriver endpoint with the per-site browser
    /// preferences applied as Chrome options.
    pub async fn connect(webdriver_url: &str, prefs: &SessionPrefs) -> Result<Self, BackendError> {
        info!("connecting to WebDriver at {webdriver_url}");
        let client = ClientBuilder::native()
            .capabilities(capabilities(prefs))
            .connect(webdriver_url)
            .await
            .map_err(|e| BackendError::Session(e.to_string()))?;
        Ok(Self {
            client: Some(client),
            implicit_wait: Duration::ZERO,
        })
    }

    fn client(&self) -> Result<&Client, BackendError> {
        self.client.as_ref().ok_or(BackendError::NotReady)
    }

    fn element_arg(element: &WdElement) -> Result<Value, BackendError> {
        serde_json::to_value(&element.inner).map_err(|e| BackendError::Script(e.to_string()))
    }
}

#[async_trait]
impl Session for WebDriverSession {
    type Element = WdElement;

    async fn goto(&mut self, url: &str) -> Result<(), BackendError> {
        info!("navigating to {url}");
        self.client()?
            .goto(url)
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))
    }

    async fn find(&mut self, by: By, value: &str) -> Result<WdElement, BackendError> {
        let spec = LocatorSpec::new(by, value);
        let deadline = Instant::now() + self.implicit_wait;
        loop {
            match self.client()?.find(spec.as_locator()).await {
                Ok(element) => return Ok(WdElement { inner: element }),
                Err(e) if e.is_no_such_element() && Instant::now() < deadline => {
                    tokio::time::sleep(FIND_POLL_INTERVAL).await;
                }
                Err(e) if e.is_no_such_element() => {
                    return Err(BackendError::NotFound(format!("{by:?} {value}")));
                }
                Err(e) => return Err(session_error(e)),
            }
        }
    }

    async fn find_all(&mut self, by: By, value: &str) -> Result<Vec<WdElement>, BackendError> {
        let spec = LocatorSpec::new(by, value);
        let elements = self
            .client()?
            .find_all(spec.as_locator())
            .await
            .map_err(session_error)?;
        Ok(elements
            .into_iter()
            .map(|inner| WdElement { inner })
            .collect())
    }

    async fn enter_frame(&mut self, index: u16) -> Result<(), BackendError> {
        let _ = self
            .client()?
            .clone()
            .enter_frame(Some(index))
            .await
            .map_err(session_error)?;
        Ok(())
    }

    async fn enter_frame_element(&mut self, element: WdElement) -> Result<(), BackendError> {
        let _ = element.inner.enter_frame().await.map_err(session_error)?;
        Ok(())
    }

    async fn script_click(&mut self, element: &WdElement) -> Result<(), BackendError> {
        let arg = Self::element_arg(element)?;
        let client = self.client()?;
        client
            .execute("arguments[0].scrollIntoView(true);", vec![arg.clone()])
            .await
            .map_err(script_error)?;
        client
            .execute("arguments[0].click();", vec![arg])
            .await
            .map_err(script_error)?;
        Ok(())
    }

    async fn submit(&mut self, element: &WdElement) -> Result<(), BackendError> {
        let arg = Self::element_arg(element)?;
        self.client()?
            .execute(
                "const form = arguments[0].form || arguments[0].closest('form'); form.submit();",
                vec![arg],
            )
            .await
            .map_err(script_error)?;
        Ok(())
    }

    async fn set_implicit_wait(&mut self, timeout: Duration) -> Result<(), BackendError> {
        debug!("implicit wait set to {timeout:?}");
        self.implicit_wait = timeout;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        if let Some(client) = self.client.take() {
            client.close().await.map_err(session_error)?;
        }
        Ok(())
    }
}

fn session_error(e: CmdError) -> BackendError {
    BackendError::Session(e.to_string())
}

fn script_error(e: CmdError) -> BackendError {
    BackendError::Script(e.to_string())
}

fn capabilities(prefs: &SessionPrefs) -> serde_json::Map<String, Value> {
    let args = vec![
        format!("--user-data-dir={}", prefs.profile_dir.display()),
        "--window-size=1920,1080".to_string(),
        "--log-level=3".to_string(),
    ];
    let mut chrome_prefs = serde_json::Map::new();
    chrome_prefs.insert("intl.accept_languages".to_string(), json!(prefs.language));
    if prefs.block_all_cookies {
        // 1 allows, 2 blocks
        chrome_prefs.insert(
            "profile.default_content_setting_values.cookies".to_string(),
            json!(2),
        );
    }
    if prefs.block_third_party_cookies {
        chrome_prefs.insert("profile.block_third_party_cookies".to_string(), json!(true));
    }
    if prefs.enable_do_not_track {
        chrome_prefs.insert("enable_do_not_track".to_string(), json!(true));
    }
    let mut chrome_options = serde_json::Map::new();
    chrome_options.insert("args".to_string(), json!(args));
    chrome_options.insert("prefs".to_string(), Value::Object(chrome_prefs));
    let mut caps = serde_json::Map::new();
    caps.insert("goog:chromeOptions".to_string(), Value::Object(chrome_options));
    caps
}

/// Opens one fresh WebDriver session per site.
pub struct WebDriverProvider {
    webdriver_url: String,
}

impl WebDriverProvider {
    pub fn new(webdriver_url: impl Into<String>) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
        }
    }
}

#[async_trait]
impl SessionProvider for WebDriverProvider {
    type Session = WebDriverSession;

    async fn open(&self, prefs: &SessionPrefs) -> Result<WebDriverSession, BackendError> {
        WebDriverSession::connect(&self.webdriver_url, prefs).await
    }
}
