//! Shared mock session for interpreter tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use morsel_engine::backend::{BackendError, ElementHandle, Session};
use morsel_engine::config::By;

/// Everything the flow did, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Goto(String),
    NativeClick(String),
    ScriptClick(String),
    Clear(String),
    SendKeys(String, String),
    Submit(String),
    EnterFrame(u16),
    EnterFrameElement(String),
    ImplicitWait(u64),
    Screenshot(String),
    Close,
}

#[derive(Debug, Clone)]
pub struct FakeElement {
    pub name: String,
    pub text: String,
    pub displayed: bool,
    pub enabled: bool,
    pub intercept_clicks: bool,
    events: Arc<Mutex<Vec<Event>>>,
}

#[async_trait]
impl ElementHandle for FakeElement {
    async fn text(&self) -> Result<String, BackendError> {
        Ok(self.text.clone())
    }

    async fn click(&self) -> Result<(), BackendError> {
        if self.intercept_clicks {
            return Err(BackendError::ClickIntercepted("covered by overlay".into()));
        }
        self.push(Event::NativeClick(self.name.clone()));
        Ok(())
    }

    async fn clear(&self) -> Result<(), BackendError> {
        self.push(Event::Clear(self.name.clone()));
        Ok(())
    }

    async fn send_keys(&self, text: &str) -> Result<(), BackendError> {
        self.push(Event::SendKeys(self.name.clone(), text.to_string()));
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, BackendError> {
        self.push(Event::Screenshot(self.name.clone()));
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn is_displayed(&self) -> Result<bool, BackendError> {
        Ok(self.displayed)
    }

    async fn is_enabled(&self) -> Result<bool, BackendError> {
        Ok(self.enabled)
    }
}

impl FakeElement {
    fn push(&self, event: Event) {
        self.events.lock().expect("event log").push(event);
    }
}

#[derive(Default)]
pub struct MockSession {
    elements: HashMap<(By, String), Vec<FakeElement>>,
    events: Arc<Mutex<Vec<Event>>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an element wired to this session's event log.
    pub fn make_element(&self, name: &str, text: &str) -> FakeElement {
        FakeElement {
            name: name.to_string(),
            text: text.to_string(),
            displayed: true,
            enabled: true,
            intercept_clicks: false,
            events: Arc::clone(&self.events),
        }
    }

    pub fn add_element(&mut self, by: By, value: &str, element: FakeElement) {
        self.elements
            .entry((by, value.to_string()))
            .or_default()
            .push(element);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().expect("event log").clone()
    }

    fn push(&self, event: Event) {
        self.events.lock().expect("event log").push(event);
    }
}

#[async_trait]
impl Session for MockSession {
    type Element = FakeElement;

    async fn goto(&mut self, url: &str) -> Result<(), BackendError> {
        self.push(Event::Goto(url.to_string()));
        Ok(())
    }

    async fn find(&mut self, by: By, value: &str) -> Result<FakeElement, BackendError> {
        self.elements
            .get(&(by, value.to_string()))
            .and_then(|found| found.first())
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("{by:?} {value}")))
    }

    async fn find_all(&mut self, by: By, value: &str) -> Result<Vec<FakeElement>, BackendError> {
        Ok(self
            .elements
            .get(&(by, value.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn enter_frame(&mut self, index: u16) -> Result<(), BackendError> {
        self.push(Event::EnterFrame(index));
        Ok(())
    }

    async fn enter_frame_element(&mut self, element: FakeElement) -> Result<(), BackendError> {
        self.push(Event::EnterFrameElement(element.name));
        Ok(())
    }

    async fn script_click(&mut self, element: &FakeElement) -> Result<(), BackendError> {
        self.push(Event::ScriptClick(element.name.clone()));
        Ok(())
    }

    async fn submit(&mut self, element: &FakeElement) -> Result<(), BackendError> {
        self.push(Event::Submit(element.name.clone()));
        Ok(())
    }

    async fn set_implicit_wait(&mut self, timeout: std::time::Duration) -> Result<(), BackendError> {
        self.push(Event::ImplicitWait(timeout.as_secs()));
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        self.push(Event::Close);
        Ok(())
    }
}
