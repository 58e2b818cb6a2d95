//! Declarative site and flow configuration.
//!
//! A configuration document lists sites; each site carries an ordered flow
//! of interpreter steps. The step set is a closed union so the executor
//! matches over it exhaustively.

pub mod loader;

use serde::{Deserialize, Serialize};

pub use loader::{ConfigError, ConfigLoader};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitesConfig {
    pub sites: Vec<SiteSpec>,
}

/// One configured site visit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSpec {
    pub url: String,
    /// Categorical flow label, e.g. `accept`, `reject`, `browse`.
    pub flow_type: String,
    /// Browser language preference, e.g. `"en-US, en"`.
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub block_all_cookies: bool,
    #[serde(default)]
    pub block_third_party_cookies: bool,
    #[serde(default)]
    pub enable_do_not_track: bool,
    #[serde(default)]
    pub flow: Vec<FlowStep>,
}

impl SiteSpec {
    /// Flow label used for output paths and the store: the configured
    /// `flow_type` with one suffix appended per active blocking option.
    /// Rendered once per run, before any output path is derived.
    pub fn effective_flow_type(&self) -> String {
        let mut label = self.flow_type.clone();
        if self.block_all_cookies {
            label.push_str("_block_all");
        }
        if self.block_third_party_cookies {
            label.push_str("_block_third_party");
        }
        if self.enable_do_not_track {
            label.push_str("_do_not_track");
        }
        label
    }

    pub fn hostname(&self) -> Option<String> {
        url::Url::parse(&self.url)
            .ok()?
            .host_str()
            .map(|host| host.to_string())
    }
}

/// One interpreter instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FlowStep {
    /// Switch context into an iframe.
    NavigateFrame { frame: FrameTarget },
    Click {
        element: ElementDescriptor,
        /// Skip the native click and dispatch a script click directly.
        #[serde(default)]
        javascript: bool,
    },
    TypeText {
        element: ElementDescriptor,
        text: String,
    },
    Submit { element: ElementDescriptor },
    /// Without an element: session-wide implicit wait. With one: bounded
    /// wait for `condition` on the target, timing out loudly.
    Wait {
        seconds: u64,
        #[serde(default)]
        element: Option<ElementDescriptor>,
        #[serde(default)]
        condition: Option<WaitCondition>,
    },
    /// Capture the page body or a specific element as a PNG.
    Screenshot {
        #[serde(default)]
        element: Option<ElementDescriptor>,
        #[serde(default)]
        filename: Option<String>,
    },
    Pause { seconds: u64 },
}

/// Either a zero-based frame index or an element resolving to the frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameTarget {
    Index { index: u16 },
    Element(ElementDescriptor),
}

/// Locator strategy resolving to at most one concrete element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementDescriptor {
    pub by: By,
    pub value: String,
    /// Expect several candidates and refine by `match` text.
    #[serde(default)]
    pub multiple: bool,
    /// Case-insensitive substring picking among candidates when
    /// `multiple` is set.
    #[serde(default, rename = "match")]
    pub match_text: Option<String>,
}

impl ElementDescriptor {
    pub fn by_tag(value: &str) -> Self {
        Self {
            by: By::TagName,
            value: value.to_string(),
            multiple: false,
            match_text: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum By {
    Css,
    #[serde(rename = "xpath")]
    XPath,
    Id,
    LinkText,
    TagName,
    ClassName,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitCondition {
    #[default]
    Clickable,
    Present,
    Visible,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
sites:
  - url: https://example.com
    flow_type: accept
    language: "en-US, en"
    flow:
      - action: wait
        seconds: 5
        element:
          by: css
          value: "#consent"
        condition: visible
      - action: navigate_frame
        frame:
          index: 0
      - action: navigate_frame
        frame:
          by: css
          value: "iframe#gdpr"
      - action: click
        element:
          by: xpath
          value: "//button"
          multiple: true
          match: "Accept"
      - action: type_text
        element:
          by: id
          value: email
        text: "user@example.com"
      - action: submit
        element:
          by: css
          value: form
      - action: screenshot
        element:
          by: class_name
          value: banner
        filename: banner
      - action: pause
        seconds: 2
  - url: https://example.com
    flow_type: reject
    block_third_party_cookies: true
    flow: []
"##;

    #[test]
    fn parses_every_step_kind() {
        let config: SitesConfig = serde_yaml::from_str(SAMPLE).expect("config should parse");
        let site = &config.sites[0];
        assert_eq!(site.flow.len(), 8);
        assert!(matches!(
            site.flow[0],
            FlowStep::Wait {
                seconds: 5,
                condition: Some(WaitCondition::Visible),
                ..
            }
        ));
        assert!(matches!(
            site.flow[1],
            FlowStep::NavigateFrame {
                frame: FrameTarget::Index { index: 0 }
            }
        ));
        assert!(matches!(
            site.flow[2],
            FlowStep::NavigateFrame {
                frame: FrameTarget::Element(_)
            }
        ));
        match &site.flow[3] {
            FlowStep::Click { element, javascript } => {
                assert_eq!(element.by, By::XPath);
                assert!(element.multiple);
                assert_eq!(element.match_text.as_deref(), Some("Accept"));
                assert!(!javascript);
            }
            other => panic!("expected click, got {other:?}"),
        }
        assert!(matches!(site.flow[4], FlowStep::TypeText { .. }));
        assert!(matches!(site.flow[5], FlowStep::Submit { .. }));
        match &site.flow[6] {
            FlowStep::Screenshot { element, filename } => {
                assert_eq!(element.as_ref().map(|e| e.by), Some(By::ClassName));
                assert_eq!(filename.as_deref(), Some("banner"));
            }
            other => panic!("expected screenshot, got {other:?}"),
        }
        assert!(matches!(site.flow[7], FlowStep::Pause { seconds: 2 }));
    }

    #[test]
    fn flow_label_appends_one_suffix_per_flag() {
        let config: SitesConfig = serde_yaml::from_str(SAMPLE).expect("config should parse");
        assert_eq!(config.sites[0].effective_flow_type(), "accept");
        assert_eq!(
            config.sites[1].effective_flow_type(),
            "reject_block_third_party"
        );

        let mut site = config.sites[1].clone();
        site.block_all_cookies = true;
        site.enable_do_not_track = true;
        assert_eq!(
            site.effective_flow_type(),
            "reject_block_all_block_third_party_do_not_track"
        );
    }

    #[test]
    fn hostname_comes_from_the_url() {
        let config: SitesConfig = serde_yaml::from_str(SAMPLE).expect("config should parse");
        assert_eq!(config.sites[0].hostname().as_deref(), Some("example.com"));
    }
}
