// src/config.rs
use crate::error::Error;
use crate::options::LinkOptions;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

pub const DEFAULT_MATCH: &str = r"(?i)\.pdf(\?.*)?$";

/// How a matched link is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Mode {
    Inline,
    Modal,
    Both,
}

/// Which engine fills an inline frame area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Backend {
    Native,
    Paged,
}

impl From<&str> for Mode {
    /// Unknown values map to `Modal`.
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "inline" => Mode::Inline,
            "both" => Mode::Both,
            _ => Mode::Modal,
        }
    }
}

impl From<String> for Mode {
    fn from(value: String) -> Self {
        Mode::from(value.as_str())
    }
}

impl From<&str> for Backend {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "paged" | "pdfjs" => Backend::Paged,
            _ => Backend::Native,
        }
    }
}

impl From<String> for Backend {
    fn from(value: String) -> Self {
        Backend::from(value.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct PreviewConfig {
    pub enabled: bool,
    pub mode: Mode,
    pub backend: Backend,
    pub height: String,
    pub modal_width: String,
    pub modal_height: String,
    pub download_button: bool,
    pub open_button: bool,
    pub route_param: Option<String>,
    pub match_pattern: Regex,
}

/// Host-provided overrides, shallow-merged over the defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigOverrides {
    pub enabled: Option<bool>,
    pub mode: Option<Mode>,
    pub backend: Option<Backend>,
    pub height: Option<String>,
    pub modal_width: Option<String>,
    pub modal_height: Option<String>,
    pub download_button: Option<bool>,
    pub open_button: Option<bool>,
    pub route_param: Option<String>,
    #[serde(rename = "match")]
    pub match_pattern: Option<String>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: Mode::Inline,
            backend: Backend::Native,
            height: String::from("75vh"),
            modal_width: String::from("96vw"),
            modal_height: String::from("97vh"),
            download_button: true,
            open_button: true,
            route_param: None,
            match_pattern: default_match(),
        }
    }
}

lazy_static! {
    static ref DEFAULT_MATCH_RE: Regex = Regex::new(DEFAULT_MATCH).unwrap();
}

fn default_match() -> Regex {
    DEFAULT_MATCH_RE.clone()
}

impl PreviewConfig {
    pub fn merged(overrides: &ConfigOverrides) -> Result<Self, Error> {
        let defaults = Self::default();

        let match_pattern = match &overrides.match_pattern {
            Some(pattern) => Regex::new(pattern).map_err(|source| Error::InvalidMatchPattern {
                pattern: pattern.clone(),
                source,
            })?,
            None => defaults.match_pattern,
        };

        Ok(Self {
            enabled: overrides.enabled.unwrap_or(defaults.enabled),
            mode: overrides.mode.unwrap_or(defaults.mode),
            backend: overrides.backend.unwrap_or(defaults.backend),
            height: overrides.height.clone().unwrap_or(defaults.height),
            modal_width: overrides.modal_width.clone().unwrap_or(defaults.modal_width),
            modal_height: overrides.modal_height.clone().unwrap_or(defaults.modal_height),
            download_button: overrides.download_button.unwrap_or(defaults.download_button),
            open_button: overrides.open_button.unwrap_or(defaults.open_button),
            route_param: overrides
                .route_param
                .clone()
                .filter(|name| !name.is_empty()),
            match_pattern,
        })
    }

    /// Parse overrides from the JSON form of `window.$docsify.pdfPreview`.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let overrides: ConfigOverrides = serde_json::from_str(json)?;
        Self::merged(&overrides)
    }

    /// Per-link view of this configuration.
    pub fn with_link_options(&self, options: &LinkOptions) -> Self {
        let mut config = self.clone();
        if let Some(mode) = &options.mode {
            config.mode = Mode::from(mode.as_str());
        }
        if let Some(backend) = &options.backend {
            config.backend = Backend::from(backend.as_str());
        }
        if let Some(height) = &options.height {
            config.height = height.clone();
        }
        if let Some(width) = &options.modal_width {
            config.modal_width = width.clone();
        }
        if let Some(height) = &options.modal_height {
            config.modal_height = height.clone();
        }
        config
    }

    pub fn matches(&self, href: &str) -> bool {
        self.match_pattern.is_match(href)
    }
}
