// src/options.rs
//
// Per-link annotations. A markdown link title may carry a marker followed by
// `key=value` pairs:
//
//   [Report](files/report.pdf ':pdf-preview mode=inline height=60vh')
//
// Docsify drops unknown title syntax while rendering, so the annotation is
// moved into the href as a reserved query parameter before rendering and
// decoded again by the link scanner afterwards.

use crate::utils::{decode_component, encode_component};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

pub const MARKER: &str = ":pdf-preview";
pub const OPTIONS_PARAM: &str = "__pdfOpts";

lazy_static! {
    static ref PAIR_RE: Regex = Regex::new(r#"(\w+)=(?:"([^"]*)"|'([^']*)'|(\S+))"#).unwrap();
    static ref TITLE_RE: Regex = Regex::new(
        r#"\(([^\s)]+)\s+(?:'([^'"]*:pdf-preview[^'"]*)'|"([^'"]*:pdf-preview[^'"]*)")\)"#
    )
    .unwrap();
}

/// The explicitly supplied keys of one annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkOptions {
    pub mode: Option<String>,
    pub backend: Option<String>,
    pub height: Option<String>,
    pub modal_width: Option<String>,
    pub modal_height: Option<String>,
}

impl LinkOptions {
    pub fn is_empty(&self) -> bool {
        self.mode.is_none()
            && self.backend.is_none()
            && self.height.is_none()
            && self.modal_width.is_none()
            && self.modal_height.is_none()
    }

    fn set(&mut self, key: &str, value: &str) {
        let slot = match key {
            "mode" => &mut self.mode,
            "backend" => &mut self.backend,
            "height" => &mut self.height,
            "modalWidth" => &mut self.modal_width,
            "modalHeight" => &mut self.modal_height,
            _ => return,
        };
        *slot = Some(value.to_string());
    }
}

/// Parse the annotation in a link title.
///
/// `None` when the marker is absent, an empty set when the marker carries no
/// pairs. Unknown keys and malformed pairs are skipped.
pub fn parse_link_options(title: &str) -> Option<LinkOptions> {
    let marker = title.find(MARKER)?;
    let raw = title[marker + MARKER.len()..].trim();

    let mut options = LinkOptions::default();
    for caps in PAIR_RE.captures_iter(raw) {
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str())
            .unwrap_or_default();
        options.set(&caps[1], value);
    }
    Some(options)
}

/// Append the raw annotation text to `url` as the reserved parameter,
/// keeping any fragment at the end.
pub fn encode_options_into_href(url: &str, raw_options: &str) -> String {
    let (target, fragment) = match url.find('#') {
        Some(idx) => (&url[..idx], &url[idx..]),
        None => (url, ""),
    };
    let separator = if target.contains('?') { '&' } else { '?' };
    format!(
        "{}{}{}={}{}",
        target,
        separator,
        OPTIONS_PARAM,
        encode_component(raw_options),
        fragment
    )
}

/// Move every `':pdf-preview ...'` title annotation in raw markdown into its
/// link target. Remaining title text is kept as a plain title.
pub fn encode_options_in_markdown(content: &str) -> String {
    TITLE_RE
        .replace_all(content, |caps: &Captures| {
            let url = &caps[1];
            let title = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();

            let marker = title.find(MARKER).unwrap_or(title.len());
            let raw_options = title[(marker + MARKER.len()).min(title.len())..].trim();
            let clean_title = title[..marker].trim();

            let href = encode_options_into_href(url, raw_options);
            if clean_title.is_empty() {
                format!("({})", href)
            } else {
                format!("({} \"{}\")", href, clean_title)
            }
        })
        .into_owned()
}

/// Strip the reserved parameter from a rendered href.
///
/// Returns the cleaned href and the decoded options; options are `None` when
/// the href carried no annotation.
pub fn extract_link_options(href: &str) -> (String, Option<LinkOptions>) {
    let prefix = format!("{}=", OPTIONS_PARAM);
    if !href.contains(&prefix) {
        return (href.to_string(), None);
    }

    let (without_hash, hash) = match href.find('#') {
        Some(idx) => (&href[..idx], &href[idx..]),
        None => (href, ""),
    };
    let (base, query) = match without_hash.find('?') {
        Some(idx) => (&without_hash[..idx], &without_hash[idx + 1..]),
        None => (without_hash, ""),
    };

    let mut raw_options = String::new();
    let mut remaining = Vec::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        match pair.strip_prefix(&prefix) {
            Some(encoded) => raw_options = decode_component(encoded),
            None => remaining.push(pair),
        }
    }

    let mut clean = base.to_string();
    if !remaining.is_empty() {
        clean.push('?');
        clean.push_str(&remaining.join("&"));
    }
    clean.push_str(hash);

    let options = if raw_options.is_empty() {
        LinkOptions::default()
    } else {
        parse_link_options(&format!("{} {}", MARKER, raw_options)).unwrap_or_default()
    };
    (clean, Some(options))
}
