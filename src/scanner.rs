// src/scanner.rs
use crate::config::PreviewConfig;
use crate::host::{Host, NodeId};
use crate::options::{extract_link_options, LinkOptions};
use crate::utils::{filename_from_url, is_safe_url, resolve_pdf_url};
use log::debug;

/// Set on a source link once it has been handled.
pub const PROCESSED_ATTR: &str = "data-pdf-preview-processed";

/// One matched link of a scan pass. Lives only until it is processed.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkDescriptor {
    pub element: NodeId,
    /// href with the reserved options parameter removed
    pub href: String,
    pub resolved_url: String,
    pub filename: String,
    pub link_options: Option<LinkOptions>,
}

/// Collect every unprocessed, matching, safe PDF link outside code blocks.
///
/// Has no side effects; processing marks the links.
pub fn scan_pdf_links<H: Host + ?Sized>(
    host: &H,
    config: &PreviewConfig,
    base_path: &str,
    current_route: &str,
) -> Vec<LinkDescriptor> {
    let mut results = Vec::new();

    for element in host.content_links() {
        if host.attribute(element, PROCESSED_ATTR).is_some() {
            continue;
        }
        if host.in_code_block(element) {
            continue;
        }
        let Some(href) = host.attribute(element, "href") else {
            continue;
        };

        let (clean_href, link_options) = extract_link_options(&href);

        if !config.matches(&clean_href) {
            continue;
        }
        if !is_safe_url(&clean_href) {
            debug!("skipping unsafe PDF link {:?}", clean_href);
            continue;
        }

        let resolved_url = resolve_pdf_url(&clean_href, base_path, current_route);
        if !is_safe_url(&resolved_url) {
            debug!("skipping PDF link {:?}: unsafe after resolution", clean_href);
            continue;
        }

        results.push(LinkDescriptor {
            element,
            filename: filename_from_url(&clean_href),
            href: clean_href,
            resolved_url,
            link_options,
        });
    }

    results
}
