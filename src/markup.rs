// src/markup.rs
//
// Markup placed into the host's own content: inline viewers, native embeds,
// modal triggers and the empty modal overlay. Values that come from a URL or
// filename go through `escape_attr` before insertion. Widgets rendered inside
// these live in `components`.

use crate::config::PreviewConfig;
use crate::scanner::{LinkDescriptor, PROCESSED_ATTR};
use crate::utils::escape_attr;

pub const MODAL_OVERLAY_ID: &str = "pdf-preview-modal-overlay";
pub const FRAME_AREA_CLASS: &str = "pdf-preview-frame-area";
pub const EXPAND_CLASS: &str = "pdf-inline-expand-btn";

/// Generated anchors point at the same PDF and must not be scanned again.
fn processed() -> String {
    format!(r#" {}="1""#, PROCESSED_ATTR)
}

/// Header bar shared by the inline viewer: spacer, filename, controls.
fn inline_header(url: &str, name: &str, config: &PreviewConfig) -> String {
    let mark = processed();
    let mut controls = String::new();
    if config.open_button {
        controls.push_str(&format!(
            r#"<a class="pdf-btn pdf-open-btn" href="{url}"{mark} target="_blank" rel="noopener noreferrer" aria-label="Open {name} in new tab">Open</a>"#
        ));
    }
    if config.download_button {
        controls.push_str(&format!(
            r#"<a class="pdf-btn pdf-download-btn" href="{url}"{mark} download="{name}" aria-label="Download {name}">Download</a>"#
        ));
    }
    controls.push_str(&format!(
        r#"<button class="{EXPAND_CLASS}" type="button" aria-label="Expand to full screen" aria-haspopup="dialog">&#x2197;</button>"#
    ));

    format!(
        concat!(
            r#"<div class="pdf-preview-header">"#,
            r#"<span class="pdf-preview-modal-spacer"></span>"#,
            r#"<a class="pdf-preview-filename" href="{url}"{mark} target="_blank" rel="noopener noreferrer" aria-label="Open {name} in new tab">{name}</a>"#,
            r#"<span class="pdf-preview-controls">{controls}</span>"#,
            r#"</div>"#
        ),
        url = url,
        name = name,
        mark = mark,
        controls = controls
    )
}

/// Self-contained inline block. The frame area starts empty and is filled
/// by the backend.
pub fn inline_container(info: &LinkDescriptor, config: &PreviewConfig) -> String {
    let url = escape_attr(&info.resolved_url);
    let name = escape_attr(&info.filename);
    format!(
        r#"<div class="pdf-preview-inline" role="region" aria-label="PDF Preview: {name}">{header}<div class="{FRAME_AREA_CLASS}" style="height:{height}"></div></div>"#,
        name = name,
        header = inline_header(&url, &name, config),
        height = escape_attr(&config.height),
    )
}

/// Frame plus the textual fallback shown when the frame has no source.
pub fn native_embed(url: &str, filename: &str) -> String {
    let url = escape_attr(url);
    let name = escape_attr(filename);
    format!(
        concat!(
            r#"<iframe class="pdf-preview-frame" src="{url}" title="PDF preview: {name}" aria-label="PDF preview: {name}"></iframe>"#,
            r#"<div class="pdf-preview-fallback" aria-live="polite">Your browser cannot display this PDF. "#,
            r#"<a href="{url}"{mark} target="_blank" rel="noopener noreferrer">Open</a> or "#,
            r#"<a href="{url}"{mark} download="{name}">Download</a> it.</div>"#
        ),
        url = url,
        name = name,
        mark = processed()
    )
}

pub fn modal_trigger(info: &LinkDescriptor) -> String {
    let url = escape_attr(&info.resolved_url);
    let name = escape_attr(&info.filename);
    format!(
        r#"<button class="pdf-preview-modal-btn" type="button" aria-haspopup="dialog" aria-label="Preview PDF: {name}" data-pdf-url="{url}" data-pdf-name="{name}">&#x1F4C4; Preview PDF</button>"#
    )
}

/// Backdrop of the shared modal, hidden until first opened. The panel is
/// mounted inside it.
pub fn modal_overlay() -> String {
    format!(
        r#"<div id="{}" class="pdf-preview-modal-overlay" role="dialog" aria-modal="true" aria-label="PDF Viewer" style="display:none"></div>"#,
        MODAL_OVERLAY_ID
    )
}
