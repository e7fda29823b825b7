// src/renderer.rs
use crate::backend::{Backends, PdfEngine};
use crate::config::{Mode, PreviewConfig};
use crate::host::{Host, NodeId};
use crate::markup::{self, EXPAND_CLASS, FRAME_AREA_CLASS};
use crate::scanner::{LinkDescriptor, PROCESSED_ATTR};
use log::{debug, warn};

/// Where a processed link ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The link was replaced by an inline viewer.
    Inline { region: NodeId, expand: Option<NodeId> },
    /// A modal trigger was inserted after the link.
    Trigger { button: NodeId },
    /// The host could not place any markup; the link stays as it was.
    Untouched,
}

impl Placement {
    /// Control that opens the shared modal for this link, if any.
    pub fn modal_control(&self) -> Option<NodeId> {
        match *self {
            Placement::Inline { expand, .. } => expand,
            Placement::Trigger { button } => Some(button),
            Placement::Untouched => None,
        }
    }
}

/// Handle one scanned link: mark it processed, apply its own options and
/// render it in the resulting mode.
///
/// Returns the effective per-link configuration with the placement, so the
/// caller can bind modal controls to it.
pub fn process_link<H: Host + ?Sized, E: PdfEngine>(
    host: &mut H,
    backends: &mut Backends<E>,
    info: &LinkDescriptor,
    config: &PreviewConfig,
) -> (PreviewConfig, Placement) {
    host.set_attribute(info.element, PROCESSED_ATTR, "1");

    let config = match &info.link_options {
        Some(options) if !options.is_empty() => config.with_link_options(options),
        _ => config.clone(),
    };

    let placement = match config.mode {
        Mode::Inline => render_inline(host, backends, info, &config),
        // an inline viewer is not created alongside the trigger
        Mode::Modal | Mode::Both => render_trigger(host, info),
    };
    if placement == Placement::Untouched {
        warn!("could not place preview for {}", info.resolved_url);
    }
    (config, placement)
}

fn render_inline<H: Host + ?Sized, E: PdfEngine>(
    host: &mut H,
    backends: &mut Backends<E>,
    info: &LinkDescriptor,
    config: &PreviewConfig,
) -> Placement {
    let container = markup::inline_container(info, config);
    let Some(region) = host.replace_with_markup(info.element, &container) else {
        return Placement::Untouched;
    };

    match host.find(region, &format!(".{}", FRAME_AREA_CLASS)) {
        Some(frame_area) => backends.populate(host, frame_area, &info.resolved_url, config.backend),
        None => debug!("inline region without frame area for {}", info.resolved_url),
    }

    Placement::Inline {
        region,
        expand: host.find(region, &format!(".{}", EXPAND_CLASS)),
    }
}

fn render_trigger<H: Host + ?Sized>(host: &mut H, info: &LinkDescriptor) -> Placement {
    match host.insert_markup_after(info.element, &markup::modal_trigger(info)) {
        Some(button) => Placement::Trigger { button },
        None => Placement::Untouched,
    }
}
