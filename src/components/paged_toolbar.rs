// src/components/paged_toolbar.rs
use crate::backend::PageAction;
use yew::prelude::*;

pub const CANVAS_CLASS: &str = "pdf-paged-canvas";
/// Marks a toolbar button with the `PageAction` it triggers.
pub const ACTION_ATTR: &str = "data-pdf-action";

pub fn page_indicator(page: u32, total: u32) -> String {
    format!("Page {} / {}", page, total)
}

pub fn canvas_label(page: u32, total: u32) -> String {
    format!("PDF page {} of {}", page, total)
}

#[derive(Properties, PartialEq, Clone, Debug)]
pub struct PagedToolbarProps {
    pub page: u32,
    pub total_pages: u32,
}

/// Navigation toolbar and canvas of the paged backend. Canvas size is set
/// by the renderer just before each draw.
#[function_component(PagedToolbar)]
pub fn paged_toolbar(props: &PagedToolbarProps) -> Html {
    let PagedToolbarProps { page, total_pages } = *props;

    html! {
        <div class="pdf-paged-viewer">
            <div class="pdf-paged-controls" role="toolbar" aria-label="PDF navigation controls">
                <button
                    type="button"
                    class="pdf-btn pdf-paged-prev"
                    data-pdf-action={PageAction::Prev.as_str()}
                    aria-label="Previous page"
                    disabled={page <= 1}
                >
                    { "\u{25C0} Prev" }
                </button>
                <span class="pdf-paged-page-info" aria-live="polite">
                    { page_indicator(page, total_pages) }
                </span>
                <button
                    type="button"
                    class="pdf-btn pdf-paged-next"
                    data-pdf-action={PageAction::Next.as_str()}
                    aria-label="Next page"
                    disabled={page >= total_pages}
                >
                    { "Next \u{25B6}" }
                </button>
                <button
                    type="button"
                    class="pdf-btn pdf-paged-zoom-in"
                    data-pdf-action={PageAction::ZoomIn.as_str()}
                    aria-label="Zoom in"
                >
                    { "+ Zoom In" }
                </button>
                <button
                    type="button"
                    class="pdf-btn pdf-paged-zoom-out"
                    data-pdf-action={PageAction::ZoomOut.as_str()}
                    aria-label="Zoom out"
                >
                    { "- Zoom Out" }
                </button>
            </div>
            <canvas
                class={CANVAS_CLASS}
                role="img"
                aria-label={canvas_label(page, total_pages)}
            ></canvas>
        </div>
    }
}
