// src/components/mod.rs
//
// Widgets the plugin owns outright. A host mounts one into a container it
// created; the container itself stays under the caller's control.

pub mod modal_panel;
pub mod paged_toolbar;

pub use modal_panel::{ModalPanel, ModalPanelProps};
pub use paged_toolbar::{PagedToolbar, PagedToolbarProps};

use yew::{BaseComponent, LocalServerRenderer};

#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    ModalPanel(ModalPanelProps),
    PagedToolbar(PagedToolbarProps),
}

impl Widget {
    /// Render once to static markup, for hosts without a live DOM.
    pub fn to_markup(&self) -> String {
        match self {
            Widget::ModalPanel(props) => render_static::<ModalPanel>(props.clone()),
            Widget::PagedToolbar(props) => render_static::<PagedToolbar>(props.clone()),
        }
    }
}

fn render_static<C: BaseComponent>(props: C::Properties) -> String {
    let renderer = LocalServerRenderer::<C>::with_props(props).hydratable(false);
    futures::executor::block_on(renderer.render())
}
