// src/host/mod.rs
//
// The page the plugin runs in. Elements are never owned here: a `NodeId` is
// an opaque handle the host resolves back to its own element.

pub mod headless;

pub use headless::HeadlessHost;

use crate::components::Widget;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub key: String,
    pub shift: bool,
}

impl KeyPress {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            shift: false,
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }
}

/// Query and mutation interface of the host rendering layer.
///
/// Markup passed to the `*_markup` methods is produced by this crate and has
/// already been escaped. Methods taking a root return `None` when the host
/// could not place the element (for example a link that lost its parent).
pub trait Host {
    /// Anchors with an `href` inside the rendered content, in document order.
    fn content_links(&self) -> Vec<NodeId>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);
    fn remove_attribute(&mut self, node: NodeId, name: &str);

    /// True when `node` sits inside `<code>` or `<pre>`.
    fn in_code_block(&self, node: NodeId) -> bool;

    /// Replace `node` with the single root element of `markup`.
    fn replace_with_markup(&mut self, node: NodeId, markup: &str) -> Option<NodeId>;
    /// Insert the root element of `markup` as the next sibling of `node`.
    fn insert_markup_after(&mut self, node: NodeId, markup: &str) -> Option<NodeId>;
    fn append_to_body(&mut self, markup: &str) -> Option<NodeId>;
    fn set_inner_markup(&mut self, node: NodeId, markup: &str);

    /// Render `widget` as the only content of `container`, updating the one
    /// already mounted there. Handles inside the widget may change with
    /// every mount and should be looked up again afterwards.
    fn mount(&mut self, container: NodeId, widget: Widget);

    /// Drop handles to elements that are no longer in the document. Such
    /// handles are invalid afterwards and may be reused.
    fn release_detached(&mut self);

    /// First descendant of `root` matching a simple selector
    /// (`tag`, `#id`, `.class`, `[attr]` and compounds of those).
    fn find(&self, root: NodeId, selector: &str) -> Option<NodeId>;

    fn set_text(&mut self, node: NodeId, text: &str);
    fn set_style(&mut self, node: NodeId, property: &str, value: &str);

    /// True when `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool;
    /// Visible keyboard-focusable descendants of `root`, in tab order.
    fn focusable_within(&self, root: NodeId) -> Vec<NodeId>;
    fn focus(&mut self, node: NodeId);
    fn active_element(&self) -> Option<NodeId>;

    fn set_scroll_locked(&mut self, locked: bool);

    fn location_hash(&self) -> String;
    /// Push a new history entry with the given fragment.
    fn push_hash(&mut self, hash: &str);

    /// Deliver `Msg::FocusTimer(token)` after `delay_ms`.
    fn schedule_timer(&mut self, delay_ms: u32, token: u64);

    /// Add a stylesheet once; later calls with the same id do nothing.
    fn inject_styles(&mut self, id: &str, css: &str);
}
