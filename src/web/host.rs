// src/web/host.rs
use super::Mailbox;
use crate::components::{ModalPanel, PagedToolbar, Widget};
use crate::host::{Host, NodeId};
use crate::previewer::Msg;
use gloo::timers::callback::Timeout;
use gloo_utils::{document, window};
use log::{debug, warn};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, HtmlElement, NodeList};
use yew::AppHandle;

const FOCUSABLE: &str = r#"a[href], button:not([disabled]), [tabindex]:not([tabindex="-1"])"#;
/// Carries the handle index of an interned element.
const NODE_ATTR: &str = "data-pdf-node";

#[derive(Default)]
struct Interned {
    elements: HashMap<usize, Element>,
    next: usize,
}

/// Elements the previewer holds handles to. Shared with the pdf.js engine,
/// which resolves canvas handles through it.
#[derive(Clone, Default)]
pub struct NodeTable {
    inner: Rc<RefCell<Interned>>,
}

impl NodeTable {
    pub fn intern(&self, element: &Element) -> NodeId {
        let mut table = self.inner.borrow_mut();
        let tagged = element
            .get_attribute(NODE_ATTR)
            .and_then(|value| value.parse::<usize>().ok());
        if let Some(index) = tagged {
            let known = table.elements.get(&index);
            if known.is_some_and(|known| known.is_same_node(Some(&**element))) {
                return NodeId::new(index);
            }
        }

        // Untagged, or a copy carrying another element's tag.
        table.next += 1;
        let index = table.next;
        if let Err(err) = element.set_attribute(NODE_ATTR, &index.to_string()) {
            debug!("could not tag element: {:?}", err);
        }
        table.elements.insert(index, element.clone());
        NodeId::new(index)
    }

    pub fn get(&self, node: NodeId) -> Option<Element> {
        self.inner.borrow().elements.get(&node.index()).cloned()
    }

    /// Forget elements no longer in the document; returns how many.
    pub fn release_detached(&self) -> usize {
        let mut table = self.inner.borrow_mut();
        let before = table.elements.len();
        table.elements.retain(|_, element| element.is_connected());
        before - table.elements.len()
    }
}

enum Mounted {
    ModalPanel(AppHandle<ModalPanel>),
    PagedToolbar(AppHandle<PagedToolbar>),
}

impl Mounted {
    fn start(root: Element, widget: Widget) -> Self {
        match widget {
            Widget::ModalPanel(props) => Mounted::ModalPanel(
                yew::Renderer::<ModalPanel>::with_root_and_props(root, props).render(),
            ),
            Widget::PagedToolbar(props) => Mounted::PagedToolbar(
                yew::Renderer::<PagedToolbar>::with_root_and_props(root, props).render(),
            ),
        }
    }

    fn destroy(self) {
        match self {
            Mounted::ModalPanel(app) => app.destroy(),
            Mounted::PagedToolbar(app) => app.destroy(),
        }
    }
}

fn report(context: &str, result: Result<(), JsValue>) {
    if let Err(err) = result {
        warn!("{}: {:?}", context, err);
    }
}

pub struct BrowserHost {
    nodes: NodeTable,
    mailbox: Mailbox,
    /// Widgets rendered by yew, keyed by their container.
    apps: HashMap<NodeId, Mounted>,
}

impl BrowserHost {
    pub fn new(nodes: NodeTable, mailbox: Mailbox) -> Self {
        Self {
            nodes,
            mailbox,
            apps: HashMap::new(),
        }
    }

    fn unmount(&mut self, container: NodeId) {
        if let Some(app) = self.apps.remove(&container) {
            app.destroy();
        }
    }

    pub fn intern(&mut self, element: &Element) -> NodeId {
        self.nodes.intern(element)
    }

    fn element(&self, node: NodeId) -> Option<Element> {
        self.nodes.get(node)
    }

    fn html_element(&self, node: NodeId) -> Option<HtmlElement> {
        self.element(node)?.dyn_into::<HtmlElement>().ok()
    }

    fn intern_list(&self, list: NodeList) -> Vec<NodeId> {
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|element| self.nodes.intern(&element))
            .collect()
    }

    /// Parse `markup` and return its first element, detached.
    fn build(&self, markup: &str) -> Option<Element> {
        let holder = document().create_element("div").ok()?;
        holder.set_inner_html(markup);
        holder.first_element_child()
    }
}

impl Host for BrowserHost {
    fn content_links(&self) -> Vec<NodeId> {
        match document().query_selector_all(".markdown-section a[href]") {
            Ok(list) => self.intern_list(list),
            Err(err) => {
                warn!("link query failed: {:?}", err);
                Vec::new()
            }
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.element(node)?.get_attribute(name)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element(node) {
            report("set attribute", element.set_attribute(name, value));
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(element) = self.element(node) {
            report("remove attribute", element.remove_attribute(name));
        }
    }

    fn in_code_block(&self, node: NodeId) -> bool {
        self.element(node)
            .and_then(|element| element.closest("code, pre").ok().flatten())
            .is_some()
    }

    fn replace_with_markup(&mut self, node: NodeId, markup: &str) -> Option<NodeId> {
        let target = self.element(node)?;
        target.parent_node()?;
        let replacement = self.build(markup)?;
        report("replace element", target.replace_with_with_node_1(&replacement));
        Some(self.nodes.intern(&replacement))
    }

    fn insert_markup_after(&mut self, node: NodeId, markup: &str) -> Option<NodeId> {
        let target = self.element(node)?;
        target.parent_node()?;
        let inserted = self.build(markup)?;
        report("insert element", target.after_with_node_1(&inserted));
        Some(self.nodes.intern(&inserted))
    }

    fn append_to_body(&mut self, markup: &str) -> Option<NodeId> {
        let element = self.build(markup)?;
        document().body()?.append_child(&element).ok()?;
        Some(self.nodes.intern(&element))
    }

    fn set_inner_markup(&mut self, node: NodeId, markup: &str) {
        self.unmount(node);
        if let Some(element) = self.element(node) {
            element.set_inner_html(markup);
        }
    }

    fn mount(&mut self, container: NodeId, widget: Widget) {
        // Same widget already there: new props only.
        let widget = match (self.apps.get_mut(&container), widget) {
            (Some(Mounted::ModalPanel(app)), Widget::ModalPanel(props)) => {
                app.update(props);
                return;
            }
            (Some(Mounted::PagedToolbar(app)), Widget::PagedToolbar(props)) => {
                app.update(props);
                return;
            }
            (_, widget) => widget,
        };

        self.unmount(container);
        let Some(root) = self.element(container) else {
            warn!("mount target is gone");
            return;
        };
        root.set_inner_html("");
        self.apps.insert(container, Mounted::start(root, widget));
    }

    fn release_detached(&mut self) {
        let gone: Vec<NodeId> = self
            .apps
            .keys()
            .copied()
            .filter(|&id| !self.element(id).is_some_and(|root| root.is_connected()))
            .collect();
        for container in gone {
            self.unmount(container);
        }
        let released = self.nodes.release_detached();
        if released > 0 {
            debug!("released {} detached elements", released);
        }
    }

    fn find(&self, root: NodeId, selector: &str) -> Option<NodeId> {
        let found = self.element(root)?.query_selector(selector).ok().flatten()?;
        Some(self.nodes.intern(&found))
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(element) = self.element(node) {
            element.set_text_content(Some(text));
        }
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(element) = self.html_element(node) {
            report("set style", element.style().set_property(property, value));
        }
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        match (self.element(ancestor), self.element(node)) {
            (Some(ancestor), Some(node)) => ancestor.contains(Some(&*node)),
            _ => false,
        }
    }

    fn focusable_within(&self, root: NodeId) -> Vec<NodeId> {
        let Some(root_element) = self.element(root) else {
            return Vec::new();
        };
        let Ok(list) = root_element.query_selector_all(FOCUSABLE) else {
            return Vec::new();
        };
        self.intern_list(list)
            .into_iter()
            .filter(|&id| {
                let hidden = self
                    .element(id)
                    .and_then(|element| element.closest("[hidden]").ok().flatten());
                match hidden {
                    Some(hidden) => !root_element.contains(Some(&*hidden)),
                    None => true,
                }
            })
            .collect()
    }

    fn focus(&mut self, node: NodeId) {
        if let Some(element) = self.html_element(node) {
            report("focus", element.focus());
        }
    }

    fn active_element(&self) -> Option<NodeId> {
        let active = document().active_element()?;
        Some(self.nodes.intern(&active))
    }

    fn set_scroll_locked(&mut self, locked: bool) {
        let Some(body) = document().body() else {
            return;
        };
        let style = body.style();
        if locked {
            report("lock scroll", style.set_property("overflow", "hidden"));
        } else {
            report("unlock scroll", style.remove_property("overflow").map(|_| ()));
        }
    }

    fn location_hash(&self) -> String {
        window().location().hash().unwrap_or_default()
    }

    fn push_hash(&mut self, hash: &str) {
        match window().history() {
            Ok(history) => report(
                "push history",
                history.push_state_with_url(&JsValue::NULL, "", Some(hash)),
            ),
            Err(err) => warn!("history unavailable: {:?}", err),
        }
    }

    fn schedule_timer(&mut self, delay_ms: u32, token: u64) {
        let mailbox = self.mailbox.clone();
        Timeout::new(delay_ms, move || mailbox.send(Msg::FocusTimer(token))).forget();
    }

    fn inject_styles(&mut self, id: &str, css: &str) {
        let document = document();
        if document.get_element_by_id(id).is_some() {
            return;
        }
        let Ok(style) = document.create_element("style") else {
            return;
        };
        style.set_id(id);
        style.set_text_content(Some(css));
        if let Some(head) = document.head() {
            report("inject styles", head.append_child(&style).map(|_| ()));
        }
    }
}
