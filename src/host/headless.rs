// src/host/headless.rs
//
// In-memory host: an arena DOM filled from `scraper` parse trees. Used to
// pre-render pages outside a browser and to drive the plugin in tests.
// Detached nodes keep their slots until `release_detached` frees them.

use super::{Host, NodeId};
use crate::components::Widget;
use crate::utils::escape_attr;
use scraper::{ElementRef, Html};

#[derive(Debug, Clone)]
enum Content {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    content: Content,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(content: Content) -> Self {
        Self {
            content,
            parent: None,
            children: Vec::new(),
        }
    }
}

const SELECTOR_DELIMS: &[char] = &['#', '.', '['];

/// One compound selector: `tag#id.class[attr][attr=value]`.
#[derive(Debug, Default)]
struct SimpleSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

impl SimpleSelector {
    fn parse(selector: &str) -> Self {
        let mut parsed = SimpleSelector::default();
        let mut rest = selector.trim();

        let tag_end = rest.find(SELECTOR_DELIMS).unwrap_or(rest.len());
        if tag_end > 0 {
            parsed.tag = Some(rest[..tag_end].to_ascii_lowercase());
        }
        rest = &rest[tag_end..];

        while let Some(first) = rest.chars().next() {
            match first {
                '[' => {
                    let end = rest.find(']').unwrap_or(rest.len());
                    let inner = &rest[1..end];
                    let attr = match inner.split_once('=') {
                        Some((name, value)) => (
                            name.trim().to_string(),
                            Some(value.trim().trim_matches(|c| c == '"' || c == '\'').to_string()),
                        ),
                        None => (inner.trim().to_string(), None),
                    };
                    parsed.attrs.push(attr);
                    rest = rest.get(end + 1..).unwrap_or_default();
                }
                '#' | '.' => {
                    let body = &rest[1..];
                    let end = body.find(SELECTOR_DELIMS).unwrap_or(body.len());
                    let name = body[..end].to_string();
                    if first == '#' {
                        parsed.id = Some(name);
                    } else {
                        parsed.classes.push(name);
                    }
                    rest = &body[end..];
                }
                _ => break,
            }
        }
        parsed
    }
}

pub struct HeadlessHost {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    body: NodeId,
    content: NodeId,
    focused: Option<NodeId>,
    scroll_locked: bool,
    hash: String,
    history: Vec<String>,
    timers: Vec<(u32, u64)>,
    stylesheets: Vec<String>,
}

impl HeadlessHost {
    /// A page whose `.markdown-section` holds `content_html`.
    pub fn new(content_html: &str) -> Self {
        let mut host = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            body: NodeId::new(0),
            content: NodeId::new(0),
            focused: None,
            scroll_locked: false,
            hash: String::from("#/"),
            history: Vec::new(),
            timers: Vec::new(),
            stylesheets: Vec::new(),
        };
        host.body = host.alloc(Content::Element {
            tag: "body".to_string(),
            attrs: Vec::new(),
        });
        host.content = host.alloc(Content::Element {
            tag: "section".to_string(),
            attrs: vec![("class".to_string(), "markdown-section".to_string())],
        });
        host.attach(host.body, host.content);
        host.set_inner_markup(host.content, content_html);
        host
    }

    pub fn content(&self) -> NodeId {
        self.content
    }

    /// Simulate the host re-rendering the content area.
    pub fn set_content(&mut self, content_html: &str) {
        let content = self.content;
        self.set_inner_markup(content, content_html);
    }

    /// Change the fragment without a history push (back/forward navigation).
    pub fn set_hash(&mut self, hash: &str) {
        self.hash = hash.to_string();
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    /// Timers scheduled since the last call, as `(delay_ms, token)`.
    pub fn take_timers(&mut self) -> Vec<(u32, u64)> {
        std::mem::take(&mut self.timers)
    }

    pub fn stylesheets(&self) -> &[String] {
        &self.stylesheets
    }

    /// All attached elements under `<body>` matching a simple selector.
    pub fn query_all(&self, selector: &str) -> Vec<NodeId> {
        let selector = SimpleSelector::parse(selector);
        self.descendants(self.body)
            .into_iter()
            .filter(|&id| self.matches(id, &selector))
            .collect()
    }

    pub fn query(&self, selector: &str) -> Option<NodeId> {
        self.query_all(selector).into_iter().next()
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.node(node).content {
            Content::Element { tag, .. } => Some(tag),
            Content::Text(_) => None,
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).children
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.body {
                return true;
            }
            current = self.node(id).parent;
        }
        false
    }

    pub fn text(&self, node: NodeId) -> String {
        match &self.node(node).content {
            Content::Text(text) => text.clone(),
            Content::Element { .. } => self
                .node(node)
                .children
                .iter()
                .map(|&child| self.text(child))
                .collect(),
        }
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        let style = self.attribute(node, "style")?;
        parse_style(&style)
            .into_iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value)
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    // ------ ARENA ------

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    fn alloc(&mut self, content: Content) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = Node::new(content);
            return id;
        }
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node::new(content));
        id
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    fn detach_children(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.node_mut(node).children);
        for child in children {
            self.node_mut(child).parent = None;
        }
    }

    fn parse_markup(&mut self, markup: &str) -> Vec<NodeId> {
        let fragment = Html::parse_fragment(markup);
        let root = fragment.root_element();
        let mut imported = Vec::new();
        for child in root.children() {
            if let Some(element) = ElementRef::wrap(child) {
                imported.push(self.import_element(element));
            } else if let Some(text) = child.value().as_text() {
                imported.push(self.alloc(Content::Text(text.to_string())));
            }
        }
        imported
    }

    fn import_element(&mut self, element: ElementRef) -> NodeId {
        let value = element.value();
        let id = self.alloc(Content::Element {
            tag: value.name().to_string(),
            attrs: value
                .attrs()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        });
        for child in element.children() {
            let child_id = if let Some(child_element) = ElementRef::wrap(child) {
                self.import_element(child_element)
            } else if let Some(text) = child.value().as_text() {
                self.alloc(Content::Text(text.to_string()))
            } else {
                continue;
            };
            self.attach(id, child_id);
        }
        id
    }

    fn first_element(&mut self, markup: &str) -> Option<NodeId> {
        self.parse_markup(markup)
            .into_iter()
            .find(|&id| self.tag(id).is_some())
    }

    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node(root).children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if self.tag(id).is_some() {
                out.push(id);
            }
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        out
    }

    fn ancestors_inclusive(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            out.push(id);
            current = self.node(id).parent;
        }
        out
    }

    fn matches(&self, node: NodeId, selector: &SimpleSelector) -> bool {
        let Content::Element { tag, attrs } = &self.node(node).content else {
            return false;
        };
        let attr = |name: &str| {
            attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        };

        if selector.tag.as_deref().is_some_and(|t| t != tag) {
            return false;
        }
        if let Some(id) = &selector.id {
            if attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        let classes: Vec<&str> = attr("class").unwrap_or_default().split_whitespace().collect();
        if !selector.classes.iter().all(|c| classes.contains(&c.as_str())) {
            return false;
        }
        selector.attrs.iter().all(|(name, expected)| match (attr(name), expected) {
            (Some(actual), Some(expected)) => actual == expected,
            (Some(_), None) => true,
            (None, _) => false,
        })
    }

    fn is_focusable(&self, node: NodeId) -> bool {
        let Some(tag) = self.tag(node) else {
            return false;
        };
        if self.attribute(node, "tabindex").as_deref() == Some("-1") {
            return false;
        }
        match tag {
            "a" => self.attribute(node, "href").is_some(),
            "button" => self.attribute(node, "disabled").is_none(),
            _ => self.attribute(node, "tabindex").is_some(),
        }
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        match &self.node(node).content {
            Content::Text(text) => out.push_str(&escape_attr(text)),
            Content::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push_str(&format!(" {}=\"{}\"", name, escape_attr(value)));
                }
                out.push('>');
                for &child in &self.node(node).children {
                    self.write_html(child, out);
                }
                out.push_str(&format!("</{}>", tag));
            }
        }
    }
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

impl Host for HeadlessHost {
    fn content_links(&self) -> Vec<NodeId> {
        self.descendants(self.content)
            .into_iter()
            .filter(|&id| self.tag(id) == Some("a") && self.attribute(id, "href").is_some())
            .collect()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match &self.node(node).content {
            Content::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone()),
            Content::Text(_) => None,
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Content::Element { attrs, .. } = &mut self.node_mut(node).content {
            match attrs.iter_mut().find(|(key, _)| key == name) {
                Some(entry) => entry.1 = value.to_string(),
                None => attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Content::Element { attrs, .. } = &mut self.node_mut(node).content {
            attrs.retain(|(key, _)| key != name);
        }
    }

    fn in_code_block(&self, node: NodeId) -> bool {
        self.ancestors_inclusive(node)
            .into_iter()
            .any(|id| matches!(self.tag(id), Some("code") | Some("pre")))
    }

    fn replace_with_markup(&mut self, node: NodeId, markup: &str) -> Option<NodeId> {
        let parent = self.node(node).parent?;
        let position = self.node(parent).children.iter().position(|&c| c == node)?;
        let replacement = self.first_element(markup)?;
        self.node_mut(parent).children[position] = replacement;
        self.node_mut(replacement).parent = Some(parent);
        self.node_mut(node).parent = None;
        Some(replacement)
    }

    fn insert_markup_after(&mut self, node: NodeId, markup: &str) -> Option<NodeId> {
        let parent = self.node(node).parent?;
        let position = self.node(parent).children.iter().position(|&c| c == node)?;
        let inserted = self.first_element(markup)?;
        self.node_mut(parent).children.insert(position + 1, inserted);
        self.node_mut(inserted).parent = Some(parent);
        Some(inserted)
    }

    fn append_to_body(&mut self, markup: &str) -> Option<NodeId> {
        let element = self.first_element(markup)?;
        let body = self.body;
        self.attach(body, element);
        Some(element)
    }

    fn set_inner_markup(&mut self, node: NodeId, markup: &str) {
        self.detach_children(node);
        for child in self.parse_markup(markup) {
            self.attach(node, child);
        }
    }

    fn mount(&mut self, container: NodeId, widget: Widget) {
        let markup = widget.to_markup();
        self.set_inner_markup(container, &markup);
    }

    fn release_detached(&mut self) {
        let mut keep = vec![false; self.nodes.len()];
        let mut stack = vec![self.body];
        while let Some(id) = stack.pop() {
            keep[id.index()] = true;
            stack.extend(self.node(id).children.iter().copied());
        }
        // Already free.
        for id in &self.free {
            keep[id.index()] = true;
        }

        for (index, kept) in keep.into_iter().enumerate() {
            if !kept {
                self.nodes[index] = Node::new(Content::Text(String::new()));
                self.free.push(NodeId::new(index));
            }
        }
        if self.focused.is_some_and(|id| self.free.contains(&id)) {
            self.focused = None;
        }
    }

    fn find(&self, root: NodeId, selector: &str) -> Option<NodeId> {
        let selector = SimpleSelector::parse(selector);
        self.descendants(root)
            .into_iter()
            .find(|&id| self.matches(id, &selector))
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        self.detach_children(node);
        let text_node = self.alloc(Content::Text(text.to_string()));
        self.attach(node, text_node);
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        let mut declarations = parse_style(&self.attribute(node, "style").unwrap_or_default());
        match declarations.iter_mut().find(|(name, _)| name == property) {
            Some(entry) => entry.1 = value.to_string(),
            None => declarations.push((property.to_string(), value.to_string())),
        }
        let style = declarations
            .iter()
            .map(|(name, value)| format!("{}:{}", name, value))
            .collect::<Vec<_>>()
            .join(";");
        self.set_attribute(node, "style", &style);
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors_inclusive(node).contains(&ancestor)
    }

    fn focusable_within(&self, root: NodeId) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&id| self.is_focusable(id))
            .filter(|&id| {
                self.ancestors_inclusive(id)
                    .into_iter()
                    .take_while(|&a| a != root)
                    .all(|a| self.attribute(a, "hidden").is_none())
            })
            .collect()
    }

    fn focus(&mut self, node: NodeId) {
        self.focused = Some(node);
    }

    fn active_element(&self) -> Option<NodeId> {
        self.focused
    }

    fn set_scroll_locked(&mut self, locked: bool) {
        self.scroll_locked = locked;
    }

    fn location_hash(&self) -> String {
        self.hash.clone()
    }

    fn push_hash(&mut self, hash: &str) {
        self.hash = hash.to_string();
        self.history.push(hash.to_string());
    }

    fn schedule_timer(&mut self, delay_ms: u32, token: u64) {
        self.timers.push((delay_ms, token));
    }

    fn inject_styles(&mut self, id: &str, _css: &str) {
        if !self.stylesheets.iter().any(|existing| existing == id) {
            self.stylesheets.push(id.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_links_in_document_order() {
        let host = HeadlessHost::new(
            r#"<p><a href="a.pdf">A</a> <a>no href</a></p><ul><li><a href="b.pdf">B</a></li></ul>"#,
        );
        let links = host.content_links();
        assert_eq!(links.len(), 2);
        assert_eq!(host.attribute(links[0], "href").as_deref(), Some("a.pdf"));
        assert_eq!(host.attribute(links[1], "href").as_deref(), Some("b.pdf"));
    }

    #[test]
    fn test_code_block_detection() {
        let host = HeadlessHost::new(
            r#"<pre><code><a href="x.pdf">x</a></code></pre><a href="y.pdf">y</a>"#,
        );
        let links = host.content_links();
        assert!(host.in_code_block(links[0]));
        assert!(!host.in_code_block(links[1]));
    }

    #[test]
    fn test_replace_and_insert() {
        let mut host = HeadlessHost::new(r#"<p><a href="a.pdf">A</a></p>"#);
        let link = host.content_links()[0];
        let button = host
            .insert_markup_after(link, r#"<button class="after" type="button">go</button>"#)
            .unwrap();
        assert_eq!(host.parent(button), host.parent(link));

        let region = host
            .replace_with_markup(link, r#"<div class="region"><span id="inner">x</span></div>"#)
            .unwrap();
        assert!(!host.is_attached(link));
        assert!(host.is_attached(region));
        let inner = host.find(region, "#inner").map(|n| host.text(n));
        assert_eq!(inner, Some("x".to_string()));
        let paragraph = host.parent(region).unwrap();
        assert_eq!(host.children(paragraph), &[region, button]);
    }

    #[test]
    fn test_selector_matching() {
        let host = HeadlessHost::new(
            r#"<div class="a b" id="x"><span data-k="v" class="c">1</span><button disabled>2</button></div>"#,
        );
        assert!(host.query("div.a.b#x").is_some());
        assert!(host.query("span[data-k=v]").is_some());
        assert!(host.query("span[data-k=w]").is_none());
        assert!(host.query(".missing").is_none());
        assert!(host.query("button[disabled]").is_some());
    }

    #[test]
    fn test_focusable_skips_hidden_and_disabled() {
        let host = HeadlessHost::new(
            r#"<div id="root"><a href="x">x</a><button disabled>d</button><span hidden><button>h</button></span><button>ok</button><span tabindex="0">t</span></div>"#,
        );
        let root = host.query("#root").unwrap();
        let focusable = host.focusable_within(root);
        assert_eq!(focusable.len(), 3);
        assert_eq!(host.text(focusable[1]), "ok");
    }

    #[test]
    fn test_style_updates_merge() {
        let mut host = HeadlessHost::new(r#"<div id="d" style="height:75vh"></div>"#);
        let div = host.query("#d").unwrap();
        host.set_style(div, "width", "96vw");
        host.set_style(div, "height", "50vh");
        assert_eq!(host.style(div, "height").as_deref(), Some("50vh"));
        assert_eq!(host.style(div, "width").as_deref(), Some("96vw"));
    }

    #[test]
    fn test_released_slots_are_reused() {
        let mut host = HeadlessHost::new("<p><b>one</b> two</p>");
        let before = host.nodes.len();
        host.set_content("<p><i>three</i> four</p>");
        host.release_detached();
        host.set_content("<p><u>five</u> six</p>");
        host.release_detached();
        assert!(host.nodes.len() <= before + 4);

        let p = host.query("p").unwrap();
        assert_eq!(host.text(p), "five six");
        assert!(host.is_attached(p));
    }

    #[test]
    fn test_release_keeps_attached_nodes() {
        let mut host = HeadlessHost::new(r#"<p id="keep"><a href="a.pdf">A</a></p>"#);
        let link = host.content_links()[0];
        host.focus(link);
        host.release_detached();
        assert_eq!(host.attribute(link, "href").as_deref(), Some("a.pdf"));
        assert_eq!(host.active_element(), Some(link));

        host.set_content("<p>gone</p>");
        host.release_detached();
        assert_eq!(host.active_element(), None);
    }

    #[test]
    fn test_text_is_escaped_when_serialized() {
        let mut host = HeadlessHost::new("<p id=\"p\"></p>");
        let p = host.query("#p").unwrap();
        host.set_text(p, "<b>");
        assert_eq!(host.outer_html(p), "<p id=\"p\">&lt;b&gt;</p>");
    }
}
