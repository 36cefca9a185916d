//! In-memory document implementing [`OverlayDom`].
//!
//! Nodes live in an `indextree` arena and are addressed from the outside by
//! [`NodeKey`]. Shadow roots are separate arena trees that remember their
//! host, so the overlay subtree is isolated from the page tree just like in a
//! browser. Layout is computed on demand by [`layout`] whenever a bounding
//! rectangle is read.

mod layout;

use crate::geometry::{Point, Rect, Viewport};
use crate::{NodeKey, OverlayDom, StyleSheetStatus};
use core::cell::Cell;
use hints_css::{DeclarationBlock, ElementFacts, SelectorList, Specificity, Stylesheet};
use indextree::{Arena, NodeId};
use log::{debug, warn};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Font metrics for the headless text measurer: every character advances
/// `char_width` pixels and a line is `line_height` pixels tall.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextMetrics {
    pub char_width: f64,
    pub line_height: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            char_width: 7.0,
            line_height: 12.0,
        }
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    Element { tag: String },
    Text { text: String },
    ShadowRoot { host: NodeKey },
}

#[derive(Debug, Clone)]
struct HeadlessNode {
    key: NodeKey,
    kind: NodeKind,
    id: Option<String>,
    classes: SmallVec<String, 4>,
    inline: DeclarationBlock,
    shadow_root: Option<NodeKey>,
    /// Parsed contents of an applied `<style>` element.
    sheet: Option<Stylesheet>,
}

impl HeadlessNode {
    fn new(key: NodeKey, kind: NodeKind) -> Self {
        Self {
            key,
            kind,
            id: None,
            classes: SmallVec::new(),
            inline: DeclarationBlock::new(),
            shadow_root: None,
            sheet: None,
        }
    }

    fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { tag } => Some(tag),
            _ => None,
        }
    }
}

/// Arena-backed document with a fixed-size viewport.
#[derive(Debug)]
pub struct HeadlessDom {
    arena: Arena<HeadlessNode>,
    ids: HashMap<NodeKey, NodeId>,
    next_key: u64,
    document: NodeKey,
    html: NodeKey,
    viewport: Viewport,
    origin: Point,
    metrics: TextMetrics,
    block_stylesheets: bool,
    layout_reads: Cell<u64>,
}

impl HeadlessDom {
    /// Create a document containing `<html><body></body></html>`.
    pub fn new(viewport: Viewport) -> Self {
        let mut dom = Self {
            arena: Arena::new(),
            ids: HashMap::new(),
            next_key: 0,
            document: NodeKey(0),
            html: NodeKey(0),
            viewport,
            origin: Point::default(),
            metrics: TextMetrics::default(),
            block_stylesheets: false,
            layout_reads: Cell::new(0),
        };
        dom.document = dom.alloc(NodeKind::Document);
        dom.html = dom.create_element("html");
        let body = dom.create_element("body");
        dom.append_child(dom.document, dom.html);
        dom.append_child(dom.html, body);
        dom
    }

    /// Use different text metrics.
    #[must_use]
    pub fn with_metrics(mut self, metrics: TextMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Refuse to apply inserted stylesheets, the way Firefox does on pages
    /// whose CSP forbids inline styles.
    #[must_use]
    pub fn with_blocked_stylesheets(mut self, blocked: bool) -> Self {
        self.block_stylesheets = blocked;
        self
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Simulate a page that translates or offsets its `<html>` element.
    pub fn set_document_origin(&mut self, origin: Point) {
        self.origin = origin;
    }

    /// Number of bounding rectangle reads (forced layouts) so far.
    pub fn layout_reads(&self) -> u64 {
        self.layout_reads.get()
    }

    pub fn body(&self) -> Option<NodeKey> {
        self.children(self.html).into_iter().find(|child| {
            self.node(*child).and_then(HeadlessNode::tag) == Some("body")
        })
    }

    /// Child nodes of `node` in order.
    pub fn children(&self, node: NodeKey) -> Vec<NodeKey> {
        let Some(&id) = self.ids.get(&node) else {
            return Vec::new();
        };
        id.children(&self.arena)
            .filter_map(|child| self.key_of(child))
            .collect()
    }

    pub fn parent(&self, node: NodeKey) -> Option<NodeKey> {
        let id = *self.ids.get(&node)?;
        self.arena.get(id)?.parent().and_then(|parent| self.key_of(parent))
    }

    pub fn shadow_root(&self, host: NodeKey) -> Option<NodeKey> {
        self.node(host)?.shadow_root
    }

    pub fn tag_name(&self, node: NodeKey) -> Option<String> {
        self.node(node)?.tag().map(str::to_owned)
    }

    pub fn class_list(&self, node: NodeKey) -> Vec<String> {
        self.node(node)
            .map(|found| found.classes.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Resolved value of `property` after cascading stylesheets and inline
    /// styles.
    pub fn computed_value(&self, node: NodeKey, property: &str) -> Option<String> {
        let id = *self.ids.get(&node)?;
        self.computed_style(id).value(property).map(str::to_owned)
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key = self.next_key.saturating_add(1);
        let id = self.arena.new_node(HeadlessNode::new(key, kind));
        self.ids.insert(key, id);
        key
    }

    fn key_of(&self, id: NodeId) -> Option<NodeKey> {
        self.arena.get(id).map(|node| node.get().key)
    }

    fn node(&self, key: NodeKey) -> Option<&HeadlessNode> {
        let id = *self.ids.get(&key)?;
        self.arena.get(id).map(indextree::Node::get)
    }

    fn node_mut(&mut self, key: NodeKey) -> Option<&mut HeadlessNode> {
        let id = *self.ids.get(&key)?;
        self.arena.get_mut(id).map(indextree::Node::get_mut)
    }

    /// Root of the tree `id` lives in, without crossing shadow boundaries.
    fn tree_root(&self, id: NodeId) -> NodeId {
        id.ancestors(&self.arena).last().unwrap_or(id)
    }

    /// Elements under `id` in tree order, descending into shadow roots.
    fn collect_elements(&self, id: NodeId, out: &mut Vec<NodeKey>) {
        for descendant in id.descendants(&self.arena) {
            let Some(node) = self.arena.get(descendant).map(indextree::Node::get) else {
                continue;
            };
            if node.tag().is_none() {
                continue;
            }
            if let Some(key) = self.key_of(descendant) {
                out.push(key);
            }
            if let Some(root) = node.shadow_root
                && let Some(&root_id) = self.ids.get(&root)
            {
                self.collect_elements(root_id, out);
            }
        }
    }
}

impl OverlayDom for HeadlessDom {
    fn create_element(&mut self, tag: &str) -> NodeKey {
        self.alloc(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
        })
    }

    fn create_text(&mut self, text: &str) -> NodeKey {
        self.alloc(NodeKind::Text {
            text: text.to_owned(),
        })
    }

    fn attach_shadow(&mut self, host: NodeKey) -> NodeKey {
        if let Some(existing) = self.shadow_root(host) {
            return existing;
        }
        let root = self.alloc(NodeKind::ShadowRoot { host });
        if let Some(node) = self.node_mut(host) {
            node.shadow_root = Some(root);
        }
        root
    }

    fn document_element(&self) -> Option<NodeKey> {
        self.is_connected(self.html).then_some(self.html)
    }

    fn append_child(&mut self, parent: NodeKey, child: NodeKey) {
        let (Some(&parent_id), Some(&child_id)) = (self.ids.get(&parent), self.ids.get(&child))
        else {
            return;
        };
        let insertable = self
            .node(child)
            .is_some_and(|node| matches!(node.kind, NodeKind::Element { .. } | NodeKind::Text { .. }));
        if !insertable {
            warn!("HeadlessDom::append_child: {child:?} cannot be inserted");
            return;
        }
        child_id.detach(&mut self.arena);
        if let Err(error) = parent_id.checked_append(child_id, &mut self.arena) {
            warn!("HeadlessDom::append_child: {parent:?} <- {child:?} rejected: {error}");
        }
    }

    fn remove(&mut self, node: NodeKey) {
        if let Some(&id) = self.ids.get(&node) {
            id.detach(&mut self.arena);
        }
    }

    fn clear_children(&mut self, node: NodeKey) {
        let Some(&id) = self.ids.get(&node) else {
            return;
        };
        let children: Vec<NodeId> = id.children(&self.arena).collect();
        for child in children {
            child.detach(&mut self.arena);
        }
    }

    fn elements_with_id(&self, id: &str) -> Vec<NodeKey> {
        let Some(&document) = self.ids.get(&self.document) else {
            return Vec::new();
        };
        let mut elements = Vec::new();
        self.collect_elements(document, &mut elements);
        elements.retain(|element| {
            self.node(*element)
                .is_some_and(|node| node.id.as_deref() == Some(id))
        });
        elements
    }

    fn set_id(&mut self, node: NodeKey, id: &str) {
        if let Some(found) = self.node_mut(node) {
            found.id = Some(id.to_owned());
        }
    }

    fn set_class_name(&mut self, node: NodeKey, class_name: &str) {
        if let Some(found) = self.node_mut(node) {
            found.classes = class_name.split_whitespace().map(str::to_owned).collect();
        }
    }

    fn toggle_class(&mut self, node: NodeKey, class: &str, on: bool) {
        let Some(found) = self.node_mut(node) else {
            return;
        };
        let present = found.classes.iter().any(|existing| existing == class);
        if on && !present {
            found.classes.push(class.to_owned());
        } else if !on && present {
            found.classes.retain(|existing| existing != class);
        }
    }

    fn has_class(&self, node: NodeKey, class: &str) -> bool {
        self.node(node)
            .is_some_and(|found| found.classes.iter().any(|existing| existing == class))
    }

    fn matches(&self, node: NodeKey, selectors: &SelectorList) -> Option<Specificity> {
        let found = self.node(node)?;
        let facts = ElementFacts {
            tag: found.tag()?,
            id: found.id.as_deref(),
            classes: &found.classes,
        };
        selectors.match_specificity(&facts)
    }

    fn set_style(&mut self, node: NodeKey, property: &str, value: &str, important: bool) {
        if let Some(found) = self.node_mut(node) {
            found.inline.set(property, value, important);
        }
    }

    fn style(&self, node: NodeKey, property: &str) -> Option<String> {
        self.node(node)?.inline.value(property).map(str::to_owned)
    }

    fn remove_style(&mut self, node: NodeKey, property: &str) {
        if let Some(found) = self.node_mut(node) {
            found.inline.remove(property);
        }
    }

    fn set_text_content(&mut self, node: NodeKey, text: &str) {
        self.clear_children(node);
        if !text.is_empty() {
            let text_node = self.create_text(text);
            self.append_child(node, text_node);
        }
    }

    fn text_content(&self, node: NodeKey) -> String {
        let Some(&id) = self.ids.get(&node) else {
            return String::new();
        };
        id.descendants(&self.arena)
            .filter_map(|descendant| match &self.arena.get(descendant)?.get().kind {
                NodeKind::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn insert_stylesheet(&mut self, scope: NodeKey, css: &str) -> StyleSheetStatus {
        let style = self.create_element("style");
        self.set_text_content(style, css);
        self.append_child(scope, style);
        if self.block_stylesheets {
            debug!("HeadlessDom: stylesheet in {scope:?} blocked");
            return StyleSheetStatus::Blocked;
        }
        let sheet = hints_css::parse_stylesheet(css);
        debug!("HeadlessDom: stylesheet in {scope:?} applied ({} rules)", sheet.rules.len());
        if let Some(node) = self.node_mut(style) {
            node.sheet = Some(sheet);
        }
        StyleSheetStatus::Applied
    }

    fn bounding_client_rect(&self, node: NodeKey) -> Rect {
        self.layout_reads.set(self.layout_reads.get().saturating_add(1));
        self.ids
            .get(&node)
            .map_or_else(Rect::default, |&id| self.border_box(id))
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn container_origin(&self) -> Point {
        self.origin
    }

    fn is_connected(&self, node: NodeKey) -> bool {
        let mut current = node;
        // Each hop leaves one shadow tree, so the loop is bounded by nesting depth.
        loop {
            let Some(&id) = self.ids.get(&current) else {
                return false;
            };
            let root = self.tree_root(id);
            let Some(root_node) = self.arena.get(root).map(indextree::Node::get) else {
                return false;
            };
            match root_node.kind {
                NodeKind::Document => return true,
                NodeKind::ShadowRoot { host } => current = host,
                NodeKind::Element { .. } | NodeKind::Text { .. } => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dom() -> HeadlessDom {
        HeadlessDom::new(Viewport::new(800.0, 600.0))
    }

    #[test]
    fn shadow_tree_nodes_are_connected_through_host() {
        let mut dom = dom();
        let host = dom.create_element("div");
        let root = dom.attach_shadow(host);
        let inner = dom.create_element("div");
        dom.append_child(root, inner);
        assert!(!dom.is_connected(inner));
        let html = dom.document_element().expect("html");
        dom.append_child(html, host);
        assert!(dom.is_connected(inner));
        dom.remove(host);
        assert!(!dom.is_connected(inner));
    }

    #[test]
    fn elements_with_id_finds_all_connected_duplicates() {
        let mut dom = dom();
        let html = dom.document_element().expect("html");
        let first = dom.create_element("div");
        let second = dom.create_element("div");
        let detached = dom.create_element("div");
        for node in [first, second, detached] {
            dom.set_id(node, "dup");
        }
        dom.append_child(html, first);
        let body = dom.body().expect("body");
        dom.append_child(body, second);
        assert_eq!(dom.elements_with_id("dup"), vec![second, first]);
    }

    #[test]
    fn class_toggling_and_text() {
        let mut dom = dom();
        let node = dom.create_element("DIV");
        dom.set_class_name(node, "hint  other");
        dom.toggle_class(node, "hiddenHint", true);
        dom.toggle_class(node, "other", false);
        assert_eq!(dom.class_list(node), vec!["hint".to_owned(), "hiddenHint".to_owned()]);
        dom.set_text_content(node, "ab");
        let span = dom.create_element("span");
        dom.set_text_content(span, "c");
        dom.append_child(node, span);
        assert_eq!(dom.text_content(node), "abc");
        assert_eq!(dom.tag_name(node).as_deref(), Some("div"));
    }

    #[test]
    fn cycles_and_documents_are_not_inserted() {
        let mut dom = dom();
        let outer = dom.create_element("div");
        let inner = dom.create_element("div");
        dom.append_child(outer, inner);
        dom.append_child(inner, outer);
        assert_eq!(dom.children(outer), vec![inner]);
        assert_eq!(dom.parent(outer), None);
    }
}
