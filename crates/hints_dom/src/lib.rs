//! Document access for the hint overlay.
//!
//! The renderer never touches a concrete document. It drives an
//! [`OverlayDom`], a small node-handle interface covering exactly the
//! operations the overlay needs: building a detached subtree, toggling
//! classes and inline styles, inserting a stylesheet and reading back
//! bounding rectangles. A browser binding implements it over the real DOM;
//! [`HeadlessDom`] implements it over an in-memory arena with a minimal
//! absolute-positioning layout so the renderer can run and be tested anywhere.

pub mod geometry;
pub mod headless;

pub use geometry::{Point, Rect, Viewport, overlaps};
pub use headless::{HeadlessDom, TextMetrics};

use hints_css::{SelectorList, Specificity};

/// A stable handle to a node, valid for the lifetime of the document even
/// after the node is detached.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct NodeKey(pub u64);

/// Outcome of inserting a `<style>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StyleSheetStatus {
    /// The stylesheet is active and styles matching nodes.
    Applied,
    /// The element was inserted but the host refused to apply it (for
    /// instance a page Content Security Policy in Firefox).
    Blocked,
}

/// Node-handle interface the overlay renders through.
///
/// Methods taking a node that does not exist (or has the wrong kind) are
/// no-ops or return an empty value; they never panic. This matches how the
/// web platform treats operations on detached nodes.
pub trait OverlayDom {
    /// Create a detached element.
    fn create_element(&mut self, tag: &str) -> NodeKey;

    /// Create a detached text node.
    fn create_text(&mut self, text: &str) -> NodeKey;

    /// Attach an open shadow root to `host` and return it. Calling this twice
    /// returns the existing root.
    fn attach_shadow(&mut self, host: NodeKey) -> NodeKey;

    /// The `<html>` element, if the document has one.
    fn document_element(&self) -> Option<NodeKey>;

    /// Append `child` as the last child of `parent`, moving it if it is
    /// already attached elsewhere.
    fn append_child(&mut self, parent: NodeKey, child: NodeKey);

    /// Detach `node` from its parent.
    fn remove(&mut self, node: NodeKey);

    /// Detach every child of `node`.
    fn clear_children(&mut self, node: NodeKey);

    /// Every connected element whose `id` is `id`, in document order.
    fn elements_with_id(&self, id: &str) -> Vec<NodeKey>;

    fn set_id(&mut self, node: NodeKey, id: &str);

    /// Replace the whole class list.
    fn set_class_name(&mut self, node: NodeKey, class_name: &str);

    /// Add (`on`) or remove a single class.
    fn toggle_class(&mut self, node: NodeKey, class: &str, on: bool);

    fn has_class(&self, node: NodeKey, class: &str) -> bool;

    /// Specificity of the best matching selector in `selectors`, or `None`
    /// when `node` does not match.
    fn matches(&self, node: NodeKey, selectors: &SelectorList) -> Option<Specificity>;

    /// Set an inline style property. An empty value removes it.
    fn set_style(&mut self, node: NodeKey, property: &str, value: &str, important: bool);

    /// Inline style value of `property`.
    fn style(&self, node: NodeKey, property: &str) -> Option<String>;

    fn remove_style(&mut self, node: NodeKey, property: &str);

    /// Replace all children with a single text node.
    fn set_text_content(&mut self, node: NodeKey, text: &str);

    /// Concatenated text of all descendant text nodes.
    fn text_content(&self, node: NodeKey) -> String;

    /// Append a `<style>` element holding `css` to `scope` (typically a
    /// shadow root) and report whether the host applied it.
    fn insert_stylesheet(&mut self, scope: NodeKey, css: &str) -> StyleSheetStatus;

    /// Layout the document if needed and return the border box of `node` in
    /// viewport coordinates. Detached nodes report an empty rectangle.
    fn bounding_client_rect(&self, node: NodeKey) -> Rect;

    /// Current size of the visible viewport.
    fn viewport(&self) -> Viewport;

    /// Where a `position: fixed` box at `left: 0; top: 0` appended to the
    /// document element would end up. Non-zero when the page translates
    /// `<html>` or gives it margins.
    fn container_origin(&self) -> Point;

    /// Whether `node` is reachable from the document, crossing shadow roots.
    fn is_connected(&self, node: NodeKey) -> bool;
}
