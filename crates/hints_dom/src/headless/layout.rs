//! On-demand cascade and box placement for [`HeadlessDom`].
//!
//! Only what an absolutely positioned overlay needs is modelled: `position`
//! (`fixed`, `absolute`, everything else treated as static), the four offset
//! properties, margins, padding, border widths, explicit or shrink-to-fit
//! sizes, `max-width`, and `translate*` transforms. Text is measured with the
//! document's [`TextMetrics`](super::TextMetrics) on a single line.

use super::{HeadlessDom, NodeKind};
use crate::geometry::Rect;
use hints_css::{Declaration, DeclarationBlock, ElementFacts, Length, Specificity};
use indextree::NodeId;

/// Cascade tiers, lowest precedence first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Tier {
    SheetNormal,
    InlineNormal,
    SheetImportant,
    InlineImportant,
}

/// Top, right, bottom, left.
#[derive(Clone, Copy, Debug, Default)]
struct Edges {
    top: f64,
    right: f64,
    bottom: f64,
    left: f64,
}

impl Edges {
    /// Expand a 1 to 4 value shorthand.
    fn from_shorthand(values: &[f64]) -> Option<Self> {
        let (top, right, bottom, left) = match *values {
            [all] => (all, all, all, all),
            [vertical, horizontal] => (vertical, horizontal, vertical, horizontal),
            [top, horizontal, bottom] => (top, horizontal, bottom, horizontal),
            [top, right, bottom, left] => (top, right, bottom, left),
            _ => return None,
        };
        Some(Self {
            top,
            right,
            bottom,
            left,
        })
    }
}

fn px(style: &DeclarationBlock, property: &str) -> Option<f64> {
    match hints_css::parse_length(style.value(property)?)? {
        Length::Px(pixels) => Some(pixels),
        Length::Percent(_) => None,
    }
}

fn length(style: &DeclarationBlock, property: &str) -> Option<Length> {
    hints_css::parse_length(style.value(property)?)
}

/// Padding with longhands overriding the shorthand.
fn padding(style: &DeclarationBlock) -> Edges {
    let mut edges = style
        .value("padding")
        .and_then(|value| {
            let parsed: Option<Vec<f64>> = value
                .split_whitespace()
                .map(|part| match hints_css::parse_length(part)? {
                    Length::Px(pixels) => Some(pixels),
                    Length::Percent(_) => None,
                })
                .collect();
            Edges::from_shorthand(&parsed?)
        })
        .unwrap_or_default();
    override_edges(&mut edges, style, "padding-", "");
    edges
}

/// Border widths from `border`, `border-width` and the per-side longhands.
fn border(style: &DeclarationBlock) -> Edges {
    let mut edges = style
        .value("border")
        .and_then(|value| {
            value.split_whitespace().find_map(|part| match hints_css::parse_length(part)? {
                Length::Px(pixels) => Some(pixels),
                Length::Percent(_) => None,
            })
        })
        .map(|width| Edges::from_shorthand(&[width]).unwrap_or_default())
        .unwrap_or_default();
    if let Some(width) = px(style, "border-width") {
        edges = Edges::from_shorthand(&[width]).unwrap_or_default();
    }
    override_edges(&mut edges, style, "border-", "-width");
    edges
}

fn override_edges(edges: &mut Edges, style: &DeclarationBlock, prefix: &str, suffix: &str) {
    let sides: [(&str, &mut f64); 4] = [
        ("top", &mut edges.top),
        ("right", &mut edges.right),
        ("bottom", &mut edges.bottom),
        ("left", &mut edges.left),
    ];
    for (side, slot) in sides {
        if let Some(value) = px(style, &format!("{prefix}{side}{suffix}")) {
            *slot = value;
        }
    }
}

impl HeadlessDom {
    /// Cascade matching rules from the node's tree scope with its inline
    /// style. Later entries in the sorted list win.
    pub(super) fn computed_style(&self, id: NodeId) -> DeclarationBlock {
        let Some(node) = self.arena.get(id).map(indextree::Node::get) else {
            return DeclarationBlock::new();
        };
        let NodeKind::Element { tag } = &node.kind else {
            return DeclarationBlock::new();
        };
        let facts = ElementFacts {
            tag,
            id: node.id.as_deref(),
            classes: &node.classes,
        };

        let mut entries: Vec<(Tier, Specificity, usize, u32, &Declaration)> = Vec::new();
        for (sheet_index, style_id) in self.scope_stylesheets(id).into_iter().enumerate() {
            let Some(sheet) = self
                .arena
                .get(style_id)
                .and_then(|style_node| style_node.get().sheet.as_ref())
            else {
                continue;
            };
            for rule in &sheet.rules {
                let Some(specificity) = rule.selectors.match_specificity(&facts) else {
                    continue;
                };
                for declaration in &rule.declarations {
                    let tier = if declaration.important {
                        Tier::SheetImportant
                    } else {
                        Tier::SheetNormal
                    };
                    entries.push((tier, specificity, sheet_index, rule.source_order, declaration));
                }
            }
        }
        for (position, declaration) in node.inline.iter().enumerate() {
            let tier = if declaration.important {
                Tier::InlineImportant
            } else {
                Tier::InlineNormal
            };
            entries.push((tier, Specificity::default(), 0, position as u32, declaration));
        }
        // Stable, so declarations inside one rule keep source order.
        entries.sort_by_key(|&(tier, specificity, sheet, order, _)| (tier, specificity, sheet, order));

        let mut computed = DeclarationBlock::new();
        for (_, _, _, _, declaration) in entries {
            computed.set(&declaration.name, &declaration.value, declaration.important);
        }
        computed
    }

    /// Applied `<style>` elements that are direct children of the root of
    /// `id`'s tree.
    fn scope_stylesheets(&self, id: NodeId) -> Vec<NodeId> {
        let root = self.tree_root(id);
        root.children(&self.arena)
            .filter(|child| {
                self.arena
                    .get(*child)
                    .is_some_and(|node| node.get().sheet.is_some())
            })
            .collect()
    }

    /// Nearest element ancestor, stepping from a shadow root to its host.
    fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.arena.get(id)?.parent()?;
        match &self.arena.get(parent)?.get().kind {
            NodeKind::Element { .. } => Some(parent),
            NodeKind::ShadowRoot { host } => self.ids.get(host).copied(),
            NodeKind::Document | NodeKind::Text { .. } => None,
        }
    }

    fn initial_containing_block(&self) -> Rect {
        Rect::from_origin_size(
            self.origin.x,
            self.origin.y,
            self.viewport.width,
            self.viewport.height,
        )
    }

    fn containing_block(&self, id: NodeId, position: Option<&str>) -> Rect {
        match position {
            Some("fixed") => self.initial_containing_block(),
            Some("absolute") => {
                let mut ancestor = self.parent_element(id);
                while let Some(candidate) = ancestor {
                    let style = self.computed_style(candidate);
                    if matches!(style.value("position"), Some("absolute" | "fixed" | "relative")) {
                        return self.border_box(candidate);
                    }
                    ancestor = self.parent_element(candidate);
                }
                self.initial_containing_block()
            }
            _ => self.parent_element(id).map_or_else(
                || self.initial_containing_block(),
                |parent| {
                    let parent_style = self.computed_style(parent);
                    let inset_start = padding(&parent_style);
                    let inset_border = border(&parent_style);
                    let outer = self.border_box(parent);
                    Rect {
                        left: outer.left + inset_border.left + inset_start.left,
                        top: outer.top + inset_border.top + inset_start.top,
                        right: outer.right - inset_border.right - inset_start.right,
                        bottom: outer.bottom - inset_border.bottom - inset_start.bottom,
                    }
                },
            ),
        }
    }

    fn text_width(&self, id: NodeId) -> f64 {
        let characters: usize = id
            .descendants(&self.arena)
            .filter_map(|descendant| match &self.arena.get(descendant)?.get().kind {
                NodeKind::Text { text } => Some(text.chars().count()),
                _ => None,
            })
            .sum();
        characters as f64 * self.metrics.char_width
    }

    fn has_text(&self, id: NodeId) -> bool {
        id.descendants(&self.arena).any(|descendant| {
            self.arena.get(descendant).is_some_and(
                |node| matches!(&node.get().kind, NodeKind::Text { text } if !text.is_empty()),
            )
        })
    }

    /// Border box of an element in viewport coordinates.
    pub(super) fn border_box(&self, id: NodeId) -> Rect {
        let Some(node) = self.arena.get(id).map(indextree::Node::get) else {
            return Rect::default();
        };
        if !self.is_connected_id(id) {
            return Rect::default();
        }
        match &node.kind {
            NodeKind::Document => self.initial_containing_block(),
            NodeKind::ShadowRoot { host } => self
                .ids
                .get(host)
                .map_or_else(Rect::default, |&host_id| self.border_box(host_id)),
            NodeKind::Text { .. } => self
                .parent_element(id)
                .map_or_else(Rect::default, |parent| self.border_box(parent)),
            NodeKind::Element { .. } if node.key == self.html => self.initial_containing_block(),
            NodeKind::Element { .. } => self.element_box(id),
        }
    }

    fn element_box(&self, id: NodeId) -> Rect {
        let style = self.computed_style(id);
        let position = style.value("position");
        let block = self.containing_block(id, position);
        let pad = padding(&style);
        let edge = border(&style);
        let chrome_x = pad.left + pad.right + edge.left + edge.right;
        let chrome_y = pad.top + pad.bottom + edge.top + edge.bottom;
        let border_box_sizing = style.value("box-sizing") == Some("border-box");

        let mut width = length(&style, "width").map_or_else(
            || self.text_width(id) + chrome_x,
            |explicit| {
                let resolved = explicit.resolve(block.width());
                if border_box_sizing { resolved } else { resolved + chrome_x }
            },
        );
        if let Some(max_width) = length(&style, "max-width") {
            width = width.min(max_width.resolve(block.width()));
        }
        let height = length(&style, "height").map_or_else(
            || {
                let line = if self.has_text(id) { self.metrics.line_height } else { 0.0 };
                line + chrome_y
            },
            |explicit| {
                let resolved = explicit.resolve(block.height());
                if border_box_sizing { resolved } else { resolved + chrome_y }
            },
        );

        let margin = |side: &str| px(&style, &format!("margin-{side}")).unwrap_or(0.0);
        let offset = |side: &str, basis: f64| length(&style, side).map(|len| len.resolve(basis));
        let positioned = matches!(position, Some("absolute" | "fixed"));

        let left = if positioned {
            if let Some(left_offset) = offset("left", block.width()) {
                block.left + left_offset + margin("left")
            } else if let Some(right_offset) = offset("right", block.width()) {
                block.right - right_offset - margin("right") - width
            } else {
                block.left + margin("left")
            }
        } else {
            block.left + margin("left")
        };
        let top = if positioned {
            if let Some(top_offset) = offset("top", block.height()) {
                block.top + top_offset + margin("top")
            } else if let Some(bottom_offset) = offset("bottom", block.height()) {
                block.bottom - bottom_offset - margin("bottom") - height
            } else {
                block.top + margin("top")
            }
        } else {
            block.top + margin("top")
        };

        let rect = Rect::from_origin_size(left, top, width, height);
        match style.value("transform").and_then(hints_css::parse_translate) {
            Some((shift_x, shift_y)) => {
                rect.translated(shift_x.resolve(width), shift_y.resolve(height))
            }
            None => rect,
        }
    }

    fn is_connected_id(&self, id: NodeId) -> bool {
        self.arena
            .get(id)
            .is_some_and(|node| crate::OverlayDom::is_connected(self, node.get().key))
    }
}

#[cfg(test)]
mod tests {
    use crate::geometry::{Point, Viewport};
    use crate::{HeadlessDom, OverlayDom};

    fn overlay(dom: &mut HeadlessDom, css: &str) -> (crate::NodeKey, crate::NodeKey) {
        let host = dom.create_element("div");
        dom.set_style(host, "position", "fixed", true);
        dom.set_style(host, "left", "0px", true);
        dom.set_style(host, "top", "0px", true);
        dom.set_style(host, "width", "400px", true);
        dom.set_style(host, "height", "300px", true);
        let root = dom.attach_shadow(host);
        dom.insert_stylesheet(root, css);
        let html = dom.document_element().expect("html");
        dom.append_child(html, host);
        (host, root)
    }

    #[test]
    fn absolutely_positioned_hint_with_translate() {
        let mut dom = HeadlessDom::new(Viewport::new(400.0, 300.0));
        let (_, root) = overlay(
            &mut dom,
            ".hint { position: absolute; transform: translateY(-50%); padding: 2px; border: solid 1px black; }",
        );
        let hint = dom.create_element("div");
        dom.set_class_name(hint, "hint");
        dom.set_text_content(hint, "AB");
        dom.set_style(hint, "left", "10px", true);
        dom.set_style(hint, "top", "50px", true);
        dom.append_child(root, hint);

        let rect = dom.bounding_client_rect(hint);
        // 2 chars * 7 + 2 * 2 padding + 2 * 1 border.
        assert!((rect.width() - 20.0).abs() < 1e-9);
        assert!((rect.height() - 18.0).abs() < 1e-9);
        assert!((rect.left - 10.0).abs() < 1e-9);
        assert!((rect.top - 41.0).abs() < 1e-9);
    }

    #[test]
    fn right_offset_and_margins() {
        let mut dom = HeadlessDom::new(Viewport::new(400.0, 300.0));
        let (_, root) = overlay(&mut dom, ".hint { position: absolute; }");
        let hint = dom.create_element("div");
        dom.set_class_name(hint, "hint");
        dom.set_text_content(hint, "A");
        dom.set_style(hint, "right", "100px", true);
        dom.set_style(hint, "top", "0px", true);
        dom.set_style(hint, "margin-right", "-5px", true);
        dom.set_style(hint, "margin-top", "3px", true);
        dom.append_child(root, hint);

        let rect = dom.bounding_client_rect(hint);
        assert!((rect.right - 305.0).abs() < 1e-9);
        assert!((rect.left - 298.0).abs() < 1e-9);
        assert!((rect.top - 3.0).abs() < 1e-9);
    }

    #[test]
    fn inline_important_beats_sheet_important() {
        let mut dom = HeadlessDom::new(Viewport::new(400.0, 300.0));
        let (_, root) = overlay(&mut dom, ".hint { opacity: 0 !important; color: red }");
        let hint = dom.create_element("div");
        dom.set_class_name(hint, "hint");
        dom.append_child(root, hint);
        dom.set_style(hint, "color", "blue", false);
        assert_eq!(dom.computed_value(hint, "color").as_deref(), Some("blue"));
        assert_eq!(dom.computed_value(hint, "opacity").as_deref(), Some("0"));
        dom.set_style(hint, "opacity", "1", true);
        assert_eq!(dom.computed_value(hint, "opacity").as_deref(), Some("1"));
    }

    #[test]
    fn fixed_boxes_follow_document_origin_and_detached_nodes_are_empty() {
        let mut dom = HeadlessDom::new(Viewport::new(400.0, 300.0));
        dom.set_document_origin(Point::new(30.0, -20.0));
        let (host, _) = overlay(&mut dom, "");
        let rect = dom.bounding_client_rect(host);
        assert!((rect.left - 30.0).abs() < 1e-9);
        assert!((rect.top + 20.0).abs() < 1e-9);
        dom.remove(host);
        assert_eq!(dom.bounding_client_rect(host), crate::Rect::default());
    }

    #[test]
    fn blocked_stylesheets_do_not_style() {
        let mut dom = HeadlessDom::new(Viewport::new(400.0, 300.0)).with_blocked_stylesheets(true);
        let (_, root) = overlay(&mut dom, ".hint { position: absolute; }");
        let hint = dom.create_element("div");
        dom.set_class_name(hint, "hint");
        dom.append_child(root, hint);
        assert_eq!(dom.computed_value(hint, "position"), None);
    }
}
