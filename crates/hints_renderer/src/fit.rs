//! Viewport fitting: nudge hints that stick out of the viewport back in.

use std::collections::HashMap;

use hints_dom::{NodeKey, OverlayDom, Rect, Viewport};
use log::trace;

use crate::style::{self, px};

/// Last known bounding rectangle of each rendered hint.
pub type RectCache = HashMap<NodeKey, Rect>;

/// Margin properties a correction may set.
pub const CORRECTION_PROPERTIES: [&str; 3] = ["margin-left", "margin-right", "margin-top"];

/// Move every element in `elements` fully inside `viewport` using margins,
/// record its corrected rectangle in `rects`, and report whether any element
/// had to move.
///
/// Each element's layout is read exactly once; corrections are written after
/// all reads so layout is not forced again mid-pass. Overflows are rounded
/// up to whole pixels so a corrected hint never sticks out by a fraction.
pub fn move_inside_viewport<D: OverlayDom>(
    dom: &mut D,
    elements: &[NodeKey],
    viewport: Viewport,
    rects: &mut RectCache,
) -> bool {
    let measured: Vec<(NodeKey, Rect)> = elements
        .iter()
        .map(|&element| (element, dom.bounding_client_rect(element)))
        .collect();

    let mut moved = false;
    for (element, rect) in measured {
        let right_anchored = dom.style(element, "right").is_some();

        let shift_x = if rect.left < 0.0 {
            (-rect.left).ceil()
        } else if rect.right > viewport.width {
            -(rect.right - viewport.width).ceil()
        } else {
            0.0
        };
        let shift_y = if rect.top < 0.0 {
            (-rect.top).ceil()
        } else if rect.bottom > viewport.height {
            -(rect.bottom - viewport.height).ceil()
        } else {
            0.0
        };

        if shift_x != 0.0 {
            // A right-anchored box moves right when its right margin shrinks.
            let (property, margin) = if right_anchored {
                ("margin-right", -shift_x)
            } else {
                ("margin-left", shift_x)
            };
            style::set_styles(dom, element, &[(property, px(margin))]);
        }
        if shift_y != 0.0 {
            style::set_styles(dom, element, &[("margin-top", px(shift_y))]);
        }
        if shift_x != 0.0 || shift_y != 0.0 {
            trace!("move_inside_viewport: {element:?} by ({shift_x}, {shift_y})");
            moved = true;
        }
        rects.insert(element, rect.translated(shift_x, shift_y));
    }
    moved
}

/// Undo earlier corrections before re-placing an element.
pub fn clear_corrections<D: OverlayDom>(dom: &mut D, element: NodeKey) {
    for property in CORRECTION_PROPERTIES {
        dom.remove_style(element, property);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrowserEngine;
    use crate::hint::create_hint_element;
    use crate::style::{StyleLayer, set_styles};
    use hints_dom::HeadlessDom;

    fn overlay(dom: &mut HeadlessDom) -> NodeKey {
        let host = dom.create_element("div");
        set_styles(
            dom,
            host,
            &[("position", "fixed"), ("left", "0px"), ("top", "0px"), ("width", "400px"), ("height", "300px")],
        );
        let root = dom.attach_shadow(host);
        let html = dom.document_element().unwrap();
        dom.append_child(html, host);
        StyleLayer::new(BrowserEngine::Chrome).install(dom, root);
        root
    }

    fn hint(dom: &mut HeadlessDom, root: NodeKey, styles: &[(&str, &str)]) -> NodeKey {
        let element = create_hint_element(dom, "ab");
        set_styles(dom, element, styles);
        dom.append_child(root, element);
        element
    }

    #[test]
    fn overflowing_hints_are_moved_back_inside() {
        let _ = env_logger::builder().is_test(true).try_init();
        let viewport = Viewport::new(400.0, 300.0);
        let mut dom = HeadlessDom::new(viewport);
        let root = overlay(&mut dom);
        let top_right = hint(&mut dom, root, &[("left", "390px"), ("top", "2px")]);
        let bottom_left = hint(&mut dom, root, &[("right", "395px"), ("top", "298px")]);
        let inside = hint(&mut dom, root, &[("left", "100px"), ("top", "100px")]);

        let mut rects = RectCache::new();
        let reads = dom.layout_reads();
        let moved = move_inside_viewport(&mut dom, &[top_right, bottom_left, inside], viewport, &mut rects);
        assert!(moved);
        assert_eq!(dom.layout_reads() - reads, 3);

        assert_eq!(dom.style(top_right, "margin-left").as_deref(), Some("-10px"));
        assert_eq!(dom.style(top_right, "margin-top").as_deref(), Some("7px"));
        assert_eq!(dom.style(bottom_left, "margin-right").as_deref(), Some("-15px"));
        assert_eq!(dom.style(bottom_left, "margin-top").as_deref(), Some("-7px"));
        assert_eq!(dom.style(inside, "margin-left"), None);

        for element in [top_right, bottom_left, inside] {
            let actual = dom.bounding_client_rect(element);
            assert!(viewport.contains(&actual), "{actual:?}");
            assert_eq!(rects.get(&element), Some(&actual));
        }
    }

    #[test]
    fn nothing_to_move() {
        let viewport = Viewport::new(400.0, 300.0);
        let mut dom = HeadlessDom::new(viewport);
        let root = overlay(&mut dom);
        let inside = hint(&mut dom, root, &[("left", "100px"), ("top", "100px")]);
        let mut rects = RectCache::new();
        assert!(!move_inside_viewport(&mut dom, &[inside], viewport, &mut rects));
        assert_eq!(rects.len(), 1);
    }

    #[test]
    fn corrections_can_be_cleared() {
        let viewport = Viewport::new(400.0, 300.0);
        let mut dom = HeadlessDom::new(viewport);
        let root = overlay(&mut dom);
        let element = hint(&mut dom, root, &[("left", "-5px"), ("top", "100px")]);
        let mut rects = RectCache::new();
        assert!(move_inside_viewport(&mut dom, &[element], viewport, &mut rects));
        assert_eq!(dom.style(element, "margin-left").as_deref(), Some("5px"));
        clear_corrections(&mut dom, element);
        assert_eq!(dom.style(element, "margin-left"), None);
        assert_eq!(dom.bounding_client_rect(element).left, -5.0);
    }
}
