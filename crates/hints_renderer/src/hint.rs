//! Hint element factory and placement arithmetic.

use hints_dom::{NodeKey, OverlayDom, Rect, Viewport};

use crate::messages::{HintAlign, HintMeasurements};
use crate::style::{self, HINT_CLASS, MATCHED_CHARS_CLASS};

/// Label shown when a render finds nothing to hint.
pub const PLACEHOLDER_LABEL: &str = "¯\\_(ツ)_/¯";

/// Create a detached `div.hint` holding `text`.
pub fn create_hint_element<D: OverlayDom>(dom: &mut D, text: &str) -> NodeKey {
    let element = dom.create_element("div");
    dom.set_class_name(element, HINT_CLASS);
    dom.set_text_content(element, text);
    element
}

/// Replace the label of `element` with the already typed `matched` part
/// (dimmed) followed by `rest`. Returns the new matched-chars span, if any.
pub fn set_hint_content<D: OverlayDom>(
    dom: &mut D,
    element: NodeKey,
    matched: &str,
    rest: &str,
) -> Option<NodeKey> {
    dom.set_text_content(element, "");
    let span = (!matched.is_empty()).then(|| {
        let span = dom.create_element("span");
        dom.set_class_name(span, MATCHED_CHARS_CLASS);
        dom.set_text_content(span, matched);
        dom.append_child(element, span);
        span
    });
    if !rest.is_empty() {
        let text = dom.create_text(rest);
        dom.append_child(element, text);
    }
    span
}

/// Linear hint width model measured once per render cycle.
///
/// Hint labels use a bold uppercase font that is close to monospace, so
/// `width(n) = constant + per_char * n` measured from a one and a two
/// character probe is accurate enough to place hints without reading each
/// one back from layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WidthModel {
    pub constant: f64,
    pub per_char: f64,
    /// Half the hint height, rounded up.
    pub half_height: f64,
}

impl WidthModel {
    /// Derive the model from the rects of the `"W"` and `"WW"` probes.
    pub fn from_probes(one: &Rect, two: &Rect) -> Self {
        let per_char = two.width() - one.width();
        Self {
            constant: one.width() - per_char,
            per_char,
            half_height: (one.height() / 2.0).ceil(),
        }
    }

    /// Predicted width of a hint labelled `hint`.
    pub fn width(&self, hint: &str) -> f64 {
        let characters = hint.chars().count() as f64;
        self.per_char.mul_add(characters, self.constant).ceil()
    }
}

/// Inline position of one hint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HintPlacement {
    pub align: HintAlign,
    /// `left` for left-aligned hints, `right` for right-aligned ones.
    pub offset: f64,
    pub top: f64,
}

impl HintPlacement {
    /// Place a hint of `width` at its anchor. Left alignment is kept only if
    /// the hint ends before `max_x`.
    pub fn compute(measurements: &HintMeasurements, width: f64, viewport: Viewport) -> Self {
        let fits_left = measurements.align == HintAlign::Left
            && measurements.x + width < measurements.max_x;
        let (align, offset) = if fits_left {
            (HintAlign::Left, js_round(measurements.x))
        } else {
            (HintAlign::Right, js_round(viewport.width - measurements.x))
        };
        Self {
            align,
            offset,
            top: js_round(measurements.y),
        }
    }

    /// Write the position and `z_index` as inline styles, clearing the other
    /// horizontal anchor.
    pub fn apply<D: OverlayDom>(&self, dom: &mut D, element: NodeKey, z_index: i64) {
        let (anchor, cleared) = match self.align {
            HintAlign::Left => ("left", "right"),
            HintAlign::Right => ("right", "left"),
        };
        dom.remove_style(element, cleared);
        style::set_styles(
            dom,
            element,
            &[
                (anchor, style::px(self.offset)),
                ("top", style::px(self.top)),
                ("z-index", z_index.to_string()),
            ],
        );
    }
}

/// Whether a hint of `width` anchored at `measurements` may end up partly
/// outside the viewport.
pub fn is_edge_adjacent(
    measurements: &HintMeasurements,
    width: f64,
    half_height: f64,
    viewport: Viewport,
) -> bool {
    let outside_horizontally = match measurements.align {
        HintAlign::Left => viewport.width - measurements.x <= width,
        HintAlign::Right => measurements.x <= width,
    };
    let outside_vertically =
        measurements.y <= half_height || viewport.height - measurements.y <= half_height;
    outside_horizontally || outside_vertically
}

/// `Math.round`: halves round towards positive infinity.
#[inline]
pub fn js_round(value: f64) -> f64 {
    (value + 0.5).floor()
}
