//! Overlap stacks and z-order rotation.
//!
//! Hints of nearby elements overlap and hide each other. Rotating the
//! z-indexes within each group of transitively overlapping hints lets the user
//! bring every hidden label to the top in turn.

use std::collections::HashMap;

use hints_dom::{NodeKey, OverlayDom, Rect, overlaps};
use log::trace;

use crate::fit::RectCache;

/// Partition `hints` into groups connected by pairwise overlap.
///
/// Cached rectangles are used where available; the rest are read from
/// layout once each.
pub fn get_stacks<D: OverlayDom>(dom: &D, hints: &[NodeKey], rects: &RectCache) -> Vec<Vec<NodeKey>> {
    let geometry: HashMap<NodeKey, Rect> = hints
        .iter()
        .map(|&hint| {
            let rect = rects
                .get(&hint)
                .copied()
                .unwrap_or_else(|| dom.bounding_client_rect(hint));
            (hint, rect)
        })
        .collect();
    let rect_of = |hint: &NodeKey| geometry.get(hint).copied().unwrap_or_default();

    let mut remaining = hints.to_vec();
    let mut stacks = Vec::new();
    while let Some(seed) = remaining.pop() {
        let mut stack = vec![seed];
        let mut frontier = vec![seed];
        while let Some(current) = frontier.pop() {
            let current_rect = rect_of(&current);
            let (touching, rest): (Vec<NodeKey>, Vec<NodeKey>) = remaining
                .into_iter()
                .partition(|other| overlaps(&current_rect, &rect_of(other)));
            remaining = rest;
            frontier.extend(touching.iter().copied());
            stack.extend(touching);
        }
        stacks.push(stack);
    }
    stacks
}

/// Cyclically shift the z-indexes within every stack of two or more hints.
///
/// Forward: the hint with the lowest z-index takes the next higher value and
/// the highest one drops to the lowest value. Backward is the inverse, so a
/// forward rotation followed by a backward one restores the original order.
pub fn rotate_stacks<D: OverlayDom>(dom: &mut D, stacks: &[Vec<NodeKey>], forward: bool) {
    for stack in stacks.iter().filter(|stack| stack.len() >= 2) {
        let mut ordered: Vec<(i64, NodeKey)> =
            stack.iter().map(|&hint| (z_index(dom, hint), hint)).collect();
        if forward {
            ordered.sort_by_key(|&(z, _)| z);
        } else {
            ordered.sort_by_key(|&(z, _)| core::cmp::Reverse(z));
        }
        let mut shifted: Vec<i64> = ordered.iter().map(|&(z, _)| z).collect();
        shifted.rotate_left(1);
        for (&(_, hint), z) in ordered.iter().zip(shifted) {
            trace!("rotate_stacks: {hint:?} -> {z}");
            dom.set_style(hint, "z-index", &z.to_string(), true);
        }
    }
}

/// Inline z-index of `hint`, `0` if unset.
pub fn z_index<D: OverlayDom + ?Sized>(dom: &D, hint: NodeKey) -> i64 {
    dom.style(hint, "z-index")
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0)
}
