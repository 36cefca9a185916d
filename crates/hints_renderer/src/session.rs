//! The overlay session: one container element and the hints of the current
//! render cycle.
//!
//! The session is synchronous. Anything that has to wait (the next paint, an
//! unrender delay) is stored as pending state and resumed by the driver via
//! [`OverlaySession::on_paint`] and [`OverlaySession::fire_timer`].

use hints_dom::{NodeKey, OverlayDom, Viewport};
use log::{debug, error, warn};
use tokio::time::Instant;
use tracing::info_span;

use crate::config::RendererConfig;
use crate::fit::{self, RectCache, move_inside_viewport};
use crate::hint::{
    HintPlacement, PLACEHOLDER_LABEL, WidthModel, create_hint_element, is_edge_adjacent,
    set_hint_content,
};
use crate::messages::{ElementWithHint, HintUpdate, RenderTimestamps};
use crate::stacks::{get_stacks, rotate_stacks};
use crate::style::{
    self, CONTAINER_ID, HIDDEN_HINT_CLASS, HIGHLIGHTED_HINT_CLASS, MATCHED_HINT_CLASS, MAX_Z_INDEX,
    StyleLayer, TITLE_CLASS, px,
};

/// Observable lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RendererState {
    /// Nothing attached.
    Idle,
    /// Hints are attached and a fitting pass waits for a paint.
    Rendering,
    /// Hints are attached and fitted.
    Rendered,
    /// A delayed teardown is scheduled or a title is on display.
    Unrendering,
}

/// Result of a step of the render pipeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RenderProgress {
    /// Nothing is being rendered.
    Idle,
    /// Call [`OverlaySession::on_paint`] after the next paint.
    AwaitingPaint,
    /// The render cycle is fully laid out.
    Finished(RenderTimestamps),
}

/// What a scheduled timer does when it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerAction {
    Unrender,
    /// Remove the hints but keep the title on display.
    RemoveHints,
}

#[derive(Clone, Copy, Debug)]
struct Timer {
    deadline: Instant,
    action: TimerAction,
}

enum PaintStage {
    /// The interior hints still need fitting.
    First { interior: Vec<NodeKey> },
    /// The second fitting pass moved hints; wait for them to paint.
    Second,
}

struct PendingRender {
    stage: PaintStage,
    timestamps: RenderTimestamps,
    viewport: Viewport,
}

pub struct OverlaySession<D: OverlayDom> {
    dom: D,
    config: RendererConfig,
    styles: StyleLayer,
    container: NodeKey,
    root: NodeKey,
    hints: Vec<NodeKey>,
    rects: RectCache,
    width_model: Option<WidthModel>,
    timer: Option<Timer>,
    pending: Option<PendingRender>,
    title: Option<NodeKey>,
    started: Instant,
}

impl<D: OverlayDom> OverlaySession<D> {
    /// Create the (detached) container and its shadow root.
    pub fn new(mut dom: D, config: RendererConfig) -> Self {
        let container = dom.create_element("div");
        dom.set_id(container, CONTAINER_ID);
        style::set_styles(&mut dom, container, &style::container_styles());
        let root = dom.attach_shadow(container);
        Self {
            styles: StyleLayer::new(config.engine),
            dom,
            config,
            container,
            root,
            hints: Vec::new(),
            rects: RectCache::new(),
            width_model: None,
            timer: None,
            pending: None,
            title: None,
            started: Instant::now(),
        }
    }

    #[inline]
    pub const fn dom(&self) -> &D {
        &self.dom
    }

    #[inline]
    pub const fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    #[inline]
    pub const fn container(&self) -> NodeKey {
        self.container
    }

    /// The shadow root holding all overlay content.
    #[inline]
    pub const fn root(&self) -> NodeKey {
        self.root
    }

    /// Hint elements of the current render cycle, by render index.
    #[inline]
    pub fn hints(&self) -> &[NodeKey] {
        &self.hints
    }

    #[inline]
    pub const fn rects(&self) -> &RectCache {
        &self.rects
    }

    #[inline]
    pub const fn title(&self) -> Option<NodeKey> {
        self.title
    }

    #[inline]
    pub const fn styles(&self) -> &StyleLayer {
        &self.styles
    }

    pub fn state(&self) -> RendererState {
        if !self.dom.is_connected(self.container) {
            RendererState::Idle
        } else if self.pending.is_some() {
            RendererState::Rendering
        } else if self.timer.is_some() || self.title.is_some() {
            RendererState::Unrendering
        } else {
            RendererState::Rendered
        }
    }

    #[inline]
    pub const fn awaiting_paint(&self) -> bool {
        self.pending.is_some()
    }

    /// When the scheduled timer, if any, should fire.
    #[inline]
    pub fn timer_deadline(&self) -> Option<Instant> {
        self.timer.map(|timer| timer.deadline)
    }

    fn now_ms(&self) -> f64 {
        self.started.elapsed().as_micros() as f64 / 1000.0
    }

    /// Replace whatever is displayed with one hint per element.
    ///
    /// Edge-adjacent hints (at most `max_immediate_hint_movements`) are fitted
    /// right away; the rest are fitted after the first paint so the overlay
    /// shows up as early as possible.
    pub fn render(&mut self, elements: &[ElementWithHint]) -> RenderProgress {
        let span = info_span!("render", hints = elements.len());
        let _guard = span.enter();

        let mut timestamps = RenderTimestamps {
            collect: self.now_ms(),
            ..RenderTimestamps::default()
        };
        self.unrender();

        let Some(document_element) = self.dom.document_element() else {
            warn!("OverlaySession::render: no document element to attach to");
            return RenderProgress::Idle;
        };
        let viewport = self.dom.viewport();
        self.update_container(viewport);
        self.styles.install(&mut self.dom, self.root);
        self.dom.append_child(document_element, self.container);

        if elements.is_empty() {
            let placeholder = create_hint_element(&mut self.dom, PLACEHOLDER_LABEL);
            style::set_styles(
                &mut self.dom,
                placeholder,
                &[
                    ("top", "50%"),
                    ("left", "50%"),
                    ("transform", "translate(-50%, -50%)"),
                ],
            );
            self.dom.append_child(self.root, placeholder);
            self.styles.restyle(&mut self.dom, placeholder);
            debug!("OverlaySession::render: nothing to hint");
            return RenderProgress::Finished(RenderTimestamps::all(self.now_ms()));
        }

        let model = self.measure_width_model();
        timestamps.prepare = self.now_ms();

        let mut edge = Vec::new();
        let mut interior = Vec::new();
        for (index, element) in elements.iter().enumerate() {
            let measurements = &element.hint_measurements;
            let hint = create_hint_element(&mut self.dom, &element.hint);
            let width = model.width(&element.hint);
            HintPlacement::compute(measurements, width, viewport).apply(
                &mut self.dom,
                hint,
                MAX_Z_INDEX.saturating_sub(index as i64),
            );
            self.dom.append_child(self.root, hint);
            self.styles.restyle(&mut self.dom, hint);
            self.hints.push(hint);

            if edge.len() < self.config.max_immediate_hint_movements
                && is_edge_adjacent(measurements, width, model.half_height, viewport)
            {
                edge.push(hint);
            } else {
                interior.push(hint);
            }
        }
        timestamps.render = self.now_ms();

        move_inside_viewport(&mut self.dom, &edge, viewport, &mut self.rects);
        timestamps.move_inside1 = self.now_ms();
        debug!(
            "OverlaySession::render: {} hints, {} fitted before paint",
            self.hints.len(),
            edge.len()
        );

        self.pending = Some(PendingRender {
            stage: PaintStage::First { interior },
            timestamps,
            viewport,
        });
        RenderProgress::AwaitingPaint
    }

    /// Resume a render after a paint.
    pub fn on_paint(&mut self) -> RenderProgress {
        let Some(mut pending) = self.pending.take() else {
            return RenderProgress::Idle;
        };
        match pending.stage {
            PaintStage::First { mut interior } => {
                pending.timestamps.paint1 = self.now_ms();
                interior.retain(|&hint| self.dom.is_connected(hint));
                let moved =
                    move_inside_viewport(&mut self.dom, &interior, pending.viewport, &mut self.rects);
                pending.timestamps.move_inside2 = self.now_ms();
                if moved {
                    pending.stage = PaintStage::Second;
                    self.pending = Some(pending);
                    RenderProgress::AwaitingPaint
                } else {
                    pending.timestamps.paint2 = self.now_ms();
                    RenderProgress::Finished(pending.timestamps)
                }
            }
            PaintStage::Second => {
                pending.timestamps.paint2 = self.now_ms();
                RenderProgress::Finished(pending.timestamps)
            }
        }
    }

    fn measure_width_model(&mut self) -> WidthModel {
        let probes = [
            create_hint_element(&mut self.dom, "W"),
            create_hint_element(&mut self.dom, "WW"),
        ];
        for probe in probes {
            self.dom.append_child(self.root, probe);
            self.styles.restyle(&mut self.dom, probe);
        }
        let [one, two] = probes.map(|probe| self.dom.bounding_client_rect(probe));
        for probe in probes {
            self.dom.remove(probe);
        }
        let model = WidthModel::from_probes(&one, &two);
        self.width_model = Some(model);
        model
    }

    /// Size the container to `viewport` and cancel out any offset of the
    /// document element.
    fn update_container(&mut self, viewport: Viewport) {
        let origin = self.dom.container_origin();
        style::set_styles(
            &mut self.dom,
            self.container,
            &[
                ("left", px(-origin.x)),
                ("top", px(-origin.y)),
                ("width", px(viewport.width)),
                ("height", px(viewport.height)),
            ],
        );
    }

    /// The viewport changed size.
    pub fn on_resize(&mut self) {
        if self.dom.is_connected(self.container) {
            let viewport = self.dom.viewport();
            self.update_container(viewport);
        }
    }

    /// A click or key press while a title is shown dismisses the overlay.
    pub fn on_user_input(&mut self) {
        if self.title.is_some() {
            self.unrender();
        }
    }

    /// Apply incremental updates to hints of the current render cycle.
    /// Updates addressing a hint that does not exist are logged and skipped.
    pub fn update_hints(&mut self, updates: &[HintUpdate], mark_matched: bool) {
        let viewport = self.dom.viewport();
        let mut repositioned = Vec::new();

        for update in updates {
            let Some(&hint) = self.hints.get(update.index()) else {
                error!("OverlaySession::update_hints: no hint at index {}: {update:?}", update.index());
                continue;
            };
            match update {
                HintUpdate::Hide { .. } => {
                    self.dom.toggle_class(hint, HIDDEN_HINT_CLASS, true);
                }
                HintUpdate::UpdateContent {
                    order,
                    matched_chars,
                    rest_chars,
                    highlighted,
                    hidden,
                    ..
                } => {
                    self.set_flags(hint, *order, *highlighted, *hidden);
                    if let Some(span) =
                        set_hint_content(&mut self.dom, hint, matched_chars, rest_chars)
                    {
                        self.styles.restyle(&mut self.dom, span);
                    }
                    if mark_matched {
                        self.dom.toggle_class(hint, MATCHED_HINT_CLASS, true);
                    }
                }
                HintUpdate::UpdatePosition {
                    order,
                    hint: label,
                    hint_measurements,
                    highlighted,
                    hidden,
                    ..
                } => {
                    self.set_flags(hint, *order, *highlighted, *hidden);
                    set_hint_content(&mut self.dom, hint, "", label);
                    let model = match self.width_model {
                        Some(model) => model,
                        None => self.measure_width_model(),
                    };
                    fit::clear_corrections(&mut self.dom, hint);
                    let placement =
                        HintPlacement::compute(hint_measurements, model.width(label), viewport);
                    placement.apply(&mut self.dom, hint, z_for_order(*order));
                    repositioned.push(hint);
                }
            }
            self.styles.restyle(&mut self.dom, hint);
        }

        if !repositioned.is_empty() {
            move_inside_viewport(&mut self.dom, &repositioned, viewport, &mut self.rects);
        }
    }

    fn set_flags(&mut self, hint: NodeKey, order: u32, highlighted: bool, hidden: bool) {
        self.dom.toggle_class(hint, HIDDEN_HINT_CLASS, hidden);
        self.dom.toggle_class(hint, HIGHLIGHTED_HINT_CLASS, highlighted);
        style::set_styles(&mut self.dom, hint, &[("z-index", z_for_order(order).to_string())]);
    }

    /// Rotate z-order within every group of overlapping hints.
    pub fn rotate_hints(&mut self, forward: bool) {
        let stacks = get_stacks(&self.dom, &self.hints, &self.rects);
        rotate_stacks(&mut self.dom, &stacks, forward);
    }

    /// Tear everything down synchronously. Safe to call at any time.
    pub fn unrender(&mut self) {
        self.timer = None;
        self.pending = None;
        self.title = None;
        self.width_model = None;
        self.hints.clear();
        self.rects.clear();
        self.styles.forget();

        self.dom.remove(self.container);
        self.dom.clear_children(self.root);
        // Containers left behind by an earlier instance of the renderer.
        for stray in self.dom.elements_with_id(CONTAINER_ID) {
            self.dom.remove(stray);
        }
    }

    /// Schedule an unrender after the configured delay, unless a timer is
    /// already pending.
    pub fn unrender_delayed(&mut self) {
        if self.timer.is_some() {
            return;
        }
        self.timer = Some(Timer {
            deadline: Instant::now() + self.config.unrender_delay(),
            action: TimerAction::Unrender,
        });
    }

    /// Show `title` in the corner, remove the hints after the configured
    /// delay, and keep the title until the user clicks or presses a key.
    pub fn unrender_to_title(&mut self, title: &str) {
        self.timer = None;
        if let Some(previous) = self.title.take() {
            self.dom.remove(previous);
        }
        let element = self.dom.create_element("div");
        self.dom.set_class_name(element, TITLE_CLASS);
        self.dom.set_text_content(element, title);
        self.dom.append_child(self.root, element);
        self.styles.restyle(&mut self.dom, element);
        self.title = Some(element);
        self.timer = Some(Timer {
            deadline: Instant::now() + self.config.unrender_delay(),
            action: TimerAction::RemoveHints,
        });
    }

    /// Run the scheduled timer action now.
    pub fn fire_timer(&mut self) {
        let Some(timer) = self.timer.take() else {
            return;
        };
        debug!("OverlaySession::fire_timer: {:?}", timer.action);
        match timer.action {
            TimerAction::Unrender => self.unrender(),
            TimerAction::RemoveHints => {
                for hint in self.hints.drain(..) {
                    self.dom.remove(hint);
                }
                self.rects.clear();
            }
        }
    }
}

#[inline]
fn z_for_order(order: u32) -> i64 {
    MAX_Z_INDEX - i64::from(order)
}
