//! Styling of overlay nodes.
//!
//! Hint appearance comes from one stylesheet inserted into the container's
//! shadow root. Some pages forbid extension stylesheets (Firefox enforces the
//! page CSP on them), so the first insertion doubles as a capability probe:
//! if the host reports the sheet as blocked, the session switches to
//! [`ManualStyles`], which replays the parsed rules as inline styles on every
//! node it is told about.

use std::collections::HashMap;

use hints_css::{Stylesheet, parse_stylesheet};
use hints_dom::{NodeKey, OverlayDom, StyleSheetStatus};
use log::{debug, warn};

use crate::config::BrowserEngine;

pub const CONTAINER_ID: &str = "__SynthWebExt";
pub const HINT_CLASS: &str = "hint";
pub const HIDDEN_HINT_CLASS: &str = "hiddenHint";
pub const MATCHED_HINT_CLASS: &str = "matchedHint";
pub const HIGHLIGHTED_HINT_CLASS: &str = "highlightedHint";
pub const MATCHED_CHARS_CLASS: &str = "matchedChars";
pub const TITLE_CLASS: &str = "title";

/// Largest z-index browsers honour.
pub const MAX_Z_INDEX: i64 = 2_147_483_647;

/// Inline styles of the fixed container element.
pub fn container_styles() -> [(&'static str, String); 5] {
    [
        ("all", "unset".to_owned()),
        ("position", "fixed".to_owned()),
        ("z-index", MAX_Z_INDEX.to_string()),
        ("pointer-events", "none".to_owned()),
        ("overflow", "hidden".to_owned()),
    ]
}

/// The hint stylesheet for `engine`.
pub fn hint_css(engine: BrowserEngine) -> String {
    let font = match engine {
        BrowserEngine::Firefox => "font: menu;",
        BrowserEngine::Chrome => "font-family: system-ui;",
    };
    format!(
        "\
.{HINT_CLASS} {{
  position: absolute;
  transform: translateY(-50%);
  box-sizing: border-box;
  padding: 2px;
  border: solid 1px rgba(0, 0, 0, 0.4);
  background-color: #ffd76e;
  color: black;
  {font}
  font-size: 12px;
  line-height: 1;
  font-weight: bold;
  white-space: nowrap;
  text-align: center;
  text-transform: uppercase;
}}

.{HIDDEN_HINT_CLASS} {{
  opacity: 0;
}}

.{MATCHED_HINT_CLASS} {{
  background-color: lime;
}}

.{HIGHLIGHTED_HINT_CLASS} {{
  background-color: #a6f0ff;
}}

.{MATCHED_CHARS_CLASS} {{
  opacity: 0.3;
}}

.{TITLE_CLASS} {{
  box-sizing: border-box;
  position: absolute;
  z-index: {MAX_Z_INDEX};
  bottom: 0;
  right: 0;
  max-width: 100%;
  padding: 4px 6px;
  box-shadow: 0 0 1px 0 rgba(255, 255, 255, 0.5);
  background-color: black;
  color: white;
  {font}
  font-size: 14px;
  line-height: 1;
  white-space: nowrap;
  overflow: hidden;
  text-overflow: ellipsis;
}}"
    )
}

/// Set `styles` on `node` as `!important` inline declarations so page
/// styles cannot override them.
pub fn set_styles<D, V>(dom: &mut D, node: NodeKey, styles: &[(&str, V)])
where
    D: OverlayDom + ?Sized,
    V: AsRef<str>,
{
    for (property, value) in styles {
        dom.set_style(node, property, value.as_ref(), true);
    }
}

/// Format a pixel length, never producing `-0px`.
pub fn px(value: f64) -> String {
    if value == 0.0 {
        "0px".to_owned()
    } else {
        format!("{value}px")
    }
}

/// How stylesheet rules reach overlay nodes.
pub trait StyleBackend {
    fn name(&self) -> &'static str;

    /// Called after `scope` (the emptied shadow root) is about to receive
    /// new overlay content.
    fn install(&mut self, dom: &mut dyn OverlayDom, scope: NodeKey);

    /// Called after a node's classes change or it is created.
    fn restyle(&mut self, dom: &mut dyn OverlayDom, node: NodeKey);

    /// Drop per-node bookkeeping once the overlay is torn down.
    fn forget(&mut self) {}
}

/// The host applies the stylesheet; nothing to do per node.
#[derive(Debug)]
pub struct NativeStyles {
    css: String,
}

impl NativeStyles {
    pub const fn new(css: String) -> Self {
        Self { css }
    }
}

impl StyleBackend for NativeStyles {
    fn name(&self) -> &'static str {
        "native"
    }

    fn install(&mut self, dom: &mut dyn OverlayDom, scope: NodeKey) {
        if dom.insert_stylesheet(scope, &self.css) == StyleSheetStatus::Blocked {
            warn!("NativeStyles::install: host blocked the hint stylesheet");
        }
    }

    fn restyle(&mut self, _dom: &mut dyn OverlayDom, _node: NodeKey) {}
}

/// Replays parsed rules as inline declarations.
///
/// Replayed declarations never replace an inline value the renderer set
/// itself. When classes change, declarations replayed earlier are removed
/// first (unless the renderer has overwritten them since), so rules that
/// stopped matching stop applying.
#[derive(Debug)]
pub struct ManualStyles {
    sheet: Stylesheet,
    replayed: HashMap<NodeKey, Vec<(String, String)>>,
}

impl ManualStyles {
    pub fn new(css: &str) -> Self {
        Self {
            sheet: parse_stylesheet(css),
            replayed: HashMap::new(),
        }
    }
}

impl StyleBackend for ManualStyles {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn install(&mut self, _dom: &mut dyn OverlayDom, _scope: NodeKey) {}

    fn restyle(&mut self, dom: &mut dyn OverlayDom, node: NodeKey) {
        for (property, value) in self.replayed.remove(&node).unwrap_or_default() {
            if dom.style(node, &property).as_deref() == Some(value.as_str()) {
                dom.remove_style(node, &property);
            }
        }

        let mut matching: Vec<_> = self
            .sheet
            .rules
            .iter()
            .filter_map(|rule| {
                dom.matches(node, &rule.selectors)
                    .map(|specificity| (specificity, rule.source_order, rule))
            })
            .collect();
        matching.sort_by_key(|&(specificity, order, _)| (specificity, order));

        let mut cascaded = hints_css::DeclarationBlock::new();
        for (_, _, rule) in matching {
            for declaration in &rule.declarations {
                cascaded.set(&declaration.name, &declaration.value, declaration.important);
            }
        }

        let mut applied = Vec::new();
        for declaration in &cascaded {
            if dom.style(node, &declaration.name).is_some() {
                continue;
            }
            dom.set_style(node, &declaration.name, &declaration.value, declaration.important);
            applied.push((declaration.name.clone(), declaration.value.clone()));
        }
        if !applied.is_empty() {
            self.replayed.insert(node, applied);
        }
    }

    fn forget(&mut self) {
        self.replayed.clear();
    }
}

/// Picks a backend on first use and keeps it for the session.
pub struct StyleLayer {
    engine: BrowserEngine,
    css: String,
    backend: Option<Box<dyn StyleBackend>>,
}

impl StyleLayer {
    pub fn new(engine: BrowserEngine) -> Self {
        Self {
            engine,
            css: hint_css(engine),
            backend: None,
        }
    }

    /// Prepare `scope` for a render. The first call inserts the stylesheet
    /// and decides the backend from the host's answer.
    pub fn install<D: OverlayDom>(&mut self, dom: &mut D, scope: NodeKey) {
        if let Some(backend) = self.backend.as_mut() {
            backend.install(dom, scope);
            return;
        }
        let status = dom.insert_stylesheet(scope, &self.css);
        let backend: Box<dyn StyleBackend> =
            if status == StyleSheetStatus::Blocked && self.engine.allows_manual_styles() {
                warn!("StyleLayer::install: stylesheet blocked, applying styles manually");
                Box::new(ManualStyles::new(&self.css))
            } else {
                if status == StyleSheetStatus::Blocked {
                    warn!("StyleLayer::install: stylesheet blocked on {:?}", self.engine);
                }
                Box::new(NativeStyles::new(self.css.clone()))
            };
        debug!("StyleLayer::install: using {} styles", backend.name());
        self.backend = Some(backend);
    }

    /// Bring `node`'s styles up to date after it was created or its classes
    /// changed.
    pub fn restyle<D: OverlayDom>(&mut self, dom: &mut D, node: NodeKey) {
        if let Some(backend) = self.backend.as_mut() {
            backend.restyle(dom, node);
        }
    }

    pub fn forget(&mut self) {
        if let Some(backend) = self.backend.as_mut() {
            backend.forget();
        }
    }

    /// Name of the chosen backend, once decided.
    pub fn backend_name(&self) -> Option<&'static str> {
        self.backend.as_ref().map(|backend| backend.name())
    }

    pub fn is_manual(&self) -> bool {
        self.backend_name() == Some("manual")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hints_dom::{HeadlessDom, Viewport};

    fn scope(dom: &mut HeadlessDom) -> NodeKey {
        let host = dom.create_element("div");
        let root = dom.attach_shadow(host);
        let body = dom.body().unwrap();
        dom.append_child(body, host);
        root
    }

    #[test]
    fn stylesheet_parses_into_every_class_rule() {
        let sheet = parse_stylesheet(&hint_css(BrowserEngine::Firefox));
        assert_eq!(sheet.rules.len(), 6);
        let value = |sheet: &Stylesheet, name: &str| {
            sheet.rules[0]
                .declarations
                .iter()
                .find(|declaration| declaration.name == name)
                .map(|declaration| declaration.value.clone())
        };
        assert_eq!(value(&sheet, "transform").as_deref(), Some("translateY(-50%)"));
        assert_eq!(value(&sheet, "font").as_deref(), Some("menu"));
        assert_eq!(value(&sheet, "border").as_deref(), Some("solid 1px rgba(0, 0, 0, 0.4)"));
        let chrome = parse_stylesheet(&hint_css(BrowserEngine::Chrome));
        assert_eq!(value(&chrome, "font-family").as_deref(), Some("system-ui"));
    }

    #[test]
    fn px_never_negative_zero() {
        assert_eq!(px(-0.0), "0px");
        assert_eq!(px(-12.0), "-12px");
        assert_eq!(px(3.5), "3.5px");
    }

    #[test]
    fn manual_styles_follow_class_changes_without_clobbering_inline() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut dom = HeadlessDom::new(Viewport::new(400.0, 300.0)).with_blocked_stylesheets(true);
        let root = scope(&mut dom);
        let mut layer = StyleLayer::new(BrowserEngine::Firefox);
        layer.install(&mut dom, root);
        assert!(layer.is_manual());

        let hint = dom.create_element("div");
        dom.set_class_name(hint, HINT_CLASS);
        dom.set_style(hint, "padding", "5px", true);
        dom.append_child(root, hint);
        layer.restyle(&mut dom, hint);
        assert_eq!(dom.style(hint, "position").as_deref(), Some("absolute"));
        assert_eq!(dom.style(hint, "padding").as_deref(), Some("5px"));
        assert_eq!(dom.style(hint, "background-color").as_deref(), Some("#ffd76e"));

        dom.toggle_class(hint, MATCHED_HINT_CLASS, true);
        layer.restyle(&mut dom, hint);
        assert_eq!(dom.style(hint, "background-color").as_deref(), Some("lime"));

        dom.toggle_class(hint, MATCHED_HINT_CLASS, false);
        dom.toggle_class(hint, HIDDEN_HINT_CLASS, true);
        layer.restyle(&mut dom, hint);
        assert_eq!(dom.style(hint, "background-color").as_deref(), Some("#ffd76e"));
        assert_eq!(dom.style(hint, "opacity").as_deref(), Some("0"));
    }

    #[test]
    fn chrome_never_falls_back() {
        let mut dom = HeadlessDom::new(Viewport::new(400.0, 300.0)).with_blocked_stylesheets(true);
        let root = scope(&mut dom);
        let mut layer = StyleLayer::new(BrowserEngine::Chrome);
        layer.install(&mut dom, root);
        assert_eq!(layer.backend_name(), Some("native"));
    }
}
