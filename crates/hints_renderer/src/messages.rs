//! Message protocol between the renderer and the background coordinator.
//!
//! Every record serialises to the JSON shape the extension exchanges over its
//! runtime port: internally tagged by `"type"`, camelCase field names.

use anyhow::{Context as _, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

/// Which side of the anchor point the hint box grows from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintAlign {
    Left,
    Right,
}

/// Where and how to place a hint, computed by the element collector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintMeasurements {
    pub x: f64,
    pub y: f64,
    pub align: HintAlign,
    /// Left-aligned hints must end before this x coordinate.
    pub max_x: f64,
    pub weight: f64,
}

impl HintMeasurements {
    #[inline]
    pub const fn new(x: f64, y: f64, align: HintAlign, max_x: f64) -> Self {
        Self {
            x,
            y,
            align,
            max_x,
            weight: 1.0,
        }
    }
}

/// Kind of element a hint points at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementType {
    #[default]
    Clickable,
    ClickableEvent,
    Label,
    Link,
    Selectable,
    Scrollable,
    Textarea,
}

/// Frame the element was collected in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRef {
    pub id: u64,
    pub index: usize,
}

/// An element report from the collector, extended with its hint label.
///
/// The renderer only reads `hint_measurements` and `hint`; the remaining
/// fields ride along so reports round-trip unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementWithHint {
    #[serde(rename = "type", default)]
    pub element_type: ElementType,
    #[serde(default)]
    pub index: usize,
    pub hint_measurements: HintMeasurements,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub text_weight: f64,
    #[serde(default)]
    pub is_text_input: bool,
    #[serde(default)]
    pub has_click_listener: bool,
    #[serde(default)]
    pub frame: FrameRef,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub weight: f64,
    pub hint: String,
}

impl ElementWithHint {
    /// A report carrying only what rendering needs.
    pub fn new(hint: impl Into<String>, hint_measurements: HintMeasurements) -> Self {
        Self {
            element_type: ElementType::default(),
            index: 0,
            hint_measurements,
            url: None,
            text: String::new(),
            text_weight: 0.0,
            is_text_input: false,
            has_click_listener: false,
            frame: FrameRef::default(),
            hidden: false,
            weight: hint_measurements.weight,
            hint: hint.into(),
        }
    }
}

/// Incremental change to one rendered hint, addressed by its render index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HintUpdate {
    Hide {
        index: usize,
    },
    #[serde(rename_all = "camelCase")]
    UpdateContent {
        index: usize,
        order: u32,
        matched_chars: String,
        rest_chars: String,
        highlighted: bool,
        hidden: bool,
    },
    #[serde(rename_all = "camelCase")]
    UpdatePosition {
        index: usize,
        order: u32,
        hint: String,
        hint_measurements: HintMeasurements,
        highlighted: bool,
        hidden: bool,
    },
}

impl HintUpdate {
    /// Render index of the hint this update targets.
    #[inline]
    pub const fn index(&self) -> usize {
        match *self {
            Self::Hide { index }
            | Self::UpdateContent { index, .. }
            | Self::UpdatePosition { index, .. } => index,
        }
    }
}

/// Log verbosity pushed by the coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Log,
    Debug,
}

impl LogLevel {
    #[inline]
    pub const fn filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Log => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
        }
    }
}

/// How an `Unrender` request tears the overlay down.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UnrenderMode {
    Immediate,
    Delayed,
    Title { title: String },
}

/// Requests addressed to the renderer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToRenderer {
    #[serde(rename_all = "camelCase")]
    StateSync { log_level: LogLevel },
    Render { elements: Vec<ElementWithHint> },
    #[serde(rename_all = "camelCase")]
    UpdateHints {
        updates: Vec<HintUpdate>,
        mark_matched: bool,
    },
    RotateHints { forward: bool },
    Unrender { mode: UnrenderMode },
}

impl ToRenderer {
    /// Protocol tag, for logging.
    pub const fn tag(&self) -> &'static str {
        match *self {
            Self::StateSync { .. } => "StateSync",
            Self::Render { .. } => "Render",
            Self::UpdateHints { .. } => "UpdateHints",
            Self::RotateHints { .. } => "RotateHints",
            Self::Unrender { .. } => "Unrender",
        }
    }
}

/// Everything the background broadcasts to content scripts.
///
/// Envelopes for other content scripts share the channel; they decode to
/// [`FromBackground::Other`] and are ignored. An unknown request *inside* a
/// `ToRenderer` envelope is a decoding error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FromBackground {
    ToRenderer {
        message: ToRenderer,
    },
    /// Sent when the background finds the renderer was injected before it
    /// was listening. The renderer repeats its handshake.
    #[serde(rename = "FirefoxWorkaround")]
    RetryHandshake,
    #[serde(other)]
    Other,
}

/// Milliseconds since the renderer started, per render stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderTimestamps {
    pub collect: f64,
    pub prepare: f64,
    pub render: f64,
    pub move_inside1: f64,
    pub paint1: f64,
    pub move_inside2: f64,
    pub paint2: f64,
}

impl RenderTimestamps {
    /// Every stage stamped with the same instant.
    #[inline]
    pub const fn all(now: f64) -> Self {
        Self {
            collect: now,
            prepare: now,
            render: now,
            move_inside1: now,
            paint1: now,
            move_inside2: now,
            paint2: now,
        }
    }
}

/// Reports sent by the renderer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FromRenderer {
    RendererScriptAdded,
    Rendered { timestamps: RenderTimestamps },
}

impl FromRenderer {
    pub const fn tag(&self) -> &'static str {
        match *self {
            Self::RendererScriptAdded => "RendererScriptAdded",
            Self::Rendered { .. } => "Rendered",
        }
    }
}

/// Outbound envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToBackground {
    FromRenderer { message: FromRenderer },
}

impl From<FromRenderer> for ToBackground {
    #[inline]
    fn from(message: FromRenderer) -> Self {
        Self::FromRenderer { message }
    }
}

/// Decode one inbound JSON message.
///
/// # Errors
///
/// Returns an error when the payload is not valid JSON, or when a
/// `ToRenderer` envelope carries an unknown or malformed request.
pub fn decode_from_background(json: &str) -> Result<FromBackground> {
    serde_json::from_str(json).with_context(|| format!("undecodable message to renderer: {json}"))
}

/// Encode one outbound envelope.
///
/// # Errors
///
/// Returns an error if serialisation fails.
pub fn encode_to_background(message: &ToBackground) -> Result<String> {
    serde_json::to_string(message).context("encoding message from renderer")
}
