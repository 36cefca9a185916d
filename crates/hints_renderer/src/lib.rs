//! Hint overlay renderer.
//!
//! Draws keyboard-navigation hint labels over a page inside one fixed,
//! shadow-rooted container. The background coordinator decides *what* to
//! hint; this crate decides *where*: it predicts label widths, keeps labels
//! inside the viewport, resolves overlapping labels into stacks whose
//! z-order can be rotated, and tears the overlay down on request.
//!
//! The pieces, bottom-up:
//! - [`messages`]: the JSON protocol with the background
//! - [`style`]: the hint stylesheet and the native/manual style backends
//! - [`hint`]: hint element factory, width model and placement
//! - [`fit`]: moving hints inside the viewport
//! - [`stacks`]: overlap stacks and z-order rotation
//! - [`session`]: the overlay state machine
//! - [`program`]: the message-driven event loop

pub mod config;
pub mod fit;
pub mod hint;
pub mod messages;
pub mod port;
pub mod program;
pub mod session;
pub mod stacks;
pub mod style;
pub mod telemetry;

pub use config::{BrowserEngine, RendererConfig};
pub use messages::{
    ElementWithHint, FromBackground, FromRenderer, HintAlign, HintMeasurements, HintUpdate,
    LogLevel, RenderTimestamps, ToBackground, ToRenderer, UnrenderMode,
};
pub use port::{BackgroundPort, PortError};
pub use program::{PageEvent, RendererProgram};
pub use session::{OverlaySession, RenderProgress, RendererState};
