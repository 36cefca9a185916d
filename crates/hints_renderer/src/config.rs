//! Configuration settings for the hint renderer.
//!
//! Values can be constructed programmatically or loaded from environment
//! variables, following the same conventions as the rest of the workspace.

use core::time::Duration;
use std::env;

/// Browser engine the renderer is embedded in. Decides the hint font and
/// whether a blocked stylesheet may be replaced by manual style replay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BrowserEngine {
    #[default]
    Chrome,
    Firefox,
}

impl BrowserEngine {
    /// Parse `firefox` or `chrome` (any case).
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("firefox") {
            Some(Self::Firefox)
        } else if value.eq_ignore_ascii_case("chrome") {
            Some(Self::Chrome)
        } else {
            None
        }
    }

    /// Only Firefox blocks extension stylesheets on pages with a strict CSP,
    /// so only there is the manual fallback worth its cost.
    #[inline]
    pub const fn allows_manual_styles(self) -> bool {
        matches!(self, Self::Firefox)
    }
}

/// Runtime configuration for the renderer.
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Time between simulated paints in milliseconds.
    pub frame_budget_ms: u64,
    /// Delay before a delayed unrender or a title unrender removes hints.
    pub unrender_delay_ms: u64,
    /// Cap on hints moved inside the viewport before the first paint.
    pub max_immediate_hint_movements: usize,
    /// Browser engine the overlay runs in.
    pub engine: BrowserEngine,
    /// Whether to log a JSON line per completed render.
    pub telemetry_enabled: bool,
}

impl RendererConfig {
    /// Construct a configuration with explicit values.
    ///
    /// # Arguments
    ///
    /// * `frame_budget_ms` - Frame budget in milliseconds (minimum 1ms)
    /// * `unrender_delay_ms` - Delay for delayed and title unrenders
    /// * `max_immediate_hint_movements` - Edge hints fitted before the first paint
    /// * `engine` - Browser engine flavour
    /// * `telemetry_enabled` - Whether to emit render telemetry
    #[inline]
    #[must_use]
    pub const fn new(
        frame_budget_ms: u64,
        unrender_delay_ms: u64,
        max_immediate_hint_movements: usize,
        engine: BrowserEngine,
        telemetry_enabled: bool,
    ) -> Self {
        let budget = if frame_budget_ms < 1 {
            1
        } else {
            frame_budget_ms
        };
        Self {
            frame_budget_ms: budget,
            unrender_delay_ms,
            max_immediate_hint_movements,
            engine,
            telemetry_enabled,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `HINTS_FRAME_BUDGET_MS`: Frame budget in milliseconds (default: 16)
    /// - `HINTS_UNRENDER_DELAY_MS`: Unrender delay in milliseconds (default: 200)
    /// - `HINTS_MAX_IMMEDIATE_MOVEMENTS`: Edge hints fitted immediately (default: 50)
    /// - `HINTS_ENGINE`: `firefox` or `chrome` (default: chrome)
    /// - `HINTS_TELEMETRY`: Set to "1" to enable telemetry (default: disabled)
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let frame_budget_ms = env::var("HINTS_FRAME_BUDGET_MS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(defaults.frame_budget_ms)
            .max(1);
        let unrender_delay_ms = env::var("HINTS_UNRENDER_DELAY_MS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(defaults.unrender_delay_ms);
        let max_immediate_hint_movements = env::var("HINTS_MAX_IMMEDIATE_MOVEMENTS")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(defaults.max_immediate_hint_movements);
        let engine = env::var("HINTS_ENGINE")
            .ok()
            .and_then(|val| BrowserEngine::parse(&val))
            .unwrap_or(defaults.engine);
        let telemetry_enabled = env::var("HINTS_TELEMETRY").ok().as_deref() == Some("1");
        Self {
            frame_budget_ms,
            unrender_delay_ms,
            max_immediate_hint_movements,
            engine,
            telemetry_enabled,
        }
    }

    #[inline]
    #[must_use]
    pub const fn frame_budget(&self) -> Duration {
        Duration::from_millis(self.frame_budget_ms)
    }

    #[inline]
    #[must_use]
    pub const fn unrender_delay(&self) -> Duration {
        Duration::from_millis(self.unrender_delay_ms)
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::new(16, 200, 50, BrowserEngine::Chrome, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_frame_budget_is_clamped() {
        let config = RendererConfig::new(0, 10, 5, BrowserEngine::Firefox, true);
        assert_eq!(config.frame_budget(), Duration::from_millis(1));
        assert_eq!(config.unrender_delay(), Duration::from_millis(10));
    }

    #[test]
    fn engine_parsing() {
        assert_eq!(BrowserEngine::parse("FireFox"), Some(BrowserEngine::Firefox));
        assert_eq!(BrowserEngine::parse("chrome"), Some(BrowserEngine::Chrome));
        assert_eq!(BrowserEngine::parse("safari"), None);
        assert!(BrowserEngine::Firefox.allows_manual_styles());
        assert!(!BrowserEngine::Chrome.allows_manual_styles());
    }
}
