//! Telemetry for completed renders: stage durations as one JSON line.
//! Callers pass the timestamps in; nothing here touches the session.

use log::info;

use crate::messages::RenderTimestamps;

/// Milliseconds spent in each stage of one render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderDurations {
    pub prepare_ms: f64,
    pub render_ms: f64,
    pub move_inside1_ms: f64,
    pub paint1_ms: f64,
    pub move_inside2_ms: f64,
    pub paint2_ms: f64,
    pub total_ms: f64,
}

impl From<&RenderTimestamps> for RenderDurations {
    fn from(stamps: &RenderTimestamps) -> Self {
        Self {
            prepare_ms: stamps.prepare - stamps.collect,
            render_ms: stamps.render - stamps.prepare,
            move_inside1_ms: stamps.move_inside1 - stamps.render,
            paint1_ms: stamps.paint1 - stamps.move_inside1,
            move_inside2_ms: stamps.move_inside2 - stamps.paint1,
            paint2_ms: stamps.paint2 - stamps.move_inside2,
            total_ms: stamps.paint2 - stamps.collect,
        }
    }
}

pub fn render_durations_json(durations: &RenderDurations) -> String {
    format!(
        "{{\"prepare_ms\":{:.3},\"render_ms\":{:.3},\"move_inside1_ms\":{:.3},\"paint1_ms\":{:.3},\"move_inside2_ms\":{:.3},\"paint2_ms\":{:.3},\"total_ms\":{:.3}}}",
        durations.prepare_ms,
        durations.render_ms,
        durations.move_inside1_ms,
        durations.paint1_ms,
        durations.move_inside2_ms,
        durations.paint2_ms,
        durations.total_ms
    )
}

pub fn maybe_emit(enabled: bool, json_line: &str) {
    if enabled {
        info!(target: "hints::telemetry", "{json_line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_are_stage_differences() {
        let stamps = RenderTimestamps {
            collect: 1.0,
            prepare: 2.0,
            render: 4.0,
            move_inside1: 5.0,
            paint1: 21.0,
            move_inside2: 22.0,
            paint2: 38.0,
        };
        let durations = RenderDurations::from(&stamps);
        assert_eq!(durations.paint1_ms, 16.0);
        assert_eq!(durations.total_ms, 37.0);
        let json: serde_json::Value =
            serde_json::from_str(&render_durations_json(&durations)).unwrap();
        assert_eq!(json["render_ms"], 2.0);
    }
}
