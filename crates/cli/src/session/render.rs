//! Headless HUD: the dashboard state goes to the log instead of a window.

use contracts::{
    AlertLevel, AlertSnapshot, Channel, DashboardRenderer, DashboardView, RenderControl, Side,
};
use tracing::{debug, info, warn};

/// Logs severity changes immediately and a status line every `every` ticks
#[derive(Debug)]
pub struct LogRenderer {
    every: u64,
    last_overall: AlertLevel,
    frames: u64,
}

impl LogRenderer {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            last_overall: AlertLevel::Clear,
            frames: 0,
        }
    }

    /// Frames rendered so far
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// Sides whose blind-spot channel is above Clear
fn occupied_sides(alerts: &AlertSnapshot) -> Vec<Side> {
    Channel::ALL
        .into_iter()
        .filter(|channel| alerts.level(*channel) != AlertLevel::Clear)
        .filter_map(|channel| channel.side())
        .collect()
}

impl DashboardRenderer for LogRenderer {
    fn render(&mut self, view: &DashboardView) -> RenderControl {
        self.frames += 1;
        let alerts = &view.alerts;

        if alerts.overall != self.last_overall {
            let headline = view.headline();
            let blind_spot = occupied_sides(alerts);
            match alerts.overall {
                AlertLevel::Warn => warn!(
                    tick = view.tick,
                    ?blind_spot,
                    left = %alerts.left,
                    right = %alerts.right,
                    proximity = %alerts.proximity,
                    lane = %alerts.lane,
                    "{headline}"
                ),
                _ => info!(tick = view.tick, ?blind_spot, "{headline}"),
            }
            self.last_overall = alerts.overall;
        }

        if view.tick % self.every == 0 {
            debug!(
                tick = view.tick,
                sim_time = format!("{:.2}", view.sim_time),
                speed_kph = format!("{:.1}", view.speed_kph),
                throttle = view.control.throttle,
                reverse = view.control.reverse,
                nearest_m = ?view.nearest_distance_m.map(|d| format!("{d:.1}")),
                cameras = view.live_cameras.len(),
                overall = %alerts.overall,
                "HUD"
            );
        }

        RenderControl::Continue
    }
}
