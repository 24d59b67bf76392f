// Value and status formatting for the console renderer
use crate::application::chart_sync::ChartSink;
use crate::application::normalizer::TempExtremes;
use crate::application::session::{DashboardSession, TransportMode};
use crate::domain::connection::ConnectionState;
use crate::domain::reading::{AirQuality, Metric, MetricSlot, NormalizedReading};
use chrono::{DateTime, Utc};

/// Render one metric slot with its display precision. Never-observed slots
/// render as `--`; backfilled slots carry a stale marker.
pub fn format_metric(metric: Metric, slot: MetricSlot) -> String {
    let Some(value) = slot.value else {
        return "--".to_string();
    };
    let formatted = match metric {
        Metric::Temperature => format!("{value:.1} °C"),
        Metric::Pressure => format!("{value:.0} Pa"),
        Metric::Altitude => format!("{value:.1} m"),
        Metric::Iaq => format!("{value:.0}"),
        Metric::Tvoc | Metric::Eco2 => format!("{value:.0}"),
        Metric::Ethanol => format!("{value:.2}"),
    };
    if slot.stale {
        format!("{formatted} (stale)")
    } else {
        formatted
    }
}

/// Secondary line under the temperature tile.
pub fn temp_meta(extremes: &TempExtremes) -> String {
    if !extremes.has_samples() {
        return String::new();
    }
    format!("Max: {:.1}°C | Min: {:.1}°C", extremes.max, extremes.min)
}

/// Secondary line under the pressure tile, in hectopascal.
pub fn pressure_meta(pressure_pa: f64) -> String {
    format!("{:.0} hPa", pressure_pa / 100.0)
}

/// The connectivity banner: distinguishes a dead transport from a live
/// transport that is still waiting on the sensor link.
pub fn status_line(connected: bool, state: ConnectionState, mode: TransportMode) -> String {
    if !connected {
        return "disconnected from backend - reconnecting...".to_string();
    }
    match state {
        ConnectionState::Waiting => "backend connected - waiting for sensor data...".to_string(),
        ConnectionState::Disconnected => "sensor link down - retrying...".to_string(),
        _ => format!("connected via {} [{}]", mode.label(), state.label()),
    }
}

pub fn last_update_line(timestamp: DateTime<Utc>) -> String {
    format!("Last update: {}", timestamp.format("%Y-%m-%d %I:%M:%S %p"))
}

/// Chart sink that logs points instead of drawing them. Stands in for a
/// real plotting backend in the headless build.
#[derive(Debug, Default)]
pub struct LogSink {
    label: String,
    points: usize,
}

impl ChartSink for LogSink {
    fn append_point(&mut self, label: &str, value: f64) {
        self.points += 1;
        tracing::trace!(series = %self.label, %label, value, "chart point");
    }

    fn set_series(&mut self, points: &[(String, f64)]) {
        self.points = points.len();
        tracing::trace!(series = %self.label, points = points.len(), "chart series replaced");
    }

    fn clear(&mut self) {
        tracing::trace!(series = %self.label, dropped = self.points, "chart cleared");
        self.points = 0;
    }

    fn set_style(&mut self, label: &str, color: &str) {
        self.label = label.to_string();
        tracing::trace!(series = %self.label, color, "chart restyled");
    }
}

/// Logs the dashboard state after each session event: the connectivity
/// banner whenever it changes, and the current values per reading.
#[derive(Debug, Default)]
pub struct ConsoleView {
    last_status: String,
    last_rendered: Option<DateTime<Utc>>,
}

impl ConsoleView {
    pub fn render<S: ChartSink>(&mut self, session: &DashboardSession<S>) {
        let status = status_line(
            session.is_connected(),
            session.connection_state(),
            session.transport_mode(),
        );
        if status != self.last_status {
            tracing::info!("{status}");
            self.last_status = status;
        }

        let Some(reading) = session.latest() else {
            return;
        };
        if self.last_rendered == Some(reading.timestamp) {
            return;
        }
        self.last_rendered = Some(reading.timestamp);
        tracing::info!("{}", reading_line(reading, session.air_quality()));
        let meta = temp_meta(session.temp_extremes());
        if !meta.is_empty() {
            tracing::debug!("{meta}");
        }
        if let Some(pressure) = reading.value(Metric::Pressure) {
            tracing::debug!("{}", pressure_meta(pressure));
        }
        tracing::debug!(
            buffered = session.history().len(),
            "{}",
            last_update_line(reading.timestamp)
        );
    }
}

fn reading_line(reading: &NormalizedReading, quality: AirQuality) -> String {
    let mut parts = Vec::with_capacity(Metric::ALL.len());
    for metric in Metric::ALL {
        let rendered = format_metric(metric, reading.slot(metric));
        if metric == Metric::Iaq {
            parts.push(format!("{}: {} [{}]", metric.key(), rendered, quality.label()));
        } else {
            parts.push(format!("{}: {}", metric.key(), rendered));
        }
    }
    parts.join(" | ")
}
