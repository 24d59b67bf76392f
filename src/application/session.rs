// Dashboard session - the event-driven pipeline context
use crate::application::chart_sync::{ChartSink, ChartSync};
use crate::application::history::{ExportError, HistoryBuffer};
use crate::application::normalizer::{Normalizer, TempExtremes};
use crate::domain::connection::ConnectionState;
use crate::domain::reading::{AirQuality, Metric, NormalizedReading, RawMessage};
use chrono::{DateTime, Utc};

/// Which transport is currently feeding the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    WebSocket,
    Polling,
}

impl TransportMode {
    pub const fn label(self) -> &'static str {
        match self {
            TransportMode::WebSocket => "WebSocket",
            TransportMode::Polling => "HTTP Polling",
        }
    }
}

/// Everything the connection manager can tell the session. One event maps
/// to one pipeline transition; events are processed synchronously and in
/// arrival order, so no two readings ever interleave.
#[derive(Debug)]
pub enum SessionEvent {
    StreamConnecting,
    StreamOpened,
    StreamClosed,
    StreamFailed,
    MessageReceived(RawMessage),
    PollSucceeded(RawMessage),
    PollFailed,
}

/// Owns all client-side dashboard state: the normalizer with its
/// last-known-good store, the history buffer, the chart projection, and the
/// connectivity flags. All mutation goes through [`DashboardSession::handle`].
pub struct DashboardSession<S: ChartSink> {
    normalizer: Normalizer,
    history: HistoryBuffer,
    chart: ChartSync,
    sink: S,
    state: ConnectionState,
    is_connected: bool,
    mode: TransportMode,
    chart_paused: bool,
    latest: Option<NormalizedReading>,
}

impl<S: ChartSink> DashboardSession<S> {
    pub fn new(sink: S, max_samples: usize, metric: Metric) -> Self {
        Self {
            normalizer: Normalizer::default(),
            history: HistoryBuffer::new(max_samples),
            chart: ChartSync::new(metric),
            sink,
            state: ConnectionState::Disconnected,
            is_connected: false,
            mode: TransportMode::WebSocket,
            chart_paused: false,
            latest: None,
        }
    }

    pub fn handle(&mut self, event: SessionEvent) {
        self.handle_at(event, Utc::now());
    }

    pub fn handle_at(&mut self, event: SessionEvent, now: DateTime<Utc>) {
        match event {
            SessionEvent::StreamConnecting => {
                self.state = ConnectionState::Connecting;
            }
            SessionEvent::StreamOpened => {
                self.is_connected = true;
                self.mode = TransportMode::WebSocket;
                tracing::info!("streaming transport connected");
            }
            SessionEvent::StreamClosed | SessionEvent::StreamFailed => {
                self.is_connected = false;
                self.state = ConnectionState::Disconnected;
            }
            SessionEvent::MessageReceived(msg) => self.on_message(msg, now),
            SessionEvent::PollSucceeded(msg) => {
                self.is_connected = true;
                self.mode = TransportMode::Polling;
                self.on_message(msg, now);
            }
            SessionEvent::PollFailed => {
                self.is_connected = false;
            }
        }
    }

    fn on_message(&mut self, msg: RawMessage, now: DateTime<Utc>) {
        let previous = self.state;
        self.state = ConnectionState::from_message(msg.state.as_deref());
        if self.state != previous {
            tracing::debug!(from = previous.label(), to = self.state.label(), "link state changed");
        }

        // While waiting or disconnected only the indicator updates; payload
        // values are not forwarded to the pipeline.
        if !self.state.is_live() {
            return;
        }

        let reading = self.normalizer.normalize(&msg, self.state, now);
        self.history.append(reading.clone(), now);
        if !self.chart_paused {
            self.chart.record(&reading, now, &mut self.sink);
        }
        self.latest = Some(reading);
    }

    // ---- operator controls ----

    pub fn select_metric(&mut self, metric: Metric) {
        self.chart.select_metric(metric, &self.history, &mut self.sink);
    }

    /// Apply a new rolling window (seconds, 0 = unbounded) to both the
    /// history buffer and the chart projection.
    pub fn set_window(&mut self, secs: u64) {
        self.history.set_window(secs);
        self.chart.set_window(secs, &self.history, &mut self.sink);
    }

    /// Pause chart updates; readings keep normalizing and buffering.
    pub fn pause_chart(&mut self) {
        self.chart_paused = true;
    }

    pub fn resume_chart(&mut self) {
        self.chart_paused = false;
    }

    /// Drop both the history and the visible series.
    pub fn clear(&mut self) {
        self.history.clear();
        self.chart.clear(&mut self.sink);
    }

    pub fn export_csv(&self) -> Result<String, ExportError> {
        self.history.export_csv()
    }

    // ---- read access for the presentation layer ----

    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    pub fn transport_mode(&self) -> TransportMode {
        self.mode
    }

    pub fn selected_metric(&self) -> Metric {
        self.chart.metric()
    }

    pub fn latest(&self) -> Option<&NormalizedReading> {
        self.latest.as_ref()
    }

    pub fn air_quality(&self) -> AirQuality {
        self.normalizer.air_quality()
    }

    pub fn temp_extremes(&self) -> &TempExtremes {
        self.normalizer.temp_extremes()
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }
}
