// Chart sync - projects readings onto a bounded external chart series
use crate::application::history::HistoryBuffer;
use crate::domain::reading::{Metric, NormalizedReading};
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

/// Maximum points kept on screen, for render performance.
pub const MAX_DISPLAY_POINTS: usize = 600;

/// Narrow seam to the rendering library. The core never sees the concrete
/// chart object graph; it only pushes ordered (label, value) pairs.
pub trait ChartSink {
    fn append_point(&mut self, label: &str, value: f64);
    fn set_series(&mut self, points: &[(String, f64)]);
    fn clear(&mut self);
    fn set_style(&mut self, label: &str, color: &str);
}

/// Keeps the visible chart series in sync with the selected metric.
///
/// Owns the authoritative visible window (points with their timestamps) so
/// head-trimming decisions are made against the chart's own points, never
/// against the history buffer's.
#[derive(Debug)]
pub struct ChartSync {
    metric: Metric,
    window_secs: Option<i64>,
    points: VecDeque<(DateTime<Utc>, f64)>,
}

impl ChartSync {
    pub fn new(metric: Metric) -> Self {
        Self {
            metric,
            window_secs: None,
            points: VecDeque::new(),
        }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Visible point budget: the performance cap, further narrowed by the
    /// time window when one is set (points arrive at roughly 1 Hz).
    fn visible_cap(&self) -> usize {
        match self.window_secs {
            Some(w) => MAX_DISPLAY_POINTS.min(w as usize),
            None => MAX_DISPLAY_POINTS,
        }
    }

    /// Incremental update for one accepted streaming reading.
    ///
    /// Skipped entirely when the selected metric has no numeric value for
    /// this reading. Appends via the sink when no trim is needed; a trim
    /// replays the bounded window through `set_series`.
    pub fn record(
        &mut self,
        reading: &NormalizedReading,
        now: DateTime<Utc>,
        sink: &mut dyn ChartSink,
    ) {
        let Some(value) = reading.value(self.metric).filter(|v| v.is_finite()) else {
            return;
        };

        self.points.push_back((reading.timestamp, value));

        let mut trimmed = false;
        while self.points.len() > self.visible_cap() {
            self.points.pop_front();
            trimmed = true;
        }
        if let Some(window) = self.window_secs {
            let cutoff = now - Duration::seconds(window);
            while self.points.front().is_some_and(|(ts, _)| *ts < cutoff) {
                self.points.pop_front();
                trimmed = true;
            }
        }

        if trimmed {
            self.push_series(sink);
        } else {
            sink.append_point(&point_label(reading.timestamp), value);
        }
    }

    /// Discard the visible series and repopulate it from the history tail.
    ///
    /// The only path that can shrink or re-scope the series; idempotent for
    /// unchanged buffer contents and never consults connection state.
    pub fn rebuild(&mut self, history: &HistoryBuffer, sink: &mut dyn ChartSink) {
        self.points.clear();
        for entry in history.tail(MAX_DISPLAY_POINTS) {
            if let Some(value) = entry.value(self.metric).filter(|v| v.is_finite()) {
                self.points.push_back((entry.timestamp, value));
            }
        }
        self.push_series(sink);
    }

    /// Switch the rendered metric: restyle the series and rebuild it.
    pub fn select_metric(
        &mut self,
        metric: Metric,
        history: &HistoryBuffer,
        sink: &mut dyn ChartSink,
    ) {
        self.metric = metric;
        sink.set_style(metric.label(), metric.color());
        self.rebuild(history, sink);
    }

    /// Change the time window (0 = unbounded up to the performance cap) and
    /// rebuild the visible series.
    pub fn set_window(&mut self, secs: u64, history: &HistoryBuffer, sink: &mut dyn ChartSink) {
        self.window_secs = (secs > 0).then_some(secs as i64);
        self.rebuild(history, sink);
    }

    pub fn clear(&mut self, sink: &mut dyn ChartSink) {
        self.points.clear();
        sink.clear();
    }

    fn push_series(&self, sink: &mut dyn ChartSink) {
        let series: Vec<(String, f64)> = self
            .points
            .iter()
            .map(|(ts, v)| (point_label(*ts), *v))
            .collect();
        sink.set_series(&series);
    }
}

fn point_label(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%H:%M:%S").to_string()
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSink;
    use super::*;
    use crate::domain::reading::MetricSlot;

    fn reading(timestamp: DateTime<Utc>, metric: Metric, value: Option<f64>) -> NormalizedReading {
        let mut slots = [MetricSlot::default(); Metric::ALL.len()];
        if let Some(v) = value {
            slots[metric.idx()] = MetricSlot {
                value: Some(v),
                stale: false,
            };
        }
        NormalizedReading::new(timestamp, slots)
    }

    #[test]
    fn test_record_skips_missing_metric_value() {
        let now = Utc::now();
        let mut sync = ChartSync::new(Metric::Pressure);
        let mut sink = RecordingSink::default();

        sync.record(&reading(now, Metric::Temperature, Some(20.0)), now, &mut sink);
        assert!(sink.series.is_empty());

        sync.record(&reading(now, Metric::Pressure, Some(101325.0)), now, &mut sink);
        assert_eq!(sink.series.len(), 1);
        assert_eq!(sink.series[0].1, 101325.0);
    }

    #[test]
    fn test_record_trims_by_window_using_chart_timestamps() {
        let now = Utc::now();
        let mut sync = ChartSync::new(Metric::Temperature);
        let mut sink = RecordingSink::default();
        let history = HistoryBuffer::new(10);
        sync.set_window(30, &history, &mut sink);

        sync.record(
            &reading(now - Duration::seconds(60), Metric::Temperature, Some(1.0)),
            now - Duration::seconds(60),
            &mut sink,
        );
        sync.record(&reading(now, Metric::Temperature, Some(2.0)), now, &mut sink);

        assert_eq!(sink.series.len(), 1);
        assert_eq!(sink.series[0].1, 2.0);
    }

    #[test]
    fn test_record_enforces_performance_cap() {
        let now = Utc::now();
        let mut sync = ChartSync::new(Metric::Temperature);
        let mut sink = RecordingSink::default();

        for i in 0..(MAX_DISPLAY_POINTS + 25) {
            let ts = now + Duration::seconds(i as i64);
            sync.record(&reading(ts, Metric::Temperature, Some(i as f64)), ts, &mut sink);
        }

        assert_eq!(sink.series.len(), MAX_DISPLAY_POINTS);
        assert_eq!(sink.series[0].1, 25.0);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let now = Utc::now();
        let mut history = HistoryBuffer::new(10);
        for i in 0..4 {
            history.append(
                reading(now + Duration::seconds(i), Metric::Temperature, Some(i as f64)),
                now,
            );
        }

        let mut sync = ChartSync::new(Metric::Temperature);
        let mut sink = RecordingSink::default();
        sync.rebuild(&history, &mut sink);
        let first = sink.series.clone();
        sync.rebuild(&history, &mut sink);

        assert_eq!(first, sink.series);
        assert_eq!(sink.series.len(), 4);
        assert_eq!(sink.set_series_calls, 2);
    }

    #[test]
    fn test_rebuild_skips_entries_without_metric_value() {
        let now = Utc::now();
        let mut history = HistoryBuffer::new(10);
        history.append(reading(now, Metric::Temperature, Some(20.0)), now);
        history.append(reading(now, Metric::Pressure, Some(101325.0)), now);

        let mut sync = ChartSync::new(Metric::Pressure);
        let mut sink = RecordingSink::default();
        sync.rebuild(&history, &mut sink);

        assert_eq!(sink.series.len(), 1);
        assert_eq!(sink.series[0].1, 101325.0);
    }

    #[test]
    fn test_select_metric_restyles_and_rebuilds() {
        let now = Utc::now();
        let mut history = HistoryBuffer::new(10);
        history.append(reading(now, Metric::Iaq, Some(42.0)), now);

        let mut sync = ChartSync::new(Metric::Temperature);
        let mut sink = RecordingSink::default();
        sync.select_metric(Metric::Iaq, &history, &mut sink);

        assert_eq!(
            sink.style,
            Some(("IAQ".to_string(), Metric::Iaq.color().to_string()))
        );
        assert_eq!(sink.series.len(), 1);
        assert_eq!(sync.metric(), Metric::Iaq);
    }

    #[test]
    fn test_clear_empties_series() {
        let now = Utc::now();
        let mut sync = ChartSync::new(Metric::Temperature);
        let mut sink = RecordingSink::default();
        sync.record(&reading(now, Metric::Temperature, Some(1.0)), now, &mut sink);
        sync.clear(&mut sink);
        assert!(sink.series.is_empty());
    }
}
