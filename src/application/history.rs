// History buffer - capacity- and time-window-bounded reading sequence
use crate::domain::reading::{Metric, NormalizedReading};
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;
use thiserror::Error;

/// Hard cap on buffered readings (one hour at 1 Hz).
pub const MAX_SAMPLES: usize = 3600;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExportError {
    #[error("no data to export")]
    Empty,
}

/// Arrival-ordered rolling history of normalized readings.
///
/// Two bounds, both enforced on every append: the hard sample cap, and an
/// optional time window that evicts entries whose timestamp has aged out.
/// Rebuilt from nothing on every process start; nothing is persisted.
#[derive(Debug)]
pub struct HistoryBuffer {
    entries: VecDeque<NormalizedReading>,
    max_samples: usize,
    window_secs: Option<i64>,
}

impl HistoryBuffer {
    pub fn new(max_samples: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_samples.min(MAX_SAMPLES)),
            max_samples,
            window_secs: None,
        }
    }

    /// Set the retention window in seconds; 0 disables time-based eviction.
    pub fn set_window(&mut self, secs: u64) {
        self.window_secs = (secs > 0).then_some(secs as i64);
    }

    pub fn append(&mut self, reading: NormalizedReading, now: DateTime<Utc>) {
        self.entries.push_back(reading);
        while self.entries.len() > self.max_samples {
            self.entries.pop_front();
        }
        if let Some(window) = self.window_secs {
            let cutoff = now - Duration::seconds(window);
            while self.entries.front().is_some_and(|e| e.timestamp < cutoff) {
                self.entries.pop_front();
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recent `n` entries, oldest first.
    pub fn tail(&self, n: usize) -> impl Iterator<Item = &NormalizedReading> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip)
    }

    /// Serialize the whole buffer as CSV text for operator download.
    ///
    /// Columns are the timestamp followed by the metrics in wire order;
    /// never-observed slots render as empty fields.
    pub fn export_csv(&self) -> Result<String, ExportError> {
        if self.is_empty() {
            return Err(ExportError::Empty);
        }

        let mut out = String::from("timestamp");
        for metric in Metric::ALL {
            out.push(',');
            out.push_str(metric.key());
        }
        out.push('\n');

        for entry in &self.entries {
            out.push_str(&entry.timestamp.to_rfc3339());
            for metric in Metric::ALL {
                out.push(',');
                if let Some(value) = entry.value(metric) {
                    out.push_str(&value.to_string());
                }
            }
            out.push('\n');
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reading::MetricSlot;

    fn reading_at(timestamp: DateTime<Utc>, temp: f64) -> NormalizedReading {
        let mut slots = [MetricSlot::default(); Metric::ALL.len()];
        slots[Metric::Temperature.idx()] = MetricSlot {
            value: Some(temp),
            stale: false,
        };
        NormalizedReading::new(timestamp, slots)
    }

    #[test]
    fn test_append_enforces_sample_cap() {
        let now = Utc::now();
        let mut buffer = HistoryBuffer::new(3);
        for i in 0..5 {
            buffer.append(reading_at(now, i as f64), now);
        }
        assert_eq!(buffer.len(), 3);
        // oldest evicted first
        let temps: Vec<f64> = buffer
            .tail(usize::MAX)
            .map(|r| r.value(Metric::Temperature).unwrap())
            .collect();
        assert_eq!(temps, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_append_enforces_time_window() {
        let now = Utc::now();
        let mut buffer = HistoryBuffer::new(100);
        buffer.set_window(60);
        buffer.append(reading_at(now - Duration::seconds(120), 1.0), now);
        buffer.append(reading_at(now - Duration::seconds(90), 2.0), now);
        buffer.append(reading_at(now - Duration::seconds(10), 3.0), now);

        assert_eq!(buffer.len(), 1);
        assert_eq!(
            buffer.tail(1).next().unwrap().value(Metric::Temperature),
            Some(3.0)
        );
    }

    #[test]
    fn test_zero_window_disables_time_eviction() {
        let now = Utc::now();
        let mut buffer = HistoryBuffer::new(100);
        buffer.set_window(60);
        buffer.set_window(0);
        buffer.append(reading_at(now - Duration::seconds(3600), 1.0), now);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_export_empty_buffer_is_an_error() {
        let buffer = HistoryBuffer::new(10);
        assert_eq!(buffer.export_csv(), Err(ExportError::Empty));
    }

    #[test]
    fn test_export_csv_shape() {
        let ts = "2026-08-30T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let mut buffer = HistoryBuffer::new(10);
        buffer.append(reading_at(ts, 21.5), ts);

        let csv = buffer.export_csv().unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "timestamp,temperature,pressure,altitude,iaq,tvoc,eco2,ethanol"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2026-08-30T10:00:00+00:00,21.5,,,,,,"
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_clear_empties_the_buffer() {
        let now = Utc::now();
        let mut buffer = HistoryBuffer::new(10);
        buffer.append(reading_at(now, 21.5), now);
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
