// Reading normalizer - validates raw readings and backfills gaps
use crate::domain::connection::ConnectionState;
use crate::domain::reading::{
    parse_timestamp, AirQuality, Metric, MetricSlot, NormalizedReading, RawMessage,
};
use chrono::{DateTime, Utc};

/// Per-metric memory of the most recent value judged valid.
///
/// Written only by [`Normalizer::normalize`]; never cleared.
#[derive(Debug, Clone, Default)]
pub struct LastKnownGood {
    values: [Option<f64>; Metric::ALL.len()],
}

impl LastKnownGood {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values[metric.idx()]
    }

    fn set(&mut self, metric: Metric, value: f64) {
        self.values[metric.idx()] = Some(value);
    }
}

/// Running session extremes for temperature, independent of the history
/// buffer. Sentinels: +infinity / -infinity until the first sample.
#[derive(Debug, Clone)]
pub struct TempExtremes {
    pub min: f64,
    pub max: f64,
}

impl Default for TempExtremes {
    fn default() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl TempExtremes {
    fn observe(&mut self, value: f64) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn has_samples(&self) -> bool {
        self.min.is_finite()
    }
}

/// Validates one raw reading at a time, substituting last-known-good values
/// for invalid slots and flagging the substitution as stale.
///
/// Acceptance policy per metric:
/// - temperature: any finite number, any sign
/// - altitude: any finite number, any sign
/// - iaq: finite, non-negative, and the message state is not warming up;
///   accepted values are truncated to whole index points
/// - pressure, tvoc, eco2, ethanol: finite and non-negative
#[derive(Debug, Default)]
pub struct Normalizer {
    last_valid: LastKnownGood,
    temp_extremes: TempExtremes,
}

impl Normalizer {
    pub fn normalize(
        &mut self,
        msg: &RawMessage,
        state: ConnectionState,
        received_at: DateTime<Utc>,
    ) -> NormalizedReading {
        let timestamp = parse_timestamp(msg.timestamp.as_deref(), received_at);
        let mut slots = [MetricSlot::default(); Metric::ALL.len()];

        for metric in Metric::ALL {
            slots[metric.idx()] = match msg.metric(metric) {
                // Absent field: keep showing whatever we had, no staleness
                // signal either way.
                None => MetricSlot {
                    value: self.last_valid.get(metric),
                    stale: false,
                },
                Some(raw) => {
                    if Self::accepts(metric, raw, state) {
                        let value = if metric == Metric::Iaq { raw.trunc() } else { raw };
                        self.last_valid.set(metric, value);
                        if metric == Metric::Temperature {
                            self.temp_extremes.observe(value);
                        }
                        MetricSlot {
                            value: Some(value),
                            stale: false,
                        }
                    } else {
                        let previous = self.last_valid.get(metric);
                        MetricSlot {
                            value: previous,
                            stale: previous.is_some(),
                        }
                    }
                }
            };
        }

        NormalizedReading::new(timestamp, slots)
    }

    fn accepts(metric: Metric, value: f64, state: ConnectionState) -> bool {
        if !value.is_finite() {
            return false;
        }
        match metric {
            Metric::Temperature | Metric::Altitude => true,
            Metric::Iaq => value >= 0.0 && state != ConnectionState::WarmingUp,
            Metric::Pressure | Metric::Tvoc | Metric::Eco2 | Metric::Ethanol => value >= 0.0,
        }
    }

    /// Air quality band for the retained IAQ value, never the rejected one.
    pub fn air_quality(&self) -> AirQuality {
        AirQuality::from_iaq(self.last_valid.get(Metric::Iaq))
    }

    #[cfg(test)]
    pub fn last_valid(&self, metric: Metric) -> Option<f64> {
        self.last_valid.get(metric)
    }

    pub fn temp_extremes(&self) -> &TempExtremes {
        &self.temp_extremes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(json: &str) -> RawMessage {
        serde_json::from_str(json).unwrap()
    }

    fn normalize(normalizer: &mut Normalizer, json: &str) -> NormalizedReading {
        let msg = msg(json);
        let state = ConnectionState::from_message(msg.state.as_deref());
        normalizer.normalize(&msg, state, Utc::now())
    }

    #[test]
    fn test_temperature_accepts_any_sign_and_tracks_extremes() {
        let mut n = Normalizer::default();
        normalize(&mut n, r#"{"temperature": -12.5}"#);
        let reading = normalize(&mut n, r#"{"temperature": 23.0}"#);

        assert_eq!(reading.value(Metric::Temperature), Some(23.0));
        assert!(!reading.is_stale(Metric::Temperature));
        assert_eq!(n.temp_extremes().min, -12.5);
        assert_eq!(n.temp_extremes().max, 23.0);
    }

    #[test]
    fn test_negative_value_backfills_and_marks_stale() {
        let mut n = Normalizer::default();
        normalize(&mut n, r#"{"tvoc": 120.0}"#);
        let reading = normalize(&mut n, r#"{"tvoc": -3.0}"#);

        assert_eq!(reading.value(Metric::Tvoc), Some(120.0));
        assert!(reading.is_stale(Metric::Tvoc));
        // last known good untouched by the rejected value
        assert_eq!(n.last_valid(Metric::Tvoc), Some(120.0));
    }

    #[test]
    fn test_non_numeric_value_backfills_and_marks_stale() {
        let mut n = Normalizer::default();
        normalize(&mut n, r#"{"eco2": 400.0}"#);
        let reading = normalize(&mut n, r#"{"eco2": "garbage"}"#);

        assert_eq!(reading.value(Metric::Eco2), Some(400.0));
        assert!(reading.is_stale(Metric::Eco2));
    }

    #[test]
    fn test_invalid_value_with_no_history_stays_empty() {
        let mut n = Normalizer::default();
        let reading = normalize(&mut n, r#"{"ethanol": -1.0}"#);

        assert_eq!(reading.value(Metric::Ethanol), None);
        assert!(!reading.is_stale(Metric::Ethanol));
    }

    #[test]
    fn test_absent_field_keeps_previous_without_staleness() {
        let mut n = Normalizer::default();
        normalize(&mut n, r#"{"pressure": 101325.0}"#);
        let reading = normalize(&mut n, r#"{"temperature": 20.0}"#);

        assert_eq!(reading.value(Metric::Pressure), Some(101325.0));
        assert!(!reading.is_stale(Metric::Pressure));
    }

    #[test]
    fn test_iaq_rejected_while_warming_up() {
        let mut n = Normalizer::default();
        normalize(&mut n, r#"{"iaq": 40}"#);
        let reading = normalize(&mut n, r#"{"state": "warming_up", "iaq": -5}"#);

        assert_eq!(reading.value(Metric::Iaq), Some(40.0));
        assert!(reading.is_stale(Metric::Iaq));
        // category derives from the retained value, not the rejected one
        assert_eq!(n.air_quality(), AirQuality::Good);
    }

    #[test]
    fn test_valid_iaq_rejected_while_warming_up() {
        let mut n = Normalizer::default();
        normalize(&mut n, r#"{"iaq": 40}"#);
        let reading = normalize(&mut n, r#"{"state": "warming_up", "iaq": 60}"#);

        assert_eq!(reading.value(Metric::Iaq), Some(40.0));
        assert!(reading.is_stale(Metric::Iaq));
        assert_eq!(n.last_valid(Metric::Iaq), Some(40.0));
    }

    #[test]
    fn test_iaq_truncates_to_whole_points() {
        let mut n = Normalizer::default();
        let reading = normalize(&mut n, r#"{"iaq": 51.9}"#);
        assert_eq!(reading.value(Metric::Iaq), Some(51.0));
        assert_eq!(n.air_quality(), AirQuality::Moderate);
    }

    #[test]
    fn test_air_quality_unknown_before_first_valid_iaq() {
        let n = Normalizer::default();
        assert_eq!(n.air_quality(), AirQuality::Unknown);
    }
}
