// Sensor reading domain models
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// The metrics the backend can report, in wire/export column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Temperature,
    Pressure,
    Altitude,
    Iaq,
    Tvoc,
    Eco2,
    Ethanol,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::Temperature,
        Metric::Pressure,
        Metric::Altitude,
        Metric::Iaq,
        Metric::Tvoc,
        Metric::Eco2,
        Metric::Ethanol,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Pressure => "pressure",
            Metric::Altitude => "altitude",
            Metric::Iaq => "iaq",
            Metric::Tvoc => "tvoc",
            Metric::Eco2 => "eco2",
            Metric::Ethanol => "ethanol",
        }
    }

    pub fn from_key(key: &str) -> Option<Metric> {
        Metric::ALL.into_iter().find(|m| m.key() == key)
    }

    /// Series label shown on the chart for this metric.
    pub const fn label(self) -> &'static str {
        match self {
            Metric::Temperature => "Temperature (°C)",
            Metric::Pressure => "Pressure (Pa)",
            Metric::Altitude => "Altitude (m)",
            Metric::Iaq => "IAQ",
            Metric::Tvoc => "TVOC (ppb)",
            Metric::Eco2 => "eCO2 (ppm)",
            Metric::Ethanol => "Ethanol (ppm)",
        }
    }

    /// Series color for this metric.
    pub const fn color(self) -> &'static str {
        match self {
            Metric::Temperature => "rgba(32, 143, 159, 1)",
            Metric::Pressure => "rgba(52, 152, 219, 1)",
            Metric::Altitude => "rgba(155, 89, 182, 1)",
            Metric::Iaq => "rgba(39, 174, 96, 1)",
            Metric::Tvoc => "rgba(230, 126, 34, 1)",
            Metric::Eco2 => "rgba(231, 76, 60, 1)",
            Metric::Ethanol => "rgba(241, 196, 15, 1)",
        }
    }

    pub(crate) const fn idx(self) -> usize {
        self as usize
    }
}

/// One inbound data message, as sent by the backend over either transport.
///
/// Every field is optional. Metric fields are decoded leniently: a missing
/// field stays `None`, while a present but non-numeric value (string junk,
/// null) decodes to NaN so the normalizer can tell "absent" from "invalid".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pressure: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub altitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub iaq: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub tvoc: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub eco2: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub ethanol: Option<f64>,
}

impl RawMessage {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Pressure => self.pressure,
            Metric::Altitude => self.altitude,
            Metric::Iaq => self.iaq,
            Metric::Tvoc => self.tvoc,
            Metric::Eco2 => self.eco2,
            Metric::Ethanol => self.ethanol,
        }
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }))
}

/// Parse a backend timestamp, falling back to the receipt time.
///
/// The backend sends either RFC 3339 or a space-separated local form.
pub fn parse_timestamp(raw: Option<&str>, received_at: DateTime<Utc>) -> DateTime<Utc> {
    let Some(raw) = raw else {
        return received_at;
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.with_timezone(&Utc);
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return ts.and_utc();
        }
    }
    received_at
}

/// One resolved metric slot: the displayed value plus its staleness marker.
///
/// `value` is `None` only while no valid value has ever been observed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricSlot {
    pub value: Option<f64>,
    pub stale: bool,
}

/// A reading with every metric slot resolved against last known good values.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedReading {
    pub timestamp: DateTime<Utc>,
    slots: [MetricSlot; Metric::ALL.len()],
}

impl NormalizedReading {
    pub fn new(timestamp: DateTime<Utc>, slots: [MetricSlot; Metric::ALL.len()]) -> Self {
        Self { timestamp, slots }
    }

    pub fn slot(&self, metric: Metric) -> MetricSlot {
        self.slots[metric.idx()]
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.slots[metric.idx()].value
    }

    pub fn is_stale(&self, metric: Metric) -> bool {
        self.slots[metric.idx()].stale
    }
}

/// Air quality band derived from the retained IAQ value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirQuality {
    Good,
    Moderate,
    Poor,
    Unknown,
}

impl AirQuality {
    pub fn from_iaq(iaq: Option<f64>) -> Self {
        match iaq {
            Some(v) if v.is_finite() && v <= 50.0 => AirQuality::Good,
            Some(v) if v.is_finite() && v <= 100.0 => AirQuality::Moderate,
            Some(v) if v.is_finite() => AirQuality::Poor,
            _ => AirQuality::Unknown,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            AirQuality::Good => "Good",
            AirQuality::Moderate => "Moderate",
            AirQuality::Poor => "Poor",
            AirQuality::Unknown => "Warming",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_key_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(Metric::from_key(metric.key()), Some(metric));
        }
        assert_eq!(Metric::from_key("humidity"), None);
    }

    #[test]
    fn test_raw_message_lenient_decode() {
        let msg: RawMessage = serde_json::from_str(
            r#"{"temperature": 21.5, "pressure": "101325", "iaq": null, "tvoc": "junk"}"#,
        )
        .unwrap();
        assert_eq!(msg.temperature, Some(21.5));
        assert_eq!(msg.pressure, Some(101325.0));
        assert!(msg.iaq.unwrap().is_nan());
        assert!(msg.tvoc.unwrap().is_nan());
        assert_eq!(msg.eco2, None);
    }

    #[test]
    fn test_raw_message_ignores_unknown_fields() {
        let msg: RawMessage =
            serde_json::from_str(r#"{"state": "streaming", "humidity": 40.0}"#).unwrap();
        assert_eq!(msg.state.as_deref(), Some("streaming"));
        assert_eq!(msg.temperature, None);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let received = Utc::now();
        let parsed = parse_timestamp(Some("2026-08-30T10:15:00Z"), received);
        assert_eq!(parsed.to_rfc3339(), "2026-08-30T10:15:00+00:00");

        let parsed = parse_timestamp(Some("2026-08-30 10:15:00"), received);
        assert_eq!(parsed.to_rfc3339(), "2026-08-30T10:15:00+00:00");

        assert_eq!(parse_timestamp(Some("not a time"), received), received);
        assert_eq!(parse_timestamp(None, received), received);
    }

    #[test]
    fn test_air_quality_bands() {
        assert_eq!(AirQuality::from_iaq(Some(12.0)), AirQuality::Good);
        assert_eq!(AirQuality::from_iaq(Some(50.0)), AirQuality::Good);
        assert_eq!(AirQuality::from_iaq(Some(51.0)), AirQuality::Moderate);
        assert_eq!(AirQuality::from_iaq(Some(100.0)), AirQuality::Moderate);
        assert_eq!(AirQuality::from_iaq(Some(101.0)), AirQuality::Poor);
        assert_eq!(AirQuality::from_iaq(None), AirQuality::Unknown);
        assert_eq!(AirQuality::from_iaq(Some(f64::NAN)), AirQuality::Unknown);
    }
}
