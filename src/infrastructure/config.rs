use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default)]
    pub endpoints: EndpointSettings,
    #[serde(default)]
    pub buffer: BufferSettings,
    #[serde(default)]
    pub chart: ChartSettings,
    #[serde(default)]
    pub serial: SerialSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EndpointSettings {
    #[serde(default = "default_websocket_url")]
    pub websocket_url: String,
    #[serde(default = "default_sensor_url")]
    pub sensor_url: String,
    #[serde(default = "default_serial_url")]
    pub serial_url: String,
    /// Poll interval for the HTTP fallback transport.
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BufferSettings {
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
    /// Rolling retention window in seconds; 0 keeps everything up to the cap.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartSettings {
    #[serde(default = "default_metric")]
    pub metric: String,
}

/// Optional serial link to push to the backend at startup. Left disabled
/// when no port is configured.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SerialSettings {
    #[serde(default)]
    pub port: String,
    #[serde(default = "default_baud")]
    pub baud: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
}

fn default_websocket_url() -> String {
    "ws://localhost:8000/ws".to_string()
}

fn default_sensor_url() -> String {
    "http://localhost:8000/sensor-data".to_string()
}

fn default_serial_url() -> String {
    "http://localhost:8000/serial-config".to_string()
}

fn default_update_interval_ms() -> u64 {
    1000
}

fn default_max_samples() -> usize {
    crate::application::history::MAX_SAMPLES
}

fn default_window_secs() -> u64 {
    600
}

fn default_metric() -> String {
    "temperature".to_string()
}

fn default_baud() -> u32 {
    9600
}

fn default_timeout_secs() -> f64 {
    2.0
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            websocket_url: default_websocket_url(),
            sensor_url: default_sensor_url(),
            serial_url: default_serial_url(),
            update_interval_ms: default_update_interval_ms(),
        }
    }
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            max_samples: default_max_samples(),
            window_secs: default_window_secs(),
        }
    }
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            metric: default_metric(),
        }
    }
}

pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(config::Environment::with_prefix("ENVMON").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
