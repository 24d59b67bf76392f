// Main entry point - Dependency injection and client startup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use std::time::Duration;

use crate::application::retry::RetryPolicy;
use crate::application::session::DashboardSession;
use crate::domain::reading::Metric;
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::manager::ConnectionManager;
use crate::infrastructure::serial::{SerialConfig, SerialConfigClient};
use crate::infrastructure::transport::HttpFeed;
use crate::presentation::commands;
use crate::presentation::display::{ConsoleView, LogSink};
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = load_dashboard_config()?;
    tracing::info!(
        websocket = %cfg.endpoints.websocket_url,
        fallback = %cfg.endpoints.sensor_url,
        "starting environmental monitor dashboard"
    );

    let serial = SerialConfigClient::new(cfg.endpoints.serial_url.clone());

    // Optionally push a serial-link configuration to the backend first.
    // A rejection is an operator problem, not a startup failure.
    if !cfg.serial.port.is_empty() {
        let request = SerialConfig {
            port: cfg.serial.port.clone(),
            baud: cfg.serial.baud,
            timeout: cfg.serial.timeout_secs,
        };
        match serial.apply(&request).await {
            Ok(()) => {
                tracing::info!(port = %request.port, baud = request.baud, "serial link configured")
            }
            Err(err) => tracing::warn!(%err, "failed to apply serial config, continuing"),
        }
    }

    let metric = Metric::from_key(&cfg.chart.metric).unwrap_or(Metric::Temperature);
    let mut session = DashboardSession::new(LogSink::default(), cfg.buffer.max_samples, metric);
    session.set_window(cfg.buffer.window_secs);
    session.select_metric(metric);

    let feed = Arc::new(HttpFeed::new(cfg.endpoints.sensor_url.clone()));
    let manager = ConnectionManager::new(
        cfg.endpoints.websocket_url.clone(),
        Duration::from_millis(cfg.endpoints.update_interval_ms),
        RetryPolicy::default(),
        feed,
        serial,
        session,
    );

    // Operator commands arrive on stdin, one per line.
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match commands::parse(&line) {
                Ok(Some(cmd)) => {
                    if cmd_tx.send(cmd).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(err) => tracing::warn!("{err}"),
            }
        }
    });

    let mut view = ConsoleView::default();
    manager.run(cmd_rx, move |session| view.render(session)).await;

    Ok(())
}
