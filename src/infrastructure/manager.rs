// Connection manager - streaming loop with backoff and polling fallback
use crate::application::chart_sync::ChartSink;
use crate::application::retry::RetryPolicy;
use crate::application::session::{DashboardSession, SessionEvent};
use crate::infrastructure::serial::SerialConfigClient;
use crate::infrastructure::transport::{
    decode_message, request_data_frame, SensorFeed, TransportError,
};
use crate::presentation::commands::OperatorCommand;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::tungstenite::Message;

/// Owns the live transport and drives the session's event pipeline.
///
/// Prefers the streaming transport; after the retry budget is exhausted it
/// degrades permanently to fixed-interval polling. No transport failure is
/// fatal to the process.
pub struct ConnectionManager<S: ChartSink> {
    ws_url: String,
    poll_interval: Duration,
    retry: RetryPolicy,
    feed: Arc<dyn SensorFeed>,
    serial: SerialConfigClient,
    session: DashboardSession<S>,
}

impl<S: ChartSink> ConnectionManager<S> {
    pub fn new(
        ws_url: String,
        poll_interval: Duration,
        retry: RetryPolicy,
        feed: Arc<dyn SensorFeed>,
        serial: SerialConfigClient,
        session: DashboardSession<S>,
    ) -> Self {
        Self {
            ws_url,
            poll_interval,
            retry,
            feed,
            serial,
            session,
        }
    }

    /// Run forever. `on_update` fires after every dispatched event so the
    /// caller can re-render.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<OperatorCommand>,
        mut on_update: impl FnMut(&DashboardSession<S>),
    ) {
        let mut attempt: u32 = 0;
        loop {
            self.session.handle(SessionEvent::StreamConnecting);
            on_update(&self.session);
            match self.stream_once(&mut attempt, &mut commands, &mut on_update).await {
                Ok(()) => {
                    tracing::info!("streaming transport closed");
                    self.session.handle(SessionEvent::StreamClosed);
                }
                Err(err) => {
                    tracing::warn!(%err, "streaming transport failed");
                    self.session.handle(SessionEvent::StreamFailed);
                }
            }
            on_update(&self.session);

            attempt += 1;
            match self.retry.delay(attempt) {
                Some(delay) => {
                    tracing::info!(
                        attempt,
                        max = self.retry.max_attempts,
                        "reconnecting in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                None => break,
            }
        }

        tracing::warn!("max reconnection attempts reached, falling back to HTTP polling");
        self.poll_forever(commands, on_update).await;
    }

    /// One streaming connection lifetime: connect, request a snapshot, pump
    /// frames until the peer closes or errors.
    async fn stream_once(
        &mut self,
        attempt: &mut u32,
        commands: &mut mpsc::UnboundedReceiver<OperatorCommand>,
        on_update: &mut impl FnMut(&DashboardSession<S>),
    ) -> Result<(), TransportError> {
        let (ws, _) = tokio_tungstenite::connect_async(self.ws_url.as_str()).await?;
        let (mut tx, mut rx) = ws.split();

        *attempt = 0;
        self.session.handle(SessionEvent::StreamOpened);
        on_update(&self.session);
        tx.send(Message::Text(request_data_frame())).await?;

        let mut commands_open = true;
        loop {
            tokio::select! {
                frame = rx.next() => {
                    let Some(frame) = frame else { break };
                    match frame? {
                        Message::Text(text) => match decode_message(&text) {
                            Ok(msg) => {
                                self.session.handle(SessionEvent::MessageReceived(msg));
                                on_update(&self.session);
                            }
                            Err(err) => tracing::warn!(%err, "dropping malformed payload"),
                        },
                        Message::Close(_) => break,
                        _ => {}
                    }
                }
                cmd = commands.recv(), if commands_open => {
                    match cmd {
                        Some(cmd) => {
                            self.apply_command(cmd).await;
                            on_update(&self.session);
                        }
                        None => commands_open = false,
                    }
                }
            }
        }
        Ok(())
    }

    /// Fixed-interval polling. A failed request only flips the connectivity
    /// flag; the interval never stops.
    async fn poll_forever(
        mut self,
        mut commands: mpsc::UnboundedReceiver<OperatorCommand>,
        mut on_update: impl FnMut(&DashboardSession<S>),
    ) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut commands_open = true;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.feed.fetch().await {
                        Ok(msg) => self.session.handle(SessionEvent::PollSucceeded(msg)),
                        Err(err) => {
                            tracing::warn!(%err, "poll failed");
                            self.session.handle(SessionEvent::PollFailed);
                        }
                    }
                    on_update(&self.session);
                }
                cmd = commands.recv(), if commands_open => {
                    match cmd {
                        Some(cmd) => {
                            self.apply_command(cmd).await;
                            on_update(&self.session);
                        }
                        None => commands_open = false,
                    }
                }
            }
        }
    }

    async fn apply_command(&mut self, cmd: OperatorCommand) {
        match cmd {
            OperatorCommand::SelectMetric(metric) => {
                self.session.select_metric(metric);
                tracing::info!(metric = self.session.selected_metric().key(), "chart metric selected");
            }
            OperatorCommand::SetWindow(secs) => {
                self.session.set_window(secs);
                tracing::info!(secs, "rolling window updated");
            }
            OperatorCommand::Pause => {
                self.session.pause_chart();
                tracing::info!("chart paused");
            }
            OperatorCommand::Resume => {
                self.session.resume_chart();
                tracing::info!("chart resumed");
            }
            OperatorCommand::Clear => {
                self.session.clear();
                tracing::info!("history and chart cleared");
            }
            OperatorCommand::Export(path) => match self.session.export_csv() {
                Ok(csv) => match tokio::fs::write(&path, csv).await {
                    Ok(()) => tracing::info!(
                        path = %path.display(),
                        rows = self.session.history().len(),
                        "history exported"
                    ),
                    Err(err) => tracing::warn!(%err, "failed to write export file"),
                },
                // operator notice; no file is produced
                Err(err) => tracing::warn!("{err}"),
            },
            OperatorCommand::ShowSerial => match self.serial.fetch().await {
                Ok(cfg) => tracing::info!(
                    port = %cfg.port,
                    baud = cfg.baud,
                    timeout = cfg.timeout,
                    "current serial config"
                ),
                Err(err) => tracing::warn!(%err, "unable to fetch serial config"),
            },
            OperatorCommand::ApplySerial(cfg) => match self.serial.apply(&cfg).await {
                Ok(()) => tracing::info!(port = %cfg.port, baud = cfg.baud, "serial link configured"),
                Err(err) => tracing::warn!(%err, "failed to apply serial config"),
            },
        }
    }
}
