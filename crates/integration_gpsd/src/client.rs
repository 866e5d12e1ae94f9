//! gpsd TCP client
//!
//! One-shot requests open a fresh connection, enable a non-streaming watch,
//! and issue `?POLL;`. The continuous watch enables JSON streaming and
//! forwards TPV fixes over a bounded channel, reconnecting after transport
//! failures until stopped.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, instrument, warn};

use crate::config::GpsdConfig;
use crate::error::GpsdError;
use crate::protocol::{GpsFix, TpvReport};

const WATCH_STREAMING: &str = r#"?WATCH={"enable":true,"json":true};"#;
const WATCH_QUIET: &str = r#"?WATCH={"enable":true,"json":false};"#;
const POLL: &str = "?POLL;";

/// One element of the continuous watch stream
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// A new fix
    Fix(GpsFix),
    /// The stream degraded (lost connection, protocol error); it recovers
    /// on its own
    Degraded(GpsdError),
}

/// Trait for position clients
#[async_trait]
pub trait PositionClient: Send + Sync {
    /// One-shot position request, served from cache within its validity
    async fn current_fix(&self) -> Result<GpsFix, GpsdError>;

    /// Start the continuous watch stream
    async fn start_watch(&self) -> Result<mpsc::Receiver<WatchEvent>, GpsdError>;

    /// Stop the continuous watch stream; idempotent
    async fn stop_watch(&self);
}

/// gpsd-backed position client
#[derive(Debug)]
pub struct GpsdClient {
    config: GpsdConfig,
    cached_fix: Mutex<Option<(GpsFix, Instant)>>,
    watch_task: Mutex<Option<JoinHandle<()>>>,
}

impl GpsdClient {
    /// Create a new client; no connection is opened until first use
    #[must_use]
    pub fn new(config: GpsdConfig) -> Self {
        Self {
            config,
            cached_fix: Mutex::new(None),
            watch_task: Mutex::new(None),
        }
    }

    async fn connect(
        config: &GpsdConfig,
    ) -> Result<(Lines<BufReader<OwnedReadHalf>>, OwnedWriteHalf), GpsdError> {
        let stream = timeout(
            Duration::from_secs(config.connect_timeout_secs),
            TcpStream::connect(config.address()),
        )
        .await
        .map_err(|_| GpsdError::Timeout {
            timeout_secs: config.connect_timeout_secs,
        })?
        .map_err(|e| GpsdError::from_io(&e))?;

        let (read_half, write_half) = stream.into_split();
        Ok((BufReader::new(read_half).lines(), write_half))
    }

    async fn send_command(writer: &mut OwnedWriteHalf, command: &str) -> Result<(), GpsdError> {
        writer
            .write_all(command.as_bytes())
            .await
            .map_err(|e| GpsdError::from_io(&e))?;
        writer
            .write_all(b"\n")
            .await
            .map_err(|e| GpsdError::from_io(&e))?;
        Ok(())
    }

    /// Open a connection, issue one POLL, and extract the first usable fix
    async fn poll_once(config: &GpsdConfig) -> Result<GpsFix, GpsdError> {
        let (mut lines, mut writer) = Self::connect(config).await?;
        Self::send_command(&mut writer, WATCH_QUIET).await?;
        Self::send_command(&mut writer, POLL).await?;

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| GpsdError::from_io(&e))?
        {
            let message: Value = serde_json::from_str(&line)
                .map_err(|e| GpsdError::Parse(format!("{e}: {line}")))?;
            match message.get("class").and_then(Value::as_str) {
                Some("POLL") => {
                    let reports: Vec<TpvReport> = message
                        .get("tpv")
                        .cloned()
                        .map(serde_json::from_value)
                        .transpose()
                        .map_err(|e| GpsdError::Parse(e.to_string()))?
                        .unwrap_or_default();
                    let report = reports
                        .iter()
                        .find(|report| report.has_fix())
                        .ok_or(GpsdError::NoFix)?;
                    return GpsFix::try_from(report);
                },
                Some("ERROR") => {
                    let detail = message
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown");
                    return Err(GpsdError::Protocol(detail.to_string()));
                },
                // VERSION, DEVICES, WATCH and friends precede the POLL reply
                _ => debug!(%line, "Skipping gpsd message"),
            }
        }
        Err(GpsdError::ConnectionFailed(
            "gpsd closed the connection before answering the poll".to_string(),
        ))
    }

    /// Continuous watch loop: forward fixes, reconnect on failure
    async fn watch_loop(config: GpsdConfig, sender: mpsc::Sender<WatchEvent>) {
        loop {
            match Self::connect(&config).await {
                Ok((mut lines, mut writer)) => {
                    if let Err(err) = Self::send_command(&mut writer, WATCH_STREAMING).await {
                        if sender.send(WatchEvent::Degraded(err)).await.is_err() {
                            return;
                        }
                    } else if Self::forward_reports(&mut lines, &sender).await.is_err() {
                        // Receiver dropped, stop entirely
                        return;
                    }
                },
                Err(err) => {
                    warn!(error = %err, "gpsd watch connection failed");
                    if sender.send(WatchEvent::Degraded(err)).await.is_err() {
                        return;
                    }
                },
            }
            sleep(Duration::from_secs(config.reconnect_delay_secs)).await;
        }
    }

    /// Forward TPV fixes until the connection drops; `Err` means the
    /// receiver went away
    async fn forward_reports(
        lines: &mut Lines<BufReader<OwnedReadHalf>>,
        sender: &mpsc::Sender<WatchEvent>,
    ) -> Result<(), ()> {
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let Ok(message) = serde_json::from_str::<Value>(&line) else {
                        debug!(%line, "Unparseable gpsd message");
                        continue;
                    };
                    match message.get("class").and_then(Value::as_str) {
                        Some("TPV") => {
                            let Ok(report) = serde_json::from_value::<TpvReport>(message.clone())
                            else {
                                continue;
                            };
                            if let Ok(fix) = GpsFix::try_from(&report) {
                                if sender.send(WatchEvent::Fix(fix)).await.is_err() {
                                    return Err(());
                                }
                            } else {
                                debug!("TPV report without a fix");
                            }
                        },
                        Some("ERROR") => {
                            let detail = message
                                .get("message")
                                .and_then(Value::as_str)
                                .unwrap_or("unknown")
                                .to_string();
                            if sender
                                .send(WatchEvent::Degraded(GpsdError::Protocol(detail)))
                                .await
                                .is_err()
                            {
                                return Err(());
                            }
                        },
                        _ => {},
                    }
                },
                Ok(None) => {
                    if sender
                        .send(WatchEvent::Degraded(GpsdError::ConnectionFailed(
                            "gpsd closed the watch connection".to_string(),
                        )))
                        .await
                        .is_err()
                    {
                        return Err(());
                    }
                    return Ok(());
                },
                Err(err) => {
                    if sender
                        .send(WatchEvent::Degraded(GpsdError::from_io(&err)))
                        .await
                        .is_err()
                    {
                        return Err(());
                    }
                    return Ok(());
                },
            }
        }
    }
}

#[async_trait]
impl PositionClient for GpsdClient {
    #[instrument(skip(self))]
    async fn current_fix(&self) -> Result<GpsFix, GpsdError> {
        {
            let cached = self.cached_fix.lock().await;
            if let Some((fix, at)) = cached.as_ref() {
                if at.elapsed() <= Duration::from_secs(self.config.cache_validity_secs) {
                    debug!("Serving cached fix");
                    return Ok(fix.clone());
                }
            }
        }

        let fix = timeout(
            Duration::from_secs(self.config.poll_timeout_secs),
            Self::poll_once(&self.config),
        )
        .await
        .map_err(|_| GpsdError::Timeout {
            timeout_secs: self.config.poll_timeout_secs,
        })??;

        *self.cached_fix.lock().await = Some((fix.clone(), Instant::now()));
        debug!(lat = fix.latitude, lon = fix.longitude, "Fresh fix");
        Ok(fix)
    }

    #[instrument(skip(self))]
    async fn start_watch(&self) -> Result<mpsc::Receiver<WatchEvent>, GpsdError> {
        let mut task_slot = self.watch_task.lock().await;
        if let Some(previous) = task_slot.take() {
            previous.abort();
        }

        let (sender, receiver) = mpsc::channel(32);
        let config = self.config.clone();
        *task_slot = Some(tokio::spawn(Self::watch_loop(config, sender)));
        Ok(receiver)
    }

    async fn stop_watch(&self) {
        if let Some(task) = self.watch_task.lock().await.take() {
            task.abort();
            debug!("gpsd watch stopped");
        }
    }
}
