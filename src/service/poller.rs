use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::ControlError;
use crate::remote::MountApi;
use crate::remote::client::decode_section;
use crate::service::event_log::EventLog;
use crate::service::state::{DeviceStatus, MountStatus, SharedStatus};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How device status is read each cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollMode {
    /// One request per device class, issued concurrently
    #[default]
    PerDevice,
    /// A single aggregate request, decoded section by section
    Aggregate,
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    pub mode: PollMode,
    /// Publish an error entry when the mount drops its connection
    pub log_transitions: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            mode: PollMode::default(),
            log_transitions: false,
        }
    }
}

/// Outcome of one poll, each device independent of the others
struct PollUpdate {
    mount: Result<MountStatus, String>,
    camera: Result<DeviceStatus, String>,
    guider: Result<DeviceStatus, String>,
}

fn reason<T>(result: Result<T, ControlError>) -> Result<T, String> {
    result.map_err(|err| err.detail())
}

/// Background reader keeping the status board current
#[derive(Clone)]
pub struct StatusPoller {
    api: MountApi,
    status: SharedStatus,
    log: Arc<EventLog>,
    refresh: Arc<Notify>,
    config: PollerConfig,
}

impl StatusPoller {
    pub fn new(
        api: MountApi,
        status: SharedStatus,
        log: Arc<EventLog>,
        refresh: Arc<Notify>,
        config: PollerConfig,
    ) -> Self {
        Self {
            api,
            status,
            log,
            refresh,
            config,
        }
    }

    /// Ask the running loop for an immediate poll; repeated requests coalesce
    pub fn request_refresh(&self) {
        self.refresh.notify_one();
    }

    /// Poll eagerly, then on every tick or refresh request until cancelled
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            "Status poller started ({:?} every {:?}) against {}",
            self.config.mode,
            self.config.interval,
            self.api.endpoint()
        );

        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
                _ = self.refresh.notified() => {
                    tracing::debug!("Immediate status poll requested");
                }
            }

            // A poll still in flight at cancellation never reaches the board
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = self.poll_once() => {}
            }
        }

        tracing::info!("Status poller stopped");
    }

    /// Read every device once and apply the results to the board
    pub async fn poll_once(&self) {
        let update = match self.config.mode {
            PollMode::PerDevice => self.read_per_device().await,
            PollMode::Aggregate => self.read_aggregate().await,
        };
        self.apply(update).await;
    }

    async fn read_per_device(&self) -> PollUpdate {
        let (mount, camera, guider) = tokio::join!(
            self.api.mount_status(),
            self.api.camera_status(),
            self.api.guider_status()
        );

        PollUpdate {
            mount: reason(mount),
            camera: reason(camera),
            guider: reason(guider),
        }
    }

    async fn read_aggregate(&self) -> PollUpdate {
        match self.api.aggregate_status().await {
            Ok(value) => PollUpdate {
                mount: reason(decode_section(&value, "mount")),
                camera: reason(decode_section(&value, "camera")),
                guider: reason(decode_section(&value, "guider")),
            },
            Err(err) => {
                let detail = err.detail();
                PollUpdate {
                    mount: Err(detail.clone()),
                    camera: Err(detail.clone()),
                    guider: Err(detail),
                }
            }
        }
    }

    async fn apply(&self, update: PollUpdate) {
        let mut board = self.status.write().await;
        let was_connected = board.mount.connected;

        let mount_failure = update.mount.as_ref().err().cloned();
        board.mount = update.mount.unwrap_or_else(|err| {
            tracing::debug!("Mount status unavailable: {}", err);
            MountStatus::default()
        });
        board.camera = update.camera.unwrap_or_else(|err| {
            tracing::debug!("Camera status unavailable: {}", err);
            DeviceStatus::default()
        });
        board.guider = update.guider.unwrap_or_else(|err| {
            tracing::debug!("Guider status unavailable: {}", err);
            DeviceStatus::default()
        });
        board.last_poll = Some(Utc::now());

        let lost = was_connected && !board.mount.connected;
        let any_connected = board.any_connected();
        drop(board);

        tracing::trace!(any_connected, "Status poll applied");

        if lost {
            let text = match mount_failure {
                Some(detail) => format!("Mount disconnected: {}", detail),
                None => "Mount disconnected".to_string(),
            };
            tracing::warn!("{}", text);
            if self.config.log_transitions {
                self.log.error(text);
            }
        }
    }
}
