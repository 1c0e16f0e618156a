use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::coords::{decimal_to_sexagesimal, validate_declination, validate_right_ascension};
use crate::error::ControlError;
use crate::remote::MountApi;
use crate::remote::models::ProcessAction;
use crate::service::commands::{Command, CommandOutcome, CommandReply, TargetRequest};
use crate::service::event_log::EventLog;
use crate::service::state::{Phd2Status, SharedStatus};

/// Commands that flip a flag based on the last known state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToggleKind {
    Tracking,
    IndiConnection,
}

impl fmt::Display for ToggleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToggleKind::Tracking => write!(f, "Tracking"),
            ToggleKind::IndiConnection => write!(f, "INDI connection"),
        }
    }
}

/// Releases a toggle's pending marker when the request settles or is dropped
struct PendingToggle<'a> {
    kind: ToggleKind,
    pending: &'a Mutex<HashSet<ToggleKind>>,
}

impl Drop for PendingToggle<'_> {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.kind);
    }
}

/// Sequences user commands against the device-control service
///
/// Every command publishes an info entry, sends one request, then publishes a
/// success or error entry. Failures never escape as anything other than the
/// returned error and that single log entry.
pub struct CommandDispatcher {
    api: MountApi,
    status: SharedStatus,
    log: Arc<EventLog>,
    pending: Mutex<HashSet<ToggleKind>>,
    refresh: Arc<Notify>,
    cancel: CancellationToken,
}

impl CommandDispatcher {
    pub fn new(
        api: MountApi,
        status: SharedStatus,
        log: Arc<EventLog>,
        refresh: Arc<Notify>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            api,
            status,
            log,
            pending: Mutex::new(HashSet::new()),
            refresh,
            cancel,
        }
    }

    /// Whether a toggle of this kind is still in flight
    pub fn is_pending(&self, kind: ToggleKind) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&kind)
    }

    pub async fn execute(&self, command: Command) -> Result<CommandOutcome, ControlError> {
        tracing::debug!("Executing {:?}", command);
        let intent = command.intent();

        match &command {
            Command::SetTarget(target) => self.set_target(&command, target).await,
            Command::ToggleTracking => self.toggle_tracking(&command).await,
            Command::ToggleIndiConnection => self.toggle_indi_connection(&command).await,
            Command::SetLocation {
                latitude,
                longitude,
            } => self.set_location(&command, *latitude, *longitude).await,
            Command::SetDateTime(now) => {
                let date = now.format("%m/%d/%y").to_string();
                let time = now.format("%H:%M:%S").to_string();
                let response = self
                    .request(&command, intent, self.api.set_datetime(&date, &time))
                    .await?;
                if response.date_set && response.time_set {
                    Ok(self.succeed(None, command.default_success(), CommandReply::Done))
                } else {
                    Err(self.reject("Failed to set date/time on mount"))
                }
            }
            Command::RefreshPosition => self.refresh_position(&command).await,
            Command::ReadTracking => {
                let tracking = self.request(&command, intent, self.api.tracking()).await?;
                self.status.write().await.mount.tracking = tracking;
                let message = format!("Tracking is {}", if tracking { "on" } else { "off" });
                Ok(self.succeed(Some(message), "", CommandReply::Tracking(tracking)))
            }
            Command::Home(action) => {
                let response = self.request(&command, intent, self.api.home(*action)).await?;
                Ok(self.succeed(response.message, command.default_success(), CommandReply::Done))
            }
            Command::ReadHomingOffset => {
                let offset = self
                    .request(&command, intent, self.api.homing_offset())
                    .await?;
                let message = format!(
                    "Homing offset: RA {}, DEC {}",
                    offset.ra_offset, offset.dec_offset
                );
                Ok(self.succeed(Some(message), "", CommandReply::HomingOffset(offset)))
            }
            Command::SetHomingOffset(offset) => {
                let response = self
                    .request(&command, intent, self.api.set_homing_offset(*offset))
                    .await?;
                Ok(self.succeed(response.message, command.default_success(), CommandReply::Done))
            }
            Command::Park => {
                let response = self.request(&command, intent, self.api.park()).await?;
                Ok(self.succeed(response.message, command.default_success(), CommandReply::Done))
            }
            Command::Slew => {
                let response = self.request(&command, intent, self.api.slew()).await?;
                Ok(self.succeed(response.message, command.default_success(), CommandReply::Done))
            }
            Command::Move(direction) => {
                let response = self
                    .request(&command, intent, self.api.move_axis(*direction))
                    .await?;
                Ok(self.succeed(response.message, command.default_success(), CommandReply::Done))
            }
            Command::IndiServer(action) => {
                let response = self
                    .request(&command, intent, self.api.indi_server(*action))
                    .await?;
                self.status.write().await.mount.indi_server_running =
                    *action == ProcessAction::Start;
                Ok(self.succeed(response.message, command.default_success(), CommandReply::Done))
            }
            Command::Phd2Refresh => {
                let result = self.request(&command, intent, self.api.phd2_status()).await;
                let phd2 = {
                    let mut board = self.status.write().await;
                    match result {
                        Ok(response) => {
                            board.phd2.connected = response.connected;
                            board.phd2.state = response.state;
                            board.phd2.clone()
                        }
                        Err(ControlError::Cancelled) => return Err(ControlError::Cancelled),
                        Err(err) => {
                            // Unreachable guider reads as disconnected and stopped
                            board.phd2 = Phd2Status {
                                process_running: board.phd2.process_running,
                                ..Phd2Status::default()
                            };
                            return Err(err);
                        }
                    }
                };
                let message = format!("PHD2 {}", phd2.state);
                Ok(self.succeed(Some(message), "", CommandReply::Phd2(phd2)))
            }
            Command::Phd2Connect => {
                let response = self.request(&command, intent, self.api.phd2_connect()).await?;
                let phd2 = {
                    let mut board = self.status.write().await;
                    board.phd2.connected = response.connected;
                    board.phd2.clone()
                };
                if response.connected {
                    Ok(self.succeed(None, command.default_success(), CommandReply::Phd2(phd2)))
                } else {
                    Err(self.reject("Failed to connect to PHD2: PHD2 is not responding"))
                }
            }
            Command::Phd2StartGuiding => {
                let response = self
                    .request(&command, intent, self.api.phd2_start_guiding())
                    .await?;
                Ok(self.succeed(response.message, command.default_success(), CommandReply::Done))
            }
            Command::Phd2StopGuiding => {
                let response = self
                    .request(&command, intent, self.api.phd2_stop_guiding())
                    .await?;
                Ok(self.succeed(response.message, command.default_success(), CommandReply::Done))
            }
            Command::Phd2ProcessStatus => {
                let result = self
                    .request(&command, intent, self.api.phd2_process_status())
                    .await;
                let running = match result {
                    Ok(response) => response.running,
                    Err(ControlError::Cancelled) => return Err(ControlError::Cancelled),
                    Err(err) => {
                        self.status.write().await.phd2.process_running = false;
                        return Err(err);
                    }
                };
                let phd2 = {
                    let mut board = self.status.write().await;
                    board.phd2.process_running = running;
                    board.phd2.clone()
                };
                let message = format!(
                    "PHD2 process {}",
                    if running { "running" } else { "not running" }
                );
                Ok(self.succeed(Some(message), "", CommandReply::Phd2(phd2)))
            }
            Command::Phd2Process(action) => {
                let response = self
                    .request(&command, intent, self.api.phd2_process(*action))
                    .await?;
                self.status.write().await.phd2.process_running = *action == ProcessAction::Start;
                Ok(self.succeed(response.message, command.default_success(), CommandReply::Done))
            }
            Command::CaptureGuiderImage => {
                let capture = self
                    .request(&command, intent, self.api.capture_guider_image())
                    .await?;
                let message = capture
                    .filename
                    .as_ref()
                    .map(|name| format!("Captured {}", name));
                Ok(self.succeed(message, command.default_success(), CommandReply::Capture(capture)))
            }
            Command::ListDevices => {
                let devices = self.request(&command, intent, self.api.devices()).await?;
                let message = format!("Found {} devices", devices.len());
                Ok(self.succeed(Some(message), "", CommandReply::Devices(devices)))
            }
            Command::ReadDeviceConfig => {
                let response = self.request(&command, intent, self.api.device_config()).await?;
                Ok(self.succeed(
                    response.message,
                    command.default_success(),
                    CommandReply::DeviceConfig(response.config),
                ))
            }
            Command::SaveDeviceConfig(config) => {
                let response = self
                    .request(&command, intent, self.api.save_device_config(config))
                    .await?;
                Ok(self.succeed(
                    response.message,
                    command.default_success(),
                    CommandReply::DeviceConfig(response.config),
                ))
            }
        }
    }

    async fn set_target(
        &self,
        command: &Command,
        target: &TargetRequest,
    ) -> Result<CommandOutcome, ControlError> {
        // The panel keeps submit disabled until both fields are filled
        let Some((ra, dec)) = target.fields() else {
            return Err(ControlError::Validation(
                "target right ascension and declination are required".to_string(),
            ));
        };

        if let Err(err) = validate_right_ascension(ra).and_then(|_| validate_declination(dec)) {
            self.log
                .error(format!("{}: {}", command.error_prefix(), err));
            return Err(err.into());
        }

        let intent = format!("Setting target to RA: {}, DEC: {}", ra, dec);
        let response = self
            .request(command, intent, self.api.set_target(ra, dec))
            .await?;
        Ok(self.succeed(response.message, command.default_success(), CommandReply::Done))
    }

    async fn toggle_tracking(&self, command: &Command) -> Result<CommandOutcome, ControlError> {
        let _pending = self.claim(ToggleKind::Tracking)?;

        let enable = !self.status.read().await.mount.tracking;
        let intent = format!("{} tracking...", if enable { "Enabling" } else { "Disabling" });

        let response = self
            .request(command, intent, self.api.set_tracking(enable))
            .await?;
        self.status.write().await.mount.tracking = enable;

        let default = if enable {
            "Tracking enabled"
        } else {
            "Tracking disabled"
        };
        Ok(self.succeed(response.message, default, CommandReply::Tracking(enable)))
    }

    async fn toggle_indi_connection(
        &self,
        command: &Command,
    ) -> Result<CommandOutcome, ControlError> {
        let _pending = self.claim(ToggleKind::IndiConnection)?;

        let connect = !self.status.read().await.mount.indi_connected;
        let intent = format!(
            "{} INDI server...",
            if connect {
                "Connecting to"
            } else {
                "Disconnecting from"
            }
        );

        let response = self
            .request(command, intent, self.api.indi_connection(connect))
            .await?;
        self.status.write().await.mount.indi_connected = connect;
        self.refresh.notify_one();

        let default = if connect {
            "Connected to INDI server"
        } else {
            "Disconnected from INDI server"
        };
        Ok(self.succeed(response.message, default, CommandReply::IndiConnected(connect)))
    }

    async fn set_location(
        &self,
        command: &Command,
        latitude: f64,
        longitude: f64,
    ) -> Result<CommandOutcome, ControlError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            let err = ControlError::Validation(format!(
                "latitude {} / longitude {} out of range",
                latitude, longitude
            ));
            self.log
                .error(format!("{}: {}", command.error_prefix(), err.detail()));
            return Err(err);
        }

        let latitude = decimal_to_sexagesimal(latitude, true);
        let longitude = decimal_to_sexagesimal(longitude, false);

        let response = self
            .request(
                command,
                command.intent(),
                self.api.set_location(&latitude, &longitude),
            )
            .await?;

        if response.latitude_set && response.longitude_set {
            Ok(self.succeed(None, command.default_success(), CommandReply::Done))
        } else {
            Err(self.reject("Failed to set location on mount"))
        }
    }

    async fn refresh_position(&self, command: &Command) -> Result<CommandOutcome, ControlError> {
        match self
            .request(command, command.intent(), self.api.position())
            .await
        {
            Ok(position) => {
                {
                    let mut board = self.status.write().await;
                    board.mount.position = Some(position.clone());
                    board.mount.connected = true;
                }
                Ok(self.succeed(
                    Some(format!("Position {}", position)),
                    "",
                    CommandReply::Position(position),
                ))
            }
            Err(ControlError::Cancelled) => Err(ControlError::Cancelled),
            Err(err) => {
                let mut board = self.status.write().await;
                board.mount.connected = false;
                board.mount.position = None;
                Err(err)
            }
        }
    }

    /// Publish the intent, send the request, and log the failure if any
    ///
    /// A request cancelled with the session neither logs nor reports anything
    /// beyond `ControlError::Cancelled`.
    async fn request<T, F>(
        &self,
        command: &Command,
        intent: String,
        request: F,
    ) -> Result<T, ControlError>
    where
        F: Future<Output = Result<T, ControlError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(ControlError::Cancelled);
        }

        self.log.info(intent);

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                tracing::debug!("{:?} cancelled with session", command);
                return Err(ControlError::Cancelled);
            }
            result = request => result,
        };

        result.inspect_err(|err| {
            self.log
                .error(format!("{}: {}", command.error_prefix(), err.detail()));
        })
    }

    fn succeed(
        &self,
        server_message: Option<String>,
        default: &str,
        reply: CommandReply,
    ) -> CommandOutcome {
        let message = server_message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default.to_string());
        self.log.success(message.clone());
        CommandOutcome { message, reply }
    }

    /// The mount answered but refused the change
    fn reject(&self, message: &str) -> ControlError {
        self.log.error(message);
        ControlError::Rejected(message.to_string())
    }

    fn claim(&self, kind: ToggleKind) -> Result<PendingToggle<'_>, ControlError> {
        let inserted = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind);

        if !inserted {
            let err = ControlError::Busy(kind);
            self.log.error(err.to_string());
            return Err(err);
        }

        Ok(PendingToggle {
            kind,
            pending: &self.pending,
        })
    }
}
