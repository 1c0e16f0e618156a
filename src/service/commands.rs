use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coords::Coordinate;
use crate::remote::models::{CaptureResponse, Direction, HomeAction, HomingOffset, ProcessAction};
use crate::service::state::Phd2Status;

/// User-authored target pending submission
///
/// A blank field counts as absent. Submitting moves the request into the
/// dispatcher, so it cannot change afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRequest {
    #[serde(default)]
    pub ra: Option<String>,
    #[serde(default)]
    pub dec: Option<String>,
}

impl TargetRequest {
    pub fn new(ra: impl Into<String>, dec: impl Into<String>) -> Self {
        Self {
            ra: Some(ra.into()),
            dec: Some(dec.into()),
        }
    }

    /// Both fields, trimmed, when present and non-blank
    pub fn fields(&self) -> Option<(&str, &str)> {
        let ra = self.ra.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let dec = self.dec.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some((ra, dec))
    }
}

impl From<Coordinate> for TargetRequest {
    fn from(coord: Coordinate) -> Self {
        Self::new(coord.ra, coord.dec)
    }
}

/// A user-triggered device command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetTarget(TargetRequest),
    ToggleTracking,
    ReadTracking,
    Home(HomeAction),
    ReadHomingOffset,
    SetHomingOffset(HomingOffset),
    Park,
    Slew,
    Move(Direction),
    /// Site position in decimal degrees
    SetLocation { latitude: f64, longitude: f64 },
    /// Local wall-clock time for the mount
    SetDateTime(NaiveDateTime),
    IndiServer(ProcessAction),
    ToggleIndiConnection,
    RefreshPosition,
    Phd2Refresh,
    Phd2Connect,
    Phd2StartGuiding,
    Phd2StopGuiding,
    Phd2ProcessStatus,
    Phd2Process(ProcessAction),
    CaptureGuiderImage,
    ListDevices,
    ReadDeviceConfig,
    SaveDeviceConfig(Value),
}

impl Command {
    /// Info entry published before the request is sent
    ///
    /// Toggles and target submission build theirs from live state instead.
    pub fn intent(&self) -> String {
        match self {
            Command::SetTarget(_) => "Setting target...".to_string(),
            Command::ToggleTracking => "Changing tracking...".to_string(),
            Command::ReadTracking => "Reading tracking state...".to_string(),
            Command::Home(HomeAction::Ra) => "Homing RA axis...".to_string(),
            Command::Home(HomeAction::Dec) => "Homing DEC axis...".to_string(),
            Command::Home(HomeAction::Set) => "Setting current position as home...".to_string(),
            Command::Home(HomeAction::Goto) => "Moving to home position...".to_string(),
            Command::Home(HomeAction::Both) => "Homing both axes...".to_string(),
            Command::ReadHomingOffset => "Reading homing offset...".to_string(),
            Command::SetHomingOffset(offset) => format!(
                "Setting homing offset: RA {}, DEC {}",
                offset.ra_offset, offset.dec_offset
            ),
            Command::Park => "Parking mount...".to_string(),
            Command::Slew => "Slewing to target...".to_string(),
            Command::Move(direction) => format!("Manual move: {}", direction),
            Command::SetLocation { .. } => "Setting mount location...".to_string(),
            Command::SetDateTime(_) => "Setting mount time...".to_string(),
            Command::IndiServer(ProcessAction::Start) => "Starting INDI server...".to_string(),
            Command::IndiServer(ProcessAction::Stop) => "Stopping INDI server...".to_string(),
            Command::ToggleIndiConnection => "Changing INDI connection...".to_string(),
            Command::RefreshPosition => "Reading mount position...".to_string(),
            Command::Phd2Refresh => "Checking PHD2 status...".to_string(),
            Command::Phd2Connect => "Connecting to PHD2...".to_string(),
            Command::Phd2StartGuiding => "Starting guiding...".to_string(),
            Command::Phd2StopGuiding => "Stopping guiding...".to_string(),
            Command::Phd2ProcessStatus => "Checking PHD2 process...".to_string(),
            Command::Phd2Process(ProcessAction::Start) => "Starting PHD2 process...".to_string(),
            Command::Phd2Process(ProcessAction::Stop) => "Stopping PHD2 process...".to_string(),
            Command::CaptureGuiderImage => "Capturing guider image...".to_string(),
            Command::ListDevices => "Listing devices...".to_string(),
            Command::ReadDeviceConfig => "Loading device configuration...".to_string(),
            Command::SaveDeviceConfig(_) => "Saving device configuration...".to_string(),
        }
    }

    /// Prefix of the error entry published on failure
    pub fn error_prefix(&self) -> &'static str {
        match self {
            Command::SetTarget(_) => "Failed to set target",
            Command::ToggleTracking => "Failed to change tracking",
            Command::ReadTracking => "Failed to read tracking",
            Command::Home(HomeAction::Ra) => "RA home failed",
            Command::Home(HomeAction::Dec) => "DEC home failed",
            Command::Home(HomeAction::Set) => "Failed to set home",
            Command::Home(HomeAction::Goto) => "Failed to go to home",
            Command::Home(HomeAction::Both) => "Home failed",
            Command::ReadHomingOffset => "Failed to read homing offset",
            Command::SetHomingOffset(_) => "Failed to set homing offset",
            Command::Park => "Failed to park",
            Command::Slew => "Slew failed",
            Command::Move(_) => "Manual move failed",
            Command::SetLocation { .. } => "Failed to set location",
            Command::SetDateTime(_) => "Failed to set time",
            Command::IndiServer(ProcessAction::Start) => "Failed to start INDI server",
            Command::IndiServer(ProcessAction::Stop) => "Failed to stop INDI server",
            Command::ToggleIndiConnection => "INDI connection failed",
            Command::RefreshPosition => "Failed to get position",
            Command::Phd2Refresh => "Failed to read PHD2 status",
            Command::Phd2Connect => "Failed to connect to PHD2",
            Command::Phd2StartGuiding => "Failed to start guiding",
            Command::Phd2StopGuiding => "Failed to stop guiding",
            Command::Phd2ProcessStatus => "Failed to check PHD2 process",
            Command::Phd2Process(ProcessAction::Start) => "Failed to start PHD2 process",
            Command::Phd2Process(ProcessAction::Stop) => "Failed to stop PHD2 process",
            Command::CaptureGuiderImage => "Failed to capture image",
            Command::ListDevices => "Failed to list devices",
            Command::ReadDeviceConfig => "Failed to load configuration",
            Command::SaveDeviceConfig(_) => "Failed to save configuration",
        }
    }

    /// Success text used when the server sends no message of its own
    pub fn default_success(&self) -> &'static str {
        match self {
            Command::SetTarget(_) => "Target set successfully",
            Command::ToggleTracking => "Tracking changed",
            Command::ReadTracking => "Tracking state read",
            Command::Home(HomeAction::Ra) => "RA home completed",
            Command::Home(HomeAction::Dec) => "DEC home completed",
            Command::Home(HomeAction::Set) => "Home position set",
            Command::Home(HomeAction::Goto) => "Moving to home position",
            Command::Home(HomeAction::Both) => "Homing both axes",
            Command::ReadHomingOffset => "Homing offset read",
            Command::SetHomingOffset(_) => "Homing offset set successfully",
            Command::Park => "Mount parked",
            Command::Slew => "Slewing to target",
            Command::Move(_) => "Move command sent",
            Command::SetLocation { .. } => "Location set successfully on mount",
            Command::SetDateTime(_) => "Time set successfully on mount",
            Command::IndiServer(ProcessAction::Start) => "INDI server started",
            Command::IndiServer(ProcessAction::Stop) => "INDI server stopped",
            Command::ToggleIndiConnection => "INDI connection changed",
            Command::RefreshPosition => "Position updated",
            Command::Phd2Refresh => "PHD2 status updated",
            Command::Phd2Connect => "Connected to PHD2",
            Command::Phd2StartGuiding => "Guiding started",
            Command::Phd2StopGuiding => "Guiding stopped",
            Command::Phd2ProcessStatus => "PHD2 process status updated",
            Command::Phd2Process(ProcessAction::Start) => "PHD2 process started",
            Command::Phd2Process(ProcessAction::Stop) => "PHD2 process stopped",
            Command::CaptureGuiderImage => "Guider image captured",
            Command::ListDevices => "Devices listed",
            Command::ReadDeviceConfig => "Device configuration loaded",
            Command::SaveDeviceConfig(_) => "Device configuration saved",
        }
    }
}

/// Payload produced by a successful command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CommandReply {
    Done,
    Tracking(bool),
    IndiConnected(bool),
    Position(Coordinate),
    HomingOffset(HomingOffset),
    Phd2(Phd2Status),
    Capture(CaptureResponse),
    Devices(Vec<Value>),
    DeviceConfig(Value),
}

/// Result of a successful command: the logged message plus its payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandOutcome {
    pub message: String,
    pub reply: CommandReply,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_fields_require_both() {
        assert!(TargetRequest::default().fields().is_none());

        let partial = TargetRequest {
            ra: Some("05:35:17".to_string()),
            dec: None,
        };
        assert!(partial.fields().is_none());

        let blank = TargetRequest::new("05:35:17", "   ");
        assert!(blank.fields().is_none());

        let full = TargetRequest::new(" 05:35:17 ", "-05:23:14");
        assert_eq!(full.fields(), Some(("05:35:17", "-05:23:14")));
    }

    #[test]
    fn test_target_from_coordinate() {
        let target = TargetRequest::from(Coordinate::new("00:42:44", "+41:16:09"));
        assert_eq!(target, TargetRequest::new("00:42:44", "+41:16:09"));
    }

    #[test]
    fn test_texts() {
        assert_eq!(Command::Home(HomeAction::Ra).intent(), "Homing RA axis...");
        assert_eq!(Command::Slew.error_prefix(), "Slew failed");
        assert_eq!(Command::Move(Direction::North).intent(), "Manual move: north");
        assert_eq!(Command::Home(HomeAction::Dec).default_success(), "DEC home completed");
    }

    #[test]
    fn test_reply_serialization() {
        let json = serde_json::to_value(CommandReply::Tracking(true)).unwrap();
        assert_eq!(json["kind"], "tracking");
        assert_eq!(json["value"], true);

        let json = serde_json::to_value(CommandReply::Done).unwrap();
        assert_eq!(json["kind"], "done");
    }
}
