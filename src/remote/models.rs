use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============= Shared =============

/// Body of a non-2xx response
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
}

/// Generic acknowledgement carrying an optional human-readable message
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Start/stop action for a server-side process (INDI server, PHD2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProcessAction {
    Start,
    Stop,
}

impl fmt::Display for ProcessAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessAction::Start => write!(f, "start"),
            ProcessAction::Stop => write!(f, "stop"),
        }
    }
}

// ============= Mount Endpoints =============

#[derive(Debug, Deserialize)]
pub struct TrackingResponse {
    pub tracking: bool,
}

#[derive(Debug, Serialize)]
pub struct TrackingRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct TargetPayload<'a> {
    pub ra: &'a str,
    pub dec: &'a str,
}

/// Homing routine to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HomeAction {
    /// Find home on the RA axis via its Hall sensor
    Ra,
    /// Find home on the DEC axis via its Hall sensor
    Dec,
    /// Store the current position as home
    Set,
    /// Slew back to the stored home position
    Goto,
    /// Find home on both axes
    Both,
}

impl HomeAction {
    pub fn path(&self) -> &'static str {
        match self {
            HomeAction::Ra => "/api/mount/home/ra",
            HomeAction::Dec => "/api/mount/home/dec",
            HomeAction::Set => "/api/mount/home/set",
            HomeAction::Goto => "/api/mount/home/goto",
            HomeAction::Both => "/api/mount/home",
        }
    }
}

/// Per-axis homing correction
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HomingOffset {
    pub ra_offset: f64,
    pub dec_offset: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomingOffsetRequest {
    pub ra_offset: f64,
    pub dec_offset: f64,
}

impl From<HomingOffset> for HomingOffsetRequest {
    fn from(offset: HomingOffset) -> Self {
        Self {
            ra_offset: offset.ra_offset,
            dec_offset: offset.dec_offset,
        }
    }
}

/// Manual slew direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Serialize)]
pub struct MoveRequest {
    pub direction: Direction,
}

#[derive(Debug, Serialize)]
pub struct LocationRequest<'a> {
    pub latitude: &'a str,
    pub longitude: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct LocationResponse {
    #[serde(default)]
    pub latitude_set: bool,
    #[serde(default)]
    pub longitude_set: bool,
}

#[derive(Debug, Serialize)]
pub struct DateTimeRequest<'a> {
    pub date: &'a str,
    pub time: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct DateTimeResponse {
    #[serde(default)]
    pub date_set: bool,
    #[serde(default)]
    pub time_set: bool,
}

#[derive(Debug, Serialize)]
pub struct IndiServerRequest {
    pub action: ProcessAction,
}

#[derive(Debug, Serialize)]
pub struct IndiConnectionRequest {
    pub connect: bool,
}

// ============= Guider Endpoints =============

#[derive(Debug, Clone, Deserialize)]
pub struct Phd2StatusResponse {
    pub connected: bool,
    #[serde(default = "default_phd2_state")]
    pub state: String,
}

pub fn default_phd2_state() -> String {
    "Stopped".to_string()
}

#[derive(Debug, Deserialize)]
pub struct Phd2ConnectResponse {
    pub connected: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProcessStatusResponse {
    pub running: bool,
}

#[derive(Debug, Serialize)]
pub struct ProcessControlRequest {
    pub action: ProcessAction,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureResponse {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default, skip_serializing)]
    pub image: Option<String>,
}

// ============= Device Configuration =============

#[derive(Debug, Deserialize)]
pub struct DevicesResponse {
    #[serde(default)]
    pub devices: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct DeviceConfigResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub config: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_homing_offset_request_is_camel_case() {
        let request = HomingOffsetRequest::from(HomingOffset {
            ra_offset: 1.5,
            dec_offset: -2.0,
        });
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["raOffset"], 1.5);
        assert_eq!(json["decOffset"], -2.0);
    }

    #[test]
    fn test_home_action_paths() {
        assert_eq!(HomeAction::Ra.path(), "/api/mount/home/ra");
        assert_eq!(HomeAction::Both.path(), "/api/mount/home");
    }

    #[test]
    fn test_message_response_tolerates_missing_message() {
        let response: MessageResponse = serde_json::from_str("{}").unwrap();
        assert!(response.message.is_none());
    }

    #[test]
    fn test_phd2_status_defaults_state() {
        let status: Phd2StatusResponse = serde_json::from_str(r#"{"connected": true}"#).unwrap();
        assert_eq!(status.state, "Stopped");
    }

    #[test]
    fn test_actions_serialize_lowercase() {
        let json = serde_json::to_string(&IndiServerRequest {
            action: ProcessAction::Start,
        })
        .unwrap();
        assert_eq!(json, r#"{"action":"start"}"#);

        let json = serde_json::to_string(&MoveRequest {
            direction: Direction::West,
        })
        .unwrap();
        assert_eq!(json, r#"{"direction":"west"}"#);
    }
}
