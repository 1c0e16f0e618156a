use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::RwLock;

use crate::coords::Coordinate;
use crate::remote::models::default_phd2_state;

/// Connection status of a camera or guider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub connected: bool,
    #[serde(default)]
    pub device: Option<String>,
}

/// Mount status as reported by the device-control service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MountStatus {
    pub connected: bool,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default, deserialize_with = "deserialize_position")]
    pub position: Option<Coordinate>,
    #[serde(default)]
    pub tracking: bool,
    #[serde(default)]
    pub indi_connected: bool,
    #[serde(default)]
    pub indi_server_running: bool,
}

/// The mount answers `{"ra": null, "dec": null}` while it cannot read its axes
fn deserialize_position<'de, D>(deserializer: D) -> Result<Option<Coordinate>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct ReportedPosition {
        #[serde(default)]
        ra: Option<String>,
        #[serde(default)]
        dec: Option<String>,
    }

    let reported = Option::<ReportedPosition>::deserialize(deserializer)?;
    Ok(reported.and_then(|p| Some(Coordinate::new(p.ra?, p.dec?))))
}

impl MountStatus {
    /// Position for display, `--:--:--` when unknown
    pub fn display_position(&self) -> Coordinate {
        self.position.clone().unwrap_or_else(Coordinate::unknown)
    }
}

/// PHD2 autoguider link
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Phd2Status {
    pub connected: bool,
    pub state: String,
    pub process_running: bool,
}

impl Default for Phd2Status {
    fn default() -> Self {
        Self {
            connected: false,
            state: default_phd2_state(),
            process_running: false,
        }
    }
}

/// Latest view of every device, read by the panel and the command dispatcher
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusBoard {
    pub mount: MountStatus,
    pub camera: DeviceStatus,
    pub guider: DeviceStatus,
    pub phd2: Phd2Status,
    pub last_poll: Option<DateTime<Utc>>,
}

impl StatusBoard {
    /// Whether any device currently reports a live connection
    pub fn any_connected(&self) -> bool {
        self.mount.connected || self.camera.connected || self.guider.connected
    }
}

/// Thread-safe shared status board
pub type SharedStatus = Arc<RwLock<StatusBoard>>;

/// Create a new shared status board
pub fn create_shared_status() -> SharedStatus {
    Arc::new(RwLock::new(StatusBoard::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_board_default() {
        let board = StatusBoard::default();

        assert!(!board.mount.connected);
        assert!(board.mount.position.is_none());
        assert!(!board.mount.tracking);
        assert_eq!(board.camera, DeviceStatus::default());
        assert!(board.guider.device.is_none());
        assert_eq!(board.phd2.state, "Stopped");
        assert!(board.last_poll.is_none());
        assert!(!board.any_connected());
    }

    #[test]
    fn test_display_position() {
        let mut mount = MountStatus::default();
        assert_eq!(mount.display_position(), Coordinate::unknown());

        mount.position = Some(Coordinate::new("01:00:00", "+02:00:00"));
        assert_eq!(mount.display_position().ra, "01:00:00");
    }

    #[test]
    fn test_mount_status_requires_connected() {
        let result = serde_json::from_str::<MountStatus>(r#"{"tracking": true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_mount_status_null_position() {
        let status: MountStatus =
            serde_json::from_str(r#"{"connected": false, "position": null}"#).unwrap();
        assert!(status.position.is_none());
    }

    #[test]
    fn test_mount_status_unreadable_position() {
        let status: MountStatus = serde_json::from_str(
            r#"{"connected": true, "position": {"ra": null, "dec": null}, "tracking": true}"#,
        )
        .unwrap();
        assert!(status.connected);
        assert!(status.tracking);
        assert!(status.position.is_none());

        let status: MountStatus = serde_json::from_str(
            r#"{"connected": true, "position": {"ra": "05:35:17", "dec": null}}"#,
        )
        .unwrap();
        assert!(status.position.is_none());

        let status: MountStatus = serde_json::from_str(
            r#"{"connected": true, "position": {"ra": "05:35:17", "dec": "-05:23:14"}}"#,
        )
        .unwrap();
        assert_eq!(status.position, Some(Coordinate::new("05:35:17", "-05:23:14")));
    }

    #[tokio::test]
    async fn test_shared_status() {
        let status = create_shared_status();

        {
            let mut s = status.write().await;
            s.guider.connected = true;
        }

        {
            let s = status.read().await;
            assert!(s.guider.connected);
            assert!(s.any_connected());
        }
    }
}
