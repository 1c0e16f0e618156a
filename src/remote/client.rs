use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::models::*;
use super::transport::{HttpTransport, Transport};
use crate::coords::Coordinate;
use crate::error::ControlError;
use crate::service::state::{DeviceStatus, MountStatus};

/// Typed client for the device-control service
#[derive(Clone)]
pub struct MountApi {
    transport: Arc<dyn Transport>,
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ControlError> {
    Ok(serde_json::from_value(value)?)
}

/// Decode one named section of an aggregate status reply
pub fn decode_section<T: DeserializeOwned>(value: &Value, key: &str) -> Result<T, ControlError> {
    let section = value
        .get(key)
        .cloned()
        .ok_or_else(|| ControlError::Decode(format!("missing `{}` section", key)))?;
    decode(section)
}

impl MountApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Client for a device-control service reachable over HTTP
    pub fn http(base_url: &str, timeout: Duration) -> Result<Self, ControlError> {
        Ok(Self::new(Arc::new(HttpTransport::new(base_url, timeout)?)))
    }

    pub fn endpoint(&self) -> &str {
        self.transport.name()
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ControlError> {
        decode(self.transport.get(path).await?)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ControlError> {
        let body = serde_json::to_value(body)?;
        decode(self.transport.post(path, body).await?)
    }

    async fn post_empty(&self, path: &str) -> Result<MessageResponse, ControlError> {
        self.post(path, &serde_json::json!({})).await
    }

    // ============= Status =============

    /// Raw aggregate status (`mount`, `camera`, `guider` sections)
    pub async fn aggregate_status(&self) -> Result<Value, ControlError> {
        self.transport.get("/api/mount/status/all").await
    }

    pub async fn mount_status(&self) -> Result<MountStatus, ControlError> {
        let value = self.aggregate_status().await?;
        decode_section(&value, "mount")
    }

    pub async fn camera_status(&self) -> Result<DeviceStatus, ControlError> {
        self.get("/api/camera/status").await
    }

    pub async fn guider_status(&self) -> Result<DeviceStatus, ControlError> {
        self.get("/api/guider/status").await
    }

    // ============= Mount =============

    pub async fn position(&self) -> Result<Coordinate, ControlError> {
        self.get("/api/mount/position").await
    }

    pub async fn tracking(&self) -> Result<bool, ControlError> {
        let response: TrackingResponse = self.get("/api/mount/tracking").await?;
        Ok(response.tracking)
    }

    pub async fn set_tracking(&self, enabled: bool) -> Result<MessageResponse, ControlError> {
        self.post("/api/mount/tracking", &TrackingRequest { enabled })
            .await
    }

    pub async fn set_target(&self, ra: &str, dec: &str) -> Result<MessageResponse, ControlError> {
        self.post("/api/mount/target", &TargetPayload { ra, dec })
            .await
    }

    pub async fn home(&self, action: HomeAction) -> Result<MessageResponse, ControlError> {
        self.post_empty(action.path()).await
    }

    pub async fn homing_offset(&self) -> Result<HomingOffset, ControlError> {
        self.get("/api/mount/home/offset").await
    }

    pub async fn set_homing_offset(
        &self,
        offset: HomingOffset,
    ) -> Result<MessageResponse, ControlError> {
        self.post(
            "/api/mount/home/offset",
            &HomingOffsetRequest::from(offset),
        )
        .await
    }

    pub async fn park(&self) -> Result<MessageResponse, ControlError> {
        self.post_empty("/api/mount/park").await
    }

    pub async fn slew(&self) -> Result<MessageResponse, ControlError> {
        self.post_empty("/api/mount/slew").await
    }

    pub async fn move_axis(&self, direction: Direction) -> Result<MessageResponse, ControlError> {
        self.post("/api/mount/move", &MoveRequest { direction })
            .await
    }

    /// Send site coordinates already formatted as `±DD:MM:SS` / `DDD:MM:SS`
    pub async fn set_location(
        &self,
        latitude: &str,
        longitude: &str,
    ) -> Result<LocationResponse, ControlError> {
        self.post(
            "/api/mount/location",
            &LocationRequest {
                latitude,
                longitude,
            },
        )
        .await
    }

    /// Send local date (`MM/DD/YY`) and time (`HH:MM:SS`)
    pub async fn set_datetime(
        &self,
        date: &str,
        time: &str,
    ) -> Result<DateTimeResponse, ControlError> {
        self.post("/api/mount/datetime", &DateTimeRequest { date, time })
            .await
    }

    pub async fn indi_server(&self, action: ProcessAction) -> Result<MessageResponse, ControlError> {
        self.post("/api/mount/indi/server", &IndiServerRequest { action })
            .await
    }

    pub async fn indi_connection(&self, connect: bool) -> Result<MessageResponse, ControlError> {
        self.post(
            "/api/mount/indi/connection",
            &IndiConnectionRequest { connect },
        )
        .await
    }

    // ============= Guider / PHD2 =============

    pub async fn phd2_status(&self) -> Result<Phd2StatusResponse, ControlError> {
        self.get("/api/guider/phd2/status").await
    }

    pub async fn phd2_connect(&self) -> Result<Phd2ConnectResponse, ControlError> {
        self.post("/api/guider/phd2/connect", &serde_json::json!({}))
            .await
    }

    pub async fn phd2_start_guiding(&self) -> Result<MessageResponse, ControlError> {
        self.post_empty("/api/guider/phd2/start_guiding").await
    }

    pub async fn phd2_stop_guiding(&self) -> Result<MessageResponse, ControlError> {
        self.post_empty("/api/guider/phd2/stop_guiding").await
    }

    pub async fn phd2_process_status(&self) -> Result<ProcessStatusResponse, ControlError> {
        self.get("/api/guider/phd2/process/status").await
    }

    pub async fn phd2_process(&self, action: ProcessAction) -> Result<MessageResponse, ControlError> {
        self.post(
            "/api/guider/phd2/process/control",
            &ProcessControlRequest { action },
        )
        .await
    }

    pub async fn capture_guider_image(&self) -> Result<CaptureResponse, ControlError> {
        self.get("/api/guider/capture").await
    }

    // ============= Devices =============

    pub async fn devices(&self) -> Result<Vec<Value>, ControlError> {
        let response: DevicesResponse = self.get("/api/devices").await?;
        Ok(response.devices)
    }

    pub async fn device_config(&self) -> Result<DeviceConfigResponse, ControlError> {
        self.get("/api/config/device").await
    }

    pub async fn save_device_config(
        &self,
        config: &Value,
    ) -> Result<DeviceConfigResponse, ControlError> {
        self.post("/api/config/device", config).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::remote::scripted::{Reply, ScriptedTransport};

    fn api(transport: &ScriptedTransport) -> MountApi {
        MountApi::new(Arc::new(transport.clone()))
    }

    #[tokio::test]
    async fn test_set_tracking_body() {
        let transport = ScriptedTransport::new();
        transport.on(
            "POST",
            "/api/mount/tracking",
            Reply::Ok(json!({"message": "Tracking enabled"})),
        );

        let response = api(&transport).set_tracking(true).await.unwrap();

        assert_eq!(response.message.as_deref(), Some("Tracking enabled"));
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body, Some(json!({"enabled": true})));
    }

    #[tokio::test]
    async fn test_mount_status_from_aggregate() {
        let transport = ScriptedTransport::new();
        transport.on(
            "GET",
            "/api/mount/status/all",
            Reply::Ok(json!({
                "mount": {
                    "connected": true,
                    "position": {"ra": "10:00:00", "dec": "+20:00:00"},
                    "tracking": true,
                    "indi_connected": false,
                    "indi_server_running": true
                },
                "camera": {"connected": false, "device": null},
                "guider": {"connected": true, "device": "/dev/video0"}
            })),
        );

        let status = api(&transport).mount_status().await.unwrap();

        assert!(status.connected);
        assert!(status.tracking);
        assert!(status.indi_server_running);
        assert_eq!(status.position, Some(Coordinate::new("10:00:00", "+20:00:00")));
    }

    #[tokio::test]
    async fn test_missing_section_is_decode_error() {
        let transport = ScriptedTransport::new();
        transport.on("GET", "/api/mount/status/all", Reply::Ok(json!({"camera": {}})));

        let err = api(&transport).mount_status().await.unwrap_err();
        assert!(matches!(err, ControlError::Decode(_)));
    }

    #[tokio::test]
    async fn test_homing_offset_round_trip_wire_names() {
        let transport = ScriptedTransport::new();
        transport.on(
            "GET",
            "/api/mount/home/offset",
            Reply::Ok(json!({"ra_offset": 12.0, "dec_offset": -3.5})),
        );
        transport.on("POST", "/api/mount/home/offset", Reply::Ok(json!({})));

        let client = api(&transport);
        let offset = client.homing_offset().await.unwrap();
        assert_eq!(offset.dec_offset, -3.5);

        client.set_homing_offset(offset).await.unwrap();
        let posted = transport.requests_to("/api/mount/home/offset");
        assert_eq!(
            posted[1].body,
            Some(json!({"raOffset": 12.0, "decOffset": -3.5}))
        );
    }

    #[tokio::test]
    async fn test_devices_list() {
        let transport = ScriptedTransport::new();
        transport.on(
            "GET",
            "/api/devices",
            Reply::Ok(json!({"devices": [{"device": "/dev/ttyUSB0", "type": "serial"}]})),
        );

        let devices = api(&transport).devices().await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0]["type"], "serial");
    }
}
