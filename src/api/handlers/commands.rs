use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::Value;

use crate::api::AppState;
use crate::api::models::*;
use crate::error::ControlError;
use crate::remote::models::{HomeAction, HomingOffset};
use crate::service::commands::{Command, CommandOutcome, TargetRequest};

type CommandResult = (StatusCode, Json<CommandResponse>);

/// Map a dispatcher result to the panel's response
fn respond(result: Result<CommandOutcome, ControlError>) -> CommandResult {
    match result {
        Ok(outcome) => (
            StatusCode::OK,
            Json(CommandResponse {
                ok: true,
                message: Some(outcome.message),
                reply: Some(outcome.reply),
                error: None,
            }),
        ),
        Err(err) => {
            let status = match err {
                ControlError::Validation(_) | ControlError::Coordinate(_) => {
                    StatusCode::BAD_REQUEST
                }
                ControlError::Busy(_) => StatusCode::CONFLICT,
                _ => StatusCode::OK,
            };
            (
                status,
                Json(CommandResponse {
                    ok: false,
                    message: None,
                    reply: None,
                    error: Some(err.detail()),
                }),
            )
        }
    }
}

async fn run(session: &AppState, command: Command) -> CommandResult {
    respond(session.execute(command).await)
}

/// POST /commands/target - Set the mount's target coordinates
pub async fn set_target(
    State(session): State<AppState>,
    Json(target): Json<TargetRequest>,
) -> CommandResult {
    run(&session, Command::SetTarget(target)).await
}

/// GET /commands/tracking - Read the tracking state
pub async fn read_tracking(State(session): State<AppState>) -> CommandResult {
    run(&session, Command::ReadTracking).await
}

/// POST /commands/tracking/toggle - Flip tracking from its last known state
pub async fn toggle_tracking(State(session): State<AppState>) -> CommandResult {
    run(&session, Command::ToggleTracking).await
}

/// POST /commands/home/{action}
pub async fn home(
    State(session): State<AppState>,
    Path(action): Path<HomeAction>,
) -> CommandResult {
    run(&session, Command::Home(action)).await
}

pub async fn read_homing_offset(State(session): State<AppState>) -> CommandResult {
    run(&session, Command::ReadHomingOffset).await
}

pub async fn set_homing_offset(
    State(session): State<AppState>,
    Json(offset): Json<HomingOffset>,
) -> CommandResult {
    run(&session, Command::SetHomingOffset(offset)).await
}

pub async fn park(State(session): State<AppState>) -> CommandResult {
    run(&session, Command::Park).await
}

pub async fn slew(State(session): State<AppState>) -> CommandResult {
    run(&session, Command::Slew).await
}

pub async fn move_axis(
    State(session): State<AppState>,
    Json(body): Json<MoveBody>,
) -> CommandResult {
    run(&session, Command::Move(body.direction)).await
}

/// POST /commands/location - Site position in decimal degrees
pub async fn set_location(
    State(session): State<AppState>,
    Json(body): Json<LocationBody>,
) -> CommandResult {
    let command = Command::SetLocation {
        latitude: body.latitude,
        longitude: body.longitude,
    };
    run(&session, command).await
}

/// POST /commands/datetime - Send this host's local time to the mount
pub async fn set_datetime(State(session): State<AppState>) -> CommandResult {
    let now = chrono::Local::now().naive_local();
    run(&session, Command::SetDateTime(now)).await
}

pub async fn indi_server(
    State(session): State<AppState>,
    Json(body): Json<ProcessBody>,
) -> CommandResult {
    run(&session, Command::IndiServer(body.action)).await
}

pub async fn toggle_indi_connection(State(session): State<AppState>) -> CommandResult {
    run(&session, Command::ToggleIndiConnection).await
}

pub async fn refresh_position(State(session): State<AppState>) -> CommandResult {
    run(&session, Command::RefreshPosition).await
}

/// POST /commands/phd2/{action}
pub async fn phd2(
    State(session): State<AppState>,
    Path(action): Path<Phd2Action>,
) -> CommandResult {
    run(&session, Command::from(action)).await
}

/// GET /devices - Devices known to the device-control service
pub async fn list_devices(State(session): State<AppState>) -> CommandResult {
    run(&session, Command::ListDevices).await
}

pub async fn read_device_config(State(session): State<AppState>) -> CommandResult {
    run(&session, Command::ReadDeviceConfig).await
}

pub async fn save_device_config(
    State(session): State<AppState>,
    Json(config): Json<Value>,
) -> CommandResult {
    run(&session, Command::SaveDeviceConfig(config)).await
}
