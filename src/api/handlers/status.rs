use std::time::Duration;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;

use crate::api::AppState;
use crate::api::models::*;
use crate::service::dispatcher::ToggleKind;

const LOG_WAIT: Duration = Duration::from_secs(25);

/// GET /status - Latest status board plus toggles still in flight
pub async fn get_status(State(session): State<AppState>) -> Json<StatusResponse> {
    let board = session.status_snapshot().await;
    let dispatcher = session.dispatcher();

    Json(StatusResponse {
        display_position: board.mount.display_position(),
        tracking_pending: dispatcher.is_pending(ToggleKind::Tracking),
        indi_connection_pending: dispatcher.is_pending(ToggleKind::IndiConnection),
        board,
    })
}

/// POST /status/refresh - Wake the poller for an immediate read
pub async fn refresh_status(State(session): State<AppState>) -> StatusCode {
    if !session.is_running() {
        return StatusCode::SERVICE_UNAVAILABLE;
    }

    session.refresh_status();
    StatusCode::ACCEPTED
}

/// GET /log - Every retained log entry, oldest first
pub async fn get_log(State(session): State<AppState>) -> Json<LogResponse> {
    Json(LogResponse::new(session.log().view()))
}

/// GET /log/next?since=N - Every entry once the log moves past revision `N`
///
/// Answers at once when the log already differs from `since` (or no revision
/// is given), otherwise waits up to 25 s for the next change.
pub async fn wait_for_log(
    State(session): State<AppState>,
    Query(query): Query<LogWaitQuery>,
) -> Json<LogResponse> {
    let log = session.log();
    // Subscribe before comparing so a change in between still wakes us
    let mut rx = log.subscribe();

    if query.since == Some(log.revision())
        && tokio::time::timeout(LOG_WAIT, rx.changed()).await.is_err()
    {
        tracing::trace!("No log change within {:?}", LOG_WAIT);
    }

    Json(LogResponse::new(log.view()))
}

/// DELETE /log - Clear the log
pub async fn clear_log(State(session): State<AppState>) -> Json<LogResponse> {
    session.log().clear();
    tracing::debug!("Event log cleared");

    Json(LogResponse::new(session.log().view()))
}
