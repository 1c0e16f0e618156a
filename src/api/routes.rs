use axum::Router;
use axum::routing::{get, post};

use super::AppState;
use super::handlers::{catalog, commands, status};

/// Create the panel router with all endpoints
pub fn create_router(session: AppState) -> Router {
    Router::new()
        // Status and log
        .route("/status", get(status::get_status))
        .route("/status/refresh", post(status::refresh_status))
        .route("/log", get(status::get_log).delete(status::clear_log))
        .route("/log/next", get(status::wait_for_log))
        // Catalog
        .route("/catalog", get(catalog::list_catalog))
        .route("/catalog/{id}/select", post(catalog::select_entry))
        // Mount commands
        .route("/commands/target", post(commands::set_target))
        .route("/commands/tracking", get(commands::read_tracking))
        .route("/commands/tracking/toggle", post(commands::toggle_tracking))
        .route("/commands/home/{action}", post(commands::home))
        .route(
            "/commands/homing-offset",
            get(commands::read_homing_offset).post(commands::set_homing_offset),
        )
        .route("/commands/park", post(commands::park))
        .route("/commands/slew", post(commands::slew))
        .route("/commands/move", post(commands::move_axis))
        .route("/commands/location", post(commands::set_location))
        .route("/commands/datetime", post(commands::set_datetime))
        .route("/commands/position/refresh", post(commands::refresh_position))
        // INDI
        .route("/commands/indi/server", post(commands::indi_server))
        .route(
            "/commands/indi/connection/toggle",
            post(commands::toggle_indi_connection),
        )
        // Guider
        .route("/commands/phd2/{action}", post(commands::phd2))
        // Device configuration
        .route("/devices", get(commands::list_devices))
        .route(
            "/devices/config",
            get(commands::read_device_config).post(commands::save_device_config),
        )
        .with_state(session)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::util::ServiceExt;

    use super::*;
    use crate::catalog::Catalog;
    use crate::remote::MountApi;
    use crate::remote::scripted::{Reply, ScriptedTransport};
    use crate::service::ControlSession;
    use crate::service::session::SessionConfig;

    fn app(transport: &ScriptedTransport) -> (Router, AppState) {
        let session = Arc::new(ControlSession::idle(
            MountApi::new(Arc::new(transport.clone())),
            Catalog::fallback(),
            SessionConfig::default(),
        ));
        (create_router(session.clone()), session)
    }

    async fn send(
        app: Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_status_route() {
        let (app, _) = app(&ScriptedTransport::new());

        let (status, body) = send(app, "GET", "/status", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mount"]["connected"], false);
        assert_eq!(body["phd2"]["state"], "Stopped");
        assert_eq!(body["display_position"]["ra"], "--:--:--");
    }

    #[tokio::test]
    async fn test_refresh_status_route() {
        let (app, session) = app(&ScriptedTransport::new());

        let (status, _) = send(app.clone(), "POST", "/status/refresh", None).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        session.shutdown().await;
        let (status, _) = send(app, "POST", "/status/refresh", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_toggle_tracking_route() {
        let transport = ScriptedTransport::new();
        transport.on("POST", "/api/mount/tracking", Reply::Ok(json!({})));
        let (app, session) = app(&transport);

        let (status, body) = send(app, "POST", "/commands/tracking/toggle", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["reply"]["kind"], "tracking");
        assert_eq!(body["reply"]["value"], true);
        assert_eq!(session.log().len(), 2);
    }

    #[tokio::test]
    async fn test_target_route_validation() {
        let transport = ScriptedTransport::new();
        let (app, _) = app(&transport);

        let (status, body) = send(
            app,
            "POST",
            "/commands/target",
            Some(json!({"ra": "05:35:17"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_failed_command_is_reported_not_raised() {
        let transport = ScriptedTransport::new();
        transport.on(
            "POST",
            "/api/mount/park",
            Reply::api_error(500, "Mount not connected"),
        );
        let (app, session) = app(&transport);

        let (status, body) = send(app, "POST", "/commands/park", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "Mount not connected");
        let last = session.log().snapshot().pop().unwrap();
        assert_eq!(last.text, "Failed to park: Mount not connected");
    }

    #[tokio::test]
    async fn test_home_route() {
        let transport = ScriptedTransport::new();
        transport.on("POST", "/api/mount/home", Reply::Ok(json!({})));
        transport.on("POST", "/api/mount/home/ra", Reply::Ok(json!({})));
        let (app, _) = app(&transport);

        let (status, _) = send(app.clone(), "POST", "/commands/home/both", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(app, "POST", "/commands/home/ra", None).await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(transport.requests_to("/api/mount/home").len(), 1);
        assert_eq!(transport.requests_to("/api/mount/home/ra").len(), 1);
    }

    #[tokio::test]
    async fn test_phd2_route() {
        let transport = ScriptedTransport::new();
        transport.on(
            "GET",
            "/api/guider/phd2/status",
            Reply::Ok(json!({"connected": true, "state": "Guiding"})),
        );
        let (app, session) = app(&transport);

        let (status, body) = send(app, "POST", "/commands/phd2/status", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"]["value"]["state"], "Guiding");
        assert!(session.status_snapshot().await.phd2.connected);
    }

    #[tokio::test]
    async fn test_catalog_routes() {
        let (app, session) = app(&ScriptedTransport::new());

        let (status, body) = send(app.clone(), "GET", "/catalog?q=orion", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["name"], "M42 (Orion Nebula)");
        assert_eq!(body[0]["dec"], "-05:23:14");

        let (status, body) = send(app.clone(), "POST", "/catalog/M13/select", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ra"], "16:41:41");
        assert_eq!(
            session.log().snapshot()[0].text,
            "Selected M13 (Hercules Cluster) as target"
        );

        let (status, _) = send(app, "POST", "/catalog/M999/select", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_clear_log_route() {
        let (app, session) = app(&ScriptedTransport::new());
        session.log().error("Slew failed: timed out");

        let (status, body) = send(app, "DELETE", "/log", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entries"], json!([]));
        assert!(session.log().is_empty());
    }
}
