use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::catalog::{self, Catalog};
use crate::error::ControlError;
use crate::remote::MountApi;
use crate::service::commands::{Command, CommandOutcome, TargetRequest};
use crate::service::dispatcher::CommandDispatcher;
use crate::service::event_log::{DEFAULT_LOG_CAPACITY, EventLog};
use crate::service::poller::{PollerConfig, StatusPoller};
use crate::service::state::{SharedStatus, StatusBoard, create_shared_status};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub poller: PollerConfig,
    pub log_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poller: PollerConfig::default(),
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

/// One operator's view of the observatory
///
/// Owns the status board, event log, dispatcher and the background poller.
/// Everything the session started stops when it is shut down or dropped.
pub struct ControlSession {
    status: SharedStatus,
    log: Arc<EventLog>,
    dispatcher: CommandDispatcher,
    poller: StatusPoller,
    catalog: Catalog,
    cancel: CancellationToken,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl ControlSession {
    /// Build the session and spawn its status poller
    pub fn start(api: MountApi, catalog: Catalog, config: SessionConfig) -> Self {
        let session = Self::idle(api, catalog, config);

        let poller = session.poller.clone();
        let cancel = session.cancel.child_token();
        let handle = tokio::spawn(poller.run(cancel));
        *session
            .poll_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);

        session
    }

    /// Build the session without a background poller, for one-shot use
    pub fn idle(api: MountApi, catalog: Catalog, config: SessionConfig) -> Self {
        let status = create_shared_status();
        let log = Arc::new(EventLog::new(config.log_capacity));
        let refresh = Arc::new(Notify::new());
        let cancel = CancellationToken::new();

        let dispatcher = CommandDispatcher::new(
            api.clone(),
            status.clone(),
            log.clone(),
            refresh.clone(),
            cancel.clone(),
        );
        let poller = StatusPoller::new(api, status.clone(), log.clone(), refresh, config.poller);

        Self {
            status,
            log,
            dispatcher,
            poller,
            catalog,
            cancel,
            poll_task: Mutex::new(None),
        }
    }

    pub fn status(&self) -> &SharedStatus {
        &self.status
    }

    pub async fn status_snapshot(&self) -> StatusBoard {
        self.status().read().await.clone()
    }

    pub fn log(&self) -> &Arc<EventLog> {
        &self.log
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    pub async fn execute(&self, command: Command) -> Result<CommandOutcome, ControlError> {
        self.dispatcher.execute(command).await
    }

    /// Prepare target input from a catalog object
    pub fn select_catalog_entry(&self, id: &str) -> Result<TargetRequest, ControlError> {
        let entry = self
            .catalog
            .get(id)
            .ok_or_else(|| ControlError::Catalog(format!("unknown object {}", id)))?;
        Ok(catalog::select(entry, &self.log))
    }

    /// Poll every device once, outside the background cadence
    pub async fn sync_status(&self) {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {}
            _ = self.poller.poll_once() => {}
        }
    }

    /// Ask the background poller for an early poll
    pub fn refresh_status(&self) {
        self.poller.request_refresh();
    }

    /// Cancel outstanding work and wait for the poller to finish
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        let handle = self
            .poll_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!("Status poller task failed: {}", e);
            }
        }

        tracing::info!("Control session stopped");
    }
}

impl Drop for ControlSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::remote::scripted::{Reply, ScriptedTransport};

    fn scripted() -> ScriptedTransport {
        let transport = ScriptedTransport::new();
        transport.on(
            "GET",
            "/api/mount/status/all",
            Reply::Ok(json!({"mount": {"connected": true, "tracking": true}})),
        );
        transport.on(
            "GET",
            "/api/camera/status",
            Reply::Ok(json!({"connected": false})),
        );
        transport.on(
            "GET",
            "/api/guider/status",
            Reply::Ok(json!({"connected": true, "device": "/dev/video0"})),
        );
        transport
    }

    fn api(transport: &ScriptedTransport) -> MountApi {
        MountApi::new(Arc::new(transport.clone()))
    }

    #[tokio::test]
    async fn test_start_polls_and_shutdown_stops() {
        let transport = scripted();
        let session = ControlSession::start(
            api(&transport),
            Catalog::fallback(),
            SessionConfig::default(),
        );

        for _ in 0..200 {
            if session.status_snapshot().await.last_poll.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let board = session.status_snapshot().await;
        assert!(board.mount.tracking);
        assert!(board.guider.connected);

        tokio::time::timeout(Duration::from_secs(1), session.shutdown())
            .await
            .expect("shutdown should not hang");
        assert!(!session.is_running());

        let err = session.execute(Command::Park).await.unwrap_err();
        assert!(matches!(err, ControlError::Cancelled));
    }

    #[tokio::test]
    async fn test_idle_sync_status() {
        let transport = scripted();
        let session = ControlSession::idle(
            api(&transport),
            Catalog::fallback(),
            SessionConfig::default(),
        );

        assert!(transport.requests().is_empty());
        session.sync_status().await;

        assert_eq!(transport.requests().len(), 3);
        assert!(session.status_snapshot().await.mount.connected);
    }

    #[tokio::test]
    async fn test_select_catalog_entry() {
        let session = ControlSession::idle(
            api(&ScriptedTransport::new()),
            Catalog::fallback(),
            SessionConfig {
                log_capacity: 10,
                ..SessionConfig::default()
            },
        );

        let target = session.select_catalog_entry("m31").unwrap();
        assert_eq!(target, TargetRequest::new("00:42:44", "+41:16:09"));
        assert_eq!(session.log().capacity(), 10);
        assert_eq!(session.log().len(), 1);

        let err = session.select_catalog_entry("M999").unwrap_err();
        assert!(matches!(err, ControlError::Catalog(_)));
    }
}
