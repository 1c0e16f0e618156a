use serde::{Deserialize, Serialize};

use crate::catalog::CatalogEntry;
use crate::coords::Coordinate;
use crate::remote::models::{Direction, ProcessAction};
use crate::service::commands::{Command, CommandReply};
use crate::service::event_log::LogMessage;
use crate::service::state::StatusBoard;

// ============= Status Endpoints =============

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub board: StatusBoard,
    /// Mount position for display, `--:--:--` when unknown
    pub display_position: Coordinate,
    pub tracking_pending: bool,
    pub indi_connection_pending: bool,
}

#[derive(Debug, Serialize)]
pub struct LogResponse {
    /// Pass back as `since` to wait for the next change
    pub revision: u64,
    pub entries: Vec<LogMessage>,
}

impl LogResponse {
    pub fn new((revision, entries): (u64, Vec<LogMessage>)) -> Self {
        Self { revision, entries }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LogWaitQuery {
    /// Revision the client already holds
    pub since: Option<u64>,
}

// ============= Catalog Endpoints =============

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub object_type: String,
    pub constellation: Option<String>,
    pub magnitude: Option<f64>,
    pub ra: String,
    pub dec: String,
}

impl From<&CatalogEntry> for CatalogItem {
    fn from(entry: &CatalogEntry) -> Self {
        let target = entry.target();
        Self {
            id: entry.id.clone(),
            name: entry.display_name(),
            object_type: entry.object_type.clone(),
            constellation: entry.constellation.clone(),
            magnitude: entry.magnitude,
            ra: target.ra,
            dec: target.dec,
        }
    }
}

// ============= Command Endpoints =============

#[derive(Debug, Deserialize)]
pub struct MoveBody {
    pub direction: Direction,
}

#[derive(Debug, Deserialize)]
pub struct LocationBody {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
pub struct ProcessBody {
    pub action: ProcessAction,
}

/// PHD2 operation named in the request path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phd2Action {
    Status,
    Connect,
    StartGuiding,
    StopGuiding,
    ProcessStatus,
    ProcessStart,
    ProcessStop,
    Capture,
}

impl From<Phd2Action> for Command {
    fn from(action: Phd2Action) -> Self {
        match action {
            Phd2Action::Status => Command::Phd2Refresh,
            Phd2Action::Connect => Command::Phd2Connect,
            Phd2Action::StartGuiding => Command::Phd2StartGuiding,
            Phd2Action::StopGuiding => Command::Phd2StopGuiding,
            Phd2Action::ProcessStatus => Command::Phd2ProcessStatus,
            Phd2Action::ProcessStart => Command::Phd2Process(ProcessAction::Start),
            Phd2Action::ProcessStop => Command::Phd2Process(ProcessAction::Stop),
            Phd2Action::Capture => Command::CaptureGuiderImage,
        }
    }
}

/// Answer to every command endpoint; failures are already in the log
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<CommandReply>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============= Error Response =============

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
