use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use clap::{Args, Parser, Subcommand};

use crate::error::ControlError;
use crate::remote::models::{Direction, HomeAction, HomingOffset, ProcessAction};
use crate::service::commands::{Command, TargetRequest};
use crate::service::poller::{PollMode, PollerConfig};
use crate::service::session::SessionConfig;

#[derive(Parser, Debug)]
#[command(name = "oat-control")]
#[command(about = "OpenAstroTracker mount control and status core")]
#[command(version)]
pub struct Cli {
    /// Base URL of the device-control service
    #[arg(long, env = "OAT_API_URL", default_value = "http://localhost:5000")]
    pub api_url: String,

    /// Seconds between status polls
    #[arg(long, default_value = "5")]
    pub poll_interval: u64,

    /// How device status is read each poll
    #[arg(long, value_enum, default_value = "per-device")]
    pub poll_mode: PollModeArg,

    /// Add an error log entry when the mount drops its connection
    #[arg(long)]
    pub log_disconnects: bool,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value = "5000")]
    pub timeout_ms: u64,

    /// Number of log entries kept
    #[arg(long, default_value = "500")]
    pub log_capacity: usize,

    /// Messier catalog JSON (built-in objects are used when missing)
    #[arg(long, env = "OAT_CATALOG")]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub mode: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Mode {
    /// Serve the control panel API
    Serve(ServeArgs),

    /// Poll every device once and print the status board
    Status,

    /// List catalog objects
    Catalog(CatalogArgs),

    /// Send one command to the mount and print the log
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// HTTP server port
    #[arg(short, long, default_value = "8100")]
    pub listen: u16,

    /// HTTP server host
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
}

#[derive(Args, Debug, Clone)]
pub struct CatalogArgs {
    /// Match on name, type or constellation
    pub query: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(subcommand)]
    pub command: CommandArgs,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CommandArgs {
    /// Set target coordinates (RA HH:MM:SS, DEC ±DD:MM:SS)
    Target {
        ra: String,
        #[arg(allow_hyphen_values = true)]
        dec: String,
    },
    /// Set the target from a catalog object
    Select { id: String },
    /// Read the tracking state
    Tracking,
    /// Flip tracking from its last known state
    ToggleTracking,
    /// Run a homing routine
    Home {
        #[arg(value_enum)]
        action: HomeAction,
    },
    /// Read the homing offset
    HomingOffset,
    /// Set the homing offset
    SetHomingOffset {
        #[arg(allow_hyphen_values = true)]
        ra: f64,
        #[arg(allow_hyphen_values = true)]
        dec: f64,
    },
    Park,
    Slew,
    /// Manual slew
    Move {
        #[arg(value_enum)]
        direction: Direction,
    },
    /// Site position in decimal degrees
    Location {
        #[arg(allow_hyphen_values = true)]
        latitude: f64,
        #[arg(allow_hyphen_values = true)]
        longitude: f64,
    },
    /// Send this host's local time
    Datetime,
    /// Start or stop the INDI server
    IndiServer {
        #[arg(value_enum)]
        action: ProcessAction,
    },
    /// Flip the INDI connection from its last known state
    ToggleIndi,
    /// Read the mount position
    Position,
    /// PHD2 guiding
    Phd2 {
        #[arg(value_enum)]
        action: Phd2Arg,
    },
    /// Capture a guider frame
    Capture,
    /// List devices known to the device-control service
    Devices,
    /// Read the device configuration
    Config,
    /// Save a device configuration from a JSON file
    SaveConfig { file: PathBuf },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PollModeArg {
    /// One request per device, issued concurrently (default)
    #[default]
    PerDevice,
    /// One aggregate status request
    Aggregate,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phd2Arg {
    Status,
    Connect,
    StartGuiding,
    StopGuiding,
    ProcessStatus,
    ProcessStart,
    ProcessStop,
}

impl Cli {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Convert CLI args to PollerConfig
    pub fn to_poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_secs(self.poll_interval.max(1)),
            mode: match self.poll_mode {
                PollModeArg::PerDevice => PollMode::PerDevice,
                PollModeArg::Aggregate => PollMode::Aggregate,
            },
            log_transitions: self.log_disconnects,
        }
    }

    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            poller: self.to_poller_config(),
            log_capacity: self.log_capacity,
        }
    }
}

impl CommandArgs {
    /// Convert to a dispatcher command
    ///
    /// `Select` has no direct command; it resolves through the catalog first.
    pub fn to_command(&self) -> Result<Option<Command>, ControlError> {
        let command = match self {
            CommandArgs::Target { ra, dec } => Command::SetTarget(TargetRequest::new(ra, dec)),
            CommandArgs::Select { .. } => return Ok(None),
            CommandArgs::Tracking => Command::ReadTracking,
            CommandArgs::ToggleTracking => Command::ToggleTracking,
            CommandArgs::Home { action } => Command::Home(*action),
            CommandArgs::HomingOffset => Command::ReadHomingOffset,
            CommandArgs::SetHomingOffset { ra, dec } => Command::SetHomingOffset(HomingOffset {
                ra_offset: *ra,
                dec_offset: *dec,
            }),
            CommandArgs::Park => Command::Park,
            CommandArgs::Slew => Command::Slew,
            CommandArgs::Move { direction } => Command::Move(*direction),
            CommandArgs::Location {
                latitude,
                longitude,
            } => Command::SetLocation {
                latitude: *latitude,
                longitude: *longitude,
            },
            CommandArgs::Datetime => Command::SetDateTime(Local::now().naive_local()),
            CommandArgs::IndiServer { action } => Command::IndiServer(*action),
            CommandArgs::ToggleIndi => Command::ToggleIndiConnection,
            CommandArgs::Position => Command::RefreshPosition,
            CommandArgs::Phd2 { action } => match action {
                Phd2Arg::Status => Command::Phd2Refresh,
                Phd2Arg::Connect => Command::Phd2Connect,
                Phd2Arg::StartGuiding => Command::Phd2StartGuiding,
                Phd2Arg::StopGuiding => Command::Phd2StopGuiding,
                Phd2Arg::ProcessStatus => Command::Phd2ProcessStatus,
                Phd2Arg::ProcessStart => Command::Phd2Process(ProcessAction::Start),
                Phd2Arg::ProcessStop => Command::Phd2Process(ProcessAction::Stop),
            },
            CommandArgs::Capture => Command::CaptureGuiderImage,
            CommandArgs::Devices => Command::ListDevices,
            CommandArgs::Config => Command::ReadDeviceConfig,
            CommandArgs::SaveConfig { file } => {
                let contents = std::fs::read_to_string(file)?;
                let config = serde_json::from_str(&contents).map_err(|e| {
                    ControlError::Config(format!("{}: {}", file.display(), e))
                })?;
                Command::SaveDeviceConfig(config)
            }
        };

        Ok(Some(command))
    }
}
