pub mod commands;
pub mod dispatcher;
pub mod event_log;
pub mod poller;
pub mod session;
pub mod state;

pub use commands::Command;
pub use event_log::MessageKind;
pub use session::ControlSession;
