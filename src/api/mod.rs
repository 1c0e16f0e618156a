pub mod handlers;
pub mod models;
mod routes;

use std::sync::Arc;

use crate::service::ControlSession;

pub use routes::create_router;

/// Router state shared by every handler
pub type AppState = Arc<ControlSession>;
