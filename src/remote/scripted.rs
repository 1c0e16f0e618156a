//! In-memory transport with canned replies, for exercising the core without a server

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use super::Transport;
use crate::error::ControlError;

/// Canned reply for one request
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(Value),
    Api(u16, Option<String>),
    Transport(String),
}

impl Reply {
    pub fn api_error(status: u16, message: &str) -> Self {
        Reply::Api(status, Some(message.to_string()))
    }

    fn into_result(self) -> Result<Value, ControlError> {
        match self {
            Reply::Ok(value) => Ok(value),
            Reply::Api(status, message) => Err(ControlError::Api { status, message }),
            Reply::Transport(msg) => Err(ControlError::Transport(msg)),
        }
    }
}

/// A request seen by the transport
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct Script {
    // Queued replies are consumed first, then the sticky reply repeats
    queued: HashMap<(&'static str, String), VecDeque<Reply>>,
    sticky: HashMap<(&'static str, String), Reply>,
    gates: HashMap<(&'static str, String), Arc<Notify>>,
    requests: Vec<Recorded>,
}

#[derive(Default, Clone)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every matching request with `reply`
    pub fn on(&self, method: &'static str, path: &str, reply: Reply) -> &Self {
        let mut script = self.script.lock().unwrap();
        script.sticky.insert((method, path.to_string()), reply);
        self
    }

    /// Answer the next matching request with `reply`
    pub fn once(&self, method: &'static str, path: &str, reply: Reply) -> &Self {
        let mut script = self.script.lock().unwrap();
        script
            .queued
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    /// Hold matching requests until the returned gate is notified
    pub fn gate(&self, method: &'static str, path: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        let mut script = self.script.lock().unwrap();
        script.gates.insert((method, path.to_string()), gate.clone());
        gate
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    async fn handle(
        &self,
        method: &'static str,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ControlError> {
        let key = (method, path.to_string());
        let gate = {
            let mut script = self.script.lock().unwrap();
            script.requests.push(Recorded {
                method,
                path: path.to_string(),
                body,
            });
            script.gates.get(&key).cloned()
        };

        if let Some(gate) = gate {
            gate.notified().await;
        }

        let reply = {
            let mut script = self.script.lock().unwrap();
            let queued = script.queued.get_mut(&key).and_then(|q| q.pop_front());
            queued.or_else(|| script.sticky.get(&key).cloned())
        };

        reply
            .unwrap_or_else(|| Reply::Api(404, Some(format!("No route for {} {}", method, path))))
            .into_result()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, path: &str) -> Result<Value, ControlError> {
        self.handle("GET", path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, ControlError> {
        self.handle("POST", path, Some(body)).await
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
