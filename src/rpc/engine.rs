//! Command engine — validates a request and dispatches it to a handler.
//!
//! **Transport-decoupled**: the engine does not own a socket.  Callers hand
//! it a body and the `content-type` header (or a decoded
//! [`HttpRequest`]) and receive the response body.
//!
//! Every request passes through an ordered gate pipeline; the first
//! failure wins:
//!
//! 1. **Envelope**: body present, `content-type` present and JSON.
//! 2. **Parse**: body is JSON and the top-level value is an object.
//! 3. **Trust gate**: only `get-status` and `get-info` are allowed while
//!    the appliance is unverified.  This runs *before* the verb is
//!    resolved, so an unknown verb from an unverified client is
//!    `forbidden`, not "unknown command".
//! 4. **Verb**: `cmd` must name a known command.

use core::fmt;

use log::{info, warn};
use serde_json::{Value, json};

use crate::app::ports::{Clock, ConfigPort, SampleScheduler, SensorDirectory, UpdatePort};
use crate::session::SessionStore;

use super::codec::HttpRequest;
use super::ota::{self, UpdateTargets};
use super::response::Reply;
use super::{measure, provision};

/// Everything a handler may read or mutate while serving one command.
pub struct CommandContext<'a> {
    /// Trust-gate input: has the appliance passed verification?
    pub verified: bool,
    pub sessions: &'a mut SessionStore,
    pub sensors: &'a mut dyn SensorDirectory,
    pub config: &'a mut dyn ConfigPort,
    pub scheduler: &'a mut dyn SampleScheduler,
    pub updater: &'a mut dyn UpdatePort,
    pub clock: &'a dyn Clock,
}

/// Recognised command verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    GetStatus,
    GetInfo,
    Start,
    Stop,
    GetValues,
    SetPortsSetting,
    Restore,
    Update,
}

impl Command {
    pub const ALL: [Self; 8] = [
        Self::GetStatus,
        Self::GetInfo,
        Self::Start,
        Self::Stop,
        Self::GetValues,
        Self::SetPortsSetting,
        Self::Restore,
        Self::Update,
    ];

    pub fn parse(verb: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.verb() == verb)
    }

    pub fn verb(self) -> &'static str {
        match self {
            Self::GetStatus => "get-status",
            Self::GetInfo => "get-info",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::GetValues => "get-values",
            Self::SetPortsSetting => "set-ports-setting",
            Self::Restore => "restore",
            Self::Update => "update",
        }
    }

    /// Allowed before verification.
    pub fn is_public(self) -> bool {
        matches!(self, Self::GetStatus | Self::GetInfo)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Stateless command router.  All mutable state arrives in the
/// [`CommandContext`].
pub struct CommandEngine {
    version: String,
    targets: UpdateTargets,
}

impl CommandEngine {
    pub fn new(version: impl Into<String>, targets: UpdateTargets) -> Self {
        Self {
            version: version.into(),
            targets,
        }
    }

    /// Serve a decoded HTTP request and return the response body.
    pub fn process(&self, request: &HttpRequest, ctx: &mut CommandContext<'_>) -> String {
        self.handle(request.body(), request.header("content-type"), ctx)
            .to_body()
    }

    /// Run the gate pipeline and the matching handler.
    pub fn handle(
        &self,
        body: &str,
        content_type: Option<&str>,
        ctx: &mut CommandContext<'_>,
    ) -> Reply {
        if body.is_empty() {
            return Reply::client_error("Request is empty.");
        }

        let Some(content_type) = content_type else {
            return Reply::client_error("'Content-Type' header not found.");
        };
        if !content_type.contains("application/json") {
            return Reply::client_error("'Content-Type' must contain 'application/json'.");
        }

        let json: Value = match serde_json::from_str(body) {
            Ok(v) => v,
            Err(e) => {
                warn!("RPC: parse error: {}", e);
                return Reply::server_error("Parse error.");
            }
        };

        let Value::Object(request) = json else {
            return Reply::client_error("Request must be object.");
        };

        let verb = request.get("cmd").and_then(Value::as_str);
        let command = verb.and_then(Command::parse);

        if !ctx.verified && !command.is_some_and(Command::is_public) {
            warn!("RPC: '{}' rejected, verification failed", verb.unwrap_or("<none>"));
            return Reply::forbidden("verification failed.");
        }

        let Some(command) = command else {
            warn!("RPC: unknown command '{}'", verb.unwrap_or("<none>"));
            return Reply::client_error("Unknown command.");
        };

        // An explicit `"params": null` is treated the same as no params.
        let params = request.get("params").filter(|p| !p.is_null());

        info!("RPC: {}", command);
        self.dispatch(command, params, ctx)
    }

    fn dispatch(
        &self,
        command: Command,
        params: Option<&Value>,
        ctx: &mut CommandContext<'_>,
    ) -> Reply {
        match command {
            Command::GetStatus => {
                Reply::ok().with_data(json!({ "verification": verification(ctx.verified) }))
            }
            Command::GetInfo => Reply::ok().with_data(json!({
                "version": self.version,
                "verification": verification(ctx.verified),
            })),
            Command::Start => measure::start(params, ctx),
            Command::Stop => measure::stop(params, ctx),
            Command::GetValues => measure::get_values(params, ctx),
            Command::SetPortsSetting => provision::set_ports_setting(params, ctx),
            Command::Restore => ota::restore(ctx),
            Command::Update => ota::update(params, &self.targets, ctx.updater),
        }
    }
}

fn verification(verified: bool) -> &'static str {
    if verified { "done" } else { "fail" }
}
