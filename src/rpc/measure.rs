//! `start`, `stop`, and `get-values` handlers.
//!
//! `start` validates every field before touching the store and reports all
//! problems at once; a failed `start` leaves any existing session alone.

use std::time::Duration;

use log::{debug, info};
use serde_json::{Map, Value, json};

use crate::app::ports::SensorDirectory;
use crate::session::reconcile::ColumnSelection;
use crate::session::{DEFAULT_SESSION, MeasureSession, SampleCount, SessionColumn, SessionId};

use super::engine::CommandContext;
use super::params::{self, Field};
use super::response::Reply;

/// Sampling interval when `delay` is absent or null.
const DEFAULT_DELAY_SECS: f64 = 1.0;

/// Problems found while validating `start`, reported together.
#[derive(Debug, Default)]
struct Problems(Vec<String>);

impl Problems {
    fn push(&mut self, msg: impl Into<String>) {
        self.0.push(msg.into());
    }

    fn message(&self) -> String {
        self.0.join(" ")
    }
}

pub(crate) fn start(params: Option<&Value>, ctx: &mut CommandContext<'_>) -> Reply {
    let Some(params) = params else {
        return Reply::client_error("Parameters not found.");
    };
    let Some(params) = params.as_object() else {
        return Reply::client_error("Parameters must be JSON object.");
    };

    let mut problems = Problems::default();
    let columns = resolve_columns(params.get("addrs"), &*ctx.sensors, &mut problems);
    let count = parse_count(Field::of(params, "count"), &mut problems);
    let interval = parse_delay(Field::of(params, "delay"), count, &mut problems);

    let (Some(count), Some(interval)) = (count, interval) else {
        return Reply::client_error(problems.message());
    };
    if columns.is_empty() {
        return Reply::client_error(problems.message());
    }

    let now = ctx.clock.now();
    info!(
        "start: session {} with {} sensors, count={}, interval={:?}",
        DEFAULT_SESSION,
        columns.len(),
        count.as_raw(),
        interval
    );
    let session = MeasureSession::new(
        DEFAULT_SESSION,
        count,
        interval,
        now,
        columns,
        ctx.sessions.row_limit(),
    );
    ctx.sessions.replace(session);
    ctx.scheduler.schedule_next(now, DEFAULT_SESSION, 0);

    Reply::ok()
}

/// Resolve requested addresses to session columns, in request order,
/// skipping (and reporting) the unknown ones.
fn resolve_columns(
    node: Option<&Value>,
    sensors: &dyn SensorDirectory,
    problems: &mut Problems,
) -> Vec<SessionColumn> {
    let Some(Value::Array(items)) = node else {
        problems.push("Sensor list must be an array.");
        return Vec::new();
    };
    if items.is_empty() {
        problems.push("Sensor list can't be empty.");
        return Vec::new();
    }

    let mut columns = Vec::with_capacity(items.len());
    for item in items {
        let address = params::scalar_text(Some(item)).unwrap_or_else(|| item.to_string());
        match sensors.by_address(&address) {
            Some(id) => columns.push(SessionColumn::new(address, id)),
            None => problems.push(format!("Sensor '{}' not found.", address)),
        }
    }

    if columns.is_empty() {
        problems.push("Parsed sensor list is empty.");
    }
    columns
}

/// Absent, null, and `0` all mean unbounded.  `None` means invalid.
fn parse_count(field: Field<'_>, problems: &mut Problems) -> Option<SampleCount> {
    match field {
        Field::Missing | Field::Null => Some(SampleCount::Unbounded),
        Field::Number(n) => match params::truncate_i32(n) {
            None => {
                problems.push("Can't parse 'count'.");
                None
            }
            Some(c) if c < 0 => {
                problems.push("Measure count must be positive.");
                None
            }
            Some(0) => Some(SampleCount::Unbounded),
            Some(c) => Some(SampleCount::Finite(c as u32)),
        },
        Field::Other(_) => {
            problems.push("Measure count have invalid format.");
            None
        }
    }
}

/// Delay must be positive; zero is allowed only for a single sample.
fn parse_delay(
    field: Field<'_>,
    count: Option<SampleCount>,
    problems: &mut Problems,
) -> Option<Duration> {
    let secs = match field {
        Field::Missing | Field::Null => DEFAULT_DELAY_SECS,
        Field::Number(d) => d,
        Field::Other(_) => {
            problems.push("Measure delay have invalid format.");
            return None;
        }
    };

    let single_shot = count == Some(SampleCount::Finite(1));
    if secs < 0.0 || (secs == 0.0 && !single_shot) {
        problems.push("Measure delay have invalid value.");
        return None;
    }

    match Duration::try_from_secs_f64(secs) {
        // Sub-nanosecond delays round down to zero.
        Ok(interval) if interval.is_zero() && !single_shot => {
            problems.push("Measure delay have invalid value.");
            None
        }
        Ok(interval) => Some(interval),
        Err(_) => {
            problems.push("Can't parse 'delay'.");
            None
        }
    }
}

pub(crate) fn stop(params: Option<&Value>, ctx: &mut CommandContext<'_>) -> Reply {
    let id = params::session_id_of(params);
    if ctx.sessions.stop(id) {
        info!("stop: session {} stopped", id);
        Reply::ok()
    } else {
        Reply::server_error("No measures found.")
    }
}

pub(crate) fn get_values(params: Option<&Value>, ctx: &mut CommandContext<'_>) -> Reply {
    let (id, requested): (SessionId, Option<&Vec<Value>>) = match params {
        None => (DEFAULT_SESSION, None),
        Some(Value::Array(items)) => (DEFAULT_SESSION, Some(items)),
        Some(Value::Object(obj)) => (params::session_id(obj), requested_addrs(obj)),
        Some(_) => return Reply::client_error("Can't parse parameters."),
    };

    let Some(session) = ctx.sessions.get(id) else {
        return Reply::server_error("No measures found.");
    };

    let requested: Option<Vec<String>> =
        requested.map(|items| items.iter().filter_map(|v| params::scalar_text(Some(v))).collect());
    let selection = ColumnSelection::from_request(
        session.addresses(),
        requested.as_ref().map(|addrs| addrs.iter().map(String::as_str)),
    );

    let addrs: Vec<&str> = selection
        .project(session.columns())
        .map(|c| c.address.as_str())
        .collect();

    let rows = session.results().drain();
    debug!("get-values: session {} drained {} rows", id, rows.len());

    let values: Vec<Value> = rows
        .iter()
        .map(|row| Value::Array(selection.project(row).map(|v| render_value(v)).collect()))
        .collect();

    Reply::ok().with_data(json!({ "addrs": addrs, "values": values }))
}

fn requested_addrs(obj: &Map<String, Value>) -> Option<&Vec<Value>> {
    obj.get("addrs").and_then(Value::as_array)
}

/// Sample values are numeric text; emit them as JSON numbers where possible.
fn render_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(v @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => v,
        _ => Value::String(raw.to_owned()),
    }
}
