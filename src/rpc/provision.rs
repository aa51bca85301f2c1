//! `set-ports-setting` — bulk sensor provisioning.
//!
//! The registry is reset and rebuilt from the descriptor list.  Malformed
//! descriptors are skipped silently; the command still succeeds as long as
//! the list itself was well-formed.

use log::{debug, info, warn};
use serde_json::Value;

use crate::sensors::SensorSpec;

use super::engine::CommandContext;
use super::params;
use super::response::Reply;

pub(crate) fn set_ports_setting(params: Option<&Value>, ctx: &mut CommandContext<'_>) -> Reply {
    let descriptors = match params {
        None => None,
        Some(Value::Array(items)) => Some(items),
        Some(Value::Object(obj)) => match obj.get("addrs") {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => Some(items),
            Some(_) => return Reply::client_error("Sensors must be array."),
        },
        Some(_) => return Reply::client_error("Parameters have invalid format."),
    };

    let Some(descriptors) = descriptors.filter(|d| !d.is_empty()) else {
        return Reply::server_error("Sensors not found.");
    };

    ctx.sensors.reset();
    let mut accepted = 0usize;
    for descriptor in descriptors {
        match sensor_spec(descriptor) {
            Some(spec) => {
                ctx.sensors.create_or_update(spec);
                accepted += 1;
            }
            None => debug!("set-ports-setting: skipped descriptor {}", descriptor),
        }
    }
    info!(
        "set-ports-setting: {} of {} descriptors accepted",
        accepted,
        descriptors.len()
    );

    if let Err(e) = ctx.config.save(&ctx.sensors.records()) {
        warn!("set-ports-setting: config save failed: {}", e);
    }

    Reply::ok()
}

/// Build a `SensorSpec` from one descriptor.  `None` for non-objects and for a
/// missing, compound, or empty `addr`.
fn sensor_spec(descriptor: &Value) -> Option<SensorSpec> {
    let obj = descriptor.as_object()?;
    let address = params::scalar_text(obj.get("addr")).filter(|a| !a.is_empty())?;
    let processing_method = params::scalar_text(obj.get("processingMethod")).unwrap_or_default();

    Some(SensorSpec {
        address,
        processing_method,
        unit: String::new(),
        formula: String::new(),
        latency: params::latency(obj),
    })
}
