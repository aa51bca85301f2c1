//! `set-ports-setting` provisioning and `restore` roll-back.

use serde_json::json;
use servsens::app::ports::SensorDirectory;

use crate::mock_ports::{Harness, code, message};

#[test]
fn mixed_descriptors_partially_accepted() {
    let mut h = Harness::new(true);
    let reply = h.call(json!({
        "cmd": "set-ports-setting",
        "params": [{ "addr": "x" }, {}, { "addr": "y", "latency": "bad" }]
    }));
    assert_eq!(code(&reply), "success");

    let sensors = h.service.sensors();
    assert_eq!(sensors.len(), 2);
    assert!(sensors.get("x").is_some());
    let y = sensors.get("y").unwrap();
    assert!(y.latency.abs() < f64::EPSILON);
}

#[test]
fn object_form_with_addrs() {
    let mut h = Harness::new(true);
    let reply = h.call(json!({
        "cmd": "set-ports-setting",
        "params": { "addrs": [{ "addr": "28-01", "processingMethod": "avg", "latency": 1.5 }] }
    }));
    assert_eq!(code(&reply), "success");
    let rec = h.service.sensors().get("28-01").unwrap();
    assert_eq!(rec.processing_method, "avg");
    assert!((rec.latency - 1.5).abs() < f64::EPSILON);
}

#[test]
fn shape_errors() {
    let mut h = Harness::new(true);

    let reply = h.call(json!({ "cmd": "set-ports-setting", "params": "x" }));
    assert_eq!(code(&reply), "clientError");
    assert_eq!(message(&reply), "Parameters have invalid format.");

    let reply = h.call(json!({ "cmd": "set-ports-setting", "params": { "addrs": "x" } }));
    assert_eq!(code(&reply), "clientError");
    assert_eq!(message(&reply), "Sensors must be array.");

    for params in [json!(null), json!([]), json!({}), json!({ "addrs": [] })] {
        let reply = h.call(json!({ "cmd": "set-ports-setting", "params": params }));
        assert_eq!(code(&reply), "serverError", "{params}");
        assert_eq!(message(&reply), "Sensors not found.");
    }
    assert_eq!(h.config.0.lock().unwrap().saves, 0);
}

#[test]
fn provisioning_replaces_registry_and_persists() {
    let mut h = Harness::new(true);
    h.provision(&["a", "b"]);
    h.provision(&["c"]);

    assert_eq!(h.service.sensors().len(), 1);
    assert!(h.service.sensors().by_address("a").is_none());

    let state = h.config.0.lock().unwrap();
    assert_eq!(state.saves, 2);
    let stored = state.stored.as_ref().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].address, "c");
}

#[test]
fn save_failure_does_not_fail_command() {
    let mut h = Harness::new(true);
    h.config.0.lock().unwrap().fail_saves = true;
    let reply = h.call(json!({ "cmd": "set-ports-setting", "params": [{ "addr": "a" }] }));
    assert_eq!(code(&reply), "success");
    assert_eq!(h.service.sensors().len(), 1);
}

#[test]
fn restore_rolls_back_to_persisted_list() {
    let mut h = Harness::new(true);
    h.provision(&["a", "b"]);

    // Unsaved drift: registry diverges from what was persisted.
    h.config.0.lock().unwrap().fail_saves = true;
    h.provision(&["z"]);
    assert!(h.service.sensors().get("z").is_some());

    let reply = h.call(json!({ "cmd": "restore" }));
    assert_eq!(code(&reply), "success");
    let sensors = h.service.sensors();
    assert_eq!(sensors.len(), 2);
    assert!(sensors.get("a").is_some() && sensors.get("b").is_some());
    assert!(sensors.get("z").is_none());
}

#[test]
fn restore_without_saved_config_still_succeeds() {
    let mut h = Harness::new(true);
    let reply = h.call(json!({ "cmd": "restore", "params": { "ignored": true } }));
    assert_eq!(code(&reply), "success");
    assert!(h.service.sensors().is_empty());
}

#[test]
fn boot_restore_loads_registry() {
    let mut h = Harness::new(true);
    assert_eq!(h.service.restore_sensors(), Ok(0));

    h.provision(&["a", "b", "c"]);
    assert_eq!(h.service.restore_sensors(), Ok(3));
    assert_eq!(h.service.sensors().len(), 3);
}
