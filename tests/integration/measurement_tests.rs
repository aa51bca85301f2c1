//! `start` / `stop` / `get-values` against a sampled session.

use std::time::Duration;

use serde_json::json;
use servsens::session::{DEFAULT_SESSION, SampleCount};

use crate::mock_ports::{CountingReader, Harness, code, message};

fn verified_with(addrs: &[&str]) -> Harness {
    let mut h = Harness::new(true);
    h.provision(addrs);
    h
}

// ── start ─────────────────────────────────────────────────────

#[test]
fn start_requires_object_params() {
    let mut h = verified_with(&["a"]);
    let reply = h.call(json!({ "cmd": "start" }));
    assert_eq!(code(&reply), "clientError");

    let reply = h.call(json!({ "cmd": "start", "params": ["a"] }));
    assert_eq!(code(&reply), "clientError");
    assert!(h.service.sessions().is_empty());
}

#[test]
fn start_columns_follow_resolution_order_and_skip_unknown() {
    let mut h = verified_with(&["a", "b", "c"]);
    let reply = h.call(json!({
        "cmd": "start",
        "params": { "addrs": ["c", "ghost", "a"], "count": 2, "delay": 1 }
    }));
    assert_eq!(code(&reply), "success", "{reply}");

    let session = h.service.sessions().get(DEFAULT_SESSION).unwrap();
    let addrs: Vec<&str> = session.addresses().collect();
    assert_eq!(addrs, ["c", "a"]);
    let ids: Vec<_> = session.sensor_ids().collect();
    assert_eq!(ids.len(), addrs.len());
    assert_eq!(ids[0], h.service.sensors().get("c").unwrap().id);
    assert_eq!(ids[1], h.service.sensors().get("a").unwrap().id);
}

#[test]
fn start_count_zero_means_unbounded() {
    let mut h = verified_with(&["a"]);
    let reply = h.call(json!({
        "cmd": "start",
        "params": { "addrs": ["a"], "count": 0, "delay": 1 }
    }));
    assert_eq!(code(&reply), "success");
    let session = h.service.sessions().get(DEFAULT_SESSION).unwrap();
    assert_eq!(session.remaining(), SampleCount::Unbounded);
    assert_eq!(session.interval(), Duration::from_secs(1));
}

#[test]
fn start_zero_delay_needs_single_sample() {
    let mut h = verified_with(&["a"]);
    let reply = h.call(json!({
        "cmd": "start",
        "params": { "addrs": ["a"], "count": 3, "delay": 0 }
    }));
    assert_eq!(code(&reply), "clientError");
    assert!(message(&reply).contains("Measure delay have invalid value."));
    assert!(h.service.sessions().is_empty());

    let reply = h.call(json!({
        "cmd": "start",
        "params": { "addrs": ["a"], "count": 1, "delay": 0 }
    }));
    assert_eq!(code(&reply), "success");
}

#[test]
fn start_rejects_delay_that_rounds_to_zero() {
    let mut h = verified_with(&["a"]);
    let reply = h.call(json!({
        "cmd": "start",
        "params": { "addrs": ["a"], "delay": 1e-12 }
    }));
    assert_eq!(code(&reply), "clientError");
    assert_eq!(message(&reply), "Measure delay have invalid value.");
    assert!(h.service.sessions().is_empty());

    let reply = h.call(json!({
        "cmd": "start",
        "params": { "addrs": ["a"], "count": 1, "delay": 1e-12 }
    }));
    assert_eq!(code(&reply), "success");
    let session = h.service.sessions().get(DEFAULT_SESSION).unwrap();
    assert_eq!(session.interval(), Duration::ZERO);
}

#[test]
fn huge_delay_parks_the_next_sample() {
    let mut h = verified_with(&["a"]);
    let mut reader = CountingReader::default();
    h.clock.advance(Duration::from_secs(3000));
    let reply = h.call(json!({
        "cmd": "start",
        "params": { "addrs": ["a"], "delay": 1.844674407370955e19 }
    }));
    assert_eq!(code(&reply), "success");

    assert_eq!(h.run_for(Duration::from_secs(1), &mut reader), 1);
    let pending = h.service.sampler().pending_for(DEFAULT_SESSION).unwrap();
    assert_eq!(pending.generation, 1);
    assert_eq!(pending.at, Duration::MAX);

    let reply = h.call(json!({ "cmd": "get-values" }));
    assert_eq!(reply["data"]["values"], json!([[1]]));
}

#[test]
fn start_reports_every_problem_together() {
    let mut h = verified_with(&["a"]);
    let reply = h.call(json!({
        "cmd": "start",
        "params": { "addrs": ["ghost"], "count": -2, "delay": "soon" }
    }));
    assert_eq!(code(&reply), "clientError");
    let text = message(&reply);
    assert!(text.contains("Sensor 'ghost' not found."), "{text}");
    assert!(text.contains("Parsed sensor list is empty."), "{text}");
    assert!(text.contains("Measure count must be positive."), "{text}");
    assert!(text.contains("Measure delay have invalid format."), "{text}");
}

#[test]
fn failed_start_keeps_previous_session() {
    let mut h = verified_with(&["a"]);
    let mut reader = CountingReader::default();
    h.call(json!({ "cmd": "start", "params": { "addrs": ["a"], "count": 5 } }));
    h.run_for(Duration::ZERO, &mut reader);

    let reply = h.call(json!({ "cmd": "start", "params": { "addrs": ["ghost"] } }));
    assert_eq!(code(&reply), "clientError");

    let session = h.service.sessions().get(DEFAULT_SESSION).unwrap();
    assert_eq!(session.remaining(), SampleCount::Finite(4));
    assert_eq!(session.results().len(), 1);
}

#[test]
fn start_replaces_previous_session_and_its_rows() {
    let mut h = verified_with(&["a", "b"]);
    let mut reader = CountingReader::default();
    h.call(json!({ "cmd": "start", "params": { "addrs": ["a"] } }));
    h.run_for(Duration::from_secs(2), &mut reader);
    assert_eq!(h.service.sessions().get(0).unwrap().results().len(), 3);

    h.call(json!({ "cmd": "start", "params": { "addrs": ["b"], "count": 1 } }));
    let session = h.service.sessions().get(0).unwrap();
    assert!(session.results().is_empty());
    assert_eq!(session.addresses().collect::<Vec<_>>(), ["b"]);
    assert_eq!(h.service.sessions().len(), 1);
}

#[test]
fn start_schedules_first_sample_now() {
    let mut h = verified_with(&["a"]);
    h.clock.advance(Duration::from_secs(7));
    h.call(json!({ "cmd": "start", "params": { "addrs": ["a"], "delay": 0.5 } }));

    let pending = h.service.sampler().pending_for(DEFAULT_SESSION).unwrap();
    assert_eq!(pending.generation, 0);
    assert_eq!(pending.at, Duration::from_secs(7));
}

// ── stop ──────────────────────────────────────────────────────

#[test]
fn stop_missing_session() {
    let mut h = Harness::new(true);
    let reply = h.call(json!({ "cmd": "stop", "params": { "session-id": 3 } }));
    assert_eq!(code(&reply), "serverError");
    assert_eq!(message(&reply), "No measures found.");
}

#[test]
fn stop_is_idempotent_and_keeps_rows() {
    let mut h = verified_with(&["a"]);
    let mut reader = CountingReader::default();
    h.call(json!({ "cmd": "start", "params": { "addrs": ["a"] } }));
    h.run_for(Duration::from_secs(1), &mut reader);

    for _ in 0..2 {
        let reply = h.call(json!({ "cmd": "stop" }));
        assert_eq!(code(&reply), "success");
        let session = h.service.sessions().get(0).unwrap();
        assert_eq!(session.remaining(), SampleCount::STOPPED);
    }

    // No further samples after stop.
    assert_eq!(h.run_for(Duration::from_secs(5), &mut reader), 0);
    let reply = h.call(json!({ "cmd": "get-values" }));
    assert_eq!(reply["data"]["values"].as_array().unwrap().len(), 2);
}

#[test]
fn stop_with_unparseable_session_id_uses_default() {
    let mut h = verified_with(&["a"]);
    h.call(json!({ "cmd": "start", "params": { "addrs": ["a"] } }));
    let reply = h.call(json!({ "cmd": "stop", "params": { "session-id": "zero" } }));
    assert_eq!(code(&reply), "success");
}

// ── get-values ────────────────────────────────────────────────

#[test]
fn get_values_missing_session() {
    let mut h = Harness::new(true);
    let reply = h.call(json!({ "cmd": "get-values" }));
    assert_eq!(code(&reply), "serverError");
    assert_eq!(message(&reply), "No measures found.");

    let reply = h.call(json!({ "cmd": "get-values", "params": "a" }));
    assert_eq!(code(&reply), "clientError");
}

#[test]
fn get_values_drains() {
    let mut h = verified_with(&["a", "b"]);
    let mut reader = CountingReader::default();
    h.call(json!({ "cmd": "start", "params": { "addrs": ["a", "b"], "count": 2 } }));
    h.run_for(Duration::from_secs(3), &mut reader);

    let first = h.call(json!({ "cmd": "get-values" }));
    assert_eq!(code(&first), "success");
    assert_eq!(first["data"]["addrs"], json!(["a", "b"]));
    assert_eq!(first["data"]["values"], json!([[1, 2], [3, 4]]));

    let second = h.call(json!({ "cmd": "get-values" }));
    assert_eq!(second["data"]["values"], json!([]));
    assert_eq!(second["data"]["addrs"], json!(["a", "b"]));
}

#[test]
fn get_values_projects_in_session_order() {
    let mut h = verified_with(&["a", "b", "c"]);
    let mut reader = CountingReader::default();
    h.call(json!({ "cmd": "start", "params": { "addrs": ["a", "b", "c"], "count": 1 } }));
    h.run_for(Duration::ZERO, &mut reader);

    let reply = h.call(json!({ "cmd": "get-values", "params": { "addrs": ["c", "a"] } }));
    assert_eq!(reply["data"]["addrs"], json!(["a", "c"]));
    // Row was [1, 2, 3]; the unselected middle column must not shift values.
    assert_eq!(reply["data"]["values"], json!([[1, 3]]));
}

#[test]
fn get_values_array_params_select_for_session_zero() {
    let mut h = verified_with(&["a", "b"]);
    let mut reader = CountingReader::default();
    h.call(json!({ "cmd": "start", "params": { "addrs": ["a", "b"], "count": 1 } }));
    h.run_for(Duration::ZERO, &mut reader);

    let reply = h.call(json!({ "cmd": "get-values", "params": ["b"] }));
    assert_eq!(reply["data"]["addrs"], json!(["b"]));
    assert_eq!(reply["data"]["values"], json!([[2]]));
}

#[test]
fn get_values_selects_numeric_addresses() {
    let mut h = Harness::new(true);
    h.call(json!({ "cmd": "set-ports-setting", "params": [{ "addr": 5 }, { "addr": "b" }] }));
    let mut reader = CountingReader::default();
    let reply = h.call(json!({ "cmd": "start", "params": { "addrs": [5, "b"], "count": 1 } }));
    assert_eq!(code(&reply), "success", "{reply}");
    h.run_for(Duration::ZERO, &mut reader);

    let reply = h.call(json!({ "cmd": "get-values", "params": { "addrs": [5] } }));
    assert_eq!(reply["data"]["addrs"], json!(["5"]));
    assert_eq!(reply["data"]["values"], json!([[1]]));
}

#[test]
fn get_values_no_match_falls_back_to_all() {
    let mut h = verified_with(&["a", "b"]);
    h.call(json!({ "cmd": "start", "params": { "addrs": ["a", "b"] } }));
    let reply = h.call(json!({ "cmd": "get-values", "params": { "addrs": ["zzz"] } }));
    assert_eq!(reply["data"]["addrs"], json!(["a", "b"]));
}

#[test]
fn failed_reads_surface_as_null() {
    let mut h = verified_with(&["a", "dead-1"]);
    let mut reader = CountingReader::default();
    h.call(json!({ "cmd": "start", "params": { "addrs": ["a", "dead-1"], "count": 1 } }));
    h.run_for(Duration::ZERO, &mut reader);

    let reply = h.call(json!({ "cmd": "get-values" }));
    assert_eq!(reply["data"]["values"], json!([[1, null]]));
}

#[test]
fn unread_rows_are_bounded() {
    let mut h = Harness::with_row_limit(true, 3);
    h.provision(&["a"]);
    let mut reader = CountingReader::default();
    h.call(json!({ "cmd": "start", "params": { "addrs": ["a"], "count": 5, "delay": 0.1 } }));
    assert_eq!(h.run_for(Duration::from_secs(1), &mut reader), 5);

    let reply = h.call(json!({ "cmd": "get-values" }));
    assert_eq!(reply["data"]["values"], json!([[3], [4], [5]]));
}
