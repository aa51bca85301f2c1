//! servsens library.
//!
//! The J-SENS command layer of a sensor-monitoring appliance: command
//! routing behind a trust gate, measurement sessions and their sampling,
//! sensor provisioning, and the update/restore pipeline.  Exposed as a
//! library for integration testing and fuzzing; `main.rs` wires the
//! adapters together.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod rpc;
pub mod scheduler;
pub mod sensors;
pub mod server;
pub mod session;
