//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                 |
//! |----------------|--------------------|-----------------------------|
//! | `config_store` | ConfigPort         | Blob file / in-memory store |
//! | `device_id`    | —                  | `/etc/machine-id`           |
//! | `time`         | Clock              | `std::time::Instant`        |
//! | `updater`      | UpdatePort         | Installer process           |
//! | `w1`           | SensorReader       | Linux w1 sysfs              |
//!
//! The sensor registry ([`SensorDirectory`](crate::app::ports::SensorDirectory))
//! and the sampler ([`SampleScheduler`](crate::app::ports::SampleScheduler))
//! live with the domain in `sensors` and `scheduler`.

pub mod config_store;
pub mod device_id;
pub mod time;
pub mod updater;
pub mod w1;
