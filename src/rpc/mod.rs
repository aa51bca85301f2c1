//! J-SENS command protocol.
//!
//! JSON commands carried over a minimal HTTP/1.0 transport.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Command Stack                           │
//! │                                                              │
//! │  ┌──────────┐   ┌──────────────┐   ┌──────────────────────┐  │
//! │  │  Codec   │──▶│    Engine    │──▶│  Handlers            │  │
//! │  │ (HTTP)   │   │ (gates/verb) │   │  measure · provision │  │
//! │  └──────────┘   └──────────────┘   │  ota                 │  │
//! │       ▲                            └──────────┬───────────┘  │
//! │       │              ┌────────────────────────┘              │
//! │       │              ▼                                       │
//! │  ┌──────────┐   ┌──────────┐                                 │
//! │  │  Codec   │◀──│ Response │                                 │
//! │  │ (encode) │   │ envelope │                                 │
//! │  └──────────┘   └──────────┘                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod codec;
pub mod engine;
mod measure;
pub mod ota;
pub mod params;
mod provision;
pub mod response;
