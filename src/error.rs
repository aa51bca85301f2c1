//! Transport error types for the command server.
//!
//! Command-level failures never surface here: they are reported to the
//! client inside the response envelope.  This enum covers what goes wrong
//! around a request (socket I/O, malformed HTTP).

use core::fmt;
use std::io;

use crate::rpc::codec::HttpError;

/// Every failure while serving one connection funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The request could not be decoded.
    Http(HttpError),
    /// Socket read/write failed.
    Io(io::ErrorKind),
    /// The peer closed the connection before a full request arrived.
    Truncated,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "http: {e}"),
            Self::Io(kind) => write!(f, "io: {kind}"),
            Self::Truncated => write!(f, "connection closed mid-request"),
        }
    }
}

impl std::error::Error for Error {}

impl From<HttpError> for Error {
    fn from(e: HttpError) -> Self {
        Self::Http(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e.kind())
    }
}

/// Server-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
