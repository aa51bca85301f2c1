//! Response envelope.
//!
//! Every answer, success or failure, has the same shape:
//!
//! ```json
//! { "status": { "code": "success", "message": "OK" }, "data": null }
//! ```

use core::fmt;

use serde::Serialize;
use serde_json::{Value, json};

/// Status code reported in `status.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusCode {
    Success,
    /// Malformed or invalid request; the client must correct it.
    ClientError,
    /// Internal or environmental failure.
    ServerError,
    /// Rejected by the trust gate.
    Forbidden,
}

impl StatusCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ClientError => "clientError",
            Self::ServerError => "serverError",
            Self::Forbidden => "forbidden",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A command's outcome, rendered to a body with [`Reply::to_body`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub code: StatusCode,
    pub message: String,
    pub data: Value,
}

impl Reply {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: Value::Null,
        }
    }

    /// `success` / `"OK"` with no data.
    pub fn ok() -> Self {
        Self::success("OK")
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Success, message)
    }

    pub fn client_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::ClientError, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::ServerError, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Forbidden, message)
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn is_success(&self) -> bool {
        self.code == StatusCode::Success
    }

    pub fn to_json(&self) -> Value {
        json!({
            "status": { "code": self.code, "message": self.message },
            "data": self.data,
        })
    }

    /// Pretty-printed response body.
    pub fn to_body(&self) -> String {
        format!("{:#}", self.to_json())
    }
}

/// Render an OS error for embedding in a status message.
///
/// Double quotes become single quotes so the text stays readable to
/// clients that scrape the message.
pub fn os_error_text(err: &std::io::Error) -> String {
    err.to_string().replace('"', "'")
}
