//! Minimal HTTP/1.0 request decoder and response encoder.
//!
//! Wire format:
//! ```text
//! ┌──────────────────────────────┬──────┬───────────────────────────┐
//! │ Request line + headers       │ CRLF │ Body (Content-Length B)   │
//! │ (CRLF-separated)             │ CRLF │                           │
//! └──────────────────────────────┴──────┴───────────────────────────┘
//! ```
//!
//! The decoder accumulates incoming bytes and yields a complete request.
//! A single socket read may return part of the head, part of the body,
//! or both.

use core::fmt;
use std::collections::HashMap;

/// Maximum size of the request line plus headers.
pub const MAX_HEAD_SIZE: usize = 8 * 1024;

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

// ── Error type ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    HeadTooLarge,
    BodyTooLarge,
    MalformedRequestLine,
    MalformedHeader,
    InvalidContentLength,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeadTooLarge => write!(f, "request head exceeds {} bytes", MAX_HEAD_SIZE),
            Self::BodyTooLarge => write!(f, "request body too large"),
            Self::MalformedRequestLine => write!(f, "malformed request line"),
            Self::MalformedHeader => write!(f, "malformed header"),
            Self::InvalidContentLength => write!(f, "invalid Content-Length"),
        }
    }
}

impl std::error::Error for HttpError {}

// ── Request ───────────────────────────────────────────────────

/// A decoded request.  Header names are stored lower-case.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpRequest {
    method: String,
    target: String,
    headers: HashMap<String, String>,
    body: String,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            target: target.into(),
            ..Self::default()
        }
    }

    /// `POST /` carrying `body` as `application/json`.
    pub fn json(body: impl Into<String>) -> Self {
        Self::new("POST", "/")
            .with_header("Content-Type", "application/json")
            .with_body(body)
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

// ── Decoder ───────────────────────────────────────────────────

/// Decoder state machine.
enum DecoderState {
    /// Waiting for the blank line ending the head.
    ReadingHead,
    /// Head parsed, waiting for `expected` body bytes.
    ReadingBody { request: HttpRequest, expected: usize },
}

/// Streaming request decoder.
pub struct RequestDecoder {
    state: DecoderState,
    buf: Vec<u8>,
    max_body: usize,
}

impl RequestDecoder {
    pub fn new(max_body: usize) -> Self {
        Self {
            state: DecoderState::ReadingHead,
            buf: Vec::new(),
            max_body,
        }
    }

    /// Feed bytes into the decoder.
    ///
    /// Returns `Ok(Some(request))` once a full request has arrived.  Bytes
    /// past the end of that request stay buffered for the next call.
    pub fn feed(&mut self, data: &[u8]) -> Result<Option<HttpRequest>, HttpError> {
        self.buf.extend_from_slice(data);

        if let DecoderState::ReadingHead = self.state {
            let Some(end) = find(&self.buf, HEAD_TERMINATOR) else {
                if self.buf.len() > MAX_HEAD_SIZE {
                    return Err(HttpError::HeadTooLarge);
                }
                return Ok(None);
            };
            if end > MAX_HEAD_SIZE {
                return Err(HttpError::HeadTooLarge);
            }

            let head = String::from_utf8_lossy(&self.buf[..end]).into_owned();
            self.buf.drain(..end + HEAD_TERMINATOR.len());

            let request = parse_head(&head)?;
            let expected = match request.header("content-length") {
                None => 0,
                Some(v) => v
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| HttpError::InvalidContentLength)?,
            };
            if expected > self.max_body {
                return Err(HttpError::BodyTooLarge);
            }
            self.state = DecoderState::ReadingBody { request, expected };
        }

        let DecoderState::ReadingBody { expected, .. } = self.state else {
            return Ok(None);
        };
        if self.buf.len() < expected {
            return Ok(None);
        }

        let DecoderState::ReadingBody { request, .. } =
            std::mem::replace(&mut self.state, DecoderState::ReadingHead)
        else {
            return Ok(None);
        };
        let body: Vec<u8> = self.buf.drain(..expected).collect();
        Ok(Some(request.with_body(String::from_utf8_lossy(&body))))
    }

    /// Reset decoder state (e.g. for a new connection).
    pub fn reset(&mut self) {
        self.state = DecoderState::ReadingHead;
        self.buf.clear();
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn parse_head(head: &str) -> Result<HttpRequest, HttpError> {
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_ascii_whitespace();
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        return Err(HttpError::MalformedRequestLine);
    };

    let mut request = HttpRequest::new(method, target);
    for line in lines.filter(|l| !l.is_empty()) {
        let (name, value) = line.split_once(':').ok_or(HttpError::MalformedHeader)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(HttpError::MalformedHeader);
        }
        request = request.with_header(name, value.trim());
    }
    Ok(request)
}

// ── Encoder ───────────────────────────────────────────────────

/// Serialize a response with a JSON body.
pub fn encode_response(status: u16, reason: &str, body: &str) -> Vec<u8> {
    let mut out = format!(
        "HTTP/1.0 {} {}\r\nContent-Type: application/json; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        reason,
        body.len()
    )
    .into_bytes();
    out.extend_from_slice(body.as_bytes());
    out
}
