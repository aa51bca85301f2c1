//! TCP front end for the command protocol.
//!
//! One request per connection (HTTP/1.0, `Connection: close`).
//! Connections are served one at a time; the service lock is held only
//! while a decoded request is being handled.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use log::{debug, info, warn};

use crate::app::service::ApplianceService;
use crate::error::{Error, Result};
use crate::rpc::codec::{RequestDecoder, encode_response};
use crate::rpc::response::Reply;

const READ_CHUNK: usize = 4096;

#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    pub read_timeout: Duration,
    pub max_body: usize,
}

/// Accept connections until the listener fails.
pub fn serve(listener: &TcpListener, service: &Mutex<ApplianceService>, opts: ServerOptions) {
    if let Ok(addr) = listener.local_addr() {
        info!("server: listening on {}", addr);
    }
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let peer = stream.peer_addr().map(|a| a.to_string()).unwrap_or_default();
                if let Err(e) = serve_connection(stream, service, opts) {
                    warn!("server: {}: {}", peer, e);
                }
            }
            Err(e) => warn!("server: accept failed: {}", e),
        }
    }
}

fn serve_connection(
    mut stream: TcpStream,
    service: &Mutex<ApplianceService>,
    opts: ServerOptions,
) -> Result<()> {
    stream.set_read_timeout(Some(opts.read_timeout))?;
    stream.set_write_timeout(Some(opts.read_timeout))?;
    handle_stream(&mut stream, service, opts.max_body)
}

/// Read one request from `stream`, serve it, and write the response.
///
/// A malformed request is answered with `400` and a `clientError` envelope
/// before the error is returned.  A peer that closes without sending
/// anything is not an error.
pub fn handle_stream<S: Read + Write>(
    stream: &mut S,
    service: &Mutex<ApplianceService>,
    max_body: usize,
) -> Result<()> {
    let mut decoder = RequestDecoder::new(max_body);
    let mut chunk = [0u8; READ_CHUNK];
    let mut received = 0usize;

    let request = loop {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return if received == 0 { Ok(()) } else { Err(Error::Truncated) };
        }
        received += n;
        match decoder.feed(&chunk[..n]) {
            Ok(Some(request)) => break request,
            Ok(None) => {}
            Err(e) => {
                let body = Reply::client_error(format!("Bad request: {e}.")).to_body();
                stream.write_all(&encode_response(400, "Bad Request", &body))?;
                stream.flush()?;
                return Err(e.into());
            }
        }
    };
    debug!("server: {} {} ({} bytes)", request.method(), request.target(), received);

    let body = service
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .handle_request(&request);

    stream.write_all(&encode_response(200, "OK", &body))?;
    stream.flush()?;
    Ok(())
}
