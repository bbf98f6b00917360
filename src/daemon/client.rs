//! The daemon client: sends one request over a connected socket, waits for
//! the matching response. Check-socket-exists, connect, send one fixed
//! record, receive one fixed record, close.

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;

use super::protocol::{Request, Response, OP_COMPRESS, OP_DECOMPRESS, RESPONSE_SIZE};
use crate::error::DaemonError;

/// Returns whether a daemon appears to be listening at `socket_path`. This
/// is a best-effort existence check, not a liveness probe — a stale socket
/// file from a crashed daemon will still report `true` here, and `connect`
/// is what actually discovers that.
pub fn is_daemon_running(socket_path: &str) -> bool {
    Path::new(socket_path).exists()
}

pub struct Client {
    stream: UnixStream,
}

impl Client {
    pub fn connect(socket_path: &str) -> Result<Client, DaemonError> {
        let stream = UnixStream::connect(socket_path)?;
        Ok(Client { stream })
    }

    /// Sends a compress request for `input_path` -> `output_path` at `level`
    /// (the daemon's 1-9 "compression level" — not the CLI's `-L` numeral)
    /// using `workers` worker threads (`0` = daemon default), and waits for
    /// the response.
    pub fn compress(mut self, input_path: &str, output_path: &str, level: u8, workers: u8) -> Result<Response, DaemonError> {
        let request = Request::new(OP_COMPRESS, level, workers, input_path, output_path);
        self.exchange(&request)
    }

    /// Sends a decompress request for `input_path` -> `output_path` using
    /// `workers` worker threads, and waits for the response.
    pub fn decompress(mut self, input_path: &str, output_path: &str, workers: u8) -> Result<Response, DaemonError> {
        let request = Request::new(OP_DECOMPRESS, 0, workers, input_path, output_path);
        self.exchange(&request)
    }

    fn exchange(&mut self, request: &Request) -> Result<Response, DaemonError> {
        self.stream.write_all(&request.encode())?;
        let mut buf = vec![0u8; RESPONSE_SIZE];
        self.stream.read_exact(&mut buf)?;
        Response::decode(&buf)
    }
}
