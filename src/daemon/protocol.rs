//! Wire protocol: fixed-size request/response records exchanged over the
//! daemon's Unix domain socket, one record each way per connection.
//!
//! A path-based request (the daemon opens/reads/writes the named files
//! itself; the client only names them) and a response carrying a status
//! code, the output size, and a short message. A per-stage timing breakdown
//! isn't reproduced here — `driver::BenchmarkReport`'s single-block/
//! multi-block timings already cover what the benchmark pass needs.

use crate::error::DaemonError;

pub const PATH_MAX: usize = 256;
pub const MESSAGE_MAX: usize = 128;

pub const OP_COMPRESS: u8 = b'C';
pub const OP_DECOMPRESS: u8 = b'D';

/// `operation(1) + level(1) + workers(1) + pad(1) + input_path(256) +
/// output_path(256)`.
pub const REQUEST_SIZE: usize = 4 + PATH_MAX + PATH_MAX;

/// `status(1) + output_size(8) + time_us(8) + message(128)`.
pub const RESPONSE_SIZE: usize = 1 + 8 + 8 + MESSAGE_MAX;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub operation: u8,
    /// 1-9 "compression level", mapped through `Level::from_daemon_level` —
    /// a wider-banded mapping than the CLI's `-L` numeral.
    pub level: u8,
    /// Worker count; `0` means "let the daemon pick its default".
    pub workers: u8,
    pub input_path: String,
    pub output_path: String,
}

impl Request {
    pub fn new(operation: u8, level: u8, workers: u8, input_path: &str, output_path: &str) -> Request {
        Request {
            operation,
            level,
            workers,
            input_path: input_path.to_string(),
            output_path: output_path.to_string(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(REQUEST_SIZE);
        out.push(self.operation);
        out.push(self.level);
        out.push(self.workers);
        out.push(0);
        push_fixed_str(&mut out, &self.input_path, PATH_MAX);
        push_fixed_str(&mut out, &self.output_path, PATH_MAX);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Request, DaemonError> {
        if buf.len() != REQUEST_SIZE {
            return Err(DaemonError::Protocol("request record has the wrong size"));
        }
        let operation = buf[0];
        if operation != OP_COMPRESS && operation != OP_DECOMPRESS {
            return Err(DaemonError::Protocol("unknown operation byte"));
        }
        let level = buf[1];
        let workers = buf[2];
        let input_path = read_fixed_str(&buf[4..4 + PATH_MAX])?;
        let output_path = read_fixed_str(&buf[4 + PATH_MAX..4 + 2 * PATH_MAX])?;
        Ok(Request {
            operation,
            level,
            workers,
            input_path,
            output_path,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// `0` on success, `1` on error (`message` then carries the reason).
    pub status: u8,
    pub output_size: u64,
    pub time_us: u64,
    pub message: String,
}

impl Response {
    pub fn ok(output_size: u64, time_us: u64) -> Response {
        Response {
            status: 0,
            output_size,
            time_us,
            message: String::new(),
        }
    }

    pub fn err(message: impl Into<String>) -> Response {
        Response {
            status: 1,
            output_size: 0,
            time_us: 0,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 0
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(RESPONSE_SIZE);
        out.push(self.status);
        out.extend_from_slice(&self.output_size.to_le_bytes());
        out.extend_from_slice(&self.time_us.to_le_bytes());
        push_fixed_str(&mut out, &self.message, MESSAGE_MAX);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Response, DaemonError> {
        if buf.len() != RESPONSE_SIZE {
            return Err(DaemonError::Protocol("response record has the wrong size"));
        }
        let status = buf[0];
        let output_size = u64::from_le_bytes(buf[1..9].try_into().unwrap());
        let time_us = u64::from_le_bytes(buf[9..17].try_into().unwrap());
        let message = read_fixed_str(&buf[17..17 + MESSAGE_MAX])?;
        Ok(Response {
            status,
            output_size,
            time_us,
            message,
        })
    }
}

/// Writes `s` into a `width`-byte field: truncates to `width - 1` bytes (so
/// there's always a terminator) and zero-pads the remainder, like
/// `strncpy(dst, s, sizeof(dst) - 1)` over a zeroed buffer.
fn push_fixed_str(out: &mut Vec<u8>, s: &str, width: usize) {
    let bytes = s.as_bytes();
    let n = bytes.len().min(width - 1);
    out.extend_from_slice(&bytes[..n]);
    out.resize(out.len() + (width - n), 0);
}

fn read_fixed_str(field: &[u8]) -> Result<String, DaemonError> {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    std::str::from_utf8(&field[..end])
        .map(|s| s.to_string())
        .map_err(|_| DaemonError::Protocol("path field is not valid utf-8"))
}
