//! The daemon's process-long accept loop: a single blocking `accept()` loop,
//! one connection served to completion before the next is accepted (the
//! resource cache is what's amortized across requests, not connection
//! handling), and a SIGINT/SIGTERM handler that flips a flag and closes the
//! listening socket to unblock `accept()`.

use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use nix::sys::signal::{self, SigHandler, Signal};

use super::protocol::{Request, Response, OP_COMPRESS, OP_DECOMPRESS, REQUEST_SIZE};
use crate::config::nb_workers_default;
use crate::error::DaemonError;
use crate::lzo::level::Level;

#[cfg(feature = "accel-software")]
use crate::accel::{software::SoftwareDevice, AccelDriver};
#[cfg(feature = "accel-software")]
use std::sync::Arc;

#[cfg(not(feature = "accel-software"))]
use crate::driver::{self, CompressOptions, DecompressOptions};

static SHOULD_STOP: AtomicBool = AtomicBool::new(false);

extern "C" fn request_stop(_signum: i32) {
    SHOULD_STOP.store(true, Ordering::SeqCst);
}

/// Resets the process-wide stop flag. Only meaningful in tests, where more
/// than one `Server` may run in the same process.
fn reset_stop_flag() {
    SHOULD_STOP.store(false, Ordering::SeqCst);
}

pub struct Server {
    listener: UnixListener,
    socket_path: String,
    /// The resident accelerator driver: built once at `bind` time and held
    /// for the server's whole lifetime, so its `ProgramCache` amortizes
    /// kernel load cost across every request instead of paying it per
    /// connection. Absent when the `accel-software` feature is off, in which
    /// case requests fall back to the plain CPU driver.
    #[cfg(feature = "accel-software")]
    accel: AccelDriver,
}

impl Server {
    /// Binds the Unix domain socket at `socket_path`, removing a stale
    /// socket file left behind by an earlier run first (`unlink` before
    /// `bind`, same as `start_server`), and constructs the resident
    /// accelerator driver that every served request will share.
    pub fn bind(socket_path: &str) -> Result<Server, DaemonError> {
        let _ = std::fs::remove_file(socket_path);
        reset_stop_flag();
        let listener = UnixListener::bind(socket_path)?;
        Ok(Server {
            listener,
            socket_path: socket_path.to_string(),
            #[cfg(feature = "accel-software")]
            accel: AccelDriver::new(Arc::new(SoftwareDevice::new())),
        })
    }

    /// Installs SIGINT/SIGTERM handlers and serves requests until one
    /// arrives, then tears the socket down. Every request is handled
    /// in-process against the server's resident accelerator driver (or,
    /// without `accel-software`, the plain CPU driver) — the device's
    /// program/buffer caches, not just process startup, are what this
    /// daemon amortizes relative to one-shot CLI invocations.
    pub fn run(self) -> Result<(), DaemonError> {
        // SAFETY: `request_stop` only performs an atomic store, which is
        // async-signal-safe.
        unsafe {
            signal::signal(Signal::SIGINT, SigHandler::Handler(request_stop))
                .map_err(|_| DaemonError::Protocol("failed to install SIGINT handler"))?;
            signal::signal(Signal::SIGTERM, SigHandler::Handler(request_stop))
                .map_err(|_| DaemonError::Protocol("failed to install SIGTERM handler"))?;
        }

        for conn in self.listener.incoming() {
            if SHOULD_STOP.load(Ordering::SeqCst) {
                break;
            }
            match conn {
                Ok(stream) => {
                    if let Err(e) = self.handle_connection(stream) {
                        crate::displaylevel!(1, "[daemon] request failed: {e}\n");
                    }
                }
                Err(_) if SHOULD_STOP.load(Ordering::SeqCst) => break,
                Err(e) => return Err(DaemonError::Io(e)),
            }
        }

        let _ = std::fs::remove_file(&self.socket_path);
        Ok(())
    }

    /// Serves exactly one request then returns, without installing signal
    /// handlers or looping. Used by tests and by any embedder that wants to
    /// drive the accept loop itself.
    pub fn serve_one(&self) -> Result<(), DaemonError> {
        let (stream, _) = self.listener.accept()?;
        self.handle_connection(stream)
    }

    fn handle_connection(&self, mut stream: UnixStream) -> Result<(), DaemonError> {
        let mut buf = vec![0u8; REQUEST_SIZE];
        stream.read_exact(&mut buf)?;
        let request = Request::decode(&buf)?;
        let response = self.process_request(&request);
        stream.write_all(&response.encode())?;
        Ok(())
    }

    fn process_request(&self, request: &Request) -> Response {
        let t0 = Instant::now();
        let workers = if request.workers == 0 {
            nb_workers_default()
        } else {
            request.workers as usize
        };

        let result = match request.operation {
            OP_COMPRESS => self.run_compress(request, workers),
            OP_DECOMPRESS => self.run_decompress(request, workers),
            _ => Err(DaemonError::Protocol("unknown operation byte")),
        };

        match result {
            Ok(output_size) => Response::ok(output_size as u64, t0.elapsed().as_micros() as u64),
            Err(e) => Response::err(e.to_string()),
        }
    }

    #[cfg(feature = "accel-software")]
    fn run_compress(&self, request: &Request, workers: usize) -> Result<usize, DaemonError> {
        let input = std::fs::read(&request.input_path)?;
        let container = self.accel.compress(&input, Level::from_daemon_level(request.level), workers)?;
        std::fs::write(&request.output_path, &container)?;
        Ok(container.len())
    }

    #[cfg(feature = "accel-software")]
    fn run_decompress(&self, request: &Request, workers: usize) -> Result<usize, DaemonError> {
        let container = std::fs::read(&request.input_path)?;
        let output = self.accel.decompress(&container, workers)?;
        std::fs::write(&request.output_path, &output)?;
        Ok(output.len())
    }

    #[cfg(not(feature = "accel-software"))]
    fn run_compress(&self, request: &Request, workers: usize) -> Result<usize, DaemonError> {
        let input = std::fs::read(&request.input_path)?;
        let outcome = driver::compress(
            &input,
            &CompressOptions {
                level: Level::from_daemon_level(request.level),
                workers,
                verify: false,
                benchmark: false,
            },
        )?;
        std::fs::write(&request.output_path, &outcome.container)?;
        Ok(outcome.container.len())
    }

    #[cfg(not(feature = "accel-software"))]
    fn run_decompress(&self, request: &Request, workers: usize) -> Result<usize, DaemonError> {
        let container = std::fs::read(&request.input_path)?;
        let outcome = driver::decompress(
            &container,
            &DecompressOptions {
                workers,
                verify: false,
                benchmark: false,
            },
        )?;
        std::fs::write(&request.output_path, &outcome.output)?;
        Ok(outcome.output.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::client::Client;
    use std::io::Write as _;

    fn unique_socket_path(name: &str) -> String {
        format!("{}/lzopar-test-{}-{}.sock", std::env::temp_dir().display(), name, std::process::id())
    }

    #[test]
    fn serves_a_single_compress_then_decompress_round_trip() {
        let socket_path = unique_socket_path("roundtrip");
        let server = Server::bind(&socket_path).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("input.txt");
        let compressed_path = dir.path().join("input.txt.lzo");
        let decompressed_path = dir.path().join("input.txt.out");
        std::fs::File::create(&input_path)
            .unwrap()
            .write_all(&vec![7u8; 100_000])
            .unwrap();

        let client_thread = std::thread::spawn({
            let socket_path = socket_path.clone();
            let input_path = input_path.to_string_lossy().to_string();
            let compressed_path = compressed_path.to_string_lossy().to_string();
            move || Client::connect(&socket_path).unwrap().compress(&input_path, &compressed_path, 3, 2).unwrap()
        });
        server.serve_one().unwrap();
        let resp = client_thread.join().unwrap();
        assert!(resp.is_ok());

        let client_thread = std::thread::spawn({
            let socket_path = socket_path.clone();
            let compressed_path = compressed_path.to_string_lossy().to_string();
            let decompressed_path = decompressed_path.to_string_lossy().to_string();
            move || Client::connect(&socket_path).unwrap().decompress(&compressed_path, &decompressed_path, 2).unwrap()
        });
        server.serve_one().unwrap();
        let resp = client_thread.join().unwrap();
        assert!(resp.is_ok());

        assert_eq!(std::fs::read(&decompressed_path).unwrap(), vec![7u8; 100_000]);
        let _ = std::fs::remove_file(&socket_path);
    }

    #[test]
    fn two_back_to_back_compress_requests_share_the_resident_driver() {
        // Exercises the same `Server` (and so the same resident `AccelDriver`/
        // `ProgramCache`) across two separate connections, confirming the
        // daemon serves a second request without rebuilding its accelerator
        // state — the cache-identity contract itself is covered directly by
        // `accel::cache`'s tests.
        let socket_path = unique_socket_path("back-to-back");
        let server = Server::bind(&socket_path).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("input.txt");
        std::fs::File::create(&input_path).unwrap().write_all(&vec![5u8; 50_000]).unwrap();
        let input_path = input_path.to_string_lossy().to_string();

        for i in 0..2 {
            let compressed_path = dir.path().join(format!("out-{i}.lzo")).to_string_lossy().to_string();
            let client_thread = std::thread::spawn({
                let socket_path = socket_path.clone();
                let input_path = input_path.clone();
                let compressed_path = compressed_path.clone();
                move || Client::connect(&socket_path).unwrap().compress(&input_path, &compressed_path, 2, 2).unwrap()
            });
            server.serve_one().unwrap();
            let resp = client_thread.join().unwrap();
            assert!(resp.is_ok());
            assert!(std::fs::metadata(&compressed_path).unwrap().len() > 0);
        }
        let _ = std::fs::remove_file(&socket_path);
    }

    #[test]
    fn reports_an_error_response_for_a_missing_input_file() {
        let socket_path = unique_socket_path("missing-input");
        let server = Server::bind(&socket_path).unwrap();

        let client_thread = std::thread::spawn({
            let socket_path = socket_path.clone();
            move || {
                Client::connect(&socket_path)
                    .unwrap()
                    .compress("/nonexistent/path/does-not-exist", "/tmp/out.lzo", 3, 1)
                    .unwrap()
            }
        });
        server.serve_one().unwrap();
        let resp = client_thread.join().unwrap();
        assert!(!resp.is_ok());
        let _ = std::fs::remove_file(&socket_path);
    }
}
