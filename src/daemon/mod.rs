//! The daemon and its client: a process-long server that amortizes resource
//! setup across many compress/decompress requests, talked to over a Unix
//! domain socket using the fixed-size records in [`protocol`].

pub mod client;
pub mod protocol;
pub mod server;

pub use client::{is_daemon_running, Client};
pub use protocol::{Request, Response};
pub use server::Server;
