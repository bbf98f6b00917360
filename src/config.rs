//! Compile-time tunables: a flat module of constants, each documented with
//! what it corresponds to and how a caller can override it (environment
//! variable or CLI flag), rather than a `Config` struct threaded everywhere.

/// Default compressor level when `-L` is not given.
pub const LEVEL_DEFAULT: u8 = 3;

/// Default worker thread count for the block pool.
/// Overridable via the `LZOPAR_NBWORKERS` environment variable or `-t`.
pub const NB_WORKERS_DEFAULT: usize = 4;

/// Upper bound on the worker count accepted from the environment or `-t`.
pub const NB_WORKERS_MAX: usize = 200;

/// CPU block size bounds and alignment for the block planner.
/// A requested block size is clamped to `[CPU_BLOCK_MIN, CPU_BLOCK_MAX]` and
/// rounded up to a multiple of `CPU_BLOCK_ALIGN`.
pub const CPU_BLOCK_MIN: usize = 64 * 1024;
pub const CPU_BLOCK_MAX: usize = 1024 * 1024;
pub const CPU_BLOCK_ALIGN: usize = 16 * 1024;

/// Default block size used when the caller does not request one explicitly.
pub const CPU_BLOCK_DEFAULT: usize = CPU_BLOCK_MAX;

/// Accelerator block size bounds and alignment. Narrower than the CPU path:
/// an accelerator dispatch amortizes setup differently, favoring many
/// smaller work-items sized to `compute_units * OCC_FACTOR`.
pub const ACCEL_BLOCK_MIN: usize = 16 * 1024;
pub const ACCEL_BLOCK_MAX: usize = 128 * 1024;
pub const ACCEL_BLOCK_ALIGN: usize = 64 * 1024;

/// LZO1X dictionary window size: the compressor resets its hash table every
/// this many input bytes. Matches LZO's historical `D_BITS` window
/// accounting, not an arbitrary chunk size.
pub const LZO_WINDOW_SIZE: usize = 49_152;

/// Default path for the daemon's Unix domain socket.
/// Overridable via the `LZOPAR_DAEMON_SOCKET` environment variable.
pub const DAEMON_SOCKET_PATH_DEFAULT: &str = "/tmp/lzopar-daemon.sock";

/// Returns the worker count to use: environment override, else the default.
pub fn nb_workers_default() -> usize {
    if let Ok(env) = std::env::var("LZOPAR_NBWORKERS") {
        if let Ok(n) = env.parse::<usize>() {
            if n >= 1 && n <= NB_WORKERS_MAX {
                return n;
            }
        }
    }
    NB_WORKERS_DEFAULT
}

/// Returns the daemon socket path: environment override, else the default.
pub fn daemon_socket_path() -> String {
    std::env::var("LZOPAR_DAEMON_SOCKET").unwrap_or_else(|_| DAEMON_SOCKET_PATH_DEFAULT.to_string())
}
