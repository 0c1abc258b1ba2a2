//! Default values shared by the library and the binary.

/// File read from the metadata repository.
pub const METADATA_FILENAME: &str = "ci.conf";

/// Depth of the metadata repository clone. Only the tip is read.
pub const METADATA_CLONE_DEPTH: u32 = 1;

/// Timeout for a single job store request.
pub const HTTP_TIMEOUT_SECS: u64 = 60;

/// Log level used when neither `--log-level` nor `RUST_LOG` says otherwise.
pub const LOG_LEVEL: &str = "info";

/// Names of the timers recorded by the `generate` command, in run order.
pub const TIMERS: [&str; 4] = ["fetch", "resolve", "plan", "apply"];
