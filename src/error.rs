/// Error types shared by the library and the terminal front end.
///
/// The simulation itself never fails; only configuration loading and
/// presenting frames to a real output can.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("I/O error while presenting frame")]
    Io(#[from] io::Error),
    #[error("drawing surface unavailable: {0}")]
    Unavailable(String),
    #[error("terminal too small ({cols}x{rows}), need at least {min_cols}x{min_rows}")]
    TooSmall {
        cols: u16,
        rows: u16,
        min_cols: u16,
        min_rows: u16,
    },
}
