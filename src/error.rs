//! Error types shared across the crate.

use std::io;
use thiserror::Error;

use crate::core::utf8::EncodeError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read size of terminal: {0}")]
    Geometry(#[source] io::Error),

    #[error("Terminal reports no drawable cells ({width}x{height})")]
    EmptyGeometry { width: u16, height: u16 },

    #[error("Failed to allocate frame buffer of {cells} cells")]
    Allocation { cells: usize },

    #[error("Failed to enable raw mode: {0}")]
    RawMode(#[source] io::Error),

    #[error("Failed to start key listener: {0}")]
    Listener(String),

    #[error(transparent)]
    Encoding(#[from] EncodeError),

    #[error("Position ({x}, {y}) is outside the frame buffer")]
    OutOfBounds { x: i64, y: i64 },

    #[error("Terminal I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to install logger: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, Error>;
