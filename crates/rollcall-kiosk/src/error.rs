use thiserror::Error;

/// Errors raised on the kiosk side.
#[derive(Debug, Error)]
pub enum Error {
  #[error("camera error: {0}")]
  Camera(String),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("line {line}: {source}")]
  Decode {
    line:   usize,
    #[source]
    source: serde_json::Error,
  },

  #[error("invalid descriptor file: {0}")]
  Descriptors(#[from] serde_json::Error),

  #[error("kiosk is already powered on")]
  AlreadyOn,

  #[error("capture interval must be greater than zero")]
  ZeroTick,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
