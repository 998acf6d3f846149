//! Error types for `edge-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("feature state change has neither a previous nor a new state")]
  InvalidEvent,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
