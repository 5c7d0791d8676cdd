//! Error type for `phishblock-store-sqlite`.

use phishblock_core::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain-level rejection (duplicate vote, missing report, ...).
  #[error(transparent)]
  Core(#[from] phishblock_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value the domain types cannot represent.
  #[error("corrupt row: {0}")]
  Decode(String),
}

impl DomainError for Error {
  fn domain(&self) -> Option<&phishblock_core::Error> {
    match self {
      Error::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
