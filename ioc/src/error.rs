//! Error types returned by the registry and its builder.

use std::fmt;

/// Errors that can occur while resolving a key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
  /// No active scope on the calling thread and no global binding holds the key.
  #[error("missing key: {key}")]
  UnboundKey { key: String },
}

impl RegistryError {
  pub(crate) fn unbound(key: &str) -> Self {
    RegistryError::UnboundKey {
      key: key.to_owned(),
    }
  }

  /// The key that failed to resolve.
  pub fn key(&self) -> &str {
    match self {
      RegistryError::UnboundKey { key } => key,
    }
  }
}

/// A specialized `Result` for registry operations.
pub type Result<T, E = RegistryError> = std::result::Result<T, E>;

/// Errors that can occur when building a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
  /// The global table was configured with a shard count that is not a power
  /// of two greater than one.
  InvalidShardCount(usize),
}

impl fmt::Display for BuildError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BuildError::InvalidShardCount(shards) => write!(
        f,
        "shard count must be a power of two greater than one, got {}",
        shards
      ),
    }
  }
}

impl std::error::Error for BuildError {}
