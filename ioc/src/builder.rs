use crate::core::Factory;
use crate::error::BuildError;
use crate::registry::Registry;

use std::fmt;
use std::marker::PhantomData;

use dashmap::DashMap;

/// A builder for creating `Registry` instances.
pub struct RegistryBuilder<T: 'static> {
  name: String,
  capacity: usize,
  shards: Option<usize>,
  _value_marker: PhantomData<fn() -> T>,
}

impl<T: 'static> fmt::Debug for RegistryBuilder<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RegistryBuilder")
      .field("name", &self.name)
      .field("capacity", &self.capacity)
      .field("shards", &self.shards)
      .finish()
  }
}

impl<T: 'static> Default for RegistryBuilder<T> {
  fn default() -> Self {
    Self {
      name: Self::DEFAULT_NAME.to_owned(),
      capacity: 0,
      shards: None,
      _value_marker: PhantomData,
    }
  }
}

impl<T: 'static> RegistryBuilder<T> {
  pub(crate) const DEFAULT_NAME: &'static str = "registry";

  /// Creates a new builder with default settings.
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets the name attached to the registry's log events and `Debug` output.
  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = name.into();
    self
  }

  /// Sets the initial capacity of the global table.
  pub fn capacity(mut self, capacity: usize) -> Self {
    self.capacity = capacity;
    self
  }

  /// Sets the number of shards of the global table.
  ///
  /// Must be a power of two greater than one. By default the shard count is
  /// derived from the number of available CPUs.
  pub fn shards(mut self, shards: usize) -> Self {
    self.shards = Some(shards);
    self
  }

  /// Builds the `Registry`.
  pub fn build(self) -> Result<Registry<T>, BuildError> {
    let bindings: DashMap<String, Factory<T>> = match self.shards {
      Some(shards) if shards < 2 || !shards.is_power_of_two() => {
        return Err(BuildError::InvalidShardCount(shards));
      }
      Some(shards) => DashMap::with_capacity_and_shard_amount(self.capacity, shards),
      None => DashMap::with_capacity(self.capacity),
    };
    Ok(Registry::from_parts(self.name, bindings))
  }
}
