//! Thread-bound override mappings and the handles used to manage them.

use crate::core::Factory;
use crate::registry::Registry;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A set of bindings that shadows the global table on one thread.
///
/// A `Scope` can be filled up front and installed with
/// [`Registry::set_scope`], or created empty by [`Registry::push_scope`] and
/// filled through [`Registry::register`] while it is the innermost scope.
pub struct Scope<T: 'static> {
  bindings: HashMap<String, Factory<T>>,
}

impl<T: 'static> Default for Scope<T> {
  fn default() -> Self {
    Self {
      bindings: HashMap::new(),
    }
  }
}

impl<T: 'static> Scope<T> {
  /// Creates a new, empty `Scope`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a binding and returns the scope, for building scopes inline.
  pub fn bind<F>(mut self, key: impl Into<String>, factory: F) -> Self
  where
    F: Fn() -> T + Send + Sync + 'static,
  {
    self.insert(key, factory);
    self
  }

  /// Binds `key` in this scope, replacing any previous binding for it.
  pub fn insert<F>(&mut self, key: impl Into<String>, factory: F)
  where
    F: Fn() -> T + Send + Sync + 'static,
  {
    self.insert_factory(key.into(), Arc::new(factory));
  }

  pub fn contains(&self, key: &str) -> bool {
    self.bindings.contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.bindings.len()
  }

  pub fn is_empty(&self) -> bool {
    self.bindings.is_empty()
  }

  /// Keys bound in this scope, in no particular order.
  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.bindings.keys().map(String::as_str)
  }

  pub(crate) fn insert_factory(&mut self, key: String, factory: Factory<T>) -> Option<Factory<T>> {
    self.bindings.insert(key, factory)
  }

  pub(crate) fn factory(&self, key: &str) -> Option<&Factory<T>> {
    self.bindings.get(key)
  }

  pub(crate) fn snapshot(&self, depth: usize) -> ScopeSnapshot {
    ScopeSnapshot {
      depth,
      keys: self.bindings.keys().cloned().collect(),
    }
  }
}

impl<T: 'static> fmt::Debug for Scope<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Scope")
      .field("keys", &self.bindings.keys().collect::<Vec<_>>())
      .finish()
  }
}

/// A read-only view of the innermost scope on the calling thread.
///
/// Returned by [`Registry::current_scope`]. It records which keys the scope
/// binds without exposing the factories themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeSnapshot {
  depth: usize,
  keys: Vec<String>,
}

impl ScopeSnapshot {
  /// Nesting level of the scope, starting at 1 for the outermost scope.
  pub fn depth(&self) -> usize {
    self.depth
  }

  /// Keys bound in the scope, in no particular order.
  pub fn keys(&self) -> &[String] {
    &self.keys
  }

  pub fn contains(&self, key: &str) -> bool {
    self.keys.iter().any(|k| k == key)
  }
}

/// An RAII guard for a scope pushed with [`Registry::enter_scope`].
///
/// When dropped, it removes the scope it pushed along with any scope that was
/// pushed above it and not removed. This also happens while unwinding, so a
/// panicking task cannot leave its overrides behind on a pooled thread.
///
/// The guard is tied to the thread that created it and cannot be sent to
/// another thread.
#[must_use = "the scope is removed as soon as the guard is dropped"]
pub struct ScopeGuard<'r, T: 'static> {
  registry: &'r Registry<T>,
  depth: usize,
  _thread_bound: PhantomData<*const ()>,
}

impl<'r, T: 'static> ScopeGuard<'r, T> {
  pub(crate) fn new(registry: &'r Registry<T>, depth: usize) -> Self {
    Self {
      registry,
      depth,
      _thread_bound: PhantomData,
    }
  }

  /// Nesting level of the guarded scope.
  pub fn depth(&self) -> usize {
    self.depth
  }
}

impl<T: 'static> Drop for ScopeGuard<'_, T> {
  fn drop(&mut self) {
    self.registry.unwind_to(self.depth - 1);
  }
}

impl<T: 'static> fmt::Debug for ScopeGuard<'_, T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ScopeGuard")
      .field("registry", &self.registry.name())
      .field("depth", &self.depth)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bind_and_insert_overwrite_per_key() {
    let mut scope = Scope::new().bind("a", || 1).bind("b", || 2);
    scope.insert("a", || 10);

    assert_eq!(scope.len(), 2);
    assert!(scope.contains("a"));
    assert!(!scope.contains("c"));
    assert_eq!(scope.factory("a").map(|f| f()), Some(10));
  }

  #[test]
  fn snapshot_lists_keys() {
    let scope: Scope<u8> = Scope::new().bind("only", || 0);
    let snapshot = scope.snapshot(3);

    assert_eq!(snapshot.depth(), 3);
    assert_eq!(snapshot.keys(), ["only".to_string()]);
    assert!(snapshot.contains("only"));
  }
}
