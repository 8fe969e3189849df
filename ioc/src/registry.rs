//! The main `Registry` struct and its associated methods.

use crate::builder::RegistryBuilder;
use crate::core::{self, Factory, Level};
use crate::error::{RegistryError, Result};
use crate::scope::{Scope, ScopeGuard, ScopeSnapshot};
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// A string-keyed registry of factories with thread-bound override scopes.
///
/// Bindings registered while the calling thread has no active scope go to the
/// global table, which every thread sees. A thread can push scopes on top of
/// the global table; bindings registered while a scope is active go to the
/// innermost one and are visible only to that thread.
///
/// The registry never caches: every successful [`resolve`](Self::resolve) runs
/// the winning factory once and returns what it produced.
pub struct Registry<T: 'static> {
  id: u64,
  name: String,
  bindings: DashMap<String, Factory<T>>,
}

impl<T: 'static> Default for Registry<T> {
  fn default() -> Self {
    Self::from_parts(RegistryBuilder::<T>::DEFAULT_NAME.to_owned(), DashMap::new())
  }
}

impl<T: 'static> Registry<T> {
  /// Creates a new, empty `Registry`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns a builder for configuring a `Registry`.
  pub fn builder() -> RegistryBuilder<T> {
    RegistryBuilder::new()
  }

  pub(crate) fn from_parts(name: String, bindings: DashMap<String, Factory<T>>) -> Self {
    Self {
      id: core::next_registry_id(),
      name,
      bindings,
    }
  }

  /// The diagnostic name given at construction.
  pub fn name(&self) -> &str {
    &self.name
  }

  // --- PRIVATE HELPERS ---

  fn bind(&self, key: String, factory: Factory<T>) {
    let mut binding = Some((key, factory));
    // The replaced factory, if any, is dropped after the thread-local borrow.
    let _replaced = core::with_stack::<T, _>(self.id, |stack| {
      let depth = stack.depth();
      let scope = stack.innermost_mut()?;
      let (key, factory) = binding.take()?;
      trace!(registry = %self.name, key = %key, depth, "binding registered in scope");
      scope.insert_factory(key, factory)
    });

    if let Some((key, factory)) = binding {
      debug!(registry = %self.name, key = %key, "binding registered globally");
      self.bindings.insert(key, factory);
    }
  }

  fn lookup(&self, key: &str) -> Option<(Factory<T>, Level)> {
    let scoped = core::with_stack::<T, _>(self.id, |stack| stack.find(key)).flatten();
    if let Some((factory, depth)) = scoped {
      return Some((factory, Level::Scope(depth)));
    }
    self
      .bindings
      .get(key)
      .map(|entry| (Arc::clone(entry.value()), Level::Global))
  }

  pub(crate) fn unwind_to(&self, depth: usize) {
    let removed = core::truncate::<T>(self.id, depth);
    if !removed.is_empty() {
      debug!(registry = %self.name, removed = removed.len(), depth, "scopes unwound");
    }
  }

  // --- PUBLIC API ---

  // --- Registration ---

  /// Binds `key` to `factory`.
  ///
  /// If the calling thread has an active scope, the binding goes into the
  /// innermost scope and replaces only that scope's binding for `key`.
  /// Otherwise it goes into the global table.
  pub fn register<F>(&self, key: impl Into<String>, factory: F)
  where
    F: Fn() -> T + Send + Sync + 'static,
  {
    self.bind(key.into(), Arc::new(factory));
  }

  /// Binds `key` to a clone of `value`, with the same placement rules as
  /// [`register`](Self::register).
  pub fn register_value(&self, key: impl Into<String>, value: T)
  where
    T: Clone + Send + Sync,
  {
    self.bind(key.into(), Arc::new(move || value.clone()));
  }

  /// Binds `key` in the global table, even when the calling thread has an
  /// active scope.
  pub fn register_global<F>(&self, key: impl Into<String>, factory: F)
  where
    F: Fn() -> T + Send + Sync + 'static,
  {
    let key = key.into();
    debug!(registry = %self.name, key = %key, "binding registered globally");
    self.bindings.insert(key, Arc::new(factory));
  }

  // --- Resolution ---

  /// Produces a value for `key`.
  ///
  /// The calling thread's scopes are searched from innermost to outermost,
  /// then the global table. The factory runs with no lock held, so it may use
  /// this registry itself.
  ///
  /// # Errors
  ///
  /// Returns [`RegistryError::UnboundKey`] if no scope and no global binding
  /// holds `key`.
  pub fn resolve(&self, key: &str) -> Result<T> {
    let Some((factory, level)) = self.lookup(key) else {
      debug!(registry = %self.name, key, "resolution failed, key is unbound");
      return Err(RegistryError::unbound(key));
    };
    trace!(registry = %self.name, key, source = %level, "resolving");
    Ok(factory())
  }

  /// Like [`resolve`](Self::resolve), but returns `None` for an unbound key.
  pub fn try_resolve(&self, key: &str) -> Option<T> {
    self.lookup(key).map(|(factory, _)| factory())
  }

  /// Whether `key` would resolve on the calling thread. No factory is run.
  pub fn is_registered(&self, key: &str) -> bool {
    self.lookup(key).is_some()
  }

  /// Keys bound in the global table, in no particular order.
  pub fn global_keys(&self) -> Vec<String> {
    self.bindings.iter().map(|entry| entry.key().clone()).collect()
  }

  // --- Scopes ---

  /// Pushes an empty scope for the calling thread and returns the new depth.
  pub fn push_scope(&self) -> usize {
    self.set_scope(Scope::new())
  }

  /// Pushes `scope` as the calling thread's innermost scope and returns the
  /// new depth.
  pub fn set_scope(&self, scope: Scope<T>) -> usize {
    let keys = scope.len();
    let depth = core::push(self.id, scope);
    debug!(registry = %self.name, depth, keys, "scope pushed");
    depth
  }

  /// Pushes an empty scope that is removed again when the guard is dropped.
  pub fn enter_scope(&self) -> ScopeGuard<'_, T> {
    ScopeGuard::new(self, self.push_scope())
  }

  /// Runs `f` inside a fresh scope. The scope, and anything `f` pushed on top
  /// of it, is gone when this returns or unwinds.
  pub fn with_scope<R>(&self, f: impl FnOnce() -> R) -> R {
    let _guard = self.enter_scope();
    f()
  }

  /// Removes the calling thread's innermost scope and returns it.
  pub fn pop_scope(&self) -> Option<Scope<T>> {
    let popped = core::with_stack::<T, _>(self.id, |stack| stack.pop()).flatten();
    if popped.is_some() {
      let depth = self.scope_depth();
      if depth == 0 {
        drop(core::take(self.id));
      }
      debug!(registry = %self.name, depth, "scope popped");
    }
    popped
  }

  /// Removes every scope of the calling thread. Resolution on this thread then
  /// sees only the global table.
  pub fn clear_scope(&self) {
    if let Some(stack) = core::take(self.id) {
      debug!(registry = %self.name, "scopes cleared");
      drop(stack);
    }
  }

  /// Describes the calling thread's innermost scope, or `None` if it has none.
  pub fn current_scope(&self) -> Option<ScopeSnapshot> {
    core::with_stack::<T, _>(self.id, |stack| {
      let depth = stack.depth();
      stack.innermost().map(|scope| scope.snapshot(depth))
    })
    .flatten()
  }

  /// Number of scopes active on the calling thread.
  pub fn scope_depth(&self) -> usize {
    core::with_stack::<T, _>(self.id, |stack| stack.depth()).unwrap_or(0)
  }
}

impl<T: 'static> Drop for Registry<T> {
  fn drop(&mut self) {
    // Only the dropping thread's stack is reachable here. Stacks on other
    // threads are keyed by an id that is never handed out again.
    drop(core::take(self.id));
  }
}

impl<T: 'static> fmt::Debug for Registry<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Registry")
      .field("name", &self.name)
      .field("global_bindings", &self.bindings.len())
      .finish_non_exhaustive()
  }
}
