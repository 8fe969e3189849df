//! Core, non-public data structures for the registry.

use crate::scope::Scope;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A zero-argument factory, invoked once per resolution.
pub(crate) type Factory<T> = Arc<dyn Fn() -> T + Send + Sync>;

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

/// Hands out an id that no other registry in this process will ever use.
pub(crate) fn next_registry_id() -> u64 {
  NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed)
}

thread_local! {
  // Scope stacks of every registry this thread has pushed scopes on, keyed by
  // registry id. The values are `ScopeStack<T>` for the registry's own `T`.
  // Dropped with the thread, which is what cleans up scopes of exited threads.
  static SCOPE_STACKS: RefCell<HashMap<u64, Box<dyn Any>>> = RefCell::new(HashMap::new());
}

/// The nested scopes of one registry on one thread, innermost last.
pub(crate) struct ScopeStack<T: 'static> {
  scopes: Vec<Scope<T>>,
}

impl<T: 'static> ScopeStack<T> {
  fn boxed() -> Box<dyn Any> {
    Box::new(Self { scopes: Vec::new() })
  }

  pub(crate) fn depth(&self) -> usize {
    self.scopes.len()
  }

  pub(crate) fn pop(&mut self) -> Option<Scope<T>> {
    self.scopes.pop()
  }

  pub(crate) fn innermost(&self) -> Option<&Scope<T>> {
    self.scopes.last()
  }

  pub(crate) fn innermost_mut(&mut self) -> Option<&mut Scope<T>> {
    self.scopes.last_mut()
  }

  /// Finds `key` starting from the innermost scope. Returns the factory and
  /// the depth of the scope that holds it.
  pub(crate) fn find(&self, key: &str) -> Option<(Factory<T>, usize)> {
    self
      .scopes
      .iter()
      .enumerate()
      .rev()
      .find_map(|(idx, scope)| scope.factory(key).map(|f| (Arc::clone(f), idx + 1)))
  }
}

/// Runs `f` on this thread's scope stack for `registry_id`, if one exists.
///
/// `f` runs while the thread-local map is borrowed, so it must not call user
/// code. Returns `None` once the thread-local storage is being torn down.
pub(crate) fn with_stack<T: 'static, R>(
  registry_id: u64,
  f: impl FnOnce(&mut ScopeStack<T>) -> R,
) -> Option<R> {
  SCOPE_STACKS
    .try_with(|cell| {
      let mut stacks = cell.borrow_mut();
      stacks
        .get_mut(&registry_id)
        .and_then(|slot| slot.downcast_mut::<ScopeStack<T>>())
        .map(f)
    })
    .ok()
    .flatten()
}

/// Pushes `scope` onto this thread's stack for `registry_id` and returns the
/// new depth.
pub(crate) fn push<T: 'static>(registry_id: u64, scope: Scope<T>) -> usize {
  SCOPE_STACKS.with(|cell| {
    let mut stacks = cell.borrow_mut();
    let slot = stacks
      .entry(registry_id)
      .or_insert_with(ScopeStack::<T>::boxed);
    match slot.downcast_mut::<ScopeStack<T>>() {
      Some(stack) => {
        stack.scopes.push(scope);
        stack.depth()
      }
      // A registry id is bound to exactly one `Registry<T>`.
      None => unreachable!("scope stack {} holds another value type", registry_id),
    }
  })
}

/// Removes the scopes above `depth` and returns them, so the caller can drop
/// them outside of the thread-local borrow.
pub(crate) fn truncate<T: 'static>(registry_id: u64, depth: usize) -> Vec<Scope<T>> {
  let removed = with_stack::<T, _>(registry_id, |stack| {
    if depth < stack.scopes.len() {
      stack.scopes.split_off(depth)
    } else {
      Vec::new()
    }
  })
  .unwrap_or_default();
  if depth == 0 {
    // An empty stack carries no state; drop the slot with it.
    drop(take(registry_id));
  }
  removed
}

/// Removes this thread's whole stack for `registry_id`.
///
/// The stack is handed back type-erased; the caller drops it after the
/// thread-local borrow has ended.
pub(crate) fn take(registry_id: u64) -> Option<Box<dyn Any>> {
  SCOPE_STACKS
    .try_with(|cell| cell.borrow_mut().remove(&registry_id))
    .ok()
    .flatten()
}

/// The position a resolution was satisfied from.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Level {
  Scope(usize),
  Global,
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Level::Scope(depth) => write!(f, "scope({})", depth),
      Level::Global => f.write_str("global"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn registry_ids_are_unique() {
    let a = next_registry_id();
    let b = next_registry_id();
    assert_ne!(a, b);
  }

  #[test]
  fn find_prefers_innermost_scope() {
    let id = next_registry_id();
    push(id, Scope::new().bind("k", || "outer").bind("only_outer", || "o"));
    push(id, Scope::new().bind("k", || "inner"));

    let found = with_stack::<&'static str, _>(id, |stack| {
      let (f, depth) = stack.find("k")?;
      Some((f(), depth))
    })
    .flatten();
    assert_eq!(found, Some(("inner", 2)));

    let found = with_stack::<&'static str, _>(id, |stack| stack.find("only_outer").map(|(f, d)| (f(), d)))
      .flatten();
    assert_eq!(found, Some(("o", 1)));

    drop(truncate::<&'static str>(id, 0));
    assert!(with_stack::<&'static str, _>(id, |stack| stack.depth()).is_none());
  }

  #[test]
  fn truncate_keeps_lower_levels() {
    let id = next_registry_id();
    push::<u32>(id, Scope::new());
    push::<u32>(id, Scope::new());
    push::<u32>(id, Scope::new());

    let removed = truncate::<u32>(id, 1);
    assert_eq!(removed.len(), 2);
    assert_eq!(with_stack::<u32, _>(id, |stack| stack.depth()), Some(1));
    drop(take(id));
  }
}
