use fibre_scoped_ioc::{Registry, RegistryError};
use pretty_assertions::assert_eq;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

// --- Test Fixtures ---

// A simple value type for testing.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SimpleService {
  id: u32,
}

// --- Basic Tests ---

#[test]
fn test_register_then_resolve() {
  // Arrange
  let registry = Registry::new();
  registry.register("hello", || "Hello".to_string());

  // Act
  let hello = registry.resolve("hello").unwrap();

  // Assert
  assert_eq!(hello, "Hello");
}

#[test]
fn test_resolution_is_never_memoized() {
  // Arrange
  let calls = Arc::new(AtomicUsize::new(0));
  let registry = Registry::new();
  let counter = Arc::clone(&calls);
  registry.register("service", move || SimpleService {
    id: counter.fetch_add(1, Ordering::SeqCst) as u32,
  });

  // Act
  let first = registry.resolve("service").unwrap();
  let second = registry.resolve("service").unwrap();

  // Assert
  assert_eq!(calls.load(Ordering::SeqCst), 2);
  assert_eq!(first, SimpleService { id: 0 });
  assert_eq!(second, SimpleService { id: 1 });
}

#[test]
fn test_unbound_key_error_names_the_key() {
  let registry: Registry<String> = Registry::new();

  let err = registry.resolve("unknown").unwrap_err();

  assert_eq!(
    err,
    RegistryError::UnboundKey {
      key: "unknown".to_string()
    }
  );
  assert!(err.to_string().contains("unknown"));
  assert_eq!(err.to_string(), "missing key: unknown");
}

#[test]
fn test_overwriting_registration_is_successful() {
  // Arrange
  let registry = Registry::new();
  registry.register("overwrite", || SimpleService { id: 1 });
  assert_eq!(registry.resolve("overwrite").unwrap().id, 1);

  // Act
  registry.register("overwrite", || SimpleService { id: 2 });

  // Assert
  assert_eq!(registry.resolve("overwrite").unwrap().id, 2);
  assert_eq!(registry.global_keys(), vec!["overwrite".to_string()]);
}

#[test]
fn test_register_value_hands_out_clones() {
  let registry = Registry::new();
  registry.register_value("config", SimpleService { id: 7 });

  let a = registry.resolve("config").unwrap();
  let b = registry.resolve("config").unwrap();

  assert_eq!(a, b);
  assert_eq!(a.id, 7);
}

#[test]
fn test_try_resolve_and_is_registered() {
  let calls = Arc::new(AtomicUsize::new(0));
  let registry = Registry::new();
  let counter = Arc::clone(&calls);
  registry.register("present", move || counter.fetch_add(1, Ordering::SeqCst));

  assert!(registry.is_registered("present"));
  assert!(!registry.is_registered("absent"));
  // Checking for a binding does not run its factory.
  assert_eq!(calls.load(Ordering::SeqCst), 0);

  assert_eq!(registry.try_resolve("present"), Some(0));
  assert_eq!(registry.try_resolve("absent"), None);
}

#[test]
fn test_factory_can_resolve_from_same_registry() {
  // Factories run without any lock held, so chaining through the registry
  // must not deadlock.
  let registry = Arc::new(Registry::new());
  registry.register("host", || "db.internal".to_string());

  let inner = Arc::clone(&registry);
  registry.register("url", move || {
    format!("postgres://{}", inner.resolve("host").unwrap())
  });

  assert_eq!(registry.resolve("url").unwrap(), "postgres://db.internal");
}

#[test]
fn test_separate_registries_are_isolated() {
  let first: Registry<u32> = Registry::new();
  let second: Registry<u32> = Registry::new();

  first.register("n", || 1);
  second.push_scope();
  second.register("n", || 2);

  assert_eq!(first.resolve("n").unwrap(), 1);
  assert!(first.current_scope().is_none());
  assert_eq!(second.resolve("n").unwrap(), 2);
  assert_eq!(second.scope_depth(), 1);
  second.clear_scope();
}

#[test]
fn test_builder_configures_registry() {
  let registry = Registry::<u64>::builder()
    .name("counters")
    .capacity(16)
    .shards(4)
    .build()
    .unwrap();
  registry.register("zero", || 0);

  assert_eq!(registry.name(), "counters");
  assert_eq!(registry.resolve("zero").unwrap(), 0);
  assert!(format!("{:?}", registry).contains("counters"));
}
