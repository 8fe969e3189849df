use fibre_scoped_ioc::{Registry, Scope};

fn main() {
  let registry: Registry<&'static str> = Registry::new();
  registry.register("database", || "postgres://prod");
  registry.register("mailer", || "smtp://prod");

  // An outer scope, e.g. for an integration test run.
  registry.set_scope(Scope::new().bind("database", || "postgres://test"));

  {
    // An inner scope for a single test case.
    let _case = registry.enter_scope();
    registry.register("mailer", || "memory://outbox");

    println!("inner database: {}", registry.resolve("database").unwrap());
    println!("inner mailer:   {}", registry.resolve("mailer").unwrap());
    assert_eq!(registry.resolve("mailer").unwrap(), "memory://outbox");
  }

  // The guard removed the inner scope; the outer override is still active.
  println!("outer mailer:   {}", registry.resolve("mailer").unwrap());
  assert_eq!(registry.resolve("database").unwrap(), "postgres://test");

  registry.clear_scope();
  println!("global database: {}", registry.resolve("database").unwrap());
  assert!(registry.current_scope().is_none());
}
