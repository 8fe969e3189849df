use fibre_scoped_ioc::Registry;
use std::thread;

fn main() {
  let registry: Registry<String> = Registry::new();
  registry.register("locale", || "en-US".to_string());

  thread::scope(|s| {
    for locale in ["de-DE", "fr-FR"] {
      let registry = &registry;
      s.spawn(move || {
        registry.with_scope(|| {
          registry.register("locale", move || locale.to_string());
          println!(
            "{:?} sees locale {}",
            thread::current().id(),
            registry.resolve("locale").unwrap()
          );
        })
      });
    }
  });

  // Overrides made on the worker threads never reached this thread.
  println!("main sees locale {}", registry.resolve("locale").unwrap());
  assert_eq!(registry.resolve("locale").unwrap(), "en-US");
}
