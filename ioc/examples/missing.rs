use fibre_scoped_ioc::{Registry, RegistryError};

fn main() {
  let registry: Registry<String> = Registry::new();

  println!("Attempting to resolve a key that was never registered...");
  match registry.resolve("unregistered") {
    Ok(value) => panic!("Should not have resolved, got {:?}", value),
    Err(RegistryError::UnboundKey { key }) => {
      println!("Correctly received an UnboundKey error for '{}'.", key)
    }
  }

  // The non-failing variant simply yields `None`.
  assert!(registry.try_resolve("unregistered").is_none());
  println!("try_resolve returned None as expected.");
}
