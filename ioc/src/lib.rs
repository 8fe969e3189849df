//! # Fibre Scoped IoC
//!
//! A string-keyed Inversion of Control (IoC) registry with nested, thread-bound
//! override scopes.
//!
//! Factories are registered under string keys in a global table that every
//! thread shares. Any thread can then push scopes that shadow some of those
//! keys for itself only, without touching other threads or outer scopes.
//!
//! ## Core Concepts
//!
//! - **Registry**: owns the global table and resolves keys.
//! - **Scope**: a thread-local override mapping. Scopes nest; the innermost
//!   one wins, keys it does not bind fall through to outer scopes, then to the
//!   global table.
//! - **Resolution**: runs the winning factory once per call. Nothing is cached.
//! - **ScopeGuard**: removes a scope again when dropped, including on panic.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_scoped_ioc::Registry;
//!
//! let registry: Registry<String> = Registry::new();
//! registry.register("greeting", || "Hello, Parent!".to_string());
//!
//! registry.with_scope(|| {
//!   // Registered into the scope, visible to this thread only.
//!   registry.register("greeting", || "Hello, Child!".to_string());
//!   assert_eq!(registry.resolve("greeting").unwrap(), "Hello, Child!");
//! });
//!
//! assert_eq!(registry.resolve("greeting").unwrap(), "Hello, Parent!");
//! assert!(registry.resolve("unknown").is_err());
//! ```

mod builder;
mod core;
mod error;
mod registry;
mod scope;

pub use builder::RegistryBuilder;
pub use error::{BuildError, RegistryError, Result};
pub use registry::Registry;
pub use scope::{Scope, ScopeGuard, ScopeSnapshot};
