//! Placeholder resolvers.
//!
//! A resolver turns the argument of a `%scheme:argument%` token into a value.
//! The loader picks a resolver by scheme; see [`default_bindings`].

mod env;

pub use env::EnvResolver;

use crate::config::Binding;
use crate::error::ResolverError;
use serde_json::Value;

/// Turns a placeholder argument into a configuration value.
pub trait Resolver: Send + Sync {
    fn resolve(&self, argument: &str) -> Result<Value, ResolverError>;
}

/// Scheme bindings every loader starts with.
pub fn default_bindings() -> Vec<(&'static str, Binding<dyn Resolver>)> {
    vec![("env", Binding::resolver::<EnvResolver>())]
}
