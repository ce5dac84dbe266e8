//! Namespaced configuration.
//!
//! Sources are declared as namespace to path pairs. Files are read by
//! extension, directories expand to one namespace per contained file:
//!
//! ```text
//! conf/
//!   app.json        -> app
//!   db.yml          -> db
//!   cache/redis.ini -> cache.redis
//! ```
//!
//! Before a source joins the tree, string values containing
//! `%scheme:argument%` tokens are resolved through the resolver bound to
//! `scheme` (`%env:DB_HOST%` by default). Namespaces are never merged: loading
//! into one that is already in use fails.

mod files;
mod loader;
mod placeholder;
mod registry;
mod tree;

pub use files::{SourceKind, derive_namespace, expand_directory};
pub use loader::{ConfigLoader, ConfigLoaderBuilder};
pub use placeholder::{Token, find_token, interpolated, resolve_placeholders};
pub use registry::{Binding, Factory, Registry};
pub use tree::ConfigTree;
