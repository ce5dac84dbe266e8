//! Namespaced configuration loading.
//!
//! Configuration fragments in several file formats are merged into one tree,
//! each under its own namespace, with `%scheme:argument%` placeholders
//! resolved on the way in:
//!
//! ```no_run
//! use nsconfig::ConfigLoader;
//!
//! let mut loader = ConfigLoader::new();
//! loader.load([("db", "conf/db.yml"), ("app", "conf/app.json")])?;
//!
//! let host = loader.get_or("db.host", "localhost");
//! let debug = loader.has("app.debug");
//! # Ok::<(), nsconfig::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod readers;
pub mod resolvers;

pub use config::{Binding, ConfigLoader, ConfigLoaderBuilder, Factory};
pub use error::{ConfigError, Error, ReaderError, ResolverError, Result};
pub use readers::Reader;
pub use resolvers::Resolver;
