//! Namespaced configuration loader.
//!
//! Sources are read by extension, their placeholders resolved, and the result
//! inserted into the aggregate tree under a namespace that may not already be
//! in use.

use super::files::{self, SourceKind};
use super::placeholder::{Token, resolve_placeholders};
use super::registry::{Binding, Factory, Registry};
use super::tree::ConfigTree;
use crate::error::{BindingKind, ConfigError, Error, type_name};
use crate::readers::{self, Reader};
use crate::resolvers::{self, Resolver};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Loads configuration sources into one namespaced tree.
pub struct ConfigLoader {
    tree: ConfigTree,
    /// Paths already extracted by `get`.
    cache: RefCell<HashMap<String, Value>>,
    readers: Registry<dyn Reader>,
    resolvers: Registry<dyn Resolver>,
    factory: Option<Arc<dyn Factory>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// An empty loader with the default reader and resolver bindings.
    pub fn new() -> Self {
        let mut loader = Self::bare();
        for (name, binding) in readers::default_bindings() {
            loader.readers.insert(name, binding);
        }
        for (name, binding) in resolvers::default_bindings() {
            loader.resolvers.insert(name, binding);
        }
        loader
    }

    fn bare() -> Self {
        Self {
            tree: ConfigTree::new(),
            cache: RefCell::new(HashMap::new()),
            readers: Registry::new(BindingKind::Reader),
            resolvers: Registry::new(BindingKind::Resolver),
            factory: None,
        }
    }

    /// Start a [`ConfigLoaderBuilder`].
    pub fn builder() -> ConfigLoaderBuilder {
        ConfigLoaderBuilder::default()
    }

    /// Load `(namespace, path)` pairs in order.
    ///
    /// Entries before a failing one stay merged.
    pub fn load<I, N, P>(&mut self, sources: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (N, P)>,
        N: AsRef<str>,
        P: AsRef<Path>,
    {
        let mut added = 0;
        for (namespace, path) in sources {
            added += self.load_entry(namespace.as_ref(), path.as_ref())?;
        }
        debug!(added, "configuration load complete");
        Ok(())
    }

    /// Load untyped declarations: an object of namespace to path, an array
    /// whose indices act as namespaces, or null.
    pub fn load_declarations(&mut self, declarations: &Value) -> Result<(), Error> {
        let entries: Vec<(String, &Value)> = match declarations {
            Value::Null => Vec::new(),
            Value::Object(map) => map.iter().map(|(key, value)| (key.clone(), value)).collect(),
            Value::Array(list) => list
                .iter()
                .enumerate()
                .map(|(index, value)| (index.to_string(), value))
                .collect(),
            other => {
                return Err(ConfigError::InvalidSource {
                    namespace: String::new(),
                    found: type_name(other),
                }
                .into());
            }
        };

        let mut added = 0;
        for (namespace, source) in entries {
            if self.tree.contains(&namespace) {
                return Err(ConfigError::NamespaceInUse(namespace).into());
            }
            let Value::String(path) = source else {
                return Err(ConfigError::InvalidSource {
                    namespace,
                    found: type_name(source),
                }
                .into());
            };
            added += self.load_entry(&namespace, Path::new(path))?;
        }
        debug!(added, "configuration load complete");
        Ok(())
    }

    fn load_entry(&mut self, namespace: &str, path: &Path) -> Result<usize, Error> {
        if self.tree.contains(namespace) {
            return Err(ConfigError::NamespaceInUse(namespace.to_string()).into());
        }

        match SourceKind::of(path)? {
            SourceKind::File => {
                self.load_file(namespace, path)?;
                Ok(1)
            }
            SourceKind::Directory => {
                files::ensure_readable(path)?;
                let found = files::expand_directory(path)?;
                debug!(directory = %path.display(), files = found.len(), "expanding directory source");
                for (derived, file) in &found {
                    self.load_file(derived, file)?;
                }
                Ok(found.len())
            }
        }
    }

    fn load_file(&mut self, namespace: &str, path: &Path) -> Result<(), Error> {
        if self.tree.contains(namespace) {
            return Err(ConfigError::NamespaceInUse(namespace.to_string()).into());
        }
        files::ensure_readable(path)?;

        let extension = files::extension(path);
        let factory = self.factory.as_deref();
        let reader = self
            .readers
            .instance(&extension, |binding| build_reader(factory, &extension, binding))?
            .ok_or_else(|| ConfigError::UnknownExtension(extension.clone()))?;
        let mut content = Value::Object(reader.read(path)?);

        let resolvers = &mut self.resolvers;
        resolve_placeholders(&mut content, &mut |token: &Token<'_>| -> Result<Option<Value>, Error> {
            let resolver = resolvers.instance(token.scheme, |binding| {
                build_resolver(factory, token.scheme, binding)
            })?;
            match resolver {
                Some(resolver) => Ok(Some(resolver.resolve(token.argument)?)),
                None => Ok(None),
            }
        })?;

        self.tree.insert_namespace(namespace, content)?;
        debug!(namespace, path = %path.display(), extension = %extension, "loaded configuration file");
        Ok(())
    }

    /// Value at a dotted path. Missing segments and null values are `None`.
    pub fn get(&self, path: &str) -> Option<Value> {
        if let Some(hit) = self.cache.borrow().get(path) {
            return Some(hit.clone());
        }

        let value = self.tree.extract(path)?.clone();
        self.cache.borrow_mut().insert(path.to_string(), value.clone());
        Some(value)
    }

    /// Value at `path`, or `default` when absent. Defaults are not cached.
    pub fn get_or(&self, path: &str, default: impl Into<Value>) -> Value {
        self.get(path).unwrap_or_else(|| default.into())
    }

    /// Deserialize the value at `path`.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ConfigError> {
        self.get(path)
            .map(|value| {
                serde_json::from_value(value).map_err(|source| ConfigError::Decode {
                    path: path.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Whether a non-null value lives at `path`.
    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Whether `path` has been served from or stored in the lookup cache.
    pub fn is_cached(&self, path: &str) -> bool {
        self.cache.borrow().contains_key(path)
    }

    /// Number of cached lookups.
    pub fn cached_len(&self) -> usize {
        self.cache.borrow().len()
    }

    /// The loaded tree, keyed by namespace.
    pub fn items(&self) -> &Map<String, Value> {
        self.tree.items()
    }

    /// Consume the loader, keeping only the tree.
    pub fn into_items(self) -> Map<String, Value> {
        self.tree.into_items()
    }

    /// Replace the whole tree and forget every cached lookup.
    pub fn set_items(&mut self, items: Map<String, Value>) {
        self.tree = ConfigTree::from_items(items);
        self.cache.get_mut().clear();
    }

    /// Bind a reader to a file extension. See [`Registry::add`].
    pub fn add_reader(&mut self, name: impl Into<String>, binding: Binding<dyn Reader>, force: bool) -> Result<(), ConfigError> {
        self.readers.add(name, binding, force)
    }

    /// Bind a resolver to a placeholder scheme. See [`Registry::add`].
    pub fn add_resolver(&mut self, name: impl Into<String>, binding: Binding<dyn Resolver>, force: bool) -> Result<(), ConfigError> {
        self.resolvers.add(name, binding, force)
    }

    /// (extension, implementation id) pairs.
    pub fn readers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.readers.bindings()
    }

    /// (scheme, implementation id) pairs.
    pub fn resolvers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.resolvers.bindings()
    }

    /// Route construction of not yet built readers and resolvers through
    /// `factory`. Instances built earlier are kept.
    pub fn set_factory(&mut self, factory: Arc<dyn Factory>) {
        self.factory = Some(factory);
    }

    /// Builder-style [`set_factory`](Self::set_factory).
    pub fn with_factory(mut self, factory: Arc<dyn Factory>) -> Self {
        self.set_factory(factory);
        self
    }
}

fn build_reader(factory: Option<&dyn Factory>, name: &str, binding: &Binding<dyn Reader>) -> Result<Box<dyn Reader>, ConfigError> {
    match factory {
        None => Ok(binding.construct()),
        Some(factory) => factory
            .build_reader(binding.id())
            .ok_or_else(|| factory_miss(BindingKind::Reader, name, binding.id())),
    }
}

fn build_resolver(factory: Option<&dyn Factory>, name: &str, binding: &Binding<dyn Resolver>) -> Result<Box<dyn Resolver>, ConfigError> {
    match factory {
        None => Ok(binding.construct()),
        Some(factory) => factory
            .build_resolver(binding.id())
            .ok_or_else(|| factory_miss(BindingKind::Resolver, name, binding.id())),
    }
}

fn factory_miss(kind: BindingKind, name: &str, id: &str) -> ConfigError {
    ConfigError::FactoryMiss {
        kind,
        name: name.to_string(),
        id: id.to_string(),
    }
}

impl fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("tree", &self.tree)
            .field("cached", &self.cache.borrow().len())
            .field("readers", &self.readers)
            .field("resolvers", &self.resolvers)
            .field("factory", &self.factory.is_some())
            .finish()
    }
}

/// Registrations, factory and initial sources for a new [`ConfigLoader`].
///
/// Readers and resolvers are added on top of the defaults; reusing a name
/// fails in [`build`](Self::build) just as `add_*` without force does.
#[derive(Default)]
pub struct ConfigLoaderBuilder {
    readers: Vec<(String, Binding<dyn Reader>)>,
    resolvers: Vec<(String, Binding<dyn Resolver>)>,
    factory: Option<Arc<dyn Factory>>,
    sources: Vec<(String, PathBuf)>,
}

impl ConfigLoaderBuilder {
    /// Add a reader binding for an extension.
    pub fn reader(mut self, name: impl Into<String>, binding: Binding<dyn Reader>) -> Self {
        self.readers.push((name.into(), binding));
        self
    }

    /// Add a resolver binding for a scheme.
    pub fn resolver(mut self, name: impl Into<String>, binding: Binding<dyn Resolver>) -> Self {
        self.resolvers.push((name.into(), binding));
        self
    }

    /// Construct readers and resolvers through `factory`.
    pub fn factory(mut self, factory: Arc<dyn Factory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Queue one source to load on build.
    pub fn source(mut self, namespace: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.sources.push((namespace.into(), path.into()));
        self
    }

    /// Queue several sources to load on build.
    pub fn sources<I, N, P>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: Into<PathBuf>,
    {
        self.sources
            .extend(sources.into_iter().map(|(namespace, path)| (namespace.into(), path.into())));
        self
    }

    /// Apply registrations, then load the sources.
    pub fn build(self) -> Result<ConfigLoader, Error> {
        let mut loader = ConfigLoader::new();
        for (name, binding) in self.readers {
            loader.add_reader(name, binding, false)?;
        }
        for (name, binding) in self.resolvers {
            loader.add_resolver(name, binding, false)?;
        }
        if let Some(factory) = self.factory {
            loader.set_factory(factory);
        }
        if !self.sources.is_empty() {
            loader.load(self.sources)?;
        }
        Ok(loader)
    }
}
