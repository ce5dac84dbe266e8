//! Named bindings for readers and resolvers.
//!
//! A [`Binding`] pairs an implementation id with a constructor. Instances are
//! built on first lookup and cached by name for the life of the registry.
//! When a [`Factory`] is installed on the loader, construction goes through it
//! by implementation id instead.

use crate::error::{BindingKind, ConfigError};
use crate::readers::Reader;
use crate::resolvers::Resolver;
use std::any::type_name;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type Constructor<T> = Arc<dyn Fn() -> Box<T> + Send + Sync>;

/// An implementation id plus the means to build it.
pub struct Binding<T: ?Sized> {
    id: String,
    construct: Constructor<T>,
}

impl<T: ?Sized> Binding<T> {
    pub fn new(id: impl Into<String>, construct: impl Fn() -> Box<T> + Send + Sync + 'static) -> Self {
        Self {
            id: id.into(),
            construct: Arc::new(construct),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn construct(&self) -> Box<T> {
        (self.construct)()
    }
}

impl Binding<dyn Reader> {
    /// Bind a default-constructible reader under its type name.
    pub fn reader<R: Reader + Default + 'static>() -> Self {
        Self::new(type_name::<R>(), || -> Box<dyn Reader> { Box::new(R::default()) })
    }
}

impl Binding<dyn Resolver> {
    /// Bind a default-constructible resolver under its type name.
    pub fn resolver<R: Resolver + Default + 'static>() -> Self {
        Self::new(type_name::<R>(), || -> Box<dyn Resolver> { Box::new(R::default()) })
    }
}

impl<T: ?Sized> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            construct: Arc::clone(&self.construct),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding").field("id", &self.id).finish_non_exhaustive()
    }
}

/// External object construction, keyed by implementation id.
///
/// Returning `None` means the factory does not know the id; the loader
/// reports that as [`ConfigError::FactoryMiss`].
pub trait Factory: Send + Sync {
    fn build_reader(&self, id: &str) -> Option<Box<dyn Reader>>;

    fn build_resolver(&self, id: &str) -> Option<Box<dyn Resolver>>;
}

/// Name to binding table with a lazily filled instance cache.
pub struct Registry<T: ?Sized> {
    kind: BindingKind,
    bindings: BTreeMap<String, Binding<T>>,
    instances: HashMap<String, Box<T>>,
}

impl<T: ?Sized> Registry<T> {
    pub fn new(kind: BindingKind) -> Self {
        Self {
            kind,
            bindings: BTreeMap::new(),
            instances: HashMap::new(),
        }
    }

    /// Register `binding` under `name`.
    ///
    /// Fails if the name is taken and `force` is false. Forcing over an
    /// existing name drops any instance already built for it.
    pub fn add(&mut self, name: impl Into<String>, binding: Binding<T>, force: bool) -> Result<(), ConfigError> {
        let name = name.into();
        if !force && self.bindings.contains_key(&name) {
            return Err(ConfigError::AlreadyRegistered {
                kind: self.kind,
                name,
            });
        }

        self.insert(name, binding);
        Ok(())
    }

    /// Bind `name`, replacing any existing binding and its cached instance.
    pub fn insert(&mut self, name: impl Into<String>, binding: Binding<T>) {
        let name = name.into();
        if self.instances.remove(&name).is_some() {
            debug!(kind = %self.kind, name = %name, "discarding cached instance for rebound name");
        }
        self.bindings.insert(name, binding);
    }

    pub fn binding(&self, name: &str) -> Option<&Binding<T>> {
        self.bindings.get(name)
    }

    /// (name, implementation id) pairs in name order.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings
            .iter()
            .map(|(name, binding)| (name.as_str(), binding.id()))
    }

    pub fn is_instantiated(&self, name: &str) -> bool {
        self.instances.contains_key(name)
    }

    /// Look up the instance for `name`, building it with `build` on first use.
    ///
    /// `Ok(None)` means nothing is bound under `name`.
    pub fn instance<F>(&mut self, name: &str, build: F) -> Result<Option<&T>, ConfigError>
    where
        F: FnOnce(&Binding<T>) -> Result<Box<T>, ConfigError>,
    {
        if !self.instances.contains_key(name) {
            let Some(binding) = self.bindings.get(name) else {
                return Ok(None);
            };
            let instance = build(binding)?;
            debug!(kind = %self.kind, name, id = binding.id(), "instantiated binding");
            self.instances.insert(name.to_string(), instance);
        }

        Ok(self.instances.get(name).map(|instance| &**instance))
    }
}

impl<T: ?Sized> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &self.kind)
            .field("bindings", &self.bindings)
            .field("instantiated", &self.instances.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolverError;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Upper;

    impl Resolver for Upper {
        fn resolve(&self, argument: &str) -> Result<Value, ResolverError> {
            Ok(Value::String(argument.to_uppercase()))
        }
    }

    #[derive(Default)]
    struct Lower;

    impl Resolver for Lower {
        fn resolve(&self, argument: &str) -> Result<Value, ResolverError> {
            Ok(Value::String(argument.to_lowercase()))
        }
    }

    fn direct(binding: &Binding<dyn Resolver>) -> Result<Box<dyn Resolver>, ConfigError> {
        Ok(binding.construct())
    }

    #[test]
    fn test_add_rejects_duplicate_without_force() {
        let mut registry: Registry<dyn Resolver> = Registry::new(BindingKind::Resolver);
        registry.add("case", Binding::resolver::<Upper>(), false).unwrap();

        let err = registry
            .add("case", Binding::resolver::<Lower>(), false)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::AlreadyRegistered { kind: BindingKind::Resolver, ref name } if name == "case"
        ));
        assert!(registry.binding("case").unwrap().id().ends_with("Upper"));
    }

    #[test]
    fn test_instance_is_built_once() {
        let built = AtomicUsize::new(0);
        let mut registry: Registry<dyn Resolver> = Registry::new(BindingKind::Resolver);
        registry.add("case", Binding::resolver::<Upper>(), false).unwrap();
        assert!(!registry.is_instantiated("case"));

        for _ in 0..3 {
            let resolver = registry
                .instance("case", |binding| {
                    built.fetch_add(1, Ordering::SeqCst);
                    Ok(binding.construct())
                })
                .unwrap()
                .unwrap();
            assert_eq!(resolver.resolve("abc").unwrap(), Value::from("ABC"));
        }

        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert!(registry.is_instantiated("case"));
    }

    #[test]
    fn test_forced_rebind_drops_cached_instance() {
        let mut registry: Registry<dyn Resolver> = Registry::new(BindingKind::Resolver);
        registry.add("case", Binding::resolver::<Upper>(), false).unwrap();
        registry.instance("case", direct).unwrap();

        registry.add("case", Binding::resolver::<Lower>(), true).unwrap();
        assert!(!registry.is_instantiated("case"));

        let resolver = registry.instance("case", direct).unwrap().unwrap();
        assert_eq!(resolver.resolve("ABC").unwrap(), Value::from("abc"));
    }

    #[test]
    fn test_insert_replaces_without_checking() {
        let mut registry: Registry<dyn Resolver> = Registry::new(BindingKind::Resolver);
        registry.insert("case", Binding::resolver::<Upper>());
        registry.instance("case", direct).unwrap();

        registry.insert("case", Binding::resolver::<Lower>());
        assert!(!registry.is_instantiated("case"));
        assert!(registry.binding("case").unwrap().id().ends_with("Lower"));
    }

    #[test]
    fn test_unknown_name_is_none() {
        let mut registry: Registry<dyn Resolver> = Registry::new(BindingKind::Resolver);
        assert!(registry.instance("missing", direct).unwrap().is_none());
    }

    #[test]
    fn test_bindings_listed_in_name_order() {
        let mut registry: Registry<dyn Resolver> = Registry::new(BindingKind::Resolver);
        registry.add("zz", Binding::new("custom.zz", || -> Box<dyn Resolver> { Box::new(Upper) }), false).unwrap();
        registry.add("aa", Binding::new("custom.aa", || -> Box<dyn Resolver> { Box::new(Lower) }), false).unwrap();

        let listed: Vec<_> = registry.bindings().collect();
        assert_eq!(listed, vec![("aa", "custom.aa"), ("zz", "custom.zz")]);
    }
}
