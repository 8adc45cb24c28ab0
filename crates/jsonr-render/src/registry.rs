//! Component registry: maps node type names to renderable targets.
//!
//! Lookups resolve in priority order:
//!
//! 1. an exact match among the custom entries
//! 2. the reserved `Fragment` and `Portal` markers
//! 3. the type name itself, as a generic tag
//!
//! Any non-empty type therefore resolves. The exceptions are the empty string
//! and names that were explicitly denied with [`Registry::deny`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use jsonr_core::{Props, FRAGMENT, PORTAL};

use crate::element::Rendered;

/// Builds the rendered output for a registered component.
///
/// Factories receive the resolved props and the already-rendered children.
/// The renderer applies the node's key to whatever the factory returns.
pub trait ComponentFactory: Send + Sync {
    fn create(&self, props: Props, children: Vec<Rendered>) -> Rendered;
}

impl<F> ComponentFactory for F
where
    F: Fn(Props, Vec<Rendered>) -> Rendered + Send + Sync,
{
    fn create(&self, props: Props, children: Vec<Rendered>) -> Rendered {
        self(props, children)
    }
}

/// A custom registry entry.
#[derive(Clone)]
pub enum RegistryEntry {
    /// Render as a generic element with this tag.
    Tag(String),
    /// Render through a factory.
    Factory(Arc<dyn ComponentFactory>),
    /// Refuse to render this type.
    Denied,
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryEntry::Tag(tag) => f.debug_tuple("Tag").field(tag).finish(),
            RegistryEntry::Factory(_) => f.write_str("Factory(..)"),
            RegistryEntry::Denied => f.write_str("Denied"),
        }
    }
}

/// Outcome of a successful lookup.
#[derive(Clone)]
pub enum Resolved<'r> {
    /// A generic element with this tag.
    Tag(&'r str),
    /// A registered factory.
    Factory(&'r dyn ComponentFactory),
    /// The grouping marker.
    Fragment,
    /// The redirection marker.
    Portal,
}

impl fmt::Debug for Resolved<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Tag(tag) => f.debug_tuple("Tag").field(tag).finish(),
            Resolved::Factory(_) => f.write_str("Factory(..)"),
            Resolved::Fragment => f.write_str("Fragment"),
            Resolved::Portal => f.write_str("Portal"),
        }
    }
}

/// Type-name lookup table.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    custom: BTreeMap<String, RegistryEntry>,
}

impl Registry {
    /// Create a registry from custom entries.
    pub fn new<I, S>(custom: I) -> Self
    where
        I: IntoIterator<Item = (S, RegistryEntry)>,
        S: Into<String>,
    {
        Registry {
            custom: custom
                .into_iter()
                .map(|(name, entry)| (name.into(), entry))
                .collect(),
        }
    }

    /// Register or replace an entry.
    pub fn register(&mut self, name: impl Into<String>, entry: RegistryEntry) {
        self.custom.insert(name.into(), entry);
    }

    /// Builder: map a type name to a tag.
    pub fn with_tag(mut self, name: impl Into<String>, tag: impl Into<String>) -> Self {
        self.register(name, RegistryEntry::Tag(tag.into()));
        self
    }

    /// Builder: map a type name to a factory.
    pub fn with_factory(
        mut self,
        name: impl Into<String>,
        factory: impl ComponentFactory + 'static,
    ) -> Self {
        self.register(name, RegistryEntry::Factory(Arc::new(factory)));
        self
    }

    /// Builder: make a type name unresolvable.
    pub fn deny(mut self, name: impl Into<String>) -> Self {
        self.register(name, RegistryEntry::Denied);
        self
    }

    /// Look up the custom entry for `name`, if any.
    pub fn entry(&self, name: &str) -> Option<&RegistryEntry> {
        self.custom.get(name)
    }

    /// Resolve a type name. `None` means the type cannot be rendered.
    pub fn resolve<'r>(&'r self, type_name: &'r str) -> Option<Resolved<'r>> {
        if type_name.is_empty() {
            return None;
        }
        match self.custom.get(type_name) {
            Some(RegistryEntry::Tag(tag)) => Some(Resolved::Tag(tag)),
            Some(RegistryEntry::Factory(factory)) => Some(Resolved::Factory(factory.as_ref())),
            Some(RegistryEntry::Denied) => None,
            None if type_name == FRAGMENT => Some(Resolved::Fragment),
            None if type_name == PORTAL => Some(Resolved::Portal),
            None => Some(Resolved::Tag(type_name)),
        }
    }

    pub fn len(&self) -> usize {
        self.custom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.custom.is_empty()
    }
}
