//! Entity factory
//!
//! Maps a domain name to a zero-argument constructor so generic code can
//! materialize the right concrete type by name. Registration needs `&mut self`;
//! once warm-up is done the factory is shared as `Arc<DomainFactory>` and is
//! read-only from then on.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{Base, DomainError, DomainName};

/// Zero-argument constructor for one entity type.
pub type EntityCreator = Arc<dyn Fn() -> Box<dyn Base> + Send + Sync>;

#[derive(Clone, Default)]
pub struct DomainFactory {
    entity_mappings: HashMap<DomainName, EntityCreator>,
}

impl DomainFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `creator` under `domain_name`. The last registration for a name wins.
    pub fn register_mapping<F>(&mut self, domain_name: impl Into<DomainName>, creator: F)
    where
        F: Fn() -> Box<dyn Base> + Send + Sync + 'static,
    {
        let domain_name = domain_name.into();
        if self
            .entity_mappings
            .insert(domain_name.clone(), Arc::new(creator))
            .is_some()
        {
            tracing::debug!("Replaced entity mapping for domain '{}'", domain_name);
        }
    }

    /// Constructor for `domain_name`, or `None` when nothing is registered.
    pub fn get_mapping(&self, domain_name: &str) -> Option<EntityCreator> {
        self.entity_mappings.get(domain_name).cloned()
    }

    /// Build a zero-value entity for `domain_name`.
    pub fn create(&self, domain_name: &str) -> Result<Box<dyn Base>, DomainError> {
        let creator = self.entity_mappings.get(domain_name).ok_or_else(|| {
            DomainError::Configuration(format!(
                "no entity registered for domain '{}'",
                domain_name
            ))
        })?;
        Ok(creator())
    }

    pub fn contains(&self, domain_name: &str) -> bool {
        self.entity_mappings.contains_key(domain_name)
    }

    pub fn len(&self) -> usize {
        self.entity_mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_mappings.is_empty()
    }

    pub fn domains(&self) -> impl Iterator<Item = &DomainName> {
        self.entity_mappings.keys()
    }
}

impl fmt::Debug for DomainFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut domains: Vec<&str> = self.entity_mappings.keys().map(|d| d.as_str()).collect();
        domains.sort_unstable();
        f.debug_struct("DomainFactory")
            .field("domains", &domains)
            .finish()
    }
}
