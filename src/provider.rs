//! Feature definition providers.
//!
//! A [`DefinitionProvider`] is what the filter runtime reads definitions
//! from. Three interchangeable backends implement it: a local
//! [`FlagStore`](crate::store::FlagStore) (this module), a remote flag service
//! ([`crate::remote_provider`]), and a preloaded static set (this module,
//! mostly for tests and embedding).
//!
//! Providers never propagate backend failures to the runtime: `get_all`
//! degrades to an empty sequence and `get_one` to the empty definition, with
//! the failure logged here.

use crate::definition::FeatureDefinition;
use crate::mapper::map_flag;
use crate::store::FlagStore;

/// Read access to evaluation-ready definitions.
pub trait DefinitionProvider {
    /// One definition per known flag, in backend iteration order. Each call
    /// issues at most one backend round trip; the sequence is restartable by
    /// calling again.
    fn get_all(&self) -> Box<dyn Iterator<Item = FeatureDefinition> + '_>;

    /// The definition for `name`. Unknown names yield
    /// [`FeatureDefinition::empty`], never an error.
    fn get_one(&self, name: &str) -> FeatureDefinition;
}

/// Provider backed by a local [`FlagStore`]; flags are mapped lazily, one per
/// item, as the sequence is consumed.
pub struct StoreDefinitionProvider<S> {
    store: S,
}

impl<S: FlagStore> StoreDefinitionProvider<S> {
    pub fn new(store: S) -> StoreDefinitionProvider<S> {
        StoreDefinitionProvider { store }
    }
}

impl<S: FlagStore> DefinitionProvider for StoreDefinitionProvider<S> {
    fn get_all(&self) -> Box<dyn Iterator<Item = FeatureDefinition> + '_> {
        match self.store.get_all_flags() {
            Ok(flags) => Box::new(flags.into_iter().map(|flag| map_flag(&flag))),
            Err(err) => {
                log::warn!(target: "featuregate",
                           "flag store failed while listing flags, serving no definitions: {err}");
                Box::new(std::iter::empty())
            }
        }
    }

    fn get_one(&self, name: &str) -> FeatureDefinition {
        match self.store.get_flag_by_name(name) {
            Ok(Some(flag)) => map_flag(&flag),
            Ok(None) => FeatureDefinition::empty(name),
            Err(err) => {
                log::warn!(target: "featuregate",
                           flag_name = name;
                           "flag store failed while looking up a flag, serving the empty definition: {err}");
                FeatureDefinition::empty(name)
            }
        }
    }
}

/// Provider over a fixed set of definitions.
#[derive(Debug, Clone, Default)]
pub struct StaticDefinitionProvider {
    definitions: Vec<FeatureDefinition>,
}

impl StaticDefinitionProvider {
    pub fn new(definitions: Vec<FeatureDefinition>) -> StaticDefinitionProvider {
        StaticDefinitionProvider { definitions }
    }
}

impl DefinitionProvider for StaticDefinitionProvider {
    fn get_all(&self) -> Box<dyn Iterator<Item = FeatureDefinition> + '_> {
        Box::new(self.definitions.iter().cloned())
    }

    fn get_one(&self, name: &str) -> FeatureDefinition {
        self.definitions
            .iter()
            .find(|definition| definition.name == name)
            .cloned()
            .unwrap_or_else(|| FeatureDefinition::empty(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::DefinitionStatus;
    use crate::flags::{FeatureFlag, RequirementType};
    use crate::store::{FlagStore, InMemoryFlagStore, SaveOutcome};
    use crate::{Error, Result};

    fn new_flag(name: &str, status: bool) -> FeatureFlag {
        FeatureFlag {
            id: 0,
            name: name.to_owned(),
            status,
            requirement_type: RequirementType::Any,
            updated_date: None,
            filters: Vec::new(),
        }
    }

    #[test]
    fn store_provider_streams_mapped_definitions() {
        let store = InMemoryFlagStore::new();
        store.save_flag(new_flag("on", true)).unwrap();
        store.save_flag(new_flag("off", false)).unwrap();

        let provider = StoreDefinitionProvider::new(store);
        let definitions: Vec<_> = provider.get_all().collect();

        assert_eq!(definitions.len(), 2);
        assert_eq!(definitions[0].name, "on");
        assert_eq!(definitions[0].status, DefinitionStatus::Conditional);
        assert_eq!(definitions[0].enabled_for[0].name, "AlwaysOn");
        assert_eq!(definitions[1].status, DefinitionStatus::Disabled);

        // Restartable: a second call re-queries and yields the same sequence.
        assert_eq!(provider.get_all().count(), 2);
    }

    #[test]
    fn get_one_for_unknown_flag_is_the_empty_definition() {
        let provider = StoreDefinitionProvider::new(InMemoryFlagStore::new());

        let definition = provider.get_one("missing");
        assert_eq!(definition.name, "missing");
        assert!(definition.enabled_for.is_empty());
    }

    struct FailingStore;

    impl FlagStore for FailingStore {
        fn get_all_flags(&self) -> Result<Vec<FeatureFlag>> {
            Err(Error::Store("connection refused".to_owned()))
        }
        fn get_flag_by_name(&self, _name: &str) -> Result<Option<FeatureFlag>> {
            Err(Error::Store("connection refused".to_owned()))
        }
        fn save_flag(&self, _flag: FeatureFlag) -> Result<SaveOutcome> {
            Err(Error::Store("connection refused".to_owned()))
        }
        fn delete_flag(&self, _id: i64) -> Result<bool> {
            Err(Error::Store("connection refused".to_owned()))
        }
    }

    #[test]
    fn backend_failures_degrade_instead_of_propagating() {
        let _ = env_logger::builder().is_test(true).try_init();
        let provider = StoreDefinitionProvider::new(FailingStore);

        assert_eq!(provider.get_all().count(), 0);

        let definition = provider.get_one("beta");
        assert_eq!(definition.name, "beta");
        assert!(definition.enabled_for.is_empty());
    }

    #[test]
    fn static_provider_serves_its_definitions() {
        let provider = StaticDefinitionProvider::new(vec![FeatureDefinition::empty("known")]);

        assert_eq!(provider.get_all().count(), 1);
        assert_eq!(provider.get_one("known").name, "known");
        assert_eq!(provider.get_one("unknown").name, "unknown");
    }
}
