//! in-memory [ParameterStore]
use super::{Parameter, ParameterStore, StoreError};
use indexmap::IndexMap;

/// Parameters kept in insertion order
///
/// ```
/// # use helm_ssm::store::{MemoryStore, ParameterStore};
/// let store = MemoryStore::from_iter([("/app/db/user", "admin"), ("/app/db/password", "hunter2")]);
/// assert_eq!(store.get_parameter("/app/db/user").unwrap(), "admin");
/// assert_eq!(store.get_parameters_by_path("/app/db").unwrap().len(), 2);
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    parameters: IndexMap<String, String>,
}

impl MemoryStore {
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(name.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryStore {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut store = MemoryStore::default();
        for (name, value) in iter {
            store.insert(name, value);
        }
        store
    }
}

impl ParameterStore for MemoryStore {
    fn get_parameter(&self, name: &str) -> Result<String, StoreError> {
        self.parameters
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    /// Matches whole path segments only: `/app` contains `/app/x` but not `/apple`
    fn get_parameters_by_path(&self, path: &str) -> Result<Vec<Parameter>, StoreError> {
        let path = path.trim_end_matches('/');

        Ok(self
            .parameters
            .iter()
            .filter(|(name, _)| {
                name.strip_prefix(path)
                    .is_some_and(|rest| rest.starts_with('/'))
            })
            .map(|(name, value)| Parameter {
                name: name.clone(),
                value: value.clone(),
            })
            .collect())
    }
}
