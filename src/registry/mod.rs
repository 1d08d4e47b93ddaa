//! Connection Registry
//!
//! Memoizing factory of adapter instances keyed by spreadsheet identifier,
//! plus persisted bookkeeping of which sheets a user has linked.

use crate::adapter::{SheetsAdapter, TableAdapter};
use crate::config::SheetConfig;
use crate::model::SavedConnection;
use crate::store::KeyValueStore;
use crate::Result;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Factory seam for adapter construction, injected into the registry
pub trait AdapterFactory: Send + Sync {
    fn create(&self, config: &SheetConfig) -> Result<Arc<dyn TableAdapter>>;
}

/// Default factory producing HTTP adapters
#[derive(Debug, Default)]
pub struct SheetsAdapterFactory;

impl AdapterFactory for SheetsAdapterFactory {
    fn create(&self, config: &SheetConfig) -> Result<Arc<dyn TableAdapter>> {
        Ok(Arc::new(SheetsAdapter::new(config.clone())?))
    }
}

/// Memoizing adapter cache
///
/// Repeated calls with the same spreadsheet identifier return the same
/// adapter instance, so its remote-metadata cache is shared and credentials
/// are probed once per sheet rather than once per call site.
pub struct AdapterRegistry {
    factory: Arc<dyn AdapterFactory>,
    adapters: Mutex<HashMap<String, Arc<dyn TableAdapter>>>,
}

impl AdapterRegistry {
    pub fn new(factory: Arc<dyn AdapterFactory>) -> Self {
        Self {
            factory,
            adapters: Mutex::new(HashMap::new()),
        }
    }

    /// Registry over the default HTTP adapter factory
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(SheetsAdapterFactory))
    }

    /// Get or create the adapter for a sheet configuration
    pub fn get_adapter(&self, config: &SheetConfig) -> Result<Arc<dyn TableAdapter>> {
        let mut adapters = self.adapters.lock().expect("registry lock poisoned");

        if let Some(adapter) = adapters.get(&config.spreadsheet_id) {
            return Ok(adapter.clone());
        }

        debug!(spreadsheet = %config.spreadsheet_id, "Creating adapter");
        let adapter = self.factory.create(config)?;
        adapters.insert(config.spreadsheet_id.clone(), adapter.clone());
        Ok(adapter)
    }

    /// Drop the cached adapter for a sheet, forcing re-creation next time
    pub fn evict(&self, spreadsheet_id: &str) {
        self.adapters
            .lock()
            .expect("registry lock poisoned")
            .remove(spreadsheet_id);
    }

    pub fn cached_count(&self) -> usize {
        self.adapters.lock().expect("registry lock poisoned").len()
    }
}

/// Persisted per-user lists of previously connected sheets
pub struct ConnectionDirectory {
    store: Arc<dyn KeyValueStore>,
}

impl ConnectionDirectory {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(user_id: &str) -> String {
        format!("connections/{}", user_id)
    }

    fn load(&self, user_id: &str) -> Result<Vec<SavedConnection>> {
        match self.store.get(&Self::key(user_id))? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, user_id: &str, connections: &[SavedConnection]) -> Result<()> {
        self.store
            .set(&Self::key(user_id), &serde_json::to_string(connections)?)
    }

    /// List a user's previously connected sheets
    pub fn list_connections(&self, user_id: &str) -> Result<Vec<SavedConnection>> {
        self.load(user_id)
    }

    /// Remember a connected sheet, replacing any earlier entry with the same id
    pub fn add_connection(&self, user_id: &str, connection: SavedConnection) -> Result<()> {
        let mut connections = self.load(user_id)?;
        connections.retain(|c| c.id != connection.id);
        connections.push(connection);
        self.save(user_id, &connections)
    }

    /// Forget a sheet; returns whether an entry was removed
    pub fn remove_connection(&self, user_id: &str, id: &str) -> Result<bool> {
        let mut connections = self.load(user_id)?;
        let before = connections.len();
        connections.retain(|c| c.id != id);
        let removed = connections.len() != before;
        if removed {
            self.save(user_id, &connections)?;
        }
        Ok(removed)
    }

    /// Stamp a sheet's last-accessed time with now
    pub fn touch_last_accessed(&self, user_id: &str, id: &str) -> Result<()> {
        let mut connections = self.load(user_id)?;
        for connection in connections.iter_mut() {
            if connection.id == id {
                connection.last_accessed_at = Some(Utc::now().to_rfc3339());
            }
        }
        self.save(user_id, &connections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::CredentialSet;
    use crate::store::MemoryStore;

    fn saved(id: &str) -> SavedConnection {
        SavedConnection {
            id: id.to_string(),
            name: format!("Sheet {}", id),
            url: format!("https://example.com/{}", id),
            connected_at: "2026-01-01T00:00:00Z".to_string(),
            last_accessed_at: None,
        }
    }

    #[test]
    fn test_registry_memoizes_by_sheet_id() {
        let registry = AdapterRegistry::with_defaults();
        let config = SheetConfig::new("sheet-a")
            .with_credentials(CredentialSet::default().with_api_key("key"));

        let first = registry.get_adapter(&config).unwrap();
        let second = registry.get_adapter(&config).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.cached_count(), 1);

        registry.evict("sheet-a");
        assert_eq!(registry.cached_count(), 0);
    }

    #[test]
    fn test_directory_roundtrip() {
        let directory = ConnectionDirectory::new(Arc::new(MemoryStore::new()));

        assert!(directory.list_connections("user-1").unwrap().is_empty());

        directory.add_connection("user-1", saved("a")).unwrap();
        directory.add_connection("user-1", saved("b")).unwrap();
        assert_eq!(directory.list_connections("user-1").unwrap().len(), 2);

        // Re-adding the same id replaces rather than duplicates
        directory.add_connection("user-1", saved("a")).unwrap();
        assert_eq!(directory.list_connections("user-1").unwrap().len(), 2);

        assert!(directory.remove_connection("user-1", "a").unwrap());
        assert!(!directory.remove_connection("user-1", "a").unwrap());
        assert_eq!(directory.list_connections("user-1").unwrap().len(), 1);
    }

    #[test]
    fn test_directory_is_per_user() {
        let directory = ConnectionDirectory::new(Arc::new(MemoryStore::new()));
        directory.add_connection("user-1", saved("a")).unwrap();

        assert!(directory.list_connections("user-2").unwrap().is_empty());
    }

    #[test]
    fn test_touch_last_accessed() {
        let directory = ConnectionDirectory::new(Arc::new(MemoryStore::new()));
        directory.add_connection("user-1", saved("a")).unwrap();

        directory.touch_last_accessed("user-1", "a").unwrap();
        let connections = directory.list_connections("user-1").unwrap();
        assert!(connections[0].last_accessed_at.is_some());
    }
}
