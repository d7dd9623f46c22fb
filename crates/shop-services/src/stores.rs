//! Stores and installed themes.

use shop_domain::prelude::*;

use crate::memory::MemoryStore;
use crate::ServiceError;

pub trait StoreService: Send + Sync {
    fn get_store_by_id(&self, id: StoreId) -> Result<Option<Store>, ServiceError>;

    fn get_all_stores(&self) -> Result<Vec<Store>, ServiceError>;
}

impl StoreService for MemoryStore {
    fn get_store_by_id(&self, id: StoreId) -> Result<Option<Store>, ServiceError> {
        Ok(self.read()?.stores.get(&id).cloned())
    }

    fn get_all_stores(&self) -> Result<Vec<Store>, ServiceError> {
        Ok(self.read()?.stores.values().cloned().collect())
    }
}

pub trait ThemeRegistry: Send + Sync {
    /// Installed themes in installation order.
    fn get_theme_configurations(&self) -> Result<Vec<ThemeDescriptor>, ServiceError>;

    /// Case-insensitive lookup by system name.
    fn get_theme(&self, system_name: &str) -> Result<Option<ThemeDescriptor>, ServiceError> {
        Ok(self
            .get_theme_configurations()?
            .into_iter()
            .find(|t| t.system_name.eq_ignore_ascii_case(system_name)))
    }

    fn theme_exists(&self, system_name: &str) -> Result<bool, ServiceError> {
        Ok(self.get_theme(system_name)?.is_some())
    }
}

impl ThemeRegistry for MemoryStore {
    fn get_theme_configurations(&self) -> Result<Vec<ThemeDescriptor>, ServiceError> {
        Ok(self.read()?.themes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_lookup_ignores_case() {
        let store = MemoryStore::new();
        store
            .add_theme(ThemeDescriptor {
                system_name: "DefaultClean".into(),
                friendly_name: "Default clean".into(),
                preview_image_url: None,
                supports_rtl: false,
            })
            .unwrap();
        assert!(store.theme_exists("defaultclean").unwrap());
        assert!(!store.theme_exists("Dark").unwrap());
    }

    #[test]
    fn test_store_lookup() {
        let memory = MemoryStore::new();
        memory
            .add_store(Store::new(StoreId::new(1), "Demo", "http://demo.local"))
            .unwrap();
        let store = memory.get_store_by_id(StoreId::new(1)).unwrap().unwrap();
        assert_eq!(store.url, "http://demo.local/");
        assert_eq!(memory.get_all_stores().unwrap().len(), 1);
    }
}
