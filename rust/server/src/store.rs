use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use twentyone_engine::session::{SessionId, SessionRecord};

/// Persistence boundary for session state.
///
/// `save` is called while the session lock is held, once per committed
/// operation, so implementations must not call back into the session manager.
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    fn save(&self, record: &SessionRecord) -> Result<(), StoreError>;

    fn load(&self, id: &SessionId) -> Result<Option<SessionRecord>, StoreError>;

    fn remove(&self, id: &SessionId) -> Result<(), StoreError>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Session store unavailable: {0}")]
    Unavailable(String),
    #[error("Stored session is corrupt: {0}")]
    Corrupt(String),
    #[error("Session store poisoned")]
    Poisoned,
}

/// Keeps serialized records in memory.
///
/// Records are stored as JSON so a load always goes through the same decode
/// path a durable backend would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<SessionId, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemoryStore {
    fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let json =
            serde_json::to_string(record).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let mut guard = self.records.write().map_err(|_| StoreError::Poisoned)?;
        guard.insert(record.id.clone(), json);
        Ok(())
    }

    fn load(&self, id: &SessionId) -> Result<Option<SessionRecord>, StoreError> {
        let guard = self.records.read().map_err(|_| StoreError::Poisoned)?;
        guard
            .get(id)
            .map(|json| serde_json::from_str(json).map_err(|e| StoreError::Corrupt(e.to_string())))
            .transpose()
    }

    fn remove(&self, id: &SessionId) -> Result<(), StoreError> {
        let mut guard = self.records.write().map_err(|_| StoreError::Poisoned)?;
        guard.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twentyone_engine::rules::TableRules;
    use twentyone_engine::session::Session;

    #[test]
    fn save_then_load_returns_the_record() {
        let store = MemoryStore::new();
        let record = Session::new("a".into(), 1, "table", TableRules::default(), 3)
            .expect("session")
            .to_record();

        store.save(&record).expect("save");
        assert_eq!(store.len(), 1);
        assert_eq!(store.load(&"a".to_string()).expect("load"), Some(record));

        store.remove(&"a".to_string()).expect("remove");
        assert!(store.is_empty());
        assert_eq!(store.load(&"a".to_string()).expect("load"), None);
    }

    #[test]
    fn missing_ids_load_as_none() {
        let store = MemoryStore::new();
        assert!(store.load(&"nope".to_string()).expect("load").is_none());
    }
}
