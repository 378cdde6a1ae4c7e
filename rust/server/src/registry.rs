use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};
use twentyone_engine::session::{Session, SessionId};

use crate::session::SessionError;

/// Shared handle to one session; the mutex is the session's exclusive lock.
pub type SessionHandle = Arc<Mutex<Session>>;

#[derive(Debug, Clone)]
struct RegistryEntry {
    handle: SessionHandle,
    ordinal: u64,
    created_at: String,
}

/// Session ids mapped to live sessions.
///
/// The map lock is only held long enough to clone an `Arc` out of it, so
/// operations on different sessions never wait on each other.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<Sessions>,
    next_ordinal: Mutex<u64>,
}

#[derive(Debug, Default)]
struct Sessions {
    entries: HashMap<SessionId, RegistryEntry>,
    /// Ids that were removed and must never be registered again.
    removed: HashSet<SessionId>,
}

/// A registered session with its creation metadata.
#[derive(Debug, Clone)]
pub struct RegisteredSession {
    pub id: SessionId,
    pub handle: SessionHandle,
    pub created_at: String,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next creation ordinal. Ordinals only ever increase.
    pub fn next_ordinal(&self) -> Result<u64, SessionError> {
        let mut next = self
            .next_ordinal
            .lock()
            .map_err(|_| SessionError::StoragePoisoned)?;
        let ordinal = *next;
        *next += 1;
        Ok(ordinal)
    }

    /// Register a session, or return the one already registered under the
    /// same id. Removed ids are reported as not found.
    pub fn insert(
        &self,
        id: SessionId,
        session: Session,
        ordinal: u64,
    ) -> Result<SessionHandle, SessionError> {
        let mut guard = self
            .sessions
            .write()
            .map_err(|_| SessionError::StoragePoisoned)?;
        if guard.removed.contains(&id) {
            return Err(SessionError::NotFound(id));
        }
        let entry = guard.entries.entry(id).or_insert_with(|| RegistryEntry {
            handle: Arc::new(Mutex::new(session)),
            ordinal,
            created_at: chrono::Utc::now().to_rfc3339(),
        });
        Ok(Arc::clone(&entry.handle))
    }

    pub fn get(&self, id: &SessionId) -> Result<Option<SessionHandle>, SessionError> {
        let guard = self
            .sessions
            .read()
            .map_err(|_| SessionError::StoragePoisoned)?;
        Ok(guard.entries.get(id).map(|entry| Arc::clone(&entry.handle)))
    }

    /// Whether `handle` is still the live handle registered for `id`.
    pub fn is_current(&self, id: &SessionId, handle: &SessionHandle) -> Result<bool, SessionError> {
        let guard = self
            .sessions
            .read()
            .map_err(|_| SessionError::StoragePoisoned)?;
        Ok(guard
            .entries
            .get(id)
            .is_some_and(|entry| Arc::ptr_eq(&entry.handle, handle)))
    }

    /// Unregister a session and tombstone its id in the same step, so no
    /// later lookup can bring it back.
    pub fn remove(&self, id: &SessionId) -> Result<Option<SessionHandle>, SessionError> {
        let mut guard = self
            .sessions
            .write()
            .map_err(|_| SessionError::StoragePoisoned)?;
        guard.removed.insert(id.clone());
        Ok(guard.entries.remove(id).map(|entry| entry.handle))
    }

    pub fn is_removed(&self, id: &SessionId) -> Result<bool, SessionError> {
        let guard = self
            .sessions
            .read()
            .map_err(|_| SessionError::StoragePoisoned)?;
        Ok(guard.removed.contains(id))
    }

    /// Every registered session, oldest first.
    pub fn sessions(&self) -> Result<Vec<RegisteredSession>, SessionError> {
        let guard = self
            .sessions
            .read()
            .map_err(|_| SessionError::StoragePoisoned)?;
        let mut entries: Vec<(u64, RegisteredSession)> = guard
            .entries
            .iter()
            .map(|(id, entry)| {
                (
                    entry.ordinal,
                    RegisteredSession {
                        id: id.clone(),
                        handle: Arc::clone(&entry.handle),
                        created_at: entry.created_at.clone(),
                    },
                )
            })
            .collect();
        entries.sort_by_key(|(ordinal, _)| *ordinal);
        Ok(entries.into_iter().map(|(_, session)| session).collect())
    }

    pub fn len(&self) -> usize {
        match self.sessions.read() {
            Ok(guard) => guard.entries.len(),
            Err(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twentyone_engine::rules::TableRules;

    fn session(id: &str) -> Session {
        Session::new(id.into(), 1, "table", TableRules::default(), 0).expect("session")
    }

    #[test]
    fn insert_is_idempotent_per_id() {
        let registry = SessionRegistry::new();
        let first = registry.insert("a".into(), session("a"), 0).expect("insert");
        let second = registry.insert("a".into(), session("a"), 1).expect("insert");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn sessions_are_listed_in_creation_order() {
        let registry = SessionRegistry::new();
        for id in ["c", "a", "b"] {
            let ordinal = registry.next_ordinal().expect("ordinal");
            registry.insert(id.into(), session(id), ordinal).expect("insert");
        }
        let ids: Vec<SessionId> = registry
            .sessions()
            .expect("list")
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn remove_forgets_the_session() {
        let registry = SessionRegistry::new();
        registry.insert("a".into(), session("a"), 0).expect("insert");
        assert!(registry.remove(&"a".to_string()).expect("remove").is_some());
        assert!(registry.get(&"a".to_string()).expect("get").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn removed_ids_cannot_be_registered_again() {
        let registry = SessionRegistry::new();
        let id: SessionId = "a".into();
        let stale = registry.insert(id.clone(), session("a"), 0).expect("insert");
        assert!(registry.is_current(&id, &stale).expect("check"));

        registry.remove(&id).expect("remove");
        assert!(registry.is_removed(&id).expect("check"));
        assert!(!registry.is_current(&id, &stale).expect("check"));
        assert!(matches!(
            registry.insert(id.clone(), session("a"), 1),
            Err(SessionError::NotFound(_))
        ));
    }
}
