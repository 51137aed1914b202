//! Session storage.
//!
//! The session table is the only shared mutable state in the gate. Each
//! [`SessionStore`] operation is atomic, so "at most one live session per
//! principal" holds under concurrent logins.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::auth::session::{InvalidationReason, Session, SessionId};

/// Trait for session storage backends.
pub trait SessionStore: Send + Sync {
    /// Store `session` as the only live session of its principal.
    ///
    /// A previous live session of the same principal is marked
    /// [`InvalidationReason::Replaced`], kept as a tombstone, and returned.
    fn insert_replacing(&self, session: Session) -> Option<Session>;

    /// Get a session record (live or tombstone) by token.
    fn get(&self, id: &SessionId) -> Option<Session>;

    /// Refresh the last-access time of a live session.
    ///
    /// Returns false if the session is unknown or no longer live.
    fn touch(&self, id: &SessionId, now: u64) -> bool;

    /// Remove a record outright. Unknown tokens are ignored.
    fn remove(&self, id: &SessionId) -> Option<Session>;

    /// The live session currently owned by `principal`.
    fn live_session(&self, principal: &str) -> Option<Session>;

    /// Remove every record matching `predicate`, returning what was removed.
    fn remove_where(&self, predicate: &dyn Fn(&Session) -> bool) -> Vec<Session>;

    /// Number of live (non-tombstone) sessions.
    fn live_count(&self) -> usize;
}

#[derive(Default)]
struct SessionTable {
    by_id: HashMap<SessionId, Session>,
    /// Principal → its single live session.
    by_principal: HashMap<String, SessionId>,
}

impl SessionTable {
    fn unlink_principal(&mut self, session: &Session) {
        if self.by_principal.get(&session.principal) == Some(&session.id) {
            self.by_principal.remove(&session.principal);
        }
    }
}

/// In-memory session storage implementation.
#[derive(Default)]
pub struct MemorySessionStore {
    table: Mutex<SessionTable>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, SessionTable> {
        // The table holds no invariants a panicking writer could half-apply
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Total records, tombstones included.
    pub fn len(&self) -> usize {
        self.table().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn insert_replacing(&self, session: Session) -> Option<Session> {
        let mut guard = self.table();
        let table = &mut *guard;

        let evicted = match table
            .by_principal
            .insert(session.principal.clone(), session.id.clone())
        {
            Some(old_id) => table.by_id.get_mut(&old_id).map(|old| {
                old.invalidate(InvalidationReason::Replaced);
                old.clone()
            }),
            None => None,
        };

        table.by_id.insert(session.id.clone(), session);
        evicted
    }

    fn get(&self, id: &SessionId) -> Option<Session> {
        self.table().by_id.get(id).cloned()
    }

    fn touch(&self, id: &SessionId, now: u64) -> bool {
        match self.table().by_id.get_mut(id) {
            Some(session) if session.is_active() => {
                session.last_accessed_at = session.last_accessed_at.max(now);
                true
            }
            _ => false,
        }
    }

    fn remove(&self, id: &SessionId) -> Option<Session> {
        let mut table = self.table();
        let removed = table.by_id.remove(id)?;
        table.unlink_principal(&removed);
        Some(removed)
    }

    fn live_session(&self, principal: &str) -> Option<Session> {
        let table = self.table();
        table
            .by_principal
            .get(principal)
            .and_then(|id| table.by_id.get(id))
            .cloned()
    }

    fn remove_where(&self, predicate: &dyn Fn(&Session) -> bool) -> Vec<Session> {
        let mut table = self.table();
        let doomed: Vec<SessionId> = table
            .by_id
            .values()
            .filter(|s| predicate(s))
            .map(|s| s.id.clone())
            .collect();

        let mut removed = Vec::with_capacity(doomed.len());
        for id in doomed {
            if let Some(session) = table.by_id.remove(&id) {
                table.unlink_principal(&session);
                removed.push(session);
            }
        }
        removed
    }

    fn live_count(&self) -> usize {
        self.table().by_principal.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::SessionState;
    use std::sync::Arc;

    #[test]
    fn test_insert_replaces_previous_live_session() {
        let store = MemorySessionStore::new();
        let first = Session::new("alice", 0);
        let second = Session::new("alice", 5);

        assert!(store.insert_replacing(first.clone()).is_none());
        let evicted = store.insert_replacing(second.clone()).unwrap();

        assert_eq!(evicted.id, first.id);
        assert_eq!(
            store.get(&first.id).unwrap().state,
            SessionState::Invalidated(InvalidationReason::Replaced)
        );
        assert_eq!(store.live_session("alice").unwrap().id, second.id);
        assert_eq!(store.live_count(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_principals_are_independent() {
        let store = MemorySessionStore::new();
        store.insert_replacing(Session::new("alice", 0));
        assert!(store.insert_replacing(Session::new("bob", 0)).is_none());
        assert_eq!(store.live_count(), 2);
    }

    #[test]
    fn test_remove_tombstone_keeps_live_session() {
        let store = MemorySessionStore::new();
        let first = Session::new("alice", 0);
        let second = Session::new("alice", 1);
        store.insert_replacing(first.clone());
        store.insert_replacing(second.clone());

        store.remove(&first.id);
        assert_eq!(store.live_session("alice").unwrap().id, second.id);

        store.remove(&second.id);
        assert!(store.live_session("alice").is_none());
        assert!(store.remove(&second.id).is_none());
    }

    #[test]
    fn test_touch_only_refreshes_live_sessions() {
        let store = MemorySessionStore::new();
        let first = Session::new("alice", 0);
        store.insert_replacing(first.clone());
        assert!(store.touch(&first.id, 10));
        assert_eq!(store.get(&first.id).unwrap().last_accessed_at, 10);

        store.insert_replacing(Session::new("alice", 11));
        assert!(!store.touch(&first.id, 12));
        assert!(!store.touch(&SessionId::from("unknown"), 12));
    }

    #[test]
    fn test_remove_where() {
        let store = MemorySessionStore::new();
        store.insert_replacing(Session::new("alice", 0));
        store.insert_replacing(Session::new("bob", 100));

        let removed = store.remove_where(&|s: &Session| s.created_at < 50);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].principal, "alice");
        assert!(store.live_session("alice").is_none());
        assert_eq!(store.live_count(), 1);
    }

    #[test]
    fn test_concurrent_logins_leave_one_live_session() {
        let store = Arc::new(MemorySessionStore::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for j in 0..50 {
                        store.insert_replacing(Session::new("alice", i * 100 + j));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.live_count(), 1);
        let live = store.live_session("alice").unwrap();
        assert!(live.is_active());
        let active = store.remove_where(&|s: &Session| s.is_active());
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, live.id);
    }
}
