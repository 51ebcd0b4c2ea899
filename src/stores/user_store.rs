use crate::core::error::{StoreError, UniqueField};
use crate::models::user::{NewUser, User};
use crate::wal::wal::{Wal, WalOperation};
use anyhow::anyhow;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Persistence collaborator of the credential service
///
/// `create` is the authoritative uniqueness guard: it must fail with
/// `StoreError::Duplicate` if the username or email is already taken,
/// even when a caller checked beforehand.
pub trait UserStore: Send + Sync {
    fn find_by_username(&self, username: &str) -> Result<Option<Arc<User>>, StoreError>;

    fn find_by_email(&self, email: &str) -> Result<Option<Arc<User>>, StoreError>;

    fn create(&self, user: NewUser) -> Result<Arc<User>, StoreError>;
}

/// In-memory user store, optionally backed by a write-ahead log
pub struct MemoryUserStore {
    users: DashMap<u64, Arc<User>>,
    by_username: DashMap<String, u64>,
    by_email: DashMap<String, u64>,
    next_id: AtomicU64,
    /// Serializes check-and-insert so both unique indexes move together
    write_lock: Mutex<()>,
    wal: Option<Arc<Wal>>,
}

impl MemoryUserStore {
    /// Create a store that keeps users in memory only
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            by_username: DashMap::new(),
            by_email: DashMap::new(),
            next_id: AtomicU64::new(1),
            write_lock: Mutex::new(()),
            wal: None,
        }
    }

    /// Create a store whose writes are logged to `wal` before they become visible
    pub fn with_wal(wal: Arc<Wal>) -> Self {
        Self {
            wal: Some(wal),
            ..Self::new()
        }
    }

    /// Insert a user restored from the WAL
    ///
    /// Replay does not write back to the log. A record that collides with an
    /// already restored one is skipped and reported as a duplicate; an id with
    /// no successor is rejected as a backend error.
    pub fn restore(&self, user: User) -> Result<(), StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow!("user store lock poisoned"))?;

        if self.users.contains_key(&user.id) {
            return Err(StoreError::Backend(anyhow!("user id {} already restored", user.id)));
        }
        let next = successor(user.id)?;
        self.check_unique(&user.username, &user.email)?;

        self.next_id.fetch_max(next, Ordering::SeqCst);
        self.insert(user);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn check_unique(&self, username: &str, email: &str) -> Result<(), StoreError> {
        if self.by_username.contains_key(username) {
            return Err(StoreError::Duplicate(UniqueField::Username));
        }
        if self.by_email.contains_key(email) {
            return Err(StoreError::Duplicate(UniqueField::Email));
        }
        Ok(())
    }

    fn insert(&self, user: User) -> Arc<User> {
        let user = Arc::new(user);
        self.by_username.insert(user.username.clone(), user.id);
        self.by_email.insert(user.email.clone(), user.id);
        self.users.insert(user.id, Arc::clone(&user));
        user
    }

    fn lookup(&self, id: Option<u64>) -> Option<Arc<User>> {
        id.and_then(|id| self.users.get(&id).map(|entry| Arc::clone(entry.value())))
    }
}

fn successor(id: u64) -> Result<u64, StoreError> {
    id.checked_add(1)
        .ok_or_else(|| StoreError::Backend(anyhow!("user id {} leaves no room for another user", id)))
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore for MemoryUserStore {
    fn find_by_username(&self, username: &str) -> Result<Option<Arc<User>>, StoreError> {
        let id = self.by_username.get(username).map(|entry| *entry.value());
        Ok(self.lookup(id))
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Arc<User>>, StoreError> {
        let id = self.by_email.get(email).map(|entry| *entry.value());
        Ok(self.lookup(id))
    }

    fn create(&self, new_user: NewUser) -> Result<Arc<User>, StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow!("user store lock poisoned"))?;

        self.check_unique(&new_user.username, &new_user.email)?;

        let id = self.next_id.load(Ordering::SeqCst);
        let next = successor(id)?;
        let user = User::new(id, new_user.username, new_user.email, new_user.password_hash);

        if let Some(wal) = &self.wal {
            wal.log_operation(&WalOperation::CreateUser {
                id: user.id,
                username: user.username.clone(),
                email: user.email.clone(),
                password_hash: user.password_hash.clone(),
            })?;
        }

        self.next_id.store(next, Ordering::SeqCst);
        Ok(self.insert(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[test]
    fn test_create_assigns_increasing_ids() {
        let store = MemoryUserStore::new();

        let a = store.create(new_user("alice", "a@b.com")).unwrap();
        let b = store.create(new_user("bob", "b@b.com")).unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_find_by_fields() {
        let store = MemoryUserStore::new();
        store.create(new_user("alice", "a@b.com")).unwrap();

        let by_name = store.find_by_username("alice").unwrap().unwrap();
        let by_email = store.find_by_email("a@b.com").unwrap().unwrap();
        assert_eq!(by_name.id, by_email.id);

        assert!(store.find_by_username("ALICE").unwrap().is_none());
        assert!(store.find_by_email("nobody@b.com").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let store = MemoryUserStore::new();
        store.create(new_user("alice", "a@b.com")).unwrap();

        let err = store.create(new_user("alice", "other@b.com")).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(UniqueField::Username)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let store = MemoryUserStore::new();
        store.create(new_user("alice", "a@b.com")).unwrap();

        let err = store.create(new_user("bob", "a@b.com")).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(UniqueField::Email)));
        // Rejected create must not consume an ID or leave a partial index entry
        assert!(store.find_by_username("bob").unwrap().is_none());
        assert_eq!(store.create(new_user("bob", "bob@b.com")).unwrap().id, 2);
    }

    #[test]
    fn test_concurrent_creates_keep_uniqueness() {
        let store = Arc::new(MemoryUserStore::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store.create(new_user("racer", &format!("racer{}@b.com", i)))
                })
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.is_ok())
            .count();

        assert_eq!(successes, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_restore_rejects_id_overflow() {
        let store = MemoryUserStore::new();

        let err = store
            .restore(User::new(u64::MAX, "mallory".into(), "m@b.com".into(), "hash".into()))
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
        assert!(store.is_empty());

        // Highest usable id restores, but there is no id left to assign
        store
            .restore(User::new(u64::MAX - 1, "max".into(), "max@b.com".into(), "hash".into()))
            .unwrap();
        let err = store.create(new_user("next", "next@b.com")).unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_create_is_logged_and_restorable() {
        let temp_dir = TempDir::new().unwrap();
        let wal = Arc::new(Wal::new(temp_dir.path().join("users.wal")).unwrap());

        let store = MemoryUserStore::with_wal(Arc::clone(&wal));
        store.create(new_user("alice", "a@b.com")).unwrap();
        store.create(new_user("bob", "b@b.com")).unwrap();

        let restored = MemoryUserStore::with_wal(Arc::clone(&wal));
        for op in wal.replay().unwrap() {
            let WalOperation::CreateUser { id, username, email, password_hash } = op;
            restored.restore(User::new(id, username, email, password_hash)).unwrap();
        }

        assert_eq!(restored.len(), 2);
        assert_eq!(restored.find_by_email("b@b.com").unwrap().unwrap().id, 2);
        assert_eq!(restored.create(new_user("carol", "c@b.com")).unwrap().id, 3);
    }
}
