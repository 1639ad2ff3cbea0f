//! In-memory user table with optional JSON persistence.
//!
//! Same arena-with-indices shape as the expiring store, minus expiry —
//! users do not age out. Opened with a data file, the table is loaded at
//! startup and written back on save.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use wicket_store::Page;
use wicket_types::Role;

use crate::user::User;
use crate::IdentityError;

/// Validated, ready-to-apply field changes; `None` leaves a field as is.
#[derive(Clone, Debug, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

/// The user repository. Cloning is cheap; every clone works on the same
/// table.
#[derive(Clone)]
pub struct UserStore {
    table: Arc<RwLock<Table>>,
    path: Option<PathBuf>,
}

struct Table {
    users: Vec<User>,
    by_id: HashMap<Uuid, usize>,
    by_badge: HashMap<u32, usize>,
}

impl Table {
    fn new(users: Vec<User>) -> Self {
        let mut table = Self {
            by_id: HashMap::with_capacity(users.len()),
            by_badge: HashMap::with_capacity(users.len()),
            users,
        };
        for (idx, user) in table.users.iter().enumerate() {
            table.by_id.insert(user.id, idx);
            table.by_badge.insert(user.badge, idx);
        }
        table
    }

    fn chiefs(&self) -> usize {
        self.users.iter().filter(|u| u.role == Role::Chief).count()
    }
}

impl UserStore {
    /// A volatile store with no backing file.
    pub fn new() -> Self {
        Self {
            table: Arc::new(RwLock::new(Table::new(Vec::new()))),
            path: None,
        }
    }

    /// A store backed by a JSON data file. A missing file means an empty
    /// directory; a present but unreadable one is an error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IdentityError> {
        let path = path.as_ref();
        let users = match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str::<Vec<User>>(&contents)
                .map_err(|e| IdentityError::DataFile(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(IdentityError::DataFile(format!("{}: {e}", path.display())))
            }
        };

        Ok(Self {
            table: Arc::new(RwLock::new(Table::new(users))),
            path: Some(path.to_path_buf()),
        })
    }

    /// Write the table back to the data file, if one was configured.
    pub async fn save(&self) -> Result<(), IdentityError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let table = self.table.read().await;
        let contents = serde_json::to_string_pretty(&table.users)
            .map_err(|e| IdentityError::DataFile(e.to_string()))?;
        std::fs::write(path, contents)
            .map_err(|e| IdentityError::DataFile(format!("{}: {e}", path.display())))?;

        tracing::debug!(count = table.users.len(), path = %path.display(), "user table saved");
        Ok(())
    }

    /// A defensive copy of the window `[offset, offset + limit)`, clamped
    /// to the live range; `total` is always the full count.
    pub async fn list(&self, offset: usize, limit: usize) -> Page<User> {
        let table = self.table.read().await;
        let total = table.users.len();

        let lo = offset.min(total);
        let hi = offset.saturating_add(limit).min(total);
        if lo >= hi {
            return Page {
                offset: lo,
                records: Vec::new(),
                total,
            };
        }

        Page {
            offset: lo,
            records: table.users[lo..hi].to_vec(),
            total,
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<User, IdentityError> {
        let table = self.table.read().await;
        table
            .by_id
            .get(&id)
            .map(|&idx| table.users[idx].clone())
            .ok_or(IdentityError::NotFound)
    }

    pub async fn get_by_badge(&self, badge: u32) -> Result<User, IdentityError> {
        let table = self.table.read().await;
        table
            .by_badge
            .get(&badge)
            .map(|&idx| table.users[idx].clone())
            .ok_or(IdentityError::NotFound)
    }

    /// Append a user. Badge numbers are unique.
    pub async fn create(&self, user: User) -> Result<(), IdentityError> {
        let mut table = self.table.write().await;
        if table.by_badge.contains_key(&user.badge) {
            return Err(IdentityError::BadgeTaken);
        }

        let idx = table.users.len();
        table.by_id.insert(user.id, idx);
        table.by_badge.insert(user.badge, idx);
        table.users.push(user);
        Ok(())
    }

    /// Apply field changes in place. Demoting a chief requires at least
    /// one other chief to remain.
    pub async fn update(&self, id: Uuid, update: UserUpdate) -> Result<(), IdentityError> {
        let mut table = self.table.write().await;
        let &idx = table.by_id.get(&id).ok_or(IdentityError::NotFound)?;

        if let Some(role) = update.role {
            let current = table.users[idx].role;
            if current == Role::Chief && role != Role::Chief && table.chiefs() < 2 {
                return Err(IdentityError::NotEnoughChiefs);
            }
        }

        let user = &mut table.users[idx];
        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(password_hash) = update.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        Ok(())
    }

    /// Remove a user by swap-with-last; unknown ids are a no-op. Deleting
    /// the last chief is refused.
    pub async fn delete(&self, id: Uuid) -> Result<(), IdentityError> {
        let mut table = self.table.write().await;
        let Some(&idx) = table.by_id.get(&id) else {
            return Ok(());
        };

        if table.users[idx].role == Role::Chief && table.chiefs() < 2 {
            return Err(IdentityError::NotEnoughChiefs);
        }

        table.by_id.remove(&id);
        let removed = table.users.swap_remove(idx);
        table.by_badge.remove(&removed.badge);

        if idx < table.users.len() {
            let moved_id = table.users[idx].id;
            let moved_badge = table.users[idx].badge;
            table.by_id.insert(moved_id, idx);
            table.by_badge.insert(moved_badge, idx);
        }
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(badge: u32, role: Role) -> User {
        User::new(
            badge,
            "Test User",
            "test@example.com",
            "some-password",
            role,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn duplicate_badge_is_rejected() {
        let store = UserStore::new();
        store.create(user(7, Role::User)).await.unwrap();

        let result = store.create(user(7, Role::Admin)).await;
        assert!(matches!(result, Err(IdentityError::BadgeTaken)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn delete_fixes_moved_indexes() {
        let store = UserStore::new();
        let first = user(1, Role::User);
        let second = user(2, Role::User);
        let third = user(3, Role::User);
        store.create(first.clone()).await.unwrap();
        store.create(second.clone()).await.unwrap();
        store.create(third.clone()).await.unwrap();

        store.delete(first.id).await.unwrap();

        assert_eq!(store.get(third.id).await.unwrap().badge, 3);
        assert_eq!(store.get_by_badge(3).await.unwrap().id, third.id);
        assert_eq!(store.get_by_badge(2).await.unwrap().id, second.id);
        assert!(matches!(
            store.get(first.id).await,
            Err(IdentityError::NotFound)
        ));
    }

    #[tokio::test]
    async fn delete_unknown_id_is_a_noop() {
        let store = UserStore::new();
        store.delete(Uuid::now_v7()).await.unwrap();
    }

    #[tokio::test]
    async fn last_chief_cannot_be_deleted_or_demoted() {
        let store = UserStore::new();
        let chief = user(1, Role::Chief);
        store.create(chief.clone()).await.unwrap();

        assert!(matches!(
            store.delete(chief.id).await,
            Err(IdentityError::NotEnoughChiefs)
        ));
        let demote = UserUpdate {
            role: Some(Role::User),
            ..Default::default()
        };
        assert!(matches!(
            store.update(chief.id, demote).await,
            Err(IdentityError::NotEnoughChiefs)
        ));
    }

    #[tokio::test]
    async fn chief_can_go_when_another_remains() {
        let store = UserStore::new();
        let first = user(1, Role::Chief);
        let second = user(2, Role::Chief);
        store.create(first.clone()).await.unwrap();
        store.create(second.clone()).await.unwrap();

        store.delete(first.id).await.unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn update_applies_only_present_fields() {
        let store = UserStore::new();
        let original = user(5, Role::User);
        store.create(original.clone()).await.unwrap();

        let update = UserUpdate {
            name: Some("Renamed".to_owned()),
            ..Default::default()
        };
        store.update(original.id, update).await.unwrap();

        let read = store.get(original.id).await.unwrap();
        assert_eq!(read.name, "Renamed");
        assert_eq!(read.email, original.email);
        assert_eq!(read.role, original.role);
    }

    #[tokio::test]
    async fn persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");

        let store = UserStore::open(&path).unwrap();
        assert!(store.is_empty().await);
        let ada = user(42, Role::Chief);
        store.create(ada.clone()).await.unwrap();
        store.save().await.unwrap();

        let reopened = UserStore::open(&path).unwrap();
        let read = reopened.get(ada.id).await.unwrap();
        assert_eq!(read.badge, 42);
        assert_eq!(read.role, Role::Chief);
        // The credential survives, so logins still work after a restart.
        assert!(read.verify_password("some-password").is_ok());
    }

    #[tokio::test]
    async fn corrupt_data_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, "not json at all").unwrap();

        assert!(matches!(
            UserStore::open(&path),
            Err(IdentityError::DataFile(_))
        ));
    }
}
