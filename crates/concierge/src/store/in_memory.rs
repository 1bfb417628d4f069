use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::DirectoryStore;
use crate::errors::{StoreError, StoreResult};
use crate::models::directory::{Region, User, UserDraft};

lazy_static! {
    static ref EMAIL: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

#[derive(Debug, Clone)]
struct StoredUser {
    id: i64,
    name: String,
    email: String,
    region_id: i64,
}

#[derive(Debug, Default)]
struct Tables {
    regions: BTreeMap<i64, Region>,
    users: BTreeMap<i64, StoredUser>,
    last_region_id: i64,
    last_user_id: i64,
}

impl Tables {
    fn hydrate(&self, user: &StoredUser) -> StoreResult<User> {
        let region = self.regions.get(&user.region_id).cloned().ok_or_else(|| {
            StoreError::Unavailable(format!(
                "User {} references missing region {}",
                user.id, user.region_id
            ))
        })?;
        Ok(User {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            region,
        })
    }

    fn hydrate_all<'a, I>(&self, users: I) -> StoreResult<Vec<User>>
    where
        I: IntoIterator<Item = &'a StoredUser>,
    {
        users.into_iter().map(|user| self.hydrate(user)).collect()
    }

    fn region_name_taken(&self, name: &str, except: Option<i64>) -> bool {
        self.regions
            .values()
            .any(|r| Some(r.id) != except && r.name.eq_ignore_ascii_case(name))
    }

    fn check_user(&self, draft: &UserDraft, except: Option<i64>) -> StoreResult<()> {
        if draft.name.trim().is_empty() {
            return Err(StoreError::Invalid("User name must not be blank".to_string()));
        }
        if !EMAIL.is_match(&draft.email) {
            return Err(StoreError::Invalid(format!(
                "Invalid email address: {}",
                draft.email
            )));
        }
        if self
            .users
            .values()
            .any(|u| Some(u.id) != except && u.email.eq_ignore_ascii_case(&draft.email))
        {
            return Err(StoreError::Invalid(format!(
                "Email already in use: {}",
                draft.email
            )));
        }
        if !self.regions.contains_key(&draft.region_id) {
            return Err(StoreError::NotFound(format!(
                "Region with ID {} was not found.",
                draft.region_id
            )));
        }
        Ok(())
    }
}

/// Directory kept in process memory, with sequential ids starting at 1.
///
/// Enforces unique region names, valid and unique emails, and refuses to
/// delete a region that still has users.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DirectoryStore for InMemoryStore {
    async fn find_regions(&self) -> StoreResult<Vec<Region>> {
        Ok(self.tables().regions.values().cloned().collect())
    }

    async fn find_region(&self, id: i64) -> StoreResult<Option<Region>> {
        Ok(self.tables().regions.get(&id).cloned())
    }

    async fn find_region_by_name(&self, name: &str) -> StoreResult<Option<Region>> {
        Ok(self
            .tables()
            .regions
            .values()
            .find(|r| r.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn create_region(&self, name: &str) -> StoreResult<Region> {
        let mut tables = self.tables();
        if name.trim().is_empty() {
            return Err(StoreError::Invalid("Region name must not be blank".to_string()));
        }
        if tables.region_name_taken(name, None) {
            return Err(StoreError::Invalid(format!(
                "Region name already exists: {}",
                name
            )));
        }

        tables.last_region_id += 1;
        let region = Region {
            id: tables.last_region_id,
            name: name.to_string(),
        };
        tables.regions.insert(region.id, region.clone());
        Ok(region)
    }

    async fn update_region(&self, id: i64, name: &str) -> StoreResult<Option<Region>> {
        let mut tables = self.tables();
        if !tables.regions.contains_key(&id) {
            return Ok(None);
        }
        if name.trim().is_empty() {
            return Err(StoreError::Invalid("Region name must not be blank".to_string()));
        }
        if tables.region_name_taken(name, Some(id)) {
            return Err(StoreError::Invalid(format!(
                "Region name already exists: {}",
                name
            )));
        }

        Ok(tables.regions.get_mut(&id).map(|region| {
            region.name = name.to_string();
            region.clone()
        }))
    }

    async fn delete_region(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.tables();
        let users = tables.users.values().filter(|u| u.region_id == id).count();
        if users > 0 {
            return Err(StoreError::Conflict(format!(
                "Region {} still has {} user(s)",
                id, users
            )));
        }
        Ok(tables.regions.remove(&id).is_some())
    }

    async fn find_users(&self, name: Option<&str>) -> StoreResult<Vec<User>> {
        let tables = self.tables();
        match name {
            None => tables.hydrate_all(tables.users.values()),
            Some(name) => {
                let needle = name.to_lowercase();
                tables.hydrate_all(
                    tables
                        .users
                        .values()
                        .filter(|u| u.name.to_lowercase().contains(&needle)),
                )
            }
        }
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        let tables = self.tables();
        tables.users.get(&id).map(|u| tables.hydrate(u)).transpose()
    }

    async fn find_users_by_region(&self, region_id: i64) -> StoreResult<Vec<User>> {
        let tables = self.tables();
        tables.hydrate_all(tables.users.values().filter(|u| u.region_id == region_id))
    }

    async fn create_user(&self, draft: UserDraft) -> StoreResult<User> {
        let mut tables = self.tables();
        tables.check_user(&draft, None)?;

        tables.last_user_id += 1;
        let user = StoredUser {
            id: tables.last_user_id,
            name: draft.name,
            email: draft.email,
            region_id: draft.region_id,
        };
        tables.users.insert(user.id, user.clone());
        tables.hydrate(&user)
    }

    async fn update_user(&self, id: i64, draft: UserDraft) -> StoreResult<Option<User>> {
        let mut tables = self.tables();
        if !tables.users.contains_key(&id) {
            return Ok(None);
        }
        tables.check_user(&draft, Some(id))?;

        let user = StoredUser {
            id,
            name: draft.name,
            email: draft.email,
            region_id: draft.region_id,
        };
        tables.users.insert(id, user.clone());
        tables.hydrate(&user).map(Some)
    }

    async fn delete_user(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tables().users.remove(&id).is_some())
    }
}
