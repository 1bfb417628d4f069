//! Persistence collaborator for the directory of regions and users.
//!
//! Tools only talk to the [`DirectoryStore`] trait; [`InMemoryStore`] is the
//! process-local implementation used by the server and the tests.
mod in_memory;

pub use in_memory::InMemoryStore;

use async_trait::async_trait;

use crate::errors::StoreResult;
use crate::models::directory::{Region, User, UserDraft};

#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn find_regions(&self) -> StoreResult<Vec<Region>>;

    async fn find_region(&self, id: i64) -> StoreResult<Option<Region>>;

    /// Exact match on the region name, ignoring case
    async fn find_region_by_name(&self, name: &str) -> StoreResult<Option<Region>>;

    async fn create_region(&self, name: &str) -> StoreResult<Region>;

    /// Rename a region; `None` when it does not exist
    async fn update_region(&self, id: i64, name: &str) -> StoreResult<Option<Region>>;

    /// Returns whether a region was removed
    async fn delete_region(&self, id: i64) -> StoreResult<bool>;

    /// All users, or those whose name contains `name` (ignoring case)
    async fn find_users(&self, name: Option<&str>) -> StoreResult<Vec<User>>;

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>>;

    async fn find_users_by_region(&self, region_id: i64) -> StoreResult<Vec<User>>;

    async fn create_user(&self, draft: UserDraft) -> StoreResult<User>;

    /// Replace all fields of a user; `None` when it does not exist
    async fn update_user(&self, id: i64, draft: UserDraft) -> StoreResult<Option<User>>;

    /// Returns whether a user was removed
    async fn delete_user(&self, id: i64) -> StoreResult<bool>;
}
