use axum::async_trait;
use uuid::Uuid;

use crate::users::repo_types::{Collection, Item, NewUser, ProfilePatch, User};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("User not found")]
    UserNotFound,

    #[error("{} not found", .0.label())]
    ItemNotFound(Collection),

    #[error("User already exists with this email")]
    DuplicateEmail,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Storage seam for user records and their sub-collections.
///
/// Handlers only talk to this trait, so the in-memory store can be swapped for
/// a database-backed one. Implementations must make `insert` atomic with its
/// email uniqueness check. `update_profile` does not re-check uniqueness, and
/// `find_by_email` returns the earliest-registered match.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Inserts a user unless the email is already taken.
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> Result<User, StoreError>;

    async fn list_items(&self, user_id: Uuid, collection: Collection)
        -> Result<Vec<Item>, StoreError>;
    async fn append_item(&self, user_id: Uuid, item: Item) -> Result<Item, StoreError>;
    async fn remove_item(
        &self,
        user_id: Uuid,
        collection: Collection,
        item_id: Uuid,
    ) -> Result<(), StoreError>;
}
