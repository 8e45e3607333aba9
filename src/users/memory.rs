use axum::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::users::{
    repo::{StoreError, UserStore},
    repo_types::{Address, Collection, HistoryItem, Item, NewUser, ProfilePatch, User, WishlistItem},
};

pub const DEMO_EMAIL: &str = "john.doe@example.com";
pub const DEMO_PASSWORD: &str = "password123";

/// Process-local user store. Contents are lost on exit.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the John Doe demo account.
    pub fn with_demo_user() -> anyhow::Result<Self> {
        let user = demo_user()?;
        info!(user_id = %user.id, email = %user.email, "seeded demo user");
        Ok(Self {
            users: RwLock::new(vec![user]),
        })
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let user = User {
            id: Uuid::new_v4(),
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            password_hash: new.password_hash,
            phone: None,
            bio: None,
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
            wishlist: Vec::new(),
            travel_history: Vec::new(),
            addresses: Vec::new(),
        };
        users.push(user.clone());
        debug!(user_id = %user.id, total = users.len(), "user inserted");
        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> Result<User, StoreError> {
        // Uniqueness is a registration-time rule only; lookups by email take the first match.
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::UserNotFound)?;
        user.apply(patch, OffsetDateTime::now_utc());
        Ok(user.clone())
    }

    async fn list_items(
        &self,
        user_id: Uuid,
        collection: Collection,
    ) -> Result<Vec<Item>, StoreError> {
        let users = self.users.read().await;
        let user = users
            .iter()
            .find(|u| u.id == user_id)
            .ok_or(StoreError::UserNotFound)?;
        Ok(user.items(collection))
    }

    async fn append_item(&self, user_id: Uuid, item: Item) -> Result<Item, StoreError> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(StoreError::UserNotFound)?;
        user.push_item(item.clone());
        Ok(item)
    }

    async fn remove_item(
        &self,
        user_id: Uuid,
        collection: Collection,
        item_id: Uuid,
    ) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(StoreError::UserNotFound)?;
        if user.remove_item(collection, item_id) {
            Ok(())
        } else {
            Err(StoreError::ItemNotFound(collection))
        }
    }
}

fn demo_user() -> anyhow::Result<User> {
    let now = OffsetDateTime::now_utc();
    Ok(User {
        id: Uuid::new_v4(),
        first_name: "John".into(),
        last_name: "Doe".into(),
        email: DEMO_EMAIL.into(),
        password_hash: hash_password(DEMO_PASSWORD)?,
        phone: Some("+1 (555) 123-4567".into()),
        bio: Some(
            "Travel enthusiast and adventure seeker. Always looking for the next destination to explore!"
                .into(),
        ),
        created_at: now,
        updated_at: None,
        wishlist: vec![
            WishlistItem {
                id: Uuid::new_v4(),
                destination: "Bali, Indonesia".into(),
                notes: "Visit the rice terraces and temples".into(),
                created_at: now,
            },
            WishlistItem {
                id: Uuid::new_v4(),
                destination: "Santorini, Greece".into(),
                notes: "Watch the sunset in Oia".into(),
                created_at: now,
            },
        ],
        travel_history: vec![
            HistoryItem {
                id: Uuid::new_v4(),
                destination: "Tokyo, Japan".into(),
                dates: "May 2023".into(),
                notes: "Amazing food and culture!".into(),
                created_at: now,
            },
            HistoryItem {
                id: Uuid::new_v4(),
                destination: "Paris, France".into(),
                dates: "September 2022".into(),
                notes: "Visited the Eiffel Tower and Louvre".into(),
                created_at: now,
            },
        ],
        addresses: vec![Address {
            id: Uuid::new_v4(),
            label: "Home".into(),
            street: "123 Main St".into(),
            city: "San Francisco".into(),
            state: "CA".into(),
            zip: "94105".into(),
            country: "United States".into(),
            created_at: now,
        }],
    })
}
