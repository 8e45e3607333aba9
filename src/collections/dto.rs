use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::services::{non_blank, require_all},
    error::ApiError,
    users::repo_types::{Address, HistoryItem, Item, WishlistItem},
};

/// Converts a create-request body into a fresh item with id and timestamp.
pub trait NewItem {
    fn into_item(self, now: OffsetDateTime) -> Result<Item, ApiError>;
}

#[derive(Debug, Deserialize)]
pub struct CreateWishlistItem {
    pub destination: Option<String>,
    pub notes: Option<String>,
}

impl NewItem for CreateWishlistItem {
    fn into_item(self, now: OffsetDateTime) -> Result<Item, ApiError> {
        let [destination] = require_all([("destination", self.destination)])?;
        Ok(Item::Wishlist(WishlistItem {
            id: Uuid::new_v4(),
            destination,
            notes: non_blank(self.notes).unwrap_or_default(),
            created_at: now,
        }))
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateHistoryItem {
    pub destination: Option<String>,
    pub dates: Option<String>,
    pub notes: Option<String>,
}

impl NewItem for CreateHistoryItem {
    fn into_item(self, now: OffsetDateTime) -> Result<Item, ApiError> {
        let [destination] = require_all([("destination", self.destination)])?;
        Ok(Item::History(HistoryItem {
            id: Uuid::new_v4(),
            destination,
            dates: non_blank(self.dates).unwrap_or_default(),
            notes: non_blank(self.notes).unwrap_or_default(),
            created_at: now,
        }))
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAddress {
    pub label: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
}

impl NewItem for CreateAddress {
    fn into_item(self, now: OffsetDateTime) -> Result<Item, ApiError> {
        let [street, city, country] = require_all([
            ("street", self.street),
            ("city", self.city),
            ("country", self.country),
        ])?;
        Ok(Item::Address(Address {
            id: Uuid::new_v4(),
            label: non_blank(self.label).unwrap_or_else(|| "Address".into()),
            street,
            city,
            state: non_blank(self.state).unwrap_or_default(),
            zip: non_blank(self.zip).unwrap_or_default(),
            country,
            created_at: now,
        }))
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: String,
}
