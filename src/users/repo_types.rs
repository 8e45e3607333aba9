use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record held by the store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 PHC string, never exposed in JSON
    pub phone: Option<String>,
    pub bio: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    pub wishlist: Vec<WishlistItem>,
    pub travel_history: Vec<HistoryItem>,
    pub addresses: Vec<Address>,
}

impl User {
    pub fn items(&self, collection: Collection) -> Vec<Item> {
        match collection {
            Collection::Wishlist => self.wishlist.iter().cloned().map(Item::Wishlist).collect(),
            Collection::History => self.travel_history.iter().cloned().map(Item::History).collect(),
            Collection::Addresses => self.addresses.iter().cloned().map(Item::Address).collect(),
        }
    }

    pub fn push_item(&mut self, item: Item) {
        match item {
            Item::Wishlist(w) => self.wishlist.push(w),
            Item::History(h) => self.travel_history.push(h),
            Item::Address(a) => self.addresses.push(a),
        }
    }

    /// Removes the item with `item_id` from `collection`; returns whether one was removed.
    pub fn remove_item(&mut self, collection: Collection, item_id: Uuid) -> bool {
        fn retain_other<T>(items: &mut Vec<T>, id_of: impl Fn(&T) -> Uuid, item_id: Uuid) -> bool {
            let before = items.len();
            items.retain(|it| id_of(it) != item_id);
            items.len() != before
        }
        match collection {
            Collection::Wishlist => retain_other(&mut self.wishlist, |w| w.id, item_id),
            Collection::History => retain_other(&mut self.travel_history, |h| h.id, item_id),
            Collection::Addresses => retain_other(&mut self.addresses, |a| a.id, item_id),
        }
    }

    pub fn apply(&mut self, patch: ProfilePatch, now: OffsetDateTime) {
        if let Some(v) = patch.first_name {
            self.first_name = v;
        }
        if let Some(v) = patch.last_name {
            self.last_name = v;
        }
        if let Some(v) = patch.email {
            self.email = v;
        }
        if let Some(v) = patch.phone {
            self.phone = Some(v);
        }
        if let Some(v) = patch.bio {
            self.bio = Some(v);
        }
        self.updated_at = Some(now);
    }
}

/// Fields needed to register a user. `email` must already be normalized.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
}

/// Partial profile update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub id: Uuid,
    pub destination: String,
    pub notes: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: Uuid,
    pub destination: String,
    pub dates: String,
    pub notes: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Uuid,
    pub label: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The three per-user sub-collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Wishlist,
    History,
    Addresses,
}

impl Collection {
    /// Human-readable name used in response messages.
    pub fn label(self) -> &'static str {
        match self {
            Collection::Wishlist => "Wishlist item",
            Collection::History => "Travel history item",
            Collection::Addresses => "Address",
        }
    }
}

/// An item of any sub-collection. Serializes as the bare inner item.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Item {
    Wishlist(WishlistItem),
    History(HistoryItem),
    Address(Address),
}

impl Item {
    pub fn id(&self) -> Uuid {
        match self {
            Item::Wishlist(w) => w.id,
            Item::History(h) => h.id,
            Item::Address(a) => a.id,
        }
    }

    pub fn collection(&self) -> Collection {
        match self {
            Item::Wishlist(_) => Collection::Wishlist,
            Item::History(_) => Collection::History,
            Item::Address(_) => Collection::Addresses,
        }
    }
}
