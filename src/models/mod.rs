use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Identifier of a catalog item (movie)
pub type ItemId = u32;

/// Identifier of a rating user
pub type UserId = u32;

/// A recommendable movie from the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
}

impl Item {
    pub fn new(id: ItemId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

/// A single historical rating record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rating {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub value: f32,
}

impl Rating {
    pub fn new(user_id: UserId, item_id: ItemId, value: f32) -> Self {
        Self {
            user_id,
            item_id,
            value,
        }
    }
}

/// A seed entry as supplied by a caller
///
/// Request payloads are not trusted to contain well-formed identifiers, so
/// anything that is not an integer (or a string holding one) is kept as
/// `Malformed`. It still counts as a seed but never resolves to an item.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SeedId {
    Item(ItemId),
    Malformed(serde_json::Value),
}

impl SeedId {
    /// Returns the item identifier this seed refers to, if it is well-formed
    pub fn item_id(&self) -> Option<ItemId> {
        match self {
            SeedId::Item(id) => Some(*id),
            SeedId::Malformed(serde_json::Value::String(s)) => s.trim().parse().ok(),
            SeedId::Malformed(_) => None,
        }
    }
}

impl From<ItemId> for SeedId {
    fn from(id: ItemId) -> Self {
        SeedId::Item(id)
    }
}

impl Display for SeedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeedId::Item(id) => write!(f, "{}", id),
            SeedId::Malformed(value) => write!(f, "{}", value),
        }
    }
}

// ============================================================================
// HTTP boundary types
// ============================================================================

/// Catalog entry returned to the selection UI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub id: ItemId,
    pub title: String,
}

impl From<&Item> for CatalogItem {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
        }
    }
}

/// Request for recommendations based on liked movies
#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub movie_ids: Vec<SeedId>,
}

/// A single recommended title
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendedTitle {
    pub title: String,
}

impl From<Item> for RecommendedTitle {
    fn from(item: Item) -> Self {
        Self { title: item.title }
    }
}

/// Ordered recommendations, best first
#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<RecommendedTitle>,
}
