// Data structures shared by the catalog, filter, likes and session modules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// Identifier of a catalog item. Unique within one kind's catalog only,
// so the same id may appear under vehicles and services.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        ItemId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        ItemId(value.to_string())
    }
}

// The three independent browsing lists of the renter screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Vehicle,
    Service,
    Discover,
}

impl ItemKind {
    pub const ALL: [ItemKind; 3] = [ItemKind::Vehicle, ItemKind::Service, ItemKind::Discover];

    // Maps a route segment ("vehicles", "services", "discover") to a kind
    pub fn from_path(segment: &str) -> Option<Self> {
        match segment.to_ascii_lowercase().as_str() {
            "vehicles" | "vehicle" | "cars" => Some(ItemKind::Vehicle),
            "services" | "service" => Some(ItemKind::Service),
            "discover" => Some(ItemKind::Discover),
            _ => None,
        }
    }

    pub fn as_path(&self) -> &'static str {
        match self {
            ItemKind::Vehicle => "vehicles",
            ItemKind::Service => "services",
            ItemKind::Discover => "discover",
        }
    }
}

// Vehicle classes used as the group headings on the browse screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VehicleClass {
    Essential,
    Executive,
    Signature,
}

impl VehicleClass {
    pub fn label(&self) -> &'static str {
        match self {
            VehicleClass::Essential => "Essential",
            VehicleClass::Executive => "Executive",
            VehicleClass::Signature => "Signature",
        }
    }
}

// Filterable attributes. Which ones are populated depends on the item kind:
// services usually carry only location and rating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facets {
    pub fuel_type: Option<String>,
    pub seats: Option<u8>,
    pub location: Option<String>,
    pub color: Option<String>,
    pub rating: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: ItemId,
    pub kind: ItemKind,
    pub name: String,
    pub price: String, // Display string, e.g. "KSh 4,500/day" or "Various"
    #[serde(default)]
    pub facets: Facets,
}

impl CatalogItem {
    // Text fields searched by the free-text query
    pub fn searchable_fields(&self) -> impl Iterator<Item = &str> {
        let vehicle_fields = match self.kind {
            ItemKind::Vehicle => [self.facets.color.as_deref(), self.facets.fuel_type.as_deref()],
            _ => [None, None],
        };
        std::iter::once(self.name.as_str()).chain(vehicle_fields.into_iter().flatten())
    }
}

// A named group of items rendered under one heading (e.g. "Executive")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogGroup {
    pub name: String,
    pub items: Vec<CatalogItem>,
}

// Category id -> member item ids. Categories are separate groupings,
// items do not carry their categories themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryIndex(pub BTreeMap<String, Vec<ItemId>>);

impl CategoryIndex {
    pub fn insert(&mut self, category: impl Into<String>, members: Vec<ItemId>) {
        self.0.insert(category.into(), members);
    }

    pub fn members(&self, category: &str) -> Option<&[ItemId]> {
        self.0.get(category).map(Vec::as_slice)
    }

    pub fn category_ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    // True when `id` belongs to at least one of the selected categories.
    // Unknown category ids simply contribute no members.
    pub fn in_any(&self, id: &ItemId, selected: &BTreeSet<String>) -> bool {
        selected
            .iter()
            .filter_map(|category| self.members(category))
            .any(|members| members.contains(id))
    }
}

// Everything one browse screen needs for a kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub kind: ItemKind,
    pub groups: Vec<CatalogGroup>,
    #[serde(default)]
    pub categories: CategoryIndex,
}

impl Catalog {
    pub fn items(&self) -> impl Iterator<Item = &CatalogItem> {
        self.groups.iter().flat_map(|group| group.items.iter())
    }

    pub fn find(&self, id: &ItemId) -> Option<&CatalogItem> {
        self.items().find(|item| &item.id == id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.find(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|group| group.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Role the user signed in with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Renter,
    Owner,
    Driver,
}

// Snapshot of the last successfully authenticated identity. Persisted under
// the last-session key, overwritten on every sign-in, erased on logout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub user_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub role: Role,
    pub signed_in_at: DateTime<Utc>,
}

// Body of POST /api/session. Credentials are verified by the backend before
// this point; the request carries the verified identity.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub user_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub role: Role,
}

impl SignInRequest {
    pub fn into_record(self, signed_in_at: DateTime<Utc>) -> SessionRecord {
        SessionRecord {
            user_id: self.user_id,
            display_name: self.display_name,
            email: self.email,
            role: self.role,
            signed_in_at,
        }
    }
}
