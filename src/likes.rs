// Wishlist / like state. Sets are immutable snapshots: toggling builds a new
// set and the holder swaps it in wholesale.

use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{ItemId, ItemKind};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LikeSet(Arc<BTreeSet<ItemId>>);

impl LikeSet {
    pub fn new() -> Self {
        LikeSet::default()
    }

    // Removes `id` if present, adds it otherwise
    #[must_use]
    pub fn toggle(&self, id: &ItemId) -> LikeSet {
        let mut ids = BTreeSet::clone(&self.0);
        if !ids.remove(id) {
            ids.insert(id.clone());
        }
        LikeSet(Arc::new(ids))
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemId> {
        self.0.iter()
    }
}

impl FromIterator<ItemId> for LikeSet {
    fn from_iter<T: IntoIterator<Item = ItemId>>(iter: T) -> Self {
        LikeSet(Arc::new(iter.into_iter().collect()))
    }
}

impl Serialize for LikeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

// One independent set per kind, ids may collide across kinds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wishlist {
    vehicles: LikeSet,
    services: LikeSet,
    discover: LikeSet,
}

impl Wishlist {
    pub fn get(&self, kind: ItemKind) -> &LikeSet {
        match kind {
            ItemKind::Vehicle => &self.vehicles,
            ItemKind::Service => &self.services,
            ItemKind::Discover => &self.discover,
        }
    }

    #[must_use]
    pub fn toggled(&self, kind: ItemKind, id: &ItemId) -> Wishlist {
        let mut next = self.clone();
        let slot = match kind {
            ItemKind::Vehicle => &mut next.vehicles,
            ItemKind::Service => &mut next.services,
            ItemKind::Discover => &mut next.discover,
        };
        *slot = slot.toggle(id);
        next
    }
}

// Outcome of a toggle as seen by the caller
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleOutcome {
    pub liked: bool,
    pub likes: LikeSet,
}

// Session-scoped wishlist holder. Toggles are applied under the write lock
// so rapid repeated taps never lose an update. Nothing is persisted.
#[derive(Debug, Default)]
pub struct LikeStore {
    wishlist: RwLock<Wishlist>,
}

impl LikeStore {
    pub fn new() -> Self {
        LikeStore::default()
    }

    pub async fn toggle(&self, kind: ItemKind, id: &ItemId) -> ToggleOutcome {
        let mut guard = self.wishlist.write().await;
        let next = guard.toggled(kind, id);
        *guard = next;
        let likes = guard.get(kind).clone();
        let liked = likes.contains(id);
        tracing::info!(kind = kind.as_path(), id = %id, liked, "Toggled like");
        ToggleOutcome { liked, likes }
    }

    pub async fn snapshot(&self, kind: ItemKind) -> LikeSet {
        self.wishlist.read().await.get(kind).clone()
    }

    // Logout starts a fresh session
    pub async fn clear(&self) {
        *self.wishlist.write().await = Wishlist::default();
    }
}
