// Catalog provider: built-in seed catalogs for the three browse screens,
// optionally replaced by a JSON file at startup.

use anyhow::{Context, Result, bail};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::{fs, path::Path};

use crate::models::{
    Catalog, CatalogGroup, CatalogItem, CategoryIndex, Facets, ItemId, ItemKind, VehicleClass,
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogSet {
    pub vehicles: Catalog,
    pub services: Catalog,
    pub discover: Catalog,
}

impl CatalogSet {
    pub fn get(&self, kind: ItemKind) -> &Catalog {
        match kind {
            ItemKind::Vehicle => &self.vehicles,
            ItemKind::Service => &self.services,
            ItemKind::Discover => &self.discover,
        }
    }

    // Loads a catalog file; every catalog must be tagged with the kind of the
    // slot it sits in and ids must be unique within a kind
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file {}", path.display()))?;
        let set: CatalogSet = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog file {}", path.display()))?;
        set.validate()?;
        tracing::info!(
            path = %path.display(),
            vehicles = set.vehicles.len(),
            services = set.services.len(),
            discover = set.discover.len(),
            "Loaded catalog file"
        );
        Ok(set)
    }

    fn validate(&self) -> Result<()> {
        for kind in ItemKind::ALL {
            let catalog = self.get(kind);
            if catalog.kind != kind {
                bail!("Catalog under '{}' is tagged as {:?}", kind.as_path(), catalog.kind);
            }
            let mut seen = std::collections::HashSet::new();
            for item in catalog.items() {
                if item.kind != kind {
                    bail!("Item '{}' in '{}' has kind {:?}", item.id, kind.as_path(), item.kind);
                }
                if !seen.insert(&item.id) {
                    bail!("Duplicate item id '{}' in '{}'", item.id, kind.as_path());
                }
            }
        }
        Ok(())
    }
}

// Seed data used when no catalog file is configured
pub static SEED_CATALOG: Lazy<CatalogSet> = Lazy::new(|| CatalogSet {
    vehicles: seed_vehicles(),
    services: seed_services(),
    discover: seed_discover(),
});

#[allow(clippy::too_many_arguments)]
fn vehicle(
    id: &str,
    name: &str,
    price: &str,
    fuel: &str,
    seats: u8,
    location: &str,
    color: &str,
    rating: f32,
) -> CatalogItem {
    CatalogItem {
        id: ItemId::new(id),
        kind: ItemKind::Vehicle,
        name: name.to_string(),
        price: price.to_string(),
        facets: Facets {
            fuel_type: Some(fuel.to_string()),
            seats: Some(seats),
            location: Some(location.to_string()),
            color: Some(color.to_string()),
            rating: Some(rating),
        },
    }
}

fn located(kind: ItemKind, id: &str, name: &str, price: &str, location: &str, rating: f32) -> CatalogItem {
    CatalogItem {
        id: ItemId::new(id),
        kind,
        name: name.to_string(),
        price: price.to_string(),
        facets: Facets {
            location: Some(location.to_string()),
            rating: Some(rating),
            ..Facets::default()
        },
    }
}

fn ids(raw: &[&str]) -> Vec<ItemId> {
    raw.iter().map(|id| ItemId::new(*id)).collect()
}

fn seed_vehicles() -> Catalog {
    let group = |class: VehicleClass, items: Vec<CatalogItem>| CatalogGroup {
        name: class.label().to_string(),
        items,
    };
    let groups = vec![
        group(
            VehicleClass::Essential,
            vec![
                vehicle("1", "Toyota Axio", "KSh 3,000/day", "Petrol", 5, "Nairobi", "Silver", 4.3),
                vehicle("2", "Nissan Note", "KSh 2,800/day", "Petrol", 5, "Mombasa", "White", 4.1),
                vehicle("3", "Mazda Demio", "KSh 2,500/day", "Petrol", 5, "Kisumu", "Red", 4.0),
            ],
        ),
        group(
            VehicleClass::Executive,
            vec![
                vehicle("4", "Toyota Prado", "KSh 4,500/day", "Diesel", 7, "Nairobi", "Black", 4.8),
                vehicle("5", "Mercedes-Benz C200", "KSh 4,800/day", "Petrol", 5, "Nairobi", "Grey", 4.7),
                vehicle("6", "Mazda CX-5", "KSh 4,200/day", "Diesel", 5, "Nakuru", "Blue", 4.5),
                vehicle("7", "Subaru Forester", "KSh 4,600/day", "Petrol", 5, "Eldoret", "Green", 4.4),
            ],
        ),
        group(
            VehicleClass::Signature,
            vec![
                vehicle("8", "Range Rover Sport", "KSh 12,000/day", "Diesel", 5, "Nairobi", "White", 4.9),
                vehicle("9", "Tesla Model 3", "KSh 9,500/day", "Electric", 5, "Nairobi", "Pearl White", 4.9),
                vehicle("10", "Toyota Land Cruiser V8", "KSh 15,000/day", "Diesel", 8, "Mombasa", "Black", 4.8),
            ],
        ),
    ];

    let mut categories = CategoryIndex::default();
    categories.insert("suv", ids(&["4", "6", "7", "8", "10"]));
    categories.insert("sedan", ids(&["1", "5", "9"]));
    categories.insert("hatchback", ids(&["2", "3"]));
    categories.insert("electric", ids(&["9"]));
    categories.insert("luxury", ids(&["5", "8", "9", "10"]));
    categories.insert("family", ids(&["4", "7", "10"]));

    Catalog { kind: ItemKind::Vehicle, groups, categories }
}

fn seed_services() -> Catalog {
    let service = |id: &str, name: &str, price: &str, location: &str, rating: f32| {
        located(ItemKind::Service, id, name, price, location, rating)
    };
    let groups = vec![
        CatalogGroup {
            name: "Drivers".to_string(),
            items: vec![
                service("1", "Personal Chauffeur", "KSh 3,500/day", "Nairobi", 4.8),
                service("2", "Long Distance Driver", "KSh 5,000/trip", "Nairobi", 4.6),
                service("3", "Safari Guide Driver", "KSh 7,500/day", "Nakuru", 4.9),
            ],
        },
        CatalogGroup {
            name: "Transfers".to_string(),
            items: vec![
                service("4", "Airport Pickup", "KSh 2,500/trip", "Nairobi", 4.7),
                service("5", "SGR Station Transfer", "KSh 1,800/trip", "Mombasa", 4.4),
            ],
        },
        CatalogGroup {
            name: "Events".to_string(),
            items: vec![
                service("6", "Wedding Car Package", "Various", "Nairobi", 4.9),
                service("7", "Corporate Fleet Hire", "KSh 25,000/day", "Nairobi", 4.5),
            ],
        },
    ];

    let mut categories = CategoryIndex::default();
    categories.insert("chauffeur", ids(&["1", "2", "3"]));
    categories.insert("transfers", ids(&["4", "5"]));
    categories.insert("events", ids(&["6", "7"]));
    categories.insert("tourism", ids(&["3"]));

    Catalog { kind: ItemKind::Service, groups, categories }
}

fn seed_discover() -> Catalog {
    let pick = |id: &str, name: &str, price: &str, location: &str, rating: f32| {
        located(ItemKind::Discover, id, name, price, location, rating)
    };
    let groups = vec![
        CatalogGroup {
            name: "Weekend Getaways".to_string(),
            items: vec![
                pick("1", "Naivasha Road Trip", "KSh 9,000/weekend", "Naivasha", 4.7),
                pick("2", "Diani Beach Drive", "KSh 14,000/weekend", "Diani", 4.8),
            ],
        },
        CatalogGroup {
            name: "Top Rated".to_string(),
            items: vec![
                pick("3", "Maasai Mara Safari Cruiser", "KSh 18,000/day", "Narok", 4.9),
                pick("4", "City Tour Bundle", "Various", "Nairobi", 4.2),
            ],
        },
    ];

    let mut categories = CategoryIndex::default();
    categories.insert("beach", ids(&["2"]));
    categories.insert("safari", ids(&["3"]));
    categories.insert("city", ids(&["4"]));
    categories.insert("lakes", ids(&["1"]));

    Catalog { kind: ItemKind::Discover, groups, categories }
}
