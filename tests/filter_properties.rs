//! Property tests for the catalog filter engine and like toggling.

use proptest::prelude::*;
use std::collections::BTreeSet;

use renthub_rust::filter::{FacetSelection, FilterSpec, SearchQuery, filter, filter_grouped};
use renthub_rust::likes::LikeSet;
use renthub_rust::models::{CatalogGroup, CatalogItem, CategoryIndex, Facets, ItemId, ItemKind};

const NAMES: [&str; 5] = ["Toyota Prado", "Mazda CX-5", "Tesla Model 3", "Nissan Note", "Airport Pickup"];
const FUELS: [&str; 4] = ["Petrol", "Diesel", "Electric", "Hybrid"];
const COLORS: [&str; 4] = ["Black", "White", "Blue", "Silver"];

fn price_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        6 => (1_000u64..20_000).prop_map(|amount| format!("KSh {}/day", amount)),
        1 => Just("Various".to_string()),
        1 => Just(String::new()),
    ]
}

fn item_parts() -> impl Strategy<Value = (usize, String, Option<usize>, Option<u8>, usize, Option<f32>)> {
    (
        0..NAMES.len(),
        price_strategy(),
        proptest::option::of(0..FUELS.len()),
        proptest::option::of(2u8..9),
        0..COLORS.len(),
        proptest::option::of(0.0f32..5.0),
    )
}

// Items get unique ids from their position
fn catalog_strategy() -> impl Strategy<Value = Vec<CatalogItem>> {
    prop::collection::vec(item_parts(), 0..24).prop_map(|parts| {
        parts
            .into_iter()
            .enumerate()
            .map(|(index, (name, price, fuel, seats, color, rating))| CatalogItem {
                id: ItemId::new(index.to_string()),
                kind: ItemKind::Vehicle,
                name: NAMES[name].to_string(),
                price,
                facets: Facets {
                    fuel_type: fuel.map(|f| FUELS[f].to_string()),
                    seats,
                    location: Some("Nairobi".to_string()),
                    color: Some(COLORS[color].to_string()),
                    rating,
                },
            })
            .collect()
    })
}

fn query_strategy() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), Just("  ".to_string()), "[a-z]{1,3}", Just("TOYOTA".to_string())]
}

// Even ids are "suv", multiples of three are "luxury"
fn category_index(items: &[CatalogItem]) -> CategoryIndex {
    let mut index = CategoryIndex::default();
    let pick = |modulo: usize| -> Vec<ItemId> {
        items
            .iter()
            .enumerate()
            .filter(|(i, _)| i % modulo == 0)
            .map(|(_, item)| item.id.clone())
            .collect()
    };
    index.insert("suv", pick(2));
    index.insert("luxury", pick(3));
    index
}

fn ids(items: &[&CatalogItem]) -> Vec<ItemId> {
    items.iter().map(|item| item.id.clone()).collect()
}

proptest! {
    #[test]
    fn default_spec_and_empty_query_is_identity(items in catalog_strategy()) {
        let index = category_index(&items);
        let spec = FilterSpec::for_items(&items);
        let result = filter(&items, &index, &SearchQuery::new(""), &spec);
        let expected: Vec<ItemId> = items.iter().map(|item| item.id.clone()).collect();
        prop_assert_eq!(ids(&result), expected);
        prop_assert!(!spec.is_active());
    }

    #[test]
    fn each_added_restriction_never_grows_the_result(
        items in catalog_strategy(),
        query in query_strategy(),
        low in 0u64..20_000,
        span in 0u64..20_000,
        category in prop::sample::select(vec!["suv", "luxury"]),
        fuel in 0..FUELS.len(),
        min_rating in 0.5f32..5.0,
    ) {
        let index = category_index(&items);
        let query = SearchQuery::new(&query);
        let mut spec = FilterSpec::for_items(&items);
        let mut previous = filter(&items, &index, &query, &spec).len();

        let restrictions: Vec<Box<dyn Fn(FilterSpec) -> FilterSpec>> = vec![
            Box::new(move |s: FilterSpec| s.with_price_range(low, low + span).unwrap()),
            Box::new(move |s: FilterSpec| s.with_categories([category])),
            Box::new(move |s: FilterSpec| s.with_facets(FacetSelection {
                fuel_types: BTreeSet::from([FUELS[fuel].to_lowercase()]),
                ..FacetSelection::default()
            })),
            Box::new(move |s: FilterSpec| s.with_min_rating(min_rating).unwrap()),
        ];

        for restrict in restrictions {
            spec = restrict(spec);
            let next = filter(&items, &index, &query, &spec).len();
            prop_assert!(next <= previous, "result grew from {} to {}", previous, next);
            previous = next;
        }
    }

    #[test]
    fn filtering_preserves_relative_order(
        items in catalog_strategy(),
        query in query_strategy(),
        low in 0u64..20_000,
    ) {
        let index = category_index(&items);
        let spec = FilterSpec::for_items(&items).with_price_range(low, low + 5_000).unwrap();
        let result = filter(&items, &index, &SearchQuery::new(&query), &spec);
        let positions: Vec<usize> = result
            .iter()
            .map(|survivor| items.iter().position(|item| item.id == survivor.id).unwrap())
            .collect();
        prop_assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn grouped_filtering_keeps_group_order_and_drops_empty_groups(
        items in catalog_strategy(),
        query in query_strategy(),
        group_size in 1usize..6,
    ) {
        let groups: Vec<CatalogGroup> = items
            .chunks(group_size)
            .enumerate()
            .map(|(n, chunk)| CatalogGroup { name: format!("group-{n}"), items: chunk.to_vec() })
            .collect();
        let index = category_index(&items);
        let spec = FilterSpec::for_items(&items).with_min_rating(2.5).unwrap();
        let result = filter_grouped(&groups, &index, &SearchQuery::new(&query), &spec);

        prop_assert!(result.iter().all(|group| !group.items.is_empty()));
        let order: Vec<usize> = result
            .iter()
            .map(|group| groups.iter().position(|g| g.name == group.name).unwrap())
            .collect();
        prop_assert!(order.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn double_toggle_is_identity(
        existing in prop::collection::btree_set("[a-z0-9]{1,4}", 0..10),
        id in "[a-z0-9]{1,4}",
    ) {
        let set: LikeSet = existing.into_iter().map(ItemId::new).collect();
        let id = ItemId::new(id);
        prop_assert_eq!(set.toggle(&id).toggle(&id), set);
    }
}

#[test]
fn four_item_price_scenario_keeps_two() {
    let items: Vec<CatalogItem> = [4500, 4800, 4200, 4600]
        .iter()
        .enumerate()
        .map(|(i, amount)| CatalogItem {
            id: ItemId::new(i.to_string()),
            kind: ItemKind::Vehicle,
            name: format!("Car {i}"),
            price: format!("KSh {},{:03}/day", amount / 1000, amount % 1000),
            facets: Facets::default(),
        })
        .collect();
    let spec = FilterSpec::for_items(&items).with_price_range(4300, 4700).unwrap();
    let result = filter(&items, &CategoryIndex::default(), &SearchQuery::default(), &spec);
    let prices: Vec<&str> = result.iter().map(|item| item.price.as_str()).collect();
    assert_eq!(prices, vec!["KSh 4,500/day", "KSh 4,600/day"]);
}
