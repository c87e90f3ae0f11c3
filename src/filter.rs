// Catalog filter engine: free-text search plus price, category, facet and
// rating restrictions. Every stage narrows the surviving list without
// reordering it, and nothing in here fails on bad data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::models::{CatalogGroup, CatalogItem, CategoryIndex, Facets};
use crate::price::{ParsedPrice, parse_price};

pub const MAX_RATING: f32 = 5.0;

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("price range minimum {min} is greater than maximum {max}")]
    InvalidPriceRange { min: u64, max: u64 },
    #[error("minimum rating {0} is outside 0..=5")]
    InvalidRating(f32),
}

// Inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: u64,
    pub max: u64,
}

impl PriceRange {
    pub fn new(min: u64, max: u64) -> Result<Self, FilterError> {
        if min > max {
            return Err(FilterError::InvalidPriceRange { min, max });
        }
        Ok(PriceRange { min, max })
    }

    pub fn contains(&self, amount: u64) -> bool {
        self.min <= amount && amount <= self.max
    }
}

// Span of all parseable prices in `items`; (0, 0) when there are none
pub fn price_bounds<'a>(items: impl IntoIterator<Item = &'a CatalogItem>) -> PriceRange {
    let amounts = items
        .into_iter()
        .filter_map(|item| parse_price(&item.price).amount());
    let (min, max) = amounts.fold((u64::MAX, 0), |(lo, hi), amount| (lo.min(amount), hi.max(amount)));
    if min > max {
        PriceRange { min: 0, max: 0 }
    } else {
        PriceRange { min, max }
    }
}

// Selected values per facet dimension. Empty set = no restriction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetSelection {
    #[serde(default)]
    pub fuel_types: BTreeSet<String>,
    #[serde(default)]
    pub seat_counts: BTreeSet<u8>,
    #[serde(default)]
    pub locations: BTreeSet<String>,
}

impl FacetSelection {
    pub fn is_empty(&self) -> bool {
        self.fuel_types.is_empty() && self.seat_counts.is_empty() && self.locations.is_empty()
    }

    pub fn admits(&self, facets: &Facets) -> bool {
        string_facet_admits(&self.fuel_types, facets.fuel_type.as_deref())
            && (self.seat_counts.is_empty()
                || facets.seats.is_some_and(|seats| self.seat_counts.contains(&seats)))
            && string_facet_admits(&self.locations, facets.location.as_deref())
    }
}

fn string_facet_admits(selected: &BTreeSet<String>, value: Option<&str>) -> bool {
    if selected.is_empty() {
        return true;
    }
    match value {
        Some(value) => selected.iter().any(|wanted| wanted.eq_ignore_ascii_case(value)),
        None => false,
    }
}

// Trimmed, case-folded free text. `None` means "no search".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery(Option<String>);

impl SearchQuery {
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            SearchQuery(None)
        } else {
            SearchQuery(Some(trimmed.to_lowercase()))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn matches(&self, item: &CatalogItem) -> bool {
        match &self.0 {
            None => true,
            Some(needle) => item
                .searchable_fields()
                .any(|field| field.to_lowercase().contains(needle.as_str())),
        }
    }
}

/// Active restrictions for one browse screen.
///
/// `price_bounds` is the unrestricted span of the catalog this filter was built
/// for; the price stage only applies when `price` differs from it. Whether
/// any filter is active is always derived through [`FilterSpec::is_active`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    pub price: PriceRange,
    pub price_bounds: PriceRange,
    pub categories: BTreeSet<String>,
    pub facets: FacetSelection,
    pub min_rating: f32,
}

impl FilterSpec {
    pub fn unrestricted(price_bounds: PriceRange) -> Self {
        FilterSpec {
            price: price_bounds,
            price_bounds,
            categories: BTreeSet::new(),
            facets: FacetSelection::default(),
            min_rating: 0.0,
        }
    }

    pub fn for_items<'a>(items: impl IntoIterator<Item = &'a CatalogItem>) -> Self {
        Self::unrestricted(price_bounds(items))
    }

    pub fn with_price_range(mut self, min: u64, max: u64) -> Result<Self, FilterError> {
        self.price = PriceRange::new(min, max)?;
        Ok(self)
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_facets(mut self, facets: FacetSelection) -> Self {
        self.facets = facets;
        self
    }

    pub fn with_min_rating(mut self, min_rating: f32) -> Result<Self, FilterError> {
        if !(0.0..=MAX_RATING).contains(&min_rating) {
            return Err(FilterError::InvalidRating(min_rating));
        }
        self.min_rating = min_rating;
        Ok(self)
    }

    pub fn price_active(&self) -> bool {
        self.price != self.price_bounds
    }

    pub fn is_active(&self) -> bool {
        self.price_active()
            || !self.categories.is_empty()
            || !self.facets.is_empty()
            || self.min_rating > 0.0
    }

    fn price_admits(&self, item: &CatalogItem) -> bool {
        match parse_price(&item.price) {
            ParsedPrice::Amount(amount) => self.price.contains(amount),
            ParsedPrice::Various => true,
            ParsedPrice::Invalid => false,
        }
    }

    fn rating_admits(&self, item: &CatalogItem) -> bool {
        item.facets.rating.is_some_and(|rating| rating >= self.min_rating)
    }
}

// Filter criteria as posted by a client. Missing price bounds fall back to
// the catalog span.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRequest {
    pub price_min: Option<u64>,
    pub price_max: Option<u64>,
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(flatten)]
    pub facets: FacetSelection,
    #[serde(default)]
    pub min_rating: f32,
}

impl FilterRequest {
    pub fn into_spec(self, price_bounds: PriceRange) -> Result<FilterSpec, FilterError> {
        let min = self.price_min.unwrap_or(price_bounds.min);
        let max = self.price_max.unwrap_or(price_bounds.max);
        FilterSpec::unrestricted(price_bounds)
            .with_price_range(min, max)?
            .with_categories(self.categories)
            .with_facets(self.facets)
            .with_min_rating(self.min_rating)
    }
}

// Apply query and filter to `items`: search, price, category, facets, rating.
pub fn filter<'a>(
    items: &'a [CatalogItem],
    categories: &CategoryIndex,
    query: &SearchQuery,
    spec: &FilterSpec,
) -> Vec<&'a CatalogItem> {
    let mut survivors: Vec<&CatalogItem> = items.iter().collect();
    let total = survivors.len();

    if !query.is_empty() {
        survivors.retain(|item| query.matches(item));
    }
    if spec.price_active() {
        survivors.retain(|item| spec.price_admits(item));
    }
    if !spec.categories.is_empty() {
        survivors.retain(|item| categories.in_any(&item.id, &spec.categories));
    }
    if !spec.facets.is_empty() {
        survivors.retain(|item| spec.facets.admits(&item.facets));
    }
    if spec.min_rating > 0.0 {
        survivors.retain(|item| spec.rating_admits(item));
    }

    tracing::debug!(total, surviving = survivors.len(), "Filtered catalog items");
    survivors
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredGroup<'a> {
    pub name: &'a str,
    pub items: Vec<&'a CatalogItem>,
}

// Filters each group independently and drops groups left empty. Group order
// is preserved.
pub fn filter_grouped<'a>(
    groups: &'a [CatalogGroup],
    categories: &CategoryIndex,
    query: &SearchQuery,
    spec: &FilterSpec,
) -> Vec<FilteredGroup<'a>> {
    groups
        .iter()
        .map(|group| FilteredGroup {
            name: group.name.as_str(),
            items: filter(&group.items, categories, query, spec),
        })
        .filter(|group| !group.items.is_empty())
        .collect()
}

// Distinct facet values present in a catalog, for rendering filter chips
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetOptions {
    pub fuel_types: BTreeSet<String>,
    pub seat_counts: BTreeSet<u8>,
    pub locations: BTreeSet<String>,
    pub categories: BTreeSet<String>,
}

pub fn facet_options<'a>(
    items: impl IntoIterator<Item = &'a CatalogItem>,
    categories: &CategoryIndex,
) -> FacetOptions {
    let mut options = FacetOptions {
        categories: categories.category_ids().map(str::to_string).collect(),
        ..FacetOptions::default()
    };
    for item in items {
        if let Some(fuel) = &item.facets.fuel_type {
            options.fuel_types.insert(fuel.clone());
        }
        if let Some(seats) = item.facets.seats {
            options.seat_counts.insert(seats);
        }
        if let Some(location) = &item.facets.location {
            options.locations.insert(location.clone());
        }
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemId, ItemKind};

    fn car(id: &str, name: &str, price: &str) -> CatalogItem {
        CatalogItem {
            id: ItemId::new(id),
            kind: ItemKind::Vehicle,
            name: name.to_string(),
            price: price.to_string(),
            facets: Facets {
                fuel_type: Some("Petrol".to_string()),
                seats: Some(5),
                location: Some("Nairobi".to_string()),
                color: Some("White".to_string()),
                rating: Some(4.5),
            },
        }
    }

    fn priced_cars() -> Vec<CatalogItem> {
        vec![
            car("1", "Toyota Prado", "KSh 4,500/day"),
            car("2", "Mercedes C200", "KSh 4,800/day"),
            car("3", "Mazda CX-5", "KSh 4,200/day"),
            car("4", "Subaru Forester", "KSh 4,600/day"),
        ]
    }

    fn ids(items: &[&CatalogItem]) -> Vec<String> {
        items.iter().map(|item| item.id.to_string()).collect()
    }

    #[test]
    fn default_spec_and_empty_query_return_everything_in_order() {
        let items = priced_cars();
        let spec = FilterSpec::for_items(&items);
        let result = filter(&items, &CategoryIndex::default(), &SearchQuery::new("  "), &spec);
        assert_eq!(ids(&result), vec!["1", "2", "3", "4"]);
        assert!(!spec.is_active());
    }

    #[test]
    fn price_range_keeps_items_inside_inclusive_bounds() {
        let items = priced_cars();
        let spec = FilterSpec::for_items(&items).with_price_range(4300, 4700).unwrap();
        let result = filter(&items, &CategoryIndex::default(), &SearchQuery::default(), &spec);
        assert_eq!(ids(&result), vec!["1", "4"]);

        let edges = FilterSpec::for_items(&items).with_price_range(4500, 4600).unwrap();
        let result = filter(&items, &CategoryIndex::default(), &SearchQuery::default(), &edges);
        assert_eq!(ids(&result), vec!["1", "4"]);
    }

    #[test]
    fn various_price_passes_active_range_but_invalid_does_not() {
        let mut items = priced_cars();
        items.push(car("5", "Chauffeur", "Various"));
        items.push(car("6", "Broken", ""));
        let spec = FilterSpec::for_items(&items).with_price_range(4300, 4700).unwrap();
        let result = filter(&items, &CategoryIndex::default(), &SearchQuery::default(), &spec);
        assert_eq!(ids(&result), vec!["1", "4", "5"]);
    }

    #[test]
    fn invalid_price_passes_when_range_is_inactive() {
        let mut items = priced_cars();
        items.push(car("6", "Broken", ""));
        let spec = FilterSpec::for_items(&items);
        let result = filter(&items, &CategoryIndex::default(), &SearchQuery::default(), &spec);
        assert_eq!(result.len(), 5);
    }

    #[test]
    fn search_is_case_insensitive_substring_over_name_color_and_fuel() {
        let mut items = priced_cars();
        items[2].facets.color = Some("Midnight Blue".to_string());
        items[3].facets.fuel_type = Some("Hybrid".to_string());
        let spec = FilterSpec::for_items(&items);
        let index = CategoryIndex::default();

        let by_name = filter(&items, &index, &SearchQuery::new("  MERC "), &spec);
        assert_eq!(ids(&by_name), vec!["2"]);
        let by_color = filter(&items, &index, &SearchQuery::new("blue"), &spec);
        assert_eq!(ids(&by_color), vec!["3"]);
        let by_fuel = filter(&items, &index, &SearchQuery::new("hyb"), &spec);
        assert_eq!(ids(&by_fuel), vec!["4"]);
    }

    #[test]
    fn category_filter_uses_the_membership_index() {
        let items = priced_cars();
        let mut index = CategoryIndex::default();
        index.insert("suv", vec![ItemId::new("1"), ItemId::new("3"), ItemId::new("4")]);
        index.insert("sedan", vec![ItemId::new("2")]);

        let spec = FilterSpec::for_items(&items).with_categories(["sedan"]);
        let result = filter(&items, &index, &SearchQuery::default(), &spec);
        assert_eq!(ids(&result), vec!["2"]);
        assert!(spec.is_active());
    }

    #[test]
    fn facet_filters_are_case_insensitive_and_require_a_value() {
        let mut items = priced_cars();
        items[0].facets.fuel_type = Some("Diesel".to_string());
        items[1].facets.fuel_type = None;
        items[3].facets.seats = Some(7);

        let facets = FacetSelection {
            fuel_types: ["diesel".to_string()].into(),
            ..FacetSelection::default()
        };
        let spec = FilterSpec::for_items(&items).with_facets(facets);
        let result = filter(&items, &CategoryIndex::default(), &SearchQuery::default(), &spec);
        assert_eq!(ids(&result), vec!["1"]);

        let seats = FacetSelection {
            seat_counts: [7].into(),
            ..FacetSelection::default()
        };
        let spec = FilterSpec::for_items(&items).with_facets(seats);
        let result = filter(&items, &CategoryIndex::default(), &SearchQuery::default(), &spec);
        assert_eq!(ids(&result), vec!["4"]);
    }

    #[test]
    fn location_facet_matches_any_case_and_drops_unknown_locations() {
        let mut items = priced_cars();
        items[1].facets.location = Some("Mombasa".to_string());
        items[2].facets.location = None;
        items[3].facets.location = Some("NAIROBI".to_string());

        let nairobi = FacetSelection {
            locations: ["nairobi".to_string()].into(),
            ..FacetSelection::default()
        };
        let spec = FilterSpec::for_items(&items).with_facets(nairobi);
        assert!(spec.is_active());
        let result = filter(&items, &CategoryIndex::default(), &SearchQuery::default(), &spec);
        assert_eq!(ids(&result), vec!["1", "4"]);

        let either = FacetSelection {
            locations: ["nairobi".to_string(), "mombasa".to_string()].into(),
            ..FacetSelection::default()
        };
        let spec = FilterSpec::for_items(&items).with_facets(either);
        let result = filter(&items, &CategoryIndex::default(), &SearchQuery::default(), &spec);
        assert_eq!(ids(&result), vec!["1", "2", "4"]);
    }

    #[test]
    fn rating_floor_drops_unrated_items() {
        let mut items = priced_cars();
        items[0].facets.rating = Some(3.9);
        items[1].facets.rating = None;
        let spec = FilterSpec::for_items(&items).with_min_rating(4.0).unwrap();
        let result = filter(&items, &CategoryIndex::default(), &SearchQuery::default(), &spec);
        assert_eq!(ids(&result), vec!["3", "4"]);
    }

    #[test]
    fn grouped_filter_drops_empty_groups_and_keeps_order() {
        let cars = priced_cars();
        let groups = vec![
            CatalogGroup { name: "Essential".to_string(), items: vec![cars[2].clone()] },
            CatalogGroup { name: "Executive".to_string(), items: vec![cars[0].clone(), cars[1].clone()] },
            CatalogGroup { name: "Signature".to_string(), items: vec![cars[3].clone()] },
        ];
        let spec = FilterSpec::for_items(&cars).with_price_range(4300, 4700).unwrap();
        let result = filter_grouped(&groups, &CategoryIndex::default(), &SearchQuery::default(), &spec);

        let names: Vec<&str> = result.iter().map(|group| group.name).collect();
        assert_eq!(names, vec!["Executive", "Signature"]);
        assert_eq!(ids(&result[0].items), vec!["1"]);
    }

    #[test]
    fn spec_rejects_inverted_range_and_out_of_scale_rating() {
        let spec = FilterSpec::unrestricted(PriceRange { min: 0, max: 10 });
        assert_eq!(
            spec.clone().with_price_range(9, 3),
            Err(FilterError::InvalidPriceRange { min: 9, max: 3 })
        );
        assert_eq!(spec.with_min_rating(6.0), Err(FilterError::InvalidRating(6.0)));
    }

    #[test]
    fn request_without_bounds_is_inactive() {
        let bounds = PriceRange { min: 4200, max: 4800 };
        let spec = FilterRequest::default().into_spec(bounds).unwrap();
        assert_eq!(spec, FilterSpec::unrestricted(bounds));
        assert!(!spec.is_active());

        let narrowed = FilterRequest { price_max: Some(4500), ..FilterRequest::default() }
            .into_spec(bounds)
            .unwrap();
        assert!(narrowed.is_active());
        assert_eq!(narrowed.price, PriceRange { min: 4200, max: 4500 });
    }

    #[test]
    fn bounds_of_an_unpriced_catalog_are_zero() {
        let items = vec![car("1", "Tour", "Various")];
        assert_eq!(price_bounds(&items), PriceRange { min: 0, max: 0 });
        assert_eq!(price_bounds(&priced_cars()), PriceRange { min: 4200, max: 4800 });
    }

    #[test]
    fn facet_options_collect_distinct_values() {
        let mut items = priced_cars();
        items[1].facets.fuel_type = Some("Diesel".to_string());
        let mut index = CategoryIndex::default();
        index.insert("suv", vec![ItemId::new("1")]);
        let options = facet_options(&items, &index);
        assert_eq!(options.fuel_types.len(), 2);
        assert_eq!(options.seat_counts, [5].into());
        assert!(options.categories.contains("suv"));
    }
}
