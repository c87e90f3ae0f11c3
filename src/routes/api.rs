// Handlers for the browsing endpoints: catalog, filters, search and likes

use axum::{
    extract::{Json as JsonExtract, Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    error::{AppError, AppResult},
    filter::{self, FacetOptions, FilterRequest, FilterSpec, SearchQuery},
    likes::{LikeSet, ToggleOutcome},
    models::{Catalog, CatalogItem, ItemId, ItemKind},
};

// --- Response Wrappers ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub liked: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView {
    pub name: String,
    pub items: Vec<ItemView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub kind: ItemKind,
    pub groups: Vec<GroupView>,
    pub total: usize,
    // Derived from the filter, never stored
    pub active: bool,
    pub filter: FilterSpec,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDefaultsResponse {
    pub kind: ItemKind,
    pub defaults: FilterSpec,
    pub options: FacetOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikesResponse {
    pub kind: ItemKind,
    pub likes: LikeSet,
}

// --- Request Structs ---

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub filter: FilterRequest,
}

// --- Helpers ---

fn resolve_kind(segment: &str) -> AppResult<ItemKind> {
    ItemKind::from_path(segment)
        .ok_or_else(|| AppError::NotFound(format!("Unknown catalog '{}'", segment)))
}

fn catalog_for<'a>(app_state: &'a AppState, segment: &str) -> AppResult<(ItemKind, &'a Catalog)> {
    let kind = resolve_kind(segment)?;
    Ok((kind, app_state.catalogs.get(kind)))
}

async fn run_search(
    app_state: &AppState,
    kind: ItemKind,
    catalog: &Catalog,
    request: SearchRequest,
) -> AppResult<SearchResponse> {
    let bounds = filter::price_bounds(catalog.items());
    let spec = request.filter.into_spec(bounds)?;
    let query = SearchQuery::new(&request.query);
    let likes = app_state.likes.snapshot(kind).await;

    let groups: Vec<GroupView> = filter::filter_grouped(&catalog.groups, &catalog.categories, &query, &spec)
        .into_iter()
        .map(|group| GroupView {
            name: group.name.to_string(),
            items: group
                .items
                .into_iter()
                .map(|item| ItemView {
                    liked: likes.contains(&item.id),
                    item: item.clone(),
                })
                .collect(),
        })
        .collect();
    let total = groups.iter().map(|group| group.items.len()).sum();

    Ok(SearchResponse {
        kind,
        groups,
        total,
        active: spec.is_active(),
        filter: spec,
    })
}

// --- API Handlers ---

// Full catalog, grouped, with like flags
pub async fn get_catalog(
    State(app_state): State<AppState>,
    Path(kind): Path<String>,
) -> AppResult<Json<SearchResponse>> {
    tracing::info!("[HANDLER] /api/catalog/{} - Request received.", kind);
    let (kind, catalog) = catalog_for(&app_state, &kind)?;
    let response = run_search(&app_state, kind, catalog, SearchRequest::default()).await?;
    Ok(Json(response))
}

pub async fn get_filter_defaults(
    State(app_state): State<AppState>,
    Path(kind): Path<String>,
) -> AppResult<Json<FilterDefaultsResponse>> {
    tracing::info!("[HANDLER] /api/catalog/{}/filters - Request received.", kind);
    let (kind, catalog) = catalog_for(&app_state, &kind)?;
    Ok(Json(FilterDefaultsResponse {
        kind,
        defaults: FilterSpec::for_items(catalog.items()),
        options: filter::facet_options(catalog.items(), &catalog.categories),
    }))
}

pub async fn search_catalog(
    State(app_state): State<AppState>,
    Path(kind): Path<String>,
    JsonExtract(request): JsonExtract<SearchRequest>,
) -> AppResult<Json<SearchResponse>> {
    tracing::info!("[HANDLER] /api/catalog/{}/search - query: {:?}", kind, request.query);
    let (kind, catalog) = catalog_for(&app_state, &kind)?;
    let response = run_search(&app_state, kind, catalog, request).await?;
    tracing::info!(
        "[HANDLER] /api/catalog/{}/search - {} items in {} groups (filters active: {}).",
        kind.as_path(),
        response.total,
        response.groups.len(),
        response.active
    );
    Ok(Json(response))
}

pub async fn get_likes(
    State(app_state): State<AppState>,
    Path(kind): Path<String>,
) -> AppResult<Json<LikesResponse>> {
    let kind = resolve_kind(&kind)?;
    let likes = app_state.likes.snapshot(kind).await;
    Ok(Json(LikesResponse { kind, likes }))
}

pub async fn toggle_like(
    State(app_state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> AppResult<Json<ToggleOutcome>> {
    let (kind, catalog) = catalog_for(&app_state, &kind)?;
    let id = ItemId::new(id);
    if !catalog.contains(&id) {
        return Err(AppError::NotFound(format!(
            "No item '{}' in {}",
            id,
            kind.as_path()
        )));
    }
    let outcome = app_state.likes.toggle(kind, &id).await;
    Ok(Json(outcome))
}
