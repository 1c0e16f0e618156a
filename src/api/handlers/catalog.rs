use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::api::AppState;
use crate::api::models::*;
use crate::service::commands::TargetRequest;

/// GET /catalog?q= - Catalog objects matching the search term
pub async fn list_catalog(
    State(session): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Json<Vec<CatalogItem>> {
    let term = query.q.unwrap_or_default();
    let items = session
        .catalog()
        .search(&term)
        .into_iter()
        .map(CatalogItem::from)
        .collect();

    Json(items)
}

/// POST /catalog/{id}/select - Target input for a catalog object
pub async fn select_entry(
    State(session): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TargetRequest>, (StatusCode, Json<ErrorResponse>)> {
    session.select_catalog_entry(&id).map(Json).map_err(|e| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
    })
}
