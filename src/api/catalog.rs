use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, IndexPageDto, ProductDto, ProductGridDto};

#[derive(Deserialize)]
pub struct IndexQuery {
    pub q: Option<String>,
}

/// GET /?q=
/// Product listing with an optional case-insensitive title search.
/// Asynchronous refresh calls (marked by `X-Requested-With`) get just the
/// grid; everything else gets the full page shape.
pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IndexQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let query = params.q.unwrap_or_default().trim().to_string();

    let products = if query.is_empty() {
        state.store().list_products().await?
    } else {
        tracing::info!("Search query: '{query}'");
        state.store().search_products(&query).await?
    };

    let products: Vec<ProductDto> = products.into_iter().map(ProductDto::from).collect();

    let is_fragment = headers
        .get("X-Requested-With")
        .and_then(|v| v.to_str().ok())
        == Some("XMLHttpRequest");

    if is_fragment {
        Ok(Json(ApiResponse::success(ProductGridDto { products })).into_response())
    } else {
        Ok(Json(ApiResponse::success(IndexPageDto { products, query })).into_response())
    }
}
