use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::dto::posting_dto::{PublicPostingResponse, SearchParams, SearchResponse};
use crate::error::Result;
use crate::services::query_builder::SearchQuery;
use crate::AppState;

/// Public job search. Malformed paging parameters fall back to defaults.
#[axum::debug_handler]
pub async fn search_jobs(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>> {
    let query = SearchQuery::from(params);
    let page = state.posting_service.search(&query).await?;
    tracing::debug!(
        keyword = query.keyword(),
        location = query.location(),
        page = query.page(),
        total = page.total_count,
        "Job search"
    );
    Ok(Json(page.into()))
}

#[axum::debug_handler]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicPostingResponse>> {
    let posting = state.posting_service.get_public(id).await?;
    Ok(Json(posting.into()))
}
