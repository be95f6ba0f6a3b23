use axum::{
    extract::{Query, State},
    Json,
};

use crate::dto::payment_dto::{LifecycleResponse, PaymentCanceledQuery, PaymentSuccessQuery};
use crate::error::Result;
use crate::AppState;

/// Browser return from a completed checkout. The session is re-checked with
/// the gateway before the posting goes live.
#[axum::debug_handler]
pub async fn payment_success(
    State(state): State<AppState>,
    Query(query): Query<PaymentSuccessQuery>,
) -> Result<Json<LifecycleResponse>> {
    let posting = state
        .activation_service
        .activate_from_redirect(query.job_id, &query.session_id)
        .await?;
    Ok(Json(LifecycleResponse::from(&posting)))
}

#[axum::debug_handler]
pub async fn payment_canceled(
    State(state): State<AppState>,
    Query(query): Query<PaymentCanceledQuery>,
) -> Result<Json<LifecycleResponse>> {
    let posting = state.activation_service.cancel(query.job_id).await?;
    Ok(Json(LifecycleResponse::from(&posting)))
}
