use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::dto::payment_dto::{CancellationResponse, CheckoutResponse};
use crate::dto::posting_dto::{
    CreatePostingPayload, CreatePostingResponse, OwnerPostingListResponse, OwnerPostingResponse,
};
use crate::error::{Error, Result};
use crate::middleware::auth::AuthenticatedEmployer;
use crate::services::posting_service::ImageUpload;
use crate::utils::time::parse_deadline;
use crate::utils::validation::{field_error, field_errors};
use crate::AppState;

/// Multipart job form. Text fields mirror [`CreatePostingPayload`]; the
/// optional poster goes in `image`.
#[axum::debug_handler(state = AppState)]
pub async fn create_posting(
    State(state): State<AppState>,
    AuthenticatedEmployer(employer_id): AuthenticatedEmployer,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<CreatePostingResponse>)> {
    let mut payload = CreatePostingPayload::default();
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(Error::Multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let file_name = field.file_name().unwrap_or("image").to_string();
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await.map_err(Error::Multipart)?;
            if !data.is_empty() {
                image = Some(ImageUpload {
                    file_name,
                    content_type,
                    data,
                });
            }
            continue;
        }

        let value = field.text().await.map_err(Error::Multipart)?;
        let value = value.trim().to_string();
        match name.as_str() {
            "title" => payload.title = value,
            "company" => payload.company = value,
            "company_email" => payload.company_email = value,
            "company_phone" => payload.company_phone = value,
            "location" => payload.location = value,
            "job_type" => payload.job_type = value,
            "category" => payload.category = value,
            "description" => payload.description = value,
            "requirements" => payload.requirements = non_empty(value),
            "salary_min" => payload.salary_min = parse_salary("salary_min", value)?,
            "salary_max" => payload.salary_max = parse_salary("salary_max", value)?,
            "application_deadline" => {
                payload.application_deadline = match non_empty(value) {
                    Some(raw) => Some(parse_deadline(&raw).ok_or_else(|| {
                        Error::Validation(field_errors(
                            "application_deadline",
                            field_error("invalid_date", "Deadline must be a date (YYYY-MM-DD)"),
                        ))
                    })?),
                    None => None,
                }
            }
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    match state
        .posting_service
        .create(employer_id, payload, image)
        .await
    {
        Ok(posting) => Ok((
            StatusCode::CREATED,
            Json(CreatePostingResponse {
                posting: posting.into(),
                warning: None,
            }),
        )),
        Err(Error::AssetUpload { posting_id, reason }) => {
            let posting = state
                .posting_service
                .get_for_owner(posting_id, employer_id)
                .await?;
            Ok((
                StatusCode::CREATED,
                Json(CreatePostingResponse {
                    posting: posting.into(),
                    warning: Some(format!(
                        "Job created but image upload failed: {}",
                        reason
                    )),
                }),
            ))
        }
        Err(e) => Err(e),
    }
}

#[axum::debug_handler(state = AppState)]
pub async fn list_postings(
    State(state): State<AppState>,
    AuthenticatedEmployer(employer_id): AuthenticatedEmployer,
) -> Result<Json<OwnerPostingListResponse>> {
    let postings = state.posting_service.list_for_owner(employer_id).await?;
    Ok(Json(OwnerPostingListResponse {
        items: postings.into_iter().map(Into::into).collect(),
    }))
}

#[axum::debug_handler(state = AppState)]
pub async fn get_posting(
    State(state): State<AppState>,
    AuthenticatedEmployer(employer_id): AuthenticatedEmployer,
    Path(id): Path<Uuid>,
) -> Result<Json<OwnerPostingResponse>> {
    let posting = state.posting_service.get_for_owner(id, employer_id).await?;
    Ok(Json(posting.into()))
}

#[axum::debug_handler(state = AppState)]
pub async fn request_checkout(
    State(state): State<AppState>,
    AuthenticatedEmployer(employer_id): AuthenticatedEmployer,
    Path(id): Path<Uuid>,
) -> Result<Json<CheckoutResponse>> {
    let session = state.posting_service.request_payment(id, employer_id).await?;
    Ok(Json(CheckoutResponse::new(id, session)))
}

#[axum::debug_handler(state = AppState)]
pub async fn cancel_checkout(
    State(state): State<AppState>,
    AuthenticatedEmployer(employer_id): AuthenticatedEmployer,
    Path(id): Path<Uuid>,
) -> Result<Json<CancellationResponse>> {
    let posting = state
        .posting_service
        .record_cancellation(id, employer_id)
        .await?;
    let message = if posting.is_active() {
        "Posting is already active".to_string()
    } else {
        "Payment canceled. Your job post has been saved as a draft.".to_string()
    };
    Ok(Json(CancellationResponse {
        posting: posting.into(),
        message,
    }))
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn parse_salary(field: &'static str, value: String) -> Result<Option<Decimal>> {
    match non_empty(value) {
        Some(raw) => raw.parse::<Decimal>().map(Some).map_err(|_| {
            Error::Validation(field_errors(
                field,
                field_error("invalid_number", "Salary must be a number"),
            ))
        }),
        None => Ok(None),
    }
}
