use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::posting::{JobType, PaymentState, Posting, PostingState};
use crate::services::paginator::{query_from_raw, Page};
use crate::services::query_builder::SearchQuery;
use crate::utils::validation::field_error;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_salary_range"))]
pub struct CreatePostingPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 200))]
    pub company: String,
    #[validate(email)]
    pub company_email: String,
    #[validate(length(min = 1, max = 40))]
    pub company_phone: String,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    #[validate(custom(function = "validate_job_type"))]
    pub job_type: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub requirements: Option<String>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    pub application_deadline: Option<DateTime<Utc>>,
}

fn validate_job_type(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<JobType>()
        .map(|_| ())
        .map_err(|_| field_error("invalid_job_type", "Job type must be Full-time, Part-time, Contract or Internship"))
}

fn validate_salary_range(payload: &CreatePostingPayload) -> Result<(), ValidationError> {
    let negative = [payload.salary_min, payload.salary_max]
        .iter()
        .flatten()
        .any(|v| v.is_sign_negative());
    if negative {
        return Err(field_error("negative_salary", "Salary cannot be negative"));
    }
    if let (Some(min), Some(max)) = (payload.salary_min, payload.salary_max) {
        if min > max {
            return Err(field_error(
                "salary_range",
                "Minimum salary cannot exceed maximum salary",
            ));
        }
    }
    Ok(())
}

/// Raw search parameters. Numbers stay strings so malformed input can be
/// coerced instead of rejected.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SearchParams {
    pub keyword: Option<String>,
    pub location: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl From<SearchParams> for SearchQuery {
    fn from(value: SearchParams) -> Self {
        query_from_raw(
            value.keyword.as_deref(),
            value.location.as_deref(),
            value.page.as_deref(),
            value.page_size.as_deref(),
        )
    }
}

/// What job seekers see. Lifecycle bookkeeping stays private.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicPostingResponse {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub company_email: String,
    pub company_phone: String,
    pub location: String,
    pub job_type: JobType,
    pub category: String,
    pub description: String,
    pub requirements: Option<String>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    pub image_url: Option<String>,
    pub application_deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// The owning employer's view, including lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerPostingResponse {
    #[serde(flatten)]
    pub posting: PublicPostingResponse,
    pub state: PostingState,
    pub visible: bool,
    pub payment_state: PaymentState,
    pub payment_reference: Option<String>,
    pub activated_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostingResponse {
    pub posting: OwnerPostingResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub items: Vec<PublicPostingResponse>,
    pub total_count: i64,
    pub total_pages: i64,
    pub page: i64,
    pub page_size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerPostingListResponse {
    pub items: Vec<OwnerPostingResponse>,
}

impl From<Posting> for PublicPostingResponse {
    fn from(value: Posting) -> Self {
        Self {
            id: value.id,
            title: value.title,
            company: value.company,
            company_email: value.company_email,
            company_phone: value.company_phone,
            location: value.location,
            job_type: value.job_type,
            category: value.category,
            description: value.description,
            requirements: value.requirements,
            salary_min: value.salary_min,
            salary_max: value.salary_max,
            image_url: value.image_url,
            application_deadline: value.application_deadline,
            created_at: value.created_at,
        }
    }
}

impl From<Posting> for OwnerPostingResponse {
    fn from(value: Posting) -> Self {
        let state = value.state();
        let visible = value.visible;
        let payment_state = value.payment_state;
        let payment_reference = value.payment_reference.clone();
        let activated_at = value.activated_at;
        let updated_at = value.updated_at;
        Self {
            posting: value.into(),
            state,
            visible,
            payment_state,
            payment_reference,
            activated_at,
            updated_at,
        }
    }
}

impl From<Page<Posting>> for SearchResponse {
    fn from(value: Page<Posting>) -> Self {
        let page = value.map(PublicPostingResponse::from);
        Self {
            items: page.items,
            total_count: page.total_count,
            total_pages: page.total_pages,
            page: page.page,
            page_size: page.page_size,
        }
    }
}
