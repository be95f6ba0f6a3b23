use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dto::posting_dto::OwnerPostingResponse;
use crate::models::posting::{Posting, PostingState};
use crate::services::payment_service::CheckoutSession;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub posting_id: Uuid,
    pub session_id: String,
    pub redirect_url: String,
}

impl CheckoutResponse {
    pub fn new(posting_id: Uuid, session: CheckoutSession) -> Self {
        Self {
            posting_id,
            session_id: session.session_id,
            redirect_url: session.redirect_url,
        }
    }
}

/// Query string the gateway appends when it sends the employer back.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentSuccessQuery {
    pub session_id: String,
    pub job_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCanceledQuery {
    pub job_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleResponse {
    pub posting_id: Uuid,
    pub state: PostingState,
    pub visible: bool,
    pub payment_reference: Option<String>,
}

impl From<&Posting> for LifecycleResponse {
    fn from(value: &Posting) -> Self {
        Self {
            posting_id: value.id,
            state: value.state(),
            visible: value.visible,
            payment_reference: value.payment_reference.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationResponse {
    pub posting: OwnerPostingResponse,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEnvelope<T> {
    pub event: String,
    #[serde(flatten)]
    pub payload: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutEventPayload {
    pub session_id: String,
    pub job_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutEvent {
    Completed,
    Expired,
}

impl CheckoutEvent {
    pub fn parse(event: &str) -> Option<Self> {
        match event {
            "checkout.completed" | "checkout.session.completed" => Some(CheckoutEvent::Completed),
            "checkout.expired" | "checkout.canceled" | "checkout.session.expired" => {
                Some(CheckoutEvent::Expired)
            }
            _ => None,
        }
    }
}
