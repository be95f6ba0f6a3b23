use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::dto::payment_dto::{
    CheckoutEvent, CheckoutEventPayload, LifecycleResponse, WebhookEnvelope,
};
use crate::error::{Error, Result};
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-payment-signature";

/// Gateway notifications. Signed with HMAC-SHA256 over the raw body.
/// Replays are answered with the current state and change nothing.
pub async fn handle_payment_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>)> {
    verify_signature(&headers, &body, &state.webhook_secret)?;

    let envelope: WebhookEnvelope<Value> = serde_json::from_slice(&body)?;
    let Some(event) = CheckoutEvent::parse(&envelope.event) else {
        tracing::info!(event = %envelope.event, "Ignoring unexpected payment event");
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "unexpected_event" })),
        ));
    };
    let payload: CheckoutEventPayload = serde_json::from_value(envelope.payload)?;

    let posting = match event {
        CheckoutEvent::Completed => {
            state
                .activation_service
                .activate(payload.job_id, &payload.session_id)
                .await?
        }
        CheckoutEvent::Expired => state.activation_service.cancel(payload.job_id).await?,
    };

    Ok((
        StatusCode::OK,
        Json(json!({
            "received": true,
            "posting": LifecycleResponse::from(&posting),
        })),
    ))
}

/// Hex-encoded HMAC-SHA256 of `body` under `secret`.
pub fn sign_payload(secret: &str, body: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::Internal(e.to_string()))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn verify_signature(headers: &HeaderMap, body: &[u8], secret: &str) -> Result<()> {
    let Some(signature) = headers.get(SIGNATURE_HEADER) else {
        return Err(Error::Unauthorized("missing_webhook_signature".into()));
    };
    let provided = signature
        .to_str()
        .map_err(|_| Error::Unauthorized("invalid_signature_header".into()))?
        .trim()
        .to_ascii_lowercase();
    let expected = sign_payload(secret, body)?;
    if ConstantTimeEq::ct_eq(provided.as_bytes(), expected.as_bytes()).into() {
        Ok(())
    } else {
        tracing::warn!("Payment webhook signature mismatch");
        Err(Error::Unauthorized("invalid_webhook_signature".into()))
    }
}
