use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use crate::error::{Error, Result};

pub const LISTING_DESCRIPTION: &str = "30-day job listing";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPrice {
    pub amount_cents: i64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub session_id: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub session_id: String,
    pub posting_id: Option<Uuid>,
    pub paid: bool,
}

/// Outbound payment collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a checkout session scoped to one posting.
    async fn create_session(&self, posting_id: Uuid, price: &ListingPrice) -> Result<CheckoutSession>;

    /// Looks a session up again, used to check a user-supplied redirect.
    async fn session_status(&self, session_id: &str) -> Result<SessionStatus>;
}

/// Hosted-checkout gateway spoken to over its JSON API.
#[derive(Clone)]
pub struct HttpPaymentGateway {
    client: Client,
    api_url: Url,
    api_key: String,
    webapp_url: Url,
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    client_reference_id: Option<String>,
}

impl HttpPaymentGateway {
    pub fn new(client: Client, api_url: String, api_key: String, webapp_url: &str) -> Result<Self> {
        let webapp_url = Url::parse(webapp_url)
            .map_err(|e| Error::Config(format!("Invalid WEBAPP_URL: {}", e)))?;
        let api_url = Url::parse(&api_url)
            .map_err(|e| Error::Config(format!("Invalid PAYMENT_API_URL: {}", e)))?;
        if api_url.cannot_be_a_base() {
            return Err(Error::Config("Invalid PAYMENT_API_URL: not a base URL".into()));
        }
        Ok(Self {
            client,
            api_url,
            api_key,
            webapp_url,
        })
    }

    /// The placeholder is substituted by the gateway, so it must stay unencoded.
    pub fn success_url(&self, posting_id: Uuid) -> Result<String> {
        let base = self.page_url("payment-success")?;
        Ok(format!(
            "{}?session_id={{CHECKOUT_SESSION_ID}}&job_id={}",
            base, posting_id
        ))
    }

    pub fn cancel_url(&self, posting_id: Uuid) -> Result<String> {
        let mut url = self.page_url("payment-canceled")?;
        url.query_pairs_mut()
            .append_pair("job_id", &posting_id.to_string());
        Ok(url.to_string())
    }

    fn page_url(&self, page: &str) -> Result<Url> {
        self.webapp_url
            .join(page)
            .map_err(|e| Error::Config(format!("Invalid WEBAPP_URL: {}", e)))
    }

    fn sessions_endpoint(&self) -> Result<Url> {
        self.api_url_with(&["checkout", "sessions"])
    }

    /// `session_id` arrives from a query string, so it is appended as one
    /// percent-encoded path segment and can never add segments or a query.
    fn session_url(&self, session_id: &str) -> Result<Url> {
        self.api_url_with(&["checkout", "sessions", session_id])
    }

    fn api_url_with(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|_| Error::Config("Invalid PAYMENT_API_URL: not a base URL".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_session(&self, posting_id: Uuid, price: &ListingPrice) -> Result<CheckoutSession> {
        let body = json!({
            "mode": "payment",
            "amount": price.amount_cents,
            "currency": price.currency,
            "description": LISTING_DESCRIPTION,
            "client_reference_id": posting_id,
            "metadata": { "job_id": posting_id },
            "success_url": self.success_url(posting_id)?,
            "cancel_url": self.cancel_url(posting_id)?,
        });

        let resp = self
            .client
            .post(self.sessions_endpoint()?)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::PaymentSession(format!("gateway unreachable: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(%posting_id, status = status.as_u16(), "Checkout session rejected by gateway");
            return Err(Error::PaymentSession(format!(
                "gateway returned {}: {}",
                status, text
            )));
        }

        let session: SessionBody = resp
            .json()
            .await
            .map_err(|e| Error::PaymentSession(format!("malformed gateway response: {}", e)))?;
        let redirect_url = session
            .url
            .ok_or_else(|| Error::PaymentSession("gateway response had no redirect url".into()))?;

        info!(%posting_id, session_id = %session.id, "Checkout session opened");
        Ok(CheckoutSession {
            session_id: session.id,
            redirect_url,
        })
    }

    async fn session_status(&self, session_id: &str) -> Result<SessionStatus> {
        if session_id.trim().is_empty() {
            return Err(Error::BadRequest("Missing checkout session id".into()));
        }
        let resp = self
            .client
            .get(self.session_url(session_id)?)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| Error::PaymentSession(format!("gateway unreachable: {}", e)))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::PaymentSession(format!(
                "unknown checkout session {}",
                session_id
            )));
        }
        if !status.is_success() {
            return Err(Error::PaymentSession(format!("gateway returned {}", status)));
        }

        let session: SessionBody = resp
            .json()
            .await
            .map_err(|e| Error::PaymentSession(format!("malformed gateway response: {}", e)))?;

        Ok(SessionStatus {
            posting_id: session
                .client_reference_id
                .as_deref()
                .and_then(|s| Uuid::parse_str(s).ok()),
            paid: session.payment_status.as_deref() == Some("paid"),
            session_id: session.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_urls_point_back_at_the_web_app() {
        let gateway = HttpPaymentGateway::new(
            Client::new(),
            "https://pay.example.com/v1/".into(),
            "sk_test".into(),
            "https://jobs.example.com/",
        )
        .unwrap();
        let id = Uuid::nil();

        assert_eq!(
            gateway.success_url(id).unwrap(),
            format!(
                "https://jobs.example.com/payment-success?session_id={{CHECKOUT_SESSION_ID}}&job_id={}",
                id
            )
        );
        assert_eq!(
            gateway.cancel_url(id).unwrap(),
            format!("https://jobs.example.com/payment-canceled?job_id={}", id)
        );
        assert_eq!(
            gateway.sessions_endpoint().unwrap().as_str(),
            "https://pay.example.com/v1/checkout/sessions"
        );
    }

    #[test]
    fn rejects_unparsable_webapp_url() {
        assert!(HttpPaymentGateway::new(Client::new(), "x".into(), "k".into(), "not a url").is_err());
    }

    #[test]
    fn session_ids_cannot_leave_the_sessions_collection() {
        let gateway = HttpPaymentGateway::new(
            Client::new(),
            "https://pay.example.com/v1".into(),
            "sk_test".into(),
            "https://jobs.example.com/",
        )
        .unwrap();

        let url = gateway.session_url("../../admin/refunds?limit=1&x=").unwrap();
        assert_eq!(url.query(), None);
        let segments: Vec<&str> = url.path_segments().unwrap().collect();
        assert_eq!(segments.len(), 4);
        assert_eq!(&segments[..3], &["v1", "checkout", "sessions"]);
        assert!(!url.path().contains("/admin/"));

        let plain = gateway.session_url("cs_test_123").unwrap();
        assert_eq!(
            plain.as_str(),
            "https://pay.example.com/v1/checkout/sessions/cs_test_123"
        );
    }

    #[tokio::test]
    async fn session_lookup_only_hits_the_session_resource() {
        use axum::{http::Uri, Json, Router};
        use std::sync::{Arc, Mutex};

        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let recorded = seen.clone();
        let app = Router::new().fallback(move |uri: Uri| {
            let recorded = recorded.clone();
            async move {
                recorded.lock().unwrap().push(uri.to_string());
                Json(json!({ "id": "cs_1", "payment_status": "paid" }))
            }
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let gateway = HttpPaymentGateway::new(
            Client::new(),
            format!("http://{}/v1", addr),
            "sk_test".into(),
            "https://jobs.example.com/",
        )
        .unwrap();

        let status = gateway
            .session_status("../../admin/refunds?limit=1&x=")
            .await
            .unwrap();
        assert!(status.posting_id.is_none());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].starts_with("/v1/checkout/sessions/"), "{}", seen[0]);
        assert!(!seen[0].contains('?'), "{}", seen[0]);
        assert!(!seen[0].contains("/admin/"), "{}", seen[0]);
    }
}
