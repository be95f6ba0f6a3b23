//! Applies payment-gateway confirmations to postings.
//!
//! This is the only code path that flips a posting to visible. Every entry
//! point is safe to call any number of times for the same posting.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::database::posting_store::{ActivationOutcome, PostingStore};
use crate::error::{Error, Result};
use crate::models::posting::Posting;
use crate::services::payment_service::PaymentGateway;

#[derive(Clone)]
pub struct ActivationService {
    store: Arc<dyn PostingStore>,
    gateway: Arc<dyn PaymentGateway>,
}

impl ActivationService {
    pub fn new(store: Arc<dyn PostingStore>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { store, gateway }
    }

    /// Marks a posting paid and visible. Already-active postings are
    /// returned untouched whatever `transaction_reference` is passed.
    pub async fn activate(&self, posting_id: Uuid, transaction_reference: &str) -> Result<Posting> {
        let transaction_reference = transaction_reference.trim();
        if transaction_reference.is_empty() {
            return Err(Error::BadRequest("Missing transaction reference".into()));
        }

        let existing = self
            .store
            .get(posting_id)
            .await
            .map_err(|e| activation_failed(posting_id, e))?
            .ok_or_else(|| Error::NotFound(format!("Posting {} not found", posting_id)))?;

        if existing.is_active() {
            info!(%posting_id, "Activation replayed for an already active posting");
            return Ok(existing);
        }

        let outcome = self
            .store
            .activate(posting_id, transaction_reference)
            .await
            .map_err(|e| activation_failed(posting_id, e))?;

        match outcome {
            ActivationOutcome::Activated(posting) => {
                info!(
                    %posting_id,
                    employer_id = %posting.employer_id,
                    payment_reference = transaction_reference,
                    "Posting activated"
                );
                Ok(posting)
            }
            ActivationOutcome::AlreadyActive(posting) => {
                info!(%posting_id, "Posting was activated by a concurrent confirmation");
                Ok(posting)
            }
            ActivationOutcome::Missing => {
                warn!(%posting_id, "Posting disappeared before activation could be written");
                Err(Error::Activation(format!(
                    "Posting {} could not be activated because it no longer exists",
                    posting_id
                )))
            }
        }
    }

    /// Handles the browser coming back from checkout. The query string is
    /// user-controlled, so the session is looked up with the gateway before
    /// anything is written.
    pub async fn activate_from_redirect(&self, posting_id: Uuid, session_id: &str) -> Result<Posting> {
        let existing = self
            .store
            .get(posting_id)
            .await
            .map_err(|e| activation_failed(posting_id, e))?;
        if let Some(existing) = existing {
            if existing.is_active() {
                return Ok(existing);
            }
        }

        let status = self.gateway.session_status(session_id).await?;
        // A session that does not name this posting proves nothing about it.
        if status.posting_id != Some(posting_id) {
            warn!(%posting_id, session_id, session_posting = ?status.posting_id, "Checkout session is not bound to this posting");
            return Err(Error::BadRequest(
                "Checkout session does not belong to this posting".into(),
            ));
        }
        if !status.paid {
            return Err(Error::PaymentSession(format!(
                "Checkout session {} has not been paid",
                session_id
            )));
        }

        self.activate(posting_id, &status.session_id).await
    }

    /// Records that checkout was abandoned. Informational only: no charge
    /// exists yet, so the gateway is not contacted.
    pub async fn cancel(&self, posting_id: Uuid) -> Result<Posting> {
        apply_cancellation(self.store.as_ref(), posting_id).await
    }
}

/// Draft → CanceledPending. No-op for postings already canceled or active.
pub(crate) async fn apply_cancellation(store: &dyn PostingStore, posting_id: Uuid) -> Result<Posting> {
    if let Some(posting) = store.mark_canceled(posting_id).await? {
        info!(%posting_id, "Checkout canceled, posting kept as draft");
        return Ok(posting);
    }
    store
        .get(posting_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Posting {} not found", posting_id)))
}

fn activation_failed(posting_id: Uuid, err: Error) -> Error {
    warn!(%posting_id, error = %err, "Activation store access failed");
    Error::Activation(format!("Posting {}: {}", posting_id, err))
}
