use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::database::posting_store::PostingStore;
use crate::dto::posting_dto::CreatePostingPayload;
use crate::error::{Error, Result};
use crate::models::posting::{JobType, NewPosting, Posting, PostingState};
use crate::services::activation_service::{apply_cancellation, ActivationService};
use crate::services::paginator::Page;
use crate::services::payment_service::{CheckoutSession, ListingPrice, PaymentGateway};
use crate::services::query_builder::SearchQuery;
use crate::services::storage_service::{owner_scoped_key, ObjectStorage};
use crate::utils::time::now;
use crate::utils::validation::{field_errors, validate_image};

/// An uploaded poster as received from the form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Owns the posting lifecycle: creation, checkout, cancellation and the
/// read paths that must respect visibility.
#[derive(Clone)]
pub struct PostingService {
    store: Arc<dyn PostingStore>,
    storage: Arc<dyn ObjectStorage>,
    gateway: Arc<dyn PaymentGateway>,
    reconciler: ActivationService,
    price: ListingPrice,
}

impl PostingService {
    pub fn new(
        store: Arc<dyn PostingStore>,
        storage: Arc<dyn ObjectStorage>,
        gateway: Arc<dyn PaymentGateway>,
        price: ListingPrice,
    ) -> Self {
        let reconciler = ActivationService::new(store.clone(), gateway.clone());
        Self {
            store,
            storage,
            gateway,
            reconciler,
            price,
        }
    }

    pub fn reconciler(&self) -> &ActivationService {
        &self.reconciler
    }

    /// Saves a new invisible draft. When the image cannot be stored the
    /// draft is still saved and [`Error::AssetUpload`] names it.
    pub async fn create(
        &self,
        owner: Uuid,
        payload: CreatePostingPayload,
        image: Option<ImageUpload>,
    ) -> Result<Posting> {
        payload.validate()?;
        let job_type: JobType = payload
            .job_type
            .parse()
            .map_err(|e: String| Error::BadRequest(e))?;

        let image = match image {
            Some(upload) => {
                let kind = validate_image(
                    &upload.file_name,
                    upload.content_type.as_deref(),
                    &upload.data,
                )
                .map_err(|e| Error::Validation(field_errors("image", e)))?;
                Some((upload, kind))
            }
            None => None,
        };

        let created_at = now();
        let id = Uuid::new_v4();

        let mut upload_failure = None;
        let image_url = match image {
            Some((upload, kind)) => {
                let key = owner_scoped_key(owner, created_at.timestamp_millis(), kind.extension());
                match self
                    .storage
                    .store(&key, upload.data, kind.content_type())
                    .await
                {
                    Ok(reference) => Some(reference),
                    Err(e) => {
                        warn!(posting_id = %id, employer_id = %owner, error = %e, "Image upload failed, saving posting without it");
                        upload_failure = Some(e.to_string());
                        None
                    }
                }
            }
            None => None,
        };

        let posting = self
            .store
            .insert(NewPosting {
                id,
                employer_id: owner,
                title: payload.title,
                company: payload.company,
                company_email: payload.company_email,
                company_phone: payload.company_phone,
                location: payload.location,
                job_type,
                category: payload.category,
                description: payload.description,
                requirements: payload.requirements.filter(|r| !r.trim().is_empty()),
                salary_min: payload.salary_min,
                salary_max: payload.salary_max,
                image_url,
                application_deadline: payload.application_deadline,
                created_at,
            })
            .await?;

        info!(posting_id = %posting.id, employer_id = %owner, "Draft posting created");

        match upload_failure {
            Some(reason) => Err(Error::AssetUpload {
                posting_id: posting.id,
                reason,
            }),
            None => Ok(posting),
        }
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Page<Posting>> {
        let (items, total) = self.store.search(query).await?;
        Ok(Page::new(query, items, total))
    }

    /// Job detail for the public site. Drafts are reported as missing.
    pub async fn get_public(&self, posting_id: Uuid) -> Result<Posting> {
        match self.store.get(posting_id).await? {
            Some(posting) if posting.visible => Ok(posting),
            _ => Err(Error::NotFound(format!("Posting {} not found", posting_id))),
        }
    }

    pub async fn get_for_owner(&self, posting_id: Uuid, actor: Uuid) -> Result<Posting> {
        self.load_owned(posting_id, actor).await
    }

    pub async fn list_for_owner(&self, actor: Uuid) -> Result<Vec<Posting>> {
        self.store.list_by_employer(actor).await
    }

    /// Opens a checkout session for a draft. The posting is only touched
    /// after the gateway has answered.
    pub async fn request_payment(&self, posting_id: Uuid, actor: Uuid) -> Result<CheckoutSession> {
        let posting = self.load_owned(posting_id, actor).await?;
        if posting.state() == PostingState::Active {
            return Err(Error::BadRequest(format!(
                "Posting {} is already active",
                posting_id
            )));
        }

        let session = self
            .gateway
            .create_session(posting_id, &self.price)
            .await
            .map_err(|e| match e {
                Error::PaymentSession(msg) => Error::PaymentSession(msg),
                other => Error::PaymentSession(other.to_string()),
            })?;

        if self
            .store
            .record_checkout(posting_id, &session.session_id)
            .await?
            .is_none()
        {
            // Lost a race with an activation or a delete.
            return match self.store.get(posting_id).await? {
                Some(p) if p.is_active() => Err(Error::BadRequest(format!(
                    "Posting {} is already active",
                    posting_id
                ))),
                Some(_) => Ok(session),
                None => Err(Error::NotFound(format!("Posting {} not found", posting_id))),
            };
        }

        info!(
            %posting_id,
            employer_id = %actor,
            session_id = %session.session_id,
            amount_cents = self.price.amount_cents,
            "Payment requested"
        );
        Ok(session)
    }

    pub async fn record_cancellation(&self, posting_id: Uuid, actor: Uuid) -> Result<Posting> {
        self.load_owned(posting_id, actor).await?;
        apply_cancellation(self.store.as_ref(), posting_id).await
    }

    /// The only way into `Active`; see [`ActivationService::activate`].
    pub async fn confirm_activation(&self, posting_id: Uuid, transaction_reference: &str) -> Result<Posting> {
        self.reconciler.activate(posting_id, transaction_reference).await
    }

    async fn load_owned(&self, posting_id: Uuid, actor: Uuid) -> Result<Posting> {
        let posting = self
            .store
            .get(posting_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Posting {} not found", posting_id)))?;
        if !posting.is_owned_by(actor) {
            warn!(%posting_id, actor = %actor, "Rejected mutation by non-owner");
            return Err(Error::NotOwner(format!(
                "Posting {} belongs to another employer",
                posting_id
            )));
        }
        Ok(posting)
    }
}
