use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::posting::{NewPosting, Posting};
use crate::services::query_builder::SearchQuery;

/// Result of the conditional activation write.
#[derive(Debug, Clone)]
pub enum ActivationOutcome {
    /// This call flipped the posting from pending to completed.
    Activated(Posting),
    /// The posting had already been completed; nothing was written.
    AlreadyActive(Posting),
    /// No row to update (never existed or deleted concurrently).
    Missing,
}

/// Backend data store for postings.
///
/// Implementations must make [`PostingStore::activate`] a single atomic
/// conditional write: `visible`, `payment_state` and `payment_reference`
/// change together or not at all.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostingStore: Send + Sync {
    async fn insert(&self, posting: NewPosting) -> Result<Posting>;

    async fn get(&self, id: Uuid) -> Result<Option<Posting>>;

    /// Visible postings matching `query`, sliced to the requested page,
    /// plus the unsliced match count.
    async fn search(&self, query: &SearchQuery) -> Result<(Vec<Posting>, i64)>;

    async fn list_by_employer(&self, employer_id: Uuid) -> Result<Vec<Posting>>;

    /// Records a freshly opened checkout session on a pending posting and
    /// clears any earlier cancellation. `None` when no pending row matched.
    async fn record_checkout(&self, id: Uuid, session_id: &str) -> Result<Option<Posting>>;

    /// Marks a pending posting as having an abandoned checkout. `None` when
    /// no pending row matched.
    async fn mark_canceled(&self, id: Uuid) -> Result<Option<Posting>>;

    async fn activate(&self, id: Uuid, payment_reference: &str) -> Result<ActivationOutcome>;
}
