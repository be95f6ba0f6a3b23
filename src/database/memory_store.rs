use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::posting_store::{ActivationOutcome, PostingStore};
use crate::error::{Error, Result};
use crate::models::posting::{NewPosting, PaymentState, Posting};
use crate::services::query_builder::SearchQuery;
use crate::utils::time::now;

/// Process-local store evaluating the same predicate and ordering as the
/// SQL store. Every mutation happens under one write lock, which gives the
/// same all-or-nothing activation the database provides.
#[derive(Clone, Default)]
pub struct MemoryPostingStore {
    postings: Arc<RwLock<HashMap<Uuid, Posting>>>,
}

impl MemoryPostingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.postings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.postings.read().await.is_empty()
    }
}

#[async_trait]
impl PostingStore for MemoryPostingStore {
    async fn insert(&self, posting: NewPosting) -> Result<Posting> {
        let mut postings = self.postings.write().await;
        if postings.contains_key(&posting.id) {
            return Err(Error::BadRequest(format!(
                "Posting {} already exists",
                posting.id
            )));
        }
        let draft = posting.into_draft();
        postings.insert(draft.id, draft.clone());
        Ok(draft)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Posting>> {
        Ok(self.postings.read().await.get(&id).cloned())
    }

    async fn search(&self, query: &SearchQuery) -> Result<(Vec<Posting>, i64)> {
        let postings = self.postings.read().await;
        let mut matching: Vec<&Posting> = postings.values().filter(|p| query.matches(p)).collect();
        matching.sort_by(|a, b| SearchQuery::compare(a, b));

        let total = i64::try_from(matching.len()).unwrap_or(i64::MAX);
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(query.page_size()).unwrap_or(usize::MAX);
        let items = matching
            .into_iter()
            .skip(offset)
            .take(take)
            .cloned()
            .collect();
        Ok((items, total))
    }

    async fn list_by_employer(&self, employer_id: Uuid) -> Result<Vec<Posting>> {
        let postings = self.postings.read().await;
        let mut owned: Vec<Posting> = postings
            .values()
            .filter(|p| p.employer_id == employer_id)
            .cloned()
            .collect();
        owned.sort_by(SearchQuery::compare);
        Ok(owned)
    }

    async fn record_checkout(&self, id: Uuid, session_id: &str) -> Result<Option<Posting>> {
        let mut postings = self.postings.write().await;
        let Some(posting) = postings.get_mut(&id) else {
            return Ok(None);
        };
        if posting.payment_state != PaymentState::Pending {
            return Ok(None);
        }
        posting.checkout_session_id = Some(session_id.to_string());
        posting.checkout_canceled_at = None;
        posting.updated_at = now();
        Ok(Some(posting.clone()))
    }

    async fn mark_canceled(&self, id: Uuid) -> Result<Option<Posting>> {
        let mut postings = self.postings.write().await;
        let Some(posting) = postings.get_mut(&id) else {
            return Ok(None);
        };
        if posting.payment_state != PaymentState::Pending {
            return Ok(None);
        }
        let at = now();
        posting.checkout_canceled_at.get_or_insert(at);
        posting.updated_at = at;
        Ok(Some(posting.clone()))
    }

    async fn activate(&self, id: Uuid, payment_reference: &str) -> Result<ActivationOutcome> {
        let mut postings = self.postings.write().await;
        let Some(posting) = postings.get_mut(&id) else {
            return Ok(ActivationOutcome::Missing);
        };
        if posting.payment_state == PaymentState::Completed {
            return Ok(ActivationOutcome::AlreadyActive(posting.clone()));
        }
        let at = now();
        posting.visible = true;
        posting.payment_state = PaymentState::Completed;
        posting.payment_reference = Some(payment_reference.to_string());
        posting.activated_at = Some(at);
        posting.updated_at = at;
        Ok(ActivationOutcome::Activated(posting.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::posting::JobType;
    use chrono::Utc;

    fn new_posting(title: &str, location: &str) -> NewPosting {
        NewPosting {
            id: Uuid::new_v4(),
            employer_id: Uuid::new_v4(),
            title: title.into(),
            company: "Nairobi Tech Labs".into(),
            company_email: "jobs@example.com".into(),
            company_phone: "+254712345678".into(),
            location: location.into(),
            job_type: JobType::FullTime,
            category: "Technology".into(),
            description: "Build beautiful, responsive web interfaces".into(),
            requirements: None,
            salary_min: None,
            salary_max: None,
            image_url: None,
            application_deadline: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn drafts_stay_out_of_search_until_activated() {
        let store = MemoryPostingStore::new();
        let draft = store
            .insert(new_posting("Frontend Developer", "Nairobi"))
            .await
            .unwrap();

        let query = SearchQuery::new("Frontend", "", 1, 10);
        let (items, total) = store.search(&query).await.unwrap();
        assert!(items.is_empty());
        assert_eq!(total, 0);

        store.activate(draft.id, "tx_1").await.unwrap();
        let (items, total) = store
            .search(&SearchQuery::new("Frontend", "Nairobi", 1, 10))
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].id, draft.id);
    }

    #[tokio::test]
    async fn second_activation_reports_already_active() {
        let store = MemoryPostingStore::new();
        let draft = store.insert(new_posting("Ops", "Mombasa")).await.unwrap();

        assert!(matches!(
            store.activate(draft.id, "tx_1").await.unwrap(),
            ActivationOutcome::Activated(_)
        ));
        match store.activate(draft.id, "tx_2").await.unwrap() {
            ActivationOutcome::AlreadyActive(p) => {
                assert_eq!(p.payment_reference.as_deref(), Some("tx_1"))
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(matches!(
            store.activate(Uuid::new_v4(), "tx_3").await.unwrap(),
            ActivationOutcome::Missing
        ));
    }

    #[tokio::test]
    async fn cancellation_and_checkout_only_touch_pending_rows() {
        let store = MemoryPostingStore::new();
        let draft = store.insert(new_posting("Ops", "Mombasa")).await.unwrap();

        let canceled = store.mark_canceled(draft.id).await.unwrap().unwrap();
        assert!(canceled.checkout_canceled_at.is_some());

        let reopened = store
            .record_checkout(draft.id, "cs_1")
            .await
            .unwrap()
            .unwrap();
        assert!(reopened.checkout_canceled_at.is_none());
        assert_eq!(reopened.checkout_session_id.as_deref(), Some("cs_1"));

        store.activate(draft.id, "cs_1").await.unwrap();
        assert!(store.mark_canceled(draft.id).await.unwrap().is_none());
        assert!(store.record_checkout(draft.id, "cs_2").await.unwrap().is_none());
    }
}
