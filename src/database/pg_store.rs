use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::posting_store::{ActivationOutcome, PostingStore};
use crate::error::Result;
use crate::models::posting::{NewPosting, PaymentState, Posting};
use crate::services::query_builder::{SearchQuery, ORDER_BY};

const POSTING_COLUMNS: &str = "id, employer_id, title, company, company_email, company_phone, \
     location, job_type, category, description, requirements, salary_min, salary_max, image_url, \
     visible, payment_state, payment_reference, checkout_session_id, checkout_canceled_at, \
     activated_at, application_deadline, created_at, updated_at";

const SEARCH_SNAPSHOT: &str =
    "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY";

#[derive(Clone)]
pub struct PgPostingStore {
    pool: PgPool,
}

impl PgPostingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostingStore for PgPostingStore {
    async fn insert(&self, posting: NewPosting) -> Result<Posting> {
        let sql = format!(
            r#"
            INSERT INTO postings (
                id, employer_id, title, company, company_email, company_phone,
                location, job_type, category, description, requirements,
                salary_min, salary_max, image_url, application_deadline,
                visible, payment_state, created_at, updated_at
            ) VALUES (
                $1,$2,$3,$4,$5,$6,
                $7,$8,$9,$10,$11,
                $12,$13,$14,$15,
                FALSE,'pending',$16,$16
            )
            RETURNING {POSTING_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, Posting>(&sql)
            .bind(posting.id)
            .bind(posting.employer_id)
            .bind(posting.title)
            .bind(posting.company)
            .bind(posting.company_email)
            .bind(posting.company_phone)
            .bind(posting.location)
            .bind(posting.job_type)
            .bind(posting.category)
            .bind(posting.description)
            .bind(posting.requirements)
            .bind(posting.salary_min)
            .bind(posting.salary_max)
            .bind(posting.image_url)
            .bind(posting.application_deadline)
            .bind(posting.created_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Posting>> {
        let sql = format!("SELECT {POSTING_COLUMNS} FROM postings WHERE id = $1");
        let row = sqlx::query_as::<_, Posting>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn search(&self, query: &SearchQuery) -> Result<(Vec<Posting>, i64)> {
        let filter = query.to_sql_filter();
        let limit_idx = filter.next_placeholder();

        let items_query = format!(
            "SELECT {POSTING_COLUMNS} FROM postings {} ORDER BY {ORDER_BY} LIMIT ${} OFFSET ${}",
            filter.where_clause,
            limit_idx,
            limit_idx + 1
        );
        let total_query = format!("SELECT COUNT(*) FROM postings {}", filter.where_clause);

        // Both statements read the same snapshot so the count matches the page.
        let mut tx = self.pool.begin().await?;
        sqlx::query(SEARCH_SNAPSHOT).execute(&mut *tx).await?;

        let mut items_statement = sqlx::query_as::<_, Posting>(&items_query);
        for value in &filter.args {
            items_statement = items_statement.bind(value);
        }
        items_statement = items_statement
            .bind(query.page_size())
            .bind(query.offset());
        let items = items_statement.fetch_all(&mut *tx).await?;

        let mut total_statement = sqlx::query_scalar::<_, i64>(&total_query);
        for value in &filter.args {
            total_statement = total_statement.bind(value);
        }
        let total = total_statement.fetch_one(&mut *tx).await?;
        tx.commit().await?;

        Ok((items, total))
    }

    async fn list_by_employer(&self, employer_id: Uuid) -> Result<Vec<Posting>> {
        let sql = format!(
            "SELECT {POSTING_COLUMNS} FROM postings WHERE employer_id = $1 ORDER BY {ORDER_BY}"
        );
        let rows = sqlx::query_as::<_, Posting>(&sql)
            .bind(employer_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn record_checkout(&self, id: Uuid, session_id: &str) -> Result<Option<Posting>> {
        let sql = format!(
            r#"
            UPDATE postings
            SET checkout_session_id = $2,
                checkout_canceled_at = NULL,
                updated_at = NOW()
            WHERE id = $1 AND payment_state = 'pending'
            RETURNING {POSTING_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, Posting>(&sql)
            .bind(id)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn mark_canceled(&self, id: Uuid) -> Result<Option<Posting>> {
        let sql = format!(
            r#"
            UPDATE postings
            SET checkout_canceled_at = COALESCE(checkout_canceled_at, NOW()),
                updated_at = NOW()
            WHERE id = $1 AND payment_state = 'pending'
            RETURNING {POSTING_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, Posting>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn activate(&self, id: Uuid, payment_reference: &str) -> Result<ActivationOutcome> {
        // Single statement: the row lock taken by UPDATE serialises racing
        // confirmations and the pending guard lets exactly one of them win.
        let sql = format!(
            r#"
            UPDATE postings
            SET visible = TRUE,
                payment_state = 'completed',
                payment_reference = $2,
                activated_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND payment_state = 'pending'
            RETURNING {POSTING_COLUMNS}
            "#
        );
        let updated = sqlx::query_as::<_, Posting>(&sql)
            .bind(id)
            .bind(payment_reference)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(posting) = updated {
            return Ok(ActivationOutcome::Activated(posting));
        }

        match self.get(id).await? {
            Some(posting) if posting.payment_state == PaymentState::Completed => {
                Ok(ActivationOutcome::AlreadyActive(posting))
            }
            _ => Ok(ActivationOutcome::Missing),
        }
    }
}
