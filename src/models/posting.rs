use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_type")]
pub enum JobType {
    #[serde(rename = "Full-time")]
    #[sqlx(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    #[sqlx(rename = "Part-time")]
    PartTime,
    #[serde(rename = "Contract")]
    #[sqlx(rename = "Contract")]
    Contract,
    #[serde(rename = "Internship")]
    #[sqlx(rename = "Internship")]
    Internship,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::PartTime => "Part-time",
            JobType::Contract => "Contract",
            JobType::Internship => "Internship",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = String;

    /// Accepts the display form as well as `full_time` / `fulltime` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "fulltime" => Ok(JobType::FullTime),
            "parttime" => Ok(JobType::PartTime),
            "contract" => Ok(JobType::Contract),
            "internship" => Ok(JobType::Internship),
            _ => Err(format!("unknown job type: {}", s.trim())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_state", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    Pending,
    Completed,
}

/// Lifecycle state derived from the persisted lifecycle columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingState {
    Draft,
    CanceledPending,
    Active,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Posting {
    pub id: Uuid,
    pub employer_id: Uuid,
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
    pub visible: bool,
    pub payment_state: PaymentState,
    pub payment_reference: Option<String>,
    pub checkout_session_id: Option<String>,
    pub checkout_canceled_at: Option<DateTime<Utc>>,
    pub activated_at: Option<DateTime<Utc>>,
    pub application_deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Posting {
    pub fn state(&self) -> PostingState {
        match self.payment_state {
            PaymentState::Completed => PostingState::Active,
            PaymentState::Pending if self.checkout_canceled_at.is_some() => {
                PostingState::CanceledPending
            }
            PaymentState::Pending => PostingState::Draft,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == PostingState::Active
    }

    pub fn is_owned_by(&self, actor: Uuid) -> bool {
        self.employer_id == actor
    }
}

/// Everything a store needs to persist a fresh draft.
#[derive(Debug, Clone)]
pub struct NewPosting {
    pub id: Uuid,
    pub employer_id: Uuid,
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

impl NewPosting {
    pub fn into_draft(self) -> Posting {
        Posting {
            id: self.id,
            employer_id: self.employer_id,
            title: self.title,
            company: self.company,
            company_email: self.company_email,
            company_phone: self.company_phone,
            location: self.location,
            job_type: self.job_type,
            category: self.category,
            description: self.description,
            requirements: self.requirements,
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            image_url: self.image_url,
            visible: false,
            payment_state: PaymentState::Pending,
            payment_reference: None,
            checkout_session_id: None,
            checkout_canceled_at: None,
            activated_at: None,
            application_deadline: self.application_deadline,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_type_parses_loose_spellings() {
        assert_eq!("Full-time".parse::<JobType>(), Ok(JobType::FullTime));
        assert_eq!("part_time".parse::<JobType>(), Ok(JobType::PartTime));
        assert_eq!(" CONTRACT ".parse::<JobType>(), Ok(JobType::Contract));
        assert!("freelance".parse::<JobType>().is_err());
    }

    #[test]
    fn state_follows_payment_and_cancellation_columns() {
        let mut posting = NewPosting {
            id: Uuid::new_v4(),
            employer_id: Uuid::new_v4(),
            title: "Frontend Developer".into(),
            company: "Nairobi Tech Labs".into(),
            company_email: "jobs@example.com".into(),
            company_phone: "+254712345678".into(),
            location: "Nairobi".into(),
            job_type: JobType::FullTime,
            category: "Technology".into(),
            description: "Build interfaces".into(),
            requirements: None,
            salary_min: None,
            salary_max: None,
            image_url: None,
            application_deadline: None,
            created_at: Utc::now(),
        }
        .into_draft();

        assert_eq!(posting.state(), PostingState::Draft);
        assert!(!posting.visible);

        posting.checkout_canceled_at = Some(Utc::now());
        assert_eq!(posting.state(), PostingState::CanceledPending);

        posting.payment_state = PaymentState::Completed;
        assert_eq!(posting.state(), PostingState::Active);
    }
}
