use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A proposed pairing of one job ad with one resume.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobMatchRow {
    /// The job-ad side of the pairing.
    pub ad_id: Uuid,
    pub resume_id: Uuid,
    pub professional_id: Uuid,
    pub company_id: Uuid,
    pub company_approved: bool,
    pub professional_approved: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl JobMatchRow {
    pub fn key(&self) -> MatchKey {
        MatchKey {
            ad_id: self.ad_id,
            resume_id: self.resume_id,
        }
    }

    /// Both sides have approved.
    pub fn is_mutual(&self) -> bool {
        self.company_approved && self.professional_approved
    }
}

/// Unique identity of a match: one row per (job ad, resume) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchKey {
    pub ad_id: Uuid,
    pub resume_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewJobMatch {
    pub ad_id: Uuid,
    pub resume_id: Uuid,
    pub professional_id: Uuid,
    pub company_id: Uuid,
}

impl NewJobMatch {
    pub fn key(&self) -> MatchKey {
        MatchKey {
            ad_id: self.ad_id,
            resume_id: self.resume_id,
        }
    }
}

/// A match as shown to one side: the counterpart's ad and name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchDisplay {
    pub ad_id: Uuid,
    pub resume_id: Uuid,
    pub counterpart_name: String,
    pub counterpart_ad_id: Uuid,
    pub description: String,
    pub location: String,
    pub status: String,
    pub min_salary: i32,
    pub max_salary: i32,
    pub company_approved: bool,
    pub professional_approved: bool,
    pub mutually_approved: bool,
}
