use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A job ad (company-authored) or a resume (professional-authored).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdRow {
    pub id: Uuid,
    /// Owning profile info. `None` for orphaned rows created before the owner set up info.
    pub info_id: Option<Uuid>,
    pub description: String,
    pub location: String,
    pub status: String,
    pub min_salary: i32,
    pub max_salary: i32,
    pub is_resume: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl AdRow {
    /// Parsed status. Rows only ever hold values written through `AdStatus::as_str`.
    pub fn status(&self) -> Option<AdStatus> {
        self.status.parse().ok()
    }

    pub fn is_active(&self) -> bool {
        self.status() == Some(AdStatus::Active)
    }
}

/// Insert payload for a new ad.
#[derive(Debug, Clone)]
pub struct NewAd {
    pub info_id: Uuid,
    pub description: String,
    pub location: String,
    pub status: AdStatus,
    pub min_salary: i32,
    pub max_salary: i32,
    pub is_resume: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdStatus {
    Active,
    Archived,
    Hidden,
    Private,
    Matched,
}

impl AdStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdStatus::Active => "Active",
            AdStatus::Archived => "Archived",
            AdStatus::Hidden => "Hidden",
            AdStatus::Private => "Private",
            AdStatus::Matched => "Matched",
        }
    }

    /// Resumes may be Active/Hidden/Private/Matched; job ads Active/Archived/Matched.
    pub fn allowed_for(&self, is_resume: bool) -> bool {
        match self {
            AdStatus::Active | AdStatus::Matched => true,
            AdStatus::Hidden | AdStatus::Private => is_resume,
            AdStatus::Archived => !is_resume,
        }
    }
}

impl fmt::Display for AdStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(AdStatus::Active),
            "Archived" => Ok(AdStatus::Archived),
            "Hidden" => Ok(AdStatus::Hidden),
            "Private" => Ok(AdStatus::Private),
            "Matched" => Ok(AdStatus::Matched),
            other => Err(format!("unknown ad status '{other}'")),
        }
    }
}

/// Proficiency level carried on the ad ↔ skill join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SkillLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Proficient,
    Native,
    Master,
}

impl SkillLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "Beginner",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::Advanced => "Advanced",
            SkillLevel::Proficient => "Proficient",
            SkillLevel::Native => "Native",
            SkillLevel::Master => "Master",
        }
    }
}

/// A skill attached to an ad, joined with its name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdSkillRow {
    pub ad_id: Uuid,
    pub skill_id: Uuid,
    pub name: String,
    pub level: String,
}
