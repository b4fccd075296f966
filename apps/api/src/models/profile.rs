use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Profile details shared by professionals and companies.
/// Each row is owned by exactly one professional or one company.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InfoRow {
    pub id: Uuid,
    pub description: String,
    pub location: String,
    /// The professional's featured resume. Cleared when that resume is deleted.
    pub main_ad_id: Option<Uuid>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfessionalRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub info_id: Option<Uuid>,
    /// Availability, as written by `ProfessionalStatus::as_str`.
    pub status: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl ProfessionalRow {
    pub fn status(&self) -> Option<ProfessionalStatus> {
        self.status.parse().ok()
    }
}

/// Whether a professional is open to offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfessionalStatus {
    #[default]
    Active,
    Busy,
}

impl ProfessionalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfessionalStatus::Active => "active",
            ProfessionalStatus::Busy => "busy",
        }
    }
}

impl FromStr for ProfessionalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProfessionalStatus::Active),
            "busy" => Ok(ProfessionalStatus::Busy),
            other => Err(format!("unknown professional status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyRow {
    pub id: Uuid,
    pub name: String,
    pub info_id: Option<Uuid>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyKind {
    Professional,
    Company,
}

impl PartyKind {
    /// Professionals author resumes; companies author job ads.
    pub fn authors_resumes(&self) -> bool {
        matches!(self, PartyKind::Professional)
    }
}

/// Identity of the acting side of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Party {
    Professional(Uuid),
    Company(Uuid),
}

impl Party {
    pub fn new(kind: PartyKind, id: Uuid) -> Self {
        match kind {
            PartyKind::Professional => Party::Professional(id),
            PartyKind::Company => Party::Company(id),
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Party::Professional(id) | Party::Company(id) => *id,
        }
    }

    pub fn kind(&self) -> PartyKind {
        match self {
            Party::Professional(_) => PartyKind::Professional,
            Party::Company(_) => PartyKind::Company,
        }
    }
}

/// A resolved, non-deleted profile.
#[derive(Debug, Clone)]
pub enum Profile {
    Professional(ProfessionalRow),
    Company(CompanyRow),
}

impl Profile {
    pub fn party(&self) -> Party {
        match self {
            Profile::Professional(p) => Party::Professional(p.id),
            Profile::Company(c) => Party::Company(c.id),
        }
    }

    pub fn info_id(&self) -> Option<Uuid> {
        match self {
            Profile::Professional(p) => p.info_id,
            Profile::Company(c) => c.info_id,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Profile::Professional(p) => format!("{} {}", p.first_name, p.last_name),
            Profile::Company(c) => c.name.clone(),
        }
    }
}
