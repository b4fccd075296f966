//! Persistence seam.
//!
//! Every request runs inside one `StoreTx`: obtain it with `Store::begin`, do the
//! reads and writes, then `commit`. Dropping a transaction without committing
//! discards its writes.
//!
//! `AppState` carries an `Arc<dyn Store>`; the backend is chosen at startup
//! (`PgStore` in production, `MemoryStore` for local runs and tests).
//!
//! All reads skip soft-deleted rows unless stated otherwise.

use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;

use crate::catalog::ads::AdQuery;
use crate::errors::AppError;
use crate::matching::candidates::CandidateQuery;
use crate::models::ad::{AdRow, AdSkillRow, NewAd, SkillLevel};
use crate::models::job_match::{JobMatchRow, MatchKey, NewJobMatch};
use crate::models::profile::{
    CompanyRow, InfoRow, Party, PartyKind, ProfessionalRow, ProfessionalStatus, Profile,
};
use crate::models::skill::SkillRow;

pub mod memory;
pub mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError>;
}

#[async_trait]
pub trait StoreTx: Send {
    // ── Profiles ────────────────────────────────────────────────────────────

    async fn insert_professional(
        &mut self,
        first_name: &str,
        last_name: &str,
    ) -> Result<ProfessionalRow, AppError>;

    async fn set_professional_status(
        &mut self,
        id: Uuid,
        status: ProfessionalStatus,
    ) -> Result<(), AppError>;

    async fn insert_company(&mut self, name: &str) -> Result<CompanyRow, AppError>;

    async fn find_professional(&mut self, id: Uuid) -> Result<Option<ProfessionalRow>, AppError>;

    async fn find_company(&mut self, id: Uuid) -> Result<Option<CompanyRow>, AppError>;

    /// The live profile that owns `info_id`, if any.
    async fn find_owner_of_info(&mut self, info_id: Uuid) -> Result<Option<Profile>, AppError>;

    async fn soft_delete_profile(&mut self, party: Party) -> Result<(), AppError>;

    async fn insert_info(&mut self, description: &str, location: &str)
        -> Result<InfoRow, AppError>;

    async fn find_info(&mut self, id: Uuid) -> Result<Option<InfoRow>, AppError>;

    async fn update_info(
        &mut self,
        id: Uuid,
        description: &str,
        location: &str,
    ) -> Result<(), AppError>;

    /// Points the profile at `info_id`.
    async fn link_info(&mut self, party: Party, info_id: Uuid) -> Result<(), AppError>;

    async fn set_main_ad(&mut self, info_id: Uuid, ad_id: Option<Uuid>) -> Result<(), AppError>;

    /// Nulls every `main_ad_id` that points at `ad_id`. Returns rows touched.
    async fn clear_main_ad_references(&mut self, ad_id: Uuid) -> Result<u64, AppError>;

    // ── Ads ─────────────────────────────────────────────────────────────────

    async fn insert_ad(&mut self, ad: &NewAd) -> Result<AdRow, AppError>;

    async fn find_ad(&mut self, id: Uuid) -> Result<Option<AdRow>, AppError>;

    /// Writes description, location, status and salary range of `ad`.
    async fn update_ad(&mut self, ad: &AdRow) -> Result<(), AppError>;

    async fn list_ads_for_info(&mut self, info_id: Uuid) -> Result<Vec<AdRow>, AppError>;

    async fn find_candidates(&mut self, query: &CandidateQuery) -> Result<Vec<AdRow>, AppError>;

    /// Live ads passing the search filters, oldest first.
    async fn list_ads(&mut self, query: &AdQuery) -> Result<Vec<AdRow>, AppError>;

    async fn soft_delete_ad(&mut self, id: Uuid) -> Result<(), AppError>;

    // ── Skills ──────────────────────────────────────────────────────────────

    /// Inserts a skill, reviving a soft-deleted one with the same name.
    /// Returns `None` when a live skill already holds the name.
    async fn insert_skill(&mut self, name: &str) -> Result<Option<SkillRow>, AppError>;

    async fn find_skill_by_name(&mut self, name: &str) -> Result<Option<SkillRow>, AppError>;

    async fn list_skills(&mut self) -> Result<Vec<SkillRow>, AppError>;

    async fn rename_skill(&mut self, id: Uuid, new_name: &str) -> Result<(), AppError>;

    /// Flags the skill deleted and detaches it from every ad, so a later
    /// revival starts with no attachments.
    async fn soft_delete_skill(&mut self, id: Uuid) -> Result<(), AppError>;

    /// Attaches a skill to an ad, overwriting the level if already attached.
    async fn attach_skill(
        &mut self,
        ad_id: Uuid,
        skill_id: Uuid,
        level: SkillLevel,
    ) -> Result<(), AppError>;

    /// Returns false when the skill was not attached.
    async fn detach_skill(&mut self, ad_id: Uuid, skill_id: Uuid) -> Result<bool, AppError>;

    async fn ad_skills(&mut self, ad_id: Uuid) -> Result<Vec<AdSkillRow>, AppError>;

    async fn ad_skill_ids(&mut self, ad_id: Uuid) -> Result<HashSet<Uuid>, AppError>;

    // ── Matches ─────────────────────────────────────────────────────────────

    /// Idempotent insert. Returns false when a row for the (ad, resume) pair exists,
    /// deleted or not.
    async fn insert_match(&mut self, new_match: &NewJobMatch) -> Result<bool, AppError>;

    async fn find_match(&mut self, key: MatchKey) -> Result<Option<JobMatchRow>, AppError>;

    async fn list_matches_for(&mut self, party: Party) -> Result<Vec<JobMatchRow>, AppError>;

    /// Sets the approval flag belonging to `side`. The other flag is untouched.
    async fn approve_match(&mut self, key: MatchKey, side: PartyKind) -> Result<(), AppError>;

    /// Soft-deletes matches where `ad_id` is the job-ad side, or the resume side
    /// when `is_resume`. Returns rows touched.
    async fn soft_delete_matches_for_ad(
        &mut self,
        ad_id: Uuid,
        is_resume: bool,
    ) -> Result<u64, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;

    /// Resolves a party to its live profile row.
    async fn find_profile(&mut self, party: Party) -> Result<Option<Profile>, AppError> {
        Ok(match party {
            Party::Professional(id) => self.find_professional(id).await?.map(Profile::Professional),
            Party::Company(id) => self.find_company(id).await?.map(Profile::Company),
        })
    }
}

/// Like `StoreTx::find_profile`, but a missing profile is a 404.
pub async fn require_profile(tx: &mut dyn StoreTx, party: Party) -> Result<Profile, AppError> {
    tx.find_profile(party).await?.ok_or_else(|| match party.kind() {
        PartyKind::Professional => {
            AppError::NotFound("You are not logged as professional".to_string())
        }
        PartyKind::Company => AppError::NotFound("You are not logged as company".to_string()),
    })
}
