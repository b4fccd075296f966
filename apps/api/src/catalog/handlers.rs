//! Axum route handlers for profiles, ads and skills.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::ads::{self, AdDetail, AdDraft, AdPatch, AdSearch};
use crate::catalog::profiles::{self, InfoUpdate, ProfileView};
use crate::catalog::skills;
use crate::errors::AppError;
use crate::matching::cascade::{self, CascadeReport};
use crate::models::ad::{AdRow, AdSkillRow, SkillLevel};
use crate::models::profile::{
    CompanyRow, InfoRow, Party, PartyKind, ProfessionalRow, ProfessionalStatus,
};
use crate::models::skill::SkillRow;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Acting identity, passed on every party-scoped request.
#[derive(Debug, Deserialize)]
pub struct PartyQuery {
    pub party: PartyKind,
    pub party_id: Uuid,
}

impl PartyQuery {
    pub fn party(&self) -> Party {
        Party::new(self.party, self.party_id)
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterProfessionalRequest {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterCompanyRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct MainResumeRequest {
    pub resume_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: ProfessionalStatus,
}

#[derive(Debug, Deserialize)]
pub struct AdSkillRequest {
    pub skill: String,
    #[serde(default)]
    pub level: SkillLevel,
}

#[derive(Debug, Deserialize)]
pub struct SkillRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameSkillRequest {
    pub name: String,
    pub new_name: String,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
    pub cascade: CascadeReport,
}

// ────────────────────────────────────────────────────────────────────────────
// Profiles
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/professionals
pub async fn handle_register_professional(
    State(state): State<AppState>,
    Json(req): Json<RegisterProfessionalRequest>,
) -> Result<(StatusCode, Json<ProfessionalRow>), AppError> {
    let row =
        profiles::register_professional(state.store.as_ref(), &req.first_name, &req.last_name)
            .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// POST /api/v1/companies
pub async fn handle_register_company(
    State(state): State<AppState>,
    Json(req): Json<RegisterCompanyRequest>,
) -> Result<(StatusCode, Json<CompanyRow>), AppError> {
    let row = profiles::register_company(state.store.as_ref(), &req.name).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /api/v1/info
pub async fn handle_edit_info(
    State(state): State<AppState>,
    Query(params): Query<PartyQuery>,
    Json(req): Json<InfoUpdate>,
) -> Result<Json<InfoRow>, AppError> {
    let info = profiles::edit_info(state.store.as_ref(), params.party(), req).await?;
    Ok(Json(info))
}

/// GET /api/v1/profiles
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Query(params): Query<PartyQuery>,
) -> Result<Json<ProfileView>, AppError> {
    let view = profiles::profile_view(state.store.as_ref(), params.party()).await?;
    Ok(Json(view))
}

/// DELETE /api/v1/profiles
///
/// Soft-deletes the profile and every ad it owns, retiring their matches.
pub async fn handle_delete_profile(
    State(state): State<AppState>,
    Query(params): Query<PartyQuery>,
) -> Result<Json<DeletedResponse>, AppError> {
    let report = cascade::delete_profile(state.store.as_ref(), params.party()).await?;
    Ok(Json(DeletedResponse {
        deleted: true,
        cascade: report,
    }))
}

/// PUT /api/v1/professionals/main-resume
pub async fn handle_set_main_resume(
    State(state): State<AppState>,
    Query(params): Query<PartyQuery>,
    Json(req): Json<MainResumeRequest>,
) -> Result<Json<InfoRow>, AppError> {
    let info =
        profiles::set_main_resume(state.store.as_ref(), params.party(), req.resume_id).await?;
    Ok(Json(info))
}

/// PATCH /api/v1/professionals/status
pub async fn handle_change_status(
    State(state): State<AppState>,
    Query(params): Query<PartyQuery>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<ProfessionalRow>, AppError> {
    let row = profiles::change_status(state.store.as_ref(), params.party(), req.status).await?;
    Ok(Json(row))
}

/// GET /api/v1/professionals/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    Query(params): Query<PartyQuery>,
) -> Result<Json<Vec<AdRow>>, AppError> {
    Ok(Json(
        profiles::list_resumes(state.store.as_ref(), params.party()).await?,
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Ads
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/ads
///
/// Companies browse resumes, professionals browse job ads.
pub async fn handle_search_ads(
    State(state): State<AppState>,
    Query(params): Query<PartyQuery>,
    Query(search): Query<AdSearch>,
) -> Result<Json<Vec<AdRow>>, AppError> {
    let found = ads::search_ads(state.store.as_ref(), params.party(), search).await?;
    Ok(Json(found))
}

/// POST /api/v1/ads
///
/// Professionals create resumes, companies create job ads.
pub async fn handle_create_ad(
    State(state): State<AppState>,
    Query(params): Query<PartyQuery>,
    Json(req): Json<AdDraft>,
) -> Result<(StatusCode, Json<AdRow>), AppError> {
    let ad = ads::create_ad(state.store.as_ref(), params.party(), req).await?;
    Ok((StatusCode::CREATED, Json(ad)))
}

/// GET /api/v1/ads/:id
pub async fn handle_get_ad(
    State(state): State<AppState>,
    Path(ad_id): Path<Uuid>,
) -> Result<Json<AdDetail>, AppError> {
    let detail = ads::get_ad(state.store.as_ref(), ad_id).await?;
    Ok(Json(detail))
}

/// PATCH /api/v1/ads/:id
pub async fn handle_update_ad(
    State(state): State<AppState>,
    Path(ad_id): Path<Uuid>,
    Query(params): Query<PartyQuery>,
    Json(req): Json<AdPatch>,
) -> Result<Json<AdRow>, AppError> {
    let ad = ads::update_ad(state.store.as_ref(), params.party(), ad_id, req).await?;
    Ok(Json(ad))
}

/// DELETE /api/v1/ads/:id
pub async fn handle_delete_ad(
    State(state): State<AppState>,
    Path(ad_id): Path<Uuid>,
    Query(params): Query<PartyQuery>,
) -> Result<Json<DeletedResponse>, AppError> {
    let report = cascade::delete_ad(state.store.as_ref(), params.party(), ad_id).await?;
    Ok(Json(DeletedResponse {
        deleted: true,
        cascade: report,
    }))
}

/// POST /api/v1/ads/:id/skills
pub async fn handle_add_ad_skill(
    State(state): State<AppState>,
    Path(ad_id): Path<Uuid>,
    Query(params): Query<PartyQuery>,
    Json(req): Json<AdSkillRequest>,
) -> Result<Json<AdSkillRow>, AppError> {
    let row = ads::add_skill_to_ad(
        state.store.as_ref(),
        params.party(),
        ad_id,
        &req.skill,
        req.level,
    )
    .await?;
    Ok(Json(row))
}

/// DELETE /api/v1/ads/:id/skills
pub async fn handle_remove_ad_skill(
    State(state): State<AppState>,
    Path(ad_id): Path<Uuid>,
    Query(params): Query<PartyQuery>,
    Json(req): Json<AdSkillRequest>,
) -> Result<StatusCode, AppError> {
    ads::remove_skill_from_ad(state.store.as_ref(), params.party(), ad_id, &req.skill).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Skills
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/skills
pub async fn handle_create_skill(
    State(state): State<AppState>,
    Json(req): Json<SkillRequest>,
) -> Result<(StatusCode, Json<SkillRow>), AppError> {
    let skill = skills::create_skill(state.store.as_ref(), &req.name).await?;
    Ok((StatusCode::CREATED, Json(skill)))
}

/// GET /api/v1/skills
pub async fn handle_list_skills(
    State(state): State<AppState>,
) -> Result<Json<Vec<SkillRow>>, AppError> {
    Ok(Json(skills::list_skills(state.store.as_ref()).await?))
}

/// PATCH /api/v1/skills
pub async fn handle_rename_skill(
    State(state): State<AppState>,
    Json(req): Json<RenameSkillRequest>,
) -> Result<Json<SkillRow>, AppError> {
    let skill = skills::rename_skill(state.store.as_ref(), &req.name, &req.new_name).await?;
    Ok(Json(skill))
}

/// DELETE /api/v1/skills
pub async fn handle_delete_skill(
    State(state): State<AppState>,
    Json(req): Json<SkillRequest>,
) -> Result<StatusCode, AppError> {
    skills::delete_skill(state.store.as_ref(), &req.name).await?;
    Ok(StatusCode::NO_CONTENT)
}
