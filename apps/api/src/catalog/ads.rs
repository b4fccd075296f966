use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::ad::{AdRow, AdSkillRow, AdStatus, NewAd, SkillLevel};
use crate::models::profile::Party;
use crate::store::{require_profile, Store, StoreTx};

/// Request body for a new job ad or resume. The kind follows from the author.
#[derive(Debug, Clone, Deserialize)]
pub struct AdDraft {
    pub description: String,
    pub location: String,
    pub status: AdStatus,
    pub min_salary: i32,
    pub max_salary: i32,
}

/// Partial update; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdPatch {
    pub description: Option<String>,
    pub location: Option<String>,
    pub status: Option<AdStatus>,
    pub min_salary: Option<i32>,
    pub max_salary: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdDetail {
    pub ad: AdRow,
    pub skills: Vec<AdSkillRow>,
}

/// Search filters for browsing the other side's ads. All are optional; status
/// defaults to Active.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdSearch {
    /// Case-insensitive substring of the description.
    pub description: Option<String>,
    pub location: Option<String>,
    pub status: Option<AdStatus>,
    /// Lower bound on the ad's `min_salary`.
    pub min_salary: Option<i32>,
    /// Upper bound on the ad's `max_salary`.
    pub max_salary: Option<i32>,
}

/// Resolved search, ready for a store.
#[derive(Debug, Clone, PartialEq)]
pub struct AdQuery {
    pub is_resume: bool,
    pub keyword: Option<String>,
    pub location: Option<String>,
    pub status: AdStatus,
    pub min_salary: Option<i32>,
    pub max_salary: Option<i32>,
}

impl AdQuery {
    pub fn new(is_resume: bool, search: AdSearch) -> Self {
        let non_blank = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            is_resume,
            keyword: non_blank(search.description),
            location: non_blank(search.location),
            status: search.status.unwrap_or(AdStatus::Active),
            min_salary: search.min_salary,
            max_salary: search.max_salary,
        }
    }

    /// Row-level predicate, mirrored by the SQL in the Postgres store.
    pub fn accepts(&self, ad: &AdRow) -> bool {
        !ad.is_deleted
            && ad.is_resume == self.is_resume
            && ad.status == self.status.as_str()
            && self.keyword.as_ref().map_or(true, |kw| {
                ad.description.to_lowercase().contains(&kw.to_lowercase())
            })
            && self.location.as_ref().map_or(true, |l| ad.location == *l)
            && self.min_salary.map_or(true, |min| ad.min_salary >= min)
            && self.max_salary.map_or(true, |max| ad.max_salary <= max)
    }
}

fn validate_salary(min_salary: i32, max_salary: i32) -> Result<(), AppError> {
    if min_salary < 0 {
        return Err(AppError::Validation(
            "min_salary cannot be negative".to_string(),
        ));
    }
    if min_salary > max_salary {
        return Err(AppError::Validation(format!(
            "min_salary ({min_salary}) cannot exceed max_salary ({max_salary})"
        )));
    }
    Ok(())
}

fn validate_status(status: AdStatus, is_resume: bool) -> Result<(), AppError> {
    if !status.allowed_for(is_resume) {
        let kind = if is_resume { "resume" } else { "job ad" };
        return Err(AppError::Validation(format!(
            "status '{status}' is not valid for a {kind}"
        )));
    }
    Ok(())
}

/// Loads a live ad owned by `party`. Ads of other owners read as missing.
pub async fn load_owned_ad(
    tx: &mut dyn StoreTx,
    party: Party,
    ad_id: Uuid,
) -> Result<AdRow, AppError> {
    let profile = require_profile(tx, party).await?;
    let ad = tx
        .find_ad(ad_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Ad {ad_id} not found")))?;

    if profile.info_id().is_none() || ad.info_id != profile.info_id() {
        return Err(AppError::NotFound(format!("Ad {ad_id} not found")));
    }
    Ok(ad)
}

/// Creates a resume (professional author) or job ad (company author).
pub async fn create_ad(store: &dyn Store, party: Party, draft: AdDraft) -> Result<AdRow, AppError> {
    let is_resume = party.kind().authors_resumes();
    validate_status(draft.status, is_resume)?;
    validate_salary(draft.min_salary, draft.max_salary)?;
    let location = draft.location.trim().to_string();
    if location.is_empty() {
        return Err(AppError::Validation("location cannot be empty".to_string()));
    }

    let mut tx = store.begin().await?;
    let profile = require_profile(tx.as_mut(), party).await?;
    let info_id = profile
        .info_id()
        .ok_or_else(|| AppError::Precondition("Please complete your info first".to_string()))?;

    let ad = tx
        .insert_ad(&NewAd {
            info_id,
            description: draft.description,
            location,
            status: draft.status,
            min_salary: draft.min_salary,
            max_salary: draft.max_salary,
            is_resume,
        })
        .await?;
    tx.commit().await?;

    info!(
        "Created {} {} for {:?} {}",
        if is_resume { "resume" } else { "job ad" },
        ad.id,
        party.kind(),
        party.id()
    );
    Ok(ad)
}

/// Browses the counterpart kind: companies see resumes, professionals see job ads.
pub async fn search_ads(
    store: &dyn Store,
    party: Party,
    search: AdSearch,
) -> Result<Vec<AdRow>, AppError> {
    let query = AdQuery::new(!party.kind().authors_resumes(), search);
    if let (Some(min), Some(max)) = (query.min_salary, query.max_salary) {
        validate_salary(min, max)?;
    }
    validate_status(query.status, query.is_resume)?;

    let mut tx = store.begin().await?;
    require_profile(tx.as_mut(), party).await?;
    let ads = tx.list_ads(&query).await?;
    tx.commit().await?;

    debug!("Ad search by {:?} {}: {} hits", party.kind(), party.id(), ads.len());
    Ok(ads)
}

pub async fn get_ad(store: &dyn Store, ad_id: Uuid) -> Result<AdDetail, AppError> {
    let mut tx = store.begin().await?;
    let ad = tx
        .find_ad(ad_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Ad {ad_id} not found")))?;
    let skills = tx.ad_skills(ad_id).await?;
    tx.commit().await?;
    Ok(AdDetail { ad, skills })
}

pub async fn update_ad(
    store: &dyn Store,
    party: Party,
    ad_id: Uuid,
    patch: AdPatch,
) -> Result<AdRow, AppError> {
    let mut tx = store.begin().await?;
    let mut ad = load_owned_ad(tx.as_mut(), party, ad_id).await?;

    if let Some(description) = patch.description {
        ad.description = description;
    }
    if let Some(location) = patch.location {
        let location = location.trim().to_string();
        if location.is_empty() {
            return Err(AppError::Validation("location cannot be empty".to_string()));
        }
        ad.location = location;
    }
    if let Some(status) = patch.status {
        validate_status(status, ad.is_resume)?;
        ad.status = status.as_str().to_string();
    }
    ad.min_salary = patch.min_salary.unwrap_or(ad.min_salary);
    ad.max_salary = patch.max_salary.unwrap_or(ad.max_salary);
    validate_salary(ad.min_salary, ad.max_salary)?;

    tx.update_ad(&ad).await?;
    tx.commit().await?;
    Ok(ad)
}

pub async fn add_skill_to_ad(
    store: &dyn Store,
    party: Party,
    ad_id: Uuid,
    skill_name: &str,
    level: SkillLevel,
) -> Result<AdSkillRow, AppError> {
    let mut tx = store.begin().await?;
    let ad = load_owned_ad(tx.as_mut(), party, ad_id).await?;
    let skill = tx
        .find_skill_by_name(skill_name.trim())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Skill '{skill_name}' not found")))?;

    tx.attach_skill(ad.id, skill.id, level).await?;
    tx.commit().await?;

    Ok(AdSkillRow {
        ad_id: ad.id,
        skill_id: skill.id,
        name: skill.name,
        level: level.as_str().to_string(),
    })
}

pub async fn remove_skill_from_ad(
    store: &dyn Store,
    party: Party,
    ad_id: Uuid,
    skill_name: &str,
) -> Result<(), AppError> {
    let mut tx = store.begin().await?;
    let ad = load_owned_ad(tx.as_mut(), party, ad_id).await?;
    let skill = tx
        .find_skill_by_name(skill_name.trim())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Skill '{skill_name}' not found")))?;

    if !tx.detach_skill(ad.id, skill.id).await? {
        return Err(AppError::NotFound(format!(
            "Skill '{skill_name}' is not attached to ad {ad_id}"
        )));
    }
    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::profiles::register_professional;
    use crate::matching::test_support::*;
    use crate::store::MemoryStore;

    fn draft(status: AdStatus, min: i32, max: i32) -> AdDraft {
        AdDraft {
            description: "Rust backend".to_string(),
            location: "Sofia".to_string(),
            status,
            min_salary: min,
            max_salary: max,
        }
    }

    #[tokio::test]
    async fn test_kind_follows_author() {
        let store = MemoryStore::new();
        let world = sofia_world(&store).await;

        let resume = create_ad(&store, world.professional, draft(AdStatus::Hidden, 1, 2))
            .await
            .unwrap();
        let job = create_ad(&store, world.company, draft(AdStatus::Archived, 1, 2))
            .await
            .unwrap();
        assert!(resume.is_resume);
        assert!(!job.is_resume);
    }

    #[tokio::test]
    async fn test_status_must_suit_kind() {
        let store = MemoryStore::new();
        let world = sofia_world(&store).await;

        let err = create_ad(&store, world.company, draft(AdStatus::Private, 1, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_inverted_salary_range_is_rejected() {
        let store = MemoryStore::new();
        let world = sofia_world(&store).await;

        let err = create_ad(&store, world.company, draft(AdStatus::Active, 3000, 2000))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = update_ad(
            &store,
            world.company,
            world.job_ad,
            AdPatch {
                min_salary: Some(9000),
                ..AdPatch::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(get_ad(&store, world.job_ad).await.unwrap().ad.min_salary, 1500);
    }

    #[tokio::test]
    async fn test_author_without_info_must_complete_it() {
        let store = MemoryStore::new();
        let newcomer = register_professional(&store, "Petar", "Petrov").await.unwrap();

        let err = create_ad(
            &store,
            Party::Professional(newcomer.id),
            draft(AdStatus::Active, 1, 2),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Precondition(_)));
    }

    #[tokio::test]
    async fn test_patch_keeps_absent_fields() {
        let store = MemoryStore::new();
        let world = sofia_world(&store).await;

        let updated = update_ad(
            &store,
            world.professional,
            world.resume,
            AdPatch {
                status: Some(AdStatus::Private),
                ..AdPatch::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.status(), Some(AdStatus::Private));
        assert_eq!(updated.location, "Sofia");
        assert_eq!(updated.min_salary, 1000);
    }

    #[tokio::test]
    async fn test_skill_attach_and_detach() {
        let store = MemoryStore::new();
        let world = sofia_world(&store).await;

        let row = add_skill_to_ad(&store, world.company, world.job_ad, "C", SkillLevel::Master)
            .await
            .unwrap();
        assert_eq!(row.level, "Master");
        assert_eq!(get_ad(&store, world.job_ad).await.unwrap().skills.len(), 4);

        remove_skill_from_ad(&store, world.company, world.job_ad, "C")
            .await
            .unwrap();
        assert_eq!(get_ad(&store, world.job_ad).await.unwrap().skills.len(), 3);

        let err = remove_skill_from_ad(&store, world.company, world.job_ad, "C")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unknown_skill_cannot_be_attached() {
        let store = MemoryStore::new();
        let world = sofia_world(&store).await;

        let err = add_skill_to_ad(&store, world.company, world.job_ad, "COBOL", SkillLevel::Beginner)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    fn row(is_resume: bool, status: AdStatus, description: &str, min: i32, max: i32) -> AdRow {
        AdRow {
            id: Uuid::new_v4(),
            info_id: Some(Uuid::new_v4()),
            description: description.to_string(),
            location: "Sofia".to_string(),
            status: status.as_str().to_string(),
            min_salary: min,
            max_salary: max,
            is_resume,
            is_deleted: false,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_search_filters_each_field() {
        let query = AdQuery::new(
            false,
            AdSearch {
                description: Some(" RUST ".to_string()),
                location: Some("Sofia".to_string()),
                min_salary: Some(1000),
                max_salary: Some(3000),
                ..AdSearch::default()
            },
        );
        assert_eq!(query.keyword.as_deref(), Some("RUST"));
        assert_eq!(query.status, AdStatus::Active);

        let ad = row(false, AdStatus::Active, "Senior rust developer", 1000, 3000);
        assert!(query.accepts(&ad));

        assert!(!query.accepts(&AdRow { is_resume: true, ..ad.clone() }));
        assert!(!query.accepts(&AdRow { is_deleted: true, ..ad.clone() }));
        assert!(!query.accepts(&AdRow {
            status: AdStatus::Archived.as_str().to_string(),
            ..ad.clone()
        }));
        assert!(!query.accepts(&AdRow {
            description: "Go developer".to_string(),
            ..ad.clone()
        }));
        assert!(!query.accepts(&AdRow {
            location: "Plovdiv".to_string(),
            ..ad.clone()
        }));
        assert!(!query.accepts(&AdRow { min_salary: 999, ..ad.clone() }));
        assert!(!query.accepts(&AdRow { max_salary: 3001, ..ad }));
    }

    #[test]
    fn test_blank_search_fields_are_ignored() {
        let query = AdQuery::new(
            true,
            AdSearch {
                description: Some("  ".to_string()),
                location: Some(String::new()),
                status: Some(AdStatus::Hidden),
                ..AdSearch::default()
            },
        );
        assert_eq!(query.keyword, None);
        assert_eq!(query.location, None);
        assert!(query.accepts(&row(true, AdStatus::Hidden, "anything", 0, 1)));
    }

    #[tokio::test]
    async fn test_search_browses_the_other_side() {
        let store = MemoryStore::new();
        let world = sofia_world(&store).await;
        let plovdiv = post_ad(&store, world.company, "Plovdiv", 500, 900, &[]).await;

        let ids = |ads: Vec<AdRow>| ads.into_iter().map(|ad| ad.id).collect::<Vec<_>>();

        let all = search_ads(&store, world.professional, AdSearch::default())
            .await
            .unwrap();
        assert_eq!(ids(all), vec![world.job_ad, plovdiv]);

        let in_sofia = search_ads(
            &store,
            world.professional,
            AdSearch {
                location: Some("Sofia".to_string()),
                ..AdSearch::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(ids(in_sofia), vec![world.job_ad]);

        let resumes = search_ads(
            &store,
            world.company,
            AdSearch {
                description: Some("sofia 1000".to_string()),
                ..AdSearch::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(ids(resumes), vec![world.resume]);
    }

    #[tokio::test]
    async fn test_search_rejects_bad_filters() {
        let store = MemoryStore::new();
        let world = sofia_world(&store).await;

        let err = search_ads(
            &store,
            world.company,
            AdSearch {
                min_salary: Some(3000),
                max_salary: Some(1000),
                ..AdSearch::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = search_ads(
            &store,
            world.professional,
            AdSearch {
                status: Some(AdStatus::Private),
                ..AdSearch::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
