use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::ad::AdRow;
use crate::models::profile::{
    CompanyRow, InfoRow, Party, PartyKind, ProfessionalRow, ProfessionalStatus, Profile,
};
use crate::store::{require_profile, Store};

fn required(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(value.to_string())
}

pub async fn register_professional(
    store: &dyn Store,
    first_name: &str,
    last_name: &str,
) -> Result<ProfessionalRow, AppError> {
    let first_name = required("first_name", first_name)?;
    let last_name = required("last_name", last_name)?;

    let mut tx = store.begin().await?;
    let row = tx.insert_professional(&first_name, &last_name).await?;
    tx.commit().await?;

    info!("Registered professional {}", row.id);
    Ok(row)
}

pub async fn register_company(store: &dyn Store, name: &str) -> Result<CompanyRow, AppError> {
    let name = required("name", name)?;

    let mut tx = store.begin().await?;
    let row = tx.insert_company(&name).await?;
    tx.commit().await?;

    info!("Registered company {}", row.id);
    Ok(row)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InfoUpdate {
    pub summary: Option<String>,
    pub location: Option<String>,
}

/// Creates the party's info on first use, otherwise updates the given fields.
/// A location is required when the info does not exist yet.
pub async fn edit_info(store: &dyn Store, party: Party, update: InfoUpdate) -> Result<InfoRow, AppError> {
    let location = update
        .location
        .as_deref()
        .map(|l| required("location", l))
        .transpose()?;

    let mut tx = store.begin().await?;
    let profile = require_profile(tx.as_mut(), party).await?;

    let existing = match profile.info_id() {
        Some(info_id) => tx.find_info(info_id).await?,
        None => None,
    };

    let info_id = match existing {
        Some(info) => {
            let description = update.summary.unwrap_or(info.description);
            let location = location.unwrap_or(info.location);
            tx.update_info(info.id, &description, &location).await?;
            info.id
        }
        None => {
            let location = location.ok_or_else(|| {
                AppError::Validation("location is required to create profile info".to_string())
            })?;
            let info = tx
                .insert_info(update.summary.as_deref().unwrap_or_default(), &location)
                .await?;
            tx.link_info(party, info.id).await?;
            info.id
        }
    };

    let info = tx
        .find_info(info_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile info not found".to_string()))?;
    tx.commit().await?;
    Ok(info)
}

fn require_professional(party: Party, action: &str) -> Result<Uuid, AppError> {
    match party {
        Party::Professional(id) => Ok(id),
        Party::Company(_) => Err(AppError::Forbidden(format!(
            "Only professionals can {action}"
        ))),
    }
}

pub async fn change_status(
    store: &dyn Store,
    party: Party,
    status: ProfessionalStatus,
) -> Result<ProfessionalRow, AppError> {
    let id = require_professional(party, "change their status")?;

    let mut tx = store.begin().await?;
    require_profile(tx.as_mut(), party).await?;
    tx.set_professional_status(id, status).await?;
    let row = tx
        .find_professional(id)
        .await?
        .ok_or_else(|| AppError::NotFound("You are not logged as professional".to_string()))?;
    tx.commit().await?;

    info!("Professional {id} is now {}", status.as_str());
    Ok(row)
}

/// The professional's live resumes, oldest first. Empty until info exists.
pub async fn list_resumes(store: &dyn Store, party: Party) -> Result<Vec<AdRow>, AppError> {
    require_professional(party, "list resumes")?;

    let mut tx = store.begin().await?;
    let profile = require_profile(tx.as_mut(), party).await?;
    let resumes = match profile.info_id() {
        Some(info_id) => tx.list_ads_for_info(info_id).await?,
        None => Vec::new(),
    };
    tx.commit().await?;
    Ok(resumes)
}

/// Makes `resume_id` the professional's featured resume.
pub async fn set_main_resume(store: &dyn Store, party: Party, resume_id: Uuid) -> Result<InfoRow, AppError> {
    require_professional(party, "set a main resume")?;

    let mut tx = store.begin().await?;
    let profile = require_profile(tx.as_mut(), party).await?;
    let info_id = profile
        .info_id()
        .ok_or_else(|| AppError::Precondition("Please complete your info first".to_string()))?;

    let resume = tx
        .find_ad(resume_id)
        .await?
        .filter(|ad| ad.is_resume && ad.info_id == Some(info_id))
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))?;

    tx.set_main_ad(info_id, Some(resume.id)).await?;
    let info = tx
        .find_info(info_id)
        .await?
        .ok_or_else(|| AppError::Precondition("Please complete your info first".to_string()))?;
    tx.commit().await?;
    Ok(info)
}

/// Profile as shown to its owner.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub party: PartyKind,
    pub id: Uuid,
    pub name: String,
    pub summary: String,
    pub location: String,
    /// Professionals only.
    pub status: Option<ProfessionalStatus>,
    pub main_ad_id: Option<Uuid>,
    pub active_ads: usize,
}

pub async fn profile_view(store: &dyn Store, party: Party) -> Result<ProfileView, AppError> {
    let mut tx = store.begin().await?;
    let profile = require_profile(tx.as_mut(), party).await?;

    let info = match profile.info_id() {
        Some(info_id) => tx.find_info(info_id).await?,
        None => None,
    }
    .ok_or_else(|| AppError::NotFound("Please edit your personal information.".to_string()))?;
    let active_ads = tx
        .list_ads_for_info(info.id)
        .await?
        .iter()
        .filter(|ad| ad.is_active())
        .count();
    tx.commit().await?;

    let status = match &profile {
        Profile::Professional(p) => p.status(),
        Profile::Company(_) => None,
    };
    Ok(ProfileView {
        party: party.kind(),
        id: party.id(),
        name: profile.display_name(),
        summary: info.description,
        location: info.location,
        status,
        main_ad_id: info.main_ad_id,
        active_ads,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::test_support::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_first_edit_creates_info_and_requires_location() {
        let store = MemoryStore::new();
        let company = register_company(&store, "Acme").await.unwrap();
        let party = Party::Company(company.id);

        let err = edit_info(
            &store,
            party,
            InfoUpdate {
                summary: Some("We build things".to_string()),
                location: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let info = edit_info(
            &store,
            party,
            InfoUpdate {
                summary: None,
                location: Some(" Sofia ".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(info.location, "Sofia");
        assert_eq!(info.description, "");
    }

    #[tokio::test]
    async fn test_later_edit_keeps_unset_fields() {
        let store = MemoryStore::new();
        let world = sofia_world(&store).await;

        let info = edit_info(
            &store,
            world.professional,
            InfoUpdate {
                summary: Some("Backend engineer".to_string()),
                location: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(info.description, "Backend engineer");
        assert_eq!(info.location, "Sofia");
    }

    #[tokio::test]
    async fn test_main_resume_must_be_own_resume() {
        let store = MemoryStore::new();
        let world = sofia_world(&store).await;

        let err = set_main_resume(&store, world.professional, world.job_ad)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = set_main_resume(&store, world.company, world.resume)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let info = set_main_resume(&store, world.professional, world.resume)
            .await
            .unwrap();
        assert_eq!(info.main_ad_id, Some(world.resume));
    }

    #[tokio::test]
    async fn test_profile_view_counts_active_ads() {
        let store = MemoryStore::new();
        let world = sofia_world(&store).await;

        let view = profile_view(&store, world.company).await.unwrap();
        assert_eq!(view.name, "Acme");
        assert_eq!(view.active_ads, 1);
    }

    #[tokio::test]
    async fn test_blank_names_are_rejected() {
        let store = MemoryStore::new();
        assert!(register_professional(&store, " ", "Ivanova").await.is_err());
        assert!(register_company(&store, "").await.is_err());
    }

    #[tokio::test]
    async fn test_status_change_is_professional_only() {
        let store = MemoryStore::new();
        let world = sofia_world(&store).await;

        let row = change_status(&store, world.professional, ProfessionalStatus::Busy)
            .await
            .unwrap();
        assert_eq!(row.status(), Some(ProfessionalStatus::Busy));
        let view = profile_view(&store, world.professional).await.unwrap();
        assert_eq!(view.status, Some(ProfessionalStatus::Busy));

        let err = change_status(&store, world.company, ProfessionalStatus::Busy)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(profile_view(&store, world.company).await.unwrap().status, None);
    }

    #[tokio::test]
    async fn test_resume_listing_skips_deleted_and_needs_no_info() {
        let store = MemoryStore::new();
        let world = sofia_world(&store).await;
        let second = post_ad(&store, world.professional, "Sofia", 900, 1200, &["A"]).await;
        crate::matching::cascade::delete_ad(&store, world.professional, world.resume)
            .await
            .unwrap();

        let ids: Vec<Uuid> = list_resumes(&store, world.professional)
            .await
            .unwrap()
            .into_iter()
            .map(|ad| ad.id)
            .collect();
        assert_eq!(ids, vec![second]);

        let newcomer = register_professional(&store, "Petar", "Petrov").await.unwrap();
        let resumes = list_resumes(&store, Party::Professional(newcomer.id)).await.unwrap();
        assert!(resumes.is_empty());

        assert!(matches!(
            list_resumes(&store, world.company).await.unwrap_err(),
            AppError::Forbidden(_)
        ));
    }
}
