//! Match listing and two-sided approval.
//!
//! Each side approves independently; a match is mutually confirmed only once both
//! flags are set. Approval never changes ad status.

use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::job_match::{JobMatchRow, MatchDisplay, MatchKey};
use crate::models::profile::{Party, PartyKind};
use crate::store::{require_profile, Store, StoreTx};

/// All live matches where `party` is either side, shown from that side.
pub async fn list_matches_for(store: &dyn Store, party: Party) -> Result<Vec<MatchDisplay>, AppError> {
    let mut tx = store.begin().await?;
    require_profile(tx.as_mut(), party).await?;

    let rows = tx.list_matches_for(party).await?;
    let mut displays = Vec::with_capacity(rows.len());
    for row in &rows {
        if let Some(display) = display_for(tx.as_mut(), party, row).await? {
            displays.push(display);
        }
    }

    tx.commit().await?;
    Ok(displays)
}

/// Enriches a match with the counterpart's ad and name.
async fn display_for(
    tx: &mut dyn StoreTx,
    viewer: Party,
    row: &JobMatchRow,
) -> Result<Option<MatchDisplay>, AppError> {
    let (counterpart_ad_id, counterpart) = match viewer.kind() {
        PartyKind::Company => (row.resume_id, Party::Professional(row.professional_id)),
        PartyKind::Professional => (row.ad_id, Party::Company(row.company_id)),
    };

    let Some(ad) = tx.find_ad(counterpart_ad_id).await? else {
        warn!(
            "Match ({}, {}) points at missing ad {counterpart_ad_id}",
            row.ad_id, row.resume_id
        );
        return Ok(None);
    };
    let counterpart_name = tx
        .find_profile(counterpart)
        .await?
        .map(|p| p.display_name())
        .unwrap_or_default();

    Ok(Some(MatchDisplay {
        ad_id: row.ad_id,
        resume_id: row.resume_id,
        counterpart_name,
        counterpart_ad_id,
        description: ad.description,
        location: ad.location,
        status: ad.status,
        min_salary: ad.min_salary,
        max_salary: ad.max_salary,
        company_approved: row.company_approved,
        professional_approved: row.professional_approved,
        mutually_approved: row.is_mutual(),
    }))
}

/// Sets the approving side's flag on the match identified by `key`.
///
/// The match must be live and `party` must be one of its sides; otherwise 404.
/// Approving twice is a no-op.
pub async fn approve(store: &dyn Store, key: MatchKey, party: Party) -> Result<JobMatchRow, AppError> {
    let mut tx = store.begin().await?;
    require_profile(tx.as_mut(), party).await?;

    let row = tx
        .find_match(key)
        .await?
        .filter(|m| match party {
            Party::Company(id) => m.company_id == id,
            Party::Professional(id) => m.professional_id == id,
        })
        .ok_or_else(|| AppError::NotFound("Match not found".to_string()))?;

    tx.approve_match(row.key(), party.kind()).await?;
    let updated = tx
        .find_match(key)
        .await?
        .ok_or_else(|| AppError::NotFound("Match not found".to_string()))?;

    tx.commit().await?;

    info!(
        "Match ({}, {}) approved by {:?}; mutual: {}",
        key.ad_id,
        key.resume_id,
        party.kind(),
        updated.is_mutual()
    );
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::proposer::propose_matches;
    use crate::matching::test_support::*;
    use crate::models::ad::AdStatus;
    use crate::store::MemoryStore;
    use uuid::Uuid;

    async fn matched_world(store: &MemoryStore) -> (World, MatchKey) {
        let world = sofia_world(store).await;
        propose_matches(store, world.company, world.job_ad, laxity(50.0))
            .await
            .unwrap();
        let key = MatchKey {
            ad_id: world.job_ad,
            resume_id: world.resume,
        };
        (world, key)
    }

    #[tokio::test]
    async fn test_company_approval_flips_only_company_flag() {
        let store = MemoryStore::new();
        let (world, key) = matched_world(&store).await;

        let updated = approve(&store, key, world.company).await.unwrap();
        assert!(updated.company_approved);
        assert!(!updated.professional_approved);

        let fetched = find_match(&store, key.ad_id, key.resume_id).await.unwrap();
        assert!(fetched.company_approved);
        assert!(!fetched.professional_approved);
        assert!(!fetched.is_mutual());
    }

    #[tokio::test]
    async fn test_both_approvals_make_match_mutual() {
        let store = MemoryStore::new();
        let (world, key) = matched_world(&store).await;

        approve(&store, key, world.company).await.unwrap();
        let updated = approve(&store, key, world.professional).await.unwrap();
        assert!(updated.is_mutual());

        let job_ad = load_ad(&store, world.job_ad).await;
        assert_eq!(job_ad.status(), Some(AdStatus::Active));
    }

    #[tokio::test]
    async fn test_approving_missing_match_is_not_found() {
        let store = MemoryStore::new();
        let (world, _) = matched_world(&store).await;

        let err = approve(
            &store,
            MatchKey {
                ad_id: world.job_ad,
                resume_id: Uuid::new_v4(),
            },
            world.company,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_outsider_cannot_approve() {
        let store = MemoryStore::new();
        let (_, key) = matched_world(&store).await;
        let outsider = company_party(&store, "Globex").await;

        let err = approve(&store, key, outsider).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let row = find_match(&store, key.ad_id, key.resume_id).await.unwrap();
        assert!(!row.company_approved);
    }

    #[tokio::test]
    async fn test_listing_shows_counterpart_side() {
        let store = MemoryStore::new();
        let (world, _) = matched_world(&store).await;

        let for_company = list_matches_for(&store, world.company).await.unwrap();
        assert_eq!(for_company.len(), 1);
        assert_eq!(for_company[0].counterpart_ad_id, world.resume);
        assert_eq!(for_company[0].counterpart_name, "Maria Ivanova");
        assert_eq!(for_company[0].min_salary, 1000);

        let for_professional = list_matches_for(&store, world.professional).await.unwrap();
        assert_eq!(for_professional.len(), 1);
        assert_eq!(for_professional[0].counterpart_ad_id, world.job_ad);
        assert_eq!(for_professional[0].counterpart_name, "Acme");
        assert_eq!(for_professional[0].max_salary, 2500);
    }

    #[tokio::test]
    async fn test_listing_unknown_party_is_not_found() {
        let store = MemoryStore::new();
        let err = list_matches_for(&store, Party::Company(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
