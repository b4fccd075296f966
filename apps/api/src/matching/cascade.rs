//! Deletion cascades. Nothing is removed: ads, matches and profiles are flagged
//! `is_deleted`, and `main_ad_id` back-references to deleted ads are cleared.
//! Skills and info rows are left alone.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::catalog::ads::load_owned_ad;
use crate::errors::AppError;
use crate::models::ad::AdRow;
use crate::models::profile::Party;
use crate::store::{require_profile, Store, StoreTx};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub ads_deleted: usize,
    pub matches_deleted: u64,
    pub main_ad_refs_cleared: u64,
}

/// Soft-deletes one ad owned by `party`, with its matches.
pub async fn delete_ad(store: &dyn Store, party: Party, ad_id: Uuid) -> Result<CascadeReport, AppError> {
    let mut tx = store.begin().await?;
    let ad = load_owned_ad(tx.as_mut(), party, ad_id).await?;

    let mut report = CascadeReport::default();
    cascade_ad(tx.as_mut(), &ad, &mut report).await?;
    tx.commit().await?;

    info!(
        "Deleted ad {ad_id}: {} matches retired, {} main-ad refs cleared",
        report.matches_deleted, report.main_ad_refs_cleared
    );
    Ok(report)
}

/// Soft-deletes a profile together with every ad its info owns.
pub async fn delete_profile(store: &dyn Store, party: Party) -> Result<CascadeReport, AppError> {
    let mut tx = store.begin().await?;
    let profile = require_profile(tx.as_mut(), party).await?;

    let mut report = CascadeReport::default();
    if let Some(info_id) = profile.info_id() {
        for ad in tx.list_ads_for_info(info_id).await? {
            cascade_ad(tx.as_mut(), &ad, &mut report).await?;
        }
    }
    tx.soft_delete_profile(party).await?;
    tx.commit().await?;

    info!(
        "Deleted {:?} {}: {} ads, {} matches retired",
        party.kind(),
        party.id(),
        report.ads_deleted,
        report.matches_deleted
    );
    Ok(report)
}

async fn cascade_ad(
    tx: &mut dyn StoreTx,
    ad: &AdRow,
    report: &mut CascadeReport,
) -> Result<(), AppError> {
    report.matches_deleted += tx.soft_delete_matches_for_ad(ad.id, ad.is_resume).await?;
    report.main_ad_refs_cleared += tx.clear_main_ad_references(ad.id).await?;
    tx.soft_delete_ad(ad.id).await?;
    report.ads_deleted += 1;
    Ok(())
}
