//! Candidate pool for a source ad.
//!
//! Candidates are ads of the opposite kind that are live, Active, in the same
//! location, and whose `min_salary` falls inside the source's widened salary band.
//! Only the candidate's minimum is compared against the band.

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::similarity::Laxity;
use crate::models::ad::{AdRow, AdStatus};
use crate::store::StoreTx;

/// Inclusive salary band around a source ad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SalaryBand {
    pub min: i64,
    pub max: i64,
}

impl SalaryBand {
    /// `[floor(min - min*f), ceil(max + max*f)]` with `f = round(p/100, 2)`.
    pub fn widened(min_salary: i32, max_salary: i32, laxity: Laxity) -> Self {
        let f = laxity.fraction();
        let min = f64::from(min_salary);
        let max = f64::from(max_salary);
        Self {
            min: (min - min * f).floor() as i64,
            max: (max + max * f).ceil() as i64,
        }
    }

    pub fn contains(&self, salary: i32) -> bool {
        let salary = i64::from(salary);
        self.min <= salary && salary <= self.max
    }
}

/// Filter describing which ads qualify as counterparts of a source ad.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateQuery {
    pub source_id: Uuid,
    pub location: String,
    /// Kind of ad being searched for (opposite of the source).
    pub want_resume: bool,
    pub band: SalaryBand,
}

impl CandidateQuery {
    pub fn for_source(source: &AdRow, laxity: Laxity) -> Self {
        Self {
            source_id: source.id,
            location: source.location.clone(),
            want_resume: !source.is_resume,
            band: SalaryBand::widened(source.min_salary, source.max_salary, laxity),
        }
    }

    /// Row-level predicate. Backends that cannot push the filter down use this directly.
    pub fn accepts(&self, ad: &AdRow) -> bool {
        !ad.is_deleted
            && ad.id != self.source_id
            && ad.status() == Some(AdStatus::Active)
            && ad.location == self.location
            && ad.is_resume == self.want_resume
            && self.band.contains(ad.min_salary)
    }
}

/// Loads a live source ad and the info it belongs to.
pub async fn load_source_ad(tx: &mut dyn StoreTx, ad_id: Uuid) -> Result<(AdRow, Uuid), AppError> {
    let ad = tx
        .find_ad(ad_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Ad {ad_id} not found")))?;

    let info_id = ad
        .info_id
        .ok_or_else(|| AppError::Precondition("Please complete your info first".to_string()))?;

    match tx.find_info(info_id).await? {
        Some(_) => Ok((ad, info_id)),
        None => Err(AppError::Precondition(
            "Please complete your info first".to_string(),
        )),
    }
}

/// Returns every counterpart ad that passes the location, status and salary filters.
pub async fn find_candidates(
    tx: &mut dyn StoreTx,
    source: &AdRow,
    laxity: Laxity,
) -> Result<Vec<AdRow>, AppError> {
    let query = CandidateQuery::for_source(source, laxity);
    let candidates = tx.find_candidates(&query).await?;
    debug!(
        "Ad {} ({}): {} candidates in band [{}, {}]",
        source.id,
        source.location,
        candidates.len(),
        query.band.min,
        query.band.max
    );
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ad(is_resume: bool, location: &str, min: i32, max: i32) -> AdRow {
        AdRow {
            id: Uuid::new_v4(),
            info_id: Some(Uuid::new_v4()),
            description: "ad".to_string(),
            location: location.to_string(),
            status: AdStatus::Active.as_str().to_string(),
            min_salary: min,
            max_salary: max,
            is_resume,
            is_deleted: false,
            created_at: Utc::now(),
        }
    }

    fn laxity(p: f64) -> Laxity {
        Laxity::from_percent(p).unwrap()
    }

    #[test]
    fn test_zero_laxity_band_is_source_range() {
        let band = SalaryBand::widened(1500, 2500, laxity(0.0));
        assert_eq!(band, SalaryBand { min: 1500, max: 2500 });
    }

    #[test]
    fn test_band_shrinks_min_and_grows_max() {
        let band = SalaryBand::widened(1000, 2000, laxity(50.0));
        assert_eq!(band, SalaryBand { min: 500, max: 3000 });
    }

    #[test]
    fn test_band_rounds_outward() {
        // 999 * 0.1 = 99.9 → floor(899.1) = 899, ceil(1098.9) = 1099
        let band = SalaryBand::widened(999, 999, laxity(10.0));
        assert_eq!(band, SalaryBand { min: 899, max: 1099 });
    }

    #[test]
    fn test_query_accepts_opposite_kind_same_location() {
        let source = ad(false, "Sofia", 1500, 2500);
        let query = CandidateQuery::for_source(&source, laxity(50.0));
        assert!(query.accepts(&ad(true, "Sofia", 1000, 2000)));
        assert!(!query.accepts(&ad(false, "Sofia", 1000, 2000)));
        assert!(!query.accepts(&ad(true, "Plovdiv", 1000, 2000)));
        assert!(!query.accepts(&source));
    }

    #[test]
    fn test_query_rejects_inactive_and_deleted() {
        let source = ad(true, "Sofia", 1000, 2000);
        let query = CandidateQuery::for_source(&source, laxity(0.0));

        let mut archived = ad(false, "Sofia", 1500, 2000);
        archived.status = AdStatus::Archived.as_str().to_string();
        assert!(!query.accepts(&archived));

        let mut deleted = ad(false, "Sofia", 1500, 2000);
        deleted.is_deleted = true;
        assert!(!query.accepts(&deleted));
    }

    #[test]
    fn test_location_compare_is_exact() {
        let source = ad(true, "Sofia", 1000, 2000);
        let query = CandidateQuery::for_source(&source, laxity(0.0));
        assert!(!query.accepts(&ad(false, "sofia", 1000, 2000)));
    }

    // Current behavior: only the candidate's min_salary is checked against the band,
    // so a candidate whose range barely overlaps is still excluded, and one whose
    // max lies far outside the band is still accepted.
    #[test]
    fn test_only_candidate_min_salary_is_compared() {
        let source = ad(true, "Sofia", 1000, 2000);
        let query = CandidateQuery::for_source(&source, laxity(0.0));

        let overlapping_but_low_min = ad(false, "Sofia", 500, 1500);
        assert!(!query.accepts(&overlapping_but_low_min));

        let huge_max = ad(false, "Sofia", 1800, 90_000);
        assert!(query.accepts(&huge_max));
    }
}
