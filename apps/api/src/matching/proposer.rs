//! Match proposal: score every candidate of a source ad and persist the pairs
//! whose skill sets are similar enough.
//!
//! Flow: load source → verify ownership → candidate filter → Jaccard check →
//! idempotent insert → commit.

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::candidates::{find_candidates, load_source_ad};
use crate::matching::similarity::{calculate_similarity, Laxity};
use crate::models::ad::AdRow;
use crate::models::job_match::{MatchKey, NewJobMatch};
use crate::models::profile::{Party, Profile};
use crate::store::{Store, StoreTx};

pub const NEW_MATCHES_MESSAGE: &str = "You have new matches!";
pub const NO_MATCHES_MESSAGE: &str = "You have no matches!";

#[derive(Debug, Clone, Serialize)]
pub struct ProposalOutcome {
    /// At least one new match row was written.
    pub created: bool,
    pub new_matches: Vec<MatchKey>,
    /// Candidates that passed the skill check but were already paired.
    pub already_matched: usize,
    pub candidates_considered: usize,
}

impl ProposalOutcome {
    pub fn message(&self) -> &'static str {
        if self.created {
            NEW_MATCHES_MESSAGE
        } else {
            NO_MATCHES_MESSAGE
        }
    }
}

/// Proposes matches for `ad_id`, owned by `party`, at the given laxity.
///
/// Calling this twice with the same inputs leaves the match table unchanged the
/// second time: existing pairs are skipped, never duplicated or reset.
pub async fn propose_matches(
    store: &dyn Store,
    party: Party,
    ad_id: Uuid,
    laxity: Laxity,
) -> Result<ProposalOutcome, AppError> {
    let mut tx = store.begin().await?;

    let (source, info_id) = load_source_ad(tx.as_mut(), ad_id).await?;
    let owner = tx.find_owner_of_info(info_id).await?.ok_or_else(|| {
        AppError::Precondition("Please complete your info first".to_string())
    })?;
    if owner.party() != party {
        return Err(AppError::Forbidden(format!(
            "Ad {ad_id} does not belong to the requesting profile"
        )));
    }

    let source_skills = tx.ad_skill_ids(source.id).await?;
    let threshold = laxity.threshold();
    let candidates = find_candidates(tx.as_mut(), &source, laxity).await?;

    let mut outcome = ProposalOutcome {
        created: false,
        new_matches: Vec::new(),
        already_matched: 0,
        candidates_considered: candidates.len(),
    };

    for candidate in &candidates {
        let candidate_skills = tx.ad_skill_ids(candidate.id).await?;
        if !calculate_similarity(&source_skills, &candidate_skills, threshold) {
            continue;
        }

        let Some(new_match) = pair(tx.as_mut(), &source, &owner, candidate).await? else {
            continue;
        };

        if tx.insert_match(&new_match).await? {
            debug!(
                "New match: job ad {} ↔ resume {}",
                new_match.ad_id, new_match.resume_id
            );
            outcome.created = true;
            outcome.new_matches.push(new_match.key());
        } else {
            outcome.already_matched += 1;
        }
    }

    tx.commit().await?;

    info!(
        "Proposed matches for ad {ad_id} at laxity {}%: {} new, {} existing, {} candidates",
        laxity.percent(),
        outcome.new_matches.len(),
        outcome.already_matched,
        outcome.candidates_considered
    );
    Ok(outcome)
}

/// Builds the match row for `source` and `candidate`, orienting it so the job ad
/// and resume land in the right columns. `None` when the candidate has no live owner.
async fn pair(
    tx: &mut dyn StoreTx,
    source: &AdRow,
    source_owner: &Profile,
    candidate: &AdRow,
) -> Result<Option<NewJobMatch>, AppError> {
    let candidate_owner = match candidate.info_id {
        Some(info_id) => tx.find_owner_of_info(info_id).await?,
        None => None,
    };
    let Some(candidate_owner) = candidate_owner else {
        warn!("Skipping candidate ad {}: no live owner", candidate.id);
        return Ok(None);
    };

    let (job_ad, resume) = if source.is_resume {
        (candidate, source)
    } else {
        (source, candidate)
    };
    let (professional, company) = match (source_owner.party(), candidate_owner.party()) {
        (Party::Professional(p), Party::Company(c)) | (Party::Company(c), Party::Professional(p)) => {
            (p, c)
        }
        _ => {
            warn!(
                "Skipping candidate ad {}: owner kind does not match ad kind",
                candidate.id
            );
            return Ok(None);
        }
    };

    Ok(Some(NewJobMatch {
        ad_id: job_ad.id,
        resume_id: resume.id,
        professional_id: professional,
        company_id: company,
    }))
}
