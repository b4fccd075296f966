//! In-process backend.
//!
//! A transaction holds the store lock for its whole lifetime and works on a copy
//! of the state; `commit` swaps the copy in. Transactions are therefore fully
//! serialized, which is enough for local runs and tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
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
use crate::store::{Store, StoreTx};

#[derive(Debug, Default, Clone)]
struct MemoryState {
    professionals: HashMap<Uuid, ProfessionalRow>,
    companies: HashMap<Uuid, CompanyRow>,
    infos: HashMap<Uuid, InfoRow>,
    ads: HashMap<Uuid, AdRow>,
    skills: HashMap<Uuid, SkillRow>,
    ad_skills: HashMap<(Uuid, Uuid), SkillLevel>,
    matches: BTreeMap<MatchKey, JobMatchRow>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTx { guard, work }))
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    work: MemoryState,
}

fn sorted_ads<'a>(ads: impl Iterator<Item = &'a AdRow>) -> Vec<AdRow> {
    let mut out: Vec<AdRow> = ads.cloned().collect();
    out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    out
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn insert_professional(
        &mut self,
        first_name: &str,
        last_name: &str,
    ) -> Result<ProfessionalRow, AppError> {
        let row = ProfessionalRow {
            id: Uuid::new_v4(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            info_id: None,
            status: ProfessionalStatus::default().as_str().to_string(),
            is_deleted: false,
            created_at: Utc::now(),
        };
        self.work.professionals.insert(row.id, row.clone());
        Ok(row)
    }

    async fn set_professional_status(
        &mut self,
        id: Uuid,
        status: ProfessionalStatus,
    ) -> Result<(), AppError> {
        if let Some(p) = self.work.professionals.get_mut(&id) {
            p.status = status.as_str().to_string();
        }
        Ok(())
    }

    async fn insert_company(&mut self, name: &str) -> Result<CompanyRow, AppError> {
        let row = CompanyRow {
            id: Uuid::new_v4(),
            name: name.to_string(),
            info_id: None,
            is_deleted: false,
            created_at: Utc::now(),
        };
        self.work.companies.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_professional(&mut self, id: Uuid) -> Result<Option<ProfessionalRow>, AppError> {
        Ok(self
            .work
            .professionals
            .get(&id)
            .filter(|p| !p.is_deleted)
            .cloned())
    }

    async fn find_company(&mut self, id: Uuid) -> Result<Option<CompanyRow>, AppError> {
        Ok(self
            .work
            .companies
            .get(&id)
            .filter(|c| !c.is_deleted)
            .cloned())
    }

    async fn find_owner_of_info(&mut self, info_id: Uuid) -> Result<Option<Profile>, AppError> {
        if let Some(p) = self
            .work
            .professionals
            .values()
            .find(|p| !p.is_deleted && p.info_id == Some(info_id))
        {
            return Ok(Some(Profile::Professional(p.clone())));
        }
        Ok(self
            .work
            .companies
            .values()
            .find(|c| !c.is_deleted && c.info_id == Some(info_id))
            .cloned()
            .map(Profile::Company))
    }

    async fn soft_delete_profile(&mut self, party: Party) -> Result<(), AppError> {
        match party {
            Party::Professional(id) => {
                if let Some(p) = self.work.professionals.get_mut(&id) {
                    p.is_deleted = true;
                }
            }
            Party::Company(id) => {
                if let Some(c) = self.work.companies.get_mut(&id) {
                    c.is_deleted = true;
                }
            }
        }
        Ok(())
    }

    async fn insert_info(
        &mut self,
        description: &str,
        location: &str,
    ) -> Result<InfoRow, AppError> {
        let row = InfoRow {
            id: Uuid::new_v4(),
            description: description.to_string(),
            location: location.to_string(),
            main_ad_id: None,
            is_deleted: false,
            created_at: Utc::now(),
        };
        self.work.infos.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_info(&mut self, id: Uuid) -> Result<Option<InfoRow>, AppError> {
        Ok(self.work.infos.get(&id).filter(|i| !i.is_deleted).cloned())
    }

    async fn update_info(
        &mut self,
        id: Uuid,
        description: &str,
        location: &str,
    ) -> Result<(), AppError> {
        if let Some(info) = self.work.infos.get_mut(&id) {
            info.description = description.to_string();
            info.location = location.to_string();
            info.is_deleted = false;
        }
        Ok(())
    }

    async fn link_info(&mut self, party: Party, info_id: Uuid) -> Result<(), AppError> {
        match party {
            Party::Professional(id) => {
                if let Some(p) = self.work.professionals.get_mut(&id) {
                    p.info_id = Some(info_id);
                }
            }
            Party::Company(id) => {
                if let Some(c) = self.work.companies.get_mut(&id) {
                    c.info_id = Some(info_id);
                }
            }
        }
        Ok(())
    }

    async fn set_main_ad(&mut self, info_id: Uuid, ad_id: Option<Uuid>) -> Result<(), AppError> {
        if let Some(info) = self.work.infos.get_mut(&info_id) {
            info.main_ad_id = ad_id;
        }
        Ok(())
    }

    async fn clear_main_ad_references(&mut self, ad_id: Uuid) -> Result<u64, AppError> {
        let mut cleared = 0;
        for info in self.work.infos.values_mut() {
            if info.main_ad_id == Some(ad_id) {
                info.main_ad_id = None;
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    async fn insert_ad(&mut self, ad: &NewAd) -> Result<AdRow, AppError> {
        let row = AdRow {
            id: Uuid::new_v4(),
            info_id: Some(ad.info_id),
            description: ad.description.clone(),
            location: ad.location.clone(),
            status: ad.status.as_str().to_string(),
            min_salary: ad.min_salary,
            max_salary: ad.max_salary,
            is_resume: ad.is_resume,
            is_deleted: false,
            created_at: Utc::now(),
        };
        self.work.ads.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_ad(&mut self, id: Uuid) -> Result<Option<AdRow>, AppError> {
        Ok(self.work.ads.get(&id).filter(|a| !a.is_deleted).cloned())
    }

    async fn update_ad(&mut self, ad: &AdRow) -> Result<(), AppError> {
        if let Some(existing) = self.work.ads.get_mut(&ad.id) {
            existing.description = ad.description.clone();
            existing.location = ad.location.clone();
            existing.status = ad.status.clone();
            existing.min_salary = ad.min_salary;
            existing.max_salary = ad.max_salary;
        }
        Ok(())
    }

    async fn list_ads_for_info(&mut self, info_id: Uuid) -> Result<Vec<AdRow>, AppError> {
        Ok(sorted_ads(
            self.work
                .ads
                .values()
                .filter(|a| !a.is_deleted && a.info_id == Some(info_id)),
        ))
    }

    async fn find_candidates(&mut self, query: &CandidateQuery) -> Result<Vec<AdRow>, AppError> {
        Ok(sorted_ads(
            self.work.ads.values().filter(|a| query.accepts(a)),
        ))
    }

    async fn list_ads(&mut self, query: &AdQuery) -> Result<Vec<AdRow>, AppError> {
        Ok(sorted_ads(
            self.work.ads.values().filter(|a| query.accepts(a)),
        ))
    }

    async fn soft_delete_ad(&mut self, id: Uuid) -> Result<(), AppError> {
        if let Some(ad) = self.work.ads.get_mut(&id) {
            ad.is_deleted = true;
        }
        Ok(())
    }

    async fn insert_skill(&mut self, name: &str) -> Result<Option<SkillRow>, AppError> {
        if let Some(existing) = self.work.skills.values_mut().find(|s| s.name == name) {
            if !existing.is_deleted {
                return Ok(None);
            }
            existing.is_deleted = false;
            return Ok(Some(existing.clone()));
        }
        let row = SkillRow {
            id: Uuid::new_v4(),
            name: name.to_string(),
            is_deleted: false,
            created_at: Utc::now(),
        };
        self.work.skills.insert(row.id, row.clone());
        Ok(Some(row))
    }

    async fn find_skill_by_name(&mut self, name: &str) -> Result<Option<SkillRow>, AppError> {
        Ok(self
            .work
            .skills
            .values()
            .find(|s| !s.is_deleted && s.name == name)
            .cloned())
    }

    async fn list_skills(&mut self) -> Result<Vec<SkillRow>, AppError> {
        let mut skills: Vec<SkillRow> = self
            .work
            .skills
            .values()
            .filter(|s| !s.is_deleted)
            .cloned()
            .collect();
        skills.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(skills)
    }

    async fn rename_skill(&mut self, id: Uuid, new_name: &str) -> Result<(), AppError> {
        // Mirrors the UNIQUE(name) constraint, which also covers soft-deleted rows.
        if self
            .work
            .skills
            .values()
            .any(|s| s.id != id && s.name == new_name)
        {
            return Err(AppError::Conflict(format!(
                "Skill '{new_name}' already exists"
            )));
        }
        if let Some(skill) = self.work.skills.get_mut(&id) {
            skill.name = new_name.to_string();
        }
        Ok(())
    }

    async fn soft_delete_skill(&mut self, id: Uuid) -> Result<(), AppError> {
        if let Some(skill) = self.work.skills.get_mut(&id) {
            skill.is_deleted = true;
        }
        self.work.ad_skills.retain(|(_, skill_id), _| *skill_id != id);
        Ok(())
    }

    async fn attach_skill(
        &mut self,
        ad_id: Uuid,
        skill_id: Uuid,
        level: SkillLevel,
    ) -> Result<(), AppError> {
        self.work.ad_skills.insert((ad_id, skill_id), level);
        Ok(())
    }

    async fn detach_skill(&mut self, ad_id: Uuid, skill_id: Uuid) -> Result<bool, AppError> {
        Ok(self.work.ad_skills.remove(&(ad_id, skill_id)).is_some())
    }

    async fn ad_skills(&mut self, ad_id: Uuid) -> Result<Vec<AdSkillRow>, AppError> {
        let mut rows: Vec<AdSkillRow> = self
            .work
            .ad_skills
            .iter()
            .filter(|((a, _), _)| *a == ad_id)
            .filter_map(|((a, s), level)| {
                let skill = self.work.skills.get(s).filter(|skill| !skill.is_deleted)?;
                Some(AdSkillRow {
                    ad_id: *a,
                    skill_id: *s,
                    name: skill.name.clone(),
                    level: level.as_str().to_string(),
                })
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn ad_skill_ids(&mut self, ad_id: Uuid) -> Result<HashSet<Uuid>, AppError> {
        Ok(self
            .work
            .ad_skills
            .keys()
            .filter(|(a, s)| {
                *a == ad_id
                    && self
                        .work
                        .skills
                        .get(s)
                        .is_some_and(|skill| !skill.is_deleted)
            })
            .map(|(_, s)| *s)
            .collect())
    }

    async fn insert_match(&mut self, new_match: &NewJobMatch) -> Result<bool, AppError> {
        let key = new_match.key();
        if self.work.matches.contains_key(&key) {
            return Ok(false);
        }
        self.work.matches.insert(
            key,
            JobMatchRow {
                ad_id: new_match.ad_id,
                resume_id: new_match.resume_id,
                professional_id: new_match.professional_id,
                company_id: new_match.company_id,
                company_approved: false,
                professional_approved: false,
                is_deleted: false,
                created_at: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn find_match(&mut self, key: MatchKey) -> Result<Option<JobMatchRow>, AppError> {
        Ok(self
            .work
            .matches
            .get(&key)
            .filter(|m| !m.is_deleted)
            .cloned())
    }

    async fn list_matches_for(&mut self, party: Party) -> Result<Vec<JobMatchRow>, AppError> {
        let mut rows: Vec<JobMatchRow> = self
            .work
            .matches
            .values()
            .filter(|m| !m.is_deleted)
            .filter(|m| match party {
                Party::Professional(id) => m.professional_id == id,
                Party::Company(id) => m.company_id == id,
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.key().cmp(&b.key())));
        Ok(rows)
    }

    async fn approve_match(&mut self, key: MatchKey, side: PartyKind) -> Result<(), AppError> {
        if let Some(m) = self.work.matches.get_mut(&key).filter(|m| !m.is_deleted) {
            match side {
                PartyKind::Professional => m.professional_approved = true,
                PartyKind::Company => m.company_approved = true,
            }
        }
        Ok(())
    }

    async fn soft_delete_matches_for_ad(
        &mut self,
        ad_id: Uuid,
        is_resume: bool,
    ) -> Result<u64, AppError> {
        let mut touched = 0;
        for m in self.work.matches.values_mut() {
            if !m.is_deleted && (m.ad_id == ad_id || (is_resume && m.resume_id == ad_id)) {
                m.is_deleted = true;
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MemoryTx { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ad::AdStatus;

    #[tokio::test]
    async fn test_uncommitted_writes_are_discarded() {
        let store = MemoryStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_company("Acme").await.unwrap();
            // dropped without commit
        }
        let mut tx = store.begin().await.unwrap();
        tx.insert_skill("rust").await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.list_skills().await.unwrap().len(), 1);
        assert!(store.state.try_lock().is_err(), "tx should hold the lock");
        drop(tx);
        assert!(store.state.lock().await.companies.is_empty());
    }

    #[tokio::test]
    async fn test_insert_skill_revives_deleted_name() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let skill = tx.insert_skill("rust").await.unwrap().unwrap();
        assert!(tx.insert_skill("rust").await.unwrap().is_none());

        tx.soft_delete_skill(skill.id).await.unwrap();
        let revived = tx.insert_skill("rust").await.unwrap().unwrap();
        assert_eq!(revived.id, skill.id);
        assert!(!revived.is_deleted);
    }

    #[tokio::test]
    async fn test_insert_match_is_keyed_by_pair() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let new_match = NewJobMatch {
            ad_id: Uuid::new_v4(),
            resume_id: Uuid::new_v4(),
            professional_id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
        };
        assert!(tx.insert_match(&new_match).await.unwrap());
        assert!(!tx.insert_match(&new_match).await.unwrap());

        // A soft-deleted row still occupies the pair.
        tx.soft_delete_matches_for_ad(new_match.ad_id, false)
            .await
            .unwrap();
        assert!(!tx.insert_match(&new_match).await.unwrap());
        assert!(tx.find_match(new_match.key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ad_skill_ids_skip_deleted_skills() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let info = tx.insert_info("summary", "Sofia").await.unwrap();
        let ad = tx
            .insert_ad(&NewAd {
                info_id: info.id,
                description: "backend".to_string(),
                location: "Sofia".to_string(),
                status: AdStatus::Active,
                min_salary: 1000,
                max_salary: 2000,
                is_resume: true,
            })
            .await
            .unwrap();
        let rust = tx.insert_skill("rust").await.unwrap().unwrap();
        let go = tx.insert_skill("go").await.unwrap().unwrap();
        tx.attach_skill(ad.id, rust.id, SkillLevel::Advanced).await.unwrap();
        tx.attach_skill(ad.id, go.id, SkillLevel::Beginner).await.unwrap();
        tx.soft_delete_skill(go.id).await.unwrap();

        let ids = tx.ad_skill_ids(ad.id).await.unwrap();
        assert_eq!(ids, HashSet::from([rust.id]));
        let skills = tx.ad_skills(ad.id).await.unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].level, "Advanced");
    }
}
