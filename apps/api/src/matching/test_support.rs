//! Fixtures shared by the matching and catalog tests.

use uuid::Uuid;

use crate::catalog::ads::{add_skill_to_ad, create_ad, AdDraft};
use crate::catalog::profiles::{edit_info, register_company, register_professional, InfoUpdate};
use crate::catalog::skills::create_skill;
use crate::matching::similarity::Laxity;
use crate::models::ad::{AdRow, AdStatus, NewAd, SkillLevel};
use crate::models::job_match::{JobMatchRow, MatchKey};
use crate::models::profile::Party;
use crate::store::{MemoryStore, Store};

pub struct World {
    pub company: Party,
    pub professional: Party,
    pub job_ad: Uuid,
    pub resume: Uuid,
}

/// One company and one professional in Sofia, skills A to D.
///
/// Resume {A, B, C} asks 1000..2000, job ad {A, B, D} offers 1500..2500, so the
/// pair has a Jaccard index of exactly 0.5.
pub async fn sofia_world(store: &MemoryStore) -> World {
    let company = register_company(store, "Acme").await.unwrap();
    let company = Party::Company(company.id);
    let professional = register_professional(store, "Maria", "Ivanova").await.unwrap();
    let professional = Party::Professional(professional.id);

    for party in [company, professional] {
        edit_info(
            store,
            party,
            InfoUpdate {
                summary: None,
                location: Some("Sofia".to_string()),
            },
        )
        .await
        .unwrap();
    }
    for name in ["A", "B", "C", "D"] {
        create_skill(store, name).await.unwrap();
    }

    let resume = post_ad(store, professional, "Sofia", 1000, 2000, &["A", "B", "C"]).await;
    let job_ad = post_ad(store, company, "Sofia", 1500, 2500, &["A", "B", "D"]).await;

    World {
        company,
        professional,
        job_ad,
        resume,
    }
}

pub fn laxity(percent: f64) -> Laxity {
    Laxity::from_percent(percent).unwrap()
}

/// Posts an active ad with the given (existing) skills.
pub async fn post_ad(
    store: &MemoryStore,
    party: Party,
    location: &str,
    min_salary: i32,
    max_salary: i32,
    skills: &[&str],
) -> Uuid {
    let ad = create_ad(
        store,
        party,
        AdDraft {
            description: format!("{location} {min_salary}-{max_salary}"),
            location: location.to_string(),
            status: AdStatus::Active,
            min_salary,
            max_salary,
        },
    )
    .await
    .unwrap();
    for skill in skills {
        add_skill_to_ad(store, party, ad.id, skill, SkillLevel::default())
            .await
            .unwrap();
    }
    ad.id
}

/// A job ad whose info row does not exist.
pub async fn orphan_job_ad(store: &MemoryStore, location: &str, min_salary: i32, max_salary: i32) -> Uuid {
    let mut tx = store.begin().await.unwrap();
    let ad = tx
        .insert_ad(&NewAd {
            info_id: Uuid::new_v4(),
            description: "orphan".to_string(),
            location: location.to_string(),
            status: AdStatus::Active,
            min_salary,
            max_salary,
            is_resume: false,
        })
        .await
        .unwrap();
    tx.commit().await.unwrap();
    ad.id
}

pub async fn relocate_ad(store: &MemoryStore, ad_id: Uuid, location: &str) {
    let mut tx = store.begin().await.unwrap();
    let mut ad = tx.find_ad(ad_id).await.unwrap().unwrap();
    ad.location = location.to_string();
    tx.update_ad(&ad).await.unwrap();
    tx.commit().await.unwrap();
}

pub async fn company_party(store: &MemoryStore, name: &str) -> Party {
    let company = register_company(store, name).await.unwrap();
    Party::Company(company.id)
}

pub async fn find_ad(store: &MemoryStore, ad_id: Uuid) -> Option<AdRow> {
    let mut tx = store.begin().await.unwrap();
    tx.find_ad(ad_id).await.unwrap()
}

pub async fn load_ad(store: &MemoryStore, ad_id: Uuid) -> AdRow {
    find_ad(store, ad_id).await.unwrap()
}

pub async fn find_match(store: &MemoryStore, ad_id: Uuid, resume_id: Uuid) -> Option<JobMatchRow> {
    let mut tx = store.begin().await.unwrap();
    tx.find_match(MatchKey { ad_id, resume_id }).await.unwrap()
}

pub async fn count_matches(store: &MemoryStore, party: Party) -> usize {
    let mut tx = store.begin().await.unwrap();
    tx.list_matches_for(party).await.unwrap().len()
}

pub async fn skill_count(store: &MemoryStore) -> usize {
    let mut tx = store.begin().await.unwrap();
    tx.list_skills().await.unwrap().len()
}
