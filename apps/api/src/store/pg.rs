//! PostgreSQL backend. One `sqlx` transaction per `StoreTx`.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::catalog::ads::AdQuery;
use crate::errors::AppError;
use crate::matching::candidates::CandidateQuery;
use crate::models::ad::{AdRow, AdSkillRow, AdStatus, NewAd, SkillLevel};
use crate::models::job_match::{JobMatchRow, MatchKey, NewJobMatch};
use crate::models::profile::{
    CompanyRow, InfoRow, Party, PartyKind, ProfessionalRow, ProfessionalStatus, Profile,
};
use crate::models::skill::SkillRow;
use crate::store::{Store, StoreTx};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }
}

pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

/// Turns a unique-key violation into a 409, passing other errors through.
fn conflict_on_unique(err: sqlx::Error, message: impl Into<String>) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(message.into()),
        _ => AppError::Database(err),
    }
}

/// `%keyword%` for ILIKE, with the pattern metacharacters escaped.
fn contains_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn profile_table(kind: PartyKind) -> &'static str {
    match kind {
        PartyKind::Professional => "professionals",
        PartyKind::Company => "companies",
    }
}

#[async_trait]
impl StoreTx for PgTx {
    async fn insert_professional(
        &mut self,
        first_name: &str,
        last_name: &str,
    ) -> Result<ProfessionalRow, AppError> {
        Ok(sqlx::query_as::<_, ProfessionalRow>(
            r#"
            INSERT INTO professionals (id, first_name, last_name)
            VALUES ($1, $2, $3)
            RETURNING id, first_name, last_name, info_id, status, is_deleted, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(first_name)
        .bind(last_name)
        .fetch_one(&mut *self.tx)
        .await?)
    }

    async fn set_professional_status(
        &mut self,
        id: Uuid,
        status: ProfessionalStatus,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE professionals SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_company(&mut self, name: &str) -> Result<CompanyRow, AppError> {
        Ok(sqlx::query_as::<_, CompanyRow>(
            r#"
            INSERT INTO companies (id, name)
            VALUES ($1, $2)
            RETURNING id, name, info_id, is_deleted, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&mut *self.tx)
        .await?)
    }

    async fn find_professional(&mut self, id: Uuid) -> Result<Option<ProfessionalRow>, AppError> {
        Ok(sqlx::query_as::<_, ProfessionalRow>(
            "SELECT id, first_name, last_name, info_id, status, is_deleted, created_at \
             FROM professionals WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?)
    }

    async fn find_company(&mut self, id: Uuid) -> Result<Option<CompanyRow>, AppError> {
        Ok(sqlx::query_as::<_, CompanyRow>(
            "SELECT id, name, info_id, is_deleted, created_at \
             FROM companies WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?)
    }

    async fn find_owner_of_info(&mut self, info_id: Uuid) -> Result<Option<Profile>, AppError> {
        let professional = sqlx::query_as::<_, ProfessionalRow>(
            "SELECT id, first_name, last_name, info_id, status, is_deleted, created_at \
             FROM professionals WHERE info_id = $1 AND is_deleted = FALSE LIMIT 1",
        )
        .bind(info_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        if let Some(p) = professional {
            return Ok(Some(Profile::Professional(p)));
        }

        let company = sqlx::query_as::<_, CompanyRow>(
            "SELECT id, name, info_id, is_deleted, created_at \
             FROM companies WHERE info_id = $1 AND is_deleted = FALSE LIMIT 1",
        )
        .bind(info_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(company.map(Profile::Company))
    }

    async fn soft_delete_profile(&mut self, party: Party) -> Result<(), AppError> {
        let sql = format!(
            "UPDATE {} SET is_deleted = TRUE WHERE id = $1",
            profile_table(party.kind())
        );
        sqlx::query(&sql)
            .bind(party.id())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_info(
        &mut self,
        description: &str,
        location: &str,
    ) -> Result<InfoRow, AppError> {
        Ok(sqlx::query_as::<_, InfoRow>(
            r#"
            INSERT INTO info (id, description, location)
            VALUES ($1, $2, $3)
            RETURNING id, description, location, main_ad_id, is_deleted, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(description)
        .bind(location)
        .fetch_one(&mut *self.tx)
        .await?)
    }

    async fn find_info(&mut self, id: Uuid) -> Result<Option<InfoRow>, AppError> {
        Ok(sqlx::query_as::<_, InfoRow>(
            "SELECT id, description, location, main_ad_id, is_deleted, created_at \
             FROM info WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?)
    }

    async fn update_info(
        &mut self,
        id: Uuid,
        description: &str,
        location: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE info SET description = $2, location = $3, is_deleted = FALSE WHERE id = $1")
            .bind(id)
            .bind(description)
            .bind(location)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn link_info(&mut self, party: Party, info_id: Uuid) -> Result<(), AppError> {
        let sql = format!(
            "UPDATE {} SET info_id = $2 WHERE id = $1",
            profile_table(party.kind())
        );
        sqlx::query(&sql)
            .bind(party.id())
            .bind(info_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn set_main_ad(&mut self, info_id: Uuid, ad_id: Option<Uuid>) -> Result<(), AppError> {
        sqlx::query("UPDATE info SET main_ad_id = $2 WHERE id = $1")
            .bind(info_id)
            .bind(ad_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn clear_main_ad_references(&mut self, ad_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE info SET main_ad_id = NULL WHERE main_ad_id = $1")
            .bind(ad_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_ad(&mut self, ad: &NewAd) -> Result<AdRow, AppError> {
        Ok(sqlx::query_as::<_, AdRow>(
            r#"
            INSERT INTO ads
                (id, info_id, description, location, status, min_salary, max_salary, is_resume)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, info_id, description, location, status, min_salary, max_salary,
                      is_resume, is_deleted, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(ad.info_id)
        .bind(&ad.description)
        .bind(&ad.location)
        .bind(ad.status.as_str())
        .bind(ad.min_salary)
        .bind(ad.max_salary)
        .bind(ad.is_resume)
        .fetch_one(&mut *self.tx)
        .await?)
    }

    async fn find_ad(&mut self, id: Uuid) -> Result<Option<AdRow>, AppError> {
        Ok(sqlx::query_as::<_, AdRow>(
            "SELECT * FROM ads WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?)
    }

    async fn update_ad(&mut self, ad: &AdRow) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE ads
            SET description = $2, location = $3, status = $4, min_salary = $5, max_salary = $6
            WHERE id = $1
            "#,
        )
        .bind(ad.id)
        .bind(&ad.description)
        .bind(&ad.location)
        .bind(&ad.status)
        .bind(ad.min_salary)
        .bind(ad.max_salary)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn list_ads_for_info(&mut self, info_id: Uuid) -> Result<Vec<AdRow>, AppError> {
        Ok(sqlx::query_as::<_, AdRow>(
            "SELECT * FROM ads WHERE info_id = $1 AND is_deleted = FALSE ORDER BY created_at, id",
        )
        .bind(info_id)
        .fetch_all(&mut *self.tx)
        .await?)
    }

    async fn find_candidates(&mut self, query: &CandidateQuery) -> Result<Vec<AdRow>, AppError> {
        Ok(sqlx::query_as::<_, AdRow>(
            r#"
            SELECT * FROM ads
            WHERE is_deleted = FALSE
              AND id <> $1
              AND status = $2
              AND location = $3
              AND is_resume = $4
              AND min_salary BETWEEN $5 AND $6
            ORDER BY created_at, id
            "#,
        )
        .bind(query.source_id)
        .bind(AdStatus::Active.as_str())
        .bind(&query.location)
        .bind(query.want_resume)
        .bind(query.band.min)
        .bind(query.band.max)
        .fetch_all(&mut *self.tx)
        .await?)
    }

    async fn list_ads(&mut self, query: &AdQuery) -> Result<Vec<AdRow>, AppError> {
        Ok(sqlx::query_as::<_, AdRow>(
            r#"
            SELECT * FROM ads
            WHERE is_deleted = FALSE
              AND is_resume = $1
              AND status = $2
              AND ($3::TEXT IS NULL OR description ILIKE $3 ESCAPE '\')
              AND ($4::TEXT IS NULL OR location = $4)
              AND ($5::INTEGER IS NULL OR min_salary >= $5)
              AND ($6::INTEGER IS NULL OR max_salary <= $6)
            ORDER BY created_at, id
            "#,
        )
        .bind(query.is_resume)
        .bind(query.status.as_str())
        .bind(query.keyword.as_deref().map(contains_pattern))
        .bind(query.location.as_deref())
        .bind(query.min_salary)
        .bind(query.max_salary)
        .fetch_all(&mut *self.tx)
        .await?)
    }

    async fn soft_delete_ad(&mut self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE ads SET is_deleted = TRUE WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_skill(&mut self, name: &str) -> Result<Option<SkillRow>, AppError> {
        Ok(sqlx::query_as::<_, SkillRow>(
            r#"
            INSERT INTO skills (id, name)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET is_deleted = FALSE
            WHERE skills.is_deleted = TRUE
            RETURNING id, name, is_deleted, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await?)
    }

    async fn find_skill_by_name(&mut self, name: &str) -> Result<Option<SkillRow>, AppError> {
        Ok(sqlx::query_as::<_, SkillRow>(
            "SELECT id, name, is_deleted, created_at FROM skills WHERE name = $1 AND is_deleted = FALSE",
        )
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await?)
    }

    async fn list_skills(&mut self) -> Result<Vec<SkillRow>, AppError> {
        Ok(sqlx::query_as::<_, SkillRow>(
            "SELECT id, name, is_deleted, created_at FROM skills WHERE is_deleted = FALSE ORDER BY name",
        )
        .fetch_all(&mut *self.tx)
        .await?)
    }

    async fn rename_skill(&mut self, id: Uuid, new_name: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE skills SET name = $2 WHERE id = $1")
            .bind(id)
            .bind(new_name)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| conflict_on_unique(e, format!("Skill '{new_name}' already exists")))?;
        Ok(())
    }

    async fn soft_delete_skill(&mut self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE skills SET is_deleted = TRUE WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        sqlx::query("DELETE FROM ads_skills WHERE skill_id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn attach_skill(
        &mut self,
        ad_id: Uuid,
        skill_id: Uuid,
        level: SkillLevel,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO ads_skills (ad_id, skill_id, level)
            VALUES ($1, $2, $3)
            ON CONFLICT (ad_id, skill_id) DO UPDATE SET level = EXCLUDED.level
            "#,
        )
        .bind(ad_id)
        .bind(skill_id)
        .bind(level.as_str())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn detach_skill(&mut self, ad_id: Uuid, skill_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM ads_skills WHERE ad_id = $1 AND skill_id = $2")
            .bind(ad_id)
            .bind(skill_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ad_skills(&mut self, ad_id: Uuid) -> Result<Vec<AdSkillRow>, AppError> {
        Ok(sqlx::query_as::<_, AdSkillRow>(
            r#"
            SELECT a.ad_id, a.skill_id, s.name, a.level
            FROM ads_skills a
            JOIN skills s ON s.id = a.skill_id
            WHERE a.ad_id = $1 AND s.is_deleted = FALSE
            ORDER BY s.name
            "#,
        )
        .bind(ad_id)
        .fetch_all(&mut *self.tx)
        .await?)
    }

    async fn ad_skill_ids(&mut self, ad_id: Uuid) -> Result<HashSet<Uuid>, AppError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT a.skill_id
            FROM ads_skills a
            JOIN skills s ON s.id = a.skill_id
            WHERE a.ad_id = $1 AND s.is_deleted = FALSE
            "#,
        )
        .bind(ad_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(ids.into_iter().collect())
    }

    async fn insert_match(&mut self, new_match: &NewJobMatch) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO job_matches (ad_id, resume_id, professional_id, company_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (ad_id, resume_id) DO NOTHING
            "#,
        )
        .bind(new_match.ad_id)
        .bind(new_match.resume_id)
        .bind(new_match.professional_id)
        .bind(new_match.company_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn find_match(&mut self, key: MatchKey) -> Result<Option<JobMatchRow>, AppError> {
        Ok(sqlx::query_as::<_, JobMatchRow>(
            "SELECT * FROM job_matches WHERE ad_id = $1 AND resume_id = $2 AND is_deleted = FALSE",
        )
        .bind(key.ad_id)
        .bind(key.resume_id)
        .fetch_optional(&mut *self.tx)
        .await?)
    }

    async fn list_matches_for(&mut self, party: Party) -> Result<Vec<JobMatchRow>, AppError> {
        let sql = match party.kind() {
            PartyKind::Professional => {
                "SELECT * FROM job_matches WHERE professional_id = $1 AND is_deleted = FALSE \
                 ORDER BY created_at, ad_id, resume_id"
            }
            PartyKind::Company => {
                "SELECT * FROM job_matches WHERE company_id = $1 AND is_deleted = FALSE \
                 ORDER BY created_at, ad_id, resume_id"
            }
        };
        Ok(sqlx::query_as::<_, JobMatchRow>(sql)
            .bind(party.id())
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn approve_match(&mut self, key: MatchKey, side: PartyKind) -> Result<(), AppError> {
        let sql = match side {
            PartyKind::Professional => {
                "UPDATE job_matches SET professional_approved = TRUE \
                 WHERE ad_id = $1 AND resume_id = $2 AND is_deleted = FALSE"
            }
            PartyKind::Company => {
                "UPDATE job_matches SET company_approved = TRUE \
                 WHERE ad_id = $1 AND resume_id = $2 AND is_deleted = FALSE"
            }
        };
        sqlx::query(sql)
            .bind(key.ad_id)
            .bind(key.resume_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn soft_delete_matches_for_ad(
        &mut self,
        ad_id: Uuid,
        is_resume: bool,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE job_matches SET is_deleted = TRUE
            WHERE is_deleted = FALSE
              AND (ad_id = $1 OR ($2 AND resume_id = $1))
            "#,
        )
        .bind(ad_id)
        .bind(is_resume)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let PgTx { tx } = *self;
        tx.commit().await?;
        Ok(())
    }
}
