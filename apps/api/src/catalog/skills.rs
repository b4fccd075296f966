use tracing::info;

use crate::errors::AppError;
use crate::models::skill::SkillRow;
use crate::store::Store;

fn normalize_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("skill name cannot be empty".to_string()));
    }
    Ok(name.to_string())
}

/// Creates a skill. Names are unique among live skills; a deleted skill with the
/// same name is brought back instead of duplicated.
pub async fn create_skill(store: &dyn Store, name: &str) -> Result<SkillRow, AppError> {
    let name = normalize_name(name)?;
    let mut tx = store.begin().await?;
    let skill = tx
        .insert_skill(&name)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("Skill '{name}' already exists")))?;
    tx.commit().await?;

    info!("Skill '{}' available as {}", skill.name, skill.id);
    Ok(skill)
}

pub async fn list_skills(store: &dyn Store) -> Result<Vec<SkillRow>, AppError> {
    let mut tx = store.begin().await?;
    let skills = tx.list_skills().await?;
    tx.commit().await?;
    Ok(skills)
}

pub async fn rename_skill(
    store: &dyn Store,
    current_name: &str,
    new_name: &str,
) -> Result<SkillRow, AppError> {
    let new_name = normalize_name(new_name)?;
    let mut tx = store.begin().await?;
    let mut skill = tx
        .find_skill_by_name(current_name.trim())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Skill '{current_name}' not found")))?;

    if skill.name == new_name {
        return Ok(skill);
    }
    if tx.find_skill_by_name(&new_name).await?.is_some() {
        return Err(AppError::Conflict(format!("Skill '{new_name}' already exists")));
    }

    tx.rename_skill(skill.id, &new_name).await?;
    tx.commit().await?;

    skill.name = new_name;
    Ok(skill)
}

/// Soft-deletes a skill and detaches it from every ad.
pub async fn delete_skill(store: &dyn Store, name: &str) -> Result<(), AppError> {
    let mut tx = store.begin().await?;
    let skill = tx
        .find_skill_by_name(name.trim())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Skill '{name}' not found")))?;
    tx.soft_delete_skill(skill.id).await?;
    tx.commit().await?;
    Ok(())
}
