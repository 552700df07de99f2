//! Fish species service
//!
//! Global species are shared by every account; custom species belong to
//! the account that added them.

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{violated_constraint, AppError, AppResult};
use crate::models::FishSpecies;
use shared::validation::validate_name;

/// Species service
#[derive(Clone)]
pub struct SpeciesService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct SpeciesRow {
    id: Uuid,
    user_id: Option<Uuid>,
    name: String,
}

impl From<SpeciesRow> for FishSpecies {
    fn from(row: SpeciesRow) -> Self {
        FishSpecies {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
        }
    }
}

/// Input for adding a custom species
#[derive(Debug, Deserialize, Validate)]
pub struct AddSpeciesInput {
    #[validate(length(min = 1, message = "Species name cannot be empty"))]
    pub name: String,
}

const GLOBAL_NAME_INDEX: &str = "fish_species_global_name_idx";
const CUSTOM_NAME_INDEX: &str = "fish_species_user_name_idx";

impl SpeciesService {
    /// Create a new SpeciesService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Global species plus the user's own, ordered by name
    pub async fn list_species(&self, user_id: Uuid) -> AppResult<Vec<FishSpecies>> {
        let rows = sqlx::query_as::<_, SpeciesRow>(
            r#"
            SELECT id, user_id, name
            FROM fish_species
            WHERE user_id IS NULL OR user_id = $1
            ORDER BY LOWER(name) ASC, user_id NULLS FIRST
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(FishSpecies::from).collect())
    }

    /// Get a species visible to the user
    pub async fn get_species(&self, user_id: Uuid, species_id: Uuid) -> AppResult<FishSpecies> {
        sqlx::query_as::<_, SpeciesRow>(
            r#"
            SELECT id, user_id, name
            FROM fish_species
            WHERE id = $1 AND (user_id IS NULL OR user_id = $2)
            "#,
        )
        .bind(species_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .map(FishSpecies::from)
        .ok_or_else(|| AppError::NotFound("Fish species".to_string()))
    }

    /// Add a custom species owned by the user.
    ///
    /// Rejected when a global species or one of the user's own species
    /// already carries the same name (case-insensitive).
    pub async fn add_species(&self, user_id: Uuid, input: AddSpeciesInput) -> AppResult<FishSpecies> {
        input.validate()?;
        validate_name("name", &input.name)?;

        let name = input.name.trim();

        let existing = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM fish_species
            WHERE (user_id IS NULL OR user_id = $1) AND LOWER(name) = LOWER($2)
            "#,
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.db)
        .await?;

        if existing > 0 {
            return Err(duplicate_name());
        }

        let row = sqlx::query_as::<_, SpeciesRow>(
            r#"
            INSERT INTO fish_species (user_id, name)
            VALUES ($1, $2)
            RETURNING id, user_id, name
            "#,
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match violated_constraint(&e) {
            Some(GLOBAL_NAME_INDEX) | Some(CUSTOM_NAME_INDEX) => duplicate_name(),
            _ => AppError::from(e),
        })?;

        tracing::info!(species_id = %row.id, %user_id, "Custom species added");

        Ok(row.into())
    }
}

fn duplicate_name() -> AppError {
    AppError::conflict("name", "A species with this name already exists")
}
