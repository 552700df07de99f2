//! Pond management service

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{violated_constraint, AppError, AppResult};
use crate::models::Pond;
use shared::validation::{validate_area_acres, validate_name};

/// Pond service for managing a user's ponds
#[derive(Clone)]
pub struct PondService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct PondRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    area_acres: Decimal,
}

impl From<PondRow> for Pond {
    fn from(row: PondRow) -> Self {
        Pond {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            area_acres: row.area_acres,
        }
    }
}

/// Input for creating a pond
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePondInput {
    #[validate(length(min = 1, message = "Pond name cannot be empty"))]
    pub name: String,
    pub area_acres: Decimal,
}

const POND_NAME_INDEX: &str = "ponds_user_lower_name_idx";

impl PondService {
    /// Create a new PondService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List the user's ponds ordered by name
    pub async fn list_ponds(&self, user_id: Uuid) -> AppResult<Vec<Pond>> {
        let rows = sqlx::query_as::<_, PondRow>(
            r#"
            SELECT id, user_id, name, area_acres
            FROM ponds
            WHERE user_id = $1
            ORDER BY LOWER(name) ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Pond::from).collect())
    }

    /// Get a pond owned by the user
    pub async fn get_pond(&self, user_id: Uuid, pond_id: Uuid) -> AppResult<Pond> {
        sqlx::query_as::<_, PondRow>(
            r#"
            SELECT id, user_id, name, area_acres
            FROM ponds
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(pond_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .map(Pond::from)
        .ok_or_else(|| AppError::NotFound("Pond".to_string()))
    }

    /// Create a new pond
    pub async fn create_pond(&self, user_id: Uuid, input: CreatePondInput) -> AppResult<Pond> {
        input.validate()?;
        validate_name("name", &input.name)?;
        validate_area_acres(input.area_acres)?;

        let name = input.name.trim();

        // Check for duplicate name
        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM ponds WHERE user_id = $1 AND LOWER(name) = LOWER($2)",
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.db)
        .await?;

        if existing > 0 {
            return Err(duplicate_name());
        }

        let row = sqlx::query_as::<_, PondRow>(
            r#"
            INSERT INTO ponds (user_id, name, area_acres)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, name, area_acres
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(input.area_acres)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match violated_constraint(&e) {
            Some(POND_NAME_INDEX) => duplicate_name(),
            _ => AppError::from(e),
        })?;

        tracing::info!(pond_id = %row.id, %user_id, "Pond created");

        Ok(row.into())
    }
}

fn duplicate_name() -> AppError {
    AppError::conflict("name", "A pond with this name already exists")
}
