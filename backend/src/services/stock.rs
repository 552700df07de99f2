//! Pond fish stock service
//!
//! Opens and closes stocks and reports their growth since stocking. The
//! lifecycle rules live in `shared`; this service adds ownership scoping
//! and makes the rules race-free against concurrent requests.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::error::{violated_constraint, AppError, AppResult};
use crate::models::{NewStock, PondFishStock, StockStatus};
use crate::services::{PondService, SamplingService, SpeciesService};
use shared::error::FarmError;
use shared::growth::{cumulative_growth, CumulativeGrowth};
use shared::validation::validate_not_future;

/// Stock service
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// Stock row joined with its pond and species names
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct StockRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub pond_id: Uuid,
    pub species_id: Uuid,
    pub quantity: i32,
    pub initial_avg_weight: Option<Decimal>,
    pub stocked_on: NaiveDate,
    pub status: String,
    pub closed_on: Option<NaiveDate>,
    pub pond_name: String,
    pub species_name: String,
}

impl StockRow {
    pub(crate) fn into_stock(self) -> AppResult<(PondFishStock, String, String)> {
        let status = StockStatus::from_str(&self.status)
            .ok_or_else(|| AppError::Internal(format!("Unknown stock status: {}", self.status)))?;

        let stock = PondFishStock {
            id: self.id,
            user_id: self.user_id,
            pond_id: self.pond_id,
            species_id: self.species_id,
            quantity: self.quantity,
            initial_avg_weight: self.initial_avg_weight,
            stocked_on: self.stocked_on,
            status,
            closed_on: self.closed_on,
        };
        stock
            .check_invariants()
            .map_err(|e| AppError::Internal(format!("Corrupt stock {}: {}", stock.id, e)))?;

        Ok((stock, self.pond_name, self.species_name))
    }
}

pub(crate) const STOCK_COLUMNS: &str = r#"
    s.id, s.user_id, s.pond_id, s.species_id, s.quantity, s.initial_avg_weight,
    s.stocked_on, s.status, s.closed_on, p.name AS pond_name, f.name AS species_name
"#;

pub(crate) const STOCK_FROM: &str = r#"
    FROM pond_fish_stocks s
    JOIN ponds p ON p.id = s.pond_id
    JOIN fish_species f ON f.id = s.species_id
"#;

const ONE_ACTIVE_INDEX: &str = "pond_fish_stocks_one_active_idx";

/// Stock with the names it is displayed with
#[derive(Debug, Clone, Serialize)]
pub struct StockView {
    #[serde(flatten)]
    pub stock: PondFishStock,
    pub pond_name: String,
    pub species_name: String,
    pub display_name: String,
}

impl StockView {
    fn new(stock: PondFishStock, pond_name: String, species_name: String) -> Self {
        let display_name = stock.display_name(&species_name, &pond_name);
        Self {
            stock,
            pond_name,
            species_name,
            display_name,
        }
    }
}

/// Stock detail with growth since stocking
#[derive(Debug, Serialize)]
pub struct StockDetail {
    #[serde(flatten)]
    pub stock: StockView,
    pub cumulative_growth: CumulativeGrowth,
}

/// Input for opening a stock
#[derive(Debug, Deserialize, Validate)]
pub struct OpenStockInput {
    pub pond_id: Uuid,
    pub species_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be greater than zero"))]
    pub quantity: i32,
    pub initial_avg_weight: Option<Decimal>,
    pub stocked_on: NaiveDate,
}

/// Input for closing a stock
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CloseStockInput {
    /// Defaults to today
    pub closed_on: Option<NaiveDate>,
}

/// Filters for listing stocks
#[derive(Debug, Default, Deserialize)]
pub struct StockFilter {
    pub status: Option<String>,
    pub pond_id: Option<Uuid>,
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List the user's stocks, ACTIVE first then newest stocking first
    pub async fn list_stocks(&self, user_id: Uuid, filter: StockFilter) -> AppResult<Vec<StockView>> {
        let status = match filter.status.as_deref() {
            Some(raw) => Some(
                StockStatus::from_str(raw)
                    .ok_or_else(|| AppError::validation("status", "Status must be ACTIVE or CLOSED"))?,
            ),
            None => None,
        };

        let query = format!(
            r#"
            SELECT {STOCK_COLUMNS}
            {STOCK_FROM}
            WHERE s.user_id = $1
              AND ($2::text IS NULL OR s.status = $2)
              AND ($3::uuid IS NULL OR s.pond_id = $3)
            ORDER BY (s.status = 'active') DESC, s.stocked_on DESC, s.id
            "#
        );

        let rows = sqlx::query_as::<_, StockRow>(&query)
            .bind(user_id)
            .bind(status.map(|s| s.as_str()))
            .bind(filter.pond_id)
            .fetch_all(&self.db)
            .await?;

        rows.into_iter()
            .map(|row| {
                let (stock, pond_name, species_name) = row.into_stock()?;
                Ok(StockView::new(stock, pond_name, species_name))
            })
            .collect()
    }

    /// Load one of the user's stocks
    pub async fn find_stock(&self, user_id: Uuid, stock_id: Uuid) -> AppResult<StockView> {
        let query = format!("SELECT {STOCK_COLUMNS} {STOCK_FROM} WHERE s.id = $1 AND s.user_id = $2");

        let (stock, pond_name, species_name) = sqlx::query_as::<_, StockRow>(&query)
            .bind(stock_id)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Fish stock".to_string()))?
            .into_stock()?;

        Ok(StockView::new(stock, pond_name, species_name))
    }

    /// Stock detail including cumulative growth since stocking
    pub async fn get_stock(&self, user_id: Uuid, stock_id: Uuid) -> AppResult<StockDetail> {
        let view = self.find_stock(user_id, stock_id).await?;

        let samplings = SamplingService::new(self.db.clone())
            .samplings_of_stocks(user_id, &[view.stock.id])
            .await?;

        Ok(StockDetail {
            cumulative_growth: cumulative_growth(&view.stock, &samplings),
            stock: view,
        })
    }

    /// Open a new ACTIVE stock in one of the user's ponds
    pub async fn open_stock(&self, user_id: Uuid, input: OpenStockInput) -> AppResult<StockView> {
        input.validate()?;

        // Ownership: the pond must be the user's, the species global or the user's
        let pond = PondService::new(self.db.clone())
            .get_pond(user_id, input.pond_id)
            .await?;
        let species = SpeciesService::new(self.db.clone())
            .get_species(user_id, input.species_id)
            .await?;

        let mut tx = self.db.begin().await?;

        let existing = active_stocks(&mut tx, user_id, pond.id, species.id).await?;

        let stock = NewStock {
            pond_id: pond.id,
            species_id: species.id,
            quantity: input.quantity,
            initial_avg_weight: input.initial_avg_weight,
            stocked_on: input.stocked_on,
        }
        .open(Uuid::new_v4(), user_id, today(), &existing)
        .map_err(|e| {
            tracing::warn!(%user_id, pond_id = %pond.id, "Stock rejected: {}", e);
            AppError::from(e)
        })?;

        sqlx::query(
            r#"
            INSERT INTO pond_fish_stocks
                (id, user_id, pond_id, species_id, quantity, initial_avg_weight, stocked_on, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(stock.id)
        .bind(stock.user_id)
        .bind(stock.pond_id)
        .bind(stock.species_id)
        .bind(stock.quantity)
        .bind(stock.initial_avg_weight)
        .bind(stock.stocked_on)
        .bind(stock.status.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| match violated_constraint(&e) {
            // A concurrent request opened the same pair first
            Some(ONE_ACTIVE_INDEX) => AppError::from(FarmError::DuplicateActiveStock),
            _ => AppError::from(e),
        })?;

        tx.commit().await?;

        tracing::info!(stock_id = %stock.id, %user_id, pond = %pond.name, species = %species.name, "Stock opened");

        Ok(StockView::new(stock, pond.name, species.name))
    }

    /// Close one of the user's stocks; irreversible
    pub async fn close_stock(
        &self,
        user_id: Uuid,
        stock_id: Uuid,
        input: CloseStockInput,
    ) -> AppResult<StockView> {
        let today = today();
        let closed_on = input.closed_on.unwrap_or(today);
        validate_not_future("closed_on", closed_on, today)?;

        let view = self.find_stock(user_id, stock_id).await?;
        let closed = view.stock.close(closed_on).map_err(|e| {
            tracing::warn!(%stock_id, %user_id, "Close rejected: {}", e);
            AppError::from(e)
        })?;

        // Conditional on still being active so two concurrent closes cannot both win
        let updated = sqlx::query(
            r#"
            UPDATE pond_fish_stocks
            SET status = $3, closed_on = $4, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status = 'active'
            "#,
        )
        .bind(stock_id)
        .bind(user_id)
        .bind(closed.status.as_str())
        .bind(closed.closed_on)
        .execute(&self.db)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(FarmError::AlreadyClosed.into());
        }

        tracing::info!(%stock_id, %user_id, %closed_on, "Stock closed");

        Ok(StockView::new(closed, view.pond_name, view.species_name))
    }
}

/// ACTIVE stocks of one (pond, species) pair
async fn active_stocks(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    pond_id: Uuid,
    species_id: Uuid,
) -> AppResult<Vec<PondFishStock>> {
    let query = format!(
        r#"
        SELECT {STOCK_COLUMNS}
        {STOCK_FROM}
        WHERE s.user_id = $1 AND s.pond_id = $2 AND s.species_id = $3 AND s.status = 'active'
        "#
    );

    let rows = sqlx::query_as::<_, StockRow>(&query)
        .bind(user_id)
        .bind(pond_id)
        .bind(species_id)
        .fetch_all(&mut **tx)
        .await?;

    rows.into_iter()
        .map(|row| row.into_stock().map(|(stock, _, _)| stock))
        .collect()
}

/// Calendar date used for "not in the future" checks
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}
