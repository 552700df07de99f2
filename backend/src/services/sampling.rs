//! Fish sampling service
//!
//! Records weight samplings and serves them with their derived growth
//! figures. Nothing derived is stored: every read recomputes growth from
//! the stock and its samplings.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::PaginationConfig;
use crate::error::{violated_constraint, AppError, AppResult};
use crate::models::{ensure_can_record, FishSampling, PondFishStock};
use crate::services::stock::{today, StockRow, STOCK_COLUMNS, STOCK_FROM};
use shared::aggregation::{
    aggregate_batches, aggregate_raw, parse_batch_sheet, RawWeight, SamplingAggregate,
};
use shared::error::FarmError;
use shared::growth::{sampling_growth, SamplingGrowth};
use shared::types::{DateRange, PaginatedResponse, Pagination, PaginationMeta};

/// Sampling service
#[derive(Clone)]
pub struct SamplingService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct SamplingRow {
    id: Uuid,
    user_id: Uuid,
    fish_stock_id: Uuid,
    sampled_on: NaiveDate,
    sample_fish_count: i32,
    sample_total_weight: Decimal,
}

impl From<SamplingRow> for FishSampling {
    fn from(row: SamplingRow) -> Self {
        FishSampling {
            id: row.id,
            user_id: row.user_id,
            fish_stock_id: row.fish_stock_id,
            sampled_on: row.sampled_on,
            sample_fish_count: row.sample_fish_count,
            sample_total_weight: row.sample_total_weight,
        }
    }
}

const SAMPLING_COLUMNS: &str =
    "fs.id, fs.user_id, fs.fish_stock_id, fs.sampled_on, fs.sample_fish_count, fs.sample_total_weight";

const STOCK_DATE_KEY: &str = "fish_samplings_stock_date_key";

/// Sampling with its derived growth bundle
#[derive(Debug, Serialize)]
pub struct SamplingView {
    #[serde(flatten)]
    pub sampling: FishSampling,
    #[serde(flatten)]
    pub growth: SamplingGrowth,
    pub stock_display_name: String,
}

/// Weighed batches, either equally sized or as a `count:weight` sheet
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BatchInput {
    Fixed {
        batch_size: i64,
        batch_weights: Vec<RawWeight>,
    },
    Sheet {
        fish_batches: String,
    },
}

impl BatchInput {
    /// Aggregate the batches without touching storage
    pub fn aggregate(&self) -> AppResult<SamplingAggregate> {
        let aggregate = match self {
            BatchInput::Fixed {
                batch_size,
                batch_weights,
            } => {
                let raw: Vec<String> = batch_weights.iter().map(RawWeight::as_text).collect();
                aggregate_raw(*batch_size, &raw)?
            }
            BatchInput::Sheet { fish_batches } => aggregate_batches(&parse_batch_sheet(fish_batches)?)?,
        };
        Ok(aggregate)
    }
}

/// Input for recording a sampling
#[derive(Debug, Deserialize)]
pub struct CreateSamplingInput {
    pub fish_stock_id: Uuid,
    pub sampled_on: NaiveDate,
    #[serde(flatten)]
    pub batches: BatchInput,
}

/// Filters and paging for listing samplings
#[derive(Debug, Default, Deserialize)]
pub struct SamplingFilter {
    pub fish_stock: Option<Uuid>,
    pub pond: Option<Uuid>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl SamplingService {
    /// Create a new SamplingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Aggregate batches for display before saving
    pub fn preview(input: &BatchInput) -> AppResult<SamplingAggregate> {
        input.aggregate()
    }

    /// Record a sampling against one of the user's ACTIVE stocks
    pub async fn create_sampling(
        &self,
        user_id: Uuid,
        input: CreateSamplingInput,
    ) -> AppResult<SamplingView> {
        let mut tx = self.db.begin().await?;

        // Lock the stock so it cannot be closed while the sampling is written
        let query = format!(
            "SELECT {STOCK_COLUMNS} {STOCK_FROM} WHERE s.id = $1 AND s.user_id = $2 FOR UPDATE OF s"
        );
        let (stock, pond_name, species_name) = sqlx::query_as::<_, StockRow>(&query)
            .bind(input.fish_stock_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Fish stock".to_string()))?
            .into_stock()?;

        let existing: Vec<FishSampling> = sqlx::query_as::<_, SamplingRow>(&format!(
            "SELECT {SAMPLING_COLUMNS} FROM fish_samplings fs WHERE fs.fish_stock_id = $1"
        ))
        .bind(stock.id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(FishSampling::from)
        .collect();

        let aggregate = ensure_can_record(&stock, &existing, input.sampled_on, today())
            .map_err(AppError::from)
            .and_then(|_| input.batches.aggregate())
            .map_err(|e| {
                tracing::warn!(stock_id = %stock.id, %user_id, "Sampling rejected: {}", e);
                e
            })?;

        let sampling = FishSampling::from_aggregate(
            Uuid::new_v4(),
            user_id,
            stock.id,
            input.sampled_on,
            &aggregate,
        )?;

        sqlx::query(
            r#"
            INSERT INTO fish_samplings
                (id, user_id, fish_stock_id, sampled_on, sample_fish_count, sample_total_weight)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(sampling.id)
        .bind(sampling.user_id)
        .bind(sampling.fish_stock_id)
        .bind(sampling.sampled_on)
        .bind(sampling.sample_fish_count)
        .bind(sampling.sample_total_weight)
        .execute(&mut *tx)
        .await
        .map_err(|e| match violated_constraint(&e) {
            Some(STOCK_DATE_KEY) => AppError::from(FarmError::DuplicateSamplingDate(input.sampled_on)),
            _ => AppError::from(e),
        })?;

        tx.commit().await?;

        tracing::info!(
            sampling_id = %sampling.id,
            stock_id = %stock.id,
            fish = sampling.sample_fish_count,
            average = %aggregate.average_weight,
            "Sampling recorded"
        );

        let mut all = existing;
        all.push(sampling.clone());
        let display = stock.display_name(&species_name, &pond_name);
        Ok(build_view(sampling, &stock, &all, display))
    }

    /// Get one of the user's samplings with its growth bundle
    pub async fn get_sampling(&self, user_id: Uuid, sampling_id: Uuid) -> AppResult<SamplingView> {
        let sampling: FishSampling = sqlx::query_as::<_, SamplingRow>(&format!(
            "SELECT {SAMPLING_COLUMNS} FROM fish_samplings fs WHERE fs.id = $1 AND fs.user_id = $2"
        ))
        .bind(sampling_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Fish sampling".to_string()))?
        .into();

        let mut views = self.attach_growth(user_id, vec![sampling]).await?;
        views
            .pop()
            .ok_or_else(|| AppError::Internal("Sampling stock missing".to_string()))
    }

    /// List the user's samplings newest first, filtered and paginated
    pub async fn list_samplings(
        &self,
        user_id: Uuid,
        filter: SamplingFilter,
        paging: &PaginationConfig,
    ) -> AppResult<PaginatedResponse<SamplingView>> {
        let range = DateRange {
            start: filter.from_date,
            end: filter.to_date,
        };
        if !range.is_ordered() {
            return Err(AppError::validation(
                "to_date",
                "End date cannot be before start date",
            ));
        }

        let pagination = Pagination::normalized(
            filter.page,
            filter.per_page,
            paging.default_per_page,
            paging.max_per_page,
        );

        let conditions = r#"
            FROM fish_samplings fs
            JOIN pond_fish_stocks s ON s.id = fs.fish_stock_id
            WHERE fs.user_id = $1
              AND ($2::uuid IS NULL OR fs.fish_stock_id = $2)
              AND ($3::uuid IS NULL OR s.pond_id = $3)
              AND ($4::date IS NULL OR fs.sampled_on >= $4)
              AND ($5::date IS NULL OR fs.sampled_on <= $5)
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) {conditions}"))
            .bind(user_id)
            .bind(filter.fish_stock)
            .bind(filter.pond)
            .bind(range.start)
            .bind(range.end)
            .fetch_one(&self.db)
            .await?;

        let samplings: Vec<FishSampling> = sqlx::query_as::<_, SamplingRow>(&format!(
            r#"
            SELECT {SAMPLING_COLUMNS}
            {conditions}
            ORDER BY fs.sampled_on DESC, fs.created_at DESC, fs.id
            LIMIT $6 OFFSET $7
            "#
        ))
        .bind(user_id)
        .bind(filter.fish_stock)
        .bind(filter.pond)
        .bind(range.start)
        .bind(range.end)
        .bind(i64::from(pagination.per_page))
        .bind(i64::try_from(pagination.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(FishSampling::from)
        .collect();

        let data = self.attach_growth(user_id, samplings).await?;

        Ok(PaginatedResponse {
            data,
            pagination: PaginationMeta::new(&pagination, u64::try_from(total).unwrap_or(0)),
        })
    }

    /// All samplings of the given stocks
    pub async fn samplings_of_stocks(
        &self,
        user_id: Uuid,
        stock_ids: &[Uuid],
    ) -> AppResult<Vec<FishSampling>> {
        let rows = sqlx::query_as::<_, SamplingRow>(&format!(
            r#"
            SELECT {SAMPLING_COLUMNS}
            FROM fish_samplings fs
            WHERE fs.user_id = $1 AND fs.fish_stock_id = ANY($2)
            ORDER BY fs.sampled_on ASC
            "#
        ))
        .bind(user_id)
        .bind(stock_ids)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(FishSampling::from).collect())
    }

    /// Compute growth bundles for a page of samplings, keeping their order
    async fn attach_growth(
        &self,
        user_id: Uuid,
        samplings: Vec<FishSampling>,
    ) -> AppResult<Vec<SamplingView>> {
        let mut stock_ids: Vec<Uuid> = samplings.iter().map(|s| s.fish_stock_id).collect();
        stock_ids.sort();
        stock_ids.dedup();

        if stock_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, StockRow>(&format!(
            "SELECT {STOCK_COLUMNS} {STOCK_FROM} WHERE s.user_id = $1 AND s.id = ANY($2)"
        ))
        .bind(user_id)
        .bind(stock_ids.as_slice())
        .fetch_all(&self.db)
        .await?;

        let mut stocks: HashMap<Uuid, (PondFishStock, String)> = HashMap::new();
        for row in rows {
            let (stock, pond_name, species_name) = row.into_stock()?;
            let display = stock.display_name(&species_name, &pond_name);
            stocks.insert(stock.id, (stock, display));
        }

        let mut history: HashMap<Uuid, Vec<FishSampling>> = HashMap::new();
        for s in self.samplings_of_stocks(user_id, &stock_ids).await? {
            history.entry(s.fish_stock_id).or_default().push(s);
        }

        samplings
            .into_iter()
            .map(|sampling| {
                let (stock, display) = stocks
                    .get(&sampling.fish_stock_id)
                    .ok_or_else(|| AppError::Internal("Sampling stock missing".to_string()))?;
                let prior = history
                    .get(&sampling.fish_stock_id)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                Ok(build_view(sampling, stock, prior, display.clone()))
            })
            .collect()
    }
}

fn build_view(
    sampling: FishSampling,
    stock: &PondFishStock,
    samplings: &[FishSampling],
    stock_display_name: String,
) -> SamplingView {
    let growth = sampling_growth(&sampling, stock, samplings);
    SamplingView {
        sampling,
        growth,
        stock_display_name,
    }
}
