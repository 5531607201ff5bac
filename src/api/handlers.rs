//! Axum request handlers.
//!
//! Parameters are validated before the database is touched. All queries
//! run through [`AppState::with_db`].

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use chrono::Utc;
use rusqlite::Connection;

use super::dto::*;
use super::error::{ApiError, ApiResult};
use super::state::AppState;
use crate::resolver::{extract_window, find_nearest_gene, RegionWindow};
use crate::store::{self, effects, targets, variants};
use crate::types::{Target, Variant};

/// Attach the effect values of the `top_n` most popular targets to each variant.
fn with_top_effects(conn: &Connection, rows: Vec<Variant>, top_n: i64) -> rusqlite::Result<Vec<SnpSummary>> {
    let popular = if top_n > 0 && !rows.is_empty() {
        effects::popular_targets(conn, top_n)?
    } else {
        Vec::new()
    };

    rows.into_iter()
        .map(|variant| {
            let top_effects = effects::for_targets(conn, variant.id, &popular)?;
            Ok(SnpSummary { variant, top_effects })
        })
        .collect()
}

fn load_variant(conn: &Connection, id: i64) -> ApiResult<Variant> {
    variants::find(conn, id)?.ok_or_else(|| ApiError::snp_not_found(id))
}

/// API name and version.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "SNP Effect Value Database API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Database round-trip; 503 when it fails.
pub async fn health(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    state
        .with_db(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map_err(ApiError::Unavailable)
        })
        .await?;

    Ok(Json(HealthResponse {
        status: "healthy",
        database: "connected",
        timestamp: Utc::now(),
    }))
}

/// Paginated, sorted variant list.
#[tracing::instrument(skip(state))]
pub async fn list_snps(
    State(state): State<AppState>,
    query: Result<Query<ListSnpsQuery>, QueryRejection>,
) -> ApiResult<Json<SnpPage>> {
    let Query(query) = query?;
    let params = query.validate()?;

    state
        .with_db(move |conn| {
            let total = variants::count(conn)?;
            let rows = variants::list(
                conn,
                params.sort,
                params.order,
                params.page.offset(),
                params.page.page_size,
            )?;
            let data = with_top_effects(conn, rows, params.top_n)?;
            Ok(SnpPage::new(total, params.page, data))
        })
        .await
        .map(Json)
}

/// Search by `chrom:pos` or rs-id fragment.
#[tracing::instrument(skip(state))]
pub async fn search_snps(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<Json<SnpPage>> {
    let Query(query) = query?;
    let params = query.validate()?;

    state
        .with_db(move |conn| {
            let total = variants::count_matching(conn, &params.filter)?;
            let rows = variants::search(
                conn,
                &params.filter,
                params.page.offset(),
                params.page.page_size,
            )?;
            let data = with_top_effects(conn, rows, params.top_n)?;
            Ok(SnpPage::new(total, params.page, data))
        })
        .await
        .map(Json)
}

/// One variant with its effect values and nearest gene.
#[tracing::instrument(skip(state))]
pub async fn get_snp(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<SnpDetail>> {
    let Path(id) = id?;

    state
        .with_db(move |conn| {
            let variant = load_variant(conn, id)?;
            let effect_values = effects::for_variant(conn, id)?;
            let nearest_gene = find_nearest_gene(conn, &variant.chrom, variant.pos)?;
            Ok(SnpDetail {
                variant,
                top_effects: Vec::new(),
                effect_values,
                nearest_gene,
            })
        })
        .await
        .map(Json)
}

/// Genes and variants around a variant, for the genome browser.
#[tracing::instrument(skip(state))]
pub async fn get_snp_region(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    query: Result<Query<RegionQuery>, QueryRejection>,
) -> ApiResult<Json<RegionWindow>> {
    let Path(id) = id?;
    let Query(query) = query?;
    let window_size = query.validate()?;

    state
        .with_db(move |conn| {
            let variant = load_variant(conn, id)?;
            Ok(extract_window(conn, &variant, window_size)?)
        })
        .await
        .map(Json)
}

#[tracing::instrument(skip(state))]
pub async fn list_targets(
    State(state): State<AppState>,
    query: Result<Query<TargetsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Target>>> {
    let Query(query) = query?;
    let (skip, limit) = query.validate()?;

    state
        .with_db(move |conn| Ok(targets::list(conn, skip, limit)?))
        .await
        .map(Json)
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let counts = state.with_db(|conn| Ok(store::counts(conn)?)).await?;

    Ok(Json(StatsResponse {
        total_snps: counts.variants,
        total_targets: counts.targets,
        total_effect_records: counts.effects,
        data_timestamp: Utc::now(),
    }))
}
