//! Query parameters and response bodies.
//!
//! Query structs keep every field optional so that defaults and range
//! checks live in one place; `validate` turns them into checked values or a
//! 422 [`ApiError`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiResult};
use crate::config::{
    DEFAULT_PAGE_SIZE, DEFAULT_TARGET_LIMIT, DEFAULT_TOP_N, DEFAULT_WINDOW_SIZE, MAX_PAGE_SIZE,
    MAX_TARGET_LIMIT, MAX_TOP_N, MAX_WINDOW_SIZE, MIN_WINDOW_SIZE,
};
use crate::parser::parse_locus;
use crate::store::{SortField, SortOrder, VariantFilter};
use crate::types::{EffectValue, NearestGene, Variant};

fn check_range(field: &str, value: i64, min: i64, max: i64) -> ApiResult<i64> {
    if value < min || value > max {
        return Err(ApiError::invalid(
            field,
            format!("{} must be between {} and {}", field, min, max),
        ));
    }
    Ok(value)
}

fn check_min(field: &str, value: i64, min: i64) -> ApiResult<i64> {
    if value < min {
        return Err(ApiError::invalid(field, format!("{} must be >= {}", field, min)));
    }
    Ok(value)
}

/// Number of pages needed for `total` rows; 0 for a non-positive page size.
pub fn total_pages(total: i64, page_size: i64) -> i64 {
    if page_size > 0 {
        (total + page_size - 1) / page_size
    } else {
        0
    }
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub page_size: i64,
}

impl Page {
    fn from_query(page: Option<i64>, page_size: Option<i64>) -> ApiResult<Self> {
        Ok(Page {
            page: check_min("page", page.unwrap_or(1), 1)?,
            page_size: check_range("page_size", page_size.unwrap_or(DEFAULT_PAGE_SIZE), 1, MAX_PAGE_SIZE)?,
        })
    }

    /// Rows to skip. Saturates so that a huge page lands past the last row.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

fn top_n(value: Option<i64>) -> ApiResult<i64> {
    check_range("top_n", value.unwrap_or(DEFAULT_TOP_N), 0, MAX_TOP_N)
}

/// `GET /snps` query.
#[derive(Debug, Default, Deserialize)]
pub struct ListSnpsQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub top_n: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListSnpsParams {
    pub page: Page,
    pub sort: SortField,
    pub order: SortOrder,
    pub top_n: i64,
}

impl ListSnpsQuery {
    pub fn validate(self) -> ApiResult<ListSnpsParams> {
        let order = match self.sort_order.as_deref() {
            None => SortOrder::Asc,
            Some(s) => s
                .parse()
                .map_err(|_| ApiError::invalid("sort_order", "sort_order must be 'asc' or 'desc'"))?,
        };
        Ok(ListSnpsParams {
            page: Page::from_query(self.page, self.page_size)?,
            // Unknown columns fall back to id
            sort: self
                .sort_by
                .as_deref()
                .map(SortField::parse_or_default)
                .unwrap_or_default(),
            order,
            top_n: top_n(self.top_n)?,
        })
    }
}

/// `GET /snps/search` query.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub top_n: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub filter: VariantFilter,
    pub page: Page,
    pub top_n: i64,
}

impl SearchQuery {
    pub fn validate(self) -> ApiResult<SearchParams> {
        let query = self.query.as_deref().map(str::trim).unwrap_or("");
        if query.is_empty() {
            return Err(ApiError::invalid("query", "query must not be empty"));
        }

        let filter = match parse_locus(query) {
            Some((chrom, pos)) => VariantFilter::Locus { chrom, pos },
            None => VariantFilter::RsId(query.to_string()),
        };

        Ok(SearchParams {
            filter,
            page: Page::from_query(self.page, self.page_size)?,
            top_n: top_n(self.top_n)?,
        })
    }
}

/// `GET /snps/{id}/region` query.
#[derive(Debug, Default, Deserialize)]
pub struct RegionQuery {
    pub window_size: Option<i64>,
}

impl RegionQuery {
    pub fn validate(self) -> ApiResult<i64> {
        check_range(
            "window_size",
            self.window_size.unwrap_or(DEFAULT_WINDOW_SIZE),
            MIN_WINDOW_SIZE,
            MAX_WINDOW_SIZE,
        )
    }
}

/// `GET /targets` query.
#[derive(Debug, Default, Deserialize)]
pub struct TargetsQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl TargetsQuery {
    /// Returns `(skip, limit)`.
    pub fn validate(self) -> ApiResult<(i64, i64)> {
        Ok((
            check_min("skip", self.skip.unwrap_or(0), 0)?,
            check_range("limit", self.limit.unwrap_or(DEFAULT_TARGET_LIMIT), 1, MAX_TARGET_LIMIT)?,
        ))
    }
}

/// A variant with a preview of its effect values.
#[derive(Debug, Clone, Serialize)]
pub struct SnpSummary {
    #[serde(flatten)]
    pub variant: Variant,
    pub top_effects: Vec<EffectValue>,
}

/// One page of variants.
#[derive(Debug, Clone, Serialize)]
pub struct SnpPage {
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub data: Vec<SnpSummary>,
}

impl SnpPage {
    pub fn new(total: i64, page: Page, data: Vec<SnpSummary>) -> Self {
        SnpPage {
            total,
            page: page.page,
            page_size: page.page_size,
            total_pages: total_pages(total, page.page_size),
            data,
        }
    }
}

/// A variant with all its effect values and the nearest gene.
#[derive(Debug, Clone, Serialize)]
pub struct SnpDetail {
    #[serde(flatten)]
    pub variant: Variant,
    pub top_effects: Vec<EffectValue>,
    pub effect_values: Vec<EffectValue>,
    pub nearest_gene: Option<NearestGene>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub total_snps: i64,
    pub total_targets: i64,
    pub total_effect_records: i64,
    pub data_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(40, 20), 2);
        assert_eq!(total_pages(41, 20), 3);
        assert_eq!(total_pages(41, 0), 0);
        assert_eq!(total_pages(41, -5), 0);
    }

    #[test]
    fn test_list_defaults() {
        let params = ListSnpsQuery::default().validate().unwrap();
        assert_eq!(params.page, Page { page: 1, page_size: 20 });
        assert_eq!(params.sort, SortField::Id);
        assert_eq!(params.order, SortOrder::Asc);
        assert_eq!(params.top_n, 10);
        assert_eq!(params.page.offset(), 0);
    }

    #[test]
    fn test_list_validation() {
        let query = |page, page_size, top_n| ListSnpsQuery {
            page: Some(page),
            page_size: Some(page_size),
            top_n: Some(top_n),
            ..Default::default()
        };
        assert!(query(0, 20, 10).validate().is_err());
        assert!(query(1, 0, 10).validate().is_err());
        assert!(query(1, 101, 10).validate().is_err());
        assert!(query(1, 20, 21).validate().is_err());
        assert_eq!(query(3, 100, 0).validate().unwrap().page.offset(), 200);
        assert_eq!(query(i64::MAX, 100, 0).validate().unwrap().page.offset(), i64::MAX);

        let bad_order = ListSnpsQuery {
            sort_order: Some("sideways".to_string()),
            ..Default::default()
        };
        assert!(bad_order.validate().is_err());

        let unknown_sort = ListSnpsQuery {
            sort_by: Some("password".to_string()),
            sort_order: Some("desc".to_string()),
            ..Default::default()
        };
        let params = unknown_sort.validate().unwrap();
        assert_eq!((params.sort, params.order), (SortField::Id, SortOrder::Desc));
    }

    #[test]
    fn test_search_filter_selection() {
        let search = |q: &str| SearchQuery {
            query: Some(q.to_string()),
            ..Default::default()
        };
        assert_eq!(
            search("chr1:15449431").validate().unwrap().filter,
            VariantFilter::Locus {
                chrom: "1".to_string(),
                pos: 15449431
            }
        );
        assert_eq!(
            search("rs123").validate().unwrap().filter,
            VariantFilter::RsId("rs123".to_string())
        );
        assert!(search("   ").validate().is_err());
        assert!(SearchQuery::default().validate().is_err());
    }

    #[test]
    fn test_region_and_targets_validation() {
        assert_eq!(RegionQuery::default().validate().unwrap(), 50_000);
        assert!(RegionQuery { window_size: Some(999) }.validate().is_err());
        assert!(RegionQuery { window_size: Some(1_000_001) }.validate().is_err());

        assert_eq!(TargetsQuery::default().validate().unwrap(), (0, 100));
        assert!(TargetsQuery { skip: Some(-1), limit: None }.validate().is_err());
        assert!(TargetsQuery { skip: None, limit: Some(501) }.validate().is_err());
    }
}
