use crate::error::FetchError;
use crate::model::RawImageRow;
use std::future::Future;
use std::ops::Range;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Folds a typed search string into the tag it filters on.
///
/// Returns `None` for blank input, meaning "no filter".
pub fn normalize_term(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// A single page request against the image table.
///
/// Rows are always ordered newest first by `created_at`; `tag`, when set,
/// restricts results to rows whose tag set contains it exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageQuery {
    pub tag: Option<String>,
    pub offset: usize,
    pub limit: usize,
}

impl ImageQuery {
    /// Query for the 1-based `page` of `limit` rows filtered by `term`.
    pub fn page(page: u32, limit: usize, term: &str) -> Self {
        let index = page.max(1) as usize - 1;
        Self {
            tag: normalize_term(term),
            offset: index * limit,
            limit,
        }
    }

    /// Half-open row range this query covers.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.limit
    }
}

/// The remote collection the gallery pages through.
pub trait ImageSource: Send + Sync + 'static {
    fn fetch(
        &self,
        query: ImageQuery,
    ) -> impl Future<Output = Result<Vec<RawImageRow>, FetchError>> + Send;
}

/// In-process table of rows, served with the same filter/order/range
/// semantics as the hosted query service.
#[derive(Debug, Clone, Default)]
pub struct CatalogSource {
    rows: Vec<RawImageRow>,
    latency: Duration,
}

impl CatalogSource {
    pub fn new(mut rows: Vec<RawImageRow>) -> Self {
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self {
            rows,
            latency: Duration::ZERO,
        }
    }

    /// Delay every response by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self, FetchError> {
        let rows: Vec<RawImageRow> = serde_json::from_str(s)?;
        Ok(Self::new(rows))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, FetchError> {
        let s = std::fs::read_to_string(path)?;
        Self::from_json_str(&s)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn select(&self, query: &ImageQuery) -> Vec<RawImageRow> {
        self.rows
            .iter()
            .filter(|row| query.tag.as_deref().is_none_or(|tag| row.has_tag(tag)))
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect()
    }
}

impl ImageSource for CatalogSource {
    async fn fetch(&self, query: ImageQuery) -> Result<Vec<RawImageRow>, FetchError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let rows = self.select(&query);
        debug!(
            tag = query.tag.as_deref(),
            offset = query.offset,
            limit = query.limit,
            returned = rows.len(),
            "catalog query served"
        );
        Ok(rows)
    }
}
