pub mod analytics;
pub mod filter;
pub mod sort;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::deals::{Deal, DealStatus, ValueParser};

pub use analytics::{format_currency, summarize, AnalyticsSummary, ScoreBucketCount};
pub use filter::{filter_deals, DealPredicate};
pub use sort::sort_deals;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// User-chosen criteria and ordering for one query. Unset clauses (empty
/// search, `"all"` category, `"any"` bucket or status, no tags) impose no
/// restriction. The score window defaults to 0-10 and is always applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    #[serde(default)]
    pub search: String,
    #[serde(default, deserialize_with = "unset_or")]
    pub category: Option<String>,
    #[serde(default, alias = "valueRange", deserialize_with = "unset_or")]
    pub value_range_bucket: Option<ValueBucket>,
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    #[serde(default = "default_max_score")]
    pub max_score: f64,
    #[serde(default, deserialize_with = "unset_or")]
    pub status: Option<DealStatus>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub tag_match: TagMatch,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            search: String::new(),
            category: None,
            value_range_bucket: None,
            min_score: MIN_SCORE,
            max_score: MAX_SCORE,
            status: None,
            tags: Vec::new(),
            tag_match: TagMatch::Any,
            sort_by: SortBy::Score,
            sort_order: SortOrder::Desc,
        }
    }
}

fn default_min_score() -> f64 {
    MIN_SCORE
}

fn default_max_score() -> f64 {
    MAX_SCORE
}

/// Maps the UI sentinels (`""`, `"all"`, `"any"`, null) to `None`.
fn unset_or<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(value) if is_unset_sentinel(&value) => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

pub fn is_unset_sentinel(value: &str) -> bool {
    matches!(value.trim(), "" | "all" | "any")
}

/// Fixed numeric buckets for the parsed deal value. Each is open on the low
/// end and closed on the high end, so 100000 falls in `50000-100000`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ValueBucket {
    #[serde(rename = "0-25000")]
    UpTo25k,
    #[serde(rename = "25000-50000")]
    From25kTo50k,
    #[serde(rename = "50000-100000")]
    From50kTo100k,
    #[serde(rename = "100000+")]
    Over100k,
}

impl ValueBucket {
    pub const ALL: [ValueBucket; 4] = [
        ValueBucket::UpTo25k,
        ValueBucket::From25kTo50k,
        ValueBucket::From50kTo100k,
        ValueBucket::Over100k,
    ];

    pub fn contains(self, value: u64) -> bool {
        match self {
            Self::UpTo25k => value <= 25_000,
            Self::From25kTo50k => value > 25_000 && value <= 50_000,
            Self::From50kTo100k => value > 50_000 && value <= 100_000,
            Self::Over100k => value > 100_000,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpTo25k => "0-25000",
            Self::From25kTo50k => "25000-50000",
            Self::From50kTo100k => "50000-100000",
            Self::Over100k => "100000+",
        }
    }
}

impl Display for ValueBucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown value bucket: {0} (expected 0-25000, 25000-50000, 50000-100000 or 100000+)")]
pub struct BucketParseError(pub String);

impl FromStr for ValueBucket {
    type Err = BucketParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|bucket| bucket.as_str() == trimmed)
            .ok_or_else(|| BucketParseError(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TagMatch {
    /// At least one requested tag is present on the deal.
    #[default]
    Any,
    /// Every requested tag is present on the deal.
    All,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Score,
    Value,
    Brand,
    Deadline,
    Engagement,
}

impl Display for SortBy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Score => "score",
            Self::Value => "value",
            Self::Brand => "brand",
            Self::Deadline => "deadline",
            Self::Engagement => "engagement",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Error)]
#[error("unknown sort key: {0}")]
pub struct SortParseError(pub String);

impl FromStr for SortBy {
    type Err = SortParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "score" | "match_score" | "matchscore" => Ok(Self::Score),
            "value" | "value_range" => Ok(Self::Value),
            "brand" => Ok(Self::Brand),
            "deadline" => Ok(Self::Deadline),
            "engagement" => Ok(Self::Engagement),
            _ => Err(SortParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = SortParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            _ => Err(SortParseError(s.to_string())),
        }
    }
}

/// Engine-level settings that apply to a whole query rather than a single
/// clause.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryOptions {
    #[serde(default)]
    pub parser: ValueParser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub results: Vec<Deal>,
    pub analytics: AnalyticsSummary,
}

/// Filter, sort and summarize with the default (digit-strip) value parser.
pub fn query(deals: &[Deal], spec: &FilterSpec) -> QueryResult {
    query_with(deals, spec, QueryOptions::default())
}

/// Analytics are computed over the filtered results, not the input.
pub fn query_with(deals: &[Deal], spec: &FilterSpec, options: QueryOptions) -> QueryResult {
    let mut results = filter_deals(deals, spec, options.parser);
    sort_deals(&mut results, spec.sort_by, spec.sort_order, options.parser);
    let analytics = summarize(&results, options.parser);
    debug!(
        input = deals.len(),
        matched = results.len(),
        sort_by = %spec.sort_by,
        "deal query evaluated"
    );
    QueryResult { results, analytics }
}
