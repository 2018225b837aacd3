use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::deals::{Deal, ValueParser};

/// Parsed value at or above which a deal counts as high value.
pub const HIGH_VALUE_THRESHOLD: u64 = 50_000;

pub const SCORE_BUCKET_LABELS: [&str; 4] = ["9-10", "7-8.9", "5-6.9", "0-4.9"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_deals: usize,
    pub avg_match_score: f64,
    pub total_value: u64,
    pub total_value_display: String,
    pub high_value_deals: usize,
    pub category_distribution: BTreeMap<String, usize>,
    pub score_distribution: Vec<ScoreBucketCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreBucketCount {
    pub range: String,
    pub count: usize,
}

/// Recomputed from scratch on every call; an empty slice yields zeros.
pub fn summarize(deals: &[Deal], parser: ValueParser) -> AnalyticsSummary {
    let total_deals = deals.len();
    let avg_match_score = if total_deals > 0 {
        deals.iter().map(|d| d.match_score).sum::<f64>() / total_deals as f64
    } else {
        0.0
    };

    let mut total_value = 0u64;
    let mut high_value_deals = 0usize;
    let mut category_distribution = BTreeMap::new();
    let mut bucket_counts = [0usize; 4];
    for deal in deals {
        let value = parser.parse(&deal.value_range);
        total_value = total_value.saturating_add(value);
        if value >= HIGH_VALUE_THRESHOLD {
            high_value_deals += 1;
        }
        *category_distribution
            .entry(deal.category.clone())
            .or_insert(0usize) += 1;
        bucket_counts[score_bucket_index(deal.match_score)] += 1;
    }

    let score_distribution = SCORE_BUCKET_LABELS
        .iter()
        .zip(bucket_counts)
        .map(|(label, count)| ScoreBucketCount {
            range: (*label).to_string(),
            count,
        })
        .collect();

    AnalyticsSummary {
        total_deals,
        avg_match_score,
        total_value,
        total_value_display: format_total_value(total_value),
        high_value_deals,
        category_distribution,
        score_distribution,
    }
}

/// Buckets are `[9,10]`, `[7,9)`, `[5,7)`, `[0,5)`; scores outside 0-10 fall
/// into the nearest end bucket so every deal is counted once.
fn score_bucket_index(score: f64) -> usize {
    if score >= 9.0 {
        0
    } else if score >= 7.0 {
        1
    } else if score >= 5.0 {
        2
    } else {
        3
    }
}

/// `"$X.XM"` from one million up, otherwise whole thousands (`"$0K"` for 0).
pub fn format_total_value(value: u64) -> String {
    let value = u128::from(value);
    if value >= 1_000_000 {
        let tenths = (value + 50_000) / 100_000;
        format!("${}.{}M", tenths / 10, tenths % 10)
    } else {
        format!("${}K", (value + 500) / 1_000)
    }
}

/// Like [`format_total_value`] but prints small amounts in plain dollars.
pub fn format_currency(value: u64) -> String {
    if value >= 1_000 {
        format_total_value(value)
    } else {
        format!("${value}")
    }
}

/// `1234567` -> `"1,234,567"`.
pub fn with_thousands_separators(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
