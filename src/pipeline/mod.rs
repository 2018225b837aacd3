use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::deals::{Deal, DealStatus, ValueParser};

pub const TOP_CATEGORY_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineAnalytics {
    pub total_deals: usize,
    pub total_value: u64,
    pub avg_deal_value: f64,
    pub conversion_rate: f64,
    pub stage_distribution: BTreeMap<DealStatus, usize>,
    pub top_categories: Vec<CategoryPerformance>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryPerformance {
    pub category: String,
    pub deals: usize,
    pub value: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub deal_id: String,
    pub from: DealStatus,
    pub to: DealStatus,
    pub changed_at: DateTime<Utc>,
}

pub fn pipeline_analytics(deals: &[Deal], parser: ValueParser) -> PipelineAnalytics {
    let total_deals = deals.len();
    let mut total_value = 0u64;
    let mut stage_distribution: BTreeMap<DealStatus, usize> =
        DealStatus::ALL.iter().map(|status| (*status, 0)).collect();
    let mut by_category: BTreeMap<&str, CategoryPerformance> = BTreeMap::new();

    for deal in deals {
        let value = parser.parse(&deal.value_range);
        total_value = total_value.saturating_add(value);
        *stage_distribution.entry(deal.status).or_insert(0) += 1;
        let entry = by_category
            .entry(deal.category.as_str())
            .or_insert_with(|| CategoryPerformance {
                category: deal.category.clone(),
                deals: 0,
                value: 0,
            });
        entry.deals += 1;
        entry.value = entry.value.saturating_add(value);
    }

    let closed = stage_distribution
        .get(&DealStatus::Closed)
        .copied()
        .unwrap_or(0);
    let (avg_deal_value, conversion_rate) = if total_deals > 0 {
        (
            total_value as f64 / total_deals as f64,
            closed as f64 / total_deals as f64 * 100.0,
        )
    } else {
        (0.0, 0.0)
    };

    let mut top_categories: Vec<CategoryPerformance> = by_category.into_values().collect();
    top_categories.sort_by(|a, b| b.value.cmp(&a.value));
    top_categories.truncate(TOP_CATEGORY_LIMIT);

    PipelineAnalytics {
        total_deals,
        total_value,
        avg_deal_value,
        conversion_rate,
        stage_distribution,
        top_categories,
    }
}

/// Returns a new collection with one deal moved to `status`; the input is
/// left untouched.
pub fn apply_status_update(
    deals: &[Deal],
    deal_id: &str,
    status: DealStatus,
    now: DateTime<Utc>,
) -> Result<(Vec<Deal>, StatusChange)> {
    let position = deals
        .iter()
        .position(|deal| deal.id == deal_id)
        .ok_or_else(|| anyhow!("deal not found: {deal_id}"))?;

    let mut updated = deals.to_vec();
    let deal = &mut updated[position];
    let change = StatusChange {
        deal_id: deal.id.clone(),
        from: deal.status,
        to: status,
        changed_at: now,
    };
    deal.status = status;
    deal.updated_at = now;
    Ok((updated, change))
}
