use anyhow::Result;

use crate::deals::Deal;
use crate::query::AnalyticsSummary;

pub const DEAL_CSV_HEADERS: [&str; 15] = [
    "Brand",
    "Title",
    "Category",
    "Value Range",
    "Match Score",
    "Description",
    "Tags",
    "Deadline",
    "Requirements",
    "Engagement",
    "Reach",
    "Status",
    "Contact Name",
    "Contact Email",
    "Created At",
];

/// One row per deal, in the order given. Tags and requirements are joined
/// with `"; "`.
pub fn deals_to_csv(deals: &[Deal]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(DEAL_CSV_HEADERS)?;
    for deal in deals {
        let contact = deal.contact.as_ref();
        writer.write_record([
            deal.brand.clone(),
            deal.title.clone(),
            deal.category.clone(),
            deal.value_range.clone(),
            deal.match_score.to_string(),
            deal.description.clone(),
            deal.tags.join("; "),
            deal.deadline.clone().unwrap_or_default(),
            deal.requirements.join("; "),
            deal.engagement.map(|e| e.to_string()).unwrap_or_default(),
            deal.reach.clone().unwrap_or_default(),
            deal.status.to_string(),
            contact.and_then(|c| c.name.clone()).unwrap_or_default(),
            contact.and_then(|c| c.email.clone()).unwrap_or_default(),
            deal.created_at.to_rfc3339(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn analytics_to_csv(summary: &AnalyticsSummary) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["metric", "value"])?;
    writer.write_record(["total_deals".to_string(), summary.total_deals.to_string()])?;
    writer.write_record([
        "avg_match_score".to_string(),
        format!("{:.2}", summary.avg_match_score),
    ])?;
    writer.write_record(["total_value".to_string(), summary.total_value.to_string()])?;
    writer.write_record([
        "high_value_deals".to_string(),
        summary.high_value_deals.to_string(),
    ])?;
    for (category, count) in &summary.category_distribution {
        writer.write_record([format!("category:{category}"), count.to_string()])?;
    }
    for bucket in &summary.score_distribution {
        writer.write_record([format!("score:{}", bucket.range), bucket.count.to_string()])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}
