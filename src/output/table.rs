use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::deals::{Deal, DealStatus};
use crate::outreach::{FollowUpTask, TaskPriority, TaskState};
use crate::pipeline::{PipelineAnalytics, StatusChange};
use crate::query::analytics::format_currency;
use crate::query::AnalyticsSummary;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn score_cell(score: f64) -> Cell {
    let cell = Cell::new(format!("{score:.1}"));
    if score >= 9.0 {
        cell.fg(Color::Green)
    } else if score >= 7.0 {
        cell.fg(Color::Yellow)
    } else {
        cell
    }
}

fn status_cell(status: DealStatus) -> Cell {
    let cell = Cell::new(status.to_string());
    match status {
        DealStatus::Closed => cell.fg(Color::Green),
        DealStatus::Rejected => cell.fg(Color::Red),
        DealStatus::Negotiating => cell.fg(Color::Yellow),
        DealStatus::New | DealStatus::Contacted => cell,
    }
}

pub fn render_deals_table(deals: &[Deal]) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "#", "Brand", "Title", "Category", "Value", "Score", "Status", "Deadline",
    ]);
    for (idx, deal) in deals.iter().enumerate() {
        table.add_row(Row::from(vec![
            Cell::new(idx + 1),
            Cell::new(&deal.brand),
            Cell::new(&deal.title),
            Cell::new(&deal.category),
            Cell::new(&deal.value_range),
            score_cell(deal.match_score),
            status_cell(deal.status),
            Cell::new(deal.deadline.as_deref().unwrap_or("-")),
        ]));
    }
    table.to_string()
}

pub fn render_analytics_table(summary: &AnalyticsSummary) -> String {
    let mut table = new_table();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Total deals".to_string(), summary.total_deals.to_string()]);
    table.add_row(vec![
        "Avg match score".to_string(),
        format!("{:.1}", summary.avg_match_score),
    ]);
    table.add_row(vec![
        "Total value".to_string(),
        summary.total_value_display.clone(),
    ]);
    table.add_row(vec![
        "High-value deals".to_string(),
        summary.high_value_deals.to_string(),
    ]);
    for (category, count) in &summary.category_distribution {
        table.add_row(vec![format!("Category: {category}"), count.to_string()]);
    }
    for bucket in &summary.score_distribution {
        table.add_row(vec![format!("Score {}", bucket.range), bucket.count.to_string()]);
    }
    table.to_string()
}

pub fn render_pipeline_table(pipeline: &PipelineAnalytics) -> String {
    let mut table = new_table();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec![
        "Total deals".to_string(),
        pipeline.total_deals.to_string(),
    ]);
    table.add_row(vec![
        "Pipeline value".to_string(),
        format_currency(pipeline.total_value),
    ]);
    table.add_row(vec![
        "Avg deal value".to_string(),
        format_currency(pipeline.avg_deal_value.round() as u64),
    ]);
    table.add_row(vec![
        "Conversion rate".to_string(),
        format!("{:.1}%", pipeline.conversion_rate),
    ]);
    let open: usize = pipeline
        .stage_distribution
        .iter()
        .filter(|(stage, _)| !stage.is_terminal())
        .map(|(_, count)| count)
        .sum();
    table.add_row(vec!["Open deals".to_string(), open.to_string()]);
    for (stage, count) in &pipeline.stage_distribution {
        table.add_row(Row::from(vec![
            status_cell(*stage),
            Cell::new(count.to_string()),
        ]));
    }
    for (rank, category) in pipeline.top_categories.iter().enumerate() {
        table.add_row(vec![
            format!("Top #{}: {}", rank + 1, category.category),
            format!(
                "{} ({} deals)",
                format_currency(category.value),
                category.deals
            ),
        ]);
    }
    table.to_string()
}

pub fn render_activity_table(changes: &[StatusChange]) -> String {
    let mut table = new_table();
    table.set_header(vec!["When", "Deal", "From", "To"]);
    for change in changes {
        table.add_row(Row::from(vec![
            Cell::new(change.changed_at.format("%Y-%m-%d %H:%M").to_string()),
            Cell::new(&change.deal_id),
            Cell::new(change.from.to_string()),
            status_cell(change.to),
        ]));
    }
    table.to_string()
}

pub fn render_follow_up_table(tasks: &[FollowUpTask]) -> String {
    let mut table = new_table();
    table.set_header(vec!["Due", "Deal", "Type", "Task", "Priority", "Status"]);
    for task in tasks {
        let priority = Cell::new(task.priority.as_str());
        let priority = match task.priority {
            TaskPriority::High => priority.fg(Color::Red),
            TaskPriority::Medium => priority.fg(Color::Yellow),
            TaskPriority::Low => priority,
        };
        let status = match task.status {
            TaskState::Overdue => Cell::new("overdue").fg(Color::Red),
            TaskState::Pending => Cell::new("pending"),
        };
        table.add_row(Row::from(vec![
            Cell::new(task.due_date.format("%Y-%m-%d").to_string()),
            Cell::new(&task.deal_id),
            Cell::new(task.kind.as_str()),
            Cell::new(&task.title),
            priority,
            status,
        ]));
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{
        render_analytics_table, render_deals_table, render_follow_up_table,
        render_pipeline_table,
    };
    use crate::deals::{Deal, DealStatus, ValueParser};
    use crate::outreach::follow_up_tasks;
    use crate::pipeline::pipeline_analytics;
    use crate::query::summarize;

    fn deals() -> Vec<Deal> {
        vec![
            Deal::new("a", "Nike", "Endorsement")
                .with_category("Sports")
                .with_score(9.2)
                .with_value_range("$50K")
                .with_status(DealStatus::Closed),
            Deal::new("b", "Patagonia", "Ambassador")
                .with_category("Outdoor")
                .with_score(6.0)
                .with_deadline("2024-03-01"),
        ]
    }

    #[test]
    fn deals_table_lists_each_deal() {
        let rendered = render_deals_table(&deals());
        assert!(rendered.contains("Nike"));
        assert!(rendered.contains("Patagonia"));
        assert!(rendered.contains("2024-03-01"));
        assert!(rendered.contains("closed"));
    }

    #[test]
    fn summary_tables_render_distributions() {
        let analytics = render_analytics_table(&summarize(&deals(), ValueParser::Digits));
        assert!(analytics.contains("Category: Outdoor"));
        assert!(analytics.contains("Score 9-10"));

        let pipeline = render_pipeline_table(&pipeline_analytics(&deals(), ValueParser::Digits));
        assert!(pipeline.contains("Conversion rate"));
        assert!(pipeline.contains("50.0%"));
    }

    #[test]
    fn pipeline_table_counts_open_deals() {
        let mut deals = deals();
        deals.push(Deal::new("c", "Red Bull", "Sponsorship").with_status(DealStatus::Rejected));
        deals.push(Deal::new("d", "Oakley", "Campaign").with_status(DealStatus::Negotiating));
        let rendered = render_pipeline_table(&pipeline_analytics(&deals, ValueParser::Digits));
        let open_row = rendered
            .lines()
            .find(|line| line.contains("Open deals"))
            .expect("open deals row");
        assert!(open_row.contains(" 2 "), "row was {open_row}");
    }

    #[test]
    fn follow_up_table_lists_open_deals() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
        let rendered = render_follow_up_table(&follow_up_tasks(&deals(), today));
        assert!(rendered.contains("Patagonia"));
        assert!(!rendered.contains("Nike"));
        assert!(rendered.contains("email"));
    }
}
