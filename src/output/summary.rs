//! Export bundles: the JSON envelope and the Markdown digest.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::deals::{Deal, TalentProfile, ValueParser};
use crate::query::analytics::with_thousands_separators;

const SUMMARY_TOP_DEALS: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub talent: TalentProfile,
    pub deals: Vec<Deal>,
    pub exported_at: DateTime<Utc>,
    pub total_value: u64,
}

impl ExportBundle {
    pub fn new(
        talent: &TalentProfile,
        deals: &[Deal],
        parser: ValueParser,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            talent: talent.clone(),
            deals: deals.to_vec(),
            exported_at: now,
            total_value: total_value(deals, parser),
        }
    }
}

fn total_value(deals: &[Deal], parser: ValueParser) -> u64 {
    deals.iter().fold(0u64, |acc, deal| {
        acc.saturating_add(parser.parse(&deal.value_range))
    })
}

/// Markdown digest of an export. Ranks a private copy; `deals` keeps its
/// order.
pub fn render_summary(
    talent: &TalentProfile,
    deals: &[Deal],
    parser: ValueParser,
    now: DateTime<Utc>,
) -> String {
    let avg_score = if deals.is_empty() {
        0.0
    } else {
        deals.iter().map(|d| d.match_score).sum::<f64>() / deals.len() as f64
    };

    let mut ranked: Vec<&Deal> = deals.iter().collect();
    ranked.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));

    let mut categories: BTreeMap<&str, usize> = BTreeMap::new();
    for deal in deals {
        *categories.entry(deal.category.as_str()).or_default() += 1;
    }

    let mut out = String::new();
    let _ = writeln!(out, "# Deal Export Summary");
    let _ = writeln!(out);
    let _ = writeln!(out, "**Talent:** {}", talent.name);
    let _ = writeln!(out, "**Export Date:** {}", now.format("%Y-%m-%d"));
    let _ = writeln!(out, "**Total Deals:** {}", deals.len());
    let _ = writeln!(out, "**Average Match Score:** {avg_score:.1}/10");
    let _ = writeln!(
        out,
        "**Estimated Total Value:** ${}",
        with_thousands_separators(total_value(deals, parser))
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "## Top Deals");
    for (idx, deal) in ranked.iter().take(SUMMARY_TOP_DEALS).enumerate() {
        let _ = writeln!(
            out,
            "{}. {} - {} ({}/10)",
            idx + 1,
            deal.brand,
            deal.title,
            deal.match_score
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "## Categories");
    for (category, count) in categories {
        let _ = writeln!(out, "- {category}: {count} deals");
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{render_summary, ExportBundle};
    use crate::deals::{Deal, TalentProfile, ValueParser};

    fn talent(name: &str) -> TalentProfile {
        TalentProfile {
            name: name.to_string(),
            ..TalentProfile::sample()
        }
    }

    fn deals() -> Vec<Deal> {
        vec![
            Deal::new("a", "Patagonia", "Ambassador")
                .with_category("Outdoor")
                .with_score(6.0)
                .with_value_range("$15000"),
            Deal::new("b", "Nike", "Endorsement")
                .with_category("Sports")
                .with_score(9.0)
                .with_value_range("$1200000"),
            Deal::new("c", "Gatorade", "Sponsorship")
                .with_category("Sports")
                .with_score(7.5)
                .with_value_range("$25000"),
        ]
    }

    #[test]
    fn summary_ranks_without_reordering_input() {
        let deals = deals();
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let summary = render_summary(&talent("Alex Rodriguez"), &deals, ValueParser::Digits, now);

        assert!(summary.contains("**Talent:** Alex Rodriguez"));
        assert!(summary.contains("**Export Date:** 2024-01-15"));
        assert!(summary.contains("**Total Deals:** 3"));
        assert!(summary.contains("**Average Match Score:** 7.5/10"));
        assert!(summary.contains("**Estimated Total Value:** $1,240,000"));
        assert!(summary.contains("1. Nike - Endorsement (9/10)"));
        assert!(summary.contains("3. Patagonia - Ambassador (6/10)"));
        assert!(summary.contains("- Sports: 2 deals"));
        assert_eq!(deals[0].id, "a");
    }

    #[test]
    fn empty_summary_has_zero_average() {
        let summary = render_summary(&talent("Alex"), &[], ValueParser::Digits, Utc::now());
        assert!(summary.contains("**Average Match Score:** 0.0/10"));
        assert!(summary.contains("**Estimated Total Value:** $0"));
    }

    #[test]
    fn bundle_totals_with_chosen_parser() {
        let now = Utc::now();
        let bundle = ExportBundle::new(&talent("Alex"), &deals(), ValueParser::Suffix, now);
        assert_eq!(bundle.total_value, 1_240_000);
        let value = serde_json::to_value(&bundle).expect("bundle json");
        assert_eq!(value["totalValue"], 1_240_000);
        assert!(value.get("exportedAt").is_some());
        assert_eq!(value["talent"]["name"], "Alex");
        assert_eq!(value["talent"]["followers"], 2_500_000);
    }
}
