pub mod csv;
pub mod json;
pub mod summary;
pub mod table;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::deals::{Deal, TalentProfile, ValueParser};
use crate::output::csv::deals_to_csv;
use crate::output::json::render_json;
use crate::output::summary::{render_summary, ExportBundle};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    Summary,
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Summary => "summary",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Error)]
#[error("unknown export format: {0}")]
pub struct ExportFormatParseError(pub String);

impl FromStr for ExportFormat {
    type Err = ExportFormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "summary" | "markdown" | "md" => Ok(Self::Summary),
            _ => Err(ExportFormatParseError(s.to_string())),
        }
    }
}

/// Renders `deals` for export in the given format.
pub fn render_export(
    format: ExportFormat,
    talent: &TalentProfile,
    deals: &[Deal],
    parser: ValueParser,
    now: DateTime<Utc>,
) -> Result<String> {
    match format {
        ExportFormat::Json => render_json(&ExportBundle::new(talent, deals, parser, now)),
        ExportFormat::Csv => deals_to_csv(deals),
        ExportFormat::Summary => Ok(render_summary(talent, deals, parser, now)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{render_export, ExportFormat};
    use crate::deals::{Deal, TalentProfile, ValueParser};

    #[test]
    fn parses_format_names() {
        assert_eq!("MD".parse::<ExportFormat>().ok(), Some(ExportFormat::Summary));
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn json_export_wraps_deals_in_bundle() {
        let deals = vec![Deal::new("d1", "Nike", "Endorsement").with_value_range("$50K")];
        let talent = TalentProfile::sample();
        let rendered =
            render_export(ExportFormat::Json, &talent, &deals, ValueParser::Digits, Utc::now())
                .expect("export");
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("valid json");
        assert_eq!(value["talent"]["name"], talent.name.as_str());
        assert_eq!(value["totalValue"], 50);
        assert_eq!(value["deals"][0]["id"], "d1");
    }
}
