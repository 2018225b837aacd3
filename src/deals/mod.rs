pub mod value;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub use value::{parse_digits, parse_with_suffix, ValueParser};

/// A brand-partnership opportunity, in the camelCase shape the dashboard
/// exchanges (`matchScore`, `valueRange`, `createdAt`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: String,
    pub brand: String,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub value_range: String,
    #[serde(default)]
    pub match_score: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reach: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(default, deserialize_with = "status_or_new")]
    pub status: DealStatus,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Deal {
    pub fn new(id: impl Into<String>, brand: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            brand: brand.into(),
            title: title.into(),
            category: String::new(),
            value_range: String::new(),
            match_score: 0.0,
            description: String::new(),
            tags: Vec::new(),
            deadline: None,
            requirements: Vec::new(),
            engagement: None,
            reach: None,
            conversions: None,
            industry: None,
            company_size: None,
            duration: None,
            start_date: None,
            contact: None,
            status: DealStatus::New,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    pub fn with_value_range(mut self, value_range: &str) -> Self {
        self.value_range = value_range.to_string();
        self
    }

    pub fn with_score(mut self, match_score: f64) -> Self {
        self.match_score = match_score;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_deadline(mut self, deadline: &str) -> Self {
        self.deadline = Some(deadline.to_string());
        self
    }

    pub fn with_engagement(mut self, engagement: f64) -> Self {
        self.engagement = Some(engagement);
        self
    }

    pub fn with_status(mut self, status: DealStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_contact(mut self, contact: Contact) -> Self {
        self.contact = Some(contact);
        self
    }
}

/// Treats an explicit `null` status like a missing one.
fn status_or_new<'de, D>(deserializer: D) -> Result<DealStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<DealStatus>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
pub enum DealStatus {
    #[default]
    New,
    Contacted,
    Negotiating,
    Closed,
    Rejected,
}

impl DealStatus {
    pub const ALL: [DealStatus; 5] = [
        DealStatus::New,
        DealStatus::Contacted,
        DealStatus::Negotiating,
        DealStatus::Closed,
        DealStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Negotiating => "negotiating",
            Self::Closed => "closed",
            Self::Rejected => "rejected",
        }
    }

    /// Nominal next stage of the outreach lifecycle. Nothing enforces it;
    /// status changes may jump to any stage.
    pub fn next_stage(self) -> Option<DealStatus> {
        match self {
            Self::New => Some(Self::Contacted),
            Self::Contacted => Some(Self::Negotiating),
            Self::Negotiating => Some(Self::Closed),
            Self::Closed | Self::Rejected => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Rejected)
    }
}

impl Display for DealStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown deal status: {0}")]
pub struct StatusParseError(pub String);

impl FromStr for DealStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "new" => Ok(Self::New),
            "contacted" => Ok(Self::Contacted),
            "negotiating" | "negotiation" => Ok(Self::Negotiating),
            "closed" | "won" => Ok(Self::Closed),
            "rejected" | "lost" => Ok(Self::Rejected),
            _ => Err(StatusParseError(s.to_string())),
        }
    }
}

/// The talent a deal set is being matched against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TalentProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub engagement: f64,
    /// Audience age band, e.g. `25-45`.
    #[serde(default, alias = "age_range")]
    pub age_range: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, alias = "past_brands")]
    pub past_brands: Vec<String>,
}

impl TalentProfile {
    pub fn sample() -> Self {
        Self {
            name: "Alex Rodriguez".to_string(),
            category: "Professional Athlete".to_string(),
            followers: 2_500_000,
            engagement: 4.2,
            age_range: "25-45".to_string(),
            categories: vec!["Sports".to_string(), "Fitness".to_string()],
            past_brands: vec!["Nike".to_string(), "Gatorade".to_string()],
        }
    }
}

impl Default for TalentProfile {
    fn default() -> Self {
        Self::sample()
    }
}
