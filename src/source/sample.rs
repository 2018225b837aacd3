use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::deals::{parse_with_suffix, Contact, Deal, DealStatus, TalentProfile};
use crate::source::DealSource;

const MAX_MATCH_SCORE: u32 = 10;

#[derive(Debug, Clone, Copy)]
pub struct BrandProfile {
    pub name: &'static str,
    pub categories: &'static [&'static str],
    pub deal_types: &'static [&'static str],
    pub budget_range: &'static str,
    pub requirements: &'static [&'static str],
}

pub const BRAND_CATALOGUE: [BrandProfile; 5] = [
    BrandProfile {
        name: "Nike",
        categories: &["Sports", "Fitness", "Lifestyle"],
        deal_types: &["Endorsement", "Product Placement", "Campaign"],
        budget_range: "$50K-$500K",
        requirements: &["1M+ followers", "Sports content", "High engagement"],
    },
    BrandProfile {
        name: "Gatorade",
        categories: &["Sports", "Nutrition", "Performance"],
        deal_types: &["Sponsorship", "Content Creation", "Event Partnership"],
        budget_range: "$25K-$200K",
        requirements: &["Sports background", "Performance content", "500K+ followers"],
    },
    BrandProfile {
        name: "Patagonia",
        categories: &["Outdoor", "Sustainability", "Adventure"],
        deal_types: &["Brand Ambassador", "Content Partnership", "Campaign"],
        budget_range: "$15K-$100K",
        requirements: &[
            "Outdoor content",
            "Sustainability values",
            "Authentic storytelling",
        ],
    },
    BrandProfile {
        name: "Red Bull",
        categories: &["Energy", "Extreme Sports", "Gaming", "Music"],
        deal_types: &["Sponsorship", "Event Partnership", "Content Creation"],
        budget_range: "$30K-$300K",
        requirements: &["High energy content", "Young audience", "Creative content"],
    },
    BrandProfile {
        name: "Under Armour",
        categories: &["Sports", "Fitness", "Performance"],
        deal_types: &["Endorsement", "Product Testing", "Campaign"],
        budget_range: "$40K-$250K",
        requirements: &["Athletic background", "Performance focus", "Training content"],
    },
];

/// Generates a deterministic deal set by matching the built-in brand
/// catalogue against a talent profile.
#[derive(Debug, Clone)]
pub struct SampleSource {
    talent: TalentProfile,
    anchor: DateTime<Utc>,
}

impl SampleSource {
    pub fn new(talent: TalentProfile) -> Self {
        Self {
            talent,
            anchor: Utc::now(),
        }
    }

    /// Pins ids, deadlines and timestamps to a fixed instant.
    pub fn with_anchor(mut self, anchor: DateTime<Utc>) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn generate(&self) -> Vec<Deal> {
        let mut deals: Vec<Deal> = BRAND_CATALOGUE
            .iter()
            .enumerate()
            .map(|(index, brand)| self.build_deal(index, brand))
            .collect();
        deals.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
        deals
    }

    fn build_deal(&self, index: usize, brand: &BrandProfile) -> Deal {
        let score = match_score(&self.talent, brand);
        let primary_type = brand.deal_types.first().copied().unwrap_or("Partnership");
        let primary_category = brand.categories.first().copied().unwrap_or_default();
        let ordinal = index as i64 + 1;

        let mut deal = Deal::new(
            format!("deal-{}-{index}", self.anchor.timestamp_millis()),
            brand.name,
            format!("{primary_type} Partnership with {}", brand.name),
        )
        .with_category(primary_category)
        .with_value_range(brand.budget_range)
        .with_score(f64::from(score))
        .with_description(&format!(
            "Exclusive {} opportunity with {}. Perfect for {}s with strong {} content.",
            primary_type.to_lowercase(),
            brand.name,
            self.talent.category.to_lowercase(),
            brand.categories.join(", ").to_lowercase()
        ))
        .with_deadline(&(self.anchor + Duration::days(14 * ordinal)).format("%Y-%m-%d").to_string())
        .with_engagement(self.talent.engagement)
        .with_status(DealStatus::New)
        .with_contact(Contact {
            name: Some(format!("{} Partnership Team", brand.name)),
            email: Some(format!(
                "partnerships@{}.com",
                brand.name.to_lowercase().replace(' ', "")
            )),
            department: Some("Brand Partnerships".to_string()),
        });

        deal.tags = brand
            .categories
            .iter()
            .chain(brand.deal_types.iter())
            .map(|tag| tag.to_string())
            .collect();
        deal.requirements = brand.requirements.iter().map(|r| r.to_string()).collect();
        let reach = (self.talent.followers as f64 * self.talent.engagement / 100.0).floor();
        deal.reach = Some(format!("{}", reach as u64));
        deal.conversions = Some(format!("{:.1}%", f64::from(score) * 0.5));
        deal.industry = Some(primary_category.to_string());
        deal.company_size = Some("Enterprise".to_string());
        deal.duration = Some("6 months".to_string());
        deal.start_date = Some(
            (self.anchor + Duration::days(7 * ordinal))
                .format("%Y-%m-%d")
                .to_string(),
        );
        deal.created_at = self.anchor;
        deal.updated_at = self.anchor;
        deal
    }
}

/// Integer 0..=10 fit between a talent and a brand.
///
/// Category overlap is worth 4, meeting the brand's follower requirement 3,
/// engagement up to 2 and any partnership history 1.
pub fn match_score(talent: &TalentProfile, brand: &BrandProfile) -> u32 {
    let mut score = 0;

    if brand
        .categories
        .iter()
        .any(|category| talent.categories.iter().any(|c| c == category))
    {
        score += 4;
    }

    if let Some(requirement) = brand
        .requirements
        .iter()
        .find(|requirement| requirement.contains("followers"))
    {
        if talent.followers >= parse_with_suffix(requirement) {
            score += 3;
        }
    }

    if talent.engagement >= 4.0 {
        score += 2;
    } else if talent.engagement >= 2.0 {
        score += 1;
    }

    if !talent.past_brands.is_empty() {
        score += 1;
    }

    score.min(MAX_MATCH_SCORE)
}

#[async_trait]
impl DealSource for SampleSource {
    fn name(&self) -> &str {
        "sample"
    }

    async fn fetch_deals(&self) -> Result<Vec<Deal>> {
        let deals = self.generate();
        info!(talent = %self.talent.name, "generated {} sample deals", deals.len());
        Ok(deals)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{match_score, SampleSource, BRAND_CATALOGUE};
    use crate::deals::TalentProfile;
    use crate::source::DealSource;

    fn anchored() -> SampleSource {
        let anchor = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        SampleSource::new(TalentProfile::sample()).with_anchor(anchor)
    }

    #[test]
    fn scores_sample_talent_against_catalogue() {
        let talent = TalentProfile::sample();
        let scores: Vec<u32> = BRAND_CATALOGUE
            .iter()
            .map(|brand| match_score(&talent, brand))
            .collect();
        // Nike, Gatorade, Patagonia, Red Bull, Under Armour
        assert_eq!(scores, vec![10, 10, 3, 3, 7]);
    }

    #[test]
    fn follower_requirement_uses_magnitude_suffix() {
        let mut talent = TalentProfile::sample();
        talent.followers = 800_000;
        assert_eq!(match_score(&talent, &BRAND_CATALOGUE[0]), 7);
        assert_eq!(match_score(&talent, &BRAND_CATALOGUE[1]), 10);
    }

    #[test]
    fn generated_deals_are_deterministic_and_ranked() {
        let source = anchored();
        let first = source.generate();
        let second = source.generate();
        assert_eq!(first, second);

        let brands: Vec<&str> = first.iter().map(|d| d.brand.as_str()).collect();
        assert_eq!(
            brands,
            vec!["Nike", "Gatorade", "Under Armour", "Patagonia", "Red Bull"]
        );

        let nike = &first[0];
        assert_eq!(nike.title, "Endorsement Partnership with Nike");
        assert_eq!(nike.deadline.as_deref(), Some("2024-01-29"));
        assert_eq!(nike.reach.as_deref(), Some("105000"));
        assert_eq!(nike.conversions.as_deref(), Some("5.0%"));
        assert_eq!(
            nike.contact.as_ref().and_then(|c| c.email.as_deref()),
            Some("partnerships@nike.com")
        );
        assert_eq!(
            first[4].contact.as_ref().and_then(|c| c.email.as_deref()),
            Some("partnerships@redbull.com")
        );
        assert!(nike.tags.contains(&"Endorsement".to_string()));
    }

    #[test]
    fn fetch_deals_goes_through_the_trait() {
        let deals = tokio_test::block_on(anchored().fetch_deals()).expect("sample deals");
        assert_eq!(deals.len(), BRAND_CATALOGUE.len());
    }
}
