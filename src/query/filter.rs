use crate::deals::{Deal, DealStatus, ValueParser};
use crate::query::{FilterSpec, TagMatch, ValueBucket};

/// A compiled [`FilterSpec`]: every set clause is ANDed, unset clauses are
/// dropped at build time. The score window is always checked.
#[derive(Debug, Clone)]
pub struct DealPredicate {
    search: Option<String>,
    category: Option<String>,
    bucket: Option<ValueBucket>,
    score_range: (f64, f64),
    status: Option<DealStatus>,
    tags: Vec<String>,
    tag_match: TagMatch,
    parser: ValueParser,
}

impl DealPredicate {
    pub fn build(spec: &FilterSpec, parser: ValueParser) -> Self {
        let search = (!spec.search.is_empty()).then(|| spec.search.to_lowercase());
        Self {
            search,
            category: spec.category.clone(),
            bucket: spec.value_range_bucket,
            score_range: (spec.min_score, spec.max_score),
            status: spec.status,
            tags: spec.tags.clone(),
            tag_match: spec.tag_match,
            parser,
        }
    }

    pub fn matches(&self, deal: &Deal) -> bool {
        self.matches_search(deal)
            && self.matches_category(deal)
            && self.matches_bucket(deal)
            && self.matches_score(deal)
            && self.matches_status(deal)
            && self.matches_tags(deal)
    }

    fn matches_search(&self, deal: &Deal) -> bool {
        let Some(needle) = &self.search else {
            return true;
        };
        deal.brand.to_lowercase().contains(needle)
            || deal.title.to_lowercase().contains(needle)
            || deal.description.to_lowercase().contains(needle)
            || deal.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
    }

    fn matches_category(&self, deal: &Deal) -> bool {
        self.category
            .as_ref()
            .map_or(true, |category| deal.category == *category)
    }

    fn matches_bucket(&self, deal: &Deal) -> bool {
        self.bucket
            .map_or(true, |bucket| bucket.contains(self.parser.parse(&deal.value_range)))
    }

    /// Always applied, so scores outside 0-10 (or NaN) never pass the full
    /// default window either.
    fn matches_score(&self, deal: &Deal) -> bool {
        let (min, max) = self.score_range;
        deal.match_score >= min && deal.match_score <= max
    }

    fn matches_status(&self, deal: &Deal) -> bool {
        self.status.map_or(true, |status| deal.status == status)
    }

    fn matches_tags(&self, deal: &Deal) -> bool {
        if self.tags.is_empty() {
            return true;
        }
        match self.tag_match {
            TagMatch::Any => self.tags.iter().any(|tag| deal.tags.contains(tag)),
            TagMatch::All => self.tags.iter().all(|tag| deal.tags.contains(tag)),
        }
    }
}

/// Clones the matching deals, keeping their input order.
pub fn filter_deals(deals: &[Deal], spec: &FilterSpec, parser: ValueParser) -> Vec<Deal> {
    let predicate = DealPredicate::build(spec, parser);
    deals
        .iter()
        .filter(|deal| predicate.matches(deal))
        .cloned()
        .collect()
}
