use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::deals::{Deal, ValueParser};
use crate::query::{SortBy, SortOrder};

/// Deadline assumed for deals without one (or with an unreadable one).
pub const FAR_FUTURE_DEADLINE: &str = "2099-12-31";

#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(f64),
    Amount(u64),
    Text(String),
    Moment(NaiveDateTime),
}

impl SortKey {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Amount(a), Self::Amount(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Moment(a), Self::Moment(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

fn sort_key(deal: &Deal, sort_by: SortBy, parser: ValueParser) -> SortKey {
    match sort_by {
        SortBy::Score => SortKey::Number(deal.match_score),
        SortBy::Value => SortKey::Amount(parser.parse(&deal.value_range)),
        SortBy::Brand => SortKey::Text(deal.brand.clone()),
        SortBy::Deadline => SortKey::Moment(deadline_or_far_future(deal.deadline.as_deref())),
        SortBy::Engagement => SortKey::Number(deal.engagement.unwrap_or(0.0)),
    }
}

/// Accepts `YYYY-MM-DD` and RFC 3339 timestamps.
pub fn parse_deadline(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.naive_utc())
}

fn deadline_or_far_future(raw: Option<&str>) -> NaiveDateTime {
    raw.and_then(parse_deadline)
        .or_else(|| parse_deadline(FAR_FUTURE_DEADLINE))
        .unwrap_or(NaiveDateTime::MAX)
}

/// Stable in both directions: deals with equal keys keep their input order.
pub fn sort_deals(deals: &mut Vec<Deal>, sort_by: SortBy, order: SortOrder, parser: ValueParser) {
    let mut keyed: Vec<(SortKey, Deal)> = deals
        .drain(..)
        .map(|deal| (sort_key(&deal, sort_by, parser), deal))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| match order {
        SortOrder::Asc => a.compare(b),
        SortOrder::Desc => b.compare(a),
    });
    deals.extend(keyed.into_iter().map(|(_, deal)| deal));
}
