//! Outreach drafts: a fixed set of email templates filled in from a deal and
//! the talent it is pitched for.

pub mod followup;

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::deals::{Deal, TalentProfile};

pub use followup::{follow_up_tasks, FollowUpTask, TaskKind, TaskPriority, TaskState};

const DEFAULT_CONTACT_NAME: &str = "Partnership Team";
const DEFAULT_RECIPIENT: &str = "partnerships@brand.com";
const DEFAULT_CONVERSION_RATE: &str = "3.2";
const DEFAULT_DEMOGRAPHIC_MATCH: &str = "85";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateKind {
    #[default]
    Professional,
    Casual,
    HighValue,
    Quick,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 4] = [
        TemplateKind::Professional,
        TemplateKind::Casual,
        TemplateKind::HighValue,
        TemplateKind::Quick,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Professional => "professional",
            Self::Casual => "casual",
            Self::HighValue => "high-value",
            Self::Quick => "quick",
        }
    }

    pub fn template(self) -> &'static OutreachTemplate {
        match self {
            Self::Professional => &TEMPLATES[0],
            Self::Casual => &TEMPLATES[1],
            Self::HighValue => &TEMPLATES[2],
            Self::Quick => &TEMPLATES[3],
        }
    }
}

impl Display for TemplateKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown outreach template: {0}")]
pub struct TemplateParseError(pub String);

impl FromStr for TemplateKind {
    type Err = TemplateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "professional" | "professional-partnership" | "partnership" => Ok(Self::Professional),
            "casual" | "casual-collaboration" | "collaboration" => Ok(Self::Casual),
            "high-value" | "high_value" | "high-value-proposal" | "premium" | "proposal" => {
                Ok(Self::HighValue)
            }
            "quick" | "short" => Ok(Self::Quick),
            _ => Err(TemplateParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Professional,
    Casual,
    Formal,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutreachTemplate {
    pub kind: TemplateKind,
    pub name: &'static str,
    pub category: &'static str,
    pub tone: Tone,
    pub subject: &'static str,
    pub body: &'static str,
}

impl OutreachTemplate {
    /// Placeholder names used by the subject and body, in first-use order.
    pub fn variables(&self) -> Vec<&'static str> {
        let mut seen = Vec::new();
        for text in [self.subject, self.body] {
            let mut rest = text;
            while let Some(start) = rest.find("{{") {
                let after = &rest[start + 2..];
                let Some(end) = after.find("}}") else {
                    break;
                };
                let name = &after[..end];
                if !seen.contains(&name) {
                    seen.push(name);
                }
                rest = &after[end + 2..];
            }
        }
        seen
    }
}

pub static TEMPLATES: [OutreachTemplate; 4] = [
    OutreachTemplate {
        kind: TemplateKind::Professional,
        name: "Professional Partnership",
        category: "Partnership",
        tone: Tone::Professional,
        subject: "Partnership Opportunity - {{BRAND}} x {{TALENT_NAME}}",
        body: r#"Dear {{CONTACT_NAME}},

I hope this email finds you well. I'm reaching out regarding an exciting partnership opportunity between {{BRAND}} and {{TALENT_NAME}}.

{{TALENT_NAME}} is a {{TALENT_CATEGORY}} with a strong alignment to {{BRAND}}'s brand values and target audience. Based on our analysis, this partnership has a {{MATCH_SCORE}}/10 match score, indicating excellent potential for mutual success.

Key Highlights:
- Strong audience alignment with {{BRAND}}'s target demographic
- Proven track record in {{TALENT_CATEGORY}} partnerships
- Expected engagement rate of {{ENGAGEMENT_RATE}}%
- Estimated reach of {{REACH}} across all platforms

{{TALENT_NAME}} would be excited to collaborate on {{DEAL_TITLE}}, bringing authentic storytelling and genuine brand advocacy to the partnership.

I'd love to schedule a brief call to discuss how we can create a compelling campaign that drives real results for {{BRAND}}.

Best regards,
{{SENDER_NAME}}
{{SENDER_TITLE}}
{{COMPANY_NAME}}"#,
    },
    OutreachTemplate {
        kind: TemplateKind::Casual,
        name: "Casual Collaboration",
        category: "Collaboration",
        tone: Tone::Casual,
        subject: "Let's create something amazing together - {{TALENT_NAME}} x {{BRAND}}",
        body: r#"Hi {{CONTACT_NAME}},

Hope you're having a great day! I wanted to reach out about a collaboration opportunity that I think could be really exciting for both {{BRAND}} and {{TALENT_NAME}}.

{{TALENT_NAME}} has been following {{BRAND}} for a while and genuinely loves what you're doing in the {{CATEGORY}} space. With {{FOLLOWERS}} followers and a {{ENGAGEMENT_RATE}}% engagement rate, they've built an incredibly engaged community that aligns perfectly with your target audience.

What makes this partnership special:
- Authentic brand affinity: {{TALENT_NAME}} is already a fan
- High-quality content creation with proven results
- Engaged audience in the {{DEMOGRAPHIC}} demographic
- Creative approach to storytelling that drives action

I'd love to hop on a quick call to brainstorm some creative ideas for {{DEAL_TITLE}}. When works best for you this week?

Looking forward to creating something amazing together!

Cheers,
{{SENDER_NAME}}"#,
    },
    OutreachTemplate {
        kind: TemplateKind::HighValue,
        name: "High-Value Proposal",
        category: "Premium",
        tone: Tone::Formal,
        subject: "Strategic Partnership Proposal - {{BRAND}} x {{TALENT_NAME}}",
        body: r#"Dear {{CONTACT_NAME}},

I am writing to present a strategic partnership opportunity between {{BRAND}} and {{TALENT_NAME}} that aligns with your brand's objectives and market positioning.

Partnership Overview:
{{TALENT_NAME}} is a distinguished {{TALENT_CATEGORY}} with a verified track record of successful brand collaborations. Our comprehensive analysis indicates a {{MATCH_SCORE}}/10 compatibility score, reflecting exceptional alignment between your brand values and their audience demographics.

Performance Metrics:
- Audience Size: {{FOLLOWERS}} highly engaged followers
- Engagement Rate: {{ENGAGEMENT_RATE}}% (above industry average)
- Demographic Alignment: {{DEMOGRAPHIC_MATCH}}% match with your target market
- Previous Campaign Performance: {{CONVERSION_RATE}}% average conversion rate

Investment & ROI:
The proposed partnership falls within your {{VALUE_RANGE}} budget allocation and is projected to deliver:
- Estimated reach of {{REACH}} impressions
- Projected engagement of {{PROJECTED_ENGAGEMENT}} interactions
- Expected conversion rate of {{CONVERSION_RATE}}%

I would welcome the opportunity to discuss this proposal in detail and explore how we can structure a partnership that delivers measurable results for {{BRAND}}.

Sincerely,
{{SENDER_NAME}}
{{SENDER_TITLE}}
{{COMPANY_NAME}}"#,
    },
    OutreachTemplate {
        kind: TemplateKind::Quick,
        name: "Quick Introduction",
        category: "Partnership",
        tone: Tone::Professional,
        subject: "Partnership Opportunity: {{TALENT_NAME}} x {{BRAND}}",
        body: r#"Dear {{CONTACT_NAME}},

I hope this email finds you well. I'm reaching out regarding a potential partnership opportunity between {{BRAND}} and {{TALENT_NAME}}.

Best regards,
Deal Hunter Team"#,
    },
];

/// Who signs the email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub name: String,
    pub title: String,
    pub company: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutreachDraft {
    pub deal_id: String,
    pub template: TemplateKind,
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl OutreachDraft {
    /// Clipboard form: headers, blank line, body.
    pub fn to_plain_text(&self) -> String {
        format!(
            "To: {}\nSubject: {}\n\n{}",
            self.recipient, self.subject, self.body
        )
    }
}

/// `2.5M` from one million up, otherwise whole thousands (`850K`).
pub fn format_audience(followers: u64) -> String {
    if followers >= 1_000_000 {
        format!("{:.1}M", followers as f64 / 1_000_000.0)
    } else {
        format!("{:.0}K", followers as f64 / 1_000.0)
    }
}

/// Followers times the engagement percentage, floored.
pub fn projected_engagement(talent: &TalentProfile) -> u64 {
    let projected = talent.followers as f64 * (talent.engagement / 100.0);
    if projected.is_finite() && projected > 0.0 {
        projected.floor() as u64
    } else {
        0
    }
}

pub fn template_variables(
    deal: &Deal,
    talent: &TalentProfile,
    sender: &Sender,
) -> BTreeMap<&'static str, String> {
    let contact_name = deal
        .contact
        .as_ref()
        .and_then(|contact| contact.name.clone())
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CONTACT_NAME.to_string());
    let audience = format_audience(talent.followers);

    BTreeMap::from([
        ("BRAND", deal.brand.clone()),
        ("TALENT_NAME", talent.name.clone()),
        ("CONTACT_NAME", contact_name),
        ("TALENT_CATEGORY", talent.category.to_lowercase()),
        ("MATCH_SCORE", deal.match_score.to_string()),
        ("ENGAGEMENT_RATE", talent.engagement.to_string()),
        ("REACH", audience.clone()),
        ("FOLLOWERS", audience),
        ("DEAL_TITLE", deal.title.clone()),
        ("CATEGORY", deal.category.clone()),
        ("DEMOGRAPHIC", talent.age_range.clone()),
        ("VALUE_RANGE", deal.value_range.clone()),
        (
            "CONVERSION_RATE",
            deal.conversions
                .clone()
                .unwrap_or_else(|| DEFAULT_CONVERSION_RATE.to_string()),
        ),
        ("DEMOGRAPHIC_MATCH", DEFAULT_DEMOGRAPHIC_MATCH.to_string()),
        (
            "PROJECTED_ENGAGEMENT",
            projected_engagement(talent).to_string(),
        ),
        ("SENDER_NAME", sender.name.clone()),
        ("SENDER_TITLE", sender.title.clone()),
        ("COMPANY_NAME", sender.company.clone()),
    ])
}

/// Replaces every `{{NAME}}` with its value. Unknown placeholders are kept
/// verbatim and substituted values are never rescanned.
pub fn fill_placeholders(text: &str, variables: &BTreeMap<&'static str, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match variables.get(name) {
            Some(value) => out.push_str(value),
            None => {
                out.push_str("{{");
                out.push_str(name);
                out.push_str("}}");
            }
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

pub fn draft_outreach(
    deal: &Deal,
    talent: &TalentProfile,
    kind: TemplateKind,
    sender: &Sender,
) -> OutreachDraft {
    let template = kind.template();
    let variables = template_variables(deal, talent, sender);
    let recipient = deal
        .contact
        .as_ref()
        .and_then(|contact| contact.email.clone())
        .filter(|email| !email.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_RECIPIENT.to_string());

    OutreachDraft {
        deal_id: deal.id.clone(),
        template: kind,
        recipient,
        subject: fill_placeholders(template.subject, &variables),
        body: fill_placeholders(template.body, &variables),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{
        draft_outreach, fill_placeholders, format_audience, projected_engagement, Sender,
        TemplateKind, TEMPLATES,
    };
    use crate::deals::{Contact, Deal, TalentProfile};

    fn sender() -> Sender {
        Sender {
            name: "Sarah Martinez".to_string(),
            title: "Partnership Manager".to_string(),
            company: "Hyper Talent Agency".to_string(),
        }
    }

    fn nike() -> Deal {
        let mut deal = Deal::new("deal-1", "Nike", "Endorsement Partnership with Nike")
            .with_category("Sports")
            .with_value_range("$50K-100K")
            .with_score(9.2);
        deal.contact = Some(Contact {
            name: Some("Sarah Johnson".to_string()),
            email: Some("sarah.johnson@nike.com".to_string()),
            department: None,
        });
        deal
    }

    #[test]
    fn formats_audience_sizes() {
        assert_eq!(format_audience(2_500_000), "2.5M");
        assert_eq!(format_audience(1_000_000), "1.0M");
        assert_eq!(format_audience(850_000), "850K");
        assert_eq!(format_audience(0), "0K");
    }

    #[test]
    fn projects_engagement_from_followers() {
        let talent = TalentProfile::sample();
        assert_eq!(projected_engagement(&talent), 105_000);
        let silent = TalentProfile {
            engagement: -1.0,
            ..TalentProfile::sample()
        };
        assert_eq!(projected_engagement(&silent), 0);
    }

    #[test]
    fn every_template_fills_all_placeholders() {
        let talent = TalentProfile::sample();
        for kind in TemplateKind::ALL {
            let draft = draft_outreach(&nike(), &talent, kind, &sender());
            assert!(!draft.subject.contains("{{"), "{kind} subject");
            assert!(!draft.body.contains("{{"), "{kind} body");
            assert!(draft.subject.contains("Nike"));
            assert!(draft.body.contains("Sarah Johnson"));
        }
    }

    #[test]
    fn professional_draft_uses_deal_and_talent_values() {
        let draft = draft_outreach(
            &nike(),
            &TalentProfile::sample(),
            TemplateKind::Professional,
            &sender(),
        );
        assert_eq!(draft.recipient, "sarah.johnson@nike.com");
        assert_eq!(
            draft.subject,
            "Partnership Opportunity - Nike x Alex Rodriguez"
        );
        assert!(draft.body.contains("Alex Rodriguez is a professional athlete"));
        assert!(draft.body.contains("9.2/10 match score"));
        assert!(draft.body.contains("Estimated reach of 2.5M"));
        assert!(draft.body.ends_with("Hyper Talent Agency"));
    }

    #[test]
    fn missing_contact_falls_back_to_team_defaults() {
        let deal = Deal::new("deal-2", "Gatorade", "Sponsorship")
            .with_score(8.0)
            .with_value_range("$25K");
        let draft = draft_outreach(
            &deal,
            &TalentProfile::sample(),
            TemplateKind::HighValue,
            &sender(),
        );
        assert_eq!(draft.recipient, "partnerships@brand.com");
        assert!(draft.body.starts_with("Dear Partnership Team,"));
        assert!(draft.body.contains("8/10 compatibility score"));
        assert!(draft.body.contains("3.2% average conversion rate"));
        assert!(draft.body.contains("$25K budget allocation"));
        assert!(draft.body.contains("105000 interactions"));
    }

    #[test]
    fn quick_draft_matches_short_introduction() {
        let draft = draft_outreach(
            &nike(),
            &TalentProfile::sample(),
            TemplateKind::Quick,
            &sender(),
        );
        assert_eq!(draft.subject, "Partnership Opportunity: Alex Rodriguez x Nike");
        assert!(draft.body.ends_with("Best regards,\nDeal Hunter Team"));
        let text = draft.to_plain_text();
        assert!(text.starts_with("To: sarah.johnson@nike.com\nSubject: "));
    }

    #[test]
    fn unknown_and_unterminated_placeholders_are_kept() {
        let variables = BTreeMap::from([("BRAND", "{{TALENT_NAME}}".to_string())]);
        assert_eq!(
            fill_placeholders("{{BRAND}} {{OTHER}} {{BRAND", &variables),
            "{{TALENT_NAME}} {{OTHER}} {{BRAND"
        );
    }

    #[test]
    fn lists_template_variables_once() {
        let vars = TemplateKind::Professional.template().variables();
        assert_eq!(vars[0], "BRAND");
        assert_eq!(vars[1], "TALENT_NAME");
        assert_eq!(vars.iter().filter(|v| **v == "BRAND").count(), 1);
        assert!(vars.contains(&"SENDER_TITLE"));
        assert_eq!(TEMPLATES.len(), TemplateKind::ALL.len());
    }

    #[test]
    fn parses_template_names() {
        assert_eq!(
            " Premium ".parse::<TemplateKind>().ok(),
            Some(TemplateKind::HighValue)
        );
        assert_eq!(
            "casual-collaboration".parse::<TemplateKind>().ok(),
            Some(TemplateKind::Casual)
        );
        assert!("newsletter".parse::<TemplateKind>().is_err());
    }
}
