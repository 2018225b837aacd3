use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::deals::{Deal, DealStatus};
use crate::query::sort::parse_deadline;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Email,
    Call,
    Meeting,
    Reminder,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Call => "call",
            Self::Meeting => "meeting",
            Self::Reminder => "reminder",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Overdue,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpTask {
    pub deal_id: String,
    pub brand: String,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub priority: TaskPriority,
    pub status: TaskState,
}

/// Next action per open stage and how many days after the last update it
/// falls due.
fn next_action(deal: &Deal) -> Option<(TaskKind, String, &'static str, i64)> {
    match deal.status {
        DealStatus::New => Some((
            TaskKind::Email,
            format!("Send initial outreach to {}", deal.brand),
            "Introduce the talent and share the match highlights",
            2,
        )),
        DealStatus::Contacted => Some((
            TaskKind::Email,
            format!("Follow up on {} partnership", deal.brand),
            "Send follow-up email with additional performance metrics",
            5,
        )),
        DealStatus::Negotiating => Some((
            TaskKind::Call,
            format!("Schedule call with {} team", deal.brand),
            "Discuss campaign timeline and deliverables",
            3,
        )),
        DealStatus::Closed | DealStatus::Rejected => None,
    }
}

fn priority_for(score: f64) -> TaskPriority {
    if score >= 9.0 {
        TaskPriority::High
    } else if score >= 7.0 {
        TaskPriority::Medium
    } else {
        TaskPriority::Low
    }
}

/// One task per deal that is still open, soonest first; equal dates put the
/// higher priority first. A deal deadline earlier than the nominal due date
/// pulls the task forward and turns it into a reminder when it lands before
/// the update itself.
pub fn follow_up_tasks(deals: &[Deal], today: NaiveDate) -> Vec<FollowUpTask> {
    let mut tasks: Vec<FollowUpTask> = deals
        .iter()
        .filter(|deal| !deal.status.is_terminal())
        .filter_map(|deal| {
            let (mut kind, title, description, offset) = next_action(deal)?;
            let updated = deal.updated_at.date_naive();
            let mut due_date = updated + Duration::days(offset);
            if let Some(deadline) = deal
                .deadline
                .as_deref()
                .and_then(parse_deadline)
                .map(|dt| dt.date())
            {
                if deadline < due_date {
                    due_date = deadline;
                }
                if deadline < updated {
                    kind = TaskKind::Reminder;
                }
            }
            let status = if due_date < today {
                TaskState::Overdue
            } else {
                TaskState::Pending
            };
            Some(FollowUpTask {
                deal_id: deal.id.clone(),
                brand: deal.brand.clone(),
                kind,
                title,
                description: description.to_string(),
                due_date,
                priority: priority_for(deal.match_score),
                status,
            })
        })
        .collect();

    tasks.sort_by(|a, b| {
        a.due_date
            .cmp(&b.due_date)
            .then_with(|| b.priority.cmp(&a.priority))
    });
    tasks
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{follow_up_tasks, TaskKind, TaskPriority, TaskState};
    use crate::deals::{Deal, DealStatus};

    fn at(y: i32, m: u32, d: u32) -> Deal {
        let mut deal = Deal::new("x", "X", "t");
        deal.updated_at = Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap();
        deal
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn deal(id: &str, brand: &str, status: DealStatus, score: f64) -> Deal {
        let mut deal = at(2024, 1, 15);
        deal.id = id.to_string();
        deal.brand = brand.to_string();
        deal.status = status;
        deal.match_score = score;
        deal
    }

    #[test]
    fn skips_closed_and_rejected_deals() {
        let deals = vec![
            deal("won", "Nike", DealStatus::Closed, 9.5),
            deal("lost", "Oakley", DealStatus::Rejected, 4.0),
            deal("open", "Gatorade", DealStatus::Contacted, 7.5),
        ];
        let tasks = follow_up_tasks(&deals, day(2024, 1, 16));
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].deal_id, "open");
        assert_eq!(tasks[0].title, "Follow up on Gatorade partnership");
        assert_eq!(tasks[0].due_date, day(2024, 1, 20));
        assert_eq!(tasks[0].priority, TaskPriority::Medium);
        assert_eq!(tasks[0].status, TaskState::Pending);
    }

    #[test]
    fn orders_by_due_date_then_priority() {
        let deals = vec![
            deal("contacted", "Gatorade", DealStatus::Contacted, 9.0),
            deal("new-low", "Oakley", DealStatus::New, 5.0),
            deal("new-high", "Nike", DealStatus::New, 9.2),
            deal("negotiating", "Red Bull", DealStatus::Negotiating, 6.0),
        ];
        let tasks = follow_up_tasks(&deals, day(2024, 1, 15));
        let ids: Vec<&str> = tasks.iter().map(|t| t.deal_id.as_str()).collect();
        assert_eq!(ids, vec!["new-high", "new-low", "negotiating", "contacted"]);
        assert_eq!(tasks[2].kind, TaskKind::Call);
        assert_eq!(tasks[2].title, "Schedule call with Red Bull team");
    }

    #[test]
    fn earlier_deadline_pulls_task_forward() {
        let mut soon = deal("soon", "Nike", DealStatus::Contacted, 8.0);
        soon.deadline = Some("2024-01-17".to_string());
        let mut lapsed = deal("lapsed", "Oakley", DealStatus::Negotiating, 8.0);
        lapsed.deadline = Some("2024-01-10T09:00:00Z".to_string());
        let mut vague = deal("vague", "Red Bull", DealStatus::New, 8.0);
        vague.deadline = Some("spring".to_string());

        let tasks = follow_up_tasks(&[soon, lapsed, vague], day(2024, 1, 16));
        assert_eq!(tasks[0].deal_id, "lapsed");
        assert_eq!(tasks[0].kind, TaskKind::Reminder);
        assert_eq!(tasks[0].status, TaskState::Overdue);
        assert_eq!(tasks[1].deal_id, "soon");
        assert_eq!(tasks[1].due_date, day(2024, 1, 17));
        assert_eq!(tasks[1].kind, TaskKind::Email);
        assert_eq!(tasks[2].due_date, day(2024, 1, 17));
    }

    #[test]
    fn serializes_kind_as_type() {
        let tasks = follow_up_tasks(
            &[deal("n", "Nike", DealStatus::New, 9.0)],
            day(2024, 1, 30),
        );
        let value = serde_json::to_value(&tasks[0]).expect("task json");
        assert_eq!(value["type"], "email");
        assert_eq!(value["dueDate"], "2024-01-17");
        assert_eq!(value["status"], "overdue");
        assert_eq!(value["priority"], "high");
    }
}
