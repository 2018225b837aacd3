pub mod migrations;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use crate::deals::{Deal, DealStatus};
use crate::pipeline::StatusChange;
use crate::store::migrations::BASE_MIGRATION;

/// SQLite-backed deal collection plus a log of status changes.
pub struct DealStore {
    conn: Connection,
}

impl DealStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed creating store directory: {}", parent.display())
            })?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed opening deal store: {}", path.display()))?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.migrate()?;
        Ok(store)
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(BASE_MIGRATION)?;
        Ok(())
    }

    /// Inserts new deals and replaces existing ones by id. Replaced deals keep
    /// their first position.
    pub fn upsert_deals(&self, deals: &[Deal]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
INSERT INTO deals(id, status, payload_json, updated_at)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT(id) DO UPDATE SET
    status = excluded.status,
    payload_json = excluded.payload_json,
    updated_at = excluded.updated_at
"#,
            )?;
            for deal in deals {
                stmt.execute(params![
                    deal.id,
                    deal.status.as_str(),
                    serde_json::to_string(deal)?,
                    deal.updated_at.to_rfc3339()
                ])?;
            }
        }
        tx.commit()?;
        debug!(count = deals.len(), "upserted deals");
        Ok(deals.len())
    }

    pub fn load_deals(&self) -> Result<Vec<Deal>> {
        let mut stmt = self
            .conn
            .prepare("SELECT payload_json FROM deals ORDER BY seq ASC")?;
        let payloads = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        payloads
            .iter()
            .map(|json| serde_json::from_str(json).context("corrupt deal payload in store"))
            .collect()
    }

    pub fn get_deal(&self, deal_id: &str) -> Result<Option<Deal>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload_json FROM deals WHERE id = ?1",
                params![deal_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Returns `None` when no deal has the given id.
    pub fn update_status(
        &self,
        deal_id: &str,
        status: DealStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<(Deal, StatusChange)>> {
        let Some(mut deal) = self.get_deal(deal_id)? else {
            return Ok(None);
        };
        let change = StatusChange {
            deal_id: deal.id.clone(),
            from: deal.status,
            to: status,
            changed_at: now,
        };
        deal.status = status;
        deal.updated_at = now;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE deals SET status = ?2, payload_json = ?3, updated_at = ?4 WHERE id = ?1",
            params![
                deal.id,
                status.as_str(),
                serde_json::to_string(&deal)?,
                now.to_rfc3339()
            ],
        )?;
        tx.execute(
            r#"
INSERT INTO status_history(deal_id, from_status, to_status, changed_at)
VALUES (?1, ?2, ?3, ?4)
"#,
            params![
                change.deal_id,
                change.from.as_str(),
                change.to.as_str(),
                change.changed_at.to_rfc3339()
            ],
        )?;
        tx.commit()?;
        Ok(Some((deal, change)))
    }

    /// Newest first.
    pub fn load_activity(&self, deal_id: Option<&str>, limit: usize) -> Result<Vec<StatusChange>> {
        let sql = if deal_id.is_some() {
            r#"
SELECT deal_id, from_status, to_status, changed_at
FROM status_history
WHERE deal_id = ?1
ORDER BY id DESC
LIMIT ?2
"#
        } else {
            r#"
SELECT deal_id, from_status, to_status, changed_at
FROM status_history
ORDER BY id DESC
LIMIT ?1
"#
        };

        let mut stmt = self.conn.prepare(sql)?;
        let rows = if let Some(deal_id) = deal_id {
            stmt.query_map(params![deal_id, limit as i64], row_to_status_change)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        } else {
            stmt.query_map(params![limit as i64], row_to_status_change)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        };
        Ok(rows)
    }

    pub fn deal_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM deals", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn row_to_status_change(row: &rusqlite::Row<'_>) -> rusqlite::Result<StatusChange> {
    let deal_id: String = row.get(0)?;
    let from_raw: String = row.get(1)?;
    let to_raw: String = row.get(2)?;
    let changed_at_raw: String = row.get(3)?;
    let changed_at = match DateTime::parse_from_rfc3339(&changed_at_raw) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(error) => {
            warn!(
                deal = %deal_id,
                raw = %changed_at_raw,
                %error,
                "corrupt activity timestamp, using now"
            );
            Utc::now()
        }
    };
    Ok(StatusChange {
        from: stored_status(&deal_id, &from_raw),
        to: stored_status(&deal_id, &to_raw),
        deal_id,
        changed_at,
    })
}

fn stored_status(deal_id: &str, raw: &str) -> DealStatus {
    raw.parse().unwrap_or_else(|error| {
        warn!(deal = %deal_id, raw = %raw, %error, "corrupt activity status, using new");
        DealStatus::default()
    })
}
