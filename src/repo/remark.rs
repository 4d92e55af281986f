use rusqlite::Connection;
use crate::models::Remark;
use anyhow::{Context, Result};

/// Remark repository (append-only)
pub struct RemarkRepo;

impl RemarkRepo {
    pub fn create(conn: &Connection, lead_id: i64, task_id: Option<i64>, note: &str, actor: &str) -> Result<Remark> {
        let now = chrono::Utc::now().timestamp();
        conn.execute(
            "INSERT INTO remarks (lead_id, task_id, note, actor, entry_ts) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![lead_id, task_id, note, actor, now],
        )
        .with_context(|| format!("Failed to add remark to lead {}", lead_id))?;

        Ok(Remark {
            id: Some(conn.last_insert_rowid()),
            lead_id,
            task_id,
            note: note.to_string(),
            actor: actor.to_string(),
            entry_ts: now,
        })
    }

    /// All remarks for a lead, oldest first
    pub fn get_by_lead(conn: &Connection, lead_id: i64) -> Result<Vec<Remark>> {
        let mut stmt = conn.prepare(
            "SELECT id, lead_id, task_id, note, actor, entry_ts
             FROM remarks WHERE lead_id = ?1 ORDER BY id ASC"
        )?;
        let rows = stmt.query_map([lead_id], |row| {
            Ok(Remark {
                id: Some(row.get(0)?),
                lead_id: row.get(1)?,
                task_id: row.get(2)?,
                note: row.get(3)?,
                actor: row.get(4)?,
                entry_ts: row.get(5)?,
            })
        })?;

        let mut remarks = Vec::new();
        for row in rows {
            remarks.push(row?);
        }
        Ok(remarks)
    }
}
