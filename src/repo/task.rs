use rusqlite::Connection;
use crate::models::{LeadTask, TaskKind};
use anyhow::{Context, Result};

/// Task log repository (append-only)
pub struct LeadTaskRepo;

impl LeadTaskRepo {
    /// Append a task to the lead's log and return it with its id
    pub fn append(conn: &Connection, task: &LeadTask) -> Result<LeadTask> {
        let details_json = serde_json::to_string(&task.kind)?;
        conn.execute(
            "INSERT INTO lead_tasks (lead_id, task_type, details_json, remarks, actor, created_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                task.lead_id,
                task.kind.type_label(),
                details_json,
                task.remarks,
                task.actor,
                task.created_ts,
            ],
        )
        .with_context(|| format!("Failed to log {} task for lead {}", task.kind.type_label(), task.lead_id))?;

        Ok(LeadTask {
            id: Some(conn.last_insert_rowid()),
            ..task.clone()
        })
    }

    /// Task log for a lead in insertion order
    pub fn get_by_lead(conn: &Connection, lead_id: i64) -> Result<Vec<LeadTask>> {
        let mut stmt = conn.prepare(
            "SELECT id, lead_id, details_json, remarks, actor, created_ts
             FROM lead_tasks WHERE lead_id = ?1 ORDER BY id ASC"
        )?;
        let rows = stmt.query_map([lead_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?;

        let mut tasks = Vec::new();
        for row in rows {
            let (id, lead_id, details_json, remarks, actor, created_ts) = row?;
            let kind: TaskKind = serde_json::from_str(&details_json)
                .with_context(|| format!("Corrupt task details for task {}", id))?;
            tasks.push(LeadTask {
                id: Some(id),
                lead_id,
                kind,
                remarks,
                actor,
                created_ts,
            });
        }
        Ok(tasks)
    }
}
