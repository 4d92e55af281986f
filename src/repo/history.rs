use rusqlite::Connection;
use crate::models::{HistoryOrigin, Stage, StageHistoryEntry};
use anyhow::{Context, Result};

/// Stage history repository (append-only)
pub struct StageHistoryRepo;

impl StageHistoryRepo {
    /// Append one entry. Entries are ordered by insertion id.
    pub fn append(
        conn: &Connection,
        lead_id: i64,
        stage: Stage,
        actor: &str,
        origin: HistoryOrigin,
    ) -> Result<StageHistoryEntry> {
        let now = chrono::Utc::now().timestamp();
        conn.execute(
            "INSERT INTO stage_history (lead_id, stage, actor, origin, entry_ts) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![lead_id, stage.label(), actor, origin.as_str(), now],
        )
        .with_context(|| format!("Failed to record stage history for lead {}", lead_id))?;

        Ok(StageHistoryEntry {
            id: Some(conn.last_insert_rowid()),
            lead_id,
            stage,
            actor: actor.to_string(),
            origin,
            entry_ts: now,
        })
    }

    /// Full history for a lead, oldest first
    pub fn get_by_lead(conn: &Connection, lead_id: i64) -> Result<Vec<StageHistoryEntry>> {
        Self::query(
            conn,
            "SELECT id, lead_id, stage, actor, origin, entry_ts FROM stage_history
             WHERE lead_id = ?1 ORDER BY id ASC",
            rusqlite::params![lead_id],
        )
    }

    /// Most recent entries across all leads, newest first
    pub fn recent(conn: &Connection, limit: usize) -> Result<Vec<StageHistoryEntry>> {
        Self::query(
            conn,
            "SELECT id, lead_id, stage, actor, origin, entry_ts FROM stage_history
             ORDER BY id DESC LIMIT ?1",
            rusqlite::params![limit as i64],
        )
    }

    /// Every entry, oldest first (reports)
    pub fn list_all(conn: &Connection) -> Result<Vec<StageHistoryEntry>> {
        Self::query(
            conn,
            "SELECT id, lead_id, stage, actor, origin, entry_ts FROM stage_history ORDER BY id ASC",
            [],
        )
    }

    fn query<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<StageHistoryEntry>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, lead_id, label, actor, origin, entry_ts) = row?;
            // A label outside the pipeline cannot be placed; skip it rather than fail the whole log
            let Some(stage) = Stage::from_label(&label) else {
                log::warn!("stage history {} has unknown stage '{}', skipping", id, label);
                continue;
            };
            entries.push(StageHistoryEntry {
                id: Some(id),
                lead_id,
                stage,
                actor,
                origin: HistoryOrigin::from_str(&origin).unwrap_or(HistoryOrigin::System),
                entry_ts,
            });
        }
        Ok(entries)
    }
}
