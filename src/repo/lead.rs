use rusqlite::{Connection, OptionalExtension, Row};
use crate::models::{HistoryOrigin, Lead, NewLead, Stage};
use crate::repo::StageHistoryRepo;
use anyhow::{Context, Result};

const LEAD_COLUMNS: &str = "id, uuid, name, email, phone, country, course, source, stage_index,
        counselor_id, manager_id, created_ts, modified_ts";

/// Lead repository for database operations
///
/// Leads are never deleted. Their stage only changes through
/// [`LeadRepo::set_stage`], which the pipeline workflow pairs with a stage
/// history append so the log and the current stage never disagree.
pub struct LeadRepo;

impl LeadRepo {
    /// Create a lead at the first pipeline stage and record its opening history entry
    pub fn create(conn: &Connection, new_lead: &NewLead, actor: &str, origin: HistoryOrigin) -> Result<Lead> {
        let mut lead = Lead::new(new_lead.name.trim().to_string());
        lead.email = clean(&new_lead.email);
        lead.phone = clean(&new_lead.phone);
        lead.country = clean(&new_lead.country);
        lead.course = clean(&new_lead.course);
        lead.source = clean(&new_lead.source);

        conn.execute(
            "INSERT INTO leads (uuid, name, email, phone, country, course, source, stage_index,
                    counselor_id, manager_id, created_ts, modified_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, NULL, ?9, ?10)",
            rusqlite::params![
                lead.uuid,
                lead.name,
                lead.email,
                lead.phone,
                lead.country,
                lead.course,
                lead.source,
                lead.stage.index() as i64,
                lead.created_ts,
                lead.modified_ts,
            ],
        )
        .with_context(|| format!("Failed to create lead: {}", lead.name))?;

        let id = conn.last_insert_rowid();
        StageHistoryRepo::append(conn, id, lead.stage, actor, origin)?;
        log::debug!("created lead {} ({})", id, lead.name);

        Ok(Lead { id: Some(id), ..lead })
    }

    /// Get lead by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Lead>> {
        let sql = format!("SELECT {} FROM leads WHERE id = ?1", LEAD_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let lead = stmt.query_row([id], row_to_lead).optional()?;
        Ok(lead)
    }

    /// List all leads, oldest first
    pub fn list_all(conn: &Connection) -> Result<Vec<Lead>> {
        let sql = format!("SELECT {} FROM leads ORDER BY id", LEAD_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_lead)?;

        let mut leads = Vec::new();
        for row in rows {
            leads.push(row?);
        }
        Ok(leads)
    }

    /// List leads owned by a counselor
    pub fn list_by_counselor(conn: &Connection, counselor_id: i64) -> Result<Vec<Lead>> {
        let sql = format!("SELECT {} FROM leads WHERE counselor_id = ?1 ORDER BY id", LEAD_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([counselor_id], row_to_lead)?;

        let mut leads = Vec::new();
        for row in rows {
            leads.push(row?);
        }
        Ok(leads)
    }

    pub fn count(conn: &Connection) -> Result<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM leads", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Set the current stage. Callers append the matching history entry.
    pub fn set_stage(conn: &Connection, id: i64, stage: Stage) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let updated = conn.execute(
            "UPDATE leads SET stage_index = ?1, modified_ts = ?2 WHERE id = ?3",
            rusqlite::params![stage.index() as i64, now, id],
        )
        .with_context(|| format!("Failed to update stage of lead {}", id))?;

        if updated == 0 {
            anyhow::bail!("Lead {} not found", id);
        }
        Ok(())
    }

    /// Set the owning counselor
    pub fn assign(conn: &Connection, id: i64, counselor_id: i64) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let updated = conn.execute(
            "UPDATE leads SET counselor_id = ?1, modified_ts = ?2 WHERE id = ?3",
            rusqlite::params![counselor_id, now, id],
        )
        .with_context(|| format!("Failed to assign lead {}", id))?;

        if updated == 0 {
            anyhow::bail!("Lead {} not found", id);
        }
        Ok(())
    }

    /// Set the supervising manager
    pub fn set_manager(conn: &Connection, id: i64, manager_id: Option<i64>) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        conn.execute(
            "UPDATE leads SET manager_id = ?1, modified_ts = ?2 WHERE id = ?3",
            rusqlite::params![manager_id, now, id],
        )
        .with_context(|| format!("Failed to set manager of lead {}", id))?;
        Ok(())
    }
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn row_to_lead(row: &Row) -> rusqlite::Result<Lead> {
    let stage_index: i64 = row.get(8)?;
    let stage = usize::try_from(stage_index)
        .ok()
        .and_then(Stage::from_index)
        .ok_or_else(|| rusqlite::Error::IntegralValueOutOfRange(8, stage_index))?;

    Ok(Lead {
        id: Some(row.get(0)?),
        uuid: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        country: row.get(5)?,
        course: row.get(6)?,
        source: row.get(7)?,
        stage,
        counselor_id: row.get(9)?,
        manager_id: row.get(10)?,
        created_ts: row.get(11)?,
        modified_ts: row.get(12)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use crate::models::Role;
    use crate::repo::UserRepo;

    fn new_lead(name: &str) -> NewLead {
        NewLead {
            name: name.to_string(),
            email: Some(format!("{}@email.com", name.to_lowercase())),
            phone: Some("  ".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_lead_records_opening_history() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let lead = LeadRepo::create(&conn, &new_lead("John"), "System", HistoryOrigin::System).unwrap();

        assert!(lead.id.is_some());
        assert_eq!(lead.stage, Stage::YetToAssign);
        assert!(lead.phone.is_none());

        let history = StageHistoryRepo::get_by_lead(&conn, lead.id.unwrap()).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].stage, Stage::YetToAssign);
        assert_eq!(history[0].origin, HistoryOrigin::System);
    }

    #[test]
    fn test_set_stage_and_get() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let lead = LeadRepo::create(&conn, &new_lead("John"), "System", HistoryOrigin::System).unwrap();
        let id = lead.id.unwrap();

        LeadRepo::set_stage(&conn, id, Stage::DocsSubmitted).unwrap();
        let lead = LeadRepo::get_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(lead.stage, Stage::DocsSubmitted);

        assert!(LeadRepo::set_stage(&conn, 999, Stage::DocsSubmitted).is_err());
    }

    #[test]
    fn test_assign_and_list_by_counselor() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let counselor = UserRepo::create(&conn, "sarah@buildabroad.com", "Sarah", None, Role::Counselor, "pw").unwrap();
        let a = LeadRepo::create(&conn, &new_lead("A"), "System", HistoryOrigin::System).unwrap();
        LeadRepo::create(&conn, &new_lead("B"), "System", HistoryOrigin::System).unwrap();

        LeadRepo::assign(&conn, a.id.unwrap(), counselor.id.unwrap()).unwrap();
        let mine = LeadRepo::list_by_counselor(&conn, counselor.id.unwrap()).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].name, "A");
        assert_eq!(LeadRepo::count(&conn).unwrap(), 2);
    }
}
