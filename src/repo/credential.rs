use rusqlite::Connection;
use crate::models::{CredentialInput, UniversityApplication};
use anyhow::{Context, Result};

/// University applications log
pub struct UniversityAppRepo;

impl UniversityAppRepo {
    pub fn create(
        conn: &Connection,
        lead_id: i64,
        task_id: Option<i64>,
        credential: &CredentialInput,
    ) -> Result<UniversityApplication> {
        let now = chrono::Utc::now().timestamp();
        conn.execute(
            "INSERT INTO university_apps (lead_id, task_id, university_name, url, username, password, created_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                lead_id,
                task_id,
                credential.university_name,
                credential.url,
                credential.username,
                credential.password,
                now,
            ],
        )
        .with_context(|| format!("Failed to log university application for lead {}", lead_id))?;

        Ok(UniversityApplication {
            id: Some(conn.last_insert_rowid()),
            lead_id,
            task_id,
            university_name: credential.university_name.clone(),
            url: credential.url.clone(),
            username: credential.username.clone(),
            password: credential.password.clone(),
            created_ts: now,
        })
    }

    /// Applications for a lead, oldest first
    pub fn get_by_lead(conn: &Connection, lead_id: i64) -> Result<Vec<UniversityApplication>> {
        let mut stmt = conn.prepare(
            "SELECT id, lead_id, task_id, university_name, url, username, password, created_ts
             FROM university_apps WHERE lead_id = ?1 ORDER BY id ASC"
        )?;
        let rows = stmt.query_map([lead_id], |row| {
            Ok(UniversityApplication {
                id: Some(row.get(0)?),
                lead_id: row.get(1)?,
                task_id: row.get(2)?,
                university_name: row.get(3)?,
                url: row.get(4)?,
                username: row.get(5)?,
                password: row.get(6)?,
                created_ts: row.get(7)?,
            })
        })?;

        let mut apps = Vec::new();
        for row in rows {
            apps.push(row?);
        }
        Ok(apps)
    }
}
