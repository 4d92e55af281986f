//! CSV lead import: read, map columns to lead fields, preview, import.

pub mod csv;

use rusqlite::Connection;
use anyhow::{Context, Result};
use std::path::Path;
use crate::error::CrmError;
use crate::models::{normalize_label, HistoryOrigin, Lead, NewLead};
use crate::repo::LeadRepo;

/// Source recorded for imported leads unless a column supplies one
pub const DEFAULT_SOURCE: &str = "CSV Import";

/// Lead attribute a CSV column can feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadField {
    Name,
    Email,
    Phone,
    Country,
    Course,
    Source,
}

impl LeadField {
    pub const ALL: [LeadField; 6] = [
        LeadField::Name,
        LeadField::Email,
        LeadField::Phone,
        LeadField::Country,
        LeadField::Course,
        LeadField::Source,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadField::Name => "name",
            LeadField::Email => "email",
            LeadField::Phone => "phone",
            LeadField::Country => "country",
            LeadField::Course => "course",
            LeadField::Source => "source",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            LeadField::Name => &["name", "lead name", "full name", "student name"],
            LeadField::Email => &["email", "email address", "e-mail", "mail"],
            LeadField::Phone => &["phone", "phone number", "mobile", "contact number"],
            LeadField::Country => &["country", "preferred country", "destination"],
            LeadField::Course => &["course", "program", "programme"],
            LeadField::Source => &["source", "lead source"],
        }
    }

    /// Match a CSV header or a `--map` target
    pub fn from_header(header: &str) -> Option<Self> {
        let wanted = normalize_label(header);
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.aliases().iter().any(|a| normalize_label(a) == wanted))
    }
}

/// Which lead field, if any, each column feeds
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMapping {
    pub headers: Vec<String>,
    pub fields: Vec<Option<LeadField>>,
}

impl ColumnMapping {
    /// Map headers by name, then apply `Column=field` overrides.
    /// `field` may be `ignore` to drop a column.
    pub fn infer(headers: &[String], overrides: &[(String, String)]) -> Result<Self, CrmError> {
        let mut fields: Vec<Option<LeadField>> = headers.iter().map(|h| LeadField::from_header(h)).collect();

        for (column, target) in overrides {
            let index = headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(column.trim()))
                .ok_or_else(|| CrmError::Import(format!("column '{}' not found in header", column)))?;
            fields[index] = match normalize_label(target).as_str() {
                "ignore" | "skip" | "none" => None,
                _ => Some(LeadField::from_header(target).ok_or_else(|| CrmError::InvalidValue {
                    field: format!("--map {}", column),
                    value: target.clone(),
                    allowed: LeadField::ALL.iter().map(|f| f.as_str()).chain(["ignore"]).collect(),
                })?),
            };
        }

        // A field fed by two columns is ambiguous; keep the first
        for i in 0..fields.len() {
            if let Some(field) = fields[i] {
                for later in fields.iter_mut().skip(i + 1) {
                    if *later == Some(field) {
                        *later = None;
                    }
                }
            }
        }

        if !fields.contains(&Some(LeadField::Name)) {
            return Err(CrmError::Import(
                "no column maps to 'name'; use --map <column>=name".to_string(),
            ));
        }

        Ok(Self { headers: headers.to_vec(), fields })
    }

    /// (header, field) pairs for display
    pub fn describe(&self) -> Vec<(String, Option<LeadField>)> {
        self.headers.iter().cloned().zip(self.fields.iter().copied()).collect()
    }

    fn apply(&self, cells: &[String]) -> NewLead {
        let mut lead = NewLead::default();
        for (cell, field) in cells.iter().zip(&self.fields) {
            let value = cell.trim();
            let Some(field) = field else { continue };
            let opt = Some(value.to_string()).filter(|v| !v.is_empty());
            match field {
                LeadField::Name => lead.name = value.to_string(),
                LeadField::Email => lead.email = opt,
                LeadField::Phone => lead.phone = opt,
                LeadField::Country => lead.country = opt,
                LeadField::Course => lead.course = opt,
                LeadField::Source => lead.source = opt,
            }
        }
        if lead.source.is_none() {
            lead.source = Some(DEFAULT_SOURCE.to_string());
        }
        lead
    }
}

/// Mapped rows ready to import
#[derive(Debug, Clone)]
pub struct ImportPreview {
    pub mapping: ColumnMapping,
    pub rows: Vec<NewLead>,
    /// Source line numbers of rows dropped for having no name
    pub skipped_lines: Vec<usize>,
}

/// Parse and map CSV content without touching the database
pub fn preview(content: &str, overrides: &[(String, String)]) -> Result<ImportPreview, CrmError> {
    let mut records = csv::parse(content)?.into_iter();
    let header = records
        .next()
        .ok_or_else(|| CrmError::Import("file is empty".to_string()))?;
    let headers: Vec<String> = header.fields.iter().map(|h| h.trim().to_string()).collect();
    let mapping = ColumnMapping::infer(&headers, overrides)?;

    let mut rows = Vec::new();
    let mut skipped_lines = Vec::new();
    for record in records {
        if record.fields.len() > headers.len() {
            log::warn!(
                "line {}: {} fields but header has {}; extra fields ignored",
                record.line,
                record.fields.len(),
                headers.len()
            );
        }
        let lead = mapping.apply(&record.fields);
        if lead.name.is_empty() {
            log::warn!("line {}: no name, row skipped", record.line);
            skipped_lines.push(record.line);
            continue;
        }
        rows.push(lead);
    }

    Ok(ImportPreview { mapping, rows, skipped_lines })
}

/// Read a CSV file and preview it
pub fn preview_file(path: &Path, overrides: &[(String, String)]) -> Result<ImportPreview> {
    if !path.exists() {
        return Err(CrmError::Import(format!("file not found: {}", path.display())).into());
    }
    if path.is_dir() {
        return Err(CrmError::Import(format!("{} is a directory, not a CSV file", path.display())).into());
    }
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
            return Err(CrmError::Import(format!(
                "{} is not UTF-8 text; re-export the sheet as CSV UTF-8",
                path.display()
            ))
            .into());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read import file: {}", path.display()));
        }
    };
    Ok(preview(&content, overrides)?)
}

/// Create every previewed lead in one transaction
pub fn import_leads(conn: &Connection, preview: &ImportPreview, actor: &str) -> Result<Vec<Lead>> {
    let tx = conn.unchecked_transaction()?;
    let mut created = Vec::with_capacity(preview.rows.len());
    for row in &preview.rows {
        created.push(LeadRepo::create(&tx, row, actor, HistoryOrigin::Import)?);
    }
    tx.commit().context("Failed to commit lead import")?;
    log::info!("imported {} leads ({} rows skipped)", created.len(), preview.skipped_lines.len());
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use crate::models::Stage;
    use crate::repo::StageHistoryRepo;

    #[test]
    fn test_unreadable_files_are_import_errors() {
        let dir = tempfile::tempdir().unwrap();
        let latin1 = dir.path().join("latin1.csv");
        std::fs::write(&latin1, b"name,email\nJos\xe9,j@x.com\n").unwrap();

        let err = preview_file(&latin1, &[]).unwrap_err();
        assert!(matches!(err.downcast_ref::<CrmError>(), Some(CrmError::Import(_))));
        assert!(err.to_string().contains("not UTF-8"));

        let err = preview_file(dir.path(), &[]).unwrap_err();
        assert!(matches!(err.downcast_ref::<CrmError>(), Some(CrmError::Import(_))));
    }

    const SAMPLE: &str = "Lead Name,Email Address,Phone Number,Preferred Country\n\
                          John Smith,john@email.com,+1234567890,Canada\n\
                          Sarah Johnson,sarah@email.com,+1234567891,Australia\n";

    #[test]
    fn test_header_aliases() {
        let preview = preview(SAMPLE, &[]).unwrap();
        assert_eq!(
            preview.mapping.fields,
            vec![Some(LeadField::Name), Some(LeadField::Email), Some(LeadField::Phone), Some(LeadField::Country)]
        );
        assert_eq!(preview.rows.len(), 2);
        assert_eq!(preview.rows[1].country.as_deref(), Some("Australia"));
        assert_eq!(preview.rows[0].source.as_deref(), Some(DEFAULT_SOURCE));
    }

    #[test]
    fn test_missing_name_column_rejected() {
        let err = preview("Email\na@x.com\n", &[]).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_map_override() {
        let overrides = vec![("Student".to_string(), "name".to_string()), ("Email".to_string(), "ignore".to_string())];
        let preview = preview("Student,Email\nJane,jane@x.com\n", &overrides).unwrap();
        assert_eq!(preview.rows[0].name, "Jane");
        assert!(preview.rows[0].email.is_none());

        let bad = vec![("Nope".to_string(), "name".to_string())];
        assert!(super::preview("Student\nJane\n", &bad).is_err());
    }

    #[test]
    fn test_rows_without_name_are_skipped() {
        let preview = preview("name,email\nJane,j@x.com\n,orphan@x.com\n", &[]).unwrap();
        assert_eq!(preview.rows.len(), 1);
        assert_eq!(preview.skipped_lines, vec![3]);
    }

    #[test]
    fn test_import_creates_leads_at_first_stage() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let preview = preview(SAMPLE, &[]).unwrap();
        let leads = import_leads(&conn, &preview, "Admin").unwrap();

        assert_eq!(leads.len(), 2);
        assert_eq!(LeadRepo::count(&conn).unwrap(), 2);
        for lead in &leads {
            assert_eq!(lead.stage, Stage::YetToAssign);
            let history = StageHistoryRepo::get_by_lead(&conn, lead.id.unwrap()).unwrap();
            assert_eq!(history[0].origin, HistoryOrigin::Import);
        }
    }
}
