//! Demo data for an empty ledger: one admin, two counselors and a handful of
//! leads at different points of the pipeline.

use rusqlite::Connection;
use anyhow::{Context, Result};
use crate::error::CrmError;
use crate::models::{HistoryOrigin, NewLead, Role, Stage};
use crate::repo::{LeadRepo, StageHistoryRepo, UserRepo};

pub const DEMO_ADMIN_EMAIL: &str = "admin@buildabroad.com";
pub const DEMO_ADMIN_PASSWORD: &str = "admin123";
pub const DEMO_COUNSELOR_EMAIL: &str = "counselor@buildabroad.com";
pub const DEMO_COUNSELOR_PASSWORD: &str = "counselor123";

const DEMO_USERS: &[(&str, &str, &str, Role, &str)] = &[
    (DEMO_ADMIN_EMAIL, "John Doe", "+1 123 456 7890", Role::Admin, DEMO_ADMIN_PASSWORD),
    (DEMO_COUNSELOR_EMAIL, "Sarah Miller", "+1 987 654 3210", Role::Counselor, DEMO_COUNSELOR_PASSWORD),
    ("michael@buildabroad.com", "Michael Chen", "+1 555 010 2020", Role::Counselor, DEMO_COUNSELOR_PASSWORD),
];

/// (name, email, phone, country, course, source, counselor index into DEMO_USERS, stage)
type DemoLead = (&'static str, &'static str, &'static str, &'static str, &'static str, &'static str, Option<usize>, Stage);

const DEMO_LEADS: &[DemoLead] = &[
    ("Alice Johnson", "alice.j@example.com", "+1 234 567 890", "USA", "Computer Science", "Website Inquiry", Some(1), Stage::YetToContact),
    ("John Smith", "john@email.com", "+1234567890", "USA", "Computer Science", "Website Inquiry", None, Stage::YetToAssign),
    ("Emily Johnson", "emily@email.com", "+1234567891", "Canada", "Business Administration", "Referral", None, Stage::YetToAssign),
    ("Michael Brown", "michael@email.com", "+1234567892", "UK", "Data Science", "Education Fair", Some(1), Stage::DocsSubmitted),
    ("Sarah Davis", "sarah@email.com", "+1234567893", "Australia", "Engineering", "Website Inquiry", Some(2), Stage::OfferLetterReceived),
    ("Alex Wilson", "alex@email.com", "+1234567894", "USA", "Medicine", "Social Media", None, Stage::YetToAssign),
];

#[derive(Debug, Clone, PartialEq)]
pub struct SeedSummary {
    pub users: usize,
    pub leads: usize,
}

/// Populate an empty ledger. Refuses to touch a ledger that already has users or leads.
pub fn seed_demo(conn: &Connection) -> Result<SeedSummary> {
    if UserRepo::count(conn)? > 0 || LeadRepo::count(conn)? > 0 {
        return Err(CrmError::Validation(
            "Demo data can only be loaded into an empty ledger".to_string(),
        ).into());
    }

    let tx = conn.unchecked_transaction()?;

    let mut users = Vec::new();
    for (email, name, phone, role, password) in DEMO_USERS {
        users.push(UserRepo::create(&tx, email, name, Some(*phone), *role, password)?);
    }
    let admin = &users[0];

    for (name, email, phone, country, course, source, counselor, stage) in DEMO_LEADS {
        let new_lead = NewLead {
            name: name.to_string(),
            email: Some(email.to_string()),
            phone: Some(phone.to_string()),
            country: Some(country.to_string()),
            course: Some(course.to_string()),
            source: Some(source.to_string()),
        };
        let lead = LeadRepo::create(&tx, &new_lead, "System", HistoryOrigin::System)?;
        let lead_id = lead.id.context("Seeded lead has no id")?;

        let Some(counselor) = counselor.map(|i| &users[i]) else {
            continue;
        };
        let counselor_id = counselor.id.context("Seeded user has no id")?;
        LeadRepo::assign(&tx, lead_id, counselor_id)?;
        LeadRepo::set_manager(&tx, lead_id, admin.id)?;
        StageHistoryRepo::append(&tx, lead_id, Stage::YetToContact, &counselor.name, HistoryOrigin::Assignment)?;
        if *stage != Stage::YetToContact {
            StageHistoryRepo::append(&tx, lead_id, *stage, &counselor.name, HistoryOrigin::Manual)?;
        }
        LeadRepo::set_stage(&tx, lead_id, *stage)?;
    }

    tx.commit().context("Failed to commit demo data")?;
    log::info!("seeded {} users and {} leads", DEMO_USERS.len(), DEMO_LEADS.len());
    Ok(SeedSummary {
        users: DEMO_USERS.len(),
        leads: DEMO_LEADS.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;

    #[test]
    fn test_seed_demo() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let summary = seed_demo(&conn).unwrap();
        assert_eq!(summary, SeedSummary { users: 3, leads: 6 });

        let admin = UserRepo::verify_credentials(&conn, DEMO_ADMIN_EMAIL, DEMO_ADMIN_PASSWORD).unwrap();
        assert_eq!(admin.unwrap().role, Role::Admin);

        let leads = LeadRepo::list_all(&conn).unwrap();
        let alice = leads.iter().find(|l| l.name == "Alice Johnson").unwrap();
        assert_eq!(alice.stage, Stage::YetToContact);
        let history = StageHistoryRepo::get_by_lead(&conn, alice.id.unwrap()).unwrap();
        assert_eq!(history.last().unwrap().stage, alice.stage);

        let sarah_davis = leads.iter().find(|l| l.name == "Sarah Davis").unwrap();
        let history = StageHistoryRepo::get_by_lead(&conn, sarah_davis.id.unwrap()).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history.last().unwrap().stage, Stage::OfferLetterReceived);
    }

    #[test]
    fn test_seed_refuses_non_empty_ledger() {
        let conn = DbConnection::connect_in_memory().unwrap();
        seed_demo(&conn).unwrap();
        let err = seed_demo(&conn).unwrap_err();
        assert!(err.downcast_ref::<CrmError>().is_some());
        assert_eq!(LeadRepo::count(&conn).unwrap(), 6);
    }
}
