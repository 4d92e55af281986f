use rusqlite::Connection;
use anyhow::Result;
use serde::Serialize;
use crate::models::{Lead, LeadTask, Remark, StageHistoryEntry, UniversityApplication, User};
use crate::pipeline::workflow::load_lead;
use crate::repo::{LeadTaskRepo, RemarkRepo, StageHistoryRepo, UniversityAppRepo, UserRepo};

/// Everything shown for one lead: the lead, its owners and its logs.
///
/// Logs are kept in stored (oldest-first) order; display code reverses them.
#[derive(Debug, Clone, Serialize)]
pub struct LeadWorkspace {
    pub lead: Lead,
    pub counselor: Option<User>,
    pub manager: Option<User>,
    pub history: Vec<StageHistoryEntry>,
    pub tasks: Vec<LeadTask>,
    pub remarks: Vec<Remark>,
    pub applications: Vec<UniversityApplication>,
}

impl LeadWorkspace {
    pub fn load(conn: &Connection, lead_id: i64) -> Result<Self> {
        let lead = load_lead(conn, lead_id)?;
        let counselor = match lead.counselor_id {
            Some(id) => UserRepo::get_by_id(conn, id)?,
            None => None,
        };
        let manager = match lead.manager_id {
            Some(id) => UserRepo::get_by_id(conn, id)?,
            None => None,
        };

        Ok(Self {
            history: StageHistoryRepo::get_by_lead(conn, lead_id)?,
            tasks: LeadTaskRepo::get_by_lead(conn, lead_id)?,
            remarks: RemarkRepo::get_by_lead(conn, lead_id)?,
            applications: UniversityAppRepo::get_by_lead(conn, lead_id)?,
            lead,
            counselor,
            manager,
        })
    }

    pub fn last_task(&self) -> Option<&LeadTask> {
        self.tasks.last()
    }
}
