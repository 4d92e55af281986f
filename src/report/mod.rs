//! Dashboards and reports computed from the ledger.
//!
//! A lead counts as converted once it reaches "Application in Progress".
//! Percentages of an empty set are 0.

use rusqlite::Connection;
use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use crate::models::{HistoryOrigin, Lead, Phase, Role, Stage};
use crate::repo::{LeadRepo, StageHistoryRepo, UserRepo};
use crate::utils::date::{last_n_months, month_label, month_of, MonthKey};

/// Months covered by the monthly performance table
pub const REPORT_MONTHS: usize = 6;
const RECENT_ACTIVITY: usize = 5;
const RECENT_LEADS: usize = 3;

pub fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityItem {
    pub lead_id: i64,
    pub lead_name: String,
    pub stage: Stage,
    pub actor: String,
    pub origin: HistoryOrigin,
    pub entry_ts: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub total_leads: usize,
    pub active_users: i64,
    pub converted: usize,
    pub conversion_rate: f64,
    pub created_this_month: usize,
    pub recent_activity: Vec<ActivityItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseCount {
    pub phase: Phase,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CounselorDashboard {
    pub my_leads: usize,
    pub new_leads: usize,
    pub active_applications: usize,
    pub pipeline: Vec<PhaseCount>,
    pub recent_leads: Vec<Lead>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyRow {
    pub month: String,
    pub leads: usize,
    pub conversions: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageShare {
    pub stage: Stage,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CounselorRow {
    pub name: String,
    pub email: String,
    pub assigned: usize,
    pub converted: usize,
    pub rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub total_leads: usize,
    pub conversions: usize,
    pub conversion_rate: f64,
    pub monthly: Vec<MonthlyRow>,
    pub stages: Vec<StageShare>,
    pub counselors: Vec<CounselorRow>,
}

fn count_converted(leads: &[Lead]) -> usize {
    leads.iter().filter(|l| l.stage.is_converted()).count()
}

pub fn admin_dashboard(conn: &Connection, now: i64) -> Result<AdminDashboard> {
    let leads = LeadRepo::list_all(conn)?;
    let names: HashMap<i64, &str> = leads
        .iter()
        .filter_map(|l| l.id.map(|id| (id, l.name.as_str())))
        .collect();
    let this_month = month_of(now);
    let converted = count_converted(&leads);

    let recent_activity = StageHistoryRepo::recent(conn, RECENT_ACTIVITY)?
        .into_iter()
        .map(|entry| ActivityItem {
            lead_id: entry.lead_id,
            lead_name: names.get(&entry.lead_id).copied().unwrap_or("(unknown)").to_string(),
            stage: entry.stage,
            actor: entry.actor,
            origin: entry.origin,
            entry_ts: entry.entry_ts,
        })
        .collect();

    Ok(AdminDashboard {
        total_leads: leads.len(),
        active_users: UserRepo::count_active(conn)?,
        converted,
        conversion_rate: percent(converted, leads.len()),
        created_this_month: leads.iter().filter(|l| this_month.is_some() && month_of(l.created_ts) == this_month).count(),
        recent_activity,
    })
}

pub fn counselor_dashboard(conn: &Connection, counselor_id: i64) -> Result<CounselorDashboard> {
    let leads = LeadRepo::list_by_counselor(conn, counselor_id)?;

    let pipeline = Phase::ALL
        .iter()
        .map(|phase| PhaseCount {
            phase: *phase,
            count: leads.iter().filter(|l| l.stage.phase() == *phase).count(),
        })
        .collect();

    let mut recent_leads = leads.clone();
    recent_leads.sort_by(|a, b| b.created_ts.cmp(&a.created_ts).then(b.id.cmp(&a.id)));
    recent_leads.truncate(RECENT_LEADS);

    Ok(CounselorDashboard {
        my_leads: leads.len(),
        new_leads: leads.iter().filter(|l| l.stage <= Stage::YetToContact).count(),
        active_applications: leads
            .iter()
            .filter(|l| (Stage::ApplicationInProgress..=Stage::VisaReceived).contains(&l.stage))
            .count(),
        pipeline,
        recent_leads,
    })
}

/// Month each lead first reached a converted stage, from its stage history
fn conversion_months(conn: &Connection) -> Result<HashMap<i64, MonthKey>> {
    let mut months = HashMap::new();
    for entry in StageHistoryRepo::list_all(conn)? {
        if entry.stage.is_converted() && !months.contains_key(&entry.lead_id) {
            if let Some(month) = month_of(entry.entry_ts) {
                months.insert(entry.lead_id, month);
            }
        }
    }
    Ok(months)
}

pub fn build_report(conn: &Connection, now: i64) -> Result<Report> {
    let leads = LeadRepo::list_all(conn)?;
    let total = leads.len();
    let conversions = count_converted(&leads);

    let converted_in = conversion_months(conn)?;
    let monthly = last_n_months(now, REPORT_MONTHS)
        .into_iter()
        .map(|month| MonthlyRow {
            month: month_label(month),
            leads: leads.iter().filter(|l| month_of(l.created_ts) == Some(month)).count(),
            conversions: converted_in.values().filter(|m| **m == month).count(),
        })
        .collect();

    let stages = Stage::ALL
        .iter()
        .map(|stage| {
            let count = leads.iter().filter(|l| l.stage == *stage).count();
            StageShare { stage: *stage, count, percent: percent(count, total) }
        })
        .collect();

    let counselors = UserRepo::list(conn)?
        .into_iter()
        .filter(|u| u.role == Role::Counselor)
        .map(|user| {
            let mine: Vec<&Lead> = leads.iter().filter(|l| l.counselor_id.is_some() && l.counselor_id == user.id).collect();
            let converted = mine.iter().filter(|l| l.stage.is_converted()).count();
            CounselorRow {
                name: user.name,
                email: user.email,
                assigned: mine.len(),
                converted,
                rate: percent(converted, mine.len()),
            }
        })
        .collect();

    Ok(Report {
        total_leads: total,
        conversions,
        conversion_rate: percent(conversions, total),
        monthly,
        stages,
        counselors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use crate::models::{NewLead, User};
    use crate::pipeline::{admin_override, bulk_assign};

    fn lead(conn: &Connection, name: &str) -> i64 {
        LeadRepo::create(conn, &NewLead { name: name.to_string(), ..Default::default() }, "System", HistoryOrigin::System)
            .unwrap()
            .id
            .unwrap()
    }

    fn users(conn: &Connection) -> (User, User) {
        let admin = UserRepo::create(conn, "admin@x.com", "Admin", None, Role::Admin, "pw").unwrap();
        let sarah = UserRepo::create(conn, "sarah@x.com", "Sarah", None, Role::Counselor, "pw").unwrap();
        (admin, sarah)
    }

    #[test]
    fn test_percent_of_empty_set() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
    }

    #[test]
    fn test_empty_report() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let report = build_report(&conn, chrono::Utc::now().timestamp()).unwrap();
        assert_eq!(report.total_leads, 0);
        assert_eq!(report.conversion_rate, 0.0);
        assert_eq!(report.monthly.len(), REPORT_MONTHS);
        assert!(report.stages.iter().all(|s| s.percent == 0.0));
    }

    #[test]
    fn test_conversion_counts() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let (admin, sarah) = users(&conn);
        let a = lead(&conn, "A");
        let b = lead(&conn, "B");
        lead(&conn, "C");
        lead(&conn, "D");
        bulk_assign(&conn, &[a, b], &sarah, &admin).unwrap();
        admin_override(&conn, a, Stage::ApplicationInProgress, "fast track", "Admin").unwrap();

        let now = chrono::Utc::now().timestamp();
        let report = build_report(&conn, now).unwrap();
        assert_eq!(report.total_leads, 4);
        assert_eq!(report.conversions, 1);
        assert_eq!(report.conversion_rate, 25.0);
        assert_eq!(report.monthly.last().unwrap().leads, 4);
        assert_eq!(report.monthly.last().unwrap().conversions, 1);

        let row = &report.counselors[0];
        assert_eq!(row.assigned, 2);
        assert_eq!(row.converted, 1);
        assert_eq!(row.rate, 50.0);

        let dash = admin_dashboard(&conn, now).unwrap();
        assert_eq!(dash.total_leads, 4);
        assert_eq!(dash.active_users, 2);
        assert_eq!(dash.created_this_month, 4);
        assert_eq!(dash.recent_activity.len(), 5);
        assert_eq!(dash.recent_activity[0].stage, Stage::ApplicationInProgress);
    }

    #[test]
    fn test_counselor_dashboard() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let (admin, sarah) = users(&conn);
        let ids: Vec<i64> = ["A", "B", "C", "D"].iter().map(|n| lead(&conn, n)).collect();
        bulk_assign(&conn, &ids, &sarah, &admin).unwrap();
        admin_override(&conn, ids[0], Stage::DepositPaid, "paid", "Admin").unwrap();
        admin_override(&conn, ids[1], Stage::SessionCompleted, "met", "Admin").unwrap();

        let dash = counselor_dashboard(&conn, sarah.id.unwrap()).unwrap();
        assert_eq!(dash.my_leads, 4);
        assert_eq!(dash.new_leads, 2);
        assert_eq!(dash.active_applications, 1);
        assert_eq!(dash.recent_leads.len(), 3);
        let intake = dash.pipeline.iter().find(|p| p.phase == Phase::Intake).unwrap();
        assert_eq!(intake.count, 2);
    }
}
