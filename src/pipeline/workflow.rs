//! Lead mutations. Each operation runs in its own transaction: either every
//! log append and the stage change land together, or nothing does.

use rusqlite::Connection;
use anyhow::{Context, Result};
use crate::error::CrmError;
use crate::models::{HistoryOrigin, Lead, LeadTask, Remark, Stage, UniversityApplication, User};
use crate::pipeline::form::TaskForm;
use crate::pipeline::resolver::resolve_next_stage;
use crate::repo::{LeadRepo, LeadTaskRepo, RemarkRepo, StageHistoryRepo, UniversityAppRepo};

/// A stage change applied to one lead
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub lead_id: i64,
    pub from: Stage,
    pub to: Stage,
}

impl Transition {
    pub fn is_backward(&self) -> bool {
        self.to < self.from
    }
}

/// Result of recording a task
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub task: LeadTask,
    /// Stage the lead was at when the task was recorded
    pub stage: Stage,
    /// Set only when the task moved the lead
    pub transition: Option<Transition>,
    pub remark: Option<Remark>,
    pub credential: Option<UniversityApplication>,
}

/// Result of a bulk assignment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignOutcome {
    pub assigned: Vec<i64>,
    /// Leads moved from "Yet to Assign" to "Yet to Contact"
    pub moved: Vec<i64>,
    /// Ids that did not match a lead
    pub skipped: Vec<i64>,
}

/// Fetch a lead or fail with a user error
pub fn load_lead(conn: &Connection, lead_id: i64) -> Result<Lead> {
    LeadRepo::get_by_id(conn, lead_id)?
        .ok_or_else(|| CrmError::LeadNotFound(lead_id).into())
}

fn log_transition(transition: &Transition, actor: &str) {
    if transition.is_backward() {
        log::warn!(
            "lead {} moved backward from '{}' to '{}' by {}",
            transition.lead_id,
            transition.from,
            transition.to,
            actor
        );
    } else {
        log::info!(
            "lead {} moved from '{}' to '{}' by {}",
            transition.lead_id,
            transition.from,
            transition.to,
            actor
        );
    }
}

/// Record a composed task and apply the stage change it implies.
///
/// The task is always logged. A non-empty remark is copied to the remarks
/// log, and a credentials-logging task adds a university application. The
/// stage and its history entry change only when the resolved stage differs
/// from the current one.
pub fn record_task(conn: &Connection, lead_id: i64, form: TaskForm, actor: &str) -> Result<TaskOutcome> {
    let tx = conn.unchecked_transaction()?;
    let lead = load_lead(&tx, lead_id)?;

    let task = LeadTaskRepo::append(&tx, &LeadTask::new(lead_id, form.kind, form.remarks, actor))?;

    let remark = match task.remarks.as_deref() {
        Some(note) => Some(RemarkRepo::create(&tx, lead_id, task.id, note, actor)?),
        None => None,
    };

    let credential = match task.kind.credential() {
        Some(input) => Some(UniversityAppRepo::create(&tx, lead_id, task.id, input)?),
        None => None,
    };

    let transition = match resolve_next_stage(&task.kind) {
        Some(next) if next != lead.stage => {
            LeadRepo::set_stage(&tx, lead_id, next)?;
            StageHistoryRepo::append(&tx, lead_id, next, actor, HistoryOrigin::Task)?;
            Some(Transition { lead_id, from: lead.stage, to: next })
        }
        _ => None,
    };

    tx.commit()
        .with_context(|| format!("Failed to commit task for lead {}", lead_id))?;

    if let Some(t) = &transition {
        log_transition(t, actor);
    }
    log::debug!("recorded {} task on lead {}", task.kind.type_label(), lead_id);

    Ok(TaskOutcome {
        task,
        stage: lead.stage,
        transition,
        remark,
        credential,
    })
}

/// Move a lead exactly one stage forward
pub fn manual_advance(conn: &Connection, lead_id: i64, actor: &str) -> Result<Transition> {
    let tx = conn.unchecked_transaction()?;
    let lead = load_lead(&tx, lead_id)?;
    let next = lead
        .stage
        .next()
        .ok_or(CrmError::AlreadyAtFinalStage { stage: lead.stage })?;

    LeadRepo::set_stage(&tx, lead_id, next)?;
    StageHistoryRepo::append(&tx, lead_id, next, actor, HistoryOrigin::Manual)?;
    tx.commit()
        .with_context(|| format!("Failed to commit stage change for lead {}", lead_id))?;

    let transition = Transition { lead_id, from: lead.stage, to: next };
    log_transition(&transition, actor);
    Ok(transition)
}

/// Set a lead to any stage. The reason is required and is kept as a remark.
pub fn admin_override(conn: &Connection, lead_id: i64, target: Stage, reason: &str, actor: &str) -> Result<Transition> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(CrmError::EmptyOverrideReason.into());
    }

    let tx = conn.unchecked_transaction()?;
    let lead = load_lead(&tx, lead_id)?;

    LeadRepo::set_stage(&tx, lead_id, target)?;
    StageHistoryRepo::append(&tx, lead_id, target, actor, HistoryOrigin::Override)?;
    RemarkRepo::create(&tx, lead_id, None, &format!("Stage override: {}", reason), actor)?;
    tx.commit()
        .with_context(|| format!("Failed to commit override for lead {}", lead_id))?;

    let transition = Transition { lead_id, from: lead.stage, to: target };
    log_transition(&transition, actor);
    Ok(transition)
}

/// Append a free-text remark
pub fn add_remark(conn: &Connection, lead_id: i64, note: &str, actor: &str) -> Result<Remark> {
    let note = note.trim();
    if note.is_empty() {
        return Err(CrmError::Validation("Remark cannot be empty".to_string()).into());
    }
    load_lead(conn, lead_id)?;
    RemarkRepo::create(conn, lead_id, None, note, actor)
}

/// Assign leads to one counselor. Unassigned leads move on to "Yet to Contact".
pub fn bulk_assign(conn: &Connection, lead_ids: &[i64], counselor: &User, manager: &User) -> Result<AssignOutcome> {
    if lead_ids.is_empty() {
        return Err(CrmError::Validation("No leads selected for assignment".to_string()).into());
    }
    if !counselor.is_active {
        return Err(CrmError::Validation(format!("User '{}' is deactivated", counselor.email)).into());
    }
    let counselor_id = counselor.id.ok_or_else(|| anyhow::anyhow!("User {} has no id", counselor.email))?;

    let tx = conn.unchecked_transaction()?;
    let mut outcome = AssignOutcome::default();

    for &lead_id in lead_ids {
        let Some(lead) = LeadRepo::get_by_id(&tx, lead_id)? else {
            log::warn!("skipping assignment of unknown lead {}", lead_id);
            outcome.skipped.push(lead_id);
            continue;
        };

        LeadRepo::assign(&tx, lead_id, counselor_id)?;
        if lead.manager_id.is_none() {
            LeadRepo::set_manager(&tx, lead_id, manager.id)?;
        }
        if lead.stage == Stage::YetToAssign {
            LeadRepo::set_stage(&tx, lead_id, Stage::YetToContact)?;
            StageHistoryRepo::append(&tx, lead_id, Stage::YetToContact, &counselor.name, HistoryOrigin::Assignment)?;
            outcome.moved.push(lead_id);
        }
        outcome.assigned.push(lead_id);
    }

    tx.commit().context("Failed to commit lead assignment")?;
    log::info!(
        "{} assigned {} leads to {}",
        manager.name,
        outcome.assigned.len(),
        counselor.email
    );
    Ok(outcome)
}
