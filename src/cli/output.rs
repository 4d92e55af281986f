// Output formatting utilities

use crate::import::ImportPreview;
use crate::models::{Lead, Stage, User};
use crate::pipeline::{AssignOutcome, LeadWorkspace, TaskOutcome, Transition};
use crate::report::{AdminDashboard, CounselorDashboard, Report};
use crate::utils::date::{format_date, format_datetime};
use std::collections::HashMap;
use std::io::IsTerminal;

// ANSI escape codes for terminal formatting
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";

// ANSI foreground colors (standard 16-color palette)
const ANSI_FG_RED: &str = "\x1b[31m";
const ANSI_FG_GREEN: &str = "\x1b[32m";
const ANSI_FG_YELLOW: &str = "\x1b[33m";
const ANSI_FG_BLUE: &str = "\x1b[34m";
const ANSI_FG_MAGENTA: &str = "\x1b[35m";
const ANSI_FG_CYAN: &str = "\x1b[36m";
const ANSI_FG_BRIGHT_BLACK: &str = "\x1b[90m";

const MIN_COLUMN_WIDTH: usize = 4;

/// Map a color name string to its ANSI foreground constant
fn color_name_to_fg(name: &str) -> Option<&'static str> {
    match name {
        "red" => Some(ANSI_FG_RED),
        "green" => Some(ANSI_FG_GREEN),
        "yellow" => Some(ANSI_FG_YELLOW),
        "blue" => Some(ANSI_FG_BLUE),
        "magenta" => Some(ANSI_FG_MAGENTA),
        "cyan" => Some(ANSI_FG_CYAN),
        "bright_black" => Some(ANSI_FG_BRIGHT_BLACK),
        _ => None,
    }
}

/// Stage colour, by the phase the stage belongs to
pub fn stage_color(stage: Stage) -> Option<&'static str> {
    color_name_to_fg(stage.phase().color())
}

/// Check if stdout is a terminal (TTY)
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width dynamically
///
/// Uses the `terminal_size` crate for reliable detection, with fallback to
/// COLUMNS environment variable and a sensible default.
pub fn get_terminal_width() -> usize {
    if let Some((terminal_size::Width(w), _)) = terminal_size::terminal_size() {
        if w > 0 {
            return w as usize;
        }
    }

    if let Ok(cols) = std::env::var("COLUMNS") {
        if let Ok(width) = cols.parse::<usize>() {
            if width > 0 && width < 10000 {
                return width;
            }
        }
    }

    120
}

/// Apply bold formatting if in TTY mode
fn bold_if_tty(text: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", ANSI_BOLD, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

fn paint(text: &str, color: Option<&str>, is_tty: bool) -> String {
    match color {
        Some(color) if is_tty => format!("{}{}{}", color, text, ANSI_RESET),
        _ => text.to_string(),
    }
}

/// Truncate to `width` characters, marking the cut with ".."
fn truncate(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len <= width {
        return text.to_string();
    }
    if width <= 2 {
        return text.chars().take(width).collect();
    }
    let mut cut: String = text.chars().take(width - 2).collect();
    cut.push_str("..");
    cut
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}

/// One table cell with an optional foreground colour
pub struct Cell {
    text: String,
    color: Option<&'static str>,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), color: None }
    }

    pub fn colored(text: impl Into<String>, color: Option<&'static str>) -> Self {
        Self { text: text.into(), color }
    }
}

/// Render rows under bold headers, shrinking the widest columns until the
/// table fits `max_width`.
pub fn format_table(headers: &[&str], rows: &[Vec<Cell>], max_width: usize, is_tty: bool) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.text.chars().count());
        }
    }

    let gaps = widths.len().saturating_sub(1);
    while widths.iter().sum::<usize>() + gaps > max_width {
        let Some((widest, width)) = widths.iter().copied().enumerate().max_by_key(|(_, w)| *w) else {
            break;
        };
        if width <= MIN_COLUMN_WIDTH {
            break;
        }
        widths[widest] = width - 1;
    }

    let mut output = String::new();
    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| pad(&truncate(h, *w), *w))
        .collect();
    output.push_str(&bold_if_tty(header_line.join(" ").trim_end(), is_tty));
    output.push('\n');
    output.push_str(&"-".repeat(widths.iter().sum::<usize>() + gaps));
    output.push('\n');

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| {
                let text = pad(&truncate(&cell.text, *w), *w);
                paint(&text, cell.color, is_tty)
            })
            .collect();
        output.push_str(line.join(" ").trim_end());
        output.push('\n');
    }
    output
}

fn or_none(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("(none)")
}

/// Lead list; `names` maps user ids to display names
pub fn format_lead_list(leads: &[Lead], names: &HashMap<i64, String>) -> String {
    if leads.is_empty() {
        return "No leads found.".to_string();
    }
    let tty = is_tty();
    let rows: Vec<Vec<Cell>> = leads
        .iter()
        .map(|lead| {
            vec![
                Cell::plain(lead.id.map(|id| id.to_string()).unwrap_or_default()),
                Cell::plain(lead.name.clone()),
                Cell::plain(lead.email.clone().unwrap_or_default()),
                Cell::plain(lead.phone.clone().unwrap_or_default()),
                Cell::plain(lead.country.clone().unwrap_or_default()),
                Cell::colored(lead.stage.label(), stage_color(lead.stage)),
                Cell::plain(
                    lead.counselor_id
                        .and_then(|id| names.get(&id).cloned())
                        .unwrap_or_default(),
                ),
                Cell::plain(format_date(lead.created_ts)),
            ]
        })
        .collect();

    let mut output = format_table(
        &["ID", "Name", "Email", "Phone", "Country", "Stage", "Counselor", "Created"],
        &rows,
        get_terminal_width(),
        tty,
    );
    output.push_str(&format!("\n{} lead(s)\n", leads.len()));
    output
}

pub fn format_user_list(users: &[User]) -> String {
    if users.is_empty() {
        return "No users.".to_string();
    }
    let tty = is_tty();
    let rows: Vec<Vec<Cell>> = users
        .iter()
        .map(|user| {
            let status = if user.is_active { "active" } else { "inactive" };
            vec![
                Cell::plain(user.id.map(|id| id.to_string()).unwrap_or_default()),
                Cell::plain(user.name.clone()),
                Cell::plain(user.email.clone()),
                Cell::plain(user.phone.clone().unwrap_or_default()),
                Cell::plain(user.role.as_str()),
                Cell::colored(status, (!user.is_active).then_some(ANSI_FG_BRIGHT_BLACK)),
            ]
        })
        .collect();
    format_table(&["ID", "Name", "Email", "Phone", "Role", "Status"], &rows, get_terminal_width(), tty)
}

/// The fixed pipeline, one stage per line
pub fn format_stage_list() -> String {
    let tty = is_tty();
    let rows: Vec<Vec<Cell>> = Stage::ALL
        .iter()
        .map(|stage| {
            vec![
                Cell::plain(stage.index().to_string()),
                Cell::colored(stage.label(), stage_color(*stage)),
                Cell::plain(stage.phase().label()),
                Cell::plain(if stage.is_converted() { "yes" } else { "" }),
            ]
        })
        .collect();
    format_table(&["#", "Stage", "Phase", "Converted"], &rows, get_terminal_width(), tty)
}

/// Which university application passwords to show in clear text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reveal {
    None,
    All,
    /// 1-based position in the displayed list
    One(usize),
}

impl Reveal {
    fn shows(&self, position: usize) -> bool {
        match self {
            Reveal::None => false,
            Reveal::All => true,
            Reveal::One(n) => *n == position,
        }
    }
}

fn section(output: &mut String, title: &str, tty: bool) {
    output.push('\n');
    output.push_str(&bold_if_tty(title, tty));
    output.push('\n');
}

fn user_line(user: &Option<User>) -> String {
    match user {
        Some(user) => match &user.phone {
            Some(phone) => format!("{} ({})", user.name, phone),
            None => user.name.clone(),
        },
        None => "(none)".to_string(),
    }
}

/// Full lead view. Logs print newest first.
pub fn format_lead_workspace(ws: &LeadWorkspace, reveal: Reveal) -> String {
    let tty = is_tty();
    let lead = &ws.lead;
    let mut output = String::new();

    let header = format!(
        "Lead {}: {}",
        lead.id.map(|id| id.to_string()).unwrap_or_else(|| "?".to_string()),
        lead.name
    );
    output.push_str(&bold_if_tty(&header, tty));
    output.push('\n');
    output.push_str(&"=".repeat(header.chars().count().max(60)));
    output.push('\n');
    output.push_str(&format!("  Email:       {}\n", or_none(&lead.email)));
    output.push_str(&format!("  Phone:       {}\n", or_none(&lead.phone)));
    output.push_str(&format!("  Owner:       {}\n", user_line(&ws.counselor)));
    output.push_str(&format!("  Manager:     {}\n", user_line(&ws.manager)));
    output.push_str(&format!(
        "  Stage:       {} ({} of {}, {:.0}%)\n",
        paint(lead.stage.label(), stage_color(lead.stage), tty),
        lead.stage.index() + 1,
        Stage::COUNT,
        lead.stage.progress_percent()
    ));

    section(&mut output, "Personal Data", tty);
    output.push_str(&format!("  Country:     {}\n", or_none(&lead.country)));
    output.push_str(&format!("  Course:      {}\n", or_none(&lead.course)));
    output.push_str(&format!("  Source:      {}\n", or_none(&lead.source)));
    output.push_str(&format!("  Created:     {}\n", format_datetime(lead.created_ts)));

    section(&mut output, "Last Task", tty);
    match ws.last_task() {
        Some(task) => {
            output.push_str(&format!("  Type:        {}\n", task.kind.type_label()));
            for (name, value) in task.kind.attributes() {
                output.push_str(&format!("  {:<12} {}\n", format!("{}:", name), value));
            }
            if let Some(remarks) = &task.remarks {
                output.push_str(&format!("  Remarks:     {}\n", remarks));
            }
            output.push_str(&format!("  By:          {} on {}\n", task.actor, format_datetime(task.created_ts)));
        }
        None => output.push_str("  (no tasks yet)\n"),
    }

    section(&mut output, "University Applications", tty);
    if ws.applications.is_empty() {
        output.push_str("  (none)\n");
    }
    for (i, app) in ws.applications.iter().enumerate() {
        let position = i + 1;
        output.push_str(&format!("  [{}] {}\n", position, app.university_name));
        output.push_str(&format!("      URL:      {}\n", or_none(&app.url)));
        output.push_str(&format!("      Username: {}\n", or_none(&app.username)));
        output.push_str(&format!("      Password: {}\n", app.password_display(reveal.shows(position))));
    }

    section(&mut output, "Stage Log", tty);
    for entry in ws.history.iter().rev() {
        output.push_str(&format!(
            "  {}  {}  {}\n",
            format_datetime(entry.entry_ts),
            paint(&pad(entry.stage.label(), 24), stage_color(entry.stage), tty),
            entry.actor_display()
        ));
    }

    section(&mut output, "Task Log", tty);
    if ws.tasks.is_empty() {
        output.push_str("  (none)\n");
    }
    for task in ws.tasks.iter().rev() {
        output.push_str(&format!(
            "  {}  {:<20} {}  ({})\n",
            format_datetime(task.created_ts),
            task.kind.type_label(),
            task.kind.status_summary(),
            task.actor
        ));
    }

    section(&mut output, "Remarks", tty);
    if ws.remarks.is_empty() {
        output.push_str("  (none)\n");
    }
    for remark in ws.remarks.iter().rev() {
        output.push_str(&format!(
            "  {}  {}: {}\n",
            format_datetime(remark.entry_ts),
            remark.actor,
            remark.note
        ));
    }

    output
}

fn backward_note(transition: &Transition) -> &'static str {
    if transition.is_backward() {
        " (moved backward)"
    } else {
        ""
    }
}

/// Message printed after a task is saved
pub fn format_task_outcome(outcome: &TaskOutcome) -> String {
    let mut message = match &outcome.transition {
        Some(t) => format!(
            "Task saved! Lead moved from \"{}\" to \"{}\".{}",
            t.from,
            t.to,
            backward_note(t)
        ),
        None => format!("Task saved! No stage change triggered from \"{}\".", outcome.stage),
    };
    if let Some(app) = &outcome.credential {
        message.push_str(&format!("\nLogged credentials for {}.", app.university_name));
    }
    message
}

/// Message printed after a manual advance or override
pub fn format_transition(transition: &Transition) -> String {
    format!(
        "Lead {} moved from \"{}\" to \"{}\".{}",
        transition.lead_id,
        transition.from,
        transition.to,
        backward_note(transition)
    )
}

pub fn format_assign_outcome(outcome: &AssignOutcome, counselor: &User) -> String {
    let mut output = format!("Assigned {} lead(s) to {}.", outcome.assigned.len(), counselor.name);
    if !outcome.moved.is_empty() {
        output.push_str(&format!(
            "\n{} lead(s) moved to \"{}\".",
            outcome.moved.len(),
            Stage::YetToContact
        ));
    }
    if !outcome.skipped.is_empty() {
        let ids: Vec<String> = outcome.skipped.iter().map(|id| id.to_string()).collect();
        output.push_str(&format!("\nSkipped unknown lead(s): {}", ids.join(", ")));
    }
    output
}

/// Column mapping and mapped rows of a CSV import
pub fn format_import_preview(preview: &ImportPreview) -> String {
    let tty = is_tty();
    let mut output = String::new();
    output.push_str(&bold_if_tty("Column mapping", tty));
    output.push('\n');
    for (header, field) in preview.mapping.describe() {
        let target = field.map(|f| f.as_str()).unwrap_or("(ignored)");
        output.push_str(&format!("  {:<24} -> {}\n", header, target));
    }
    output.push('\n');

    let rows: Vec<Vec<Cell>> = preview
        .rows
        .iter()
        .map(|lead| {
            vec![
                Cell::plain(lead.name.clone()),
                Cell::plain(lead.email.clone().unwrap_or_default()),
                Cell::plain(lead.phone.clone().unwrap_or_default()),
                Cell::plain(lead.country.clone().unwrap_or_default()),
                Cell::plain(lead.source.clone().unwrap_or_default()),
            ]
        })
        .collect();
    if !rows.is_empty() {
        output.push_str(&format_table(
            &["Name", "Email", "Phone", "Country", "Source"],
            &rows,
            get_terminal_width(),
            tty,
        ));
        output.push('\n');
    }
    output.push_str(&format!("{} lead(s) ready to import", preview.rows.len()));
    if !preview.skipped_lines.is_empty() {
        let lines: Vec<String> = preview.skipped_lines.iter().map(|l| l.to_string()).collect();
        output.push_str(&format!(
            ", {} row(s) skipped without a name (line {})",
            preview.skipped_lines.len(),
            lines.join(", ")
        ));
    }
    output.push('\n');
    output
}

pub fn format_admin_dashboard(dashboard: &AdminDashboard) -> String {
    let tty = is_tty();
    let mut output = String::new();
    output.push_str(&bold_if_tty("Admin Dashboard", tty));
    output.push('\n');
    output.push_str(&format!("  Total leads:          {}\n", dashboard.total_leads));
    output.push_str(&format!("  Active users:         {}\n", dashboard.active_users));
    output.push_str(&format!(
        "  Conversion rate:      {:.1}% ({} converted)\n",
        dashboard.conversion_rate, dashboard.converted
    ));
    output.push_str(&format!("  Created this month:   {}\n", dashboard.created_this_month));

    section(&mut output, "Recent Activity", tty);
    if dashboard.recent_activity.is_empty() {
        output.push_str("  (none)\n");
    }
    for item in &dashboard.recent_activity {
        output.push_str(&format!(
            "  {}  {} -> {}  ({})\n",
            format_datetime(item.entry_ts),
            item.lead_name,
            paint(item.stage.label(), stage_color(item.stage), tty),
            item.actor
        ));
    }
    output
}

pub fn format_counselor_dashboard(dashboard: &CounselorDashboard, name: &str) -> String {
    let tty = is_tty();
    let mut output = String::new();
    output.push_str(&bold_if_tty(&format!("Dashboard: {}", name), tty));
    output.push('\n');
    output.push_str(&format!("  My leads:             {}\n", dashboard.my_leads));
    output.push_str(&format!("  New leads:            {}\n", dashboard.new_leads));
    output.push_str(&format!("  Active applications:  {}\n", dashboard.active_applications));

    section(&mut output, "Pipeline", tty);
    for entry in &dashboard.pipeline {
        let color = color_name_to_fg(entry.phase.color());
        output.push_str(&format!(
            "  {}{}\n",
            paint(&pad(entry.phase.label(), 14), color, tty),
            entry.count
        ));
    }

    section(&mut output, "Recent Leads", tty);
    if dashboard.recent_leads.is_empty() {
        output.push_str("  (none)\n");
    }
    for lead in &dashboard.recent_leads {
        output.push_str(&format!(
            "  {:>4}  {:<24} {}\n",
            lead.id.unwrap_or_default(),
            lead.name,
            paint(lead.stage.label(), stage_color(lead.stage), tty)
        ));
    }
    output
}

pub fn format_report(report: &Report) -> String {
    let tty = is_tty();
    let width = get_terminal_width();
    let mut output = String::new();
    output.push_str(&bold_if_tty("Reports", tty));
    output.push('\n');
    output.push_str(&format!(
        "  {} lead(s), {} converted ({:.1}%)\n",
        report.total_leads, report.conversions, report.conversion_rate
    ));

    section(&mut output, "Monthly Performance", tty);
    let rows: Vec<Vec<Cell>> = report
        .monthly
        .iter()
        .map(|row| {
            vec![
                Cell::plain(row.month.clone()),
                Cell::plain(row.leads.to_string()),
                Cell::plain(row.conversions.to_string()),
            ]
        })
        .collect();
    output.push_str(&format_table(&["Month", "Leads", "Conversions"], &rows, width, tty));

    section(&mut output, "Stage Distribution", tty);
    let rows: Vec<Vec<Cell>> = report
        .stages
        .iter()
        .map(|share| {
            vec![
                Cell::colored(share.stage.label(), stage_color(share.stage)),
                Cell::plain(share.count.to_string()),
                Cell::plain(format!("{:.1}%", share.percent)),
            ]
        })
        .collect();
    output.push_str(&format_table(&["Stage", "Leads", "Share"], &rows, width, tty));

    section(&mut output, "Counselor Performance", tty);
    if report.counselors.is_empty() {
        output.push_str("  (no counselors)\n");
    } else {
        let rows: Vec<Vec<Cell>> = report
            .counselors
            .iter()
            .map(|row| {
                vec![
                    Cell::plain(row.name.clone()),
                    Cell::plain(row.assigned.to_string()),
                    Cell::plain(row.converted.to_string()),
                    Cell::plain(format!("{:.1}%", row.rate)),
                ]
            })
            .collect();
        output.push_str(&format_table(&["Counselor", "Assigned", "Converted", "Rate"], &rows, width, tty));
    }
    output
}
