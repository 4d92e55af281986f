use clap::{Parser, Subcommand};
use rusqlite::Connection;
use crate::auth::{self, require_role, require_session, AuthContext};
use crate::config::Config;
use crate::db::DbConnection;
use crate::error::CrmError;
use crate::import;
use crate::models::{HistoryOrigin, Lead, NewLead, Role, Stage};
use crate::pipeline::{self, LeadWorkspace};
use crate::repo::{LeadRepo, UserRepo};
use crate::report;
use crate::seed;
use crate::cli::abbrev;
use crate::cli::error::{parse_lead_id_list, user_error, validate_lead_id, validate_non_empty};
use crate::cli::output::{
    format_admin_dashboard, format_assign_outcome, format_counselor_dashboard, format_import_preview,
    format_lead_list, format_lead_workspace, format_report, format_stage_list, format_task_outcome,
    format_transition, format_user_list, Reveal,
};
use crate::cli::parser::{parse_field_args, parse_field_args_joined};
use crate::utils::fuzzy;
use std::collections::HashMap;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use anyhow::{Context, Result};

#[derive(Parser)]
#[command(name = "abroad")]
#[command(about = "Study-abroad lead pipeline - a command-line CRM ledger for counselors and admins")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and start a session
    Login {
        email: String,
        /// Password (prompted on stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// End the current session
    Logout,
    /// Show the logged-in user
    Whoami {
        #[arg(long)]
        json: bool,
    },
    /// Manage users (admin)
    Users {
        #[command(subcommand)]
        subcommand: UserCommands,
    },
    /// Lead lists, creation, assignment and import
    Leads {
        #[command(subcommand)]
        subcommand: LeadsCommands,
    },
    /// Work on a single lead
    Lead {
        #[command(subcommand)]
        subcommand: LeadCommands,
    },
    /// List the pipeline stages
    Stages {
        #[arg(long)]
        json: bool,
    },
    /// Dashboard for the logged-in user
    Dashboard {
        #[arg(long)]
        json: bool,
    },
    /// Monthly, stage and counselor reports (admin)
    Reports {
        #[arg(long)]
        json: bool,
    },
    /// Load demo users and leads into an empty ledger
    Seed {
        #[arg(long)]
        demo: bool,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Add a user: <email> <name...> [role=admin|counselor] [phone=<p>]
    Add {
        email: String,
        /// Password (prompted on stdin when omitted)
        #[arg(long)]
        password: Option<String>,
        /// Name words and field=value pairs
        args: Vec<String>,
    },
    /// List users
    List {
        #[arg(long)]
        json: bool,
    },
    /// Deactivate a user and revoke their sessions
    Deactivate {
        email: String,
    },
}

#[derive(Subcommand)]
pub enum LeadsCommands {
    /// Add a lead: <name...> [email=..] [phone=..] [country=..] [course=..] [source=..]
    Add {
        args: Vec<String>,
    },
    /// List leads: [stage=<stage>] [search terms]
    List {
        #[arg(long)]
        json: bool,
        args: Vec<String>,
    },
    /// Assign leads to a counselor: <ids> <counselor email or name>
    Assign {
        /// Lead IDs, e.g. "1,3,5-7"
        ids: String,
        #[arg(required = true, num_args = 1..)]
        counselor: Vec<String>,
    },
    /// Import leads from a CSV file
    Import {
        file: PathBuf,
        /// Column mapping override, e.g. --map "Full Name=name" (repeatable)
        #[arg(long = "map")]
        map: Vec<String>,
        /// Preview the mapped rows without writing anything
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
pub enum LeadCommands {
    /// Show the lead workspace
    Show {
        id: String,
        /// Reveal university passwords (all, or only application N)
        #[arg(long, num_args = 0..=1, default_missing_value = "0")]
        reveal: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Record a task: type=<type> field=value... [remarks=.. (last, takes the rest)]
    Task {
        id: String,
        args: Vec<String>,
    },
    /// Move the lead one stage forward
    Advance {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Set any stage (admin)
    Override {
        id: String,
        #[arg(required = true, num_args = 1..)]
        stage: Vec<String>,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Add a remark
    Remark {
        id: String,
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        text: Vec<String>,
    },
}

pub fn run() -> Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if matches!(args.first().map(String::as_str), Some("--version" | "-V")) {
        println!("abroad {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    args = match abbrev::expand_command_abbreviations(args) {
        Ok(expanded) => expanded,
        Err(e) => {
            user_error(&e);
        }
    };

    if args.is_empty() || args[0] == "help" {
        args.retain(|a| a != "help");
        args.push("--help".to_string());
    }

    let clap_args = std::iter::once("abroad".to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>();
    let cli = match Cli::try_parse_from(clap_args) {
        Ok(cli) => cli,
        Err(e) => {
            e.print()?;
            // Help and version are not errors; usage mistakes are user errors
            if e.use_stderr() {
                std::process::exit(1);
            }
            return Ok(());
        }
    };

    handle_command(cli)
}

fn handle_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Login { email, password } => handle_login(email, password),
        Commands::Logout => handle_logout(),
        Commands::Whoami { json } => handle_whoami(json),
        Commands::Users { subcommand } => match subcommand {
            UserCommands::Add { email, password, args } => handle_user_add(email, password, args),
            UserCommands::List { json } => handle_user_list(json),
            UserCommands::Deactivate { email } => handle_user_deactivate(email),
        },
        Commands::Leads { subcommand } => match subcommand {
            LeadsCommands::Add { args } => handle_lead_add(args),
            LeadsCommands::List { json, args } => handle_lead_list(args, json),
            LeadsCommands::Assign { ids, counselor } => handle_lead_assign(ids, counselor.join(" ")),
            LeadsCommands::Import { file, map, dry_run } => handle_lead_import(file, map, dry_run),
        },
        Commands::Lead { subcommand } => match subcommand {
            LeadCommands::Show { id, reveal, json } => handle_lead_show(id, reveal, json),
            LeadCommands::Task { id, args } => handle_lead_task(id, args),
            LeadCommands::Advance { id, yes } => handle_lead_advance(id, yes),
            LeadCommands::Override { id, stage, reason } => {
                handle_lead_override(id, stage.join(" "), reason.unwrap_or_default())
            }
            LeadCommands::Remark { id, text } => handle_lead_remark(id, text.join(" ")),
        },
        Commands::Stages { json } => handle_stages(json),
        Commands::Dashboard { json } => handle_dashboard(json),
        Commands::Reports { json } => handle_reports(json),
        Commands::Seed { demo } => handle_seed(demo),
    }
}

/// Load configuration and open the ledger it points at
fn open_ledger() -> Result<(Connection, Config)> {
    let config = Config::load().context("Failed to load configuration")?;
    let conn = DbConnection::connect_at(&config.data_location)
        .context("Failed to connect to database")?;
    Ok((conn, config))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Failed to serialize output")?);
    Ok(())
}

/// Read one line from stdin after printing a prompt to stderr
fn prompt_line(prompt: &str) -> Result<String> {
    eprint!("{}", prompt);
    std::io::stderr().flush()
        .map_err(|e| anyhow::anyhow!("Failed to flush stderr: {}", e))?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)
        .map_err(|e| anyhow::anyhow!("Failed to read input: {}", e))?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

/// Use the `--password` value, or ask for one. A terminal gets a prompt
/// with echo turned off; piped input is read as a plain line.
fn password_or_prompt(password: Option<String>) -> Result<String> {
    match password {
        Some(password) => Ok(password),
        None if std::io::stdin().is_terminal() => rpassword::prompt_password_stderr("Password: ")
            .context("Failed to read password"),
        None => prompt_line("Password: "),
    }
}

/// Counselors may only work on leads assigned to them
fn ensure_can_access(auth: &AuthContext, lead: &Lead) -> Result<()> {
    if auth.is_admin() || lead.counselor_id == Some(auth.user_id()) {
        Ok(())
    } else {
        Err(CrmError::NotAssigned(lead.id.unwrap_or_default()).into())
    }
}

fn parse_lead_id(id: &str) -> i64 {
    validate_lead_id(id).unwrap_or_else(|e| user_error(&e))
}

/// Resolve user input to a stage, suggesting the closest label on a miss
fn parse_stage(input: &str) -> Result<Stage, CrmError> {
    Stage::parse(input).ok_or_else(|| {
        let labels: Vec<&str> = Stage::ALL.iter().map(|s| s.label()).collect();
        CrmError::UnknownStage {
            input: input.trim().to_string(),
            suggestion: fuzzy::suggest(input, &labels),
        }
    })
}

fn handle_login(email: String, password: Option<String>) -> Result<()> {
    let (conn, config) = open_ledger()?;
    let password = password_or_prompt(password)?;
    let user = auth::login(&conn, &config, &email, &password)?;
    println!("Logged in as {} ({}).", user.name, user.role);
    Ok(())
}

fn handle_logout() -> Result<()> {
    let (conn, config) = open_ledger()?;
    if auth::logout(&conn, &config)? {
        println!("Logged out.");
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

fn handle_whoami(json: bool) -> Result<()> {
    let (conn, config) = open_ledger()?;
    let auth = require_session(&conn, &config)?;
    if json {
        return print_json(&auth.user);
    }
    println!("{} <{}> ({})", auth.user.name, auth.user.email, auth.role());
    Ok(())
}

fn handle_user_add(email: String, password: Option<String>, args: Vec<String>) -> Result<()> {
    let (conn, config) = open_ledger()?;

    // The first user bootstraps the ledger and must be an admin
    let bootstrap = UserRepo::count(&conn)? == 0;
    if !bootstrap {
        require_role(&conn, &config, Role::Admin)?;
    }

    let mut parsed = parse_field_args(args);
    let role = match parsed.take("role") {
        Some(value) => Role::from_str(&value).ok_or_else(|| CrmError::InvalidValue {
            field: "role".to_string(),
            value,
            allowed: vec!["admin", "counselor"],
        })?,
        None if bootstrap => Role::Admin,
        None => Role::Counselor,
    };
    if bootstrap && role != Role::Admin {
        return Err(CrmError::Validation(
            "The first user must be an admin. Add role=admin.".to_string(),
        ).into());
    }
    let phone = parsed.take("phone");
    if let Some((field, _)) = parsed.fields.first() {
        return Err(CrmError::UnknownField {
            field: field.clone(),
            suggestion: fuzzy::suggest(field, &["role", "phone"]),
        }.into());
    }
    let name = parsed.text();
    validate_non_empty(&name, "User name").unwrap_or_else(|e| user_error(&e));

    let password = password_or_prompt(password)?;
    let user = UserRepo::create(&conn, &email, &name, phone.as_deref(), role, &password)?;
    println!(
        "Created {} {} ({}).",
        user.role,
        user.name,
        user.email
    );
    Ok(())
}

fn handle_user_list(json: bool) -> Result<()> {
    let (conn, config) = open_ledger()?;
    require_role(&conn, &config, Role::Admin)?;
    let users = UserRepo::list(&conn)?;
    if json {
        return print_json(&users);
    }
    print!("{}", format_user_list(&users));
    Ok(())
}

fn handle_user_deactivate(email: String) -> Result<()> {
    let (conn, config) = open_ledger()?;
    let auth = require_role(&conn, &config, Role::Admin)?;
    if auth.user.email.eq_ignore_ascii_case(email.trim()) {
        return Err(CrmError::Validation("You cannot deactivate your own account".to_string()).into());
    }
    let user = UserRepo::deactivate(&conn, &email)?;
    println!("Deactivated {} ({}).", user.name, user.email);
    Ok(())
}

const LEAD_FIELDS: &[&str] = &["email", "phone", "country", "course", "source"];

fn handle_lead_add(args: Vec<String>) -> Result<()> {
    let (conn, config) = open_ledger()?;
    let auth = require_role(&conn, &config, Role::Admin)?;

    let mut parsed = parse_field_args(args);
    let new_lead = NewLead {
        email: parsed.take("email"),
        phone: parsed.take("phone"),
        country: parsed.take("country"),
        course: parsed.take("course"),
        source: parsed.take("source"),
        name: parsed.text(),
    };
    if let Some((field, _)) = parsed.fields.first() {
        return Err(CrmError::UnknownField {
            field: field.clone(),
            suggestion: fuzzy::suggest(field, LEAD_FIELDS),
        }.into());
    }
    validate_non_empty(&new_lead.name, "Lead name").unwrap_or_else(|e| user_error(&e));

    let lead = LeadRepo::create(&conn, &new_lead, auth.actor(), HistoryOrigin::System)?;
    println!("Created lead {}: {}", lead.id.unwrap_or_default(), lead.name);
    Ok(())
}

fn handle_lead_list(args: Vec<String>, json: bool) -> Result<()> {
    let (conn, config) = open_ledger()?;
    let auth = require_session(&conn, &config)?;

    let mut parsed = parse_field_args(args);
    let stage = parsed.take("stage").map(|s| parse_stage(&s)).transpose()?;
    if let Some((field, _)) = parsed.fields.first() {
        return Err(CrmError::UnknownField {
            field: field.clone(),
            suggestion: fuzzy::suggest(field, &["stage"]),
        }.into());
    }
    let search = parsed.text();

    let leads = if auth.is_admin() {
        LeadRepo::list_all(&conn)?
    } else {
        LeadRepo::list_by_counselor(&conn, auth.user_id())?
    };
    let leads: Vec<Lead> = leads
        .into_iter()
        .filter(|lead| stage.map_or(true, |s| lead.stage == s))
        .filter(|lead| lead.matches_search(&search))
        .collect();

    if json {
        return print_json(&leads);
    }
    let names: HashMap<i64, String> = UserRepo::list(&conn)?
        .into_iter()
        .filter_map(|u| u.id.map(|id| (id, u.name)))
        .collect();
    print!("{}", format_lead_list(&leads, &names));
    Ok(())
}

fn handle_lead_assign(ids: String, counselor: String) -> Result<()> {
    let (conn, config) = open_ledger()?;
    let auth = require_role(&conn, &config, Role::Admin)?;

    let lead_ids = parse_lead_id_list(&ids).unwrap_or_else(|e| user_error(&e));
    let counselor = UserRepo::find_assignee(&conn, &counselor)?
        .ok_or_else(|| CrmError::UserNotFound(counselor.trim().to_string()))?;

    let outcome = pipeline::bulk_assign(&conn, &lead_ids, &counselor, &auth.user)?;
    println!("{}", format_assign_outcome(&outcome, &counselor));
    Ok(())
}

fn handle_lead_import(file: PathBuf, map: Vec<String>, dry_run: bool) -> Result<()> {
    let (conn, config) = open_ledger()?;
    let auth = require_role(&conn, &config, Role::Admin)?;

    let overrides: Vec<(String, String)> = map
        .iter()
        .map(|m| match m.rsplit_once('=') {
            Some((column, field)) => (column.trim().to_string(), field.trim().to_string()),
            None => user_error(&format!("Invalid --map '{}'. Expected <column>=<field>.", m)),
        })
        .collect();

    let preview = import::preview_file(&file, &overrides)?;
    print!("{}", format_import_preview(&preview));
    if dry_run {
        println!("Dry run: nothing was imported.");
        return Ok(());
    }

    let leads = import::import_leads(&conn, &preview, auth.actor())?;
    println!("Imported {} lead(s).", leads.len());
    Ok(())
}

fn workspace_json(ws: &LeadWorkspace, reveal: Reveal) -> serde_json::Value {
    let applications: Vec<serde_json::Value> = ws
        .applications
        .iter()
        .enumerate()
        .map(|(i, app)| {
            let shown = match reveal {
                Reveal::All => true,
                Reveal::One(n) => n == i + 1,
                Reveal::None => false,
            };
            serde_json::json!({
                "id": app.id,
                "university_name": app.university_name,
                "url": app.url,
                "username": app.username,
                "password": app.password_display(shown),
                "created_ts": app.created_ts,
            })
        })
        .collect();

    serde_json::json!({
        "lead": ws.lead,
        "stage_position": ws.lead.stage.index() + 1,
        "stage_count": Stage::COUNT,
        "progress_percent": ws.lead.stage.progress_percent(),
        "counselor": ws.counselor,
        "manager": ws.manager,
        "history": ws.history,
        "tasks": ws.tasks,
        "remarks": ws.remarks,
        "applications": applications,
    })
}

fn handle_lead_show(id: String, reveal: Option<usize>, json: bool) -> Result<()> {
    let lead_id = parse_lead_id(&id);
    let (conn, config) = open_ledger()?;
    let auth = require_session(&conn, &config)?;

    let ws = LeadWorkspace::load(&conn, lead_id)?;
    ensure_can_access(&auth, &ws.lead)?;

    let reveal = match reveal {
        None => Reveal::None,
        Some(0) => Reveal::All,
        Some(n) => Reveal::One(n),
    };
    if reveal != Reveal::None {
        log::info!("{} revealed university credentials of lead {}", auth.user.email, lead_id);
    }

    if json {
        return print_json(&workspace_json(&ws, reveal));
    }
    print!("{}", format_lead_workspace(&ws, reveal));
    Ok(())
}

fn handle_lead_task(id: String, args: Vec<String>) -> Result<()> {
    let lead_id = parse_lead_id(&id);
    let parsed = parse_field_args_joined(args);
    if let Some(word) = parsed.words.first() {
        user_error(&format!(
            "Unexpected argument '{}'. Task details are given as field=value pairs, starting with type=<task type>.",
            word
        ));
    }

    let (conn, config) = open_ledger()?;
    let auth = require_session(&conn, &config)?;
    let lead = pipeline::load_lead(&conn, lead_id)?;
    ensure_can_access(&auth, &lead)?;

    let form = pipeline::build_task(&parsed.fields)?;
    let outcome = pipeline::record_task(&conn, lead_id, form, auth.actor())?;
    println!("{}", format_task_outcome(&outcome));
    Ok(())
}

fn handle_lead_advance(id: String, yes: bool) -> Result<()> {
    let lead_id = parse_lead_id(&id);
    let (conn, config) = open_ledger()?;
    let auth = require_session(&conn, &config)?;
    let lead = pipeline::load_lead(&conn, lead_id)?;
    ensure_can_access(&auth, &lead)?;

    let Some(next) = lead.stage.next() else {
        return Err(CrmError::AlreadyAtFinalStage { stage: lead.stage }.into());
    };
    if !yes {
        let answer = prompt_line(&format!(
            "Move lead {} from \"{}\" to \"{}\"? (y/n): ",
            lead_id, lead.stage, next
        ))?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let transition = pipeline::manual_advance(&conn, lead_id, auth.actor())?;
    println!("{}", format_transition(&transition));
    Ok(())
}

fn handle_lead_override(id: String, stage: String, reason: String) -> Result<()> {
    let lead_id = parse_lead_id(&id);
    let (conn, config) = open_ledger()?;
    let auth = require_role(&conn, &config, Role::Admin)?;

    let target = parse_stage(&stage)?;
    let transition = pipeline::admin_override(&conn, lead_id, target, &reason, auth.actor())?;
    println!("{}", format_transition(&transition));
    Ok(())
}

fn handle_lead_remark(id: String, text: String) -> Result<()> {
    let lead_id = parse_lead_id(&id);
    validate_non_empty(&text, "Remark").unwrap_or_else(|e| user_error(&e));
    let (conn, config) = open_ledger()?;
    let auth = require_session(&conn, &config)?;
    let lead = pipeline::load_lead(&conn, lead_id)?;
    ensure_can_access(&auth, &lead)?;

    pipeline::add_remark(&conn, lead_id, &text, auth.actor())?;
    println!("Added remark to lead {}.", lead_id);
    Ok(())
}

fn handle_stages(json: bool) -> Result<()> {
    if json {
        let stages: Vec<serde_json::Value> = Stage::ALL
            .iter()
            .map(|s| serde_json::json!({
                "index": s.index(),
                "label": s.label(),
                "phase": s.phase().label(),
                "converted": s.is_converted(),
            }))
            .collect();
        return print_json(&stages);
    }
    print!("{}", format_stage_list());
    Ok(())
}

fn handle_dashboard(json: bool) -> Result<()> {
    let (conn, config) = open_ledger()?;
    let auth = require_session(&conn, &config)?;
    let now = chrono::Utc::now().timestamp();

    if auth.is_admin() {
        let dashboard = report::admin_dashboard(&conn, now)?;
        if json {
            return print_json(&dashboard);
        }
        print!("{}", format_admin_dashboard(&dashboard));
    } else {
        let dashboard = report::counselor_dashboard(&conn, auth.user_id())?;
        if json {
            return print_json(&dashboard);
        }
        print!("{}", format_counselor_dashboard(&dashboard, auth.actor()));
    }
    Ok(())
}

fn handle_reports(json: bool) -> Result<()> {
    let (conn, config) = open_ledger()?;
    require_role(&conn, &config, Role::Admin)?;
    let report = report::build_report(&conn, chrono::Utc::now().timestamp())?;
    if json {
        return print_json(&report);
    }
    print!("{}", format_report(&report));
    Ok(())
}

fn handle_seed(demo: bool) -> Result<()> {
    if !demo {
        user_error("Nothing to seed. Use 'abroad seed --demo' to load demo data.");
    }
    let (conn, _config) = open_ledger()?;
    let summary = seed::seed_demo(&conn)?;
    println!(
        "Loaded {} users and {} leads. Log in with '{}' / '{}'.",
        summary.users,
        summary.leads,
        seed::DEMO_ADMIN_EMAIL,
        seed::DEMO_ADMIN_PASSWORD
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_stage_suggests() {
        assert_eq!(parse_stage("visa received").unwrap(), Stage::VisaReceived);
        assert_eq!(parse_stage("14").unwrap(), Stage::VisaReceived);
        match parse_stage("Visa Recieved") {
            Err(CrmError::UnknownStage { suggestion, .. }) => {
                assert_eq!(suggestion.as_deref(), Some("Visa Received"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_reveal_flag_forms() {
        let cli = Cli::try_parse_from(["abroad", "lead", "show", "3", "--reveal"]).unwrap();
        match cli.command {
            Commands::Lead { subcommand: LeadCommands::Show { reveal, .. } } => assert_eq!(reveal, Some(0)),
            _ => panic!("wrong command"),
        }
        let cli = Cli::try_parse_from(["abroad", "lead", "show", "3", "--reveal", "2"]).unwrap();
        match cli.command {
            Commands::Lead { subcommand: LeadCommands::Show { reveal, .. } } => assert_eq!(reveal, Some(2)),
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_override_reason_with_multiword_stage() {
        let cli = Cli::try_parse_from([
            "abroad", "lead", "override", "3", "Visa", "Received", "--reason", "docs verified",
        ]).unwrap();
        match cli.command {
            Commands::Lead { subcommand: LeadCommands::Override { stage, reason, .. } } => {
                assert_eq!(stage.join(" "), "Visa Received");
                assert_eq!(reason.as_deref(), Some("docs verified"));
            }
            _ => panic!("wrong command"),
        }
    }
}
