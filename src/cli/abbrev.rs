// Command abbreviation matching for the abroad CLI

/// Find all commands that start with the given prefix (case-insensitive)
pub fn find_matching_commands<'a>(prefix: &str, commands: &'a [&str]) -> Vec<&'a str> {
    let prefix_lower = prefix.to_lowercase();
    commands.iter()
        .filter(|cmd| cmd.to_lowercase().starts_with(&prefix_lower))
        .copied()
        .collect()
}

/// Find a unique command match for the given prefix.
/// An exact match wins over prefix matches ("lead" is not ambiguous with "leads").
pub fn find_unique_command<'a>(prefix: &str, commands: &'a [&str]) -> Result<&'a str, Vec<&'a str>> {
    let prefix_lower = prefix.to_lowercase();
    if let Some(cmd) = commands.iter().find(|cmd| cmd.to_lowercase() == prefix_lower) {
        return Ok(*cmd);
    }

    let matches = find_matching_commands(prefix, commands);
    match matches.len() {
        1 => Ok(matches[0]),
        _ => Err(matches),
    }
}

/// Top-level commands
pub const TOP_LEVEL_COMMANDS: &[&str] = &[
    "login", "logout", "whoami", "users", "leads", "lead", "stages", "dashboard", "reports", "seed",
];

/// User directory subcommands
pub const USERS_COMMANDS: &[&str] = &["add", "list", "deactivate"];

/// Lead list subcommands
pub const LEADS_COMMANDS: &[&str] = &["add", "list", "assign", "import"];

/// Single-lead subcommands (also usable as `<id> <subcommand>`)
pub const LEAD_COMMANDS: &[&str] = &["show", "task", "advance", "override", "remark"];

/// Get subcommands for a given top-level command
pub fn get_subcommands(command: &str) -> Option<&'static [&'static str]> {
    match command {
        "users" => Some(USERS_COMMANDS),
        "leads" => Some(LEADS_COMMANDS),
        "lead" => Some(LEAD_COMMANDS),
        _ => None,
    }
}

fn ambiguity(kind: &str, arg: &str, matches: &[&str]) -> String {
    format!("Ambiguous {} '{}'. Did you mean one of: {}?", kind, arg, matches.join(", "))
}

/// Expand command abbreviations in an argument list.
///
/// `<id>` alone becomes `lead show <id>`, and `<id> <subcommand>` becomes
/// `lead <subcommand> <id>`.
pub fn expand_command_abbreviations(args: Vec<String>) -> Result<Vec<String>, String> {
    let Some(first) = args.first() else {
        return Ok(args);
    };

    if first.parse::<i64>().is_ok() {
        let id = first.clone();
        let mut expanded = vec!["lead".to_string()];
        match args.get(1) {
            None => {
                expanded.push("show".to_string());
                expanded.push(id);
            }
            Some(next) if !next.starts_with('-') => match find_unique_command(next, LEAD_COMMANDS) {
                Ok(sub) => {
                    expanded.push(sub.to_string());
                    expanded.push(id);
                    expanded.extend(args.iter().skip(2).cloned());
                }
                Err(matches) if matches.is_empty() => return Ok(args),
                Err(matches) => return Err(ambiguity("lead subcommand", next, &matches)),
            },
            Some(_) => {
                expanded.push("show".to_string());
                expanded.extend(args.iter().cloned());
            }
        }
        return Ok(expanded);
    }

    if first.starts_with('-') {
        return Ok(args);
    }

    let command = match find_unique_command(first, TOP_LEVEL_COMMANDS) {
        Ok(cmd) => cmd,
        // Unknown: let clap report it
        Err(matches) if matches.is_empty() => return Ok(args),
        Err(matches) => return Err(ambiguity("command", first, &matches)),
    };

    let mut expanded = vec![command.to_string()];
    let mut rest = args.into_iter().skip(1);

    if let Some(subcommands) = get_subcommands(command) {
        if let Some(next) = rest.next() {
            if next.starts_with('-') || next.parse::<i64>().is_ok() {
                expanded.push(next);
            } else {
                match find_unique_command(&next, subcommands) {
                    Ok(sub) => expanded.push(sub.to_string()),
                    Err(matches) if matches.is_empty() => expanded.push(next),
                    Err(matches) => return Err(ambiguity("subcommand", &next, &matches)),
                }
            }
        }
    }

    expanded.extend(rest);
    Ok(expanded)
}
