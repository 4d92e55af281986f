// Error handling utilities for consistent error messages and exit codes

use std::process;

/// Exit with a user error (exit code 1)
/// User errors are for invalid input, missing resources, refused commands.
pub fn user_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Validate that a lead ID is a positive integer
pub fn validate_lead_id(id_str: &str) -> Result<i64, String> {
    id_str.trim().parse::<i64>()
        .map_err(|_| format!("Invalid lead ID: '{}'. Lead ID must be a number.", id_str))
        .and_then(|id| {
            if id > 0 {
                Ok(id)
            } else {
                Err(format!("Invalid lead ID: {}. Lead ID must be positive.", id))
            }
        })
}

/// Most lead IDs a single list may name
pub const MAX_LEAD_ID_LIST: i64 = 10_000;

/// Parse a lead ID list: "1,3,5-7"
pub fn parse_lead_id_list(input: &str) -> Result<Vec<i64>, String> {
    let mut ids = Vec::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some((start, end)) = part.split_once('-') {
            let start = validate_lead_id(start)?;
            let end = validate_lead_id(end)?;
            if start > end {
                return Err(format!("Invalid lead ID range: '{}'. Start must not exceed end.", part));
            }
            if end - start >= MAX_LEAD_ID_LIST - ids.len() as i64 {
                return Err(format!(
                    "Lead ID range '{}' is too large. At most {} lead IDs may be given at once.",
                    part, MAX_LEAD_ID_LIST
                ));
            }
            ids.extend(start..=end);
        } else {
            if ids.len() as i64 >= MAX_LEAD_ID_LIST {
                return Err(format!("Too many lead IDs. At most {} may be given at once.", MAX_LEAD_ID_LIST));
            }
            ids.push(validate_lead_id(part)?);
        }
    }
    if ids.is_empty() {
        return Err("No lead IDs given".to_string());
    }
    ids.dedup();
    Ok(ids)
}

/// Validate that a string is not empty
pub fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_non_empty() {
        assert!(validate_non_empty("test", "field").is_ok());
        assert!(validate_non_empty("   ", "field").is_err());
    }

    #[test]
    fn test_validate_lead_id() {
        assert_eq!(validate_lead_id("1"), Ok(1));
        assert_eq!(validate_lead_id("42"), Ok(42));
        assert!(validate_lead_id("0").is_err());
        assert!(validate_lead_id("-1").is_err());
        assert!(validate_lead_id("abc").is_err());
    }

    #[test]
    fn test_parse_lead_id_list() {
        assert_eq!(parse_lead_id_list("1,3,5-7"), Ok(vec![1, 3, 5, 6, 7]));
        assert_eq!(parse_lead_id_list("4"), Ok(vec![4]));
        assert!(parse_lead_id_list("7-5").is_err());
        assert!(parse_lead_id_list(",").is_err());
        assert!(parse_lead_id_list("1,x").is_err());
    }

    #[test]
    fn test_lead_id_range_is_capped() {
        assert_eq!(parse_lead_id_list("1-10000").map(|ids| ids.len()), Ok(10_000));
        assert!(parse_lead_id_list("1-10001").is_err());
        assert!(parse_lead_id_list("1-20000000").is_err());
        assert!(parse_lead_id_list("1-9223372036854775807").is_err());
        assert!(parse_lead_id_list("1-10000,20000").is_err());
    }
}
