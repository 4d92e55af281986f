// Argument parsing for `field=value` tokens

/// Words and `field=value` pairs from a trailing argument list
#[derive(Debug, Default, PartialEq)]
pub struct ParsedArgs {
    pub words: Vec<String>,
    pub fields: Vec<(String, String)>,
}

impl ParsedArgs {
    /// Free words joined with spaces
    pub fn text(&self) -> String {
        self.words.join(" ")
    }

    /// Remove and return a field by name (case-insensitive)
    pub fn take(&mut self, name: &str) -> Option<String> {
        let pos = self.fields.iter().position(|(k, _)| k.eq_ignore_ascii_case(name))?;
        Some(self.fields.remove(pos).1)
    }
}

/// A token is a field when it has a `=` and the part before it looks like a name
fn split_field_token(token: &str) -> Option<(String, String)> {
    let (field, value) = token.split_once('=')?;
    let looks_like_name = !field.is_empty()
        && field.chars().next().map_or(false, |c| c.is_ascii_alphabetic())
        && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
    looks_like_name.then(|| (field.to_string(), value.to_string()))
}

/// Split arguments into free words and `field=value` pairs.
/// Order between the two kinds is free; order within each kind is kept.
pub fn parse_field_args(args: Vec<String>) -> ParsedArgs {
    let mut parsed = ParsedArgs::default();
    for arg in args {
        match split_field_token(&arg) {
            Some(pair) => parsed.fields.push(pair),
            None => parsed.words.push(arg),
        }
    }
    parsed
}

/// Free-text fields: everything after them is part of the value, `=` included
const FREE_TEXT_FIELDS: &[&str] = &["remarks", "remark", "note"];

/// Like [`parse_field_args`], but a word that follows a field continues its
/// value, so `type=Meet Done` works without shell quoting. Words before the
/// first field stay free words. A free-text field such as `remarks=` takes
/// the rest of the arguments, so put it last.
pub fn parse_field_args_joined(args: Vec<String>) -> ParsedArgs {
    let mut parsed = ParsedArgs::default();
    let mut free_text = false;
    for arg in args {
        let pair = if free_text { None } else { split_field_token(&arg) };
        if let Some(pair) = pair {
            free_text = FREE_TEXT_FIELDS.iter().any(|f| pair.0.eq_ignore_ascii_case(f));
            parsed.fields.push(pair);
        } else if let Some((_, value)) = parsed.fields.last_mut() {
            if !value.is_empty() {
                value.push(' ');
            }
            value.push_str(&arg);
        } else {
            parsed.words.push(arg);
        }
    }
    parsed
}
