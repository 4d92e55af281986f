//! Minimal RFC 4180 reader: quoted fields, doubled quotes, embedded commas
//! and newlines, CRLF line endings. Blank records are dropped.

use crate::error::CrmError;

/// One parsed record with the line it started on
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub line: usize,
    pub fields: Vec<String>,
}

impl Record {
    fn is_blank(&self) -> bool {
        self.fields.iter().all(|f| f.trim().is_empty())
    }
}

pub fn parse(content: &str) -> Result<Vec<Record>, CrmError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                push_record(&mut records, record_line, std::mem::take(&mut fields));
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(CrmError::Import(format!(
            "unterminated quoted field starting on line {}",
            record_line
        )));
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        push_record(&mut records, record_line, fields);
    }
    Ok(records)
}

fn push_record(records: &mut Vec<Record>, line: usize, fields: Vec<String>) {
    let record = Record { line, fields };
    if !record.is_blank() {
        records.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(content: &str) -> Vec<Vec<String>> {
        parse(content).unwrap().into_iter().map(|r| r.fields).collect()
    }

    #[test]
    fn test_plain_rows() {
        let parsed = rows("Name,Email\nJohn Smith,john@email.com\n");
        assert_eq!(parsed, vec![vec!["Name", "Email"], vec!["John Smith", "john@email.com"]]);
    }

    #[test]
    fn test_quoted_fields() {
        let parsed = rows("name,note\n\"Smith, John\",\"said \"\"hi\"\"\"\r\n");
        assert_eq!(parsed[1], vec!["Smith, John", "said \"hi\""]);
    }

    #[test]
    fn test_embedded_newline_and_line_numbers() {
        let records = parse("name,note\n\"A\",\"two\nlines\"\n\nB,x").unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].fields[1], "two\nlines");
        assert_eq!(records[2].line, 5);
    }

    #[test]
    fn test_blank_lines_and_no_trailing_newline() {
        let parsed = rows("\n\nname\n , \nJohn");
        assert_eq!(parsed, vec![vec!["name"], vec!["John"]]);
    }

    #[test]
    fn test_unterminated_quote() {
        assert!(parse("name\n\"John").is_err());
    }
}
