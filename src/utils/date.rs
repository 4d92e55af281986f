// Timestamp formatting and month bucketing for reports

use chrono::{DateTime, Datelike, Local, TimeZone};

/// Calendar month as (year, month 1-12)
pub type MonthKey = (i32, u32);

fn to_local(ts: i64) -> Option<DateTime<Local>> {
    Local.timestamp_opt(ts, 0).single()
}

/// Format a Unix timestamp as a local date (YYYY-MM-DD)
pub fn format_date(ts: i64) -> String {
    to_local(ts)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Format a Unix timestamp as local date and time (YYYY-MM-DD HH:MM)
pub fn format_datetime(ts: i64) -> String {
    to_local(ts)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Local calendar month a timestamp falls in
pub fn month_of(ts: i64) -> Option<MonthKey> {
    to_local(ts).map(|dt| (dt.year(), dt.month()))
}

/// The `n` calendar months ending with the month of `now`, oldest first
pub fn last_n_months(now: i64, n: usize) -> Vec<MonthKey> {
    let Some((mut year, mut month)) = month_of(now) else {
        return Vec::new();
    };
    let mut months = Vec::with_capacity(n);
    for _ in 0..n {
        months.push((year, month));
        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }
    months.reverse();
    months
}

/// Short label such as "Jan 2026"
pub fn month_label((year, month): MonthKey) -> String {
    const NAMES: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun",
        "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    let name = NAMES.get(month.saturating_sub(1) as usize).copied().unwrap_or("???");
    format!("{} {}", name, year)
}
