//! Spanish long-form publication dates ("1 de mayo de 2024").

use chrono::{DateTime, Datelike, NaiveDate};

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Format `YYYY-MM-DD` or an RFC 3339 timestamp as a Spanish long date.
///
/// Anything unparseable yields an empty string.
pub fn format_long_date(input: &str) -> String {
    match parse_date(input) {
        Some(date) => format!(
            "{} de {} de {}",
            date.day(),
            MONTHS[date.month0() as usize],
            date.year()
        ),
        None => {
            if !input.trim().is_empty() {
                log::debug!("Unparseable publication date {input:?}; leaving it blank");
            }
            String::new()
        }
    }
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    // The calendar date as written, not shifted to another zone.
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}
