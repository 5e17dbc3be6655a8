use chrono::{Duration, NaiveDate};

const YEAR_FIRST_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const DAY_FIRST_FORMATS: &[&str] = &["%d-%b-%Y"];

/// Parses a calendar date leniently. Any time-of-day suffix is dropped;
/// anything unrecognised yields `None` instead of an error.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let date_part = trimmed.split_whitespace().next().unwrap_or(trimmed);
    parse_date_token(date_part).or_else(|| {
        let (head, _) = date_part.split_once('T')?;
        parse_date_token(head)
    })
}

fn parse_date_token(token: &str) -> Option<NaiveDate> {
    // chrono's %Y accepts short years, so year-first formats need a
    // four-digit lead or "01/02/24" would read as year 1.
    let leading_digits = token.chars().take_while(char::is_ascii_digit).count();
    let formats = if leading_digits == 4 {
        YEAR_FIRST_FORMATS
    } else {
        DAY_FIRST_FORMATS
    };
    for format in formats {
        if let Ok(date) = NaiveDate::parse_from_str(token, format) {
            return Some(date);
        }
    }
    if leading_digits == 4 {
        return None;
    }

    // US month/day/year, with either a two- or four-digit year.
    let parts: Vec<&str> = token.split('/').collect();
    let format = match parts.as_slice() {
        [_, _, year] if year.len() == 2 => "%m/%d/%y",
        [_, _, year] if year.len() == 4 => "%m/%d/%Y",
        _ => return None,
    };
    NaiveDate::parse_from_str(token, format).ok()
}

/// Converts a spreadsheet serial day number (1900 date system) to a date.
pub fn from_excel_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_supported_formats() {
        assert_eq!(parse_date("2024-01-02"), Some(ymd(2024, 1, 2)));
        assert_eq!(parse_date("2024/01/02"), Some(ymd(2024, 1, 2)));
        assert_eq!(parse_date("1/2/2024"), Some(ymd(2024, 1, 2)));
        assert_eq!(parse_date("01/02/24"), Some(ymd(2024, 1, 2)));
        assert_eq!(parse_date("02-Jan-2024"), Some(ymd(2024, 1, 2)));
    }

    #[test]
    fn truncates_time_of_day() {
        assert_eq!(parse_date("2024-02-01 17:45:00"), Some(ymd(2024, 2, 1)));
        assert_eq!(parse_date("2024-02-01T08:00:00"), Some(ymd(2024, 2, 1)));
        assert_eq!(parse_date("  2/1/2024 9:15 AM "), Some(ymd(2024, 2, 1)));
    }

    #[test]
    fn rejects_garbage_without_error() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("Total"), None);
        assert_eq!(parse_date("2024-13-40"), None);
        assert_eq!(parse_date("1/2/124"), None);
    }

    #[test]
    fn converts_excel_serials() {
        assert_eq!(from_excel_serial(45292.0), Some(ymd(2024, 1, 1)));
        assert_eq!(from_excel_serial(45292.75), Some(ymd(2024, 1, 1)));
        assert_eq!(from_excel_serial(0.0), None);
        assert_eq!(from_excel_serial(f64::NAN), None);
    }
}
