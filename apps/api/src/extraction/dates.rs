use chrono::NaiveDate;

/// Normalizes the loose date strings found in resumes to calendar dates.
///
/// Accepted forms:
/// - `"2020"` → 2020-01-01 (year-only is lossy by convention)
/// - `"03-2020"` → 2020-03-01
/// - `"2020-03"` → 2020-03-01
/// - `"2020-03-15"` → 2020-03-15
/// - `""`, `"-"`, `"—"`, `"–"` and anything unparseable → `None`
///
/// An unparseable string never silently becomes a default date.
pub fn normalize_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() || matches!(value, "-" | "—" | "–") {
        return None;
    }

    // Year only
    if value.len() == 4 && value.chars().all(|c| c.is_ascii_digit()) {
        let year = value.parse::<i32>().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }

    let parts: Vec<&str> = value.split('-').collect();
    match parts.len() {
        // "MM-YYYY" or "YYYY-MM" → first of month
        2 => {
            let (year, month) = if parts[0].len() <= 2 {
                (parts[1], parts[0])
            } else if parts[0].len() == 4 {
                (parts[0], parts[1])
            } else {
                return None;
            };
            let year = year.parse::<i32>().ok()?;
            let month = month.parse::<u32>().ok()?;
            NaiveDate::from_ymd_opt(year, month, 1)
        }
        // Full "YYYY-MM-DD"
        3 => NaiveDate::parse_from_str(value, "%Y-%m-%d").ok(),
        _ => None,
    }
}
