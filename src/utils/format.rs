use chrono::{Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone};

pub const CURRENCY_CODE: &str = "USD";

/// Minor units to a display amount, e.g. `-12345` -> `-123.45 USD`
pub fn format_amount(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{}{}.{:02} {}", sign, abs / 100, abs % 100, CURRENCY_CODE)
}

/// Epoch milliseconds to local `YYYY-MM-DD HH:MM`
pub fn format_date(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.format("%Y-%m-%d %H:%M").to_string(),
        LocalResult::None => "????-??-?? ??:??".to_string(),
    }
}

/// Parse a local date or date-time into epoch milliseconds
///
/// Accepts `YYYY-MM-DDTHH:MM`, `YYYY-MM-DD HH:MM` (optionally with `:SS`) and a bare `YYYY-MM-DD` (midnight).
pub fn parse_local_timestamp(input: &str) -> Option<i64> {
    let input = input.trim();
    const DATE_TIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
    ];

    let naive = DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Some(dt.timestamp_millis()),
        LocalResult::None => None,
    }
}

/// Parse a decimal amount such as `123.45` or `-7` into minor units
///
/// More than two decimal places is rejected rather than rounded.
pub fn parse_amount(input: &str) -> Option<i64> {
    let input = input.trim();
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };

    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (digits, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if fraction.len() > 2 || !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let cents: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        _ => fraction.parse().ok()?,
    };

    let minor = whole.checked_mul(100)?.checked_add(cents)?;
    Some(if negative { -minor } else { minor })
}
