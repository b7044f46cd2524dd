//! Display formatting for metric values and derived labels.

/// Two decimals with thousands separators, e.g. `1,234,567.50`
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{}.{frac_part}", group_thousands(int_part))
}

/// Plain integer rendering used for counts
pub fn format_count(value: i64) -> String {
    value.to_string()
}

/// Chart/table label for a calendar month: `YYYY-MM`
pub fn year_month(year: i64, month: i64) -> String {
    format!("{year}-{month:02}")
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
