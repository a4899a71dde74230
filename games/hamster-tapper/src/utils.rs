//! Small helpers shared by the tapper modules.

/// Renders coins with `.`-grouped thousands: `1234567` -> `1.234.567`.
pub fn format_coins(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}

/// Like [`format_coins`] but always signed: `+1.500`, `-200`, `+0`.
pub fn format_delta(value: i64) -> String {
    if value < 0 {
        format_coins(value)
    } else {
        format!("+{}", format_coins(value))
    }
}
