//! Operator length strings such as `1d12h`, `90m` or `30s`.

/// Parse a `#d#h#m#s` length into seconds.
///
/// Components may appear in any combination (`2h30m`, `1d`, `45s`); each
/// component is a decimal count followed by one unit letter. Returns `None`
/// for empty, malformed, overflowing or zero-length input.
pub fn parse_length(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let mut total: i64 = 0;
    let mut digits = String::new();

    for c in s.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }

        let unit = match c.to_ascii_lowercase() {
            'd' => 86_400,
            'h' => 3_600,
            'm' => 60,
            's' => 1,
            _ => return None,
        };
        if digits.is_empty() {
            return None;
        }
        let count: i64 = digits.parse().ok()?;
        total = total.checked_add(count.checked_mul(unit)?)?;
        digits.clear();
    }

    // Trailing count without a unit
    if !digits.is_empty() || total == 0 {
        return None;
    }

    Some(total)
}
