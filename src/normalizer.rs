// Price normalization: "50k", "1.5L", "Rs 50,000" -> integer amounts

/// Converts a textual amount with an optional magnitude suffix into an integer.
///
/// Magnitude markers are checked in a fixed order (`k`, then `l`/`lac`, then
/// `m`/`million`) and every hit overwrites the previous multiplier, so the
/// last matching marker wins. Returns `None` when no number can be read.
pub fn normalize_price(raw: &str) -> Option<u64> {
    let lower: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    let mut multiplier = 1.0;
    if lower.contains('k') {
        multiplier = 1_000.0;
    }
    if lower.contains('l') || lower.contains("lac") {
        multiplier = 100_000.0;
    }
    if lower.contains('m') || lower.contains("million") {
        multiplier = 1_000_000.0;
    }

    let digits: String = lower
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let value = leading_decimal(&digits)?;

    Some((value * multiplier).trunc() as u64)
}

/// Parses the longest leading `digits[.digits]` prefix, e.g. "1.2.3" -> 1.2.
fn leading_decimal(s: &str) -> Option<f64> {
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_digit = false;
    for (i, c) in s.char_indices() {
        match c {
            '0'..='9' => {
                seen_digit = true;
                end = i + 1;
            }
            '.' if !seen_dot => {
                seen_dot = true;
                end = i + 1;
            }
            _ => break,
        }
    }
    if !seen_digit {
        return None;
    }
    s[..end].parse::<f64>().ok()
}
