/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parse a numeric cell as exported by a spreadsheet: `"1,204"`, `"12.0"`, `" 7 "`.
/// Returns `None` for blanks and anything non-numeric.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = clean_str(raw).replace(',', "");
    let s = s.trim_end_matches('%').trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a case-count cell. Blank → `Some(0)`; negative, fractional or
/// non-numeric → `None`.
pub fn parse_count(raw: &str) -> Option<u64> {
    if clean_str(raw).is_empty() {
        return Some(0);
    }
    let v = parse_number(raw)?;
    if v < 0.0 || v.fract() != 0.0 {
        return None;
    }
    Some(v as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_quotes_and_whitespace() {
        assert_eq!(clean_str("  \" MRSA \" "), "MRSA");
        assert_eq!(clean_str("\""), "\"");
        assert_eq!(clean_str("Total"), "Total");
    }

    #[test]
    fn parses_spreadsheet_numbers() {
        assert_eq!(parse_number("1,204"), Some(1204.0));
        assert_eq!(parse_number("12.5%"), Some(12.5));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
    }

    #[test]
    fn parses_counts() {
        assert_eq!(parse_count("12.0"), Some(12));
        assert_eq!(parse_count(" "), Some(0));
        assert_eq!(parse_count("-3"), None);
        assert_eq!(parse_count("2.5"), None);
        assert_eq!(parse_count("abc"), None);
    }
}
