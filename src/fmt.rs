fn group_thousands(int_part: &str) -> String {
    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

fn dollars(val: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, val.abs());
    let (int_part, dec_part) = match formatted.split_once('.') {
        Some((i, d)) => (i, Some(d)),
        None => (formatted.as_str(), None),
    };
    // Rounds to zero: no "-$0".
    let negative = val < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0');
    let sign = if negative { "-" } else { "" };
    match dec_part {
        Some(d) => format!("{sign}${}.{d}", group_thousands(int_part)),
        None => format!("{sign}${}", group_thousands(int_part)),
    }
}

/// Format a float as a dollar amount with thousands separators: $1,234.56
pub fn money(val: f64) -> String {
    dollars(val, 2)
}

/// Whole-dollar amount for KPI cards and summary tables: $1,235
pub fn money_whole(val: f64) -> String {
    dollars(val, 0)
}

/// Compact dollar amount for chart labels: $950, $12.5k, $3M
pub fn compact(val: f64) -> String {
    let sign = if val < 0.0 { "-" } else { "" };
    let abs = val.abs();
    let (scaled, suffix) = if abs >= 1_000_000.0 {
        (abs / 1_000_000.0, "M")
    } else if abs >= 1000.0 {
        (abs / 1000.0, "k")
    } else {
        return format!("{sign}${}", abs.round() as u64);
    };
    if scaled == scaled.floor() {
        format!("{sign}${}{suffix}", scaled as u64)
    } else {
        format!("{sign}${scaled:.1}{suffix}")
    }
}

/// Integer count with thousands separators: 12,345
pub fn count(val: u64) -> String {
    group_thousands(&val.to_string())
}

/// Percentage with one decimal: 42.5%
pub fn pct(val: f64) -> String {
    format!("{val:.1}%")
}

/// Signed percentage change, or a dash when there is nothing to compare.
pub fn change(val: Option<f64>) -> String {
    match val {
        Some(v) => format!("{v:+.1}%"),
        None => "—".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(1234.56), "$1,234.56");
        assert_eq!(money(-500.00), "-$500.00");
        assert_eq!(money(0.0), "$0.00");
        assert_eq!(money(1000000.99), "$1,000,000.99");
        assert_eq!(money(42.10), "$42.10");
    }

    #[test]
    fn test_money_whole_formatting() {
        assert_eq!(money_whole(1234.56), "$1,235");
        assert_eq!(money_whole(-25000.0), "-$25,000");
        assert_eq!(money_whole(-0.2), "$0");
        assert_eq!(money_whole(999.0), "$999");
    }

    #[test]
    fn test_compact_formatting() {
        assert_eq!(compact(950.4), "$950");
        assert_eq!(compact(12_500.0), "$12.5k");
        assert_eq!(compact(3_000_000.0), "$3M");
        assert_eq!(compact(-2_000.0), "-$2k");
    }

    #[test]
    fn test_count_and_pct() {
        assert_eq!(count(0), "0");
        assert_eq!(count(1234567), "1,234,567");
        assert_eq!(pct(42.456), "42.5%");
        assert_eq!(change(Some(12.34)), "+12.3%");
        assert_eq!(change(Some(-5.0)), "-5.0%");
        assert_eq!(change(None), "—");
    }
}
