/// Whole-dollar US currency, e.g. `$5,348,055` or `-$1,200`.
///
/// Rounds half away from zero. Values that round to zero never carry a sign.
/// Digits come from the `f64` itself, so magnitudes beyond any integer type
/// are printed in full. Non-finite values render as `n/a`.
pub fn format_usd(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let dollars = value.abs().round();
    let sign = if value < 0.0 && dollars > 0.0 { "-" } else { "" };
    format!("{sign}${}", group_thousands(&format!("{dollars:.0}")))
}

/// Percent with two decimals, as the rate badge shows it (`13.30%`).
pub fn format_rate_pct(rate_pct: f64) -> String {
    format!("{rate_pct:.2}%")
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_whole_dollars_with_separators() {
        assert_eq!(format_usd(0.0), "$0");
        assert_eq!(format_usd(999.0), "$999");
        assert_eq!(format_usd(1_000.0), "$1,000");
        assert_eq!(format_usd(1_669_500.0), "$1,669,500");
        assert_eq!(format_usd(5_348_055.207_411_413), "$5,348,055");
        assert_eq!(format_usd(123_456_789.0), "$123,456,789");
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(format_usd(0.5), "$1");
        assert_eq!(format_usd(2_680_852.5), "$2,680,853");
        assert_eq!(format_usd(1_499.49), "$1,499");
        assert_eq!(format_usd(-1_200.5), "-$1,201");
    }

    #[test]
    fn negative_values_and_negative_zero() {
        assert_eq!(format_usd(-12.0), "-$12");
        assert_eq!(format_usd(-0.4), "$0");
        assert_eq!(format_usd(-0.0), "$0");
    }

    #[test]
    fn non_finite_values_are_not_shown_as_amounts() {
        assert_eq!(format_usd(f64::NAN), "n/a");
        assert_eq!(format_usd(f64::INFINITY), "n/a");
        assert_eq!(format_usd(f64::NEG_INFINITY), "n/a");
    }

    #[test]
    fn amounts_beyond_u64_keep_every_digit() {
        assert_eq!(format_usd(1e20), "$100,000,000,000,000,000,000");
        let huge = format_usd(u64::MAX as f64 * 4.0);
        assert_eq!(huge, "$73,786,976,294,838,206,464");
        assert_eq!(format_usd(-1e21), "-$1,000,000,000,000,000,000,000");
    }

    #[test]
    fn rate_badge_uses_two_decimals() {
        assert_eq!(format_rate_pct(13.3), "13.30%");
        assert_eq!(format_rate_pct(0.0), "0.00%");
        assert_eq!(format_rate_pct(6.99), "6.99%");
    }
}
