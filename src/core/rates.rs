use std::cmp::Ordering;

use tracing::debug;

use super::types::{JurisdictionRate, RateLookup};

const fn entry(code: &'static str, display_name: &'static str, rate: f64) -> JurisdictionRate {
    JurisdictionRate {
        code,
        display_name,
        top_marginal_rate: rate,
    }
}

/// Approximate top marginal state capital gains rates for 2024/2025, in percent.
static JURISDICTIONS: [JurisdictionRate; 51] = [
    entry("AL", "Alabama", 5.0),
    entry("AK", "Alaska", 0.0),
    entry("AZ", "Arizona", 2.5),
    entry("AR", "Arkansas", 4.4),
    entry("CA", "California", 13.3),
    entry("CO", "Colorado", 4.4),
    entry("CT", "Connecticut", 6.99),
    entry("DE", "Delaware", 6.6),
    entry("DC", "District of Columbia", 8.95),
    entry("FL", "Florida", 0.0),
    entry("GA", "Georgia", 5.75),
    entry("HI", "Hawaii", 7.25),
    entry("ID", "Idaho", 5.8),
    entry("IL", "Illinois", 4.95),
    entry("IN", "Indiana", 3.23),
    entry("IA", "Iowa", 6.0),
    entry("KS", "Kansas", 5.7),
    entry("KY", "Kentucky", 4.0),
    entry("LA", "Louisiana", 4.25),
    entry("ME", "Maine", 7.15),
    entry("MD", "Maryland", 5.75),
    // includes the 4% millionaire surtax
    entry("MA", "Massachusetts", 9.0),
    entry("MI", "Michigan", 4.25),
    entry("MN", "Minnesota", 9.85),
    entry("MS", "Mississippi", 5.0),
    entry("MO", "Missouri", 5.4),
    entry("MT", "Montana", 6.75),
    entry("NE", "Nebraska", 5.84),
    entry("NV", "Nevada", 0.0),
    entry("NH", "New Hampshire", 0.0),
    entry("NJ", "New Jersey", 10.75),
    entry("NM", "New Mexico", 5.9),
    entry("NY", "New York", 10.9),
    entry("NC", "North Carolina", 4.5),
    entry("ND", "North Dakota", 2.9),
    entry("OH", "Ohio", 3.5),
    entry("OK", "Oklahoma", 4.75),
    entry("OR", "Oregon", 9.9),
    entry("PA", "Pennsylvania", 3.07),
    entry("RI", "Rhode Island", 5.99),
    entry("SC", "South Carolina", 6.4),
    entry("SD", "South Dakota", 0.0),
    entry("TN", "Tennessee", 0.0),
    entry("TX", "Texas", 0.0),
    entry("UT", "Utah", 4.65),
    entry("VT", "Vermont", 8.75),
    entry("VA", "Virginia", 5.75),
    // capital gains excise above $250k
    entry("WA", "Washington", 7.0),
    entry("WV", "West Virginia", 6.5),
    entry("WI", "Wisconsin", 7.65),
    entry("WY", "Wyoming", 0.0),
];

pub fn all_jurisdictions() -> &'static [JurisdictionRate] {
    &JURISDICTIONS
}

fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

pub fn lookup(code: &str) -> Option<&'static JurisdictionRate> {
    let code = normalize_code(code);
    JURISDICTIONS.iter().find(|j| j.code == code)
}

/// Resolves a code to its rate. Unknown codes are not an error: they carry no
/// additional state tax.
pub fn lookup_rate(code: &str) -> RateLookup {
    match lookup(code) {
        Some(j) => RateLookup {
            code: j.code.to_string(),
            display_name: j.display_name.to_string(),
            rate: j.top_marginal_rate,
            known: true,
        },
        None => {
            let code = normalize_code(code);
            debug!(code = %code, "unknown jurisdiction, using zero state rate");
            RateLookup {
                display_name: code.clone(),
                code,
                rate: 0.0,
                known: false,
            }
        }
    }
}

/// Every jurisdiction ordered by display name, for selection lists.
pub fn list_sorted() -> Vec<JurisdictionRate> {
    sorted_by_display_name(JURISDICTIONS.iter().copied())
}

fn sorted_by_display_name(
    rates: impl IntoIterator<Item = JurisdictionRate>,
) -> Vec<JurisdictionRate> {
    let mut rates: Vec<JurisdictionRate> = rates.into_iter().collect();
    rates.sort_by(|a, b| {
        compare_display_names(a.display_name, b.display_name).then(a.code.cmp(b.code))
    });
    rates
}

// Case-insensitive like a collating comparison; the case-sensitive tiebreak
// keeps the order total.
fn compare_display_names(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}
