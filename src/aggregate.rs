//! Overall CGPA derived from a ledger.

use crate::ledger::Ledger;

/// Arithmetic mean of every entry, rounded to two decimals. An empty ledger
/// is a normal input and yields `0.0`.
pub fn overall(ledger: &Ledger) -> f64 {
    if ledger.is_empty() {
        return 0.0;
    }
    let sum: f64 = ledger.iter_unordered().map(|entry| entry.cgpa.value()).sum();
    round2(sum / ledger.len() as f64)
}

/// Two-decimal rendering used by the view, CSV export and CLI listings.
pub fn format_cgpa(value: f64) -> String {
    format!("{value:.2}")
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
