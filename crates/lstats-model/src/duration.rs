//! Human-readable rendering of second counts

/// Render seconds as decimal hours, truncated to hundredths
///
/// `7200 -> "2.00h"`, `5400 -> "1.50h"`, `59 -> "0.01h"`.
#[must_use]
pub fn format_hours(total_seconds: u64) -> String {
    let centi_hours = total_seconds / 36;
    format!("{}.{:02}h", centi_hours / 100, centi_hours % 100)
}
