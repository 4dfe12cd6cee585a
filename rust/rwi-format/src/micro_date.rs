//! Day-granularity timestamps.
//!
//! A MicroDate is the number of whole days since the Unix epoch. Records store it
//! in two bytes, so stored values wrap modulo 65536.

pub const DAY_MILLIS: u64 = 86_400_000;

/// Whole days elapsed at `millis` since the epoch.
pub fn days(millis: u64) -> u64 {
    millis / DAY_MILLIS
}

/// Start of day `days` in milliseconds since the epoch.
pub fn millis(days: u64) -> u64 {
    days.saturating_mul(DAY_MILLIS)
}

/// Estimated end of freshness, in days.
///
/// A document that was `update - last_modified` days old when indexed is expected
/// to stay unchanged for as long again: `max(0, lm + (update - lm) * 2)`.
pub fn fresh_until(last_modified_days: u64, update_days: u64) -> u64 {
    let lm = last_modified_days as i64;
    let update = update_days as i64;
    lm.saturating_add(update.saturating_sub(lm).saturating_mul(2))
        .max(0) as u64
}
