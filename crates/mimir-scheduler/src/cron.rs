//! Standard 5-field cron grammar (§6): `minute hour day-of-month month
//! day-of-week`, each field a `*`, a `*/n` step, an `a-b` range, or an
//! `a,b,c` list (and combinations of those joined by commas).
//!
//! Day-of-month and day-of-week are combined with simple AND semantics
//! here rather than cron's traditional "OR when both are restricted"
//! special case — every job this system schedules restricts at most one
//! of the two, so the simpler rule never diverges from the traditional one
//! in practice and is much easier to reason about.

use mimir_domain::DomainError;

#[derive(Debug, Clone)]
pub struct CronSchedule {
    minute: Vec<u32>,
    hour: Vec<u32>,
    day_of_month: Vec<u32>,
    month: Vec<u32>,
    day_of_week: Vec<u32>,
}

fn parse_field(token: &str, min: u32, max: u32) -> Result<Vec<u32>, DomainError> {
    let mut values = Vec::new();
    for part in token.split(',') {
        if part == "*" {
            values.extend(min..=max);
        } else if let Some(step_str) = part.strip_prefix("*/") {
            let step: u32 = step_str.parse().map_err(|_| DomainError::validation(format!("bad cron step {part}")))?;
            if step == 0 {
                return Err(DomainError::validation(format!("cron step cannot be zero: {part}")));
            }
            let mut v = min;
            while v <= max {
                values.push(v);
                v += step;
            }
        } else if let Some((lo, hi)) = part.split_once('-') {
            let lo: u32 = lo.parse().map_err(|_| DomainError::validation(format!("bad cron range {part}")))?;
            let hi: u32 = hi.parse().map_err(|_| DomainError::validation(format!("bad cron range {part}")))?;
            if lo > hi {
                return Err(DomainError::validation(format!("cron range reversed: {part}")));
            }
            values.extend(lo..=hi);
        } else {
            let v: u32 = part.parse().map_err(|_| DomainError::validation(format!("bad cron value {part}")))?;
            values.push(v);
        }
    }
    if values.iter().any(|v| *v < min || *v > max) {
        return Err(DomainError::validation(format!("cron field {token} out of range [{min},{max}]")));
    }
    if values.is_empty() {
        return Err(DomainError::validation(format!("cron field {token} matched nothing")));
    }
    values.sort_unstable();
    values.dedup();
    Ok(values)
}

/// Upper bound on how far forward `next_after` will scan before giving up
/// (roughly two years of minutes) — guards against expressions that can
/// never match, e.g. `0 0 30 2 *`.
const MAX_SCAN_MINUTES: i64 = 2 * 366 * 24 * 60;

impl CronSchedule {
    pub fn parse(expr: &str) -> Result<Self, DomainError> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(DomainError::validation(format!("cron expression must have 5 fields, got {}: {expr}", fields.len())));
        }
        Ok(Self {
            minute: parse_field(fields[0], 0, 59)?,
            hour: parse_field(fields[1], 0, 23)?,
            day_of_month: parse_field(fields[2], 1, 31)?,
            month: parse_field(fields[3], 1, 12)?,
            day_of_week: parse_field(fields[4], 0, 6)?,
        })
    }

    fn matches(&self, dt: &chrono::DateTime<chrono::Utc>) -> bool {
        use chrono::{Datelike, Timelike};
        self.minute.binary_search(&dt.minute()).is_ok()
            && self.hour.binary_search(&dt.hour()).is_ok()
            && self.day_of_month.binary_search(&dt.day()).is_ok()
            && self.month.binary_search(&dt.month()).is_ok()
            && self.day_of_week.binary_search(&(dt.weekday().num_days_from_sunday())).is_ok()
    }

    /// The first matching minute strictly after `from`, truncated to
    /// whole-minute granularity. `None` if no match turns up within
    /// `MAX_SCAN_MINUTES`.
    pub fn next_after(&self, from: chrono::DateTime<chrono::Utc>) -> Option<chrono::DateTime<chrono::Utc>> {
        use chrono::Duration;
        let start = truncate_to_minute(from) + Duration::minutes(1);
        let mut candidate = start;
        for _ in 0..MAX_SCAN_MINUTES {
            if self.matches(&candidate) {
                return Some(candidate);
            }
            candidate += Duration::minutes(1);
        }
        None
    }
}

fn truncate_to_minute(dt: chrono::DateTime<chrono::Utc>) -> chrono::DateTime<chrono::Utc> {
    dt - chrono::Duration::seconds(dt.timestamp() % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn every_minute_matches_everything() {
        let schedule = CronSchedule::parse("* * * * *").unwrap();
        let now = chrono::Utc.with_ymd_and_hms(2026, 7, 26, 10, 30, 0).unwrap();
        let next = schedule.next_after(now).unwrap();
        assert_eq!(next, now + chrono::Duration::minutes(1));
    }

    #[test]
    fn step_field_is_honored() {
        let schedule = CronSchedule::parse("*/15 * * * *").unwrap();
        let now = chrono::Utc.with_ymd_and_hms(2026, 7, 26, 10, 1, 0).unwrap();
        let next = schedule.next_after(now).unwrap();
        assert_eq!(next.minute(), 15);
    }

    #[test]
    fn invalid_field_count_is_rejected() {
        assert!(CronSchedule::parse("* * * *").is_err());
    }

    #[test]
    fn out_of_range_value_is_rejected() {
        assert!(CronSchedule::parse("60 * * * *").is_err());
    }
}
