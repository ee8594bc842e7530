//! Scope engine: which records are visible under the active filters.
//!
//! Three rules, one per panel:
//! - tasks: exact date match against today
//! - appointments: upcoming window with a configurable grace period
//! - activity: user filter, then time window, order-stable
//!
//! Parse failures never abort a cycle. Appointments that won't parse get
//! a far-future sentinel (sort last, drop from bounded views); activity
//! timestamps that won't parse stay in scope. The two policies differ on
//! purpose: a ghost appointment at the top of the list is misleading,
//! a ghost activity line at most adds noise.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::types::{ActivityEntry, Appointment, RangeMode, Scope, Task, UserFilter};

/// Sort key for appointments whose date/time fields won't parse.
pub const FAR_FUTURE: NaiveDateTime = NaiveDateTime::MAX;

const WEEK_WINDOW_DAYS: i64 = 7;

// ============================================================================
// Parsing
// ============================================================================

/// Strict parse of an appointment's date + time. "2024-13-40" and "99:99"
/// both fail here rather than wrapping around.
pub fn parse_appointment_when(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time, "%H:%M").ok()?;
    Some(date.and_time(time))
}

/// The appointment's point in time, or the far-future sentinel.
pub fn appointment_when(appointment: &Appointment) -> NaiveDateTime {
    parse_appointment_when(&appointment.date, &appointment.time).unwrap_or(FAR_FUTURE)
}

/// Parse an activity timestamp. Accepts the canonical "YYYY-MM-DD HH:MM:SS"
/// and the ISO "T" separator some older entries carry.
pub fn parse_activity_ts(ts: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

// ============================================================================
// Visibility rules
// ============================================================================

/// Daily checklist rule: visible iff the task's date string equals today's
/// ISO date exactly. The user filter is intentionally not applied: tasks
/// carry no owner field yet, so the visible set is the same for every
/// viewer. When an owner field lands, the filter hooks in here.
pub fn filter_tasks(tasks: &[Task], today: NaiveDate, _scope: &Scope) -> Vec<Task> {
    let today = today.format("%Y-%m-%d").to_string();
    tasks.iter().filter(|t| t.date == today).cloned().collect()
}

/// Upcoming-appointments rule: keep everything from `now - grace` onward,
/// sorted ascending, truncated to `limit`. Unparseable entries carry the
/// far-future sentinel: they always clear the cutoff, sort behind every
/// real appointment, and are dropped unless the range is unbounded.
pub fn filter_appointments(
    appointments: &[Appointment],
    now: NaiveDateTime,
    scope: &Scope,
    grace: chrono::Duration,
    limit: usize,
) -> Vec<Appointment> {
    let cutoff = now - grace;
    let mut keyed: Vec<(NaiveDateTime, &Appointment)> = appointments
        .iter()
        .map(|a| (appointment_when(a), a))
        .filter(|(when, _)| *when >= cutoff)
        .filter(|(when, _)| *when != FAR_FUTURE || scope.range == RangeMode::All)
        .collect();
    // Stable sort: same-minute appointments keep their fetched order.
    keyed.sort_by_key(|(when, _)| *when);
    keyed
        .into_iter()
        .take(limit)
        .map(|(_, a)| a.clone())
        .collect()
}

/// Activity-feed rule: user filter first, then the time window, then
/// truncation. The fetcher hands entries newest-first and nothing here
/// reorders (both filters are plain order-stable passes), so the store's
/// descending order survives through to the cap.
pub fn filter_activity(
    entries: &[ActivityEntry],
    now: NaiveDateTime,
    scope: &Scope,
    cap: usize,
) -> Vec<ActivityEntry> {
    entries
        .iter()
        .filter(|e| match &scope.user {
            UserFilter::Everyone => true,
            UserFilter::Named(name) => e.user == *name,
        })
        .filter(|e| activity_in_range(&e.ts, now, scope.range))
        .take(cap)
        .cloned()
        .collect()
}

fn activity_in_range(ts: &str, now: NaiveDateTime, range: RangeMode) -> bool {
    if range == RangeMode::All {
        return true;
    }
    // Fail-open: an entry whose timestamp won't parse stays visible.
    let Some(parsed) = parse_activity_ts(ts) else {
        return true;
    };
    match range {
        RangeMode::Today => parsed.date() == now.date(),
        RangeMode::ThisWeek => (now - parsed).num_days() <= WEEK_WINDOW_DAYS,
        RangeMode::All => true,
    }
}
