// Dashboard service — the render cycle.
// Fetch, normalize, filter, compose; one pass per render, no store writes.

use std::time::Instant;

use chrono::NaiveDateTime;

use crate::error::DashboardError;
use crate::firestore::{Firestore, RawDocument};
use crate::normalize;
use crate::scope;
use crate::types::{ActivityEntry, Appointment, Config, DashboardData, Scope, Task};
use crate::views;

/// Soft latency budget for one full render cycle (three fetches + pipeline).
const RENDER_CYCLE_BUDGET_MS: u128 = 3_000;

/// Run one render cycle against the store.
///
/// Fetches the three collections sequentially (they are independent; the
/// order is historical), then runs the pure pipeline. Every cycle starts
/// from fresh data; nothing is cached between cycles.
pub async fn run_render_cycle(
    store: &Firestore,
    config: &Config,
    scope: &Scope,
) -> Result<DashboardData, DashboardError> {
    let started = Instant::now();
    let now = chrono::Local::now().naive_local();

    let raw_tasks = store
        .list_collection(
            &config.project_id,
            &format!("{}/tasks/items", config.plan_root),
        )
        .await?;
    let raw_appointments = store
        .list_collection(
            &config.project_id,
            &format!("{}/appointments/items", config.plan_root),
        )
        .await?;
    let raw_activity = store
        .query_descending(
            &config.project_id,
            &format!("{}/activity", config.plan_root),
            "entries",
            "ts",
            config.activity_fetch_limit,
        )
        .await?;

    let data = assemble(
        &raw_tasks,
        &raw_appointments,
        &raw_activity,
        config,
        scope,
        now,
    );

    let elapsed_ms = started.elapsed().as_millis();
    if elapsed_ms > RENDER_CYCLE_BUDGET_MS {
        log::warn!(
            "render cycle exceeded latency budget: {}ms > {}ms",
            elapsed_ms,
            RENDER_CYCLE_BUDGET_MS
        );
    } else {
        log::debug!("render cycle completed in {}ms", elapsed_ms);
    }

    Ok(data)
}

/// The pure part of the cycle: raw documents in, display payload out.
/// Deterministic for a fixed `now`, so repeating it on unchanged data
/// yields an identical view.
pub fn assemble(
    raw_tasks: &[RawDocument],
    raw_appointments: &[RawDocument],
    raw_activity: &[RawDocument],
    config: &Config,
    scope: &Scope,
    now: NaiveDateTime,
) -> DashboardData {
    let tasks: Vec<Task> = raw_tasks.iter().map(normalize::task_from_doc).collect();
    let appointments: Vec<Appointment> = raw_appointments
        .iter()
        .map(normalize::appointment_from_doc)
        .collect();
    let activity: Vec<ActivityEntry> = raw_activity
        .iter()
        .map(normalize::activity_from_doc)
        .collect();

    let visible_tasks = scope::filter_tasks(&tasks, now.date(), scope);
    let upcoming = scope::filter_appointments(
        &appointments,
        now,
        scope,
        config.upcoming_grace(),
        config.upcoming_display_limit,
    );
    let feed = scope::filter_activity(&activity, now, scope, config.activity_display_limit);

    views::compose_dashboard(&visible_tasks, &upcoming, &feed, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActivityView, AppointmentsView, ChecklistView, RangeMode, UserFilter};

    fn doc(id: &str, fields_json: &str) -> RawDocument {
        RawDocument {
            id: id.to_string(),
            fields: serde_json::from_str(fields_json).unwrap(),
        }
    }

    fn config() -> Config {
        serde_json::from_str(r#"{ "projectId": "planner-test" }"#).unwrap()
    }

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2024-01-01 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn fixture_docs() -> (Vec<RawDocument>, Vec<RawDocument>, Vec<RawDocument>) {
        let tasks = vec![
            doc(
                "a",
                r#"{
                    "task": { "stringValue": "Fold laundry" },
                    "date": { "stringValue": "2024-01-01" },
                    "completed": { "booleanValue": true }
                }"#,
            ),
            doc(
                "b",
                r#"{
                    "task": { "stringValue": "Buy vitamins" },
                    "date": { "stringValue": "2024-01-01" }
                }"#,
            ),
            doc(
                "c",
                r#"{
                    "task": { "stringValue": "Next week" },
                    "date": { "stringValue": "2024-01-08" }
                }"#,
            ),
        ];
        let appointments = vec![
            doc(
                "broken",
                r#"{
                    "date": { "stringValue": "2024-13-40" },
                    "time": { "stringValue": "99:99" }
                }"#,
            ),
            doc(
                "checkup",
                r#"{
                    "date": { "stringValue": "2024-01-02" },
                    "time": { "stringValue": "09:00" },
                    "note": { "stringValue": "Midwife check" }
                }"#,
            ),
        ];
        let activity = vec![
            doc(
                "e1",
                r#"{
                    "ts": { "stringValue": "2024-01-01 10:00:00" },
                    "user": { "stringValue": "Priya" },
                    "action": { "stringValue": "task_done" }
                }"#,
            ),
            doc(
                "e2",
                r#"{
                    "ts": { "stringValue": "2024-01-01 09:00:00" },
                    "user": { "stringValue": "Sam" },
                    "action": { "stringValue": "task_added" }
                }"#,
            ),
            doc(
                "e3",
                r#"{
                    "ts": { "stringValue": "2024-01-01 08:00:00" },
                    "user": { "stringValue": "Priya" },
                    "action": { "stringValue": "appointment_added" }
                }"#,
            ),
        ];
        (tasks, appointments, activity)
    }

    #[test]
    fn test_assemble_full_pipeline() {
        let (tasks, appointments, activity) = fixture_docs();
        let data = assemble(
            &tasks,
            &appointments,
            &activity,
            &config(),
            &Scope::default(),
            now(),
        );

        match data.checklist {
            ChecklistView::Ready {
                ref entries,
                completion_ratio,
                ..
            } => {
                // Incomplete first, future-dated task filtered out.
                let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
                assert_eq!(ids, ["b", "a"]);
                assert!((completion_ratio - 0.5).abs() < f64::EPSILON);
            }
            ChecklistView::Empty { .. } => panic!("expected checklist entries"),
        }

        match data.appointments {
            AppointmentsView::Ready { ref entries } => {
                // The unparseable appointment is dropped under Today.
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].display, "2024-01-02 09:00 — Midwife check");
            }
            AppointmentsView::Empty { .. } => panic!("expected appointments"),
        }

        match data.activity {
            ActivityView::Ready { ref entries } => {
                assert_eq!(entries.len(), 3);
                assert_eq!(entries[0].ts, "2024-01-01 10:00:00");
            }
            ActivityView::Empty { .. } => panic!("expected activity"),
        }
    }

    #[test]
    fn test_assemble_user_filter_narrows_activity_only() {
        let (tasks, appointments, activity) = fixture_docs();
        let scope = Scope {
            range: RangeMode::Today,
            user: UserFilter::Named("Priya".to_string()),
        };
        let data = assemble(&tasks, &appointments, &activity, &config(), &scope, now());

        // Tasks are unaffected by the user filter.
        assert!(matches!(data.checklist, ChecklistView::Ready { .. }));

        match data.activity {
            ActivityView::Ready { ref entries } => {
                let users: Vec<&str> = entries.iter().map(|e| e.user.as_str()).collect();
                assert_eq!(users, ["Priya", "Priya"]);
                assert_eq!(entries[0].ts, "2024-01-01 10:00:00");
                assert_eq!(entries[1].ts, "2024-01-01 08:00:00");
            }
            ActivityView::Empty { .. } => panic!("expected activity"),
        }
    }

    #[test]
    fn test_assemble_idempotent_for_fixed_inputs() {
        let (tasks, appointments, activity) = fixture_docs();
        let first = assemble(
            &tasks,
            &appointments,
            &activity,
            &config(),
            &Scope::default(),
            now(),
        );
        let second = assemble(
            &tasks,
            &appointments,
            &activity,
            &config(),
            &Scope::default(),
            now(),
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_assemble_empty_store_renders_no_data_states() {
        let data = assemble(&[], &[], &[], &config(), &Scope::default(), now());
        assert!(matches!(data.checklist, ChecklistView::Empty { .. }));
        assert!(matches!(data.appointments, AppointmentsView::Empty { .. }));
        assert!(matches!(data.activity, ActivityView::Empty { .. }));
    }
}
