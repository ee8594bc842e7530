//! View composition: filtered records → display-ready view models.
//!
//! Pure projection. Everything here operates on the visible subsets the
//! scope engine produced; nothing touches the store.

use chrono::NaiveDateTime;

use crate::types::{
    ActivityEntry, ActivityEntryView, ActivityView, Appointment, AppointmentEntry,
    AppointmentsView, ChecklistEntry, ChecklistView, DashboardData, DashboardOverview, Task,
};

pub const DASHBOARD_TITLE: &str = "Family Planner — Live Dashboard";

const NO_TASKS_MESSAGE: &str = "No tasks found for today yet.";
const NO_APPOINTMENTS_MESSAGE: &str = "No upcoming appointments.";
const NO_ACTIVITY_MESSAGE: &str = "No activity yet.";

/// Compose the checklist panel: incomplete tasks first, then by id, with
/// the completion ratio clamped to [0, 1].
pub fn compose_checklist(visible: &[Task]) -> ChecklistView {
    if visible.is_empty() {
        return ChecklistView::Empty {
            message: NO_TASKS_MESSAGE.to_string(),
        };
    }

    let total_count = visible.len();
    let completed_count = visible.iter().filter(|t| t.completed).count();
    let completion_ratio =
        (completed_count as f64 / total_count.max(1) as f64).min(1.0);

    let mut ordered: Vec<&Task> = visible.iter().collect();
    ordered.sort_by(|a, b| (a.completed, &a.id).cmp(&(b.completed, &b.id)));

    let entries = ordered
        .into_iter()
        .map(|t| {
            let mark = if t.completed { "✅" } else { "⬜" };
            ChecklistEntry {
                id: t.id.clone(),
                task: t.task.clone(),
                category: t.category.clone(),
                completed: t.completed,
                display: format!("{} {}  ·  {}", mark, t.task, t.category),
            }
        })
        .collect();

    ChecklistView::Ready {
        entries,
        completed_count,
        total_count,
        completion_ratio,
    }
}

/// Compose the upcoming-appointments panel from the already-sorted,
/// already-truncated visible list.
pub fn compose_appointments(visible: &[Appointment]) -> AppointmentsView {
    if visible.is_empty() {
        return AppointmentsView::Empty {
            message: NO_APPOINTMENTS_MESSAGE.to_string(),
        };
    }

    let entries = visible
        .iter()
        .map(|a| {
            let note = if a.note.is_empty() { "(no note)" } else { &a.note };
            AppointmentEntry {
                id: a.id.clone(),
                date: a.date.clone(),
                time: a.time.clone(),
                note: a.note.clone(),
                display: format!("{} {} — {}", a.date, a.time, note),
            }
        })
        .collect();

    AppointmentsView::Ready { entries }
}

/// Compose the activity panel, preserving the feed order handed up.
pub fn compose_activity(visible: &[ActivityEntry]) -> ActivityView {
    if visible.is_empty() {
        return ActivityView::Empty {
            message: NO_ACTIVITY_MESSAGE.to_string(),
        };
    }

    let entries = visible
        .iter()
        .map(|e| ActivityEntryView {
            ts: e.ts.clone(),
            user: e.user.clone(),
            action: e.action.clone(),
            meta: e.meta.clone(),
            display: format!("{} · {} · {} · {}", e.ts, e.user, e.action, e.meta),
        })
        .collect();

    ActivityView::Ready { entries }
}

/// Assemble the full display payload for one render moment.
pub fn compose_dashboard(
    tasks: &[Task],
    appointments: &[Appointment],
    activity: &[ActivityEntry],
    now: NaiveDateTime,
) -> DashboardData {
    DashboardData {
        overview: DashboardOverview {
            title: DASHBOARD_TITLE.to_string(),
            date: now.format("%A, %B %-d").to_string(),
            generated_at: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        },
        checklist: compose_checklist(tasks),
        appointments: compose_appointments(appointments),
        activity: compose_activity(activity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, completed: bool) -> Task {
        Task {
            id: id.to_string(),
            task: format!("task {}", id),
            date: "2024-01-01".to_string(),
            category: "General".to_string(),
            completed,
        }
    }

    #[test]
    fn test_checklist_incomplete_first_then_id() {
        let view = compose_checklist(&[task("a", true), task("b", false)]);
        match view {
            ChecklistView::Ready {
                entries,
                completed_count,
                total_count,
                completion_ratio,
            } => {
                let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
                assert_eq!(ids, ["b", "a"]);
                assert_eq!(completed_count, 1);
                assert_eq!(total_count, 2);
                assert!((completion_ratio - 0.5).abs() < f64::EPSILON);
            }
            ChecklistView::Empty { .. } => panic!("expected a ready checklist"),
        }
    }

    #[test]
    fn test_checklist_ratio_stays_in_unit_interval() {
        let all_done = compose_checklist(&[task("a", true), task("b", true)]);
        if let ChecklistView::Ready {
            completion_ratio, ..
        } = all_done
        {
            assert!((0.0..=1.0).contains(&completion_ratio));
            assert!((completion_ratio - 1.0).abs() < f64::EPSILON);
        } else {
            panic!("expected a ready checklist");
        }

        let none_done = compose_checklist(&[task("a", false)]);
        if let ChecklistView::Ready {
            completion_ratio, ..
        } = none_done
        {
            assert_eq!(completion_ratio, 0.0);
        } else {
            panic!("expected a ready checklist");
        }
    }

    #[test]
    fn test_checklist_empty_is_explicit_state() {
        match compose_checklist(&[]) {
            ChecklistView::Empty { message } => {
                assert_eq!(message, "No tasks found for today yet.")
            }
            ChecklistView::Ready { .. } => panic!("zero tasks must not render a list"),
        }
    }

    #[test]
    fn test_checklist_display_marks() {
        let view = compose_checklist(&[task("a", true), task("b", false)]);
        if let ChecklistView::Ready { entries, .. } = view {
            assert!(entries[0].display.starts_with("⬜"));
            assert!(entries[1].display.starts_with("✅"));
        } else {
            panic!("expected a ready checklist");
        }
    }

    #[test]
    fn test_appointment_display_and_placeholder_note() {
        let appointments = vec![
            Appointment {
                id: "a1".to_string(),
                date: "2024-01-02".to_string(),
                time: "09:00".to_string(),
                note: "Midwife check".to_string(),
            },
            Appointment {
                id: "a2".to_string(),
                date: "2024-01-03".to_string(),
                time: "14:30".to_string(),
                note: String::new(),
            },
        ];
        match compose_appointments(&appointments) {
            AppointmentsView::Ready { entries } => {
                assert_eq!(entries[0].display, "2024-01-02 09:00 — Midwife check");
                assert_eq!(entries[1].display, "2024-01-03 14:30 — (no note)");
            }
            AppointmentsView::Empty { .. } => panic!("expected appointments"),
        }
    }

    #[test]
    fn test_empty_panels_carry_messages() {
        assert_eq!(
            compose_appointments(&[]),
            AppointmentsView::Empty {
                message: "No upcoming appointments.".to_string()
            }
        );
        assert_eq!(
            compose_activity(&[]),
            ActivityView::Empty {
                message: "No activity yet.".to_string()
            }
        );
    }

    #[test]
    fn test_activity_display_order_preserved() {
        let entries = vec![
            ActivityEntry {
                id: "e1".to_string(),
                ts: "2024-01-01 10:00:00".to_string(),
                user: "Priya".to_string(),
                action: "task_done".to_string(),
                meta: "Buy vitamins".to_string(),
            },
            ActivityEntry {
                id: "e2".to_string(),
                ts: "2024-01-01 09:00:00".to_string(),
                user: "Sam".to_string(),
                action: "appointment_added".to_string(),
                meta: String::new(),
            },
        ];
        match compose_activity(&entries) {
            ActivityView::Ready { entries } => {
                assert_eq!(
                    entries[0].display,
                    "2024-01-01 10:00:00 · Priya · task_done · Buy vitamins"
                );
                assert_eq!(entries[1].user, "Sam");
            }
            ActivityView::Empty { .. } => panic!("expected activity"),
        }
    }

    #[test]
    fn test_compose_dashboard_is_deterministic() {
        let now = chrono::NaiveDateTime::parse_from_str(
            "2024-01-01 12:00:00",
            "%Y-%m-%d %H:%M:%S",
        )
        .unwrap();
        let tasks = vec![task("a", true), task("b", false)];
        let first = compose_dashboard(&tasks, &[], &[], now);
        let second = compose_dashboard(&tasks, &[], &[], now);
        assert_eq!(first, second);
        assert_eq!(first.overview.generated_at, "2024-01-01 12:00:00");
    }
}
