use serde::{Deserialize, Serialize};

/// Configuration stored in ~/.hearthboard/config.json
///
/// Every tunable carries a serde default so a minimal file with just
/// `projectId` is enough to get a working dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Firestore project id the planner data lives in.
    pub project_id: String,
    /// Top-level collection holding the planner documents.
    #[serde(default = "default_plan_root")]
    pub plan_root: String,
    /// Emails allowed to view the dashboard. Empty list refuses to render.
    #[serde(default)]
    pub allowed_emails: Vec<String>,
    /// How long a just-passed appointment stays in the upcoming list.
    /// Deployments have run with 5 and with 60; 5 is the default until
    /// the family settles the argument.
    #[serde(default = "default_grace_minutes")]
    pub upcoming_grace_minutes: u32,
    #[serde(default = "default_upcoming_limit")]
    pub upcoming_display_limit: usize,
    #[serde(default = "default_activity_display_limit")]
    pub activity_display_limit: usize,
    /// How many activity entries to pull from the store per cycle.
    #[serde(default = "default_activity_fetch_limit")]
    pub activity_fetch_limit: u32,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_minutes: u64,
}

fn default_plan_root() -> String {
    "family_planner".to_string()
}

fn default_grace_minutes() -> u32 {
    5
}

fn default_upcoming_limit() -> usize {
    10
}

fn default_activity_display_limit() -> usize {
    30
}

fn default_activity_fetch_limit() -> u32 {
    300
}

fn default_poll_interval() -> u64 {
    5
}

impl Config {
    pub fn upcoming_grace(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.upcoming_grace_minutes as i64)
    }
}

// =============================================================================
// Canonical records
// =============================================================================

/// A task as the pipeline sees it: every field present, defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub task: String,
    /// ISO date ("YYYY-MM-DD"). Empty when the source document has none,
    /// which keeps the task out of every daily view.
    pub date: String,
    pub category: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    /// ISO date ("YYYY-MM-DD").
    pub date: String,
    /// Wall time ("HH:MM").
    pub time: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: String,
    /// Local-time text "YYYY-MM-DD HH:MM:SS" (converted from the store's
    /// native timestamp type when needed).
    pub ts: String,
    pub user: String,
    pub action: String,
    pub meta: String,
}

// =============================================================================
// Scope
// =============================================================================

/// Time-range mode selected by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeMode {
    Today,
    ThisWeek,
    All,
}

impl RangeMode {
    /// Parse a CLI argument. Accepts the spellings people actually type.
    pub fn from_arg(arg: &str) -> Option<Self> {
        match arg.to_lowercase().as_str() {
            "today" => Some(RangeMode::Today),
            "week" | "this-week" | "thisweek" => Some(RangeMode::ThisWeek),
            "all" => Some(RangeMode::All),
            _ => None,
        }
    }
}

impl std::fmt::Display for RangeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RangeMode::Today => write!(f, "Today"),
            RangeMode::ThisWeek => write!(f, "This Week"),
            RangeMode::All => write!(f, "All"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserFilter {
    Everyone,
    Named(String),
}

impl UserFilter {
    pub fn from_arg(arg: &str) -> Self {
        if arg.eq_ignore_ascii_case("everyone") {
            UserFilter::Everyone
        } else {
            UserFilter::Named(arg.to_string())
        }
    }
}

impl std::fmt::Display for UserFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserFilter::Everyone => write!(f, "Everyone"),
            UserFilter::Named(name) => write!(f, "{}", name),
        }
    }
}

/// The active combination of range mode and user filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scope {
    pub range: RangeMode,
    pub user: UserFilter,
}

impl Default for Scope {
    fn default() -> Self {
        Scope {
            range: RangeMode::Today,
            user: UserFilter::Everyone,
        }
    }
}

// =============================================================================
// View models
// =============================================================================

/// Header block for the rendered dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub title: String,
    /// Human date line, e.g. "Friday, August 7".
    pub date: String,
    pub generated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistEntry {
    pub id: String,
    pub task: String,
    pub category: String,
    pub completed: bool,
    /// Single display string, e.g. "⬜ Buy vitamins · Health".
    pub display: String,
}

/// Today's checklist panel. Empty candidate sets render an explicit
/// no-data state instead of a bare empty list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ChecklistView {
    #[serde(rename_all = "camelCase")]
    Ready {
        entries: Vec<ChecklistEntry>,
        completed_count: usize,
        total_count: usize,
        completion_ratio: f64,
    },
    Empty { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentEntry {
    pub id: String,
    pub date: String,
    pub time: String,
    pub note: String,
    /// Single display string, e.g. "2024-01-02 09:00 — Midwife check".
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AppointmentsView {
    Ready { entries: Vec<AppointmentEntry> },
    Empty { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntryView {
    pub ts: String,
    pub user: String,
    pub action: String,
    pub meta: String,
    /// Single display string: "ts · user · action · meta".
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ActivityView {
    Ready { entries: Vec<ActivityEntryView> },
    Empty { message: String },
}

/// The full display payload handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub overview: DashboardOverview,
    pub checklist: ChecklistView,
    pub appointments: AppointmentsView,
    pub activity: ActivityView,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_minimal_json_gets_defaults() {
        let json = r#"{ "projectId": "planner-test" }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.project_id, "planner-test");
        assert_eq!(config.plan_root, "family_planner");
        assert_eq!(config.upcoming_grace_minutes, 5);
        assert_eq!(config.upcoming_display_limit, 10);
        assert_eq!(config.activity_display_limit, 30);
        assert_eq!(config.activity_fetch_limit, 300);
        assert!(config.allowed_emails.is_empty());
    }

    #[test]
    fn test_config_overrides_respected() {
        let json = r#"{
            "projectId": "planner-test",
            "planRoot": "our_planner",
            "allowedEmails": ["a@example.com"],
            "upcomingGraceMinutes": 60,
            "activityDisplayLimit": 20,
            "activityFetchLimit": 100
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.plan_root, "our_planner");
        assert_eq!(config.upcoming_grace_minutes, 60);
        assert_eq!(config.upcoming_grace(), chrono::Duration::hours(1));
        assert_eq!(config.activity_display_limit, 20);
        assert_eq!(config.activity_fetch_limit, 100);
    }

    #[test]
    fn test_range_mode_from_arg() {
        assert_eq!(RangeMode::from_arg("today"), Some(RangeMode::Today));
        assert_eq!(RangeMode::from_arg("This-Week"), Some(RangeMode::ThisWeek));
        assert_eq!(RangeMode::from_arg("week"), Some(RangeMode::ThisWeek));
        assert_eq!(RangeMode::from_arg("ALL"), Some(RangeMode::All));
        assert_eq!(RangeMode::from_arg("yesterday"), None);
    }

    #[test]
    fn test_user_filter_from_arg() {
        assert_eq!(UserFilter::from_arg("Everyone"), UserFilter::Everyone);
        assert_eq!(
            UserFilter::from_arg("Priya"),
            UserFilter::Named("Priya".to_string())
        );
    }
}
