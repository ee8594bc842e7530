use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DashboardError;
use crate::firestore;
use crate::types::Config;

/// Get the canonical config file path (~/.hearthboard/config.json)
pub fn config_path() -> Result<PathBuf, DashboardError> {
    let home = dirs::home_dir().ok_or_else(|| {
        DashboardError::Configuration("Could not find home directory".to_string())
    })?;
    Ok(home.join(".hearthboard").join("config.json"))
}

/// Load configuration from ~/.hearthboard/config.json
pub fn load_config() -> Result<Config, DashboardError> {
    let path = config_path()?;
    load_config_from(&path)
}

fn load_config_from(path: &Path) -> Result<Config, DashboardError> {
    if !path.exists() {
        return Err(DashboardError::Configuration(format!(
            "Config file not found at {}. Create it with: {{ \"projectId\": \"your-project\", \"allowedEmails\": [\"you@example.com\"] }}",
            path.display()
        )));
    }

    let content = fs::read_to_string(path).map_err(|e| {
        DashboardError::Configuration(format!("Failed to read config: {}", e))
    })?;

    let config: Config = serde_json::from_str(&content).map_err(|e| {
        DashboardError::Configuration(format!("Failed to parse config: {}", e))
    })?;

    if config.project_id.is_empty() {
        return Err(DashboardError::Configuration(
            "projectId is empty".to_string(),
        ));
    }

    Ok(config)
}

/// Resolve the viewer's email from the stored token's account field.
///
/// The token is the identity source: whoever authenticated it is whoever
/// is looking at the dashboard.
pub fn detect_viewer_email() -> Option<String> {
    firestore::load_token()
        .ok()
        .and_then(|t| t.account)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.json");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_config_missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("nope.json"));
    }

    #[test]
    fn test_load_config_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"{ "projectId": "planner-test", "allowedEmails": ["a@example.com"] }"#,
        );
        let config = load_config_from(&path).unwrap();
        assert_eq!(config.project_id, "planner-test");
        assert_eq!(config.allowed_emails, vec!["a@example.com"]);
    }

    #[test]
    fn test_load_config_rejects_empty_project() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{ "projectId": "" }"#);
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, DashboardError::Configuration(_)));
    }

    #[test]
    fn test_load_config_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "{ not json");
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, DashboardError::Configuration(_)));
    }
}
