//! Email allow-list gate.
//!
//! The dashboard refuses to render for anyone outside the family. The
//! check runs before the first fetch, so a denied viewer never touches
//! the store.

use crate::error::DashboardError;

/// Check the authenticated email against the configured allow-list.
///
/// The list is hand-typed, so comparison is trimmed and case-insensitive.
/// An empty allow-list is a configuration error, not an open door.
pub fn check_access(email: &str, allowed_emails: &[String]) -> Result<(), DashboardError> {
    if allowed_emails.is_empty() {
        return Err(DashboardError::Configuration(
            "allowedEmails is empty; add at least one viewer to the config".to_string(),
        ));
    }

    let email = email.trim();
    let permitted = allowed_emails
        .iter()
        .any(|a| a.trim().eq_ignore_ascii_case(email));

    if permitted {
        Ok(())
    } else {
        Err(DashboardError::AccessDenied {
            email: email.to_string(),
        })
    }
}
