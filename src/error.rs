//! Error types for the render cycle
//!
//! Errors are classified by blast radius:
//! - Configuration / AccessDenied: fatal before any data is fetched
//! - Store: fatal for the current cycle (network or API failure)
//!
//! Malformed fields on individual records are NOT errors. The normalizer
//! and scope engine degrade them to defaults and sentinels per record.

use thiserror::Error;

use crate::firestore::FirestoreError;

/// Fatal errors surfaced to the viewer as a single message.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Access denied: {email} is not on the family allow-list")]
    AccessDenied { email: String },

    #[error("Store fetch failed: {0}")]
    Store(#[from] FirestoreError),
}

impl DashboardError {
    /// Get a user-friendly recovery suggestion for the terminal message.
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            DashboardError::Configuration(_) => {
                "Check ~/.hearthboard/config.json and the token path."
            }
            DashboardError::AccessDenied { .. } => {
                "Ask whoever runs the dashboard to add your email to allowedEmails."
            }
            DashboardError::Store(FirestoreError::AuthExpired) => {
                "Re-authenticate: the stored token was rejected by the store."
            }
            DashboardError::Store(_) => "Check your internet connection and try again.",
        }
    }
}
