//! Firestore REST v1 — document listing and structured queries.
//!
//! The planner keeps its data under a fixed three-level namespace:
//! `{planRoot}/tasks/items`, `{planRoot}/appointments/items`, and
//! `{planRoot}/activity/entries`. Everything here is read-only.

use std::collections::HashMap;

use serde::Deserialize;

use super::{send_with_retry, Firestore, FirestoreError, RetryPolicy};

const FIRESTORE_BASE: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: u32 = 300;

// ============================================================================
// API response types (deserialized from Firestore JSON)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<DocumentRaw>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentRaw {
    /// Full resource name: "projects/P/databases/(default)/documents/...".
    #[serde(default)]
    name: String,
    #[serde(default)]
    fields: HashMap<String, FieldValue>,
}

/// runQuery streams one object per result row; rows without a `document`
/// carry only read metadata and are skipped.
#[derive(Debug, Deserialize)]
struct RunQueryRow {
    #[serde(default)]
    document: Option<DocumentRaw>,
}

/// One typed Firestore value. The store tags every field with its type;
/// only the types the planner actually writes are mapped, everything else
/// reads as absent and falls through to the normalizer's defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValue {
    string_value: Option<String>,
    boolean_value: Option<bool>,
    /// Firestore encodes int64 as a JSON string.
    integer_value: Option<String>,
    double_value: Option<f64>,
    /// RFC 3339 text for the store-native timestamp type.
    timestamp_value: Option<String>,
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        self.string_value.as_deref()
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.boolean_value
    }

    pub fn as_timestamp(&self) -> Option<&str> {
        self.timestamp_value.as_deref()
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.integer_value
            .as_deref()
            .and_then(|v| v.parse().ok())
            .or_else(|| self.double_value.map(|d| d as i64))
    }
}

// ============================================================================
// Public types
// ============================================================================

/// A fetched store document: the raw field mapping plus the record id
/// Firestore generated for it. Input to the normalizer.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub id: String,
    pub fields: HashMap<String, FieldValue>,
}

impl RawDocument {
    fn from_raw(doc: DocumentRaw) -> Self {
        // Record id is the last path segment of the resource name.
        let id = doc
            .name
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        RawDocument {
            id,
            fields: doc.fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

// ============================================================================
// Queries
// ============================================================================

impl Firestore {
    /// List every document in a collection under the project namespace,
    /// following pagination. `collection_path` is relative to the database
    /// document root, e.g. "family_planner/tasks/items".
    pub async fn list_collection(
        &self,
        project_id: &str,
        collection_path: &str,
    ) -> Result<Vec<RawDocument>, FirestoreError> {
        let access_token = self.access_token().await?;
        let url = format!(
            "{}/projects/{}/databases/(default)/documents/{}",
            FIRESTORE_BASE, project_id, collection_path
        );

        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http()
                .get(&url)
                .bearer_auth(&access_token)
                .query(&[("pageSize", PAGE_SIZE.to_string())]);
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let resp = send_with_retry(request, &RetryPolicy::default()).await?;
            let status = resp.status();
            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(FirestoreError::AuthExpired);
            }
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(FirestoreError::ApiError {
                    status: status.as_u16(),
                    message: body,
                });
            }

            let body: ListDocumentsResponse = resp.json().await?;
            documents.extend(body.documents.into_iter().map(RawDocument::from_raw));

            page_token = body.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        log::debug!("listed {} documents from {}", documents.len(), collection_path);
        Ok(documents)
    }

    /// Run a structured query over one child collection, ordered descending
    /// on `order_field` and capped at `limit` results. The store does the
    /// ordering, so results arrive newest-first.
    pub async fn query_descending(
        &self,
        project_id: &str,
        parent_path: &str,
        collection_id: &str,
        order_field: &str,
        limit: u32,
    ) -> Result<Vec<RawDocument>, FirestoreError> {
        let access_token = self.access_token().await?;
        let url = format!(
            "{}/projects/{}/databases/(default)/documents/{}:runQuery",
            FIRESTORE_BASE, project_id, parent_path
        );

        let body = serde_json::json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection_id }],
                "orderBy": [{
                    "field": { "fieldPath": order_field },
                    "direction": "DESCENDING"
                }],
                "limit": limit
            }
        });

        let request = self
            .http()
            .post(&url)
            .bearer_auth(&access_token)
            .json(&body);

        let resp = send_with_retry(request, &RetryPolicy::default()).await?;
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(FirestoreError::AuthExpired);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FirestoreError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let rows: Vec<RunQueryRow> = resp.json().await?;
        let documents: Vec<RawDocument> = rows
            .into_iter()
            .filter_map(|row| row.document)
            .map(RawDocument::from_raw)
            .collect();

        log::debug!(
            "query on {}/{} returned {} documents",
            parent_path,
            collection_id,
            documents.len()
        );
        Ok(documents)
    }
}
