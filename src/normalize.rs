//! Raw store documents → canonical records.
//!
//! Upstream data is loosely shaped: the desktop planner, the phone entry
//! form, and hand edits in the console all write slightly different
//! documents. Normalization never fails: missing or mistyped fields
//! degrade to defaults so one bad record can't block the dashboard.

use chrono::{DateTime, Local};

use crate::firestore::{FieldValue, RawDocument};
use crate::types::{ActivityEntry, Appointment, Task};

fn text_or<'a>(doc: &'a RawDocument, name: &str, default: &'a str) -> &'a str {
    doc.field(name).and_then(FieldValue::as_str).unwrap_or(default)
}

/// Build a canonical task. Absent `date` stays empty, which keeps the
/// task out of every daily view without special-casing downstream.
pub fn task_from_doc(doc: &RawDocument) -> Task {
    Task {
        id: doc.id.clone(),
        task: text_or(doc, "task", "").to_string(),
        date: text_or(doc, "date", "").to_string(),
        category: text_or(doc, "category", "General").to_string(),
        completed: doc
            .field("completed")
            .and_then(FieldValue::as_bool)
            .unwrap_or(false),
    }
}

/// Build a canonical appointment. A missing time reads as midnight so a
/// date-only appointment still lands on its day instead of parsing as
/// garbage.
pub fn appointment_from_doc(doc: &RawDocument) -> Appointment {
    Appointment {
        id: doc.id.clone(),
        date: text_or(doc, "date", "").to_string(),
        time: text_or(doc, "time", "00:00").to_string(),
        note: text_or(doc, "note", "").to_string(),
    }
}

/// Build a canonical activity entry.
///
/// The desktop planner writes `ts` as the store-native timestamp type;
/// older entries carry pre-formatted text. Native timestamps convert to
/// local-time "YYYY-MM-DD HH:MM:SS", text passes through unchanged, and
/// an absent field becomes the empty string.
pub fn activity_from_doc(doc: &RawDocument) -> ActivityEntry {
    let ts = match doc.field("ts") {
        Some(value) => match value.as_timestamp() {
            Some(raw) => timestamp_to_local_text(raw),
            None => value.as_str().unwrap_or("").to_string(),
        },
        None => String::new(),
    };

    ActivityEntry {
        id: doc.id.clone(),
        ts,
        user: text_or(doc, "user", "?").to_string(),
        action: text_or(doc, "action", "").to_string(),
        meta: text_or(doc, "meta", "").to_string(),
    }
}

fn timestamp_to_local_text(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(&raw.replace('Z', "+00:00"))
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
    {
        Ok(dt) => dt
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        // Unrecognized timestamp text passes through; the scope engine
        // treats unparseable entries as in-scope anyway.
        Err(_) => raw.to_string(),
    }
}
