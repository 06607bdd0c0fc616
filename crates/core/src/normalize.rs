//! Boundary normalization of raw complaint payloads.
//!
//! Records arrive from two places (the HTTP endpoint and the document store)
//! in shapes that drift: fields go missing, enums change case, timestamps are
//! RFC 3339 strings in one place, epoch milliseconds in another and
//! `{seconds, nanoseconds}` objects in a third. Everything downstream of this
//! module works on [`Complaint`] only.
//!
//! Malformed input never fails normalization. It degrades to a default and
//! logs a warning.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use tracing::warn;

use crate::models::{Category, Comment, Complaint, Priority, Role, Status, StatusUpdate};
use crate::priority::suggest_priority;

/// Knobs for [`normalize_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeOptions {
    /// Fill a missing priority from the keyword rules before falling back to
    /// [`Priority::Low`].
    pub suggest_missing_priority: bool,
}

/// Outcome of probing a timestamp field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// Field absent, null or blank.
    Absent,
    /// Field held a recognisable instant.
    Parsed(DateTime<Utc>),
    /// Field held something that is not a timestamp.
    Malformed,
}

impl Timestamp {
    /// The instant, if one was found.
    #[must_use]
    pub const fn value(self) -> Option<DateTime<Utc>> {
        match self {
            Self::Parsed(dt) => Some(dt),
            Self::Absent | Self::Malformed => None,
        }
    }
}

/// Probe a raw timestamp value.
///
/// Accepted encodings, in order: null; RFC 3339 string; naive
/// `YYYY-MM-DDTHH:MM:SS[.f]` (or space separated) string read as UTC;
/// `YYYY-MM-DD` date string; number of epoch milliseconds; object carrying
/// `seconds`/`_seconds` and optionally `nanoseconds`/`_nanoseconds`/`nanos`.
#[must_use]
pub fn parse_timestamp(value: &Value) -> Timestamp {
    match value {
        Value::Null => Timestamp::Absent,
        Value::String(s) => parse_timestamp_str(s),
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64));
            millis
                .and_then(DateTime::from_timestamp_millis)
                .map_or(Timestamp::Malformed, Timestamp::Parsed)
        }
        Value::Object(map) => parse_timestamp_object(map),
        Value::Bool(_) | Value::Array(_) => Timestamp::Malformed,
    }
}

fn parse_timestamp_str(raw: &str) -> Timestamp {
    let s = raw.trim();
    if s.is_empty() {
        return Timestamp::Absent;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Timestamp::Parsed(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Timestamp::Parsed(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map_or(Timestamp::Malformed, |naive| Timestamp::Parsed(naive.and_utc()))
}

fn parse_timestamp_object(map: &Map<String, Value>) -> Timestamp {
    let seconds = ["seconds", "_seconds"]
        .iter()
        .find_map(|key| map.get(*key))
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)));
    let nanos = ["nanoseconds", "_nanoseconds", "nanos"]
        .iter()
        .find_map(|key| map.get(*key))
        .and_then(Value::as_u64)
        .unwrap_or(0);

    let Some(seconds) = seconds else {
        return Timestamp::Malformed;
    };
    u32::try_from(nanos)
        .ok()
        .and_then(|nanos| DateTime::from_timestamp(seconds, nanos))
        .map_or(Timestamp::Malformed, Timestamp::Parsed)
}

fn timestamp_field(record_id: &str, field: &str, value: Option<&Value>) -> Option<DateTime<Utc>> {
    match parse_timestamp(value?) {
        Timestamp::Parsed(dt) => Some(dt),
        Timestamp::Absent => None,
        Timestamp::Malformed => {
            warn!(record_id = %record_id, field = %field, "Unparseable timestamp, treating as absent");
            None
        }
    }
}

fn str_field<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn text_field(map: &Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Normalize one raw record with default options.
///
/// Returns `None` when the record is not a JSON object.
#[must_use]
pub fn normalize(raw: &Value) -> Option<Complaint> {
    normalize_with(raw, &NormalizeOptions::default())
}

/// Normalize one raw record.
///
/// Returns `None` when the record is not a JSON object.
#[must_use]
pub fn normalize_with(raw: &Value, options: &NormalizeOptions) -> Option<Complaint> {
    let Value::Object(map) = raw else {
        warn!(kind = %value_kind(raw), "Skipping complaint record that is not an object");
        return None;
    };

    let id = str_field(map, &["id", "_id"]).unwrap_or_default().to_string();
    if id.is_empty() {
        warn!("Complaint record without an id");
    }

    let title = text_field(map, "title");
    let description = text_field(map, "description");

    let status = match str_field(map, &["status"]) {
        None => Status::Pending,
        Some(raw_status) => Status::parse(raw_status).unwrap_or_else(|| {
            warn!(record_id = %id, status = %raw_status, "Unknown status, defaulting to pending");
            Status::Pending
        }),
    };

    let category = str_field(map, &["category"]).map_or(Category::General, Category::from_tag);

    let priority = match str_field(map, &["priority"]) {
        Some(raw_priority) => Priority::parse(raw_priority),
        None if options.suggest_missing_priority => {
            let text = format!("{title} {description}");
            suggest_priority(&text).unwrap_or_default()
        }
        None => Priority::default(),
    };

    let created_at = timestamp_field(
        &id,
        "createdAt",
        map.get("createdAt")
            .filter(|v| !v.is_null())
            .or_else(|| map.get("timestamp")),
    );
    let updated_at = timestamp_field(&id, "updatedAt", map.get("updatedAt"));

    let comments = match map.get("comments") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| normalize_comment(item, &id))
            .collect(),
        Some(other) => {
            warn!(record_id = %id, kind = %value_kind(other), "Comments field is not an array, ignoring");
            Vec::new()
        }
    };

    let updates = match map.get("updates") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| normalize_update(item, &id))
            .collect(),
        _ => Vec::new(),
    };

    Some(Complaint {
        student_id: str_field(map, &["studentId", "uid"]).map(ToString::to_string),
        student_name: str_field(map, &["studentName"]).map(ToString::to_string),
        id,
        title,
        description,
        category,
        status,
        priority,
        created_at,
        updated_at,
        comments,
        updates,
    })
}

/// Normalize a batch, dropping records that are not objects.
#[must_use]
pub fn normalize_all(raw: &[Value], options: &NormalizeOptions) -> Vec<Complaint> {
    raw.iter()
        .filter_map(|record| normalize_with(record, options))
        .collect()
}

/// Normalize one raw comment belonging to `complaint_id`.
///
/// Returns `None` when the entry is not a JSON object.
#[must_use]
pub fn normalize_comment(raw: &Value, complaint_id: &str) -> Option<Comment> {
    let Value::Object(map) = raw else {
        warn!(record_id = %complaint_id, kind = %value_kind(raw), "Dropping comment that is not an object");
        return None;
    };

    let owner = str_field(map, &["complaintId", "campusResolveId"])
        .map(ToString::to_string)
        .or_else(|| (!complaint_id.is_empty()).then(|| complaint_id.to_string()));

    Some(Comment {
        id: str_field(map, &["id"]).map(ToString::to_string),
        user_id: str_field(map, &["userId"]).unwrap_or_default().to_string(),
        user_name: str_field(map, &["userName"]).unwrap_or_default().to_string(),
        user_role: str_field(map, &["userRole"]).map_or(Role::Student, Role::parse),
        content: text_field(map, "content"),
        created_at: timestamp_field(complaint_id, "comments.createdAt", map.get("createdAt")),
        complaint_id: owner,
    })
}

fn normalize_update(raw: &Value, complaint_id: &str) -> Option<StatusUpdate> {
    let Value::Object(map) = raw else {
        warn!(record_id = %complaint_id, "Dropping status update that is not an object");
        return None;
    };
    let status = str_field(map, &["status"]).and_then(Status::parse);
    let Some(status) = status else {
        warn!(record_id = %complaint_id, "Dropping status update without a known status");
        return None;
    };

    Some(StatusUpdate {
        by: str_field(map, &["by"]).unwrap_or("admin").to_string(),
        date: timestamp_field(complaint_id, "updates.date", map.get("date")),
        status,
        description: str_field(map, &["description"]).map(ToString::to_string),
    })
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_missing_fields_get_defaults() {
        let complaint = normalize(&json!({"id": "c1", "title": "Water cooler"})).unwrap();
        assert_eq!(complaint.status, Status::Pending);
        assert_eq!(complaint.category, Category::General);
        assert_eq!(complaint.priority, Priority::Low);
        assert!(complaint.comments.is_empty());
        assert!(complaint.updates.is_empty());
        assert_eq!(complaint.created_at, None);
        assert_eq!(complaint.description, "");
    }

    #[test]
    fn test_unknown_status_defaults_to_pending() {
        let complaint = normalize(&json!({"id": "c1", "status": "closed"})).unwrap();
        assert_eq!(complaint.status, Status::Pending);
        let complaint = normalize(&json!({"id": "c1", "status": "In_Progress"})).unwrap();
        assert_eq!(complaint.status, Status::InProgress);
    }

    #[test]
    fn test_priority_policy() {
        let unknown = normalize(&json!({"id": "c1", "priority": "Unknown"})).unwrap();
        assert_eq!(unknown.priority, Priority::Unknown);
        let high = normalize(&json!({"id": "c1", "priority": "High"})).unwrap();
        assert_eq!(high.priority, Priority::High);

        let options = NormalizeOptions {
            suggest_missing_priority: true,
        };
        let suggested = normalize_with(
            &json!({"id": "c1", "title": "Lift stuck", "description": "Between floors"}),
            &options,
        )
        .unwrap();
        assert_eq!(suggested.priority, Priority::High);

        let fallback = normalize_with(&json!({"id": "c1", "title": "Misc"}), &options).unwrap();
        assert_eq!(fallback.priority, Priority::Low);
    }

    #[test]
    fn test_timestamp_encodings() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(
            parse_timestamp(&json!("2024-03-01T10:00:00Z")),
            Timestamp::Parsed(expected)
        );
        assert_eq!(
            parse_timestamp(&json!("2024-03-01T15:30:00+05:30")),
            Timestamp::Parsed(expected)
        );
        assert_eq!(
            parse_timestamp(&json!("2024-03-01T10:00:00")),
            Timestamp::Parsed(expected)
        );
        assert_eq!(
            parse_timestamp(&json!(expected.timestamp_millis())),
            Timestamp::Parsed(expected)
        );
        assert_eq!(
            parse_timestamp(&json!({"seconds": expected.timestamp(), "nanoseconds": 0})),
            Timestamp::Parsed(expected)
        );
        assert_eq!(
            parse_timestamp(&json!({"_seconds": expected.timestamp()})),
            Timestamp::Parsed(expected)
        );
        assert_eq!(
            parse_timestamp(&json!("2024-03-01")),
            Timestamp::Parsed(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_malformed_timestamps_become_absent() {
        assert_eq!(parse_timestamp(&json!("yesterday")), Timestamp::Malformed);
        assert_eq!(parse_timestamp(&json!({"when": 3})), Timestamp::Malformed);
        assert_eq!(parse_timestamp(&json!(true)), Timestamp::Malformed);
        assert_eq!(parse_timestamp(&json!(null)), Timestamp::Absent);
        assert_eq!(parse_timestamp(&json!("  ")), Timestamp::Absent);

        let complaint = normalize(&json!({"id": "c1", "createdAt": "not a date"})).unwrap();
        assert_eq!(complaint.created_at, None);
    }

    #[test]
    fn test_created_at_falls_back_to_timestamp() {
        let complaint = normalize(&json!({
            "id": "c1",
            "timestamp": 1_709_287_200_000_i64
        }))
        .unwrap();
        assert_eq!(
            complaint.created_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_student_and_id_fallbacks() {
        let complaint = normalize(&json!({"_id": "x9", "uid": "u1", "title": "T"})).unwrap();
        assert_eq!(complaint.id, "x9");
        assert_eq!(complaint.student_id.as_deref(), Some("u1"));
    }

    #[test]
    fn test_comments_normalized() {
        let complaint = normalize(&json!({
            "id": "c1",
            "comments": [
                {"userId": "admin", "userName": "Admin", "userRole": "admin", "content": "On it", "createdAt": "2024-03-02T09:00:00Z"},
                "garbage",
                {"content": "Any update?", "campusResolveId": "c1"}
            ]
        }))
        .unwrap();
        assert_eq!(complaint.comments.len(), 2);
        assert_eq!(complaint.comments[0].user_role, Role::Admin);
        assert_eq!(complaint.comments[0].complaint_id.as_deref(), Some("c1"));
        assert_eq!(complaint.comments[1].user_role, Role::Student);
        assert_eq!(complaint.comments[1].content, "Any update?");

        let not_array = normalize(&json!({"id": "c1", "comments": "none"})).unwrap();
        assert!(not_array.comments.is_empty());
    }

    #[test]
    fn test_updates_normalized() {
        let complaint = normalize(&json!({
            "id": "c1",
            "updates": [
                {"by": "warden", "date": {"seconds": 1_709_287_200}, "status": "resolved"},
                {"by": "x", "status": "??"}
            ]
        }))
        .unwrap();
        assert_eq!(complaint.updates.len(), 1);
        assert_eq!(complaint.updates[0].status, Status::Resolved);
        assert_eq!(complaint.updates[0].by, "warden");
    }

    #[test]
    fn test_non_object_records_are_skipped() {
        assert!(normalize(&json!("c1")).is_none());
        let all = normalize_all(
            &[json!({"id": "a"}), json!(42), json!({"id": "b"})],
            &NormalizeOptions::default(),
        );
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_idempotent() {
        let raw = json!({
            "id": "c1",
            "title": "Mess food quality",
            "description": "Undercooked rice",
            "category": "Sports",
            "status": "IN_PROGRESS",
            "priority": "Unknown",
            "createdAt": {"seconds": 1_709_287_200, "nanoseconds": 123_000_000},
            "updatedAt": 1_709_373_600_000_i64,
            "uid": "s1",
            "studentName": "Asha",
            "comments": [{"userId": "admin", "userRole": "admin", "content": "Checking"}],
            "updates": [{"status": "in-progress", "date": "2024-03-02"}]
        });
        let once = normalize(&raw).unwrap();
        let twice = normalize(&serde_json::to_value(&once).unwrap()).unwrap();
        assert_eq!(once, twice);
    }
}
