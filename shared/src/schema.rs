//! Validation and coercion of untyped task records.
//!
//! Input arrives as JSON from two places: the persisted slot and the task
//! form. Both go through the same rules. Unknown keys are ignored; enumerated
//! fields must match their wire names exactly; date fields accept RFC 3339
//! text, naive date-times (read as UTC), bare dates (UTC midnight), or epoch
//! milliseconds.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::task::{normalize_title, Category, Priority, Status, Task, TaskInput, TaskUpdate};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Validates a complete stored task record.
pub fn validate_task(raw: &Value) -> Result<Task, ValidationError> {
    let fields = object(raw)?;
    let id = id(fields)?;
    let input = create_fields(fields)?;
    let created_at = required_date(fields, "createdAt")?;
    let updated_at = required_date(fields, "updatedAt")?;
    if created_at > updated_at {
        return Err(ValidationError::TimestampsOutOfOrder);
    }

    Ok(Task {
        id,
        title: input.title,
        description: input.description,
        category: input.category,
        priority: input.priority,
        status: input.status,
        target_date: input.target_date,
        created_at,
        updated_at,
    })
}

/// Validates a creation record. Store-assigned keys, if present, are ignored.
pub fn validate_create(raw: &Value) -> Result<TaskInput, ValidationError> {
    create_fields(object(raw)?)
}

/// Validates only the keys that are present. A `null` target date is kept as
/// an explicit clear.
pub fn validate_update(raw: &Value) -> Result<TaskUpdate, ValidationError> {
    let fields = object(raw)?;
    let mut update = TaskUpdate::default();

    if let Some(value) = present(fields, "title") {
        update.title = Some(normalize_title(string(value, "title")?)?);
    }
    if let Some(value) = present(fields, "description") {
        update.description = Some(string(value, "description")?.to_string());
    }
    if let Some(value) = present(fields, "category") {
        update.category = Some(enumerated::<Category>(value, "category")?);
    }
    if let Some(value) = present(fields, "priority") {
        update.priority = Some(enumerated::<Priority>(value, "priority")?);
    }
    if let Some(value) = present(fields, "status") {
        update.status = Some(enumerated::<Status>(value, "status")?);
    }
    if let Some(value) = fields.get("targetDate") {
        update.target_date = Some(match value {
            Value::Null => None,
            other => Some(coerce_date(other, "targetDate")?),
        });
    }

    Ok(update)
}

/// Coerces a date-like JSON value into a UTC point in time.
pub fn coerce_date(value: &Value, field: &'static str) -> Result<DateTime<Utc>, ValidationError> {
    let invalid = || ValidationError::InvalidDate {
        field,
        value: value.to_string(),
    };

    match value {
        Value::String(text) => parse_date_text(text.trim()).ok_or_else(invalid),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|millis| millis as i64))
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            .ok_or_else(invalid),
        _ => Err(ValidationError::WrongType {
            field,
            expected: "a date string or epoch milliseconds",
        }),
    }
}

fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn create_fields(fields: &Map<String, Value>) -> Result<TaskInput, ValidationError> {
    let title = normalize_title(string(required(fields, "title")?, "title")?)?;
    let description = match present(fields, "description") {
        Some(value) => string(value, "description")?.to_string(),
        None => String::new(),
    };
    let target_date = match present(fields, "targetDate") {
        Some(value) => Some(coerce_date(value, "targetDate")?),
        None => None,
    };

    Ok(TaskInput {
        title,
        description,
        category: enumerated(required(fields, "category")?, "category")?,
        priority: enumerated(required(fields, "priority")?, "priority")?,
        status: enumerated(required(fields, "status")?, "status")?,
        target_date,
    })
}

fn object(raw: &Value) -> Result<&Map<String, Value>, ValidationError> {
    raw.as_object().ok_or(ValidationError::NotAnObject {
        found: kind(raw),
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// Treats an explicit `null` the same as an absent key.
fn present<'a>(fields: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    fields.get(field).filter(|value| !value.is_null())
}

fn required<'a>(
    fields: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Value, ValidationError> {
    present(fields, field).ok_or(ValidationError::Missing { field })
}

fn required_date(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<DateTime<Utc>, ValidationError> {
    coerce_date(required(fields, field)?, field)
}

fn string<'a>(value: &'a Value, field: &'static str) -> Result<&'a str, ValidationError> {
    value.as_str().ok_or(ValidationError::WrongType {
        field,
        expected: "a string",
    })
}

fn enumerated<T>(value: &Value, field: &'static str) -> Result<T, ValidationError>
where
    T: std::str::FromStr<Err = ValidationError>,
{
    string(value, field)?.parse()
}

fn id(fields: &Map<String, Value>) -> Result<u32, ValidationError> {
    required(fields, "id")?
        .as_u64()
        .and_then(|id| u32::try_from(id).ok())
        .ok_or(ValidationError::WrongType {
            field: "id",
            expected: "a non-negative integer",
        })
}
