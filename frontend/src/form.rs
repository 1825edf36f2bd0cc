use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde_json::{json, Value};
use synapse_shared::schema::validate_create;
use synapse_shared::{Category, Priority, Status, Task, TaskInput, ValidationError};

/// Format of a `datetime-local` input value.
const PICKER_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// State of the add/edit task dialog.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub priority: Priority,
    pub status: Status,
    /// Raw picker value in local time; empty means no target date.
    pub target_date: String,
    pub error: Option<String>,
}

impl TaskForm {
    pub fn for_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            category: task.category,
            priority: task.priority,
            status: task.status,
            target_date: task
                .target_date
                .map(|target| picker_value(&target, &Local))
                .unwrap_or_default(),
            error: None,
        }
    }

    /// Validates the form the same way stored records are validated.
    pub fn submit(&self) -> Result<TaskInput, ValidationError> {
        self.submit_in(&Local)
    }

    fn submit_in<Tz: TimeZone>(&self, tz: &Tz) -> Result<TaskInput, ValidationError> {
        validate_create(&self.record(tz)?)
    }

    fn record<Tz: TimeZone>(&self, tz: &Tz) -> Result<Value, ValidationError> {
        let target_date = match picker_to_utc(&self.target_date, tz)? {
            Some(point) => Value::String(point.to_rfc3339()),
            None => Value::Null,
        };
        Ok(json!({
            "title": self.title,
            "description": self.description,
            "category": self.category.as_str(),
            "priority": self.priority.as_str(),
            "status": self.status.as_str(),
            "targetDate": target_date,
        }))
    }
}

fn picker_value<Tz>(point: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    point.with_timezone(tz).format(PICKER_FORMAT).to_string()
}

fn picker_to_utc<Tz: TimeZone>(
    value: &str,
    tz: &Tz,
) -> Result<Option<DateTime<Utc>>, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let invalid = || ValidationError::InvalidDate {
        field: "targetDate",
        value: value.to_string(),
    };
    let naive = NaiveDateTime::parse_from_str(value, PICKER_FORMAT).map_err(|_| invalid())?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| Some(local.with_timezone(&Utc)))
        .ok_or_else(invalid)
}
