use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

pub const MIN_TITLE_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub priority: Priority,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task as submitted by the user: everything except the store-assigned
/// `id`, `createdAt` and `updatedAt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    pub priority: Priority,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<DateTime<Utc>>,
}

/// Partial update merged onto an existing task. `None` leaves a field alone.
///
/// `target_date` tracks presence separately from value: `Some(None)` clears
/// the target date, `None` keeps whatever the task had.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_date: Option<Option<DateTime<Utc>>>,
}

// A key that is present, even as `null`, deserializes to `Some(..)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl Task {
    /// Builds a task from validated input. The caller owns id assignment.
    pub fn from_input(id: u32, input: TaskInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: input.title,
            description: input.description,
            category: input.category,
            priority: input.priority,
            status: input.status,
            target_date: input.target_date,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == Status::Done
    }

    /// Merges `update` onto this task and stamps `updated_at`.
    pub fn apply(&mut self, update: TaskUpdate, now: DateTime<Utc>) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(target_date) = update.target_date {
            self.target_date = target_date;
        }
        self.updated_at = now.max(self.created_at);
    }
}

impl TaskInput {
    /// Trims the title and checks its length. Enumerated fields are already
    /// guaranteed by their types.
    pub fn normalized(mut self) -> Result<Self, ValidationError> {
        self.title = normalize_title(&self.title)?;
        Ok(self)
    }
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.target_date.is_none()
    }

    pub fn normalized(mut self) -> Result<Self, ValidationError> {
        if let Some(title) = self.title.take() {
            self.title = Some(normalize_title(&title)?);
        }
        Ok(self)
    }

    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

impl From<TaskInput> for TaskUpdate {
    fn from(input: TaskInput) -> Self {
        Self {
            title: Some(input.title),
            description: Some(input.description),
            category: Some(input.category),
            priority: Some(input.priority),
            status: Some(input.status),
            target_date: Some(input.target_date),
        }
    }
}

pub(crate) fn normalize_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.chars().count() < MIN_TITLE_LEN {
        return Err(ValidationError::TitleTooShort { min: MIN_TITLE_LEN });
    }
    Ok(trimmed.to_string())
}

/// Declares a closed set of wire names with `FromStr`/`Display` on top.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(ValidationError::UnknownVariant {
                        field: $field,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

wire_enum! {
    Category, "category" {
        Work => "Work",
        Personal => "Personal",
        Study => "Study",
        Health => "Health",
        Finance => "Finance",
        Shopping => "Shopping",
        Projects => "Projects",
        Events => "Events",
        Goals => "Goals",
        Others => "Others",
    }
}

wire_enum! {
    Priority, "priority" {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

wire_enum! {
    Status, "status" {
        Todo => "todo",
        InProgress => "in-progress",
        Done => "done",
    }
}

impl Priority {
    /// Sort weight; higher sorts first.
    pub fn weight(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

impl Status {
    /// Sort weight; active work sorts first and finished work last.
    pub fn weight(self) -> u8 {
        match self {
            Status::InProgress => 2,
            Status::Todo => 1,
            Status::Done => 0,
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Work
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Todo
    }
}
