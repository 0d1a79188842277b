use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_date")]
    pub date: Option<String>,
    #[serde(default)]
    pub done: bool,
}

impl Task {
    /// An empty date means "no date", the same as on read.
    pub fn new(id: String, title: String, date: Option<String>) -> Self {
        Self {
            id,
            title,
            date: date.filter(|date| !date.is_empty()),
            done: false,
        }
    }
}

// Older saves wrote `""` for "no date"; read it the same as null.
fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|date| !date.is_empty()))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Done,
}

impl StatusFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => !task.done,
            StatusFilter::Done => task.done,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Active => "active",
            StatusFilter::Done => "done",
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "done" => Ok(StatusFilter::Done),
            other => Err(format!("unknown filter: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ViewQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub filter: StatusFilter,
    #[serde(default)]
    pub sort: SortDirection,
}

/// What to do when the saved collection can't be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptDataPolicy {
    /// Keep a copy of the unreadable value and start from an empty list.
    Reset,
    /// Refuse to start; the slot is left as it is.
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    EmptyTitle,
    InvalidDate(String),
}

impl std::fmt::Display for TaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskError::EmptyTitle => write!(f, "title must not be empty"),
            TaskError::InvalidDate(value) => {
                write!(f, "invalid date {value:?}, expected YYYY-MM-DD")
            }
        }
    }
}

impl std::error::Error for TaskError {}

/// Trims a title; `None` when nothing is left.
pub fn normalize_title(title: &str) -> Option<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Validates a date coming from the surface and returns its zero-padded form.
///
/// Empty or missing input means "no date". Sorting compares the stored text, so
/// only the canonical `YYYY-MM-DD` layout is ever kept.
pub fn normalize_date(date: Option<&str>) -> Result<Option<String>, TaskError> {
    let Some(raw) = date.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(|parsed| Some(parsed.format(DATE_FORMAT).to_string()))
        .map_err(|_| TaskError::InvalidDate(raw.to_string()))
}

pub fn new_task_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
