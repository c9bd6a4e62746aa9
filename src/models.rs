use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Workflow column a task sits in.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Backlog,
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Backlog => "backlog",
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "backlog" => Ok(TaskStatus::Backlog),
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" | "doing" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(format!("unknown status '{}' (backlog, todo, in_progress, done)", other)),
        }
    }
}

/// How much energy a task demands. Ordered low to high.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum EnergyLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for EnergyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EnergyLevel::Low => "low",
            EnergyLevel::Medium => "medium",
            EnergyLevel::High => "high",
        };
        f.write_str(s)
    }
}

impl FromStr for EnergyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "l" => Ok(EnergyLevel::Low),
            "medium" | "med" | "m" => Ok(EnergyLevel::Medium),
            "high" | "h" => Ok(EnergyLevel::High),
            other => Err(format!("unknown energy level '{}' (low, medium, high)", other)),
        }
    }
}

/// Recurrence pattern of a task template.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceType {
    #[default]
    None,
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

impl RecurrenceType {
    pub fn is_recurring(&self) -> bool {
        *self != RecurrenceType::None
    }
}

impl fmt::Display for RecurrenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecurrenceType::None => "none",
            RecurrenceType::Daily => "daily",
            RecurrenceType::Weekly => "weekly",
            RecurrenceType::Biweekly => "biweekly",
            RecurrenceType::Monthly => "monthly",
        };
        f.write_str(s)
    }
}

impl FromStr for RecurrenceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(RecurrenceType::None),
            "daily" => Ok(RecurrenceType::Daily),
            "weekly" => Ok(RecurrenceType::Weekly),
            "biweekly" => Ok(RecurrenceType::Biweekly),
            "monthly" => Ok(RecurrenceType::Monthly),
            other => Err(format!(
                "unknown recurrence '{}' (none, daily, weekly, biweekly, monthly)",
                other
            )),
        }
    }
}

/// Represents a single task tracked by the engine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    /// Unique identifier for the task.
    pub id: u64,
    /// Short description shown on cards and lists.
    pub title: String,
    /// Optional project or category the task belongs to.
    #[serde(default)]
    pub project: Option<String>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    /// Critical tasks sort ahead of everything else.
    #[serde(default)]
    pub critical: bool,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default, with = "hhmm")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm")]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Equal to today: manually added to My Day. Before today: dismissed from it.
    #[serde(default)]
    pub my_day_date: Option<NaiveDate>,
    /// Estimated duration in minutes.
    #[serde(default)]
    pub time_estimate: Option<u32>,
    #[serde(default)]
    pub energy_level: EnergyLevel,
    #[serde(default)]
    pub recurrence_type: RecurrenceType,
    /// Task this occurrence was generated from.
    #[serde(default)]
    pub recurrence_parent_id: Option<u64>,
    /// Series shared by a recurring template and all of its occurrences.
    #[serde(default)]
    pub series_id: Option<Uuid>,
    /// Ids of tasks that must be done before this one.
    #[serde(default)]
    pub dependencies: BTreeSet<u64>,
    pub created_at: DateTime<Utc>,
    /// Present iff `status == Done`.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    /// Whether the task sits on the grid for some day.
    pub fn is_scheduled(&self) -> bool {
        self.start_date.is_some() && self.start_time.is_some()
    }
}

/// Input for creating a task. Everything but the title is optional.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub project: Option<String>,
    pub notes: Option<String>,
    pub status: Option<TaskStatus>,
    pub critical: bool,
    pub start_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub due_date: Option<NaiveDate>,
    pub my_day_date: Option<NaiveDate>,
    pub time_estimate: Option<u32>,
    pub energy_level: Option<EnergyLevel>,
    pub recurrence_type: RecurrenceType,
    pub recurrence_parent_id: Option<u64>,
    pub series_id: Option<Uuid>,
    pub dependencies: BTreeSet<u64>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        TaskDraft {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Shallow-merge update. `None` leaves a field alone; `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub project: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub critical: Option<bool>,
    pub start_date: Option<Option<NaiveDate>>,
    pub start_time: Option<Option<NaiveTime>>,
    pub end_time: Option<Option<NaiveTime>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub my_day_date: Option<Option<NaiveDate>>,
    pub time_estimate: Option<Option<u32>>,
    pub energy_level: Option<EnergyLevel>,
    pub recurrence_type: Option<RecurrenceType>,
    pub dependencies: Option<BTreeSet<u64>>,
}

/// Serializes times of day as zero-padded `HH:MM`.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(t) => serializer.serialize_str(&t.format("%H:%M").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) => NaiveTime::parse_from_str(&s, "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(&s, "%H:%M:%S"))
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
