use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maintenance request type. Unknown values coming from the server are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskType {
    Corrective,
    Preventive,
    Other(String),
}

impl TaskType {
    pub fn as_str(&self) -> &str {
        match self {
            TaskType::Corrective => "CORRECTIVE",
            TaskType::Preventive => "PREVENTIVE",
            TaskType::Other(s) => s,
        }
    }

    /// Calendar ordering key: corrective work is listed first.
    pub fn sort_rank(&self) -> u8 {
        match self {
            TaskType::Corrective => 0,
            _ => 1,
        }
    }
}

impl From<String> for TaskType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "CORRECTIVE" => TaskType::Corrective,
            "PREVENTIVE" => TaskType::Preventive,
            _ => TaskType::Other(value),
        }
    }
}

impl From<TaskType> for String {
    fn from(value: TaskType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    New,
    NewRequest,
    InProgress,
    Required,
    Scrap,
    UnderReview,
    Other(String),
}

impl TaskStatus {
    /// The six board columns, in display order.
    pub const COLUMNS: [TaskStatus; 6] = [
        TaskStatus::New,
        TaskStatus::NewRequest,
        TaskStatus::InProgress,
        TaskStatus::Required,
        TaskStatus::Scrap,
        TaskStatus::UnderReview,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::New => "NEW",
            TaskStatus::NewRequest => "NEW_REQUEST",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Required => "REQUIRED",
            TaskStatus::Scrap => "SCRAP",
            TaskStatus::UnderReview => "UNDER_REVIEW",
            TaskStatus::Other(s) => s,
        }
    }

    /// Finished tasks never carry an overdue warning.
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskStatus::Required | TaskStatus::Scrap)
    }
}

impl From<String> for TaskStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "NEW" => TaskStatus::New,
            "NEW_REQUEST" => TaskStatus::NewRequest,
            "IN_PROGRESS" => TaskStatus::InProgress,
            "REQUIRED" => TaskStatus::Required,
            "SCRAP" => TaskStatus::Scrap,
            "UNDER_REVIEW" => TaskStatus::UnderReview,
            _ => TaskStatus::Other(value),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(value: TaskStatus) -> Self {
        value.as_str().to_string()
    }
}

impl From<&str> for TaskStatus {
    fn from(value: &str) -> Self {
        TaskStatus::from(value.to_string())
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub status: TaskStatus,
    #[serde(default, alias = "scheduled_date")]
    pub scheduled_date: Option<String>,
    #[serde(default, alias = "due_date")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Task {
    /// Calendar day the task is shown on: scheduled date, falling back to the due date.
    pub fn placement_date(&self) -> Option<NaiveDate> {
        let raw = non_empty(self.scheduled_date.as_deref()).or(non_empty(self.due_date.as_deref()))?;
        parse_local_datetime(raw).map(|dt| dt.date_naive())
    }

    pub fn due_instant(&self) -> Option<DateTime<Local>> {
        non_empty(self.due_date.as_deref()).and_then(parse_local_datetime)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Parse the date formats the server emits into a local instant.
/// Date-only values resolve to local midnight at the start of that day.
pub fn parse_local_datetime(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }
    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    Local.from_local_datetime(&naive).earliest()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technician {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TechniciansResponse {
    #[serde(default)]
    pub technicians: Vec<Technician>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RequestsResponse {
    #[serde(default)]
    pub requests: Vec<Task>,
}

/// Body of a create-request call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateRequest {
    pub title: String,
    pub description: String,
    pub technician_id: i64,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub scheduled_date: String,
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CreateResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub task_id: i64,
    pub new_status: TaskStatus,
}

/// Seed document for the board, shaped like the page-embedded payload.
#[derive(Debug, Default, Deserialize)]
pub struct KanbanPayload {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone)]
pub struct ConfigItem {
    pub key_name: String,
    pub value: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Calendar,
    Kanban,
    Configs,
}

impl View {
    pub const ALL: [View; 3] = [View::Calendar, View::Kanban, View::Configs];

    pub fn title(self) -> &'static str {
        match self {
            View::Calendar => "Calendar",
            View::Kanban => "Kanban",
            View::Configs => "Configs",
        }
    }

    pub fn index(self) -> usize {
        match self {
            View::Calendar => 0,
            View::Kanban => 1,
            View::Configs => 2,
        }
    }

    pub fn next(self) -> View {
        View::ALL[(self.index() + 1) % View::ALL.len()]
    }

    pub fn previous(self) -> View {
        View::ALL[(self.index() + View::ALL.len() - 1) % View::ALL.len()]
    }
}
