use serde::{Deserialize, Serialize};

/// One entry in a task's activity log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Activity kind; PV lifecycle operations always append `"commented"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Free-text description ("a créé un PV de surveillance", ...).
    pub activity: String,
    /// Authoring user id.
    pub by: String,
    /// ISO 8601 / RFC 3339 timestamp string.
    pub date: String,
}

impl ActivityRecord {
    pub fn commented(activity: impl Into<String>, by: &str, date: &str) -> Self {
        Self {
            kind: "commented".to_string(),
            activity: activity.into(),
            by: by.to_string(),
            date: date.to_string(),
        }
    }
}

/// The task collaborator: owns a list of PV ids and an activity log.
///
/// The task subsystem itself lives elsewhere; this record carries only the
/// surface the PV lifecycle touches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub pvs: Vec<String>,
    #[serde(default)]
    pub activities: Vec<ActivityRecord>,
}

impl TaskRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            pvs: Vec::new(),
            activities: Vec::new(),
        }
    }
}

/// Authoring user, resolved into responses as `{_id, name, email}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
}
