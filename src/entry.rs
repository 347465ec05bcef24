use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::duration::parse_duration;

/// Which of the two lists an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Tasks,
    Todos,
}

impl ListKind {
    pub fn active_key(&self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Todos => "todos",
        }
    }

    pub fn history_key(&self) -> &'static str {
        match self {
            Self::Tasks => "tasks_history",
            Self::Todos => "todos_history",
        }
    }

    pub fn sort_key(&self) -> &'static str {
        match self {
            Self::Tasks => "tasks_sort",
            Self::Todos => "todos_sort",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tasks => f.write_str("task"),
            Self::Todos => f.write_str("todo"),
        }
    }
}

/// Common surface of everything a `ListManager` can hold.
pub trait Entry: Clone + fmt::Debug + Serialize + DeserializeOwned {
    const KIND: ListKind;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    /// Title for tasks, text for todos. Used for alphabetical ordering.
    fn label(&self) -> &str;
    fn created(&self) -> DateTime<Utc>;
    /// Base urgency; entries without a priority concept return `None`.
    fn urgency(&self) -> Option<u8> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "minutes_or_text")]
    pub duration: u32,
    pub urgency: u8,
    pub created: DateTime<Utc>,
    #[serde(rename = "dueDate", default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(
        title: &str,
        duration: u32,
        urgency: u8,
        due_date: Option<DateTime<Utc>>,
        created: DateTime<Utc>,
    ) -> Self {
        Task {
            id: created.timestamp_millis().to_string(),
            title: title.to_string(),
            duration,
            urgency,
            created,
            due_date,
        }
    }
}

impl Entry for Task {
    const KIND: ListKind = ListKind::Tasks;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.title
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn urgency(&self) -> Option<u8> {
        Some(self.urgency)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoEntry {
    pub id: String,
    pub text: String,
    pub created: DateTime<Utc>,
}

impl TodoEntry {
    pub fn new(text: &str, created: DateTime<Utc>) -> Self {
        TodoEntry {
            id: created.timestamp_millis().to_string(),
            text: text.to_string(),
            created,
        }
    }
}

impl Entry for TodoEntry {
    const KIND: ListKind = ListKind::Todos;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.text
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }
}

/// A due date typed as a calendar day means midnight UTC of that day.
pub fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Older snapshots stored the duration as the raw text typed into the form.
fn minutes_or_text<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Minutes(u32),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Minutes(m) => m,
        Raw::Text(s) => parse_duration(&s),
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_task_id_is_creation_millis() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let task = Task::new("Write report", 90, 3, None, created);
        assert_eq!(task.id, created.timestamp_millis().to_string());
        assert_eq!(task.urgency(), Some(3));
    }

    #[test]
    fn test_todo_has_no_urgency() {
        let todo = TodoEntry::new("Milk", Utc::now());
        assert_eq!(todo.urgency(), None);
        assert_eq!(todo.label(), "Milk");
    }

    #[test]
    fn test_task_uses_stored_field_names() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let task = Task::new("A", 75, 2, Some(created), created);
        let json = serde_json::to_value(&task).unwrap();
        assert!(json.get("dueDate").is_some());
        assert_eq!(json["duration"], 75);
    }

    #[test]
    fn test_task_accepts_legacy_records() {
        let json = r#"{
            "id": "1704067200000",
            "title": "Legacy",
            "duration": "1h 15m",
            "urgency": 4,
            "created": "2024-01-01T00:00:00.000Z",
            "dueDate": null
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.duration, 75);
        assert_eq!(task.due_date, None);
        assert_eq!(task.created, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_task_without_due_date_field() {
        let json = r#"{"id":"1","title":"T","duration":"","urgency":1,"created":"2024-01-01T00:00:00Z"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.duration, 0);
        assert!(task.due_date.is_none());
    }
}
