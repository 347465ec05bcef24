/*!
In-memory owner of one list kind. Active entries and history are a
single collection tagged by status, so an entry can't be in both.
!*/
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::entry::{Entry, Task, TodoEntry};
use crate::error::{Error, Result};
use crate::rules::{self, SortMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Active,
    /// `seq` grows with each completion; the highest is the most recent.
    Completed { seq: u64 },
}

#[derive(Debug, Clone)]
struct Record<T> {
    entry: T,
    status: Status,
}

#[derive(Debug, Clone)]
pub struct ListManager<T: Entry> {
    records: Vec<Record<T>>,
    sort: SortMode,
    next_seq: u64,
}

/// Changes to apply to an active task. `None` leaves the field alone.
#[derive(Debug, Default, Clone)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub duration: Option<u32>,
    pub urgency: Option<u8>,
    /// `Some(None)` clears the due date.
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl<T: Entry> ListManager<T> {
    pub fn new(sort: SortMode) -> Result<Self> {
        rules::check_sort(T::KIND, sort)?;
        Ok(ListManager {
            records: Vec::new(),
            sort,
            next_seq: 1,
        })
    }

    /// Rebuilds a manager from stored snapshots. `history` is expected
    /// most-recent first.
    pub fn from_snapshots(active: Vec<T>, history: Vec<T>, sort: SortMode) -> Result<Self> {
        let mut manager = Self::new(sort)?;
        for entry in active {
            if manager.position(entry.id()).is_some() {
                warn!(kind = %T::KIND, id = entry.id(), "id repeated in active snapshot, keeping the first");
                continue;
            }
            manager.records.push(Record {
                entry,
                status: Status::Active,
            });
        }
        let count = history.len() as u64;
        for (i, entry) in history.into_iter().enumerate() {
            match manager.status(entry.id()) {
                Some(Status::Active) => {
                    warn!(kind = %T::KIND, id = entry.id(), "entry is both active and in history, keeping it active");
                    continue;
                }
                Some(Status::Completed { .. }) => {
                    warn!(kind = %T::KIND, id = entry.id(), "id repeated in history snapshot, keeping the most recent");
                    continue;
                }
                None => {}
            }
            manager.records.push(Record {
                entry,
                status: Status::Completed {
                    seq: count - i as u64,
                },
            });
        }
        manager.next_seq = count + 1;
        debug!(kind = %T::KIND, records = manager.records.len(), "list loaded");
        Ok(manager)
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    pub fn set_sort(&mut self, mode: SortMode) -> Result<()> {
        rules::check_sort(T::KIND, mode)?;
        self.sort = mode;
        info!(kind = %T::KIND, %mode, "sort mode changed");
        Ok(())
    }

    /// Active entries ordered by the current sort mode.
    pub fn active(&self) -> Vec<&T> {
        let mut out: Vec<&T> = self
            .records
            .iter()
            .filter(|r| r.status == Status::Active)
            .map(|r| &r.entry)
            .collect();
        out.sort_by(|a, b| rules::compare(*a, *b, self.sort));
        out
    }

    /// Completed entries, most recently removed first.
    pub fn history(&self) -> Vec<&T> {
        let mut done: Vec<(u64, &T)> = self
            .records
            .iter()
            .filter_map(|r| match r.status {
                Status::Completed { seq } => Some((seq, &r.entry)),
                Status::Active => None,
            })
            .collect();
        done.sort_by(|a, b| b.0.cmp(&a.0));
        done.into_iter().map(|(_, e)| e).collect()
    }

    pub fn status(&self, id: &str) -> Option<Status> {
        self.position(id).map(|i| self.records[i].status)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.position(id).map(|i| &self.records[i].entry)
    }

    /// Moves an active entry to the front of history.
    pub fn complete(&mut self, id: &str) -> Result<&T> {
        let i = self.active_position(id)?;
        self.records[i].status = Status::Completed { seq: self.next_seq };
        self.next_seq += 1;
        info!(kind = %T::KIND, id, "entry completed");
        Ok(&self.records[i].entry)
    }

    /// Moves a history entry back to the active list.
    pub fn restore(&mut self, id: &str) -> Result<&T> {
        let i = self.history_position(id)?;
        let mut record = self.records.remove(i);
        record.status = Status::Active;
        self.records.push(record);
        info!(kind = %T::KIND, id, "entry restored");
        let last = self.records.len() - 1;
        Ok(&self.records[last].entry)
    }

    /// Permanently removes a history entry.
    pub fn delete(&mut self, id: &str) -> Result<T> {
        let i = self.history_position(id)?;
        let record = self.records.remove(i);
        info!(kind = %T::KIND, id, "entry deleted");
        Ok(record.entry)
    }

    fn insert(&mut self, mut entry: T) -> &T {
        // Ids are creation millis; two entries in the same millisecond get bumped.
        while self.position(entry.id()).is_some() {
            let bumped = entry
                .id()
                .parse::<i64>()
                .map(|n| (n + 1).to_string())
                .unwrap_or_else(|_| format!("{}-1", entry.id()));
            entry.set_id(bumped);
        }
        info!(kind = %T::KIND, id = entry.id(), "entry added");
        self.records.push(Record {
            entry,
            status: Status::Active,
        });
        let last = self.records.len() - 1;
        &self.records[last].entry
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.entry.id() == id)
    }

    fn active_position(&self, id: &str) -> Result<usize> {
        match self.position(id) {
            Some(i) if self.records[i].status == Status::Active => Ok(i),
            _ => Err(Error::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            }),
        }
    }

    fn history_position(&self, id: &str) -> Result<usize> {
        match self.position(id) {
            Some(i) if matches!(self.records[i].status, Status::Completed { .. }) => Ok(i),
            _ => Err(Error::NotInHistory {
                kind: T::KIND,
                id: id.to_string(),
            }),
        }
    }
}

impl ListManager<Task> {
    /// Adds a task. An empty title is ignored and returns `Ok(None)`.
    pub fn add_task(
        &mut self,
        title: &str,
        duration: u32,
        urgency: u8,
        due_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Option<&Task>> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(None);
        }
        let urgency = rules::check_urgency(urgency)?;
        Ok(Some(self.insert(Task::new(title, duration, urgency, due_date, now))))
    }

    pub fn edit(&mut self, id: &str, patch: TaskPatch) -> Result<&Task> {
        let i = self.active_position(id)?;
        if let Some(urgency) = patch.urgency {
            rules::check_urgency(urgency)?;
        }
        let task = &mut self.records[i].entry;
        if let Some(title) = patch.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            task.title = title.to_string();
        }
        if let Some(duration) = patch.duration {
            task.duration = duration;
        }
        if let Some(urgency) = patch.urgency {
            task.urgency = urgency;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        info!(id, "task edited");
        Ok(&self.records[i].entry)
    }
}

impl ListManager<TodoEntry> {
    /// Adds a checklist entry. Empty text is ignored and returns `None`.
    pub fn add_todo(&mut self, text: &str, now: DateTime<Utc>) -> Option<&TodoEntry> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(self.insert(TodoEntry::new(text, now)))
    }

    /// Checking a todo moves it to history.
    pub fn toggle(&mut self, id: &str) -> Result<&TodoEntry> {
        self.complete(id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn tasks() -> ListManager<Task> {
        let mut m = ListManager::new(SortMode::Priority).unwrap();
        m.add_task("B", 30, 2, None, t0()).unwrap();
        m.add_task("A", 60, 5, None, t0() + Duration::minutes(1)).unwrap();
        m.add_task("C", 0, 3, None, t0() + Duration::minutes(2)).unwrap();
        m
    }

    fn titles(list: Vec<&Task>) -> Vec<&str> {
        list.into_iter().map(|t| t.title.as_str()).collect()
    }

    fn id_of(m: &ListManager<Task>, title: &str) -> String {
        m.active()
            .into_iter()
            .find(|t| t.title == title)
            .map(|t| t.id.clone())
            .unwrap()
    }

    #[test]
    fn test_empty_title_is_ignored() {
        let mut m = ListManager::<Task>::new(SortMode::Priority).unwrap();
        assert!(m.add_task("", 10, 1, None, t0()).unwrap().is_none());
        assert!(m.add_task("   ", 10, 1, None, t0()).unwrap().is_none());
        assert!(m.active().is_empty());

        let mut todos = ListManager::<TodoEntry>::new(SortMode::Added).unwrap();
        assert!(todos.add_todo("", t0()).is_none());
        assert!(todos.active().is_empty());
    }

    #[test]
    fn test_invalid_urgency_is_rejected() {
        let mut m = ListManager::<Task>::new(SortMode::Priority).unwrap();
        assert!(matches!(
            m.add_task("X", 0, 6, None, t0()),
            Err(Error::InvalidUrgency(6))
        ));
        assert!(matches!(
            m.add_task("X", 0, 0, None, t0()),
            Err(Error::InvalidUrgency(0))
        ));
    }

    #[test]
    fn test_same_millisecond_ids_are_unique() {
        let mut m = ListManager::<TodoEntry>::new(SortMode::Added).unwrap();
        let a = m.add_todo("one", t0()).unwrap().id.clone();
        let b = m.add_todo("two", t0()).unwrap().id.clone();
        assert_ne!(a, b);
        assert_eq!(b, (t0().timestamp_millis() + 1).to_string());
    }

    #[test]
    fn test_active_follows_sort_mode() {
        let mut m = tasks();
        assert_eq!(titles(m.active()), vec!["A", "C", "B"]);
        m.set_sort(SortMode::Alpha).unwrap();
        assert_eq!(titles(m.active()), vec!["A", "B", "C"]);
        m.set_sort(SortMode::Added).unwrap();
        assert_eq!(titles(m.active()), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_complete_moves_to_front_of_history() {
        let mut m = tasks();
        let b = id_of(&m, "B");
        let c = id_of(&m, "C");
        m.complete(&b).unwrap();
        assert_eq!(titles(m.history()), vec!["B"]);
        m.complete(&c).unwrap();
        assert_eq!(titles(m.history()), vec!["C", "B"]);
        assert_eq!(titles(m.active()), vec!["A"]);
        assert!(matches!(m.status(&c), Some(Status::Completed { .. })));
    }

    #[test]
    fn test_restore_reinserts_by_sort_mode() {
        let mut m = tasks();
        let a = id_of(&m, "A");
        m.complete(&a).unwrap();
        assert_eq!(titles(m.active()), vec!["C", "B"]);
        m.restore(&a).unwrap();
        assert_eq!(titles(m.active()), vec!["A", "C", "B"]);
        assert!(m.history().is_empty());
        assert_eq!(m.status(&a), Some(Status::Active));
    }

    #[test]
    fn test_never_in_both_lists() {
        let mut m = tasks();
        let a = id_of(&m, "A");
        m.complete(&a).unwrap();
        m.restore(&a).unwrap();
        m.complete(&a).unwrap();
        let in_active = m.active().iter().any(|t| t.id == a);
        let in_history = m.history().iter().any(|t| t.id == a);
        assert!(!in_active && in_history);
    }

    #[test]
    fn test_delete_only_from_history() {
        let mut m = tasks();
        let a = id_of(&m, "A");
        assert!(matches!(m.delete(&a), Err(Error::NotInHistory { .. })));
        m.complete(&a).unwrap();
        let gone = m.delete(&a).unwrap();
        assert_eq!(gone.title, "A");
        assert!(m.get(&a).is_none());
        assert!(matches!(m.restore(&a), Err(Error::NotInHistory { .. })));
    }

    #[test]
    fn test_complete_unknown_is_not_found() {
        let mut m = tasks();
        assert!(matches!(m.complete("nope"), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_edit_keeps_created_and_ignores_empty_title() {
        let mut m = tasks();
        let b = id_of(&m, "B");
        let due = t0() + Duration::days(2);
        let task = m
            .edit(
                &b,
                TaskPatch {
                    title: Some("  ".to_string()),
                    duration: Some(45),
                    urgency: Some(4),
                    due_date: Some(Some(due)),
                },
            )
            .unwrap();
        assert_eq!(task.title, "B");
        assert_eq!(task.duration, 45);
        assert_eq!(task.urgency, 4);
        assert_eq!(task.due_date, Some(due));
        assert_eq!(task.created, t0());

        let task = m
            .edit(
                &b,
                TaskPatch {
                    due_date: Some(None),
                    ..TaskPatch::default()
                },
            )
            .unwrap();
        assert!(task.due_date.is_none());
        assert!(m.edit(&b, TaskPatch { urgency: Some(9), ..TaskPatch::default() }).is_err());
    }

    #[test]
    fn test_todos_toggle_and_reject_priority() {
        let mut m = ListManager::<TodoEntry>::new(SortMode::Alpha).unwrap();
        let id = m.add_todo("bread", t0()).unwrap().id.clone();
        m.add_todo("apples", t0() + Duration::seconds(1)).unwrap();
        m.toggle(&id).unwrap();
        assert_eq!(m.history()[0].text, "bread");
        assert!(m.set_sort(SortMode::Priority).is_err());
        assert!(ListManager::<TodoEntry>::new(SortMode::Priority).is_err());
    }

    #[test]
    fn test_snapshots_round_trip_through_manager() {
        let mut m = tasks();
        let b = id_of(&m, "B");
        let c = id_of(&m, "C");
        m.complete(&b).unwrap();
        m.complete(&c).unwrap();

        let active: Vec<Task> = m.active().into_iter().cloned().collect();
        let history: Vec<Task> = m.history().into_iter().cloned().collect();
        let mut loaded = ListManager::from_snapshots(active, history, m.sort()).unwrap();
        assert_eq!(titles(loaded.history()), vec!["C", "B"]);

        let a = id_of(&loaded, "A");
        loaded.complete(&a).unwrap();
        assert_eq!(titles(loaded.history()), vec!["A", "C", "B"]);
    }

    #[test]
    fn test_duplicates_within_a_snapshot_keep_first_copy() {
        let first = Task::new("First", 0, 1, None, t0());
        let mut second = first.clone();
        second.title = "Second".to_string();

        let m = ListManager::from_snapshots(
            vec![first.clone(), second.clone()],
            Vec::new(),
            SortMode::Alpha,
        )
        .unwrap();
        assert_eq!(titles(m.active()), vec!["First"]);

        let m = ListManager::from_snapshots(Vec::new(), vec![first, second], SortMode::Alpha).unwrap();
        assert_eq!(titles(m.history()), vec!["First"]);
    }

    #[test]
    fn test_duplicate_across_snapshots_stays_active() {
        let task = Task::new("Dup", 0, 1, None, t0());
        let m = ListManager::from_snapshots(vec![task.clone()], vec![task], SortMode::Alpha).unwrap();
        assert_eq!(m.active().len(), 1);
        assert!(m.history().is_empty());
    }
}
