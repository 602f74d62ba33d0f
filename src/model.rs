use chrono::NaiveDate;
use rand::{distributions::Alphanumeric, Rng};

const ID_LEN: usize = 8;

pub type EntryId = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub id: EntryId,
    pub date: NaiveDate,
    pub title: String,
    pub content: String,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("no entry at position {index} (journal has {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("entry not found: {0}")]
    EntryNotFound(EntryId),
}

/// Ordered, in-memory journal. Positions follow insertion order and shift
/// left when an earlier entry is deleted; ids never change.
#[derive(Debug, Default, Clone)]
pub struct EntryStore {
    entries: Vec<JournalEntry>,
}

impl JournalEntry {
    pub fn new(date: NaiveDate, title: impl Into<String>, content: impl Into<String>) -> Self {
        JournalEntry {
            id: generate_id(),
            date,
            title: title.into(),
            content: content.into(),
        }
    }

    pub fn heading(&self) -> String {
        format!("{} - {}", self.date.format("%Y-%m-%d"), self.title)
    }
}

impl EntryStore {
    pub fn new() -> Self {
        EntryStore::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn list(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&JournalEntry> {
        self.entries.get(index)
    }

    pub fn find(&self, id: &str) -> Option<&JournalEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn append(&mut self, mut entry: JournalEntry) -> EntryId {
        while self.find(&entry.id).is_some() {
            entry.id = generate_id();
        }
        let id = entry.id.clone();
        self.entries.push(entry);
        id
    }

    /// Replaces the entry at `index`. The stored entry keeps its id.
    pub fn update_at(&mut self, index: usize, entry: JournalEntry) -> Result<(), StoreError> {
        let len = self.entries.len();
        let slot = self
            .entries
            .get_mut(index)
            .ok_or(StoreError::IndexOutOfRange { index, len })?;
        let id = std::mem::take(&mut slot.id);
        *slot = JournalEntry { id, ..entry };
        Ok(())
    }

    pub fn delete_at(&mut self, index: usize) -> Result<JournalEntry, StoreError> {
        if index >= self.entries.len() {
            return Err(StoreError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        Ok(self.entries.remove(index))
    }

    pub fn update(&mut self, id: &str, entry: JournalEntry) -> Result<(), StoreError> {
        let index = self
            .position_of(id)
            .ok_or_else(|| StoreError::EntryNotFound(id.to_string()))?;
        self.update_at(index, entry)
    }

    pub fn delete(&mut self, id: &str) -> Result<JournalEntry, StoreError> {
        let index = self
            .position_of(id)
            .ok_or_else(|| StoreError::EntryNotFound(id.to_string()))?;
        self.delete_at(index)
    }
}

fn generate_id() -> EntryId {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn summary(store: &EntryStore) -> Vec<(NaiveDate, String, String)> {
        store
            .list()
            .iter()
            .map(|e| (e.date, e.title.clone(), e.content.clone()))
            .collect()
    }

    #[test]
    fn list_keeps_append_order() {
        let mut store = EntryStore::new();
        for title in ["first", "second", "third", "fourth"] {
            store.append(JournalEntry::new(day(2024, 3, 1), title, ""));
        }
        let titles: Vec<&str> = store.list().iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third", "fourth"]);
    }

    #[test]
    fn update_at_replaces_only_that_position() {
        let mut store = EntryStore::new();
        store.append(JournalEntry::new(day(2024, 1, 1), "A", "a"));
        let kept_id = store.append(JournalEntry::new(day(2024, 1, 2), "B", "b"));
        store.append(JournalEntry::new(day(2024, 1, 3), "C", "c"));

        store
            .update_at(1, JournalEntry::new(day(2024, 2, 2), "B2", "b2"))
            .unwrap();

        assert_eq!(
            summary(&store),
            vec![
                (day(2024, 1, 1), "A".to_string(), "a".to_string()),
                (day(2024, 2, 2), "B2".to_string(), "b2".to_string()),
                (day(2024, 1, 3), "C".to_string(), "c".to_string()),
            ]
        );
        assert_eq!(store.list()[1].id, kept_id);
    }

    #[test]
    fn delete_at_shifts_later_entries() {
        let mut store = EntryStore::new();
        store.append(JournalEntry::new(day(2024, 1, 1), "A", "hello"));
        store.append(JournalEntry::new(day(2024, 1, 2), "B", "world"));
        assert_eq!(store.len(), 2);

        let removed = store.delete_at(0).unwrap();
        assert_eq!(removed.title, "A");
        assert_eq!(
            summary(&store),
            vec![(day(2024, 1, 2), "B".to_string(), "world".to_string())]
        );
    }

    #[test]
    fn out_of_range_leaves_store_unchanged() {
        let mut store = EntryStore::new();
        store.append(JournalEntry::new(day(2024, 1, 1), "A", "a"));
        let before = store.list().to_vec();

        assert_eq!(
            store.delete_at(1),
            Err(StoreError::IndexOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(
            store.update_at(5, JournalEntry::new(day(2024, 1, 9), "Z", "z")),
            Err(StoreError::IndexOutOfRange { index: 5, len: 1 })
        );
        assert_eq!(store.list(), before.as_slice());

        let mut empty = EntryStore::new();
        assert!(empty.delete_at(0).is_err());
    }

    #[test]
    fn id_operations_survive_position_shift() {
        let mut store = EntryStore::new();
        store.append(JournalEntry::new(day(2024, 1, 1), "A", "a"));
        let b = store.append(JournalEntry::new(day(2024, 1, 2), "B", "b"));
        let c = store.append(JournalEntry::new(day(2024, 1, 3), "C", "c"));

        store.delete_at(0).unwrap();
        assert_eq!(store.position_of(&c), Some(1));

        store
            .update(&c, JournalEntry::new(day(2024, 1, 3), "C2", "c"))
            .unwrap();
        assert_eq!(store.get(1).map(|e| e.title.as_str()), Some("C2"));

        store.delete(&b).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.delete(&b),
            Err(StoreError::EntryNotFound(b.clone()))
        );
    }

    #[test]
    fn heading_formats_date_and_title() {
        let entry = JournalEntry::new(day(2024, 1, 2), "Morning pages", "");
        assert_eq!(entry.heading(), "2024-01-02 - Morning pages");
    }
}
