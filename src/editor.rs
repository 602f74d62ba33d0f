use crate::model::{EntryId, EntryStore, JournalEntry, StoreError};
use chrono::NaiveDate;
use tracing::debug;

/// The entry currently being composed in the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorDraft {
    pub date: NaiveDate,
    pub title: String,
    pub content: String,
    editing: Option<EntryId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Committed {
    Added(EntryId),
    Updated(EntryId),
}

impl EditorDraft {
    pub fn new(today: NaiveDate) -> Self {
        EditorDraft {
            date: today,
            title: String::new(),
            content: String::new(),
            editing: None,
        }
    }

    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn begin_new(&mut self, today: NaiveDate) {
        *self = EditorDraft::new(today);
    }

    /// Loads the entry at `index` and targets it by id, so later deletes of
    /// other entries do not redirect the commit.
    pub fn begin_edit(&mut self, store: &EntryStore, index: usize) -> Result<(), StoreError> {
        let entry = store.get(index).ok_or(StoreError::IndexOutOfRange {
            index,
            len: store.len(),
        })?;
        self.begin_edit_entry(entry);
        Ok(())
    }

    pub fn begin_edit_entry(&mut self, entry: &JournalEntry) {
        debug!(entry = %entry.id, "editing entry");
        *self = EditorDraft {
            date: entry.date,
            title: entry.title.clone(),
            content: entry.content.clone(),
            editing: Some(entry.id.clone()),
        };
    }

    pub fn to_entry(&self) -> JournalEntry {
        JournalEntry::new(self.date, self.title.clone(), self.content.clone())
    }

    /// Appends or updates depending on the editing target. The draft is only
    /// reset when the store accepted the change.
    pub fn commit(
        &mut self,
        store: &mut EntryStore,
        today: NaiveDate,
    ) -> Result<Committed, StoreError> {
        let entry = self.to_entry();
        let committed = match &self.editing {
            None => Committed::Added(store.append(entry)),
            Some(id) => {
                store.update(id, entry)?;
                Committed::Updated(id.clone())
            }
        };
        self.begin_new(today);
        Ok(committed)
    }

    pub fn cancel(&mut self, today: NaiveDate) {
        self.begin_new(today);
    }
}
