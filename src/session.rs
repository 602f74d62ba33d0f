//! One interactive journaling session: the entry store, the draft being
//! edited and the sprint timer, plus the notice shown after each action.

use crate::editor::{Committed, EditorDraft};
use crate::model::{EntryStore, JournalEntry, StoreError};
use crate::timer::{Countdown, Timer};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Failure(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    Idle,
    Running(Countdown),
    Expired,
}

#[derive(Debug)]
pub struct Session {
    store: EntryStore,
    draft: EditorDraft,
    timer: Timer,
    times_up: bool,
    notice: Option<Notice>,
}

impl Session {
    pub fn new(timer_minutes: u32, today: NaiveDate) -> Self {
        Session {
            store: EntryStore::new(),
            draft: EditorDraft::new(today),
            timer: Timer::new(timer_minutes),
            times_up: false,
            notice: None,
        }
    }

    pub fn entries(&self) -> &[JournalEntry] {
        self.store.list()
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn draft(&self) -> &EditorDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut EditorDraft {
        &mut self.draft
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn times_up(&self) -> bool {
        self.times_up
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// Adds or updates from the current draft.
    pub fn submit(&mut self, today: NaiveDate) -> Result<Committed, StoreError> {
        match self.draft.commit(&mut self.store, today) {
            Ok(Committed::Added(id)) => {
                info!(entry = %id, total = self.store.len(), "entry added");
                self.notice = Some(Notice::Success("Entry added successfully!".into()));
                Ok(Committed::Added(id))
            }
            Ok(Committed::Updated(id)) => {
                info!(entry = %id, "entry updated");
                self.notice = Some(Notice::Success("Entry updated successfully!".into()));
                Ok(Committed::Updated(id))
            }
            Err(err) => Err(self.fail("update", err)),
        }
    }

    pub fn begin_edit(&mut self, index: usize) -> Result<(), StoreError> {
        self.draft
            .begin_edit(&self.store, index)
            .map_err(|err| self.fail("edit", err))
    }

    pub fn cancel_edit(&mut self, today: NaiveDate) {
        self.draft.cancel(today);
        self.notice = None;
    }

    pub fn delete(
        &mut self,
        index: usize,
        today: NaiveDate,
    ) -> Result<JournalEntry, StoreError> {
        match self.store.delete_at(index) {
            Ok(entry) => {
                info!(entry = %entry.id, total = self.store.len(), "entry deleted");
                if self.draft.editing() == Some(entry.id.as_str()) {
                    self.draft.begin_new(today);
                }
                self.notice = Some(Notice::Success("Entry deleted successfully!".into()));
                Ok(entry)
            }
            Err(err) => Err(self.fail("delete", err)),
        }
    }

    pub fn set_timer_minutes(&mut self, minutes: i64) -> u32 {
        self.timer.set_duration(minutes)
    }

    pub fn start_timer(&mut self, now: DateTime<Utc>) {
        self.timer.start(now);
        self.times_up = false;
        info!(minutes = self.timer.duration_minutes(), "timer started");
    }

    pub fn stop_timer(&mut self) {
        if self.timer.is_running() {
            info!("timer stopped");
        }
        self.timer.stop();
    }

    /// Re-evaluates the countdown; stops the timer once it reaches zero.
    pub fn poll_timer(&mut self, now: DateTime<Utc>) -> TimerStatus {
        match self.timer.tick(now) {
            None => TimerStatus::Idle,
            Some(countdown) if countdown.is_expired() => {
                self.timer.stop();
                self.times_up = true;
                info!("timer expired");
                TimerStatus::Expired
            }
            Some(countdown) => TimerStatus::Running(countdown),
        }
    }

    fn fail(&mut self, action: &str, err: StoreError) -> StoreError {
        warn!(%err, action, "journal action rejected");
        self.notice = Some(Notice::Failure(format!("Could not {}: {}", action, err)));
        err
    }
}
