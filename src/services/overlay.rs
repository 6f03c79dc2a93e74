use std::sync::Mutex;

use tracing::debug;
use uuid::Uuid;

use crate::models::record::DailyRecord;

/// Lifecycle of a staged local write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    Pending,
    Confirmed,
    RolledBack,
}

#[derive(Debug, Clone)]
struct StagedWrite {
    id: String,
    record: DailyRecord,
    state: WriteState,
}

/// Local overlay of tentative record writes over the authoritative store.
///
/// The UI stages a write before the server confirms it; aggregation only
/// ever sees confirmed data, so optimistic state never leaks into report
/// math. Writes are keyed by an opaque id and resolved to confirmed or
/// rolled back exactly once.
pub struct WriteOverlay {
    writes: Mutex<Vec<StagedWrite>>,
}

impl WriteOverlay {
    pub fn new() -> Self {
        Self {
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Stage a tentative record write; returns the write id.
    pub fn stage(&self, record: DailyRecord) -> String {
        let id = Uuid::new_v4().to_string();
        let mut guard = self.writes.lock().expect("overlay lock poisoned");
        debug!(
            target: "app::report",
            write_id = %id,
            owner_id = %record.owner_id,
            date = %record.date,
            "staged tentative write"
        );
        guard.push(StagedWrite {
            id: id.clone(),
            record,
            state: WriteState::Pending,
        });
        id
    }

    pub fn confirm(&self, write_id: &str) -> bool {
        self.transition(write_id, WriteState::Confirmed)
    }

    pub fn roll_back(&self, write_id: &str) -> bool {
        self.transition(write_id, WriteState::RolledBack)
    }

    fn transition(&self, write_id: &str, next: WriteState) -> bool {
        let mut guard = self.writes.lock().expect("overlay lock poisoned");
        match guard
            .iter_mut()
            .find(|write| write.id == write_id && write.state == WriteState::Pending)
        {
            Some(write) => {
                write.state = next;
                true
            }
            None => false,
        }
    }

    pub fn state_of(&self, write_id: &str) -> Option<WriteState> {
        let guard = self.writes.lock().expect("overlay lock poisoned");
        guard
            .iter()
            .find(|write| write.id == write_id)
            .map(|write| write.state)
    }

    pub fn pending_count(&self) -> usize {
        let guard = self.writes.lock().expect("overlay lock poisoned");
        guard
            .iter()
            .filter(|write| write.state == WriteState::Pending)
            .count()
    }

    /// Merge confirmed staged writes over a base snapshot. A confirmed write
    /// replaces the base record for the same (owner, date); pending and
    /// rolled-back writes are invisible. Later confirmations win when two
    /// target the same day.
    pub fn confirmed(&self, base: &[DailyRecord]) -> Vec<DailyRecord> {
        let guard = self.writes.lock().expect("overlay lock poisoned");
        let mut merged: Vec<DailyRecord> = base.to_vec();

        for write in guard.iter().filter(|w| w.state == WriteState::Confirmed) {
            match merged.iter_mut().find(|record| {
                record.owner_id == write.record.owner_id && record.date == write.record.date
            }) {
                Some(record) => *record = write.record.clone(),
                None => merged.push(write.record.clone()),
            }
        }

        merged
    }

    /// Drop settled writes (confirmed or rolled back), keeping the overlay
    /// from growing across a long session.
    pub fn prune_settled(&self) -> usize {
        let mut guard = self.writes.lock().expect("overlay lock poisoned");
        let before = guard.len();
        guard.retain(|write| write.state == WriteState::Pending);
        before - guard.len()
    }
}

impl Default for WriteOverlay {
    fn default() -> Self {
        Self::new()
    }
}
