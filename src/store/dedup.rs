use std::collections::HashSet;
use std::sync::Mutex;

use tracing::debug;

/// Mutating store call whose duplicate dispatch is guarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    CreateRecord,
    UpdateRecord,
    DeleteRecord,
    SavePlanTarget,
    DeletePlanTarget,
    SaveSummary,
}

impl StoreOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreOperation::CreateRecord => "createRecord",
            StoreOperation::UpdateRecord => "updateRecord",
            StoreOperation::DeleteRecord => "deleteRecord",
            StoreOperation::SavePlanTarget => "savePlanTarget",
            StoreOperation::DeletePlanTarget => "deletePlanTarget",
            StoreOperation::SaveSummary => "saveSummary",
        }
    }
}

/// In-flight request map keyed by (operation, target id), scoped to one
/// client instance. A second submission for the same pair is refused until
/// the first finishes, so a double-clicked save never dispatches twice.
pub struct InFlightRegistry {
    entries: Mutex<HashSet<(StoreOperation, String)>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashSet::new()),
        }
    }

    /// Claim the (operation, target) slot. Returns false when the same call
    /// is already in flight.
    pub fn begin(&self, operation: StoreOperation, target_id: &str) -> bool {
        let mut guard = self.entries.lock().expect("in-flight registry lock poisoned");
        let claimed = guard.insert((operation, target_id.to_string()));
        if !claimed {
            debug!(
                target: "app::store",
                operation = operation.as_str(),
                target_id,
                "duplicate submission refused"
            );
        }
        claimed
    }

    pub fn finish(&self, operation: StoreOperation, target_id: &str) {
        let mut guard = self.entries.lock().expect("in-flight registry lock poisoned");
        guard.remove(&(operation, target_id.to_string()));
    }

    pub fn is_in_flight(&self, operation: StoreOperation, target_id: &str) -> bool {
        let guard = self.entries.lock().expect("in-flight registry lock poisoned");
        guard.contains(&(operation, target_id.to_string()))
    }
}

impl Default for InFlightRegistry {
    fn default() -> Self {
        Self::new()
    }
}
