//! Feed state models shared between the controller and whatever renders it

use super::transaction::TransactionRecord;

/// Where the list is in its fetch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// Data (possibly empty) is shown and nothing is in flight
    Idle,
    /// First fetch of the session; nothing to show yet
    InitialLoading,
    /// Background fetch over data that is already on screen
    Reloading,
    /// Last fetch failed; the previous list is still held
    Error,
}

/// Progress of the add-transaction flow, kept apart from the list's own error
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddTransactionState {
    pub submitting: bool,
    pub error: Option<String>,
    pub newly_added_id: Option<String>,
}

/// Owned copy of everything needed to draw the list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSnapshot {
    pub page_items: Vec<TransactionRecord>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub phase: LoadPhase,
    pub error: Option<String>,
    pub highlighted_id: Option<String>,
    pub submitting: bool,
    pub add_error: Option<String>,
}

impl FeedSnapshot {
    pub fn is_highlighted(&self, record: &TransactionRecord) -> bool {
        self.highlighted_id.as_deref() == Some(record.id.as_str())
    }
}

/// Change notifications published by the feed controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    LoadStarted { phase: LoadPhase },
    Loaded { total_items: usize },
    LoadFailed { message: String },
    PageChanged { page: usize },
    HighlightSet { id: String },
    HighlightCleared { id: String },
    AddFailed { message: String },
    TornDown,
}
