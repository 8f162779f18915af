//! In-memory transaction list with client-side paging
//!
//! Items are kept newest-first. Page numbers are 1-based and always derived
//! from an item's position, never stored on the item.

use crate::models::{LoadPhase, TransactionRecord};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_FETCH_ERROR: &str = "Failed to fetch transactions";

#[derive(Debug, Clone)]
pub struct TransactionStore {
    items: Vec<TransactionRecord>,
    current_page: usize,
    page_size: usize,
    loading: bool,
    is_reloading: bool,
    error: Option<String>,
    has_loaded: bool,
}

impl TransactionStore {
    /// Create an empty store. A page size of zero is bumped to one.
    pub fn new(page_size: usize) -> Self {
        TransactionStore {
            items: Vec::new(),
            current_page: 1,
            page_size: page_size.max(1),
            loading: false,
            is_reloading: false,
            error: None,
            has_loaded: false,
        }
    }

    pub fn items(&self) -> &[TransactionRecord] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// True while the very first fetch is running
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// True while a background fetch runs over already-loaded data
    pub fn is_reloading(&self) -> bool {
        self.is_reloading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn has_loaded(&self) -> bool {
        self.has_loaded
    }

    pub fn phase(&self) -> LoadPhase {
        if self.is_loading() {
            LoadPhase::InitialLoading
        } else if self.is_reloading() {
            LoadPhase::Reloading
        } else if self.error.is_some() {
            LoadPhase::Error
        } else {
            LoadPhase::Idle
        }
    }

    /// Number of pages, never less than one
    pub fn total_pages(&self) -> usize {
        self.len().div_ceil(self.page_size()).max(1)
    }

    /// Items on 1-based page `page`. Pages outside the list are empty.
    pub fn get_page(&self, page: usize) -> &[TransactionRecord] {
        if page == 0 || self.is_empty() {
            return &[];
        }
        let start = (page - 1).saturating_mul(self.page_size);
        if start >= self.items.len() {
            return &[];
        }
        let end = start.saturating_add(self.page_size).min(self.items.len());
        &self.items[start..end]
    }

    pub fn current_page_items(&self) -> &[TransactionRecord] {
        self.get_page(self.current_page)
    }

    /// Mark a fetch as started. The first fetch shows as a load, later ones as a reload.
    pub fn begin_fetch(&mut self) {
        self.error = None;
        if self.has_loaded() {
            self.is_reloading = true;
        } else {
            self.loading = true;
        }
    }

    /// Swap in a freshly fetched list
    ///
    /// Returns true when the current page had to be clamped because the list shrank.
    pub fn replace_all(&mut self, mut items: Vec<TransactionRecord>) -> bool {
        items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.items = items;
        self.loading = false;
        self.is_reloading = false;
        self.error = None;
        self.has_loaded = true;
        self.clamp_current_page()
    }

    /// Record a failed fetch. The current items are left as they are.
    pub fn fail_fetch(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.loading = false;
        self.is_reloading = false;
        self.error = Some(if message.trim().is_empty() {
            DEFAULT_FETCH_ERROR.to_string()
        } else {
            message
        });
    }

    /// Move to next page
    pub fn next_page(&mut self) -> bool {
        if self.current_page < self.total_pages() {
            self.current_page += 1;
            true
        } else {
            false
        }
    }

    /// Move to previous page
    pub fn previous_page(&mut self) -> bool {
        if self.current_page > 1 {
            self.current_page -= 1;
            true
        } else {
            false
        }
    }

    /// Page that currently holds `id`, if it is in the list
    pub fn page_of(&self, id: &str) -> Option<usize> {
        self.items()
            .iter()
            .position(|record| record.id == id)
            .map(|index| index / self.page_size + 1)
    }

    /// Jump to the page holding `id`. Does nothing if the id is unknown.
    ///
    /// Returns true when the current page changed.
    pub fn go_to_page_with_transaction(&mut self, id: &str) -> bool {
        match self.page_of(id) {
            Some(page) if page != self.current_page => {
                self.current_page = page;
                true
            }
            _ => false,
        }
    }

    fn clamp_current_page(&mut self) -> bool {
        let clamped = self.current_page.clamp(1, self.total_pages());
        let changed = clamped != self.current_page;
        self.current_page = clamped;
        changed
    }
}

impl Default for TransactionStore {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}
