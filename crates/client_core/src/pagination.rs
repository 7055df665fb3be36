use std::collections::BTreeMap;

use shared::domain::Person;
use shared::protocol::{PeoplePage, SortOrder};

use crate::query::ListQuery;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_VISIBLE_PAGES: u32 = 5;

/// Whether a dispatch is outstanding for the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching,
}

/// Everything a listing view needs to render, as one immutable snapshot.
/// Transitions go through [`ListState::apply`]; the session layer replaces
/// the snapshot wholesale after each event.
#[derive(Debug, Clone, PartialEq)]
pub struct ListState {
    pub filters: BTreeMap<String, String>,
    pub sort_by: String,
    pub sort_order: SortOrder,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_count: i64,
    pub people: Vec<Person>,
    pub phase: Phase,
    pub latest_seq: u64,
}

impl Default for ListState {
    fn default() -> Self {
        Self {
            filters: BTreeMap::new(),
            sort_by: "id".to_string(),
            sort_order: SortOrder::Asc,
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            total_pages: 0,
            total_count: 0,
            people: Vec::new(),
            phase: Phase::Idle,
            latest_seq: 0,
        }
    }
}

/// State transitions of the listing view.
#[derive(Debug, Clone, PartialEq)]
pub enum ListEvent {
    FilterChanged { name: String, value: String },
    SortClicked(String),
    PageSizeChanged(u32),
    PageRequested(u32),
    FetchIssued { seq: u64 },
    PageArrived { seq: u64, page: PeoplePage },
    FetchFailed { seq: u64 },
}

impl ListState {
    /// Pure reducer from (state, event) to the next state.
    ///
    /// Any change to filters, sort, or page size invalidates the old page
    /// position and resets it to 0. Completions tagged with a superseded
    /// sequence number leave the state untouched: last writer wins.
    pub fn apply(mut self, event: ListEvent) -> ListState {
        match event {
            ListEvent::FilterChanged { name, value } => {
                if value.is_empty() {
                    self.filters.remove(&name);
                } else {
                    self.filters.insert(name, value);
                }
                self.page = 0;
            }
            ListEvent::SortClicked(field) => {
                if self.sort_by == field {
                    self.sort_order = self.sort_order.toggled();
                } else {
                    self.sort_by = field;
                    self.sort_order = SortOrder::Asc;
                }
                self.page = 0;
            }
            ListEvent::PageSizeChanged(size) => {
                self.page_size = size.max(1);
                self.page = 0;
            }
            ListEvent::PageRequested(index) => {
                self.page = if self.total_pages > 0 {
                    index.min(self.total_pages - 1)
                } else {
                    index
                };
            }
            ListEvent::FetchIssued { seq } => {
                self.latest_seq = seq;
                self.phase = Phase::Fetching;
            }
            ListEvent::PageArrived { seq, page } => {
                if seq == self.latest_seq {
                    self.total_pages = page.total_pages;
                    self.total_count = page.total_count;
                    self.people = page.people;
                    self.phase = Phase::Idle;
                }
                // otherwise: stale result, discarded silently
            }
            ListEvent::FetchFailed { seq } => {
                if seq == self.latest_seq {
                    self.phase = Phase::Idle;
                }
            }
        }
        self
    }

    /// The listing fetch this state calls for.
    pub fn query(&self) -> ListQuery {
        ListQuery {
            page: self.page,
            page_size: self.page_size,
            sort_by: self.sort_by.clone(),
            sort_order: self.sort_order,
            filters: self
                .filters
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        }
    }

    pub fn window(&self) -> PaginationWindow {
        compute_window(self.page, self.total_pages, MAX_VISIBLE_PAGES)
    }
}

/// The bounded run of page numbers navigation controls show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationWindow {
    /// 1-based page numbers, at most `max_visible` of them.
    pub pages: Vec<u32>,
    /// Jump-to-first control, shown when the run starts after page 1.
    pub show_first: bool,
    /// Jump-to-last control, shown when the run ends before the last page.
    pub show_last: bool,
}

/// Chooses a contiguous run of up to `max_visible` page numbers around
/// `current_page` (0-based), clamped to `[1, total_pages]`. When the upper
/// clamp cuts the run short, its start shifts backward so the run still
/// holds `min(total_pages, max_visible)` entries.
pub fn compute_window(current_page: u32, total_pages: u32, max_visible: u32) -> PaginationWindow {
    if total_pages == 0 || max_visible == 0 {
        return PaginationWindow::default();
    }

    // Callers may pass a page index past the end; the window is anchored to
    // the last page in that case.
    let current_page = current_page.min(total_pages - 1);
    let mut start = current_page.saturating_sub(max_visible / 2).max(1);
    let end = start.saturating_add(max_visible - 1).min(total_pages);
    if end - start + 1 < max_visible {
        start = end.saturating_sub(max_visible - 1).max(1);
    }

    PaginationWindow {
        pages: (start..=end).collect(),
        show_first: start > 1,
        show_last: end < total_pages,
    }
}
