//! View state: the serializable snapshot of pagination, sort, and per-view
//! UI flags for one data source instance.
//!
//! This is the unit that gets persisted and restored across navigations
//! (inside a [`CacheSnapshot`](crate::cache::CacheSnapshot)). Field names
//! serialize in camelCase so snapshots stay compatible with the JSON shape
//! emitted by web front ends.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::field::SortDir;

// Internal ID management for generated element ids.
static LAST_ID: AtomicU64 = AtomicU64::new(0);

/// Returns a fresh opaque UI element id, unique within the process.
pub(crate) fn next_element_id() -> String {
    format!("lds{}", LAST_ID.fetch_add(1, Ordering::Relaxed) + 1)
}

/// Pagination portion of the view state.
///
/// When `enabled` is false the struct holds the "pagination off" sentinel:
/// `total_page_count == 1`, `page_index == -1`, `page_size == 0`, empty
/// `pages`. That is a valid state, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    /// Whether pagination is active.
    pub enabled: bool,
    /// Current page, 0-based. `-1` in the disabled sentinel.
    pub page_index: i64,
    /// Items per page. `0` in the disabled sentinel.
    pub page_size: i64,
    /// Derived page count.
    pub total_page_count: i64,
    /// Contiguous, ascending page numbers to render as buttons.
    pub pages: Vec<i64>,
    /// First entry of `pages`.
    pub start_paging_index: i64,
    /// Last entry of `pages`.
    pub end_paging_index: i64,
    /// First item index of the current page.
    pub start_item_index: i64,
    /// One past the last item index of the current page, clamped to the
    /// total item count.
    pub end_item_index: i64,
    /// Desired width of the page-button window.
    pub button_count: i64,
}

impl PaginationState {
    fn new(page_index: i64, page_size: i64) -> Self {
        Self {
            enabled: false,
            page_index,
            page_size,
            total_page_count: 1,
            pages: Vec::new(),
            start_paging_index: 0,
            end_paging_index: 0,
            start_item_index: 0,
            end_item_index: 0,
            button_count: 7,
        }
    }
}

/// Mutable snapshot of pagination, sort, and UI flags for one data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// Opaque UI element identifier.
    #[serde(rename = "htmlId")]
    pub element_id: String,
    /// Primary sort field name.
    pub sort1_name: Option<String>,
    /// Primary sort direction.
    pub sort1_dir: Option<SortDir>,
    /// Secondary (tie-break) sort field name.
    pub sort2_name: Option<String>,
    /// Secondary sort direction.
    pub sort2_dir: Option<SortDir>,
    /// Total number of items across all pages.
    pub total_item_count: i64,
    /// Whether the UI should show a loading spinner.
    pub show_spinner: bool,
    /// Whether the list's filter/search area is expanded.
    pub area_expanded: bool,
    /// Free-form per-view data for consumers.
    #[serde(default)]
    pub data: serde_json::Value,
    /// URL the data was (or will be) fetched from.
    pub source_url: Option<String>,
    /// Last serialized query string, if the routing layer stores one.
    pub query_string: Option<String>,
    /// Embedded pagination state.
    pub pagination: PaginationState,
}

impl ViewState {
    /// Creates a fresh view state with pagination disabled.
    pub fn new(
        element_id: impl Into<String>,
        page_index: i64,
        page_size: i64,
        total_item_count: i64,
    ) -> Self {
        Self {
            element_id: element_id.into(),
            sort1_name: None,
            sort1_dir: None,
            sort2_name: None,
            sort2_dir: None,
            total_item_count,
            show_spinner: false,
            area_expanded: false,
            data: serde_json::Value::Object(Default::default()),
            source_url: None,
            query_string: None,
            pagination: PaginationState::new(page_index, page_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = next_element_id();
        let b = next_element_id();
        assert_ne!(a, b);
        assert!(a.starts_with("lds"));
    }

    #[test]
    fn serializes_with_camel_case_wire_names() {
        let mut state = ViewState::new("lds1", 0, 10, 0);
        state.sort1_name = Some("Name".to_string());
        state.sort1_dir = Some(SortDir::Asc);

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["htmlId"], "lds1");
        assert_eq!(json["sort1Name"], "Name");
        assert_eq!(json["sort1Dir"], "asc");
        assert_eq!(json["totalItemCount"], 0);
        assert_eq!(json["pagination"]["pageSize"], 10);
        assert_eq!(json["pagination"]["buttonCount"], 7);

        let back: ViewState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
