//! The pagination window computation.
//!
//! Given a total item count, page size, current page index, and a desired
//! button-count window width, [`recompute`] derives the total page count,
//! the visible item range, and the contiguous run of page numbers to render
//! as navigable buttons. It is pure state arithmetic: nothing here renders
//! pagination controls or fetches pages.
//!
//! The data source calls this after every mutation that can affect item
//! count, page index, or page size; the returned flag tells it whether to
//! emit a pagination-changed notification.
//!
//! # Examples
//!
//! ```rust
//! use list_datasource::pagination::recompute;
//! use list_datasource::state::ViewState;
//!
//! let mut state = ViewState::new("lds-doc", 0, 10, 95);
//! state.pagination.enabled = true;
//!
//! let changed = recompute(&mut state);
//! assert!(changed);
//! assert_eq!(state.pagination.total_page_count, 10);
//! assert_eq!(state.pagination.pages, vec![0, 1, 2, 3, 4, 5, 6]);
//! assert_eq!(state.pagination.end_item_index, 10);
//! ```

use crate::state::ViewState;

/// Recomputes the full pagination state in place.
///
/// Implements the windowing rules:
///
/// 1. Disabled pagination collapses to the sentinel state (one page, page
///    index `-1`, page size `0`, no buttons).
/// 2. `total_page_count = ceil(total_item_count / page_size)`.
/// 3. The item range is `page_index * page_size` up to (exclusively) the
///    smaller of `start + page_size` and the total item count.
/// 4. The button window ends `button_count / 2` pages past the current page,
///    clamped to the last page; near the start it is widened to the full
///    `button_count` width when enough pages exist; it then extends
///    backwards up to `button_count` entries, never below page 0.
/// 5. A page index past the end is clamped to the last page, but only when
///    it is positive, so an empty result set on the first page keeps
///    `page_index == 0` with `total_page_count == 0`.
///
/// Returns whether `page_index`, `page_size`, or `total_page_count` changed
/// relative to the values on entry (for the disabled branch, only the first
/// two are compared). The caller is responsible for emitting the
/// pagination-changed notification when this returns true.
pub fn recompute(state: &mut ViewState) -> bool {
    let total_item_count = state.total_item_count;
    let pag = &mut state.pagination;

    let old_page_index = pag.page_index;
    let old_page_size = pag.page_size;
    let old_total_page_count = pag.total_page_count;

    if !pag.enabled {
        pag.total_page_count = 1;
        pag.start_paging_index = 0;
        pag.end_paging_index = 0;
        pag.start_item_index = 0;
        pag.end_item_index = 0;
        pag.page_index = -1;
        pag.page_size = 0;
        pag.pages.clear();
        return pag.page_index != old_page_index || pag.page_size != old_page_size;
    }

    if pag.page_size <= 0 {
        // Reachable only by enabling pagination over a restored disabled
        // sentinel.
        tracing::warn!(
            page_size = pag.page_size,
            "pagination enabled with non-positive page size, skipping recompute"
        );
        return false;
    }

    let button_count = if pag.button_count > 0 {
        pag.button_count
    } else {
        7
    };
    let half_buttons = button_count / 2;

    pag.total_page_count = (total_item_count + pag.page_size - 1) / pag.page_size;
    pag.start_item_index = pag.page_index * pag.page_size;
    pag.end_item_index = (pag.start_item_index + pag.page_size).min(total_item_count);

    // Window end: current page plus half the buttons, or the last page when
    // that would run past the end.
    if pag.page_index + half_buttons >= pag.total_page_count {
        pag.end_paging_index = pag.total_page_count - 1;
    } else {
        pag.end_paging_index = pag.page_index + half_buttons;
    }

    // Keep the window full width near the start when enough pages exist.
    if pag.end_paging_index < button_count - 1 && pag.total_page_count > button_count - 1 {
        pag.end_paging_index = button_count - 1;
    }

    pag.start_paging_index = (pag.end_paging_index - button_count + 1).max(0);

    pag.pages = (pag.start_paging_index..=pag.end_paging_index).collect();

    if pag.total_page_count != 0 && pag.page_index > 0 && pag.page_index >= pag.total_page_count {
        pag.page_index = pag.total_page_count - 1;
    }

    pag.page_index != old_page_index
        || pag.page_size != old_page_size
        || pag.total_page_count != old_total_page_count
}
