//! Record-side input shapes for the data source.

use serde::{Deserialize, Serialize};

/// Trait for record types managed by a
/// [`DataSource`](crate::datasource::DataSource).
///
/// The only hook is row-number stamping: when a page of items lands, each
/// item is assigned a 1-based row number offset by `page_index * page_size`.
/// The default implementation ignores the number, so plain record types can
/// opt in with a one-line impl.
///
/// # Examples
///
/// ```rust
/// use list_datasource::input::Item;
///
/// #[derive(Clone)]
/// struct Product {
///     name: String,
///     row: i64,
/// }
///
/// impl Item for Product {
///     fn set_row_number(&mut self, row_number: i64) {
///         self.row = row_number;
///     }
/// }
/// ```
pub trait Item: Clone {
    /// Receives the item's 1-based row number for the current page window.
    fn set_row_number(&mut self, row_number: i64) {
        let _ = row_number;
    }
}

/// One load result handed to
/// [`DataSource::set_data`](crate::datasource::DataSource::set_data) by the
/// external fetch layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataInput<T> {
    /// The items for the current page (or the full set for client-side
    /// paging). Missing in the wire payload means empty.
    #[serde(default)]
    pub items: Vec<T>,
    /// Total item count across all pages. Missing means "use
    /// `items.len()`".
    #[serde(default)]
    pub total: Option<i64>,
    /// Error tag from a failed fetch; the core logs it and otherwise
    /// treats the payload normally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> DataInput<T> {
    /// A page of items with an explicit total.
    pub fn new(items: Vec<T>, total: i64) -> Self {
        Self {
            items,
            total: Some(total),
            error: None,
        }
    }

    /// A payload whose total defaults to the item count.
    pub fn from_items(items: Vec<T>) -> Self {
        Self {
            items,
            total: None,
            error: None,
        }
    }
}

impl<T> Default for DataInput<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: None,
            error: None,
        }
    }
}

/// One retained slice of records per page index ever loaded.
///
/// Pages accumulate; this core never evicts them. Eviction policy, if any,
/// belongs to the consumer.
#[derive(Debug, Clone)]
pub struct PageData<T> {
    /// The page these items belong to.
    pub page_index: i64,
    /// The items loaded for that page.
    pub items: Vec<T>,
}
