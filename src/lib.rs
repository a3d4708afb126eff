#![warn(missing_docs)]
#![doc(html_root_url = "https://docs.rs/list-datasource/")]

//! # list-datasource
//!
//! Framework-agnostic state management for filterable, sortable, paginated
//! lists.
//!
//! ## Overview
//!
//! A [`DataSource`](datasource::DataSource) tracks which page, page size,
//! sort order, and filter values are active for one logical list or grid;
//! derives the pagination window (the run of page buttons to render) from
//! the total item count; and notifies external listeners when state that
//! affects rendering or data fetching changes. It is the state core behind
//! grid/table UI components: it never fetches data, renders UI, persists
//! state, or touches the URL itself; those collaborators subscribe to its
//! notifiers and feed results back in.
//!
//! ## Components
//!
//! - [`event`]: typed publish/subscribe channels with isolated handler
//!   failures
//! - [`field`]: column descriptors (name, title, data type, visibility,
//!   sortability)
//! - [`state`]: the serializable view state, including pagination
//! - [`pagination`]: the pure page-window computation
//! - [`datasource`]: the orchestrating aggregate and the filter bag
//! - [`cache`]: the snapshot shape consumed/produced for persistence
//! - [`config`]: the construction-time configuration surface
//!
//! ## Wiring it up
//!
//! ```rust
//! use list_datasource::prelude::*;
//!
//! #[derive(Clone)]
//! struct Order {
//!     id: u32,
//! }
//! impl Item for Order {}
//!
//! let mut config = Config::default();
//! config.pagination.enabled = true;
//! config.pagination.page_size = 25;
//!
//! let mut orders = DataSource::<Order>::new("orders", "grid", config);
//! orders.set_fields(
//!     vec![
//!         Field::new("Id").with_data_type(DataType::Number),
//!         Field::new("Customer"),
//!     ],
//!     false,
//! );
//!
//! // A fetch layer would perform the request described by get_filters()
//! // here and answer asynchronously with set_data().
//! orders.on_data_requested.subscribe(|reason| {
//!     let _ = reason;
//! });
//!
//! orders.reload(None);
//! orders.set_data(Some(DataInput::new(vec![Order { id: 1 }], 200)));
//!
//! assert_eq!(orders.total_count(), 200);
//! assert_eq!(orders.state.pagination.total_page_count, 8);
//! assert_eq!(orders.state.pagination.pages, vec![0, 1, 2, 3, 4, 5, 6]);
//! ```

pub mod cache;
pub mod config;
pub mod datasource;
pub mod event;
pub mod field;
pub mod input;
pub mod pagination;
pub mod state;

pub use cache::{CacheSnapshot, FieldSnapshot};
pub use config::Config;
pub use datasource::{DataSource, FilterMap, FilterValue};
pub use event::Notifier;
pub use field::{DataType, Field, SortDir};
pub use input::{DataInput, Item, PageData};
pub use state::{PaginationState, ViewState};

/// Convenient single-import surface for consumers.
pub mod prelude {
    pub use crate::cache::{CacheSnapshot, FieldSnapshot};
    pub use crate::config::{Config, HttpConfig, PaginationConfig, SortConfig};
    pub use crate::datasource::{coerce_filter_value, DataSource, FilterMap, FilterValue};
    pub use crate::event::{Notifier, NotifierError, NotifierOptions, Subscription};
    pub use crate::field::{DataType, Field, SortDir};
    pub use crate::input::{DataInput, Item, PageData};
    pub use crate::state::{PaginationState, ViewState};
}
