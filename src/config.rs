//! Construction-time configuration for a data source.
//!
//! Configuration is a value object: it is cloned into the data source at
//! construction and never consulted as shared mutable state afterwards.
//! The [`Default`] impls mirror the conventional defaults (page size 10,
//! button count 7, descending sort).

use once_cell::sync::Lazy;

use crate::field::SortDir;

/// Sort-related configuration.
#[derive(Debug, Clone)]
pub struct SortConfig {
    /// Direction applied when a sort is set without an explicit direction.
    pub default_dir: SortDir,
    /// Primary sort key used when none has been chosen yet.
    pub default_name: Option<String>,
    /// CSS class for an unsorted column header.
    pub class_name_default: String,
    /// CSS class for an ascending-sorted column header.
    pub class_name_asc: String,
    /// CSS class for a descending-sorted column header.
    pub class_name_desc: String,
    /// Optional icon identifier for sort indicators.
    pub icon: Option<String>,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            default_dir: SortDir::Desc,
            default_name: None,
            class_name_default: "lds-sort".to_string(),
            class_name_asc: "lds-sort-asc".to_string(),
            class_name_desc: "lds-sort-desc".to_string(),
            icon: None,
        }
    }
}

/// Pagination configuration.
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// Whether pagination starts enabled.
    pub enabled: bool,
    /// Items per page. Non-positive values fall back to 10.
    pub page_size: i64,
    /// Width of the page-button window. Non-positive values fall back to 7.
    pub button_count: i64,
    /// Caption for the "first page" button.
    pub first_title: String,
    /// Caption for the "last page" button.
    pub last_title: String,
    /// Caption for the "next page" button.
    pub next_title: String,
    /// Caption for the "previous page" button.
    pub prev_title: String,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            page_size: 10,
            button_count: 7,
            first_title: "First".to_string(),
            last_title: "Last".to_string(),
            next_title: "Next".to_string(),
            prev_title: "Prev".to_string(),
        }
    }
}

/// HTTP hints consumed by the external fetch layer. The core never performs
/// requests itself.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request method the fetch layer should use.
    pub method: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
        }
    }
}

/// Full configuration surface for a data source.
///
/// ```rust
/// use list_datasource::config::Config;
///
/// let mut config = Config::default();
/// config.pagination.enabled = true;
/// config.pagination.page_size = 25;
/// assert_eq!(config.storage, "session");
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether the external persistence layer should save/restore state.
    pub save_state: bool,
    /// Opaque storage tag consumed by the persistence layer.
    pub storage: String,
    /// Non-zero enables verbose notifier lifecycle logging.
    pub debug_mode: u8,
    /// Sort configuration.
    pub sort: SortConfig,
    /// Pagination configuration.
    pub pagination: PaginationConfig,
    /// HTTP hints for the fetch layer.
    pub http: HttpConfig,
    /// Route navigation-requested events instead of reloading directly.
    pub use_routing: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            save_state: false,
            storage: "session".to_string(),
            debug_mode: 0,
            sort: SortConfig::default(),
            pagination: PaginationConfig::default(),
            http: HttpConfig::default(),
            use_routing: false,
        }
    }
}

/// The shared baseline configuration, for callers that tweak a field or two
/// off the defaults.
pub static DEFAULT_CONFIG: Lazy<Config> = Lazy::new(Config::default);

impl PaginationConfig {
    /// Page size with the non-positive fallback applied.
    pub fn effective_page_size(&self) -> i64 {
        if self.page_size > 0 {
            self.page_size
        } else {
            10
        }
    }

    /// Button count with the non-positive fallback applied.
    pub fn effective_button_count(&self) -> i64 {
        if self.button_count > 0 {
            self.button_count
        } else {
            7
        }
    }
}
