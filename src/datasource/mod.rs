//! The list data source: the aggregate managing filter, sort, pagination,
//! and item state for one logical list or grid.
//!
//! A [`DataSource`] owns the [`ViewState`], the field collection, the item
//! buffers, and one [`Notifier`] per kind of state change. UI actions call
//! its methods; the methods mutate state, recompute the pagination window,
//! and emit events that external collaborators (fetch layer, router,
//! persistence) react to. The core itself never fetches, renders, persists,
//! or routes.
//!
//! # Basic Usage
//!
//! ```rust
//! use list_datasource::config::Config;
//! use list_datasource::datasource::DataSource;
//! use list_datasource::field::Field;
//! use list_datasource::input::{DataInput, Item};
//!
//! #[derive(Clone)]
//! struct Product {
//!     name: String,
//! }
//! impl Item for Product {}
//!
//! let mut config = Config::default();
//! config.pagination.enabled = true;
//!
//! let mut source = DataSource::<Product>::new("products", "grid", config);
//! source.set_fields(vec![Field::new("Name"), Field::new("Price")], false);
//!
//! // The fetch layer listens for data-requested and answers with set_data.
//! source.on_data_requested.subscribe(|reason| {
//!     assert_eq!(reason, "reload");
//! });
//! source.reload(None);
//! source.set_data(Some(DataInput::new(
//!     vec![Product { name: "Anvil".into() }],
//!     1,
//! )));
//! assert!(source.has_data());
//! ```
//!
//! # Late responses
//!
//! There is no staleness guard: the core has no concept of an in-flight
//! request, and a `set_data` arriving after a newer [`DataSource::reload`]
//! is applied as-is. Tying responses to requests (and cancelling stale
//! fetches) is the fetch layer's responsibility.

mod query;

pub use query::{coerce_filter_value, FilterMap, FilterValue};

use std::collections::HashMap;

use chrono::Utc;

use crate::cache::{CacheSnapshot, FieldSnapshot};
use crate::config::Config;
use crate::event::{Notifier, NotifierOptions};
use crate::field::{Field, FieldHooks, SortDir};
use crate::input::{DataInput, Item, PageData};
use crate::pagination;
use crate::state::{next_element_id, ViewState};

/// The aggregate root managing presentation state for one list/grid.
///
/// See the [module documentation](self) for an overview and example.
pub struct DataSource<T: Item> {
    id: String,
    kind: String,
    config: Config,
    cache: Option<CacheSnapshot>,

    /// The live view state. Mutate through the data source methods; direct
    /// writes skip recomputation and notifications.
    pub state: ViewState,
    /// The open filter bag merged into fetch requests.
    pub filters: FilterMap,
    /// Set by the external fetch layer while a request is in flight.
    pub is_loading: bool,

    fields: Vec<Field>,
    field_backup: Vec<Field>,
    field_index: HashMap<String, usize>,
    sort_candidates1: Vec<String>,
    sort_candidates2: Vec<String>,
    sort_item1: Option<String>,
    sort_item2: Option<String>,

    items: Vec<T>,
    source_items: Vec<T>,
    pages: Vec<PageData<T>>,

    is_new: bool,
    is_configured: bool,
    disposed: bool,

    /// Ask the routing layer to update the URL (payload: reason tag).
    pub on_navigate_requested: Notifier<String>,
    /// Ask the fetch layer for data (payload: reason tag).
    pub on_data_requested: Notifier<String>,
    /// Emitted by the fetch layer when a request starts.
    pub on_data_loading: Notifier<()>,
    /// Emitted by the fetch layer when a request finishes.
    pub on_data_loaded: Notifier<DataInput<T>>,
    /// The primary sort changed (payload: field name).
    pub on_sort_changed: Notifier<String>,
    /// The pagination window changed (payload: the full view state).
    pub on_pagination_changed: Notifier<ViewState>,
    /// Some view state changed (payload: reason tag).
    pub on_state_changed: Notifier<String>,
    /// A field descriptor changed (payload: reason tag).
    pub on_field_changed: Notifier<String>,
}

impl<T: Item> DataSource<T> {
    /// Creates a fresh data source.
    ///
    /// Pagination enablement, page size, and button count are seeded from
    /// `config`; when enabled, the window is computed immediately.
    pub fn new(id: impl Into<String>, kind: impl Into<String>, config: Config) -> Self {
        let page_size = config.pagination.effective_page_size();
        let mut state = ViewState::new(next_element_id(), 0, page_size, 0);
        state.pagination.enabled = config.pagination.enabled;
        state.pagination.button_count = config.pagination.effective_button_count();

        let mut source = Self::assemble(id.into(), kind.into(), config, state, FilterMap::new());
        if source.state.pagination.enabled {
            source.update_pagination_state();
        }
        source
    }

    /// Restores a data source from a persisted snapshot.
    ///
    /// View state and filters are taken verbatim from the snapshot and the
    /// instance is marked not-new; the snapshot is retained so
    /// [`set_fields`](Self::set_fields) can restore per-field visibility.
    pub fn from_snapshot(
        id: impl Into<String>,
        kind: impl Into<String>,
        config: Config,
        snapshot: CacheSnapshot,
    ) -> Self {
        let state = snapshot.state.clone();
        let filters = snapshot.filters.clone();
        let mut source = Self::assemble(id.into(), kind.into(), config, state, filters);
        source.cache = Some(snapshot);
        source.is_new = false;
        source
    }

    fn assemble(
        id: String,
        kind: String,
        config: Config,
        state: ViewState,
        filters: FilterMap,
    ) -> Self {
        let options = NotifierOptions {
            debug: config.debug_mode > 0,
            max_subscribers: None,
        };
        Self {
            id,
            kind,
            config,
            cache: None,
            state,
            filters,
            is_loading: false,
            fields: Vec::new(),
            field_backup: Vec::new(),
            field_index: HashMap::new(),
            sort_candidates1: Vec::new(),
            sort_candidates2: Vec::new(),
            sort_item1: None,
            sort_item2: None,
            items: Vec::new(),
            source_items: Vec::new(),
            pages: Vec::new(),
            is_new: true,
            is_configured: false,
            disposed: false,
            on_navigate_requested: Notifier::with_options(options.clone()),
            on_data_requested: Notifier::with_options(options.clone()),
            on_data_loading: Notifier::with_options(options.clone()),
            on_data_loaded: Notifier::with_options(options.clone()),
            on_sort_changed: Notifier::with_options(options.clone()),
            on_pagination_changed: Notifier::with_options(options.clone()),
            on_state_changed: Notifier::with_options(options.clone()),
            on_field_changed: Notifier::with_options(options),
        }
    }

    /// Registers the field collection, rebuilding the name index and the
    /// sort-candidate lists from scratch.
    ///
    /// Sortable fields missing a primary sort key default to their own
    /// name; missing directions default from configuration. A clone of the
    /// fields exactly as passed in is retained as a reset backup. When a
    /// cached field list exists and state saving is enabled, visibility is
    /// restored per field by name. Current sort-item pointers are re-matched
    /// against the view state's sort names.
    ///
    /// Emits state-changed (`"setFields"`) when `notify` is true.
    pub fn set_fields(&mut self, fields: Vec<Field>, notify: bool) {
        if self.check_disposed("set_fields") {
            return;
        }

        self.sort_candidates1.clear();
        self.sort_candidates2.clear();
        self.field_index.clear();
        self.field_backup = fields.clone();

        let hooks = FieldHooks {
            field_changed: self.on_field_changed.downgrade(),
            state_changed: self.on_state_changed.downgrade(),
        };

        let mut fields = fields;
        for (index, field) in fields.iter_mut().enumerate() {
            field.attach(hooks.clone());
            self.field_index.insert(field.name.clone(), index);

            if field.sortable {
                if field.sort1_name.is_none() {
                    field.sort1_name = Some(field.name.clone());
                }
                if field.sort1_dir.is_none() {
                    field.sort1_dir = Some(self.config.sort.default_dir);
                }
                if field.sort2_dir.is_none() {
                    field.sort2_dir = Some(self.config.sort.default_dir);
                }
                self.sort_candidates1.push(field.name.clone());
                self.sort_candidates2.push(field.name.clone());
                if self.state.sort1_name.as_deref() == Some(field.name.as_str()) {
                    self.sort_item1 = Some(field.name.clone());
                }
                if self.state.sort2_name.as_deref() == Some(field.name.as_str()) {
                    self.sort_item2 = Some(field.name.clone());
                }
            }

            if self.config.save_state {
                if let Some(saved) = self
                    .cache
                    .as_ref()
                    .and_then(|cache| cache.field_list.as_ref())
                    .and_then(|list| list.iter().find(|entry| entry.name == field.name))
                {
                    field.visible = saved.visible;
                }
            }
        }

        self.fields = fields;
        self.is_configured = true;
        if notify {
            self.on_state_changed.emit(&"setFields".to_string());
        }
    }

    /// Accepts a load result from the fetch layer.
    ///
    /// `None` is treated as an empty result set with a logged warning; a
    /// missing total defaults to the item count. Always recomputes
    /// pagination. Note there is no staleness guard: a late response for
    /// a superseded request is applied as-is (see the module docs).
    pub fn set_data(&mut self, input: Option<DataInput<T>>) {
        if self.check_disposed("set_data") {
            return;
        }

        let input = input.unwrap_or_else(|| {
            tracing::warn!("set_data called with empty payload");
            DataInput::default()
        });
        if let Some(error) = &input.error {
            tracing::warn!(error = %error, "data input carries an error tag");
        }

        let total = input.total.unwrap_or(input.items.len() as i64);
        self.set_items(input.items);
        self.state.total_item_count = total;
        self.update_pagination_state();
    }

    /// Replaces the current page's item buffer, stamping row numbers.
    ///
    /// Each item receives a 1-based row number offset by
    /// `page_index * page_size`. The buffer is also upserted into the
    /// accumulated page-data list under the current page index.
    pub fn set_items(&mut self, mut items: Vec<T>) {
        if self.check_disposed("set_items") {
            return;
        }

        let offset = self.page_index() * self.page_size();
        for (i, item) in items.iter_mut().enumerate() {
            item.set_row_number(offset + i as i64 + 1);
        }

        let page_index = self.state.pagination.page_index;
        match self
            .pages
            .iter_mut()
            .find(|page| page.page_index == page_index)
        {
            Some(page) => page.items = items.clone(),
            None => self.pages.push(PageData {
                page_index,
                items: items.clone(),
            }),
        }
        self.items = items;
    }

    /// Replaces the unpaginated source buffer for client-side paging.
    ///
    /// Sets the total item count to the buffer length and recomputes the
    /// window.
    pub fn set_source_items(&mut self, items: Vec<T>) {
        if self.check_disposed("set_source_items") {
            return;
        }
        self.state.total_item_count = items.len() as i64;
        self.source_items = items;
        self.update_pagination_state();
    }

    /// Records the URL the fetch layer should load from.
    pub fn set_source_url(&mut self, url: impl Into<String>) {
        self.state.source_url = Some(url.into());
    }

    /// Requests a (re)load from the fetch layer.
    ///
    /// Fills unset primary sort name/direction from configuration,
    /// recomputes pagination when data is present, then emits
    /// data-requested with `reason` (default `"reload"`). The method
    /// returns immediately; results arrive later via
    /// [`set_data`](Self::set_data).
    pub fn reload(&mut self, reason: Option<&str>) {
        if self.check_disposed("reload") {
            return;
        }

        if self.state.sort1_dir.is_none() {
            self.state.sort1_dir = Some(self.config.sort.default_dir);
        }
        if self.state.sort1_name.is_none() {
            self.state.sort1_name = self.config.sort.default_name.clone();
        }
        if self.has_data() {
            self.update_pagination_state();
        }
        self.on_data_requested
            .emit(&reason.unwrap_or("reload").to_string());
    }

    /// Navigates to `page_index` and reloads. No-op when already there.
    pub fn load_page(&mut self, page_index: i64) {
        if self.check_disposed("load_page") {
            return;
        }
        if self.state.pagination.page_index == page_index {
            return;
        }
        self.state.pagination.page_index = page_index;
        self.update_pagination_state();
        self.reload(Some("loadPage"));
    }

    /// Navigates to the next page, unless already on the last one.
    pub fn load_next_page(&mut self) {
        if self.state.pagination.total_page_count - 1 < self.state.pagination.page_index + 1 {
            return;
        }
        self.load_page(self.state.pagination.page_index + 1);
    }

    /// Changes the primary sort.
    ///
    /// Selecting the already-active field toggles its direction; selecting
    /// a new field sets it with `direction` (or the configured default).
    /// Emits sort-changed with the field name.
    pub fn change_sort(&mut self, field_name: Option<&str>, direction: Option<SortDir>) {
        if self.check_disposed("change_sort") {
            return;
        }

        if self.state.sort1_name.as_deref() == field_name {
            self.state.sort1_dir = Some(SortDir::toggled(self.state.sort1_dir));
        } else {
            self.state.sort1_name = field_name.map(str::to_string);
            self.state.sort1_dir = Some(direction.unwrap_or(self.config.sort.default_dir));
        }
        self.on_sort_changed
            .emit(&field_name.unwrap_or_default().to_string());
    }

    /// Sets the page size without reloading.
    ///
    /// Non-positive sizes are rejected with a warning and no state change.
    pub fn set_page_size(&mut self, size: i64) {
        if self.check_disposed("set_page_size") {
            return;
        }
        if size <= 0 {
            tracing::warn!(size, "page size must be greater than 0");
            return;
        }
        self.state.pagination.page_size = size;
    }

    /// Changes the page size, recomputes the window, and reloads.
    ///
    /// Non-positive sizes are rejected with a warning; an unchanged size is
    /// a no-op.
    pub fn change_page_size(&mut self, size: i64) {
        if self.check_disposed("change_page_size") {
            return;
        }
        if size <= 0 {
            tracing::warn!(size, "page size must be greater than 0");
            return;
        }
        if self.state.pagination.page_size == size {
            return;
        }
        self.state.pagination.page_size = size;
        self.update_pagination_state();
        self.reload(Some("changePageSize"));
    }

    /// Looks up a field by name in O(1).
    ///
    /// Returns `None` (with an informational log) when absent.
    pub fn field(&mut self, name: &str) -> Option<&mut Field> {
        if self.check_disposed("field") {
            return None;
        }
        match self.field_index.get(name) {
            Some(&index) => self.fields.get_mut(index),
            None => {
                tracing::debug!(name, "field not found");
                None
            }
        }
    }

    /// Looks up a field and applies an externally-evaluated visibility
    /// condition: the result is cached on the field and assigned to
    /// `visible`.
    pub fn field_with_condition(&mut self, name: &str, condition: bool) -> Option<&mut Field> {
        let field = self.field(name)?;
        field.visible_condition = Some(condition);
        field.visible = condition;
        Some(field)
    }

    /// Empties the filter bag and resets to the first page. No events.
    pub fn clear_filters(&mut self) {
        if self.check_disposed("clear_filters") {
            return;
        }
        self.filters.clear();
        self.state.pagination.page_index = 0;
    }

    /// Empties the filter bag, resets to the first page, then either asks
    /// the router to navigate (when routing is enabled) or reloads
    /// directly.
    pub fn reset_filters(&mut self) {
        if self.check_disposed("reset_filters") {
            return;
        }
        self.filters.clear();
        self.state.pagination.page_index = 0;
        if self.config.use_routing {
            self.on_navigate_requested.emit(&"resetFilters".to_string());
        } else {
            self.reload(Some("resetFilters"));
        }
    }

    /// Resets sort and pagination to configuration defaults.
    ///
    /// Emits state-changed (`"clearState"`).
    pub fn clear_state(&mut self) {
        if self.check_disposed("clear_state") {
            return;
        }
        self.state.sort1_name = None;
        self.state.sort1_dir = None;
        self.state.sort2_name = None;
        self.state.sort2_dir = None;
        self.state.pagination.page_index = 0;
        self.state.pagination.page_size = self.config.pagination.effective_page_size();
        self.on_state_changed.emit(&"clearState".to_string());
    }

    /// Clears the current item buffer and total count, recomputing the
    /// window. Emits state-changed (`"clearData"`).
    pub fn clear_data(&mut self) {
        if self.check_disposed("clear_data") {
            return;
        }
        self.items.clear();
        self.state.total_item_count = 0;
        self.update_pagination_state();
        self.on_state_changed.emit(&"clearData".to_string());
    }

    /// Clears filters, state, and data in one sweep.
    pub fn reset(&mut self) {
        if self.check_disposed("reset") {
            return;
        }
        self.clear_filters();
        self.clear_state();
        self.clear_data();
    }

    /// Flips the filter/search-area UI flag. Emits state-changed.
    pub fn toggle_area_expanded(&mut self) {
        if self.check_disposed("toggle_area_expanded") {
            return;
        }
        self.state.area_expanded = !self.state.area_expanded;
        self.on_state_changed.emit(&"toggleAreaExpanded".to_string());
    }

    /// Produces a snapshot for the external persistence layer.
    pub fn to_snapshot(&self, path_name: impl Into<String>) -> CacheSnapshot {
        CacheSnapshot {
            id: self.id.clone(),
            path_name: path_name.into(),
            kind: self.kind.clone(),
            state: self.state.clone(),
            filters: self.filters.clone(),
            field_list: Some(self.fields.iter().map(FieldSnapshot::from).collect()),
            date: Utc::now(),
        }
    }

    /// Releases all resources. Terminal and idempotent.
    ///
    /// Completes every notifier (releasing all subscribers) and empties the
    /// item buffers and field index. Every subsequent mutating call is a
    /// logged no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }

        self.on_data_requested.complete();
        self.on_navigate_requested.complete();
        self.on_data_loading.complete();
        self.on_data_loaded.complete();
        self.on_sort_changed.complete();
        self.on_pagination_changed.complete();
        self.on_state_changed.complete();
        self.on_field_changed.complete();

        self.items.clear();
        self.source_items.clear();
        self.pages.clear();
        self.fields.clear();
        self.sort_candidates1.clear();
        self.sort_candidates2.clear();
        self.field_index.clear();

        self.disposed = true;
    }

    // Read-only accessors.

    /// The data source id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The data source type tag.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The construction-time configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The snapshot this instance was restored from, if any.
    pub fn cache(&self) -> Option<&CacheSnapshot> {
        self.cache.as_ref()
    }

    /// Current page index.
    pub fn page_index(&self) -> i64 {
        self.state.pagination.page_index
    }

    /// Current page size.
    pub fn page_size(&self) -> i64 {
        self.state.pagination.page_size
    }

    /// Total item count across all pages.
    pub fn total_count(&self) -> i64 {
        self.state.total_item_count
    }

    /// The generated opaque UI element id.
    pub fn element_id(&self) -> &str {
        &self.state.element_id
    }

    /// The current page's item buffer.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// The unpaginated source buffer for client-side paging.
    pub fn source_items(&self) -> &[T] {
        &self.source_items
    }

    /// Every page of items loaded so far.
    pub fn pages(&self) -> &[PageData<T>] {
        &self.pages
    }

    /// The items retained for one page, if it was ever loaded.
    pub fn page_items(&self, page_index: i64) -> Option<&[T]> {
        self.pages
            .iter()
            .find(|page| page.page_index == page_index)
            .map(|page| page.items.as_slice())
    }

    /// The registered field collection, in registration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The untouched clones of the fields as originally passed to
    /// [`set_fields`](Self::set_fields).
    pub fn field_backup(&self) -> &[Field] {
        &self.field_backup
    }

    /// Names of fields eligible as the primary sort.
    pub fn sort_candidates1(&self) -> &[String] {
        &self.sort_candidates1
    }

    /// Names of fields eligible as the secondary sort.
    pub fn sort_candidates2(&self) -> &[String] {
        &self.sort_candidates2
    }

    /// The field currently matched as the primary sort, if any.
    pub fn sort_item1(&self) -> Option<&Field> {
        self.resolve(self.sort_item1.as_deref())
    }

    /// The field currently matched as the secondary sort, if any.
    pub fn sort_item2(&self) -> Option<&Field> {
        self.resolve(self.sort_item2.as_deref())
    }

    /// Whether the current item buffer is non-empty.
    pub fn has_data(&self) -> bool {
        !self.items.is_empty()
    }

    /// Whether the current page is the last one.
    pub fn is_last_page(&self) -> bool {
        self.state.pagination.total_page_count == self.state.pagination.page_index + 1
    }

    /// Whether this instance was restored from a snapshot (`false`) or
    /// freshly constructed (`true`).
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Whether fields have been registered.
    pub fn is_configured(&self) -> bool {
        self.is_configured
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn resolve(&self, name: Option<&str>) -> Option<&Field> {
        let index = *self.field_index.get(name?)?;
        self.fields.get(index)
    }

    pub(crate) fn update_pagination_state(&mut self) {
        if pagination::recompute(&mut self.state) {
            self.on_pagination_changed.emit(&self.state);
        }
    }

    pub(crate) fn check_disposed(&self, operation: &str) -> bool {
        if self.disposed {
            tracing::warn!(operation, "call on disposed data source ignored");
        }
        self.disposed
    }
}
