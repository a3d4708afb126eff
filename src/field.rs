//! Field (column) descriptors.
//!
//! A [`Field`] describes one column of a list: its stable name, display
//! title, data type (used only for filter-value coercion), visibility and
//! sortability, and an optional secondary sort for tie-breaking. Fields are
//! registered on a data source via
//! [`set_fields`](crate::datasource::DataSource::set_fields), which wires a
//! non-owning back-reference so a field can route its own visibility toggle
//! into the owner's event notifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::event::WeakNotifier;

/// Data type of a field, driving filter-value coercion.
///
/// This is the only thing the type is used for; it does not constrain the
/// record type itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DataType {
    /// Free-form text. The coercion fallback for unknown fields.
    #[default]
    #[serde(rename = "string")]
    Text,
    /// Numeric values; unparseable filter input is skipped.
    #[serde(rename = "number")]
    Number,
    /// Booleans; `"true"` and `"1"` coerce to `true`, everything else to
    /// `false`.
    #[serde(rename = "boolean")]
    Boolean,
    /// Dates pass through as text; the external fetch layer interprets them.
    #[serde(rename = "date")]
    Date,
}

/// Sort direction for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    /// Ascending.
    Asc,
    /// Descending. The conventional default for list views.
    #[default]
    Desc,
}

impl SortDir {
    /// The direction that results from clicking an already-active sort:
    /// asc becomes desc, desc becomes asc, unset becomes desc.
    pub fn toggled(current: Option<SortDir>) -> SortDir {
        match current {
            Some(SortDir::Asc) => SortDir::Desc,
            Some(SortDir::Desc) => SortDir::Asc,
            None => SortDir::Desc,
        }
    }

    /// Lowercase wire representation, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weak emission handles back into the owning data source.
///
/// Attached at registration time; a detached field's toggle is a plain
/// state flip with no events.
#[derive(Clone)]
pub(crate) struct FieldHooks {
    pub(crate) field_changed: WeakNotifier<String>,
    pub(crate) state_changed: WeakNotifier<String>,
}

impl Default for FieldHooks {
    fn default() -> Self {
        Self {
            field_changed: WeakNotifier::detached(),
            state_changed: WeakNotifier::detached(),
        }
    }
}

impl fmt::Debug for FieldHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldHooks")
            .field("attached", &self.field_changed.upgrade().is_some())
            .finish()
    }
}

/// Metadata for one column/attribute of a list.
///
/// # Examples
///
/// ```rust
/// use list_datasource::field::{DataType, Field, SortDir};
///
/// let field = Field::new("CreatedAt")
///     .with_title("Created")
///     .with_data_type(DataType::Date)
///     .with_secondary_sort("Id", SortDir::Asc);
///
/// assert!(field.visible);
/// assert!(field.sortable);
/// assert_eq!(field.sort2_name.as_deref(), Some("Id"));
/// ```
#[derive(Debug, Clone)]
pub struct Field {
    /// Unique key within a data source's field collection.
    pub name: String,
    /// Human-readable column title.
    pub title: Option<String>,
    /// Drives filter coercion only.
    pub data_type: DataType,
    /// Whether the column is currently shown.
    pub visible: bool,
    /// Whether the column may be used as a sort key.
    pub sortable: bool,
    /// Primary sort key emitted when this column is sorted on. Defaults to
    /// the field's own name at registration.
    pub sort1_name: Option<String>,
    /// Primary sort direction. Defaults from configuration at registration.
    pub sort1_dir: Option<SortDir>,
    /// Secondary (tie-break) sort key.
    pub sort2_name: Option<String>,
    /// Secondary sort direction. Defaults from configuration at
    /// registration.
    pub sort2_dir: Option<SortDir>,
    /// Externally-supplied visibility predicate result, cached for UI
    /// consumption.
    pub visible_condition: Option<bool>,
    pub(crate) hooks: FieldHooks,
}

impl Field {
    /// Creates a visible, sortable field with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            data_type: DataType::Text,
            visible: true,
            sortable: true,
            sort1_name: None,
            sort1_dir: None,
            sort2_name: None,
            sort2_dir: None,
            visible_condition: None,
            hooks: FieldHooks::default(),
        }
    }

    /// Sets the display title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the data type used for filter coercion.
    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    /// Sets initial visibility.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Marks the field as (non-)sortable.
    pub fn with_sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    /// Overrides the primary sort key and direction.
    pub fn with_primary_sort(mut self, name: impl Into<String>, dir: SortDir) -> Self {
        self.sort1_name = Some(name.into());
        self.sort1_dir = Some(dir);
        self
    }

    /// Sets a secondary sort for tie-breaking.
    pub fn with_secondary_sort(mut self, name: impl Into<String>, dir: SortDir) -> Self {
        self.sort2_name = Some(name.into());
        self.sort2_dir = Some(dir);
        self
    }

    /// Flips visibility and notifies the owning data source, if attached.
    ///
    /// Emits a field-changed notification; additionally emits state-changed
    /// when `call_state_changed` is true, so a persistence layer can react.
    pub fn toggle_visible(&mut self, call_state_changed: bool) {
        self.visible = !self.visible;
        let reason = "field.toggleVisible".to_string();
        self.hooks.field_changed.emit(&reason);
        if call_state_changed {
            self.hooks.state_changed.emit(&reason);
        }
    }

    pub(crate) fn attach(&mut self, hooks: FieldHooks) {
        self.hooks = hooks;
    }
}
