//! The filter bag and its query-parameter round-trip.
//!
//! Filters are an open key→value map. Values coming back from a URL are
//! plain strings; [`coerce_filter_value`] converts them according to the
//! declared [`DataType`] of the matching field, so `"5"` becomes a number
//! for a numeric field and `"true"` becomes a boolean for a boolean one.
//! Loose inputs are tolerated: unknown keys coerce as text, unparseable
//! numbers are skipped key-by-key.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::datasource::DataSource;
use crate::field::DataType;
use crate::input::Item;

/// A single filter value: text, number, or boolean.
///
/// Serializes untagged, so a filter bag round-trips as plain JSON
/// (`{"CatId": 5, "Active": true, "Name": "anvil"}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Numeric filter value.
    Number(f64),
    /// Boolean filter value.
    Bool(bool),
    /// Free-form text filter value.
    Text(String),
}

impl FilterValue {
    /// The numeric value, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FilterValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The boolean value, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FilterValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The text value, if this is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FilterValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for FilterValue {
    /// Formats the value the way a URL serializer would.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Number(n) => write!(f, "{n}"),
            FilterValue::Bool(b) => write!(f, "{b}"),
            FilterValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Number(value as f64)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

/// The open key→value filter bag.
pub type FilterMap = HashMap<String, FilterValue>;

/// Coerces one raw query value according to the resolved data type.
///
/// Numbers that fail to parse yield `None` (the key is skipped); booleans
/// accept the literals `true` and `1`; everything else, dates included,
/// passes through as text.
pub fn coerce_filter_value(raw: &str, data_type: DataType) -> Option<FilterValue> {
    match data_type {
        DataType::Number => raw
            .parse::<f64>()
            .ok()
            .filter(|n| !n.is_nan())
            .map(FilterValue::Number),
        DataType::Boolean => Some(FilterValue::Bool(raw == "true" || raw == "1")),
        DataType::Text | DataType::Date => Some(FilterValue::Text(raw.to_string())),
    }
}

impl<T: Item> DataSource<T> {
    /// Returns the merged request snapshot for the fetch layer.
    ///
    /// Page index and size come first, then the filter bag, then page index
    /// and size again (re-affirmed so a filter key collision cannot shadow
    /// them), then the four sort fields, with the primary sort falling back
    /// to configuration defaults when unset.
    ///
    /// Takes `&mut self` because a non-positive page size is repaired to
    /// the configured default on the way through.
    pub fn get_filters(&mut self) -> FilterMap {
        if self.state.pagination.page_size <= 0 {
            self.state.pagination.page_size = self.config().pagination.effective_page_size();
        }

        let mut merged = FilterMap::new();
        merged.insert("pageIndex".to_string(), self.page_index().into());
        merged.insert("pageSize".to_string(), self.page_size().into());
        for (key, value) in &self.filters {
            merged.insert(key.clone(), value.clone());
        }
        merged.insert("pageIndex".to_string(), self.page_index().into());
        merged.insert("pageSize".to_string(), self.page_size().into());

        if let Some(name) = self
            .state
            .sort1_name
            .clone()
            .or_else(|| self.config().sort.default_name.clone())
        {
            merged.insert("sort1Name".to_string(), name.into());
        }
        let dir = self
            .state
            .sort1_dir
            .unwrap_or(self.config().sort.default_dir);
        merged.insert("sort1Dir".to_string(), dir.as_str().into());
        if let Some(name) = self.state.sort2_name.clone() {
            merged.insert("sort2Name".to_string(), name.into());
        }
        if let Some(dir) = self.state.sort2_dir {
            merged.insert("sort2Dir".to_string(), dir.as_str().into());
        }
        merged
    }

    /// Returns the filter snapshot for URL serialization by the router.
    ///
    /// Same as [`get_filters`](Self::get_filters); when
    /// `include_pagination` is true and pagination is enabled, the explicit
    /// pagination fields are (re)added.
    pub fn get_query_params(&mut self, include_pagination: bool) -> FilterMap {
        let mut params = self.get_filters();
        if include_pagination && self.state.pagination.enabled {
            params.insert("pageIndex".to_string(), self.page_index().into());
            params.insert("pageSize".to_string(), self.page_size().into());
        }
        params
    }

    /// Applies raw query parameters (typically from route resolution) to
    /// pagination and the filter bag.
    ///
    /// Pagination fields are handled first: a valid non-negative
    /// `pageIndex` or positive `pageSize` auto-enables pagination. Every
    /// remaining non-empty key is coerced according to the registered
    /// field's data type, overridden/extended by `custom_field_types`, and
    /// stored; unknown keys coerce as text, invalid values are skipped
    /// silently. Recomputes the window when pagination ends up enabled.
    pub fn apply_query_params(
        &mut self,
        params: &HashMap<String, String>,
        custom_field_types: Option<&HashMap<String, DataType>>,
    ) {
        if self.check_disposed("apply_query_params") {
            return;
        }

        if let Some(raw) = params.get("pageIndex").filter(|raw| !raw.is_empty()) {
            if let Ok(page_index) = raw.parse::<i64>() {
                if page_index >= 0 {
                    self.state.pagination.enabled = true;
                    self.state.pagination.page_index = page_index;
                }
            }
        }
        if let Some(raw) = params.get("pageSize").filter(|raw| !raw.is_empty()) {
            if let Ok(page_size) = raw.parse::<i64>() {
                if page_size > 0 {
                    self.state.pagination.enabled = true;
                    self.state.pagination.page_size = page_size;
                }
            }
        }

        let mut field_types: HashMap<String, DataType> = self
            .fields()
            .iter()
            .map(|field| (field.name.clone(), field.data_type))
            .collect();
        if let Some(custom) = custom_field_types {
            for (name, data_type) in custom {
                field_types.insert(name.clone(), *data_type);
            }
        }

        for (key, raw) in params {
            if key == "pageIndex" || key == "pageSize" {
                continue;
            }
            if raw.is_empty() {
                continue;
            }
            let data_type = field_types.get(key).copied().unwrap_or(DataType::Text);
            if let Some(value) = coerce_filter_value(raw, data_type) {
                self.filters.insert(key.clone(), value);
            }
        }

        if self.state.pagination.enabled {
            if self.state.pagination.page_size <= 0 {
                // Enabling over a restored disabled sentinel leaves the
                // sentinel page size behind; repair before recomputing.
                self.state.pagination.page_size =
                    self.config().pagination.effective_page_size();
            }
            self.update_pagination_state();
        }
    }

    /// Starts a new search: resets to the first page, mirrors pagination
    /// into the filter bag when routing is enabled, then either asks the
    /// router to navigate or reloads directly.
    pub fn search(&mut self) {
        if self.check_disposed("search") {
            return;
        }

        self.state.pagination.page_index = 0;
        if self.config().use_routing {
            self.filters
                .insert("pageIndex".to_string(), self.page_index().into());
            self.filters
                .insert("pageSize".to_string(), self.page_size().into());
            self.on_navigate_requested.emit(&"search".to_string());
        } else {
            self.reload(Some("search"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coercion_follows_declared_types() {
        assert_eq!(
            coerce_filter_value("5", DataType::Number),
            Some(FilterValue::Number(5.0))
        );
        assert_eq!(coerce_filter_value("abc", DataType::Number), None);
        assert_eq!(coerce_filter_value("NaN", DataType::Number), None);
        assert_eq!(
            coerce_filter_value("true", DataType::Boolean),
            Some(FilterValue::Bool(true))
        );
        assert_eq!(
            coerce_filter_value("1", DataType::Boolean),
            Some(FilterValue::Bool(true))
        );
        assert_eq!(
            coerce_filter_value("yes", DataType::Boolean),
            Some(FilterValue::Bool(false))
        );
        assert_eq!(
            coerce_filter_value("2024-05-01", DataType::Date),
            Some(FilterValue::Text("2024-05-01".to_string()))
        );
    }

    #[test]
    fn display_matches_url_serialization() {
        assert_eq!(FilterValue::Number(5.0).to_string(), "5");
        assert_eq!(FilterValue::Number(2.5).to_string(), "2.5");
        assert_eq!(FilterValue::Bool(true).to_string(), "true");
        assert_eq!(FilterValue::Text("anvil".into()).to_string(), "anvil");
    }

    #[test]
    fn untagged_json_shape() {
        let mut bag = FilterMap::new();
        bag.insert("CatId".into(), FilterValue::Number(5.0));
        bag.insert("Active".into(), FilterValue::Bool(true));
        bag.insert("Name".into(), FilterValue::Text("anvil".into()));

        let json = serde_json::to_value(&bag).unwrap();
        assert_eq!(json["CatId"], 5.0);
        assert_eq!(json["Active"], true);
        assert_eq!(json["Name"], "anvil");

        let back: FilterMap = serde_json::from_value(json).unwrap();
        assert_eq!(back, bag);
    }
}
