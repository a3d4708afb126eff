//! The externally-persisted cache snapshot.
//!
//! A [`CacheSnapshot`] captures enough of a data source's view state,
//! filters, and field visibility to rehydrate an instance without
//! re-fetching. The core only *consumes* a snapshot at construction time
//! (via [`DataSource::from_snapshot`](crate::datasource::DataSource::from_snapshot))
//! and *produces* one on demand
//! ([`DataSource::to_snapshot`](crate::datasource::DataSource::to_snapshot));
//! where and when it is stored is the persistence layer's concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::datasource::FilterMap;
use crate::field::Field;
use crate::state::ViewState;

/// Persisted visibility for one field, matched back by name on restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSnapshot {
    /// The field's unique name.
    pub name: String,
    /// Whether the field was visible when the snapshot was taken.
    pub visible: bool,
}

impl From<&Field> for FieldSnapshot {
    fn from(field: &Field) -> Self {
        Self {
            name: field.name.clone(),
            visible: field.visible,
        }
    }
}

/// Serializable record used to restore a data source across navigations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot {
    /// The data source id the snapshot belongs to.
    pub id: String,
    /// Route path the snapshot was taken under; part of the external
    /// identity scheme.
    pub path_name: String,
    /// The data source's type tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// The persisted view state.
    pub state: ViewState,
    /// The persisted filter bag.
    #[serde(default)]
    pub filters: FilterMap,
    /// Per-field visibility, applied by name match during `set_fields` when
    /// state saving is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_list: Option<Vec<FieldSnapshot>>,
    /// When the snapshot was taken.
    pub date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::FilterValue;

    #[test]
    fn round_trips_through_json() {
        let mut filters = FilterMap::new();
        filters.insert("CatId".to_string(), FilterValue::Number(5.0));
        filters.insert("Active".to_string(), FilterValue::Bool(true));

        let snapshot = CacheSnapshot {
            id: "products".to_string(),
            path_name: "/products".to_string(),
            kind: "grid".to_string(),
            state: ViewState::new("lds9", 2, 25, 120),
            filters,
            field_list: Some(vec![FieldSnapshot {
                name: "Name".to_string(),
                visible: false,
            }]),
            date: Utc::now(),
        };

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["type"], "grid");
        assert_eq!(json["pathName"], "/products");
        assert_eq!(json["fieldList"][0]["name"], "Name");
        assert_eq!(json["filters"]["CatId"], 5.0);

        let back: CacheSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back.id, snapshot.id);
        assert_eq!(back.state, snapshot.state);
        assert_eq!(back.filters, snapshot.filters);
        assert_eq!(back.field_list, snapshot.field_list);
    }

    #[test]
    fn field_list_and_filters_are_optional_on_the_wire() {
        let json = serde_json::json!({
            "id": "x",
            "pathName": "/x",
            "type": "grid",
            "state": ViewState::new("lds1", 0, 10, 0),
            "date": "2024-05-01T12:00:00Z",
        });
        let snapshot: CacheSnapshot = serde_json::from_value(json).unwrap();
        assert!(snapshot.filters.is_empty());
        assert!(snapshot.field_list.is_none());
    }
}
