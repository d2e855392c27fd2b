//! Board domain models as stored under `boards/<boardId>`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TableroError;

/// A kanban board: its columns and card property definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl Board {
    /// Columns in display order.
    pub fn sorted_columns(&self) -> Vec<&Column> {
        let mut columns: Vec<&Column> = self.columns.iter().collect();
        columns.sort_by_key(|c| c.order);
        columns
    }

    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    /// First column whose name matches exactly.
    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.sorted_columns().into_iter().find(|c| c.name == name)
    }
}

/// A lane within a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: ColumnColor,
    #[serde(default)]
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

/// Named column colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnColor {
    #[default]
    Blue,
    Green,
    Red,
    Yellow,
    Purple,
    Pink,
    Indigo,
    Gray,
    Orange,
    Teal,
    Cyan,
    Lime,
    Amber,
    Violet,
    Fuchsia,
}

impl ColumnColor {
    pub const ALL: [ColumnColor; 15] = [
        Self::Blue,
        Self::Green,
        Self::Red,
        Self::Yellow,
        Self::Purple,
        Self::Pink,
        Self::Indigo,
        Self::Gray,
        Self::Orange,
        Self::Teal,
        Self::Cyan,
        Self::Lime,
        Self::Amber,
        Self::Violet,
        Self::Fuchsia,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::Purple => "purple",
            Self::Pink => "pink",
            Self::Indigo => "indigo",
            Self::Gray => "gray",
            Self::Orange => "orange",
            Self::Teal => "teal",
            Self::Cyan => "cyan",
            Self::Lime => "lime",
            Self::Amber => "amber",
            Self::Violet => "violet",
            Self::Fuchsia => "fuchsia",
        }
    }
}

impl FromStr for ColumnColor {
    type Err = TableroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| TableroError::validation(format!("Unknown column color '{}'", s)))
    }
}

/// A card property declared when the board is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: PropertyType,
}

/// Type tag of a card property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    #[default]
    String,
    Email,
    Number,
    Currency,
    Date,
    Select,
    Multiselect,
    Checkbox,
    Url,
    Phone,
    Textarea,
}

impl FromStr for PropertyType {
    type Err = TableroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| TableroError::validation(format!("Unknown property type '{}'", s)))
    }
}

/// Column requested by the board wizard or "add column".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewColumn {
    pub name: String,
    pub color: Option<ColumnColor>,
}

impl NewColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
        }
    }

    pub fn with_color(mut self, color: ColumnColor) -> Self {
        self.color = Some(color);
        self
    }
}

/// Property requested by the board wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProperty {
    pub name: String,
    pub kind: Option<PropertyType>,
}

/// Input of the board creation wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewBoard {
    pub title: String,
    pub columns: Vec<NewColumn>,
    pub properties: Vec<NewProperty>,
}

/// Column fields that can be changed after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnUpdate {
    pub name: Option<String>,
    pub color: Option<ColumnColor>,
    pub width: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_optional_fields_default() {
        let board: Board = serde_json::from_value(json!({
            "id": "b1",
            "title": "Plan",
            "columns": [{"id": "col_0", "name": "Todo"}]
        }))
        .unwrap();
        assert!(board.properties.is_empty());
        assert_eq!(board.columns[0].color, ColumnColor::Blue);
        assert_eq!(board.columns[0].order, 0);
        assert_eq!(board.columns[0].width, None);
    }

    #[test]
    fn test_wire_names() {
        let board = Board {
            id: "b1".into(),
            title: "Plan".into(),
            columns: vec![Column {
                id: "col_0".into(),
                name: "Todo".into(),
                color: ColumnColor::Teal,
                order: 0,
                width: None,
            }],
            properties: vec![PropertyDef {
                id: "prop_0".into(),
                name: "Email".into(),
                kind: PropertyType::Email,
            }],
            created_at: 1,
            updated_at: 2,
        };
        let value = serde_json::to_value(&board).unwrap();
        assert_eq!(value["createdAt"], json!(1));
        assert_eq!(value["columns"][0]["color"], json!("teal"));
        assert!(value["columns"][0].get("width").is_none());
        assert_eq!(value["properties"][0]["type"], json!("email"));
    }

    #[test]
    fn test_color_and_type_names() {
        assert_eq!("fuchsia".parse::<ColumnColor>().unwrap(), ColumnColor::Fuchsia);
        assert!(matches!(
            "mauve".parse::<ColumnColor>(),
            Err(TableroError::ValidationError(msg)) if msg.contains("mauve")
        ));
        assert_eq!(
            "multiselect".parse::<PropertyType>().unwrap(),
            PropertyType::Multiselect
        );
        assert!("blob".parse::<PropertyType>().is_err());
    }

    #[test]
    fn test_sorted_columns_and_lookup_by_name() {
        let board: Board = serde_json::from_value(json!({
            "id": "b1",
            "title": "Plan",
            "columns": [
                {"id": "col_1", "name": "Done", "order": 1},
                {"id": "col_0", "name": "Todo", "order": 0}
            ]
        }))
        .unwrap();
        let ids: Vec<&str> = board.sorted_columns().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["col_0", "col_1"]);
        assert_eq!(board.column_by_name("Done").unwrap().id, "col_1");
        assert!(board.column_by_name("done").is_none());
    }
}
