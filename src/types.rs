/// Core data structures shared by the report, database and wiki layers
///
/// This module defines the connection descriptors, the chart configuration
/// model and the typed cells produced by query execution.
use chrono::{NaiveDate, NaiveDateTime};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// Database connection parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConnectionDescriptor {
    pub host: String,
    pub name: String, // database name (file path for SQLite)
    pub username: String,
    pub password: String,
}

/// Settable fields of a [`ConnectionDescriptor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseField {
    Name,
    Host,
    Username,
    Password,
}

impl ConnectionDescriptor {
    /// Overwrite a single field
    pub fn set(&mut self, field: DatabaseField, value: impl Into<String>) {
        let value = value.into();
        match field {
            DatabaseField::Name => self.name = value,
            DatabaseField::Host => self.host = value,
            DatabaseField::Username => self.username = value,
            DatabaseField::Password => self.password = value,
        }
    }
}

/// Remote wiki endpoint and credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WikiTarget {
    pub url: String,
    pub username: String,
    pub password: String,
    /// Accept self-signed or otherwise untrusted certificates
    pub insecure: bool,
}

/// Settable fields of a [`WikiTarget`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WikiField {
    Url,
    Username,
    Password,
}

impl WikiTarget {
    /// Overwrite a single field
    pub fn set(&mut self, field: WikiField, value: impl Into<String>) {
        let value = value.into();
        match field {
            WikiField::Url => self.url = value,
            WikiField::Username => self.username = value,
            WikiField::Password => self.password = value,
        }
    }
}

/// A chart directive key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKey {
    Type,
    DateFormat,
    TimePeriod,
    DataOrientation,
    DataDisplay,
    Columns,
}

impl ChartKey {
    /// Name used inside the `{chart:...}` directive
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKey::Type => "type",
            ChartKey::DateFormat => "dateFormat",
            ChartKey::TimePeriod => "timePeriod",
            ChartKey::DataOrientation => "dataOrientation",
            ChartKey::DataDisplay => "dataDisplay",
            ChartKey::Columns => "columns",
        }
    }

    /// Parse a config key; both snake_case and directive spellings are accepted
    pub fn from_config_name(name: &str) -> Option<Self> {
        match name {
            "type" | "chart_type" => Some(ChartKey::Type),
            "date_format" | "dateFormat" => Some(ChartKey::DateFormat),
            "time_period" | "timePeriod" => Some(ChartKey::TimePeriod),
            "data_orientation" | "dataOrientation" => Some(ChartKey::DataOrientation),
            "data_display" | "dataDisplay" => Some(ChartKey::DataDisplay),
            "columns" => Some(ChartKey::Columns),
            _ => None,
        }
    }
}

/// Value of a chart directive
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ChartValue {
    Scalar(String),
    List(Vec<String>),
}

impl ChartValue {
    pub fn is_empty(&self) -> bool {
        match self {
            ChartValue::Scalar(s) => s.is_empty(),
            ChartValue::List(items) => items.is_empty(),
        }
    }
}

impl From<&str> for ChartValue {
    fn from(s: &str) -> Self {
        ChartValue::Scalar(s.to_string())
    }
}

impl From<String> for ChartValue {
    fn from(s: String) -> Self {
        ChartValue::Scalar(s)
    }
}

impl From<Vec<String>> for ChartValue {
    fn from(items: Vec<String>) -> Self {
        ChartValue::List(items)
    }
}

/// Chart directives in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartConfig {
    entries: Vec<(ChartKey, ChartValue)>,
}

impl ChartConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a directive. An existing key keeps its position and gets the new value.
    pub fn set(&mut self, key: ChartKey, value: impl Into<ChartValue>) -> &mut Self {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ChartKey, ChartValue)> {
        self.entries.iter()
    }
}

/// Shorthand setters for building charts in fixtures
#[cfg(test)]
impl ChartConfig {
    pub fn get(&self, key: ChartKey) -> Option<&ChartValue> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn chart_type(&mut self, chart_type: &str) -> &mut Self {
        self.set(ChartKey::Type, chart_type)
    }

    pub fn date_format(&mut self, format: &str) -> &mut Self {
        self.set(ChartKey::DateFormat, format)
    }

    pub fn time_period(&mut self, period: &str) -> &mut Self {
        self.set(ChartKey::TimePeriod, period)
    }

    pub fn data_orientation(&mut self, orientation: &str) -> &mut Self {
        self.set(ChartKey::DataOrientation, orientation)
    }

    pub fn data_display(&mut self, display: &str) -> &mut Self {
        self.set(ChartKey::DataDisplay, display)
    }

    pub fn columns<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        self.set(ChartKey::Columns, columns)
    }
}

const CHART_FIELDS: &[&str] = &["type", "date_format", "time_period", "data_orientation", "data_display", "columns"];

impl<'de> Deserialize<'de> for ChartConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ChartVisitor;

        impl<'de> Visitor<'de> for ChartVisitor {
            type Value = ChartConfig;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a table of chart directives")
            }

            fn visit_map<A>(self, mut map: A) -> Result<ChartConfig, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut config = ChartConfig::new();
                while let Some(name) = map.next_key::<String>()? {
                    let key = ChartKey::from_config_name(&name)
                        .ok_or_else(|| <A::Error as de::Error>::unknown_field(&name, CHART_FIELDS))?;
                    let value: ChartValue = map.next_value()?;
                    config.set(key, value);
                }
                Ok(config)
            }
        }

        deserializer.deserialize_map(ChartVisitor)
    }
}

/// A single typed value from a result row
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Integer(i64),
    /// Fixed-point column value; rendered rounded to 3 places
    Decimal(f64),
    /// Plain floating point value; rendered unrounded
    Float(f64),
    /// Anything the adapter could not classify, already converted to text
    Other(String),
}

/// One result row: (column name, value) pairs in the order the backend yields them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, Cell)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: Cell) {
        self.cells.push((column.into(), value));
    }

    pub fn values(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().map(|(_, v)| v)
    }
}

#[cfg(test)]
impl Row {
    /// Builder-style push for fixtures
    pub fn with(mut self, column: impl Into<String>, value: Cell) -> Self {
        self.push(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.cells.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
