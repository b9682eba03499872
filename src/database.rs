/// Database access for report queries
///
/// This module handles:
/// - The `Database` seam the report renderer streams rows from
/// - Opening the configured SQLite database (read-only)
/// - Mapping column values onto typed `Cell`s using declared column types
use crate::types::{Cell, ConnectionDescriptor, Row};
use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Failed to open database '{name}': {message}")]
    Connect { name: String, message: String },

    #[error("Query failed: {message}\n  query: {sql}")]
    Query { sql: String, message: String },
}

/// Something that can execute a query and hand back rows one at a time
pub trait Database {
    /// Execute `sql`, calling `on_row` for every row in backend order.
    ///
    /// Returns the number of rows produced.
    fn for_each_row(&self, sql: &str, on_row: &mut dyn FnMut(Row)) -> Result<usize, DbError>;
}

/// SQLite-backed report database
pub struct SqliteDatabase {
    conn: Connection,
}

impl SqliteDatabase {
    /// Open the database named by the descriptor.
    ///
    /// The name is the database file path (or a `file:` URI). Host and
    /// credentials are carried for other backends and not used here.
    pub fn connect(descriptor: &ConnectionDescriptor) -> Result<Self, DbError> {
        if descriptor.name.is_empty() {
            return Err(DbError::Connect { name: String::new(), message: "no database name configured".to_string() });
        }

        debug!(
            "Opening database '{}' (host={:?}, user={:?})",
            descriptor.name, descriptor.host, descriptor.username
        );

        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&descriptor.name, flags)
            .map_err(|e| DbError::Connect { name: descriptor.name.clone(), message: e.to_string() })?;

        Ok(Self::from_connection(conn))
    }

    /// Wrap an already open connection (used for in-memory databases)
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

impl Database for SqliteDatabase {
    fn for_each_row(&self, sql: &str, on_row: &mut dyn FnMut(Row)) -> Result<usize, DbError> {
        let query_err = |e: rusqlite::Error| DbError::Query { sql: sql.to_string(), message: e.to_string() };

        debug!("Executing query: {}", sql);

        let mut stmt = self.conn.prepare(sql).map_err(query_err)?;
        let columns: Vec<(String, ColumnKind)> = stmt
            .columns()
            .iter()
            .map(|c| (c.name().to_string(), ColumnKind::from_decl_type(c.decl_type())))
            .collect();

        let mut rows = stmt.query([]).map_err(query_err)?;
        let mut count = 0;

        while let Some(row) = rows.next().map_err(query_err)? {
            let mut out = Row::new();
            for (idx, (name, kind)) in columns.iter().enumerate() {
                let value = row.get_ref(idx).map_err(query_err)?;
                out.push(name.clone(), kind.to_cell(value));
            }
            on_row(out);
            count += 1;
        }

        debug!("Query produced {} rows", count);
        Ok(count)
    }
}

/// How a column's values should be typed, derived from its declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Plain,
    Decimal,
    Date,
    Timestamp,
}

impl ColumnKind {
    /// Classify a declared column type. Expression columns have none.
    pub fn from_decl_type(decl_type: Option<&str>) -> Self {
        let Some(decl) = decl_type else {
            return ColumnKind::Plain;
        };
        let decl = decl.to_ascii_uppercase();

        if decl.contains("DEC") || decl.contains("NUMERIC") || decl.contains("MONEY") {
            ColumnKind::Decimal
        } else if decl.contains("DATETIME") || decl.contains("TIMESTAMP") {
            ColumnKind::Timestamp
        } else if decl == "DATE" {
            ColumnKind::Date
        } else {
            ColumnKind::Plain
        }
    }

    /// Convert a raw SQLite value into a typed cell
    pub fn to_cell(self, value: ValueRef<'_>) -> Cell {
        match value {
            ValueRef::Null => Cell::Null,
            ValueRef::Integer(i) => match self {
                ColumnKind::Decimal => Cell::Decimal(i as f64),
                _ => Cell::Integer(i),
            },
            ValueRef::Real(f) => match self {
                ColumnKind::Decimal => Cell::Decimal(f),
                _ => Cell::Float(f),
            },
            ValueRef::Text(bytes) => {
                let text = String::from_utf8_lossy(bytes).into_owned();
                self.classify_text(text)
            }
            ValueRef::Blob(bytes) => Cell::Other(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    fn classify_text(self, text: String) -> Cell {
        match self {
            ColumnKind::Date => match NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
                Ok(date) => Cell::Date(date),
                Err(_) => Cell::Text(text),
            },
            ColumnKind::Timestamp => match parse_timestamp(&text) {
                Some(ts) => Cell::Timestamp(ts),
                None => Cell::Text(text),
            },
            ColumnKind::Decimal => match text.trim().parse::<f64>() {
                Ok(d) => Cell::Decimal(d),
                Err(_) => Cell::Text(text),
            },
            ColumnKind::Plain => Cell::Text(text),
        }
    }
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
    FORMATS.iter().find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}
