//! SQLite backend for a local replica of the reporting layer.
//!
//! The replica must expose the same views as the warehouse
//! (`VW_EXEC_SUMMARY`, `VW_REVENUE_BY_REGION`, ...). It is opened read-only.

use std::path::{Path, PathBuf};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};

use crate::error::{DashboardError, DashboardResult};

use super::models::{Column, ColumnKind, Table, Value};
use super::warehouse::Warehouse;

/// Read-only connection to a SQLite replica
pub struct SqliteWarehouse {
    conn: Connection,
    label: String,
}

impl SqliteWarehouse {
    /// Open the replica at `path`
    pub fn open(path: &Path) -> DashboardResult<Self> {
        if !path.exists() {
            return Err(DashboardError::Configuration(format!(
                "SQLite replica not found: {path:?}"
            )));
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| DashboardError::Connection(format!("failed to open {path:?}: {e}")))?;
        tracing::info!(path = ?path, "opened SQLite replica");
        Ok(Self::from_connection(conn, format!("SQLite {}", display_stem(path))))
    }

    /// Wrap an already-open connection
    pub fn from_connection(conn: Connection, label: impl Into<String>) -> Self {
        SqliteWarehouse {
            conn,
            label: label.into(),
        }
    }
}

impl Warehouse for SqliteWarehouse {
    fn query(&self, sql: &str) -> DashboardResult<Table> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| DashboardError::query(sql, e))?;

        let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let width = names.len();

        let mut rows_out: Vec<Vec<Value>> = Vec::new();
        let mut rows = stmt.query([]).map_err(|e| DashboardError::query(sql, e))?;
        while let Some(row) = rows.next().map_err(|e| DashboardError::query(sql, e))? {
            let mut values = Vec::with_capacity(width);
            for idx in 0..width {
                let value = row.get_ref(idx).map_err(|e| DashboardError::query(sql, e))?;
                values.push(convert_value(value).map_err(|e| DashboardError::query(sql, e))?);
            }
            rows_out.push(values);
        }

        // SQLite is dynamically typed, so kinds come from the first non-null cell
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                let kind = rows_out
                    .iter()
                    .map(|r| &r[idx])
                    .find(|v| !v.is_null())
                    .map(|v| match v {
                        Value::Int(_) => ColumnKind::Integer,
                        Value::Float(_) => ColumnKind::Float,
                        _ => ColumnKind::Text,
                    })
                    .unwrap_or(ColumnKind::Text);
                Column::new(name, kind)
            })
            .collect();

        Ok(Table {
            columns,
            rows: rows_out,
        })
    }

    fn source_label(&self) -> String {
        self.label.clone()
    }
}

/// Convert a SQLite cell; blobs must hold UTF-8 text
fn convert_value(value: ValueRef<'_>) -> Result<Value, String> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int(v),
        ValueRef::Real(v) => Value::Float(v),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Value::Text(
            String::from_utf8(bytes.to_vec()).map_err(|e| format!("non UTF-8 cell: {e}"))?,
        ),
    })
}

fn display_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| PathBuf::from(path).display().to_string())
}

/// In-memory replicas of the reporting views used across the test suite
#[cfg(test)]
pub mod fixtures {
    use rusqlite::Connection;

    use super::SqliteWarehouse;

    const SCHEMA: &str = "
        CREATE TABLE exec_summary (
            TOTAL_ORDERS INTEGER, TOTAL_REVENUE REAL, AVG_ORDER_VALUE REAL,
            TOTAL_CUSTOMERS INTEGER, TOTAL_PRODUCTS INTEGER
        );
        CREATE TABLE revenue_by_region (REGION TEXT, TOTAL_REVENUE REAL);
        CREATE TABLE revenue_by_category (CATEGORY TEXT, TOTAL_REVENUE REAL);
        CREATE TABLE top_customers (CUSTOMER_ID INTEGER, NAME TEXT, TOTAL_REVENUE REAL);
        CREATE TABLE monthly_trend (YEAR INTEGER, MONTH INTEGER, TOTAL_REVENUE REAL);
        CREATE TABLE monthly_growth (
            YEAR INTEGER, MONTH INTEGER, TOTAL_REVENUE REAL,
            PREV_REVENUE REAL, GROWTH_PERCENT REAL
        );

        CREATE VIEW VW_EXEC_SUMMARY AS SELECT * FROM exec_summary;
        CREATE VIEW VW_REVENUE_BY_REGION AS SELECT * FROM revenue_by_region;
        CREATE VIEW VW_REVENUE_BY_CATEGORY AS SELECT * FROM revenue_by_category;
        CREATE VIEW VW_TOP_CUSTOMERS AS SELECT * FROM top_customers;
        CREATE VIEW VW_MONTHLY_TREND AS SELECT * FROM monthly_trend;
        CREATE VIEW VW_MONTHLY_REVENUE_GROWTH AS SELECT * FROM monthly_growth;
    ";

    const DATA: &str = "
        INSERT INTO exec_summary VALUES (42, 1234567.5, 29394.46, 17, 9);

        INSERT INTO revenue_by_region VALUES
            ('North', 400000.0), ('South', 250000.25), ('East', 334567.25), ('West', 250000.0);

        INSERT INTO revenue_by_category VALUES
            ('Electronics', 700000.0), ('Furniture', 300000.5), ('Office', 234567.0);

        INSERT INTO top_customers VALUES
            (1, 'Acme Corp', 150000.0), (2, 'Globex', 320000.0), (3, 'Initech', 90000.0),
            (4, 'Umbrella', 210000.0), (5, 'Hooli', 400000.0), (6, 'Stark', 50000.0),
            (7, 'Wayne', 180000.0);

        INSERT INTO monthly_trend VALUES
            (2024, 11, 120000.0), (2024, 3, 90000.0), (2023, 12, 80000.0),
            (2024, 1, 85000.0), (2024, 10, 110000.0), (2024, 2, 87000.0);

        INSERT INTO monthly_growth VALUES
            (2024, 5, 100.0, 90.0, 11.11),
            (2024, 1, 85.0, NULL, NULL),
            (2024, 10, 110.0, 100.0, 10.0),
            (2024, 2, 87.0, 85.0, 2.35),
            (2023, 12, 80.0, NULL, NULL),
            (2024, 3, 90.0, 87.0, 3.45),
            (2024, 4, 90.0, 90.0, NULL),
            (2024, 11, 120.0, 110.0, 9.09),
            (2024, 6, 95.0, 100.0, -5.0),
            (2024, 7, 99.0, 95.0, 4.21);
    ";

    /// Connection with the schema and views but no rows
    pub fn empty_connection() -> Connection {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        conn.execute_batch(SCHEMA).expect("create schema");
        conn
    }

    /// Connection with the schema, views and sample rows
    pub fn sample_connection() -> Connection {
        let conn = empty_connection();
        conn.execute_batch(DATA).expect("insert sample data");
        conn
    }

    pub fn sample_warehouse() -> SqliteWarehouse {
        SqliteWarehouse::from_connection(sample_connection(), "SQLite fixture")
    }
}
